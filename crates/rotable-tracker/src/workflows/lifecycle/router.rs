use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApprovalRole, ComponentId, ComponentIntake, ComponentStatus, FabricationDraft,
    FabricationRequestId, InstallOrder, InstallRecordId, QaStage, RegistrationDetails,
    RemovalOrder, StageCompletion, StockRelease,
};
use super::repository::{LifecycleRepository, NotificationSink};
use super::service::{ErrorKind, LifecycleError, LifecycleService};
use super::transitions::LifecycleEvent;

type SharedService<R, N> = State<Arc<LifecycleService<R, N>>>;

/// Router builder exposing the lifecycle operations over HTTP.
pub fn lifecycle_router<R, N>(service: Arc<LifecycleService<R, N>>) -> Router
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/components", post(receive_handler::<R, N>))
        .route("/api/v1/components/:component_id", get(component_handler::<R, N>))
        .route(
            "/api/v1/components/:component_id/register",
            post(register_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/transitions",
            post(transition_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/qa/:stage/complete",
            post(complete_stage_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/fabrication",
            post(fabrication_handler::<R, N>),
        )
        .route(
            "/api/v1/fabrication/:request_id/approve",
            post(approve_handler::<R, N>),
        )
        .route(
            "/api/v1/fabrication/:request_id/reject",
            post(reject_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/install",
            post(install_handler::<R, N>),
        )
        .route(
            "/api/v1/installs/:record_id/remove",
            post(remove_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/release",
            post(release_handler::<R, N>),
        )
        .route(
            "/api/v1/components/:component_id/history",
            get(history_handler::<R, N>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler::<R, N>))
        .route("/api/v1/qa", get(qa_queue_handler::<R, N>))
        .route("/api/v1/stock", get(stock_handler::<R, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalBody {
    pub(crate) role: ApprovalRole,
    pub(crate) approver: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionBody {
    pub(crate) role: ApprovalRole,
    pub(crate) approver: String,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QaQueueQuery {
    #[serde(default)]
    pub(crate) status: Option<ComponentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StockQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ChecklistIncomplete | ErrorKind::InvalidHourMeter => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::PersistenceTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::PersistenceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InvalidTransition
        | ErrorKind::StageOutOfOrder
        | ErrorKind::AlreadyHasOpenRequest
        | ErrorKind::ComponentNotRfu
        | ErrorKind::AlreadyInstalled
        | ErrorKind::AlreadyRemoved
        | ErrorKind::ConcurrentModification => StatusCode::CONFLICT,
    }
}

pub(crate) fn error_response(error: LifecycleError) -> Response {
    let kind = error.kind();
    let payload = json!({
        "error": error.to_string(),
        "kind": kind.as_str(),
    });
    (status_for(kind), Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, LifecycleError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn receive_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(intake): Json<ComponentIntake>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::CREATED, service.receive(intake))
}

pub(crate) async fn component_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.get(&id))
}

pub(crate) async fn register_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
    Json(details): Json<RegistrationDetails>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.register(&id, details))
}

pub(crate) async fn transition_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
    Json(event): Json<LifecycleEvent>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.apply_transition(&id, event))
}

pub(crate) async fn complete_stage_handler<R, N>(
    State(service): SharedService<R, N>,
    Path((component_id, stage)): Path<(String, u8)>,
    Json(completion): Json<StageCompletion>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let stage = match QaStage::try_from(stage) {
        Ok(stage) => stage,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
                "kind": ErrorKind::StageOutOfOrder.as_str(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.complete_stage(&id, stage, completion))
}

pub(crate) async fn fabrication_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
    Json(draft): Json<FabricationDraft>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::CREATED, service.request_fabrication(&id, draft))
}

pub(crate) async fn approve_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(request_id): Path<String>,
    Json(body): Json<ApprovalBody>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = FabricationRequestId(request_id);
    respond(
        StatusCode::OK,
        service.approve(&id, body.role, &body.approver),
    )
}

pub(crate) async fn reject_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(request_id): Path<String>,
    Json(body): Json<RejectionBody>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = FabricationRequestId(request_id);
    respond(
        StatusCode::OK,
        service.reject(&id, body.role, &body.approver, body.comment),
    )
}

pub(crate) async fn install_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
    Json(order): Json<InstallOrder>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::CREATED, service.install(&id, order))
}

pub(crate) async fn remove_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(record_id): Path<String>,
    Json(order): Json<RemovalOrder>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = InstallRecordId(record_id);
    respond(StatusCode::OK, service.remove(&id, order))
}

pub(crate) async fn release_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
    Json(release): Json<StockRelease>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.release_from_stock(&id, release))
}

pub(crate) async fn history_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(component_id): Path<String>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let id = ComponentId(component_id);
    respond(StatusCode::OK, service.history(&id))
}

pub(crate) async fn dashboard_handler<R, N>(State(service): SharedService<R, N>) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.dashboard())
}

pub(crate) async fn qa_queue_handler<R, N>(
    State(service): SharedService<R, N>,
    Query(query): Query<QaQueueQuery>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.qa_queue(query.status))
}

pub(crate) async fn stock_handler<R, N>(
    State(service): SharedService<R, N>,
    Query(query): Query<StockQuery>,
) -> Response
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.rfu_stock(query.q.as_deref()))
}
