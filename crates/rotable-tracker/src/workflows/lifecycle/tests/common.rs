use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::lifecycle::domain::{
    Component, ComponentId, ComponentIntake, ComponentStatus, ComponentType, FabricationDraft,
    FabricationRequest, FabricationRequestId, InstallOrder, InstallRecord, InstallRecordId,
    QaRecord, QaStage, RegistrationDetails, RemovalOrder, StageCompletion, TimelineEvent,
};
use crate::workflows::lifecycle::qa::default_checklist;
use crate::workflows::lifecycle::repository::{
    LifecycleCommit, LifecycleRepository, Notification, NotificationError, NotificationSink,
    RepositoryError,
};
use crate::workflows::lifecycle::{
    InMemoryLifecycleStore, InMemoryNotifications, LifecycleService, RejectionPolicy,
};

pub(super) type MemoryService = LifecycleService<InMemoryLifecycleStore, InMemoryNotifications>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn roller_id() -> ComponentId {
    ComponentId("CMP-2025-001".to_string())
}

pub(super) fn intake() -> ComponentIntake {
    ComponentIntake {
        id: Some(roller_id()),
        component_type: ComponentType::TrackRoller,
        serial_number: Some("SN-TR-1001".to_string()),
        from_unit_id: Some("DZ-07".to_string()),
        date_received: date(2025, 2, 14),
        condition_notes: Some("  flange worn on inner side ".to_string()),
    }
}

/// A component as it would sit in the store, without going through the service.
pub(super) fn component(status: ComponentStatus) -> Component {
    Component {
        id: roller_id(),
        component_type: ComponentType::TrackRoller,
        serial_number: Some("SN-TR-1001".to_string()),
        oem_part_number: Some("OEM-TR-55".to_string()),
        model_compatibility: Some("D8T".to_string()),
        vendor_reference: None,
        from_unit_id: Some("DZ-07".to_string()),
        date_received: date(2025, 2, 14),
        condition_notes: None,
        status,
        total_lifetime: 0,
        cycles: 0,
        revision: 4,
    }
}

pub(super) fn stage(number: u8) -> QaStage {
    QaStage::new(number).expect("stage within 1..=7")
}

pub(super) fn checked_completion() -> StageCompletion {
    let mut checklist_items = default_checklist();
    for item in &mut checklist_items {
        item.checked = true;
    }
    StageCompletion {
        mechanic_name: " R. Santos ".to_string(),
        notes: Some("bearing play within tolerance".to_string()),
        checklist_items,
    }
}

pub(super) fn partial_completion() -> StageCompletion {
    let mut completion = checked_completion();
    completion.checklist_items[2].checked = false;
    completion
}

pub(super) fn registration() -> RegistrationDetails {
    RegistrationDetails {
        oem_part_number: Some("OEM-TR-55".to_string()),
        model_compatibility: Some("D8T, D9R".to_string()),
        vendor_reference: Some("   ".to_string()),
    }
}

pub(super) fn fabrication_draft() -> FabricationDraft {
    FabricationDraft {
        reason: "Shaft cracked beyond weld repair".to_string(),
        vendor_name: Some("Borneo Hydraulics".to_string()),
        estimated_cost: 18_500_000,
        created_by: "A. Wijaya".to_string(),
        notes: None,
        attachment: Some("  ".to_string()),
    }
}

pub(super) fn install_order(hm_start: u64) -> InstallOrder {
    InstallOrder {
        unit_id: "EX-11".to_string(),
        hm_start,
        install_date: date(2025, 3, 1),
    }
}

pub(super) fn removal_order(hm_end: u64) -> RemovalOrder {
    RemovalOrder {
        hm_end,
        remove_date: date(2025, 6, 1),
        reason: "scheduled overhaul".to_string(),
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryLifecycleStore>,
    Arc<InMemoryNotifications>,
) {
    build_service_with_policy(RejectionPolicy::ReturnToQa)
}

pub(super) fn build_service_with_policy(
    policy: RejectionPolicy,
) -> (
    MemoryService,
    Arc<InMemoryLifecycleStore>,
    Arc<InMemoryNotifications>,
) {
    let store = Arc::new(InMemoryLifecycleStore::default());
    let notifications = Arc::new(InMemoryNotifications::default());
    let service = LifecycleService::with_policy(store.clone(), notifications.clone(), policy);
    (service, store, notifications)
}

/// Receive and register the fixture component, leaving it at QA-1.
pub(super) fn received_in_qa<R, N>(service: &LifecycleService<R, N>) -> Component
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    service.receive(intake()).expect("component received");
    service
        .register(&roller_id(), registration())
        .expect("component registered")
}

/// Sign off every inspection stage from the component's current stage onwards.
pub(super) fn pass_inspection<R, N>(service: &LifecycleService<R, N>, id: &ComponentId) -> Component
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    let mut component = service.get(id).expect("component exists");
    while let Some(current) = component.current_qa_stage() {
        component = service
            .complete_stage(id, current, checked_completion())
            .expect("stage signed off")
            .component;
    }
    component
}

/// Receive, register and pass all seven stages.
pub(super) fn ready_for_use<R, N>(service: &LifecycleService<R, N>) -> Component
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    received_in_qa(service);
    pass_inspection(service, &roller_id())
}

/// Every call fails with the configured error.
pub(super) struct FailingRepository(pub(super) RepositoryError);

impl FailingRepository {
    pub(super) fn unavailable() -> Self {
        Self(RepositoryError::Unavailable("database offline".to_string()))
    }

    pub(super) fn timed_out() -> Self {
        Self(RepositoryError::Timeout { millis: 2_000 })
    }

    fn fail<T>(&self) -> Result<T, RepositoryError> {
        Err(self.0.clone())
    }
}

impl LifecycleRepository for FailingRepository {
    fn commit(&self, _commit: LifecycleCommit) -> Result<Component, RepositoryError> {
        self.fail()
    }

    fn insert_component(&self, _component: Component) -> Result<Component, RepositoryError> {
        self.fail()
    }

    fn load(&self, _id: &ComponentId) -> Result<Component, RepositoryError> {
        self.fail()
    }

    fn save(&self, _component: Component) -> Result<Component, RepositoryError> {
        self.fail()
    }

    fn components(&self) -> Result<Vec<Component>, RepositoryError> {
        self.fail()
    }

    fn append_timeline_event(&self, _event: TimelineEvent) -> Result<(), RepositoryError> {
        self.fail()
    }

    fn timeline(&self, _id: &ComponentId) -> Result<Vec<TimelineEvent>, RepositoryError> {
        self.fail()
    }

    fn load_qa_record(
        &self,
        _id: &ComponentId,
        _stage: QaStage,
    ) -> Result<Option<QaRecord>, RepositoryError> {
        self.fail()
    }

    fn save_qa_record(&self, _record: QaRecord) -> Result<(), RepositoryError> {
        self.fail()
    }

    fn qa_records(&self, _id: &ComponentId) -> Result<Vec<QaRecord>, RepositoryError> {
        self.fail()
    }

    fn load_open_install_record(
        &self,
        _id: &ComponentId,
    ) -> Result<Option<InstallRecord>, RepositoryError> {
        self.fail()
    }

    fn load_install_record(&self, _id: &InstallRecordId) -> Result<InstallRecord, RepositoryError> {
        self.fail()
    }

    fn save_install_record(&self, _record: InstallRecord) -> Result<(), RepositoryError> {
        self.fail()
    }

    fn install_records(&self, _id: &ComponentId) -> Result<Vec<InstallRecord>, RepositoryError> {
        self.fail()
    }

    fn load_fabrication_request(
        &self,
        _id: &FabricationRequestId,
    ) -> Result<FabricationRequest, RepositoryError> {
        self.fail()
    }

    fn load_open_fabrication_request(
        &self,
        _id: &ComponentId,
    ) -> Result<Option<FabricationRequest>, RepositoryError> {
        self.fail()
    }

    fn save_fabrication_request(
        &self,
        _request: FabricationRequest,
    ) -> Result<(), RepositoryError> {
        self.fail()
    }

    fn fabrication_requests(
        &self,
        _id: &ComponentId,
    ) -> Result<Vec<FabricationRequest>, RepositoryError> {
        self.fail()
    }
}

/// In-memory store whose dependent record writes time out while armed. Component
/// swaps and timeline entries written on their own still go through.
#[derive(Default)]
pub(super) struct DependentWriteFailure {
    pub(super) inner: InMemoryLifecycleStore,
    armed: AtomicBool,
}

impl DependentWriteFailure {
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub(super) fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    fn dependent_write(&self) -> Result<(), RepositoryError> {
        if self.armed.load(Ordering::SeqCst) {
            Err(RepositoryError::Timeout { millis: 2_000 })
        } else {
            Ok(())
        }
    }
}

impl LifecycleRepository for DependentWriteFailure {
    fn commit(&self, commit: LifecycleCommit) -> Result<Component, RepositoryError> {
        let has_dependents = !commit.qa_records.is_empty()
            || commit.install_record.is_some()
            || commit.fabrication_request.is_some();
        if has_dependents {
            self.dependent_write()?;
        }
        self.inner.commit(commit)
    }

    fn insert_component(&self, component: Component) -> Result<Component, RepositoryError> {
        self.inner.insert_component(component)
    }

    fn load(&self, id: &ComponentId) -> Result<Component, RepositoryError> {
        self.inner.load(id)
    }

    fn save(&self, component: Component) -> Result<Component, RepositoryError> {
        self.inner.save(component)
    }

    fn components(&self) -> Result<Vec<Component>, RepositoryError> {
        self.inner.components()
    }

    fn append_timeline_event(&self, event: TimelineEvent) -> Result<(), RepositoryError> {
        self.inner.append_timeline_event(event)
    }

    fn timeline(&self, id: &ComponentId) -> Result<Vec<TimelineEvent>, RepositoryError> {
        self.inner.timeline(id)
    }

    fn load_qa_record(
        &self,
        id: &ComponentId,
        stage: QaStage,
    ) -> Result<Option<QaRecord>, RepositoryError> {
        self.inner.load_qa_record(id, stage)
    }

    fn save_qa_record(&self, record: QaRecord) -> Result<(), RepositoryError> {
        self.dependent_write()?;
        self.inner.save_qa_record(record)
    }

    fn qa_records(&self, id: &ComponentId) -> Result<Vec<QaRecord>, RepositoryError> {
        self.inner.qa_records(id)
    }

    fn load_open_install_record(
        &self,
        id: &ComponentId,
    ) -> Result<Option<InstallRecord>, RepositoryError> {
        self.inner.load_open_install_record(id)
    }

    fn load_install_record(&self, id: &InstallRecordId) -> Result<InstallRecord, RepositoryError> {
        self.inner.load_install_record(id)
    }

    fn save_install_record(&self, record: InstallRecord) -> Result<(), RepositoryError> {
        self.dependent_write()?;
        self.inner.save_install_record(record)
    }

    fn install_records(&self, id: &ComponentId) -> Result<Vec<InstallRecord>, RepositoryError> {
        self.inner.install_records(id)
    }

    fn load_fabrication_request(
        &self,
        id: &FabricationRequestId,
    ) -> Result<FabricationRequest, RepositoryError> {
        self.inner.load_fabrication_request(id)
    }

    fn load_open_fabrication_request(
        &self,
        id: &ComponentId,
    ) -> Result<Option<FabricationRequest>, RepositoryError> {
        self.inner.load_open_fabrication_request(id)
    }

    fn save_fabrication_request(&self, request: FabricationRequest) -> Result<(), RepositoryError> {
        self.dependent_write()?;
        self.inner.save_fabrication_request(request)
    }

    fn fabrication_requests(
        &self,
        id: &ComponentId,
    ) -> Result<Vec<FabricationRequest>, RepositoryError> {
        self.inner.fabrication_requests(id)
    }
}

#[derive(Default)]
pub(super) struct FailingNotifications;

impl NotificationSink for FailingNotifications {
    fn notify(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
