use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::approval::{self, ApprovalError};
use super::domain::{
    ApprovalRole, Component, ComponentId, ComponentIntake, ComponentStatus, ComponentView,
    FabricationDraft, FabricationRequest, FabricationRequestId, ImportedComponent, InstallOrder,
    InstallRecord, InstallRecordId, QaRecord, QaStage, RegistrationDetails, RemovalOrder,
    StageCompletion, StockRelease, TimelineEvent, TimelineEventId, TimelineEventKind,
};
use super::ledger::{self, LedgerError};
use super::qa::{self, QaError};
use super::report::{self, ComponentHistory, DashboardSummary};
use super::repository::{
    ComponentWrite, LifecycleCommit, LifecycleRepository, Notification, NotificationSink,
    RepositoryError,
};
use super::transitions::{self, LifecycleEvent, RejectionPolicy, Transition, TransitionError};

/// Service composing the transition engine, QA controller, approval workflow and
/// lifecycle ledger over the persistence and notification ports.
///
/// Every mutating operation follows the same order: load, validate, then hand the
/// component swap, its dependent records and the timeline entry to the repository as one
/// [`LifecycleCommit`], and notify once it is stored. A commit that fails at any step,
/// including a lost compare-and-swap, persists nothing.
pub struct LifecycleService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    policy: RejectionPolicy,
}

impl<R, N> LifecycleService<R, N>
where
    R: LifecycleRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>) -> Self {
        Self::with_policy(repository, notifications, RejectionPolicy::default())
    }

    pub fn with_policy(repository: Arc<R>, notifications: Arc<N>, policy: RejectionPolicy) -> Self {
        Self {
            repository,
            notifications,
            policy,
        }
    }

    pub fn policy(&self) -> RejectionPolicy {
        self.policy
    }

    /// Record a component arriving at the workshop.
    pub fn receive(&self, intake: ComponentIntake) -> Result<Component, LifecycleError> {
        let id = match intake.id {
            Some(id) => id,
            None => self.next_component_id(intake.date_received.year())?,
        };

        let component = Component {
            id,
            component_type: intake.component_type,
            serial_number: clean(intake.serial_number),
            oem_part_number: None,
            model_compatibility: None,
            vendor_reference: None,
            from_unit_id: clean(intake.from_unit_id),
            date_received: intake.date_received,
            condition_notes: clean(intake.condition_notes),
            status: ComponentStatus::Received,
            total_lifetime: 0,
            cycles: 0,
            revision: 0,
        };

        let origin = component
            .from_unit_id
            .as_deref()
            .map(|unit| format!(" from unit {unit}"))
            .unwrap_or_default();
        let description = format!(
            "{}{} received at the workshop",
            component.component_type.label(),
            origin
        );
        let stored = self.persist(staged(
            ComponentWrite::Insert,
            component,
            TimelineEventKind::Received,
            "Component received",
            description,
        ))?;
        info!(component_id = %stored.id, component_type = stored.component_type.as_str(), "component received");
        Ok(stored)
    }

    /// Capture master data and confirm registration, which opens QA-1.
    pub fn register(
        &self,
        id: &ComponentId,
        details: RegistrationDetails,
    ) -> Result<Component, LifecycleError> {
        let component = self.repository.load(id)?;
        let mut transition =
            transitions::apply_transition(&component, LifecycleEvent::ConfirmRegistration)
                .map_err(|error| self.rejected(&component, error))?;

        let next = &mut transition.component;
        if let Some(oem) = clean(details.oem_part_number) {
            next.oem_part_number = Some(oem);
        }
        if let Some(models) = clean(details.model_compatibility) {
            next.model_compatibility = Some(models);
        }
        if let Some(vendor) = clean(details.vendor_reference) {
            next.vendor_reference = Some(vendor);
        }

        let commit = self.stage_transition(transition)?;
        self.persist(commit)
    }

    /// Apply a bare lifecycle event. Events that own side records (QA sign-offs,
    /// fabrication requests, install cycles) must go through their dedicated operations.
    pub fn apply_transition(
        &self,
        id: &ComponentId,
        event: LifecycleEvent,
    ) -> Result<Component, LifecycleError> {
        if !matches!(
            event,
            LifecycleEvent::ConfirmRegistration
                | LifecycleEvent::ResumeRepair
                | LifecycleEvent::ReturnFromVendor
                | LifecycleEvent::Archive
        ) {
            warn!(component_id = %id, event = event.name(), "event requires its dedicated operation");
            return Err(LifecycleError::DedicatedOperation {
                event: event.name(),
            });
        }

        let component = self.repository.load(id)?;
        let transition = transitions::apply_transition(&component, event)
            .map_err(|error| self.rejected(&component, error))?;
        let commit = self.stage_transition(transition)?;
        self.persist(commit)
    }

    /// Sign off the component's current inspection stage and advance it.
    pub fn complete_stage(
        &self,
        id: &ComponentId,
        stage: QaStage,
        completion: StageCompletion,
    ) -> Result<StageSignOff, LifecycleError> {
        let component = self.repository.load(id)?;
        let record = qa::complete_stage(&component, stage, completion, Utc::now()).map_err(|error| {
            warn!(component_id = %id, stage = stage.number(), %error, "stage sign-off rejected");
            LifecycleError::from(error)
        })?;

        let mut transition = transitions::apply_transition(
            &component,
            LifecycleEvent::CompleteQaStage {
                stage,
                record: record.status,
            },
        )
        .map_err(|error| self.rejected(&component, error))?;
        let mechanic = record.mechanic_name.as_deref().unwrap_or("unknown mechanic");
        transition.description = format!("{} (signed off by {mechanic})", transition.description);

        let commit = self
            .stage_transition(transition)?
            .with_qa_records([record.clone()]);
        let stored = self.persist(commit)?;
        Ok(StageSignOff {
            record,
            component: stored,
        })
    }

    /// Raise a vendor repair request from QA-1; the component waits for GL approval.
    pub fn request_fabrication(
        &self,
        id: &ComponentId,
        draft: FabricationDraft,
    ) -> Result<FabricationRequest, LifecycleError> {
        let component = self.repository.load(id)?;
        if let Some(open) = self.repository.load_open_fabrication_request(id)? {
            warn!(component_id = %id, request_id = %open.id, "fabrication request already open");
            return Err(LifecycleError::AlreadyHasOpenRequest {
                component: id.clone(),
                request: open.id,
            });
        }

        let mut transition =
            transitions::apply_transition(&component, LifecycleEvent::DeclareCannotRepair)
                .map_err(|error| self.rejected(&component, error))?;
        let request = approval::open_request(&component, draft, Utc::now());
        let vendor = request
            .vendor_name
            .as_deref()
            .map(|vendor| format!(", vendor {vendor}"))
            .unwrap_or_default();
        transition.description = format!(
            "{} raised by {}: {}{}",
            request.id, request.created_by, request.reason, vendor
        );

        let commit = self
            .stage_transition(transition)?
            .with_fabrication_request(request.clone());
        self.persist(commit)?;
        Ok(request)
    }

    /// Record an approval by `role`. Planner approval sends the component to the vendor.
    pub fn approve(
        &self,
        request_id: &FabricationRequestId,
        role: ApprovalRole,
        approver: &str,
    ) -> Result<ApprovalOutcome, LifecycleError> {
        let request = self.repository.load_fabrication_request(request_id)?;
        let component = self.repository.load(&request.component_id)?;
        let decided = request
            .approve(role, approver, Utc::now())
            .map_err(|error| self.refused(request_id, error))?;

        let event = match role {
            ApprovalRole::GroupLead => LifecycleEvent::GlApprove,
            ApprovalRole::Planner => LifecycleEvent::PlannerApprove,
        };
        let mut transition = transitions::apply_transition(&component, event)
            .map_err(|error| self.rejected(&component, error))?;
        transition.description = format!(
            "{} approved {} by {}; {}",
            role.label(),
            decided.id,
            approver.trim(),
            transition.description
        );

        let commit = self
            .stage_transition(transition)?
            .with_fabrication_request(decided.clone());
        let stored = self.persist(commit)?;
        Ok(ApprovalOutcome {
            request: decided,
            component: stored,
        })
    }

    /// Reject a request at its current step. The component follows the rejection policy.
    pub fn reject(
        &self,
        request_id: &FabricationRequestId,
        role: ApprovalRole,
        approver: &str,
        comment: Option<String>,
    ) -> Result<ApprovalOutcome, LifecycleError> {
        let request = self.repository.load_fabrication_request(request_id)?;
        let component = self.repository.load(&request.component_id)?;
        let decided = request
            .reject(role, approver, comment, Utc::now())
            .map_err(|error| self.refused(request_id, error))?;

        let mut transition = transitions::apply_transition(
            &component,
            LifecycleEvent::RejectFabrication {
                policy: self.policy,
            },
        )
        .map_err(|error| self.rejected(&component, error))?;
        let comment = decided
            .approvals
            .last()
            .and_then(|entry| entry.comment.as_deref())
            .map(|comment| format!(": {comment}"))
            .unwrap_or_default();
        transition.description = format!(
            "{} rejected {} by {}{comment}; {}",
            role.label(),
            decided.id,
            approver.trim(),
            transition.description
        );

        let commit = self
            .stage_transition(transition)?
            .with_fabrication_request(decided.clone());
        let stored = self.persist(commit)?;
        Ok(ApprovalOutcome {
            request: decided,
            component: stored,
        })
    }

    pub fn resume_repair(&self, id: &ComponentId) -> Result<Component, LifecycleError> {
        self.apply_transition(id, LifecycleEvent::ResumeRepair)
    }

    pub fn return_from_vendor(&self, id: &ComponentId) -> Result<Component, LifecycleError> {
        self.apply_transition(id, LifecycleEvent::ReturnFromVendor)
    }

    pub fn archive(&self, id: &ComponentId) -> Result<Component, LifecycleError> {
        self.apply_transition(id, LifecycleEvent::Archive)
    }

    /// Fit an RFU component to a unit, opening a new installation cycle.
    pub fn install(
        &self,
        id: &ComponentId,
        order: InstallOrder,
    ) -> Result<InstallRecord, LifecycleError> {
        let component = self.repository.load(id)?;
        let open = self.repository.load_open_install_record(id)?;
        let record = ledger::open_install(&component, open.as_ref(), order).map_err(|error| {
            warn!(component_id = %id, %error, "install rejected");
            LifecycleError::from(error)
        })?;
        let mut transition = transitions::apply_transition(&component, LifecycleEvent::Install)
            .map_err(|error| self.rejected(&component, error))?;
        transition.description = format!(
            "Installed on unit {} at HM {} ({})",
            record.unit_id, record.hm_start, record.id
        );

        let commit = self
            .stage_transition(transition)?
            .with_install_record(record.clone());
        self.persist(commit)?;
        Ok(record)
    }

    /// Close an installation cycle, accrue its lifetime and send the component to QA-1.
    pub fn remove(
        &self,
        record_id: &InstallRecordId,
        order: RemovalOrder,
    ) -> Result<InstallRecord, LifecycleError> {
        let record = self.repository.load_install_record(record_id)?;
        let component = self.repository.load(&record.component_id)?;
        let closed = ledger::close_install(&record, order).map_err(|error| {
            warn!(install_record = %record_id, %error, "removal rejected");
            LifecycleError::from(error)
        })?;
        let lifetime = closed.lifetime.unwrap_or_default();

        let mut transition = transitions::apply_transition(&component, LifecycleEvent::Remove)
            .map_err(|error| self.rejected(&component, error))?;
        ledger::accrue(&mut transition.component, lifetime)?;
        let reason = closed.removal_reason.as_deref().unwrap_or("no reason given");
        transition.description = format!(
            "Removed from unit {} at HM {}; lifetime {} h, cycle {} ({reason})",
            closed.unit_id,
            closed.hm_end.unwrap_or_default(),
            lifetime,
            transition.component.cycles
        );

        let commit = self
            .stage_transition(transition)?
            .with_install_record(closed.clone());
        self.persist(commit)?;
        Ok(closed)
    }

    /// Record an RFU part leaving stock. The status stays `rfu`.
    pub fn release_from_stock(
        &self,
        id: &ComponentId,
        release: StockRelease,
    ) -> Result<Component, LifecycleError> {
        let component = self.repository.load(id)?;
        ledger::ensure_rfu(&component).map_err(|error| {
            warn!(component_id = %id, %error, "stock release rejected");
            LifecycleError::from(error)
        })?;

        let description = format!(
            "Released on {} to {}, taken by {}",
            release.date_out,
            release.destination.trim(),
            release.taken_by.trim()
        );
        let stored = self.persist(staged(
            ComponentWrite::Swap,
            component,
            TimelineEventKind::Rfu,
            "Component out",
            description,
        ))?;
        info!(component_id = %id, revision = stored.revision, "component released from stock");
        Ok(stored)
    }

    /// Insert components loaded from a register export. Existing ids are left untouched.
    ///
    /// An installed part comes in with its open installation cycle so it can later be
    /// removed like any other fitted part; an installed row without one is skipped.
    pub fn import(&self, rows: Vec<ImportedComponent>) -> Result<ImportOutcome, LifecycleError> {
        let mut outcome = ImportOutcome::default();
        for ImportedComponent {
            mut component,
            install,
        } in rows
        {
            component.revision = 0;
            let install = match (component.status, install) {
                (ComponentStatus::Installed, Some(order)) => {
                    Some(ledger::imported_install(&component, order))
                }
                (ComponentStatus::Installed, None) => {
                    warn!(component_id = %component.id, "installed component has no open installation, skipping import row");
                    outcome.skipped_without_install += 1;
                    continue;
                }
                _ => None,
            };

            let description = match &install {
                Some(record) => format!(
                    "Imported with status {} on unit {} since HM {}",
                    component.status.label(),
                    record.unit_id,
                    record.hm_start
                ),
                None => format!("Imported with status {}", component.status.label()),
            };
            let mut commit = staged(
                ComponentWrite::Insert,
                component,
                TimelineEventKind::Received,
                "Imported from register",
                description,
            );
            if let Some(record) = install {
                commit = commit.with_install_record(record);
            }

            let notification = notification(&commit);
            match self.repository.commit(commit) {
                Ok(stored) => {
                    self.announce(notification);
                    outcome.inserted.push(stored.id);
                }
                Err(RepositoryError::Conflict) => {
                    debug!(component_id = %notification.component_id, "component already registered, skipping import row");
                    outcome.skipped_existing += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
        info!(
            inserted = outcome.inserted.len(),
            skipped = outcome.skipped_existing,
            skipped_without_install = outcome.skipped_without_install,
            "register import committed"
        );
        Ok(outcome)
    }

    pub fn get(&self, id: &ComponentId) -> Result<Component, LifecycleError> {
        debug!(component_id = %id, "loading component");
        Ok(self.repository.load(id)?)
    }

    pub fn components(&self) -> Result<Vec<Component>, LifecycleError> {
        Ok(self.repository.components()?)
    }

    pub fn history(&self, id: &ComponentId) -> Result<ComponentHistory, LifecycleError> {
        let component = self.repository.load(id)?;
        let timeline = self.repository.timeline(id)?;
        let mut qa_records = self.repository.qa_records(id)?;
        if let Some(stage) = component.current_qa_stage() {
            if !qa_records.iter().any(|record| record.stage == stage) {
                qa_records.push(qa::pending_record(id, stage));
            }
        }
        let fabrication_requests = self.repository.fabrication_requests(id)?;
        let installs = self.repository.install_records(id)?;

        Ok(ComponentHistory::assemble(
            &component,
            transitions::available_events(component.status, self.policy),
            qa::stage_progress(&component, &qa_records),
            timeline,
            qa_records,
            fabrication_requests,
            ledger::summarize(&component, &installs),
        ))
    }

    pub fn dashboard(&self) -> Result<DashboardSummary, LifecycleError> {
        let components = self.repository.components()?;
        Ok(DashboardSummary::from_components(&components))
    }

    pub fn qa_queue(
        &self,
        status: Option<ComponentStatus>,
    ) -> Result<Vec<ComponentView>, LifecycleError> {
        let components = self.repository.components()?;
        Ok(report::qa_queue(&components, status))
    }

    pub fn rfu_stock(&self, query: Option<&str>) -> Result<Vec<ComponentView>, LifecycleError> {
        let components = self.repository.components()?;
        Ok(report::rfu_stock(&components, query))
    }

    fn next_component_id(&self, year: i32) -> Result<ComponentId, LifecycleError> {
        let prefix = format!("CMP-{year}-");
        let highest = self
            .repository
            .components()?
            .iter()
            .filter_map(|component| component.id.as_str().strip_prefix(&prefix))
            .filter_map(|sequence| sequence.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(ComponentId(format!("{prefix}{:03}", highest + 1)))
    }

    /// Turn a validated transition into a compare-and-swap commit. Entering QA-1 from
    /// outside QA also returns the sign-offs of the previous pass to pending.
    fn stage_transition(&self, transition: Transition) -> Result<LifecycleCommit, LifecycleError> {
        let Transition {
            component,
            from,
            to,
            kind,
            title,
            description,
        } = transition;

        let reset: Vec<QaRecord> = if from.qa_stage().is_none() && to.qa_stage() == Some(QaStage::FIRST) {
            self.repository
                .qa_records(&component.id)?
                .into_iter()
                .filter(|record| record.is_completed())
                .map(|record| qa::pending_record(&component.id, record.stage))
                .collect()
        } else {
            Vec::new()
        };
        if !reset.is_empty() {
            debug!(component_id = %component.id, stages = reset.len(), "returning QA sign-offs to pending");
        }
        debug!(
            component_id = %component.id,
            from = from.as_str(),
            to = to.as_str(),
            "transition validated"
        );

        Ok(staged(ComponentWrite::Swap, component, kind, &title, description).with_qa_records(reset))
    }

    /// Store every write of one operation together, then announce it.
    fn persist(&self, commit: LifecycleCommit) -> Result<Component, LifecycleError> {
        let id = commit.component.id.clone();
        let notification = notification(&commit);
        let stored = self.repository.commit(commit).map_err(|error| {
            warn!(component_id = %id, %error, "lifecycle commit rejected");
            LifecycleError::from(error)
        })?;
        info!(
            component_id = %stored.id,
            status = stored.status.as_str(),
            revision = stored.revision,
            "lifecycle commit stored"
        );
        self.announce(notification);
        Ok(stored)
    }

    fn announce(&self, notification: Notification) {
        let component_id = notification.component_id.clone();
        if let Err(error) = self.notifications.notify(notification) {
            warn!(%component_id, %error, "notification failed; transition kept");
        }
    }

    fn rejected(&self, component: &Component, error: TransitionError) -> LifecycleError {
        warn!(
            component_id = %component.id,
            status = component.status.as_str(),
            %error,
            "transition rejected"
        );
        LifecycleError::from(error)
    }

    fn refused(&self, request_id: &FabricationRequestId, error: ApprovalError) -> LifecycleError {
        warn!(request_id = %request_id, %error, "approval decision rejected");
        LifecycleError::from(error)
    }
}

/// Build a commit whose timeline entry carries the revision the component is stored at.
fn staged(
    write: ComponentWrite,
    component: Component,
    kind: TimelineEventKind,
    title: &str,
    description: String,
) -> LifecycleCommit {
    let event = TimelineEvent {
        id: timeline_event_id(&component.id, write.stored_revision(&component)),
        component_id: component.id.clone(),
        date: Utc::now(),
        kind,
        title: title.to_string(),
        description,
    };
    LifecycleCommit::new(write, component, event)
}

fn notification(commit: &LifecycleCommit) -> Notification {
    Notification {
        kind: commit.event.kind,
        component_id: commit.component.id.clone(),
        message: format!("{}: {}", commit.event.title, commit.event.description),
    }
}

fn timeline_event_id(component_id: &ComponentId, revision: u64) -> TimelineEventId {
    TimelineEventId(format!("EVT-{component_id}-{revision:04}"))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A completed stage together with the advanced component.
#[derive(Debug, Clone, Serialize)]
pub struct StageSignOff {
    pub record: QaRecord,
    pub component: Component,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub request: FabricationRequest,
    pub component: Component,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub inserted: Vec<ComponentId>,
    pub skipped_existing: usize,
    pub skipped_without_install: usize,
}

/// Error raised by the lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Qa(#[from] QaError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("component {component} already has open fabrication request {request}")]
    AlreadyHasOpenRequest {
        component: ComponentId,
        request: FabricationRequestId,
    },
    #[error("'{event}' must be applied through its dedicated operation")]
    DedicatedOperation { event: &'static str },
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transition(TransitionError::InvalidTransition { .. }) => {
                ErrorKind::InvalidTransition
            }
            Self::Transition(
                TransitionError::StageOutOfOrder { .. } | TransitionError::StageNotCompleted { .. },
            ) => ErrorKind::StageOutOfOrder,
            Self::Qa(QaError::StageOutOfOrder { .. }) => ErrorKind::StageOutOfOrder,
            Self::Qa(QaError::ChecklistIncomplete { .. }) => ErrorKind::ChecklistIncomplete,
            Self::Approval(_) | Self::DedicatedOperation { .. } => ErrorKind::InvalidTransition,
            Self::Ledger(LedgerError::ComponentNotRfu { .. }) => ErrorKind::ComponentNotRfu,
            Self::Ledger(LedgerError::AlreadyInstalled { .. }) => ErrorKind::AlreadyInstalled,
            Self::Ledger(LedgerError::AlreadyRemoved { .. }) => ErrorKind::AlreadyRemoved,
            Self::Ledger(
                LedgerError::InvalidHourMeter { .. } | LedgerError::CounterOverflow { .. },
            ) => ErrorKind::InvalidHourMeter,
            Self::Repository(RepositoryError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Repository(
                RepositoryError::Conflict | RepositoryError::ConcurrentModification { .. },
            ) => ErrorKind::ConcurrentModification,
            Self::Repository(RepositoryError::Timeout { .. }) => ErrorKind::PersistenceTimeout,
            Self::Repository(RepositoryError::Unavailable(_)) => ErrorKind::PersistenceUnavailable,
            Self::AlreadyHasOpenRequest { .. } => ErrorKind::AlreadyHasOpenRequest,
        }
    }
}

/// Closed error taxonomy callers drive user-visible behavior from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidTransition,
    StageOutOfOrder,
    ChecklistIncomplete,
    AlreadyHasOpenRequest,
    #[serde(rename = "ComponentNotRFU")]
    ComponentNotRfu,
    AlreadyInstalled,
    AlreadyRemoved,
    InvalidHourMeter,
    ConcurrentModification,
    PersistenceTimeout,
    NotFound,
    PersistenceUnavailable,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTransition => "InvalidTransition",
            Self::StageOutOfOrder => "StageOutOfOrder",
            Self::ChecklistIncomplete => "ChecklistIncomplete",
            Self::AlreadyHasOpenRequest => "AlreadyHasOpenRequest",
            Self::ComponentNotRfu => "ComponentNotRFU",
            Self::AlreadyInstalled => "AlreadyInstalled",
            Self::AlreadyRemoved => "AlreadyRemoved",
            Self::InvalidHourMeter => "InvalidHourMeter",
            Self::ConcurrentModification => "ConcurrentModification",
            Self::PersistenceTimeout => "PersistenceTimeout",
            Self::NotFound => "NotFound",
            Self::PersistenceUnavailable => "PersistenceUnavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
