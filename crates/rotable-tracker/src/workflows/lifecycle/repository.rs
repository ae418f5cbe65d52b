use serde::{Deserialize, Serialize};

use super::domain::{
    Component, ComponentId, FabricationRequest, FabricationRequestId, InstallRecord,
    InstallRecordId, QaRecord, QaStage, TimelineEvent, TimelineEventKind,
};

/// Persistence port. Every call is atomic on its own. State-changing operations go through
/// [`LifecycleRepository::commit`], which applies the component write and its dependent
/// records as one unit.
pub trait LifecycleRepository: Send + Sync {
    /// Apply every write of one lifecycle operation, or none of them.
    ///
    /// `Swap` commits are guarded by the component's `revision` and return the stored copy
    /// with the bumped revision; `Insert` commits fail with `Conflict` when the id is taken.
    fn commit(&self, commit: LifecycleCommit) -> Result<Component, RepositoryError>;

    /// Store a new component. Fails with `Conflict` when the id is taken.
    fn insert_component(&self, component: Component) -> Result<Component, RepositoryError>;
    fn load(&self, id: &ComponentId) -> Result<Component, RepositoryError>;
    /// Replace the stored component when its revision still equals `component.revision`.
    /// Returns the stored copy with the bumped revision.
    fn save(&self, component: Component) -> Result<Component, RepositoryError>;
    fn components(&self) -> Result<Vec<Component>, RepositoryError>;

    fn append_timeline_event(&self, event: TimelineEvent) -> Result<(), RepositoryError>;
    fn timeline(&self, id: &ComponentId) -> Result<Vec<TimelineEvent>, RepositoryError>;

    fn load_qa_record(
        &self,
        id: &ComponentId,
        stage: QaStage,
    ) -> Result<Option<QaRecord>, RepositoryError>;
    fn save_qa_record(&self, record: QaRecord) -> Result<(), RepositoryError>;
    fn qa_records(&self, id: &ComponentId) -> Result<Vec<QaRecord>, RepositoryError>;

    fn load_open_install_record(
        &self,
        id: &ComponentId,
    ) -> Result<Option<InstallRecord>, RepositoryError>;
    fn load_install_record(&self, id: &InstallRecordId) -> Result<InstallRecord, RepositoryError>;
    fn save_install_record(&self, record: InstallRecord) -> Result<(), RepositoryError>;
    fn install_records(&self, id: &ComponentId) -> Result<Vec<InstallRecord>, RepositoryError>;

    fn load_fabrication_request(
        &self,
        id: &FabricationRequestId,
    ) -> Result<FabricationRequest, RepositoryError>;
    fn load_open_fabrication_request(
        &self,
        id: &ComponentId,
    ) -> Result<Option<FabricationRequest>, RepositoryError>;
    fn save_fabrication_request(&self, request: FabricationRequest)
        -> Result<(), RepositoryError>;
    fn fabrication_requests(
        &self,
        id: &ComponentId,
    ) -> Result<Vec<FabricationRequest>, RepositoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentWrite {
    Insert,
    Swap,
}

impl ComponentWrite {
    /// Revision `component` carries once the write is stored.
    pub fn stored_revision(self, component: &Component) -> u64 {
        match self {
            Self::Insert => component.revision,
            Self::Swap => component.revision + 1,
        }
    }
}

/// The writes produced by one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleCommit {
    pub write: ComponentWrite,
    pub component: Component,
    pub qa_records: Vec<QaRecord>,
    pub install_record: Option<InstallRecord>,
    pub fabrication_request: Option<FabricationRequest>,
    pub event: TimelineEvent,
}

impl LifecycleCommit {
    pub fn insert(component: Component, event: TimelineEvent) -> Self {
        Self::new(ComponentWrite::Insert, component, event)
    }

    pub fn swap(component: Component, event: TimelineEvent) -> Self {
        Self::new(ComponentWrite::Swap, component, event)
    }

    pub fn new(write: ComponentWrite, component: Component, event: TimelineEvent) -> Self {
        Self {
            write,
            component,
            qa_records: Vec::new(),
            install_record: None,
            fabrication_request: None,
            event,
        }
    }

    pub fn with_qa_records(mut self, records: impl IntoIterator<Item = QaRecord>) -> Self {
        self.qa_records.extend(records);
        self
    }

    pub fn with_install_record(mut self, record: InstallRecord) -> Self {
        self.install_record = Some(record);
        self
    }

    pub fn with_fabrication_request(mut self, request: FabricationRequest) -> Self {
        self.fabrication_request = Some(request);
        self
    }
}

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("record already exists")]
    Conflict,
    #[error("revision mismatch: expected {expected}, found {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },
    #[error("persistence call timed out after {millis}ms")]
    Timeout { millis: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Outbound fire-and-forget hook for audit and UX feedback.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: TimelineEventKind,
    pub component_id: ComponentId,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
