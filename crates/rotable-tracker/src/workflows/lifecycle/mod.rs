//! Rotable component lifecycle: receiving, seven-stage QA, fabrication approvals and
//! install/remove cycles with lifetime accounting.
//!
//! The transition engine, QA controller, approval workflow and ledger are pure; the
//! [`LifecycleService`] sequences them over the persistence and notification ports.

pub mod approval;
pub mod domain;
pub mod ledger;
pub mod qa;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use approval::ApprovalError;
pub use domain::{
    ApprovalDecision, ApprovalEntry, ApprovalRole, ChecklistItem, Component, ComponentId,
    ComponentIntake, ComponentStatus, ComponentType, ComponentView, FabricationDraft,
    FabricationRequest, FabricationRequestId, FabricationStatus, ImportedComponent, InstallOrder,
    InstallRecord, InstallRecordId, QaRecord, QaRecordStatus, QaStage, RegistrationDetails,
    RemovalOrder, StageCompletion, StatusGroup, StockRelease, TimelineEvent, TimelineEventId,
    TimelineEventKind,
};
pub use ledger::{LedgerError, LifetimeSummary};
pub use qa::QaError;
pub use report::{ComponentHistory, DashboardSummary};
pub use repository::{
    ComponentWrite, LifecycleCommit, LifecycleRepository, Notification, NotificationError,
    NotificationSink, RepositoryError,
};
pub use router::lifecycle_router;
pub use service::{
    ApprovalOutcome, ErrorKind, ImportOutcome, LifecycleError, LifecycleService, StageSignOff,
};
pub use store::{
    InMemoryLifecycleStore, InMemoryNotifications, SqliteLifecycleStore, TracingNotifications,
    DEFAULT_STORE_TIMEOUT,
};
pub use transitions::{apply_transition, LifecycleEvent, RejectionPolicy, TransitionError};
