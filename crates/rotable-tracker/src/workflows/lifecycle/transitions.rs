//! Status transition engine.
//!
//! A deterministic function of (current status, event, guard). It performs no I/O; the
//! service persists the returned component and appends a timeline entry built from the
//! returned description.

use serde::{Deserialize, Serialize};

use super::domain::{
    Component, ComponentStatus, QaRecordStatus, QaStage, TimelineEventKind,
};

/// What happens to a component when its fabrication request is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionPolicy {
    /// Back to the first inspection stage for internal rework.
    #[default]
    ReturnToQa,
    /// Parked in `waiting-repair` until someone resumes the repair.
    HoldForRepair,
}

impl RejectionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "return-to-qa" | "return_to_qa" | "qa" => Some(Self::ReturnToQa),
            "hold-for-repair" | "hold_for_repair" | "waiting-repair" => Some(Self::HoldForRepair),
            _ => None,
        }
    }
}

/// Events accepted by the engine. Guards travel with the event that needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ConfirmRegistration,
    CompleteQaStage {
        stage: QaStage,
        record: QaRecordStatus,
    },
    DeclareCannotRepair,
    GlApprove,
    PlannerApprove,
    RejectFabrication {
        policy: RejectionPolicy,
    },
    ResumeRepair,
    ReturnFromVendor,
    Install,
    Remove,
    Archive,
}

impl LifecycleEvent {
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConfirmRegistration => "confirm_registration",
            Self::CompleteQaStage { .. } => "complete_qa_stage",
            Self::DeclareCannotRepair => "declare_cannot_repair",
            Self::GlApprove => "gl_approve",
            Self::PlannerApprove => "planner_approve",
            Self::RejectFabrication { .. } => "reject_fabrication",
            Self::ResumeRepair => "resume_repair",
            Self::ReturnFromVendor => "return_from_vendor",
            Self::Install => "install",
            Self::Remove => "remove",
            Self::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot apply '{attempted}' while component is '{current}'")]
    InvalidTransition {
        current: ComponentStatus,
        attempted: &'static str,
    },
    #[error("stage {attempted} is out of order (current stage: {})", display_stage(.current))]
    StageOutOfOrder {
        current: Option<QaStage>,
        attempted: QaStage,
    },
    #[error("stage {stage} record is not completed")]
    StageNotCompleted { stage: QaStage },
}

fn display_stage(stage: &Option<QaStage>) -> String {
    stage
        .map(|stage| stage.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Result of a legal transition: the next component state plus audit text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub component: Component,
    pub from: ComponentStatus,
    pub to: ComponentStatus,
    pub kind: TimelineEventKind,
    pub title: String,
    pub description: String,
}

/// Validate `event` against the component's current status and compute the next state.
///
/// Only the status changes; counters and descriptive fields are left to their owners.
pub fn apply_transition(
    component: &Component,
    event: LifecycleEvent,
) -> Result<Transition, TransitionError> {
    let from = component.status;
    let (to, kind, title) = next_status(from, event)?;

    let description = match event {
        LifecycleEvent::CompleteQaStage { stage, .. } if to == ComponentStatus::Rfu => format!(
            "{} ({}) completed; all inspection stages passed, moved to stock",
            stage.code(),
            stage.title()
        ),
        LifecycleEvent::CompleteQaStage { stage, .. } => format!(
            "{} ({}) completed; entering {}",
            stage.code(),
            stage.title(),
            to.label()
        ),
        _ => format!("{} -> {}", from.label(), to.label()),
    };

    let mut next = component.clone();
    next.status = to;

    Ok(Transition {
        component: next,
        from,
        to,
        kind,
        title: title.to_string(),
        description,
    })
}

fn next_status(
    from: ComponentStatus,
    event: LifecycleEvent,
) -> Result<(ComponentStatus, TimelineEventKind, &'static str), TransitionError> {
    use ComponentStatus as S;
    use LifecycleEvent as E;

    let first = S::Qa(QaStage::FIRST);

    match (from, event) {
        (S::Received | S::Registered, E::ConfirmRegistration) => {
            Ok((first, TimelineEventKind::Qa, "Registered, entered QA-1"))
        }
        (S::Qa(current), E::CompleteQaStage { stage, record }) => {
            if stage != current {
                return Err(TransitionError::StageOutOfOrder {
                    current: Some(current),
                    attempted: stage,
                });
            }
            if record != QaRecordStatus::Completed {
                return Err(TransitionError::StageNotCompleted { stage });
            }
            match current.next() {
                Some(next) => Ok((S::Qa(next), TimelineEventKind::Qa, "QA stage completed")),
                None => Ok((S::Rfu, TimelineEventKind::Rfu, "Ready for use")),
            }
        }
        (_, E::CompleteQaStage { stage, .. }) => Err(TransitionError::StageOutOfOrder {
            current: None,
            attempted: stage,
        }),
        (S::Qa(stage), E::DeclareCannotRepair) if stage == QaStage::FIRST => Ok((
            S::WaitingGlApproval,
            TimelineEventKind::Fabrication,
            "Fabrication requested",
        )),
        (S::WaitingGlApproval, E::GlApprove) => Ok((
            S::WaitingPlannerApproval,
            TimelineEventKind::Approval,
            "GL approved",
        )),
        (S::WaitingPlannerApproval, E::PlannerApprove) => Ok((
            S::VendorRepair,
            TimelineEventKind::Vendor,
            "Planner approved, sent to vendor",
        )),
        (S::WaitingGlApproval | S::WaitingPlannerApproval, E::RejectFabrication { policy }) => {
            match policy {
                RejectionPolicy::ReturnToQa => Ok((
                    first,
                    TimelineEventKind::Approval,
                    "Fabrication rejected, returned to QA-1",
                )),
                RejectionPolicy::HoldForRepair => Ok((
                    S::WaitingRepair,
                    TimelineEventKind::Approval,
                    "Fabrication rejected, waiting repair",
                )),
            }
        }
        (S::WaitingRepair, E::ResumeRepair) => {
            Ok((first, TimelineEventKind::Repair, "Repair resumed, entered QA-1"))
        }
        (S::VendorRepair, E::ReturnFromVendor) => Ok((
            first,
            TimelineEventKind::Vendor,
            "Returned from vendor, entered QA-1",
        )),
        (S::Rfu, E::Install) => Ok((S::Installed, TimelineEventKind::Installed, "Installed")),
        (S::Installed, E::Remove) => Ok((
            first,
            TimelineEventKind::Removed,
            "Removed from unit, sent to QA-1",
        )),
        (current, E::Archive) if current.in_workshop() => {
            Ok((S::Removed, TimelineEventKind::Removed, "Archived"))
        }
        (current, event) => Err(TransitionError::InvalidTransition {
            current,
            attempted: event.name(),
        }),
    }
}

/// Events that are legal from `status`, ignoring guards. Used by read models to
/// advertise the next actions for a component.
pub fn available_events(status: ComponentStatus, policy: RejectionPolicy) -> Vec<LifecycleEvent> {
    let mut candidates = vec![
        LifecycleEvent::ConfirmRegistration,
        LifecycleEvent::DeclareCannotRepair,
        LifecycleEvent::GlApprove,
        LifecycleEvent::PlannerApprove,
        LifecycleEvent::RejectFabrication { policy },
        LifecycleEvent::ResumeRepair,
        LifecycleEvent::ReturnFromVendor,
        LifecycleEvent::Install,
        LifecycleEvent::Remove,
        LifecycleEvent::Archive,
    ];
    if let Some(stage) = status.qa_stage() {
        candidates.insert(
            1,
            LifecycleEvent::CompleteQaStage {
                stage,
                record: QaRecordStatus::Completed,
            },
        );
    }

    candidates
        .into_iter()
        .filter(|event| next_status(status, *event).is_ok())
        .collect()
}

#[cfg(test)]
pub(crate) fn next_status_for_tests(
    from: ComponentStatus,
    event: LifecycleEvent,
) -> Result<ComponentStatus, TransitionError> {
    next_status(from, event).map(|(to, _, _)| to)
}
