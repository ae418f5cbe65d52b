//! Two-step approval over fabrication requests: GL first, then Planner.

use chrono::{DateTime, Utc};

use super::domain::{
    ApprovalDecision, ApprovalEntry, ApprovalRole, Component, FabricationDraft,
    FabricationRequest, FabricationRequestId, FabricationStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    #[error("{} cannot decide a request that is '{}'", .role.label(), .status.label())]
    OutOfSequence {
        status: FabricationStatus,
        role: ApprovalRole,
    },
    #[error("fabrication request is already closed ({})", .status.label())]
    AlreadyClosed { status: FabricationStatus },
}

pub fn request_id(component: &Component) -> FabricationRequestId {
    FabricationRequestId(format!("FAB-{}-{}", component.id, component.revision))
}

/// Open a pending request for a component that cannot be repaired internally.
pub fn open_request(
    component: &Component,
    draft: FabricationDraft,
    created_at: DateTime<Utc>,
) -> FabricationRequest {
    FabricationRequest {
        id: request_id(component),
        component_id: component.id.clone(),
        component_type: component.component_type,
        reason: draft.reason.trim().to_string(),
        vendor_name: trimmed(draft.vendor_name),
        estimated_cost: draft.estimated_cost,
        notes: trimmed(draft.notes),
        attachment: trimmed(draft.attachment),
        status: FabricationStatus::Pending,
        created_date: created_at,
        created_by: draft.created_by.trim().to_string(),
        approvals: Vec::new(),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The role whose decision the request is currently waiting for.
pub fn awaiting(status: FabricationStatus) -> Option<ApprovalRole> {
    match status {
        FabricationStatus::Pending => Some(ApprovalRole::GroupLead),
        FabricationStatus::GlApproved => Some(ApprovalRole::Planner),
        FabricationStatus::PlannerApproved | FabricationStatus::Rejected => None,
    }
}

impl FabricationRequest {
    /// Record an approval by `role`, returning the updated request.
    pub fn approve(
        &self,
        role: ApprovalRole,
        approver: &str,
        decided_at: DateTime<Utc>,
    ) -> Result<FabricationRequest, ApprovalError> {
        self.ensure_turn(role)?;
        let status = match role {
            ApprovalRole::GroupLead => FabricationStatus::GlApproved,
            ApprovalRole::Planner => FabricationStatus::PlannerApproved,
        };
        Ok(self.decided(
            status,
            ApprovalEntry {
                role,
                approver: approver.trim().to_string(),
                decision: ApprovalDecision::Approved,
                decided_at,
                comment: None,
            },
        ))
    }

    /// Reject the request at whichever step it is waiting on. Rejection is terminal.
    pub fn reject(
        &self,
        role: ApprovalRole,
        approver: &str,
        comment: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Result<FabricationRequest, ApprovalError> {
        self.ensure_turn(role)?;
        Ok(self.decided(
            FabricationStatus::Rejected,
            ApprovalEntry {
                role,
                approver: approver.trim().to_string(),
                decision: ApprovalDecision::Rejected,
                decided_at,
                comment: trimmed(comment),
            },
        ))
    }

    fn ensure_turn(&self, role: ApprovalRole) -> Result<(), ApprovalError> {
        match awaiting(self.status) {
            None => Err(ApprovalError::AlreadyClosed {
                status: self.status,
            }),
            Some(expected) if expected != role => Err(ApprovalError::OutOfSequence {
                status: self.status,
                role,
            }),
            Some(_) => Ok(()),
        }
    }

    fn decided(&self, status: FabricationStatus, entry: ApprovalEntry) -> FabricationRequest {
        let mut next = self.clone();
        next.status = status;
        next.approvals.push(entry);
        next
    }
}
