use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ChecklistItem, Component, ComponentId, QaRecord, QaRecordStatus, QaStage, StageCompletion,
};

const DEFAULT_CHECKLIST: [&str; 4] = [
    "Inspection step 1",
    "Inspection step 2",
    "Documentation complete",
    "Sign-off ready",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QaError {
    #[error("stage {attempted} is out of order (component is at {})", current_label(.current))]
    StageOutOfOrder {
        current: Option<QaStage>,
        attempted: QaStage,
    },
    #[error("stage {stage} checklist incomplete: {}", unchecked_label(.unchecked))]
    ChecklistIncomplete {
        stage: QaStage,
        unchecked: Vec<String>,
    },
}

fn current_label(current: &Option<QaStage>) -> String {
    current
        .map(|stage| stage.code().to_string())
        .unwrap_or_else(|| "no QA stage".to_string())
}

fn unchecked_label(unchecked: &[String]) -> String {
    if unchecked.is_empty() {
        "no checklist items submitted".to_string()
    } else {
        unchecked.join(", ")
    }
}

/// Catalog entry describing one of the fixed inspection sheets.
#[derive(Debug, Clone, Serialize)]
pub struct StageSheet {
    pub stage: QaStage,
    pub code: &'static str,
    pub title: &'static str,
    pub checklist: Vec<ChecklistItem>,
}

/// The seven inspection sheets in the order a component passes through them.
pub fn stage_catalog() -> Vec<StageSheet> {
    QaStage::ordered()
        .map(|stage| StageSheet {
            stage,
            code: stage.code(),
            title: stage.title(),
            checklist: default_checklist(),
        })
        .collect()
}

pub fn default_checklist() -> Vec<ChecklistItem> {
    DEFAULT_CHECKLIST
        .iter()
        .enumerate()
        .map(|(index, label)| ChecklistItem {
            id: (index + 1).to_string(),
            label: (*label).to_string(),
            checked: false,
        })
        .collect()
}

pub fn record_id(component_id: &ComponentId, stage: QaStage) -> String {
    format!("QA-{}-{}", component_id, stage.number())
}

/// Pending record for a stage the component has not signed off yet.
pub fn pending_record(component_id: &ComponentId, stage: QaStage) -> QaRecord {
    QaRecord {
        id: record_id(component_id, stage),
        component_id: component_id.clone(),
        stage,
        status: QaRecordStatus::Pending,
        checklist_items: default_checklist(),
        mechanic_name: None,
        date_updated: None,
        notes: None,
    }
}

/// Gate a stage sign-off and produce the completed record.
///
/// The record for `(component, stage)` is replaced wholesale; re-inspection overwrites
/// earlier attempts instead of appending.
pub fn complete_stage(
    component: &Component,
    stage: QaStage,
    completion: StageCompletion,
    completed_at: DateTime<Utc>,
) -> Result<QaRecord, QaError> {
    let current = component.current_qa_stage();
    if current != Some(stage) {
        return Err(QaError::StageOutOfOrder {
            current,
            attempted: stage,
        });
    }

    let unchecked: Vec<String> = completion
        .checklist_items
        .iter()
        .filter(|item| !item.checked)
        .map(|item| item.label.clone())
        .collect();
    if completion.checklist_items.is_empty() || !unchecked.is_empty() {
        return Err(QaError::ChecklistIncomplete { stage, unchecked });
    }

    let notes = completion
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    Ok(QaRecord {
        id: record_id(&component.id, stage),
        component_id: component.id.clone(),
        stage,
        status: QaRecordStatus::Completed,
        checklist_items: completion.checklist_items,
        mechanic_name: Some(completion.mechanic_name.trim().to_string()),
        date_updated: Some(completed_at),
        notes,
    })
}

/// Per-stage progress for one component, as rendered by the QA tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    Completed,
    Active,
    Pending,
}

/// While a component is in QA its position decides each stage; stages past the active
/// one are pending whatever records an earlier pass left. Outside QA the stored
/// sign-offs decide.
pub fn stage_progress(component: &Component, records: &[QaRecord]) -> Vec<(QaStage, StageProgress)> {
    let current = component.current_qa_stage();
    QaStage::ordered()
        .map(|stage| {
            let completed = records
                .iter()
                .any(|record| record.stage == stage && record.is_completed());
            let progress = match current {
                Some(active) if active == stage => StageProgress::Active,
                Some(active) if stage < active => StageProgress::Completed,
                Some(_) => StageProgress::Pending,
                None if completed => StageProgress::Completed,
                None => StageProgress::Pending,
            };
            (stage, progress)
        })
        .collect()
}
