use std::collections::HashMap;

use serde::Serialize;

use super::domain::{
    Component, ComponentStatus, ComponentType, ComponentView, FabricationRequest, QaRecord,
    QaStage, StatusGroup, TimelineEvent,
};
use super::ledger::LifetimeSummary;
use super::qa::StageProgress;
use super::transitions::LifecycleEvent;

#[derive(Debug, Clone, Serialize)]
pub struct TypeCountEntry {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub type_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageCountEntry {
    pub stage: QaStage,
    pub code: &'static str,
    pub title: &'static str,
    pub count: usize,
}

/// Workshop-wide counters shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub in_workshop: usize,
    pub received: usize,
    pub in_qa: usize,
    pub awaiting_approval: usize,
    pub vendor_repair: usize,
    pub rfu_stock: usize,
    pub installed: usize,
    pub removed: usize,
    pub waiting_repair: usize,
    pub by_type: Vec<TypeCountEntry>,
    pub by_qa_stage: Vec<StageCountEntry>,
}

impl DashboardSummary {
    pub fn from_components(components: &[Component]) -> Self {
        let mut groups: HashMap<StatusGroup, usize> = HashMap::new();
        let mut types: HashMap<ComponentType, usize> = HashMap::new();
        let mut stages: HashMap<QaStage, usize> = HashMap::new();

        for component in components {
            *groups.entry(component.status.group()).or_default() += 1;
            *types.entry(component.component_type).or_default() += 1;
            if let Some(stage) = component.current_qa_stage() {
                *stages.entry(stage).or_default() += 1;
            }
        }

        let count = |group: StatusGroup| groups.get(&group).copied().unwrap_or(0);

        let by_type = ComponentType::ordered()
            .into_iter()
            .map(|component_type| TypeCountEntry {
                component_type,
                type_label: component_type.label(),
                count: types.get(&component_type).copied().unwrap_or(0),
            })
            .collect();

        let by_qa_stage = QaStage::ordered()
            .map(|stage| StageCountEntry {
                stage,
                code: stage.code(),
                title: stage.title(),
                count: stages.get(&stage).copied().unwrap_or(0),
            })
            .collect();

        Self {
            total: components.len(),
            in_workshop: components
                .iter()
                .filter(|component| component.status.in_workshop())
                .count(),
            received: count(StatusGroup::Received),
            in_qa: count(StatusGroup::Qa),
            awaiting_approval: count(StatusGroup::Approval),
            vendor_repair: count(StatusGroup::Vendor),
            rfu_stock: count(StatusGroup::Rfu),
            installed: count(StatusGroup::Installed),
            removed: count(StatusGroup::Removed),
            waiting_repair: count(StatusGroup::Waiting),
            by_type,
            by_qa_stage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageProgressEntry {
    pub stage: QaStage,
    pub code: &'static str,
    pub title: &'static str,
    pub progress: StageProgress,
}

/// Everything known about one component, newest timeline entries first.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHistory {
    pub component: ComponentView,
    pub available_events: Vec<&'static str>,
    pub stage_progress: Vec<StageProgressEntry>,
    pub timeline: Vec<TimelineEvent>,
    pub qa_records: Vec<QaRecord>,
    pub fabrication_requests: Vec<FabricationRequest>,
    pub lifetime: LifetimeSummary,
}

impl ComponentHistory {
    pub(crate) fn assemble(
        component: &Component,
        available: Vec<LifecycleEvent>,
        progress: Vec<(QaStage, StageProgress)>,
        mut timeline: Vec<TimelineEvent>,
        mut qa_records: Vec<QaRecord>,
        mut fabrication_requests: Vec<FabricationRequest>,
        lifetime: LifetimeSummary,
    ) -> Self {
        timeline.sort_by(|left, right| {
            right
                .date
                .cmp(&left.date)
                .then_with(|| right.id.revision().cmp(&left.id.revision()))
                .then_with(|| right.id.cmp(&left.id))
        });
        qa_records.sort_by_key(|record| record.stage);
        fabrication_requests.sort_by(|left, right| right.created_date.cmp(&left.created_date));

        Self {
            component: component.view(),
            available_events: available.into_iter().map(LifecycleEvent::name).collect(),
            stage_progress: progress
                .into_iter()
                .map(|(stage, progress)| StageProgressEntry {
                    stage,
                    code: stage.code(),
                    title: stage.title(),
                    progress,
                })
                .collect(),
            timeline,
            qa_records,
            fabrication_requests,
            lifetime,
        }
    }
}

/// Components waiting on inspection work: in QA, freshly received, or parked for repair.
pub fn qa_queue(components: &[Component], status: Option<ComponentStatus>) -> Vec<ComponentView> {
    let mut queue: Vec<&Component> = components
        .iter()
        .filter(|component| {
            matches!(
                component.status,
                ComponentStatus::Qa(_) | ComponentStatus::Received | ComponentStatus::WaitingRepair
            )
        })
        .filter(|component| status.map_or(true, |wanted| component.status == wanted))
        .collect();
    queue.sort_by(|left, right| {
        left.date_received
            .cmp(&right.date_received)
            .then_with(|| left.id.cmp(&right.id))
    });
    queue.into_iter().map(Component::view).collect()
}

/// RFU stock, optionally narrowed by a case-insensitive match on id, type or serial number.
pub fn rfu_stock(components: &[Component], query: Option<&str>) -> Vec<ComponentView> {
    let needle = query
        .map(|query| query.trim().to_lowercase())
        .filter(|query| !query.is_empty());

    let mut stock: Vec<&Component> = components
        .iter()
        .filter(|component| component.status == ComponentStatus::Rfu)
        .filter(|component| match &needle {
            None => true,
            Some(needle) => {
                component.id.as_str().to_lowercase().contains(needle)
                    || component.component_type.label().to_lowercase().contains(needle)
                    || component
                        .serial_number
                        .as_deref()
                        .is_some_and(|serial| serial.to_lowercase().contains(needle))
            }
        })
        .collect();
    stock.sort_by(|left, right| left.id.cmp(&right.id));
    stock.into_iter().map(Component::view).collect()
}
