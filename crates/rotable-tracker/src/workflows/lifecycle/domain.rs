use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for tracked components (e.g. `CMP-2025-014`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FabricationRequestId(pub String);

impl fmt::Display for FabricationRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstallRecordId(pub String);

impl fmt::Display for InstallRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineEventId(pub String);

impl TimelineEventId {
    /// Component revision encoded in the trailing segment of the id.
    pub fn revision(&self) -> Option<u64> {
        self.0
            .rsplit_once('-')
            .and_then(|(_, revision)| revision.parse().ok())
    }
}

/// Closed set of rotable part categories handled by the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    TrackRoller,
    Idler,
    FinalDrive,
    Sprocket,
    TrackChain,
    CarrierRoller,
}

impl ComponentType {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::TrackRoller,
            Self::Idler,
            Self::FinalDrive,
            Self::Sprocket,
            Self::TrackChain,
            Self::CarrierRoller,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TrackRoller => "Track Roller",
            Self::Idler => "Idler",
            Self::FinalDrive => "Final Drive",
            Self::Sprocket => "Sprocket",
            Self::TrackChain => "Track Chain",
            Self::CarrierRoller => "Carrier Roller",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TrackRoller => "track_roller",
            Self::Idler => "idler",
            Self::FinalDrive => "final_drive",
            Self::Sprocket => "sprocket",
            Self::TrackChain => "track_chain",
            Self::CarrierRoller => "carrier_roller",
        }
    }
}

impl FromStr for ComponentType {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownValue {
                field: "component type",
                value: value.to_string(),
            })
    }
}

/// Raised when a stored or submitted code does not map onto a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

struct StageDefinition {
    code: &'static str,
    status: &'static str,
    title: &'static str,
    status_label: &'static str,
}

const STAGES: [StageDefinition; 7] = [
    StageDefinition {
        code: "QA-1",
        status: "qa-1",
        title: "Delivery Inspection Sheet",
        status_label: "QA-1 Inspection",
    },
    StageDefinition {
        code: "QA-2",
        status: "qa-2",
        title: "Final Inspection Sheet",
        status_label: "QA-2 Final Inspection",
    },
    StageDefinition {
        code: "QA-3",
        status: "qa-3",
        title: "Testing Performance Sheet",
        status_label: "QA-3 Testing",
    },
    StageDefinition {
        code: "QA-4",
        status: "qa-4",
        title: "Guidance Assembly Sheet",
        status_label: "QA-4 Assembly",
    },
    StageDefinition {
        code: "QA-5",
        status: "qa-5",
        title: "Measurement & Inspection Sheet",
        status_label: "QA-5 Measurement",
    },
    StageDefinition {
        code: "QA-6",
        status: "qa-6",
        title: "Guidance Disassembly Sheet",
        status_label: "QA-6 Disassembly",
    },
    StageDefinition {
        code: "QA-7",
        status: "qa-7",
        title: "Receiving Sheet",
        status_label: "QA-7 Receiving",
    },
];

/// One of the seven fixed inspection stages. Always within `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QaStage(u8);

impl QaStage {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(7);
    pub const COUNT: usize = STAGES.len();

    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= STAGES.len() {
            Some(Self(number))
        } else {
            None
        }
    }

    pub fn ordered() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT as u8).map(QaStage)
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub const fn is_last(self) -> bool {
        self.0 == Self::LAST.0
    }

    /// Short code such as `QA-3`.
    pub const fn code(self) -> &'static str {
        STAGES[self.index()].code
    }

    /// Inspection sheet title such as `Testing Performance Sheet`.
    pub const fn title(self) -> &'static str {
        STAGES[self.index()].title
    }

    const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for QaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("QA stage must be between 1 and 7, got {0}")]
pub struct InvalidQaStage(pub u8);

impl TryFrom<u8> for QaStage {
    type Error = InvalidQaStage;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidQaStage(value))
    }
}

impl From<QaStage> for u8 {
    fn from(stage: QaStage) -> Self {
        stage.0
    }
}

/// Lifecycle state of a component. Serialized with the kebab codes used by the
/// workshop (`qa-3`, `waiting-gl-approval`, `rfu`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentStatus {
    Received,
    Registered,
    Qa(QaStage),
    WaitingFabrication,
    WaitingGlApproval,
    WaitingPlannerApproval,
    VendorRepair,
    Rfu,
    Installed,
    Removed,
    WaitingRepair,
}

impl ComponentStatus {
    pub fn ordered() -> Vec<Self> {
        let mut statuses = vec![Self::Received, Self::Registered];
        statuses.extend(QaStage::ordered().map(Self::Qa));
        statuses.extend([
            Self::WaitingFabrication,
            Self::WaitingGlApproval,
            Self::WaitingPlannerApproval,
            Self::VendorRepair,
            Self::Rfu,
            Self::Installed,
            Self::Removed,
            Self::WaitingRepair,
        ]);
        statuses
    }

    /// The inspection stage, defined only while the component is in QA.
    pub const fn qa_stage(self) -> Option<QaStage> {
        match self {
            Self::Qa(stage) => Some(stage),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Registered => "registered",
            Self::Qa(stage) => STAGES[stage.index()].status,
            Self::WaitingFabrication => "waiting-fabrication",
            Self::WaitingGlApproval => "waiting-gl-approval",
            Self::WaitingPlannerApproval => "waiting-planner-approval",
            Self::VendorRepair => "vendor-repair",
            Self::Rfu => "rfu",
            Self::Installed => "installed",
            Self::Removed => "removed",
            Self::WaitingRepair => "waiting-repair",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::Registered => "Registered",
            Self::Qa(stage) => STAGES[stage.index()].status_label,
            Self::WaitingFabrication => "Waiting Fabrication",
            Self::WaitingGlApproval => "Waiting GL Approval",
            Self::WaitingPlannerApproval => "Waiting Planner Approval",
            Self::VendorRepair => "Vendor Repair",
            Self::Rfu => "Ready For Use",
            Self::Installed => "Installed / In Service",
            Self::Removed => "Removed",
            Self::WaitingRepair => "Waiting Repair",
        }
    }

    pub const fn group(self) -> StatusGroup {
        match self {
            Self::Received | Self::Registered => StatusGroup::Received,
            Self::Qa(_) => StatusGroup::Qa,
            Self::WaitingFabrication | Self::WaitingGlApproval | Self::WaitingPlannerApproval => {
                StatusGroup::Approval
            }
            Self::VendorRepair => StatusGroup::Vendor,
            Self::Rfu => StatusGroup::Rfu,
            Self::Installed => StatusGroup::Installed,
            Self::Removed => StatusGroup::Removed,
            Self::WaitingRepair => StatusGroup::Waiting,
        }
    }

    /// Physically held by the workshop (neither fitted to a unit nor archived).
    pub const fn in_workshop(self) -> bool {
        !matches!(self, Self::Installed | Self::Removed)
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownValue {
                field: "component status",
                value: value.to_string(),
            })
    }
}

impl TryFrom<String> for ComponentStatus {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentStatus> for String {
    fn from(status: ComponentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Coarse grouping used by dashboards and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Received,
    Qa,
    Approval,
    Vendor,
    Rfu,
    Installed,
    Removed,
    Waiting,
}

/// A physical rotable part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub serial_number: Option<String>,
    pub oem_part_number: Option<String>,
    pub model_compatibility: Option<String>,
    pub vendor_reference: Option<String>,
    pub from_unit_id: Option<String>,
    pub date_received: NaiveDate,
    pub condition_notes: Option<String>,
    pub status: ComponentStatus,
    /// Accumulated operating hours across completed installation cycles.
    pub total_lifetime: u64,
    /// Completed installation cycles.
    pub cycles: u32,
    /// Optimistic concurrency token, bumped by the store on every write.
    pub revision: u64,
}

impl Component {
    pub fn current_qa_stage(&self) -> Option<QaStage> {
        self.status.qa_stage()
    }

    pub fn average_lifetime_per_cycle(&self) -> Option<f64> {
        if self.cycles == 0 {
            None
        } else {
            Some(self.total_lifetime as f64 / f64::from(self.cycles))
        }
    }

    pub fn view(&self) -> ComponentView {
        ComponentView {
            id: self.id.clone(),
            component_type: self.component_type,
            type_label: self.component_type.label(),
            serial_number: self.serial_number.clone(),
            status: self.status,
            status_label: self.status.label(),
            status_group: self.status.group(),
            current_qa_stage: self.current_qa_stage(),
            total_lifetime: self.total_lifetime,
            cycles: self.cycles,
            average_lifetime_per_cycle: self.average_lifetime_per_cycle(),
            revision: self.revision,
        }
    }
}

/// Flattened representation returned to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub type_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub status: ComponentStatus,
    pub status_label: &'static str,
    pub status_group: StatusGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_qa_stage: Option<QaStage>,
    pub total_lifetime: u64,
    pub cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_lifetime_per_cycle: Option<f64>,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaRecordStatus {
    Pending,
    Completed,
}

impl QaRecordStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for QaRecordStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownValue {
                field: "QA record status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// One inspection-stage attempt, keyed by `(component_id, stage)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: String,
    pub component_id: ComponentId,
    pub stage: QaStage,
    pub status: QaRecordStatus,
    pub checklist_items: Vec<ChecklistItem>,
    pub mechanic_name: Option<String>,
    pub date_updated: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl QaRecord {
    pub fn is_completed(&self) -> bool {
        self.status == QaRecordStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FabricationStatus {
    Pending,
    GlApproved,
    PlannerApproved,
    Rejected,
}

impl FabricationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::GlApproved => "gl-approved",
            Self::PlannerApproved => "planner-approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting GL",
            Self::GlApproved => "Awaiting Planner",
            Self::PlannerApproved => "Fully Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::PlannerApproved | Self::Rejected)
    }
}

impl FromStr for FabricationStatus {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            Self::Pending,
            Self::GlApproved,
            Self::PlannerApproved,
            Self::Rejected,
        ]
        .into_iter()
        .find(|status| status.as_str() == value)
        .ok_or_else(|| UnknownValue {
            field: "fabrication status",
            value: value.to_string(),
        })
    }
}

/// Approver tier for fabrication requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRole {
    GroupLead,
    Planner,
}

impl ApprovalRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::GroupLead => "GL",
            Self::Planner => "Planner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEntry {
    pub role: ApprovalRole,
    pub approver: String,
    pub decision: ApprovalDecision,
    pub decided_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Outsourced repair request raised when a component cannot be repaired internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricationRequest {
    pub id: FabricationRequestId,
    pub component_id: ComponentId,
    pub component_type: ComponentType,
    pub reason: String,
    pub vendor_name: Option<String>,
    pub estimated_cost: u64,
    pub notes: Option<String>,
    pub attachment: Option<String>,
    pub status: FabricationStatus,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
    pub approvals: Vec<ApprovalEntry>,
}

impl FabricationRequest {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// One installation cycle of a component on an equipment unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    pub id: InstallRecordId,
    pub component_id: ComponentId,
    pub component_type: ComponentType,
    pub unit_id: String,
    pub install_date: NaiveDate,
    pub hm_start: u64,
    pub remove_date: Option<NaiveDate>,
    pub hm_end: Option<u64>,
    pub lifetime: Option<u64>,
    pub removal_reason: Option<String>,
}

impl InstallRecord {
    pub fn is_open(&self) -> bool {
        self.remove_date.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    Received,
    Qa,
    Repair,
    Vendor,
    Rfu,
    Installed,
    Removed,
    Fabrication,
    Approval,
}

impl TimelineEventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Qa => "qa",
            Self::Repair => "repair",
            Self::Vendor => "vendor",
            Self::Rfu => "rfu",
            Self::Installed => "installed",
            Self::Removed => "removed",
            Self::Fabrication => "fabrication",
            Self::Approval => "approval",
        }
    }
}

impl FromStr for TimelineEventKind {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            Self::Received,
            Self::Qa,
            Self::Repair,
            Self::Vendor,
            Self::Rfu,
            Self::Installed,
            Self::Removed,
            Self::Fabrication,
            Self::Approval,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == value)
        .ok_or_else(|| UnknownValue {
            field: "timeline event kind",
            value: value.to_string(),
        })
    }
}

/// Append-only audit entry. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: TimelineEventId,
    pub component_id: ComponentId,
    pub date: DateTime<Utc>,
    pub kind: TimelineEventKind,
    pub title: String,
    pub description: String,
}

/// Receiving form for a component arriving at the workshop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentIntake {
    #[serde(default)]
    pub id: Option<ComponentId>,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub from_unit_id: Option<String>,
    pub date_received: NaiveDate,
    #[serde(default)]
    pub condition_notes: Option<String>,
}

/// Master data captured when a received component is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDetails {
    #[serde(default)]
    pub oem_part_number: Option<String>,
    #[serde(default)]
    pub model_compatibility: Option<String>,
    #[serde(default)]
    pub vendor_reference: Option<String>,
}

/// Mechanic sign-off for one inspection stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCompletion {
    pub mechanic_name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub checklist_items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricationDraft {
    pub reason: String,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub estimated_cost: u64,
    pub created_by: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOrder {
    pub unit_id: String,
    pub hm_start: u64,
    pub install_date: NaiveDate,
}

/// A register row ready to be inserted. Parts already in service carry the
/// installation they are currently running on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedComponent {
    pub component: Component,
    pub install: Option<InstallOrder>,
}

impl ImportedComponent {
    pub fn new(component: Component) -> Self {
        Self {
            component,
            install: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOrder {
    pub hm_end: u64,
    pub remove_date: NaiveDate,
    pub reason: String,
}

/// "Component out" slip for an RFU part leaving stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRelease {
    pub date_out: NaiveDate,
    pub taken_by: String,
    pub destination: String,
}
