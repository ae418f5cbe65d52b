//! SQLite adapter behavior: round trips, compare-and-swap, atomic commits and durability
//! across reopen.

use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use rotable_tracker::workflows::lifecycle::qa::{default_checklist, pending_record};
use rotable_tracker::workflows::lifecycle::{
    ApprovalDecision, ApprovalEntry, ApprovalRole, Component, ComponentId, ComponentStatus,
    ComponentType, FabricationRequest, FabricationRequestId, FabricationStatus, InstallRecord,
    InstallRecordId, LifecycleCommit, LifecycleRepository, QaRecordStatus, QaStage,
    RepositoryError,
    SqliteLifecycleStore, TimelineEvent, TimelineEventId, TimelineEventKind,
    DEFAULT_STORE_TIMEOUT,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn idler() -> Component {
    Component {
        id: ComponentId("CMP-2025-052".to_string()),
        component_type: ComponentType::Idler,
        serial_number: Some("SN-ID-52".to_string()),
        oem_part_number: None,
        model_compatibility: Some("PC2000".to_string()),
        vendor_reference: None,
        from_unit_id: None,
        date_received: date(2025, 1, 20),
        condition_notes: Some("seal weeping".to_string()),
        status: ComponentStatus::Qa(QaStage::new(4).expect("stage")),
        total_lifetime: 6_400,
        cycles: 3,
        revision: 0,
    }
}

fn store() -> SqliteLifecycleStore {
    SqliteLifecycleStore::open_in_memory(DEFAULT_STORE_TIMEOUT).expect("sqlite opens")
}

#[test]
fn components_round_trip_exactly() {
    let store = store();
    let inserted = store.insert_component(idler()).expect("insert");

    assert_eq!(store.load(&inserted.id).expect("load"), idler());
    assert_eq!(store.components().expect("list"), vec![idler()]);
}

#[test]
fn duplicate_ids_conflict_and_missing_ids_are_not_found() {
    let store = store();
    store.insert_component(idler()).expect("insert");

    assert_eq!(store.insert_component(idler()), Err(RepositoryError::Conflict));
    assert!(matches!(
        store.load(&ComponentId("CMP-2025-999".to_string())),
        Err(RepositoryError::NotFound { entity: "component", .. })
    ));
}

#[test]
fn save_bumps_revision_and_rejects_stale_copies() {
    let store = store();
    let original = store.insert_component(idler()).expect("insert");

    let mut next = original.clone();
    next.status = ComponentStatus::Qa(QaStage::new(5).expect("stage"));
    let saved = store.save(next).expect("fresh copy saves");
    assert_eq!(saved.revision, 1);
    assert_eq!(store.load(&original.id).expect("load").revision, 1);

    assert_eq!(
        store.save(original),
        Err(RepositoryError::ConcurrentModification {
            expected: 0,
            actual: 1,
        })
    );

    let mut unknown = idler();
    unknown.id = ComponentId("CMP-2025-404".to_string());
    assert!(matches!(
        store.save(unknown),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn qa_records_are_replaced_per_stage() {
    let store = store();
    let component = idler();
    let stage = QaStage::new(4).expect("stage");

    store
        .save_qa_record(pending_record(&component.id, stage))
        .expect("pending saved");

    let mut completed = pending_record(&component.id, stage);
    completed.status = QaRecordStatus::Completed;
    completed.checklist_items = default_checklist()
        .into_iter()
        .map(|mut item| {
            item.checked = true;
            item
        })
        .collect();
    completed.mechanic_name = Some("R. Santos".to_string());
    completed.date_updated = Some(Utc.with_ymd_and_hms(2025, 2, 1, 7, 0, 0).unwrap());
    store.save_qa_record(completed.clone()).expect("completed saved");

    assert_eq!(store.qa_records(&component.id).expect("list"), vec![completed.clone()]);
    assert_eq!(
        store.load_qa_record(&component.id, stage).expect("load"),
        Some(completed)
    );
    assert_eq!(
        store
            .load_qa_record(&component.id, QaStage::FIRST)
            .expect("load"),
        None
    );
}

#[test]
fn install_records_track_the_open_cycle() {
    let store = store();
    let component = idler();
    let mut record = InstallRecord {
        id: InstallRecordId("INS-CMP-2025-052-7".to_string()),
        component_id: component.id.clone(),
        component_type: component.component_type,
        unit_id: "EX-11".to_string(),
        install_date: date(2025, 3, 1),
        hm_start: 12_000,
        remove_date: None,
        hm_end: None,
        lifetime: None,
        removal_reason: None,
    };
    store.save_install_record(record.clone()).expect("open saved");
    assert_eq!(
        store.load_open_install_record(&component.id).expect("load"),
        Some(record.clone())
    );

    record.remove_date = Some(date(2025, 6, 1));
    record.hm_end = Some(12_400);
    record.lifetime = Some(400);
    record.removal_reason = Some("noise".to_string());
    store.save_install_record(record.clone()).expect("closed saved");

    assert_eq!(store.load_open_install_record(&component.id).expect("load"), None);
    assert_eq!(store.load_install_record(&record.id).expect("load"), record);
    assert_eq!(store.install_records(&component.id).expect("list").len(), 1);
}

#[test]
fn fabrication_requests_keep_their_approvals() {
    let store = store();
    let component = idler();
    let created = Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap();
    let mut request = FabricationRequest {
        id: FabricationRequestId("FAB-CMP-2025-052-2".to_string()),
        component_id: component.id.clone(),
        component_type: component.component_type,
        reason: "Flange cracked".to_string(),
        vendor_name: None,
        estimated_cost: 3_000_000,
        notes: Some("photo on file".to_string()),
        attachment: None,
        status: FabricationStatus::Pending,
        created_date: created,
        created_by: "A. Wijaya".to_string(),
        approvals: Vec::new(),
    };
    store.save_fabrication_request(request.clone()).expect("saved");
    assert_eq!(
        store.load_open_fabrication_request(&component.id).expect("load"),
        Some(request.clone())
    );

    request.status = FabricationStatus::Rejected;
    request.approvals.push(ApprovalEntry {
        role: ApprovalRole::GroupLead,
        approver: "B. Hartono".to_string(),
        decision: ApprovalDecision::Rejected,
        decided_at: created + chrono::Duration::hours(2),
        comment: Some("repair in house".to_string()),
    });
    store.save_fabrication_request(request.clone()).expect("updated");

    assert_eq!(store.load_open_fabrication_request(&component.id).expect("load"), None);
    assert_eq!(store.load_fabrication_request(&request.id).expect("load"), request);
    assert_eq!(store.fabrication_requests(&component.id).expect("list"), vec![request]);
}

#[test]
fn timeline_is_append_only_and_ordered() {
    let store = store();
    let component = idler();
    let event = |revision: u64, hour: u32, kind: TimelineEventKind| TimelineEvent {
        id: TimelineEventId(format!("EVT-{}-{revision:04}", component.id)),
        component_id: component.id.clone(),
        date: Utc.with_ymd_and_hms(2025, 2, 1, hour, 0, 0).unwrap(),
        kind,
        title: kind.as_str().to_string(),
        description: String::new(),
    };

    store
        .append_timeline_event(event(1, 9, TimelineEventKind::Qa))
        .expect("first");
    store
        .append_timeline_event(event(0, 8, TimelineEventKind::Received))
        .expect("second");
    assert_eq!(
        store.append_timeline_event(event(1, 10, TimelineEventKind::Qa)),
        Err(RepositoryError::Conflict)
    );

    let timeline = store.timeline(&component.id).expect("timeline");
    assert_eq!(
        timeline.iter().map(|event| event.kind).collect::<Vec<_>>(),
        vec![TimelineEventKind::Received, TimelineEventKind::Qa]
    );
}

fn open_cycle(component: &Component) -> InstallRecord {
    InstallRecord {
        id: InstallRecordId(format!("INS-{}-{}", component.id, component.revision)),
        component_id: component.id.clone(),
        component_type: component.component_type,
        unit_id: "EX-11".to_string(),
        install_date: date(2025, 3, 1),
        hm_start: 12_000,
        remove_date: None,
        hm_end: None,
        lifetime: None,
        removal_reason: None,
    }
}

fn installed_event(component: &Component, revision: u64) -> TimelineEvent {
    TimelineEvent {
        id: TimelineEventId(format!("EVT-{}-{revision:04}", component.id)),
        component_id: component.id.clone(),
        date: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        kind: TimelineEventKind::Installed,
        title: "Installed".to_string(),
        description: "Installed on unit EX-11".to_string(),
    }
}

#[test]
fn commit_writes_component_records_and_event_together() {
    let store = store();
    let stocked = store.insert_component(idler()).expect("insert");
    let mut fitted = stocked.clone();
    fitted.status = ComponentStatus::Installed;
    let stage = QaStage::new(4).expect("stage");

    let stored = store
        .commit(
            LifecycleCommit::swap(fitted, installed_event(&stocked, 1))
                .with_install_record(open_cycle(&stocked))
                .with_qa_records([pending_record(&stocked.id, stage)]),
        )
        .expect("commit");

    assert_eq!(stored.revision, 1);
    assert_eq!(store.load(&stocked.id).expect("load"), stored);
    assert_eq!(
        store.load_open_install_record(&stocked.id).expect("load"),
        Some(open_cycle(&stocked))
    );
    assert_eq!(store.qa_records(&stocked.id).expect("list").len(), 1);
    assert_eq!(store.timeline(&stocked.id).expect("timeline").len(), 1);
}

#[test]
fn failed_commit_rolls_back_every_write() {
    let store = store();
    let stocked = store.insert_component(idler()).expect("insert");
    store
        .append_timeline_event(installed_event(&stocked, 1))
        .expect("event already present");
    let mut fitted = stocked.clone();
    fitted.status = ComponentStatus::Installed;

    let outcome = store.commit(
        LifecycleCommit::swap(fitted, installed_event(&stocked, 1))
            .with_install_record(open_cycle(&stocked))
            .with_qa_records([pending_record(&stocked.id, QaStage::FIRST)]),
    );

    assert_eq!(outcome, Err(RepositoryError::Conflict));
    assert_eq!(store.load(&stocked.id).expect("load"), stocked);
    assert_eq!(store.load_open_install_record(&stocked.id).expect("load"), None);
    assert!(store.qa_records(&stocked.id).expect("list").is_empty());
    assert_eq!(store.timeline(&stocked.id).expect("timeline").len(), 1);
}

#[test]
fn stale_commit_writes_nothing() {
    let store = store();
    let stocked = store.insert_component(idler()).expect("insert");
    store.save(stocked.clone()).expect("someone else moved it");

    let outcome = store.commit(
        LifecycleCommit::swap(stocked.clone(), installed_event(&stocked, 1))
            .with_install_record(open_cycle(&stocked)),
    );

    assert_eq!(
        outcome,
        Err(RepositoryError::ConcurrentModification {
            expected: 0,
            actual: 1,
        })
    );
    assert_eq!(store.install_records(&stocked.id).expect("list"), Vec::new());
    assert!(store.timeline(&stocked.id).expect("timeline").is_empty());
}

#[test]
fn data_survives_reopening_the_database_file() {
    let path = std::env::temp_dir().join(format!(
        "rotable-tracker-{}-{}.db",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));

    {
        let store = SqliteLifecycleStore::open(&path, Duration::from_millis(500)).expect("open");
        store.insert_component(idler()).expect("insert");
    }

    let reopened = SqliteLifecycleStore::open(&path, Duration::from_millis(500)).expect("reopen");
    assert_eq!(reopened.load(&idler().id).expect("load"), idler());
    drop(reopened);
    let _ = std::fs::remove_file(&path);
}
