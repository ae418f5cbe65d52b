//! Racing writers against one component: exactly one wins, the rest persist nothing.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::NaiveDate;
use rotable_tracker::workflows::lifecycle::qa::default_checklist;
use rotable_tracker::workflows::lifecycle::{
    Component, ComponentId, ComponentIntake, ComponentStatus, ComponentType, ErrorKind,
    InMemoryLifecycleStore, InMemoryNotifications, LifecycleRepository, LifecycleService, QaStage,
    RegistrationDetails, RepositoryError, SqliteLifecycleStore, StageCompletion,
    DEFAULT_STORE_TIMEOUT,
};

const WRITERS: usize = 8;

fn component_id() -> ComponentId {
    ComponentId("CMP-2025-077".to_string())
}

fn registered<R: LifecycleRepository + 'static>(
    service: &LifecycleService<R, InMemoryNotifications>,
) -> Component {
    service
        .receive(ComponentIntake {
            id: Some(component_id()),
            component_type: ComponentType::CarrierRoller,
            serial_number: None,
            from_unit_id: Some("EX-04".to_string()),
            date_received: NaiveDate::from_ymd_opt(2025, 5, 9).expect("valid date"),
            condition_notes: None,
        })
        .expect("received");
    service
        .register(&component_id(), RegistrationDetails::default())
        .expect("registered")
}

fn racing_saves<R: LifecycleRepository + 'static>(store: Arc<R>, snapshot: Component) {
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let store = store.clone();
            let barrier = barrier.clone();
            let mut copy = snapshot.clone();
            copy.condition_notes = Some(format!("writer {writer}"));
            thread::spawn(move || {
                barrier.wait();
                store.save(copy)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("writer thread"))
        .collect();

    let winners: Vec<&Component> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one writer wins the swap");
    assert!(results.iter().filter_map(|result| result.as_ref().err()).all(|error| matches!(
        error,
        RepositoryError::ConcurrentModification { .. }
    )));

    let stored = store.load(&snapshot.id).expect("stored");
    assert_eq!(stored.revision, snapshot.revision + 1);
    assert_eq!(stored.condition_notes, winners[0].condition_notes);
}

#[test]
fn only_one_in_memory_save_wins_per_revision() {
    let store = Arc::new(InMemoryLifecycleStore::default());
    let service = LifecycleService::new(store.clone(), Arc::new(InMemoryNotifications::default()));
    let snapshot = registered(&service);

    racing_saves(store, snapshot);
}

#[test]
fn only_one_sqlite_save_wins_per_revision() {
    let store = Arc::new(
        SqliteLifecycleStore::open_in_memory(DEFAULT_STORE_TIMEOUT).expect("sqlite opens"),
    );
    let service = LifecycleService::new(store.clone(), Arc::new(InMemoryNotifications::default()));
    let snapshot = registered(&service);

    racing_saves(store, snapshot);
}

#[test]
fn concurrent_sign_offs_of_one_stage_advance_it_once() {
    let store = Arc::new(InMemoryLifecycleStore::default());
    let service = Arc::new(LifecycleService::new(
        store.clone(),
        Arc::new(InMemoryNotifications::default()),
    ));
    registered(&service);

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let service = service.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut checklist_items = default_checklist();
                checklist_items.iter_mut().for_each(|item| item.checked = true);
                barrier.wait();
                service.complete_stage(
                    &component_id(),
                    QaStage::FIRST,
                    StageCompletion {
                        mechanic_name: format!("mechanic {writer}"),
                        notes: None,
                        checklist_items,
                    },
                )
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("sign-off thread"))
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "the stage is signed off once");
    for error in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(
            matches!(
                error.kind(),
                ErrorKind::ConcurrentModification | ErrorKind::StageOutOfOrder
            ),
            "losers see the race or the advanced stage, got {error:?}"
        );
    }

    let component = service.get(&component_id()).expect("exists");
    assert_eq!(component.status, ComponentStatus::Qa(QaStage::new(2).expect("stage")));
    assert_eq!(component.revision, 2);

    let records = store.qa_records(&component_id()).expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mechanic_name, winners[0].record.mechanic_name);

    let timeline = store.timeline(&component_id()).expect("timeline");
    assert_eq!(timeline.len(), 3);
}
