use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use rotable_tracker::error::AppError;
use rotable_tracker::workflows::lifecycle::qa::default_checklist;
use rotable_tracker::workflows::lifecycle::{
    ComponentHistory, ComponentIntake, ComponentType, InMemoryLifecycleStore,
    InMemoryNotifications, InstallOrder, LifecycleService, RegistrationDetails, RemovalOrder,
    StageCompletion,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the component arrives in the workshop (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) received: Option<NaiveDate>,
    /// Hour meter reading when the component is installed.
    #[arg(long, default_value_t = 12_000)]
    pub(crate) hm_start: u64,
    /// Hour meter reading when the component is removed again.
    #[arg(long, default_value_t = 14_350)]
    pub(crate) hm_end: u64,
    /// Print every timeline entry instead of the latest five.
    #[arg(long)]
    pub(crate) full_timeline: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        received,
        hm_start,
        hm_end,
        full_timeline,
    } = args;
    let received = received.unwrap_or_else(|| Local::now().date_naive());

    let notifications = Arc::new(InMemoryNotifications::default());
    let service = LifecycleService::new(
        Arc::new(InMemoryLifecycleStore::default()),
        notifications.clone(),
    );

    println!("Rotable component lifecycle demo");
    let component = service.receive(ComponentIntake {
        id: None,
        component_type: ComponentType::TrackRoller,
        serial_number: Some("SN-TR-DEMO".to_string()),
        from_unit_id: Some("DZ-07".to_string()),
        date_received: received,
        condition_notes: Some("flange wear on outer edge".to_string()),
    })?;
    println!(
        "- Received {} ({}) from DZ-07",
        component.id,
        component.component_type.label()
    );

    let mut component = service.register(
        &component.id,
        RegistrationDetails {
            oem_part_number: Some("OEM-TR-220".to_string()),
            ..RegistrationDetails::default()
        },
    )?;
    println!("- Registered; status {}", component.view().status_label);

    while let Some(stage) = component.current_qa_stage() {
        let mut checklist_items = default_checklist();
        checklist_items.iter_mut().for_each(|item| item.checked = true);
        let sign_off = service.complete_stage(
            &component.id,
            stage,
            StageCompletion {
                mechanic_name: "Demo Mechanic".to_string(),
                notes: None,
                checklist_items,
            },
        )?;
        println!(
            "  - {} {} signed off -> {}",
            stage.code(),
            stage.title(),
            sign_off.component.view().status_label
        );
        component = sign_off.component;
    }

    let install_date = received + Duration::days(7);
    let record = service.install(
        &component.id,
        InstallOrder {
            unit_id: "EX-11".to_string(),
            hm_start,
            install_date,
        },
    )?;
    println!("- Installed on EX-11 at {hm_start} HM ({install_date})");

    let remove_date = install_date + Duration::days(90);
    match service.remove(
        &record.id,
        RemovalOrder {
            hm_end,
            remove_date,
            reason: "scheduled overhaul".to_string(),
        },
    ) {
        Ok(closed) => println!(
            "- Removed at {hm_end} HM ({remove_date}); cycle lifetime {} HM",
            closed.lifetime.unwrap_or_default()
        ),
        Err(err) => {
            println!("  Removal rejected: {err}");
            return Ok(());
        }
    }

    let history = service.history(&component.id)?;
    render_history(&history, full_timeline);

    let dashboard = service.dashboard()?;
    println!(
        "\nWorkshop snapshot: {} tracked | {} in QA | {} RFU stock | {} installed",
        dashboard.total, dashboard.in_qa, dashboard.rfu_stock, dashboard.installed
    );

    let sent = notifications.sent();
    println!("{} notifications announced", sent.len());
    Ok(())
}

fn render_history(history: &ComponentHistory, full_timeline: bool) {
    let view = &history.component;
    println!(
        "\n{} is back in {} after {} cycle(s), {} HM total",
        view.id, view.status_label, history.lifetime.cycles, history.lifetime.total_lifetime
    );
    if let Some(average) = history.lifetime.average_lifetime_per_cycle {
        println!("  Average lifetime per cycle: {average:.0} HM");
    }
    println!("  Next actions: {}", history.available_events.join(", "));

    let shown = if full_timeline {
        history.timeline.len()
    } else {
        history.timeline.len().min(5)
    };
    println!("  Timeline ({} of {}):", shown, history.timeline.len());
    for event in history.timeline.iter().take(shown) {
        println!(
            "    - {} [{}] {}",
            event.date.format("%Y-%m-%d %H:%M"),
            event.kind.as_str(),
            event.title
        );
    }
}
