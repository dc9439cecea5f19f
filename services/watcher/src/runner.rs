use crate::cli::{ConfigArgs, WatchArgs};
use crate::infra::{delivery_channel, load_directory};
use slot_watch::config::WatchConfig;
use slot_watch::error::AppError;
use slot_watch::telemetry;
use slot_watch::watch::{AppointmentWatcher, LocationDirectory, SchedulerApiSource};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch as stop_signal;
use tracing::{debug, info, warn};

pub(crate) async fn watch(args: WatchArgs) -> Result<(), AppError> {
    let WatchArgs {
        config: ConfigArgs { config: config_path },
        once,
        dry_run,
    } = args;

    let config = WatchConfig::load(&config_path)?;
    telemetry::init(&config.telemetry)?;

    info!(config = %config_path.display(), "config file loaded");
    debug!(?config, "effective settings");

    let directory = load_directory(&config)?;
    let source = SchedulerApiSource::new(&config.source)?;
    let channel = delivery_channel(&config, dry_run)?;
    info!(
        locations = config.plan.locations.len(),
        directory_entries = directory.len(),
        delivery = channel.label(),
        "collaborators ready"
    );

    let mut watcher = AppointmentWatcher::new(
        config.plan,
        Arc::new(source),
        Arc::new(channel),
        Arc::new(directory),
    );

    if once {
        let reports = watcher.poll_cycle().await;
        let rendered = serde_json::to_string_pretty(&reports).map_err(std::io::Error::other)?;
        println!("{rendered}");
        return Ok(());
    }

    let (stop_tx, stop_rx) = stop_signal::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received, stopping");
                let _ = stop_tx.send(true);
            }
            Err(err) => {
                warn!(error = %err, "unable to listen for shutdown signal");
                stop_tx.closed().await;
            }
        }
    });

    let summary = watcher.run(stop_rx).await;
    info!(cycles = summary.cycles, reason = ?summary.stop, "watcher finished");
    Ok(())
}

pub(crate) fn check_config(args: ConfigArgs) -> Result<(), AppError> {
    let config = WatchConfig::load(&args.config)?;
    let directory = load_directory(&config)?;
    print!("{}", render_summary(&config, &directory));
    Ok(())
}

fn render_summary(config: &WatchConfig, directory: &LocationDirectory) -> String {
    let plan = &config.plan;
    let mut weekdays: Vec<_> = plan
        .rules
        .excluded_weekdays
        .iter()
        .map(|day| day.num_days_from_monday())
        .collect();
    weekdays.sort_unstable();

    let mut lines = vec![
        "Appointment watch settings".to_string(),
        format!("Cutoff date: {}", plan.rules.cutoff_date),
        format!(
            "Rejected hours: {:02}:59 and earlier",
            plan.rules.excluded_through_hour
        ),
        format!(
            "Rejected weekdays: {}",
            weekdays
                .iter()
                .map(|day| day_name(*day))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!("Notify on: {}", plan.mode.label()),
        format!("Poll interval: {}s", plan.poll_interval.as_secs()),
        format!("Scheduler: {}", config.source.api_base_url),
        match &config.email {
            Some(email) => format!(
                "Delivery: email via {} to {}",
                email.smtp_host,
                email.recipients.join(", ")
            ),
            None => "Delivery: log only".to_string(),
        },
        "Locations".to_string(),
    ];
    lines.extend(
        plan.locations
            .iter()
            .map(|location| format!("- {} ({})", directory.display_name(location), location)),
    );

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

fn day_name(index: u32) -> &'static str {
    match index {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}
