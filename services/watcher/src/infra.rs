use slot_watch::config::WatchConfig;
use slot_watch::error::AppError;
use slot_watch::watch::{DeliveryChannel, EmailNotifier, LocationDirectory, LogNotifier};

pub(crate) fn load_directory(config: &WatchConfig) -> Result<LocationDirectory, AppError> {
    match &config.locations_file {
        Some(path) => Ok(LocationDirectory::from_path(path)?),
        None => Ok(LocationDirectory::default()),
    }
}

/// Email when configured and not a dry run, otherwise log-only delivery.
pub(crate) fn delivery_channel(
    config: &WatchConfig,
    dry_run: bool,
) -> Result<DeliveryChannel, AppError> {
    match (&config.email, dry_run) {
        (Some(settings), false) => Ok(DeliveryChannel::Email(Box::new(EmailNotifier::new(
            settings,
        )?))),
        _ => Ok(DeliveryChannel::Log(LogNotifier)),
    }
}
