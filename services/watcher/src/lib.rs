mod cli;
mod infra;
mod runner;

use slot_watch::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
