use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::logger::LocalTimer;
use crate::modules::settings::cli::Settings;
use crate::raise_error;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub fn setup_file_logger(settings: &Settings, level: Level) -> BulkMailerResult<WorkerGuard> {
    let (server_nonb, server_guard) = server_log_writer(settings)?;

    let server_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(settings.bulkmailer_ansi_logs)
        .with_level(true)
        .with_writer(server_nonb)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(server_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
    Ok(server_guard)
}

fn server_log_writer(settings: &Settings) -> BulkMailerResult<(NonBlocking, WorkerGuard)> {
    let log_dir = settings.log_dir();
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("server")
        .max_log_files(settings.bulkmailer_max_server_log_files)
        .build(log_dir)
        .map_err(|e| {
            raise_error!(
                format!("failed to initialize rolling file appender: {:#?}", e),
                ErrorCode::InternalError
            )
        })?;
    Ok(tracing_appender::non_blocking(rolling))
}
