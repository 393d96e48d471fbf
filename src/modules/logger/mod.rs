use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::logger::file::setup_file_logger;
use crate::modules::settings::cli::Settings;
use crate::raise_error;
use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

mod file;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Installs the global tracing subscriber.
///
/// When file output is enabled the returned guard must be held for the
/// lifetime of the process, otherwise buffered log lines are lost.
pub fn initialize_logging(settings: &Settings) -> BulkMailerResult<Option<WorkerGuard>> {
    let level = parse_log_level(&settings.bulkmailer_log_level)?;
    if settings.bulkmailer_log_to_file {
        setup_file_logger(settings, level).map(Some)
    } else {
        setup_stdout_logger(settings, level).map(|_| None)
    }
}

fn setup_stdout_logger(settings: &Settings, level: Level) -> BulkMailerResult<()> {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(true)
        .with_timer(LocalTimer);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(settings.bulkmailer_ansi_logs)
        .with_writer(std::io::stdout)
        .event_format(format)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

fn parse_log_level(value: &str) -> BulkMailerResult<Level> {
    value.parse::<Level>().map_err(|_| {
        raise_error!(
            format!(
                "Invalid log level specified. Use one of: error, warn, info, debug, trace. \
                 The log level you currently specified is 'bulkmailer_log_level'='{}'",
                value
            ),
            ErrorCode::InvalidParameter
        )
    })
}

#[cfg(test)]
mod tests {
    use super::parse_log_level;
    use tracing::Level;

    #[test]
    fn log_level_parsing() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
