// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Encryption;
use clap::{builder::ValueParser, Parser};
use std::{collections::HashSet, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Parser)]
#[clap(
    name = "bulkmailer",
    about = "Sends one HTML message per spreadsheet recipient over SMTP, streams progress,
    and reconciles delivery-failure notices from the sender's IMAP inbox.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// bulkmailer log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for bulkmailer"
    )]
    pub bulkmailer_log_level: String,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub bulkmailer_ansi_logs: bool,

    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub bulkmailer_log_to_file: bool,

    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of server log files"
    )]
    pub bulkmailer_max_server_log_files: usize,

    /// Working directory holding the send log and server logs.
    #[clap(
        long,
        env,
        default_value = ".",
        help = "Set the working directory for the send log and server logs",
        value_parser = ValueParser::new(|s: &str| {
            let path = PathBuf::from(s);
            if path.exists() && !path.is_dir() {
                return Err(format!("Path {:?} is not a directory", path));
            }
            Ok(path)
        })
    )]
    pub bulkmailer_root_dir: PathBuf,

    #[clap(
        long,
        default_value = "send-log.txt",
        env,
        help = "File name of the append-only send log inside the working directory"
    )]
    pub bulkmailer_send_log_file: String,

    /// bulkmailer HTTP port (default: 3001)
    #[clap(
        long,
        default_value = "3001",
        env,
        help = "Set the HTTP port for bulkmailer"
    )]
    pub bulkmailer_http_port: u16,

    #[clap(
        long,
        env,
        default_value = "127.0.0.1",
        help = "The IPv4 address the HTTP server binds to",
        value_parser = ValueParser::new(|s: &str| {
            if s.parse::<std::net::Ipv4Addr>().is_err() {
                return Err("The bind IP address must be a valid IPv4 address.".to_string());
            }
            Ok(s.to_string())
        })
    )]
    pub bulkmailer_bind_ip: String,

    #[clap(
        long,
        default_value = "http://localhost:3001",
        env,
        help = "Set the allowed CORS origins (comma-separated list, e.g., \"https://example.com, https://another.com\")",
        value_parser = ValueParser::new(|s: &str| -> Result<HashSet<String>, String> {
            let set: HashSet<String> = s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            Ok(set)
        })
    )]
    pub bulkmailer_cors_origins: HashSet<String>,

    #[clap(
        long,
        default_value = "26214400",
        env,
        help = "Maximum accepted request body size in bytes"
    )]
    pub bulkmailer_max_request_bytes: usize,

    #[clap(
        long,
        default_value = "smtp.gmail.com",
        env,
        help = "SMTP submission server host"
    )]
    pub bulkmailer_smtp_host: String,

    #[clap(long, default_value = "465", env, help = "SMTP submission server port")]
    pub bulkmailer_smtp_port: u16,

    #[clap(
        long,
        default_value = "ssl",
        env,
        help = "SMTP transport security (ssl, starttls, none)"
    )]
    pub bulkmailer_smtp_encryption: Encryption,

    #[clap(
        long,
        default_value = "30",
        env,
        help = "Timeout in seconds for SMTP connect and commands"
    )]
    pub bulkmailer_smtp_timeout_secs: u64,

    #[clap(
        long,
        default_value = "imap.gmail.com",
        env,
        help = "IMAP server host used for bounce checks"
    )]
    pub bulkmailer_imap_host: String,

    #[clap(long, default_value = "993", env, help = "IMAP server port")]
    pub bulkmailer_imap_port: u16,

    #[clap(
        long,
        default_value = "ssl",
        env,
        help = "IMAP transport security (ssl, starttls, none)"
    )]
    pub bulkmailer_imap_encryption: Encryption,

    #[clap(
        long,
        default_value = "10",
        env,
        help = "Timeout in seconds for IMAP connect and login",
        value_parser = clap::value_parser!(u64).range(1..=300)
    )]
    pub bulkmailer_imap_timeout_secs: u64,

    #[clap(
        long,
        default_value = "mailer-daemon",
        env,
        help = "Sender pattern identifying delivery-failure notifications"
    )]
    pub bulkmailer_mailer_daemon: String,

    #[clap(
        long,
        default_value = "30",
        env,
        help = "Seconds to wait after the last send before checking for bounces",
        value_parser = clap::value_parser!(u64).range(0..=600)
    )]
    pub bulkmailer_bounce_check_delay_secs: u64,

    #[clap(
        long,
        default_value = "64",
        env,
        help = "Number of progress lines buffered per send request",
        value_parser = clap::value_parser!(u64).range(1..=4096)
    )]
    pub bulkmailer_progress_buffer: u64,

    /// JSON array of sender accounts, e.g. [{"address":"me@gmail.com","secret":"app-password"}]
    #[clap(
        long,
        env = "BULKMAILER_ACCOUNTS",
        help = "JSON array of sender accounts offered to the UI"
    )]
    pub bulkmailer_accounts: Option<String>,
}

impl Settings {
    pub fn send_log_path(&self) -> PathBuf {
        self.bulkmailer_root_dir.join(&self.bulkmailer_send_log_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.bulkmailer_root_dir.join("logs")
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.bulkmailer_smtp_timeout_secs)
    }

    pub fn imap_timeout(&self) -> Duration {
        Duration::from_secs(self.bulkmailer_imap_timeout_secs)
    }

    pub fn bounce_check_delay(&self) -> Duration {
        Duration::from_secs(self.bulkmailer_bounce_check_delay_secs)
    }

    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self {
            bulkmailer_log_level: "info".to_string(),
            bulkmailer_ansi_logs: false,
            bulkmailer_log_to_file: false,
            bulkmailer_max_server_log_files: 5,
            bulkmailer_root_dir: std::env::temp_dir(),
            bulkmailer_send_log_file: "send-log.txt".into(),
            bulkmailer_http_port: 3001,
            bulkmailer_bind_ip: "127.0.0.1".into(),
            bulkmailer_cors_origins: Default::default(),
            bulkmailer_max_request_bytes: 26214400,
            bulkmailer_smtp_host: "smtp.gmail.com".into(),
            bulkmailer_smtp_port: 465,
            bulkmailer_smtp_encryption: Encryption::Ssl,
            bulkmailer_smtp_timeout_secs: 30,
            bulkmailer_imap_host: "imap.gmail.com".into(),
            bulkmailer_imap_port: 993,
            bulkmailer_imap_encryption: Encryption::Ssl,
            bulkmailer_imap_timeout_secs: 10,
            bulkmailer_mailer_daemon: "mailer-daemon".into(),
            bulkmailer_bounce_check_delay_secs: 0,
            bulkmailer_progress_buffer: 64,
            bulkmailer_accounts: None,
        }
    }
}
