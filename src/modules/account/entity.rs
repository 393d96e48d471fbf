// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use clap::ValueEnum;
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

/// A sender mailbox and the secret used to authenticate against both the
/// submission server and the mailbox server.
///
/// Created per request and dropped when the request completes.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct Credential {
    /// The sender's email address, also used as the login name.
    #[serde(alias = "email")]
    pub address: String,
    /// The account password or app password.
    #[serde(alias = "pass")]
    pub secret: String,
}

impl Credential {
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.address.trim().is_empty() || self.secret.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("secret", &"******")
            .finish()
    }
}

/// Transport security used when connecting to a mail server.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Serialize, Deserialize, Enum, ValueEnum)]
pub enum Encryption {
    /// SSL/TLS encrypted connection
    #[default]
    #[value(name = "ssl")]
    Ssl,
    /// StartTLS encryption
    #[value(name = "starttls")]
    StartTls,
    /// Unencrypted connection
    #[value(name = "none")]
    None,
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encryption::Ssl => write!(f, "ssl"),
            Encryption::StartTls => write!(f, "starttls"),
            Encryption::None => write!(f, "none"),
        }
    }
}
