use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a `accounts/get_token/` request
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful `accounts/get_token/` response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Outcome of trying a default password for one account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint accepted the default password
    DefaultPassword,
    /// Rejected: the password was changed or the account does not exist
    ChangedOrUnknown,
    /// No usable answer (network error or 5xx)
    Unreachable,
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultPassword => write!(f, "DEFAULT_PASSWORD"),
            Self::ChangedOrUnknown => write!(f, "CHANGED_OR_UNKNOWN"),
            Self::Unreachable => write!(f, "UNREACHABLE"),
        }
    }
}

/// One probed username and its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    pub username: String,
    pub outcome: ProbeOutcome,
}
