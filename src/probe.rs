//! Default-password audit.
//!
//! For each username the prober tries `username + suffix` against the token
//! endpoint. An accepted login means the account still uses the default
//! password. A rejected login cannot tell a changed password apart from a
//! username that does not exist, so both land in the same list.

use std::fmt;
use std::io::Write;

use reqwest::Client;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Result;
use crate::types::{ProbeOutcome, ProbeRecord, TokenRequest};

pub const DEFAULT_ENDPOINT: &str = "https://backend.deqar.eu/accounts/get_token/";
pub const DEFAULT_SUFFIX: &str = "#2018";
pub const PROGRESS_MARKER: &str = ".";

pub struct Prober {
    http_client: Client,
    endpoint: String,
    suffix: String,
    /// Report network errors and 5xx responses in their own list
    separate_errors: bool,
}

impl Prober {
    pub fn new(http_client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
            separate_errors: false,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_separate_errors(mut self, separate_errors: bool) -> Self {
        self.separate_errors = separate_errors;
        self
    }

    pub fn password_for(&self, username: &str) -> String {
        format!("{}{}", username, self.suffix)
    }

    /// Try the default password for one username.
    pub async fn probe(&self, username: &str) -> ProbeOutcome {
        let password = self.password_for(username);
        let body = TokenRequest {
            username,
            password: &password,
        };

        let result = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ProbeOutcome::DefaultPassword,
            Ok(response) if response.status().is_server_error() && self.separate_errors => {
                tracing::warn!("{}: server error {}", username, response.status());
                ProbeOutcome::Unreachable
            }
            Ok(response) => {
                tracing::debug!("{}: rejected with {}", username, response.status());
                ProbeOutcome::ChangedOrUnknown
            }
            Err(e) => {
                tracing::warn!("{}: request failed: {}", username, e);
                if self.separate_errors {
                    ProbeOutcome::Unreachable
                } else {
                    ProbeOutcome::ChangedOrUnknown
                }
            }
        }
    }

    /// Probe every username read from `input`, one line each, in order.
    ///
    /// A progress marker is written for each processed line. Lines that are
    /// not valid UTF-8 are logged and skipped.
    pub async fn run<R, W>(&self, mut input: R, progress: &mut W) -> Result<ProbeReport>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut report = ProbeReport::new(self.separate_errors);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_no += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                tracing::warn!("line {}: username is not valid UTF-8, skipped", line_no);
                continue;
            };
            let username = line.trim_end_matches(['\n', '\r']);
            if username.trim().is_empty() {
                continue;
            }
            let outcome = self.probe(username).await;
            write!(progress, "{PROGRESS_MARKER}")?;
            progress.flush()?;
            report.push(ProbeRecord {
                username: username.to_string(),
                outcome,
            });
        }

        Ok(report)
    }
}

/// Usernames grouped by outcome, each list in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub records: Vec<ProbeRecord>,
    separate_errors: bool,
}

impl ProbeReport {
    pub fn new(separate_errors: bool) -> Self {
        Self {
            records: Vec::new(),
            separate_errors,
        }
    }

    pub fn push(&mut self, record: ProbeRecord) {
        self.records.push(record);
    }

    pub fn usernames(&self, outcome: ProbeOutcome) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.username.as_str())
            .collect()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Default passwords: {}",
            self.usernames(ProbeOutcome::DefaultPassword).join(", ")
        )?;
        write!(
            f,
            "Passwords changed or users unknown: {}",
            self.usernames(ProbeOutcome::ChangedOrUnknown).join(", ")
        )?;
        if self.separate_errors {
            write!(
                f,
                "\nProbe failed (network or server error): {}",
                self.usernames(ProbeOutcome::Unreachable).join(", ")
            )?;
        }
        Ok(())
    }
}
