pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod personality;
pub mod probe;
pub mod request;
pub mod transcript;
pub mod types;

pub use client::{ApiResponse, DeqarClient};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use personality::Personality;
pub use probe::{ProbeReport, Prober};
pub use request::RequestDescriptor;
pub use transcript::Transcript;
pub use types::{ProbeOutcome, ProbeRecord};
