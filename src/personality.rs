//! Dispatcher personalities.
//!
//! A personality fixes the HTTP method, the route and whether a body file is
//! uploaded. The dispatcher binary can be invoked under a personality's name
//! (e.g. through a symlink) or given the name as its first argument.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use reqwest::Method;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::request::{JSON_CONTENT_TYPE, RequestDescriptor, sniff_file};

pub const SUBMIT_REPORT_ROUTE: &str = "submissionapi/v1/submit/report";
pub const SUBMIT_REPORT_FILE_ROUTE: &str = "submissionapi/v1/submit/reportfile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Personality {
    Get,
    Head,
    Post,
    Put,
    Patch,
    /// Submit a report as JSON to the submission API
    Submit,
    /// Upload a file attached to an existing report
    FileSubmit,
}

impl Personality {
    pub const ALL: [Personality; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Submit,
        Self::FileSubmit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Submit => "submit",
            Self::FileSubmit => "filesubmit",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Head => Method::HEAD,
            Self::Post | Self::Submit => Method::POST,
            Self::Put | Self::FileSubmit => Method::PUT,
            Self::Patch => Method::PATCH,
        }
    }

    /// Positional argument synopsis.
    pub fn usage(self) -> String {
        let args = match self {
            Self::Get | Self::Head => "<path>",
            Self::Post | Self::Put | Self::Patch => "<path> <file>",
            Self::Submit => "<file>",
            Self::FileSubmit => "<report-id> <file>",
        };
        format!("{} {} [items...]", self.name(), args)
    }

    /// Personality named by the basename of `argv[0]`, if any.
    pub fn from_invocation(argv0: &str) -> Option<Self> {
        let name = Path::new(argv0).file_stem()?.to_str()?;
        name.parse().ok()
    }

    /// Build the request for this personality from its positional arguments.
    ///
    /// Arguments past the positional ones are request items (headers, query
    /// parameters and inline fields).
    pub fn build(self, config: &ApiConfig, args: &[String]) -> Result<RequestDescriptor> {
        let positional = match self {
            Self::Get | Self::Head | Self::Submit => 1,
            Self::Post | Self::Put | Self::Patch | Self::FileSubmit => 2,
        };
        if args.len() < positional {
            return Err(Error::Usage(self.usage()));
        }
        let (args, items) = args.split_at(positional);

        let mut request = match self {
            Self::Get | Self::Head => RequestDescriptor::new(self.method(), config.url_for(&args[0])),
            Self::Post | Self::Put | Self::Patch => {
                RequestDescriptor::new(self.method(), config.url_for(&args[0]))
                    .with_body(&args[1], JSON_CONTENT_TYPE)
            }
            Self::Submit => RequestDescriptor::new(self.method(), config.url_for(SUBMIT_REPORT_ROUTE))
                .with_body(&args[0], JSON_CONTENT_TYPE),
            Self::FileSubmit => {
                let (report_id, file) = (&args[0], Path::new(&args[1]));
                let url = report_file_url(config, report_id, file)?;
                let content_type = sniff_file(file)?;
                RequestDescriptor::new(self.method(), url).with_body(file, content_type)
            }
        };

        request.apply_items(items)?;
        Ok(request)
    }
}

/// `<base>submissionapi/v1/submit/reportfile/<id>/<file basename>`
pub fn report_file_url(config: &ApiConfig, report_id: &str, file: &Path) -> Result<String> {
    let report_id = report_id.trim();
    if report_id.is_empty() || report_id.contains('/') {
        return Err(Error::Usage(format!("invalid report id '{report_id}'")));
    }
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Usage(format!("not a file name: {}", file.display())))?;

    let mut url = Url::parse(&config.url_for(SUBMIT_REPORT_FILE_ROUTE))
        .map_err(|e| Error::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("cannot add a path to {}", config.base)))?
        .pop_if_empty()
        .push(report_id)
        .push(file_name);
    Ok(url.into())
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Personality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPersonality(s.to_string()))
    }
}
