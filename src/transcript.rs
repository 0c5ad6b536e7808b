//! Printing of request/response transcripts.

use std::io::{self, Write};

use reqwest::Request;
use reqwest::header::{self, HeaderMap};

use crate::client::ApiResponse;

const BINARY_NOTE: &str = "+-----------------------------------------+\n\
                           | NOTE: binary data not shown in terminal |\n\
                           +-----------------------------------------+";

/// Writes what was sent and received, HTTPie style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transcript {
    /// Include the request and the response headers
    pub verbose: bool,
}

impl Transcript {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn write_request<W: Write>(&self, out: &mut W, request: &Request) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        let url = request.url();
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        writeln!(out, "{} {} HTTP/1.1", request.method(), target)?;
        if let Some(host) = url.host_str() {
            match url.port() {
                Some(port) => writeln!(out, "Host: {host}:{port}")?,
                None => writeln!(out, "Host: {host}")?,
            }
        }
        write_headers(out, request.headers())?;
        writeln!(out)?;

        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            write_body(out, body, is_json_type(request.headers()))?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_response<W: Write>(&self, out: &mut W, response: &ApiResponse) -> io::Result<()> {
        if self.verbose {
            writeln!(out, "{:?} {}", response.version, response.status)?;
            write_headers(out, &response.headers)?;
            writeln!(out)?;
        }
        if !response.body.is_empty() {
            write_body(out, &response.body, response.is_json())?;
        }
        Ok(())
    }
}

fn is_json_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn write_headers<W: Write>(out: &mut W, headers: &HeaderMap) -> io::Result<()> {
    for (name, value) in headers {
        let value = if *name == header::AUTHORIZATION {
            mask_authorization(value.to_str().unwrap_or(""))
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        writeln!(out, "{}: {}", title_case(name.as_str()), value)?;
    }
    Ok(())
}

fn write_body<W: Write>(out: &mut W, body: &[u8], json: bool) -> io::Result<()> {
    let Ok(text) = std::str::from_utf8(body) else {
        return writeln!(out, "{BINARY_NOTE}");
    };
    if json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
            let pretty = serde_json::to_string_pretty(&value).map_err(io::Error::other)?;
            return writeln!(out, "{pretty}");
        }
    }
    if text.ends_with('\n') {
        write!(out, "{text}")
    } else {
        writeln!(out, "{text}")
    }
}

/// Keep the scheme, hide the credential.
fn mask_authorization(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{scheme} ********"),
        None => "********".to_string(),
    }
}

/// `content-type` -> `Content-Type`
fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
