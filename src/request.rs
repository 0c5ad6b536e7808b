//! Request descriptors and the pass-through request items.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Method;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Bytes inspected when sniffing the content type of an upload.
const SNIFF_LEN: usize = 8192;

/// A single outbound request, built once and sent once.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    /// File whose contents become the request body
    pub body: Option<PathBuf>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Inline JSON body fields, only used when there is no body file
    pub fields: Map<String, Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            content_type: None,
            headers: Vec::new(),
            query: Vec::new(),
            fields: Map::new(),
        }
    }

    pub fn with_body(mut self, path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        self.body = Some(path.into());
        self.content_type = Some(content_type.into());
        self
    }

    /// True when the request uploads a file.
    pub fn is_upload(&self) -> bool {
        self.body.is_some()
    }

    /// Apply trailing `Header:Value`, `name==value`, `name=value` and
    /// `name:=json` arguments.
    pub fn apply_items(&mut self, items: &[String]) -> Result<()> {
        for raw in items {
            match RequestItem::parse(raw)? {
                RequestItem::Header(name, value) => self.headers.push((name, value)),
                RequestItem::Query(name, value) => self.query.push((name, value)),
                RequestItem::Field(name, value) => {
                    self.fields.insert(name, value);
                }
            }
        }
        if !self.fields.is_empty() {
            if self.body.is_some() {
                return Err(Error::Usage(
                    "inline body fields cannot be combined with a body file".to_string(),
                ));
            }
            if self.content_type.is_none() {
                self.content_type = Some(JSON_CONTENT_TYPE.to_string());
            }
        }
        Ok(())
    }

    /// Load the body to send, if any.
    pub async fn load_body(&self) -> Result<Option<Vec<u8>>> {
        if let Some(path) = &self.body {
            let bytes = tokio::fs::read(path).await.map_err(|source| Error::ReadFile {
                path: path.clone(),
                source,
            })?;
            return Ok(Some(bytes));
        }
        if !self.fields.is_empty() {
            return Ok(Some(serde_json::to_vec(&self.fields).map_err(|e| {
                Error::Usage(format!("cannot encode inline fields: {e}"))
            })?));
        }
        Ok(None)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A pass-through argument, in the same syntax HTTPie accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestItem {
    Header(String, String),
    Query(String, String),
    Field(String, Value),
}

impl RequestItem {
    /// Parse an item, splitting on whichever separator appears first.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::RequestItem(raw.to_string());

        for (idx, _) in raw.char_indices() {
            let rest = &raw[idx..];
            let name = raw[..idx].to_string();
            if let Some(value) = rest.strip_prefix(":=") {
                if name.is_empty() {
                    return Err(invalid());
                }
                let value = serde_json::from_str(value).map_err(|_| invalid())?;
                return Ok(RequestItem::Field(name, value));
            }
            if let Some(value) = rest.strip_prefix("==") {
                if name.is_empty() {
                    return Err(invalid());
                }
                return Ok(RequestItem::Query(name, value.to_string()));
            }
            if let Some(value) = rest.strip_prefix('=') {
                if name.is_empty() {
                    return Err(invalid());
                }
                return Ok(RequestItem::Field(name, Value::String(value.to_string())));
            }
            if let Some(value) = rest.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid());
                }
                return Ok(RequestItem::Header(name, value.trim().to_string()));
            }
        }

        Err(invalid())
    }
}

/// Guess a MIME type from the first bytes of a file.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"PK\x03\x04", "application/zip"),
        (b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "application/msword"),
        (b"{\\rtf", "application/rtf"),
    ];

    if let Some(&(_, mime)) = SIGNATURES.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return mime;
    }

    // Anything left must at least be text to get a text type
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        // A multi-byte character may be cut off at the sniff boundary
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return "application/octet-stream",
    };
    if text.contains('\0') {
        return "application/octet-stream";
    }

    let head = text.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with('{') || head.starts_with('[') {
        "application/json"
    } else if head
        .get(..14)
        .is_some_and(|s| s.eq_ignore_ascii_case("<!doctype html"))
    {
        "text/html"
    } else if head.starts_with("<?xml") || head.starts_with('<') {
        if head.to_ascii_lowercase().starts_with("<html") {
            "text/html"
        } else {
            "application/xml"
        }
    } else {
        "text/plain"
    }
}

/// Sniff the content type of a file on disk.
pub fn sniff_file(path: &Path) -> Result<&'static str> {
    use std::io::Read;

    let mut file = std::fs::File::open(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buf)
        .map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(sniff_content_type(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_parse_items() {
        assert_eq!(
            RequestItem::parse("X-Trace: abc").unwrap(),
            RequestItem::Header("X-Trace".into(), "abc".into())
        );
        assert_eq!(
            RequestItem::parse("limit==10").unwrap(),
            RequestItem::Query("limit".into(), "10".into())
        );
        assert_eq!(
            RequestItem::parse("name=Tallinn University").unwrap(),
            RequestItem::Field("name".into(), json!("Tallinn University"))
        );
        assert_eq!(
            RequestItem::parse("ids:=[1,2]").unwrap(),
            RequestItem::Field("ids".into(), json!([1, 2]))
        );
    }

    #[test]
    fn test_first_separator_wins() {
        // Header value may itself contain '='
        assert_eq!(
            RequestItem::parse("Cookie:a=b").unwrap(),
            RequestItem::Header("Cookie".into(), "a=b".into())
        );
        // Query value may contain ':'
        assert_eq!(
            RequestItem::parse("q==a:b").unwrap(),
            RequestItem::Query("q".into(), "a:b".into())
        );
    }

    #[test_case("plain" ; "no separator")]
    #[test_case("=value" ; "empty name")]
    #[test_case("n:={oops" ; "bad json")]
    fn test_parse_rejects(raw: &str) {
        assert!(matches!(RequestItem::parse(raw), Err(Error::RequestItem(_))));
    }

    #[test]
    fn test_apply_items() {
        let mut req = RequestDescriptor::new(Method::GET, "https://x.example/reports/");
        req.apply_items(&["limit==5".into(), "Accept-Language:en".into()])
            .unwrap();
        assert_eq!(req.query, vec![("limit".to_string(), "5".to_string())]);
        assert_eq!(req.headers.len(), 1);
        assert!(req.content_type.is_none());

        let mut req = RequestDescriptor::new(Method::PATCH, "https://x.example/reports/1");
        req.apply_items(&["status=inactive".into()]).unwrap();
        assert_eq!(req.content_type.as_deref(), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_fields_conflict_with_body() {
        let mut req = RequestDescriptor::new(Method::POST, "https://x.example/r")
            .with_body("report.json", JSON_CONTENT_TYPE);
        assert!(matches!(
            req.apply_items(&["a=b".into()]),
            Err(Error::Usage(_))
        ));
    }

    #[test_case(b"%PDF-1.7\n", "application/pdf" ; "pdf")]
    #[test_case(b"\x89PNG\r\n\x1a\n\0\0", "image/png" ; "png")]
    #[test_case(b"PK\x03\x04rest", "application/zip" ; "zip")]
    #[test_case(b"  {\"a\": 1}", "application/json" ; "json object")]
    #[test_case(b"[1, 2]", "application/json" ; "json array")]
    #[test_case(b"<?xml version=\"1.0\"?><r/>", "application/xml" ; "xml")]
    #[test_case(b"<!DOCTYPE html><html></html>", "text/html" ; "html")]
    #[test_case(b"hello\n", "text/plain" ; "text")]
    #[test_case(b"\x00\x01\x02\xff", "application/octet-stream" ; "binary")]
    fn test_sniff(bytes: &[u8], expected: &str) {
        assert_eq!(sniff_content_type(bytes), expected);
    }

    #[test]
    fn test_sniff_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 report").unwrap();
        assert_eq!(sniff_file(file.path()).unwrap(), "application/pdf");
    }

    #[tokio::test]
    async fn test_load_body() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"agency\": \"EQAR\"}").unwrap();

        let req = RequestDescriptor::new(Method::POST, "https://x.example/r")
            .with_body(file.path(), JSON_CONTENT_TYPE);
        assert_eq!(
            req.load_body().await.unwrap().unwrap(),
            b"{\"agency\": \"EQAR\"}".to_vec()
        );

        let mut req = RequestDescriptor::new(Method::POST, "https://x.example/r");
        req.apply_items(&["n:=3".into()]).unwrap();
        assert_eq!(req.load_body().await.unwrap().unwrap(), b"{\"n\":3}".to_vec());

        let req = RequestDescriptor::new(Method::GET, "https://x.example/r");
        assert!(req.load_body().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_body() {
        let req = RequestDescriptor::new(Method::POST, "https://x.example/r")
            .with_body("/nonexistent/report.json", JSON_CONTENT_TYPE);
        assert!(matches!(req.load_body().await, Err(Error::ReadFile { .. })));
    }
}
