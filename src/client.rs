use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request, StatusCode, Version};
use url::form_urlencoded;

use crate::config::{ApiConfig, LoginCredentials};
use crate::error::{Error, Result};
use crate::request::RequestDescriptor;
use crate::types::TokenResponse;

pub const TOKEN_ROUTE: &str = "accounts/get_token/";
pub const USER_AGENT: &str = concat!("deqar-tools/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by every request of a run.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::ClientUnavailable(e.to_string()))
}

/// Response as received, body fully read.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_json(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                let mime = ct.split(';').next().unwrap_or("").trim();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false)
    }
}

/// Client for the DEQAR REST API.
pub struct DeqarClient {
    http_client: Client,
    config: ApiConfig,
    token: Option<String>,
}

impl DeqarClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http_client = build_http_client(config.timeout)?;
        let token = config.token.clone();
        Ok(Self {
            http_client,
            config,
            token,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Obtain a token from the configured login if none was given.
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.token.is_some() {
            tracing::info!("DEQAR_TOKEN variable set");
            return Ok(());
        }
        match self.config.login.clone() {
            Some(login) => {
                tracing::info!("Username [{}] from environment variable", login.username);
                self.token = Some(self.login(&login).await?);
            }
            None => tracing::warn!("no DEQAR_TOKEN set, sending requests without authorization"),
        }
        Ok(())
    }

    /// Exchange username and password for an API token.
    pub async fn login(&self, login: &LoginCredentials) -> Result<String> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &login.username)
            .append_pair("password", &login.password)
            .finish();

        let response = self
            .http_client
            .post(self.config.url_for(TOKEN_ROUTE))
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Login(status.to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Login(format!("unexpected response: {e}")))?;
        tracing::info!("Login successful: {}", status);
        Ok(token.token)
    }

    /// Turn a descriptor into a ready-to-send request, body loaded.
    pub async fn prepare(&self, descriptor: &RequestDescriptor) -> Result<Request> {
        let mut builder = self
            .http_client
            .request(descriptor.method.clone(), &descriptor.url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if !descriptor.query.is_empty() {
            builder = builder.query(&descriptor.query);
        }
        if let Some(content_type) = &descriptor.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &descriptor.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::RequestItem(format!("{name}:{value}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::RequestItem(format!("{name}:{value}")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = descriptor.load_body().await? {
            builder = builder.body(body);
        }

        builder
            .build()
            .map_err(|e| Error::Usage(format!("cannot build request {descriptor}: {e}")))
    }

    pub async fn send(&self, request: Request) -> Result<ApiResponse> {
        tracing::debug!("{} {}", request.method(), request.url());
        let response = self.http_client.execute(request).await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        if status.is_success() {
            tracing::info!("Success: {}", status);
        } else {
            tracing::warn!("Error: {}", status);
        }

        Ok(ApiResponse {
            status,
            version,
            headers,
            body,
        })
    }

    /// Send exactly one request for the descriptor.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        let request = self.prepare(descriptor).await?;
        self.send(request).await
    }
}
