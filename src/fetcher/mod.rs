//! Single-request execution primitive.
//!
//! [`RequestExecutor`] issues one HTTP exchange per attempt, bounds it with a
//! timeout, classifies failures into [`SyncError`](crate::app::SyncError)
//! kinds and retries the transient ones with a linear backoff.

pub mod executor;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::{Result, SyncError};
use crate::domain::Credential;

pub use executor::RequestExecutor;

/// Per-call settings. Obtain one from [`RequestExecutor::request`] so the
/// configured defaults are filled in.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RequestOptions {
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn bearer(mut self, credential: &Credential) -> Result<Self> {
        let mut value = HeaderValue::from_str(&credential.bearer_header())
            .map_err(|_| SyncError::Authentication("credential is not a valid header value".into()))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Writes are sent once: a retried POST could create a duplicate.
    pub fn no_retry(self) -> Self {
        self.retries(0)
    }
}

/// Successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
