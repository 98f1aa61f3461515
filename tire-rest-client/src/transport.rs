// Copyright (C) 2024 Quickwit, Inc.
//
// Quickwit is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@quickwit.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, Url};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::curl::to_curl;
use crate::error::Error;
use crate::models::{Timeout, TransportResponse};

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Sends requests to a search engine node.
///
/// Implementations report every response, whatever its status, and leave its interpretation to
/// the caller. See [`TransportExt::execute`].
#[cfg_attr(any(test, feature = "testsuite"), mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Base URL the request paths are relative to.
    fn base_url(&self) -> Url;

    /// Sends a request to `path`, relative to the base URL.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        timeout: Timeout,
    ) -> Result<TransportResponse, Error>;
}

#[async_trait]
pub trait TransportExt: Transport {
    /// Sends a request and parses the JSON body of the response. Error statuses are returned as
    /// [`crate::TransportError`] with the body untouched.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        timeout: Timeout,
    ) -> Result<JsonValue, Error> {
        self.send(method, path, body, timeout).await?.into_json()
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url()
            .join(path)
            .map_err(|error| Error::UrlParse(error.to_string()))
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

/// [`Transport`] over HTTP, backed by reqwest.
pub struct HttpTransport {
    base_url: Url,
    client: Client,
}

impl HttpTransport {
    pub fn new(endpoint: Url, connect_timeout: Timeout) -> Result<Self, Error> {
        let mut base_url = endpoint;
        // Paths are joined to the base URL, which would otherwise drop its last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let mut client_builder = ClientBuilder::new();
        if let Some(duration) = connect_timeout.as_duration_opt() {
            client_builder = client_builder.connect_timeout(duration);
        }
        Ok(Self {
            base_url,
            client: client_builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        timeout: Timeout,
    ) -> Result<TransportResponse, Error> {
        let url = self.url(path)?;
        debug!("{}", to_curl(&method, &url, body.as_deref()));
        let mut request_builder = self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        if let Some(duration) = timeout.as_duration_opt() {
            request_builder = request_builder.timeout(duration);
        }
        if let Some(bytes) = body {
            request_builder = request_builder.body(bytes);
        }
        let response = request_builder.send().await?;
        let status_code = response.status();
        let body = response.bytes().await?;
        trace!(
            method=%method,
            path=%path,
            status_code=%status_code,
            num_bytes=body.len(),
            "received response"
        );
        Ok(TransportResponse { status_code, body })
    }
}
