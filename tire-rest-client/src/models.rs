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

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{Error, TransportError};

/// Request timeout. [`Timeout::none`] lets a request run until the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    duration_opt: Option<Duration>,
}

impl Timeout {
    pub const fn none() -> Self {
        Timeout { duration_opt: None }
    }

    pub const fn new(duration: Duration) -> Self {
        Timeout {
            duration_opt: Some(duration),
        }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub const fn from_mins(mins: u64) -> Self {
        Self::new(Duration::from_secs(mins * 60))
    }

    pub fn as_duration_opt(&self) -> Option<Duration> {
        self.duration_opt
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::new(duration)
    }
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: StatusCode,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status_code: StatusCode, body: impl Into<Bytes>) -> Self {
        TransportResponse {
            status_code,
            body: body.into(),
        }
    }

    /// Builds a response with a JSON body. Mostly useful for tests and mock transports.
    pub fn json(status_code: StatusCode, body: &JsonValue) -> Self {
        let body = serde_json::to_vec(body).expect("JSON value serialization should never fail");
        Self::new(status_code, body)
    }

    pub fn is_error(&self) -> bool {
        self.status_code.is_client_error() || self.status_code.is_server_error()
    }

    /// Checks status and returns error if appropriate.
    pub fn check(self) -> Result<Self, Error> {
        if self.is_error() {
            return Err(self.into_transport_error().into());
        }
        Ok(self)
    }

    pub fn into_transport_error(self) -> TransportError {
        TransportError {
            status_code: self.status_code,
            raw_body: String::from_utf8_lossy(&self.body).into_owned(),
        }
    }

    /// Parses the body of a successful response. An empty body is read as `null`.
    pub fn into_json(self) -> Result<JsonValue, Error> {
        let response = self.check()?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonValue::Null);
        }
        let json_value = serde_json::from_slice(&response.body)?;
        Ok(json_value)
    }

    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, Error> {
        let response = self.check()?;
        let object = serde_json::from_slice(&response.body)?;
        Ok(object)
    }
}

/// Options of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOptions {
    /// Type used for documents carrying neither `_type` nor `type`.
    pub default_doc_type: String,
    pub max_batch_num_bytes: usize,
    pub max_batch_num_docs: usize,
}

pub const DEFAULT_DOC_TYPE: &str = "document";
pub const BULK_CONTENT_LENGTH_LIMIT: usize = 10 * 1024 * 1024; // 10MiB
pub const BULK_MAX_BATCH_NUM_DOCS: usize = 1_000;

impl Default for BulkOptions {
    fn default() -> Self {
        BulkOptions {
            default_doc_type: DEFAULT_DOC_TYPE.to_string(),
            max_batch_num_bytes: BULK_CONTENT_LENGTH_LIMIT,
            max_batch_num_docs: BULK_MAX_BATCH_NUM_DOCS,
        }
    }
}

/// Outcome of a bulk import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulkImportReport {
    pub num_batches: usize,
    /// Documents sent to the engine, including the ones it failed to index.
    pub num_docs_sent: usize,
    pub num_docs_failed: usize,
    /// Documents exceeding the batch size limit on their own.
    pub num_docs_skipped: usize,
}

impl BulkImportReport {
    pub fn num_docs_indexed(&self) -> usize {
        self.num_docs_sent - self.num_docs_failed
    }
}
