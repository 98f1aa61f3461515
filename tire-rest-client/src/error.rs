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

use reqwest::StatusCode;
use thiserror::Error;
use tire_query::{ConfigurationError, MalformedResponse};

#[derive(Error, Debug)]
pub enum Error {
    // Error status returned by the search engine.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    // Error returned by reqwest lib.
    #[error("client error: {0:?}")]
    Client(#[from] reqwest::Error),
    // Invalid search request, raised before anything is sent.
    #[error("invalid search request: {0}")]
    Configuration(#[from] ConfigurationError),
    // Response body without the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] MalformedResponse),
    // Response body that is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    // Error returned by url lib when parsing a string.
    #[error("URL parsing error: {0}")]
    UrlParse(String),
    // IO Error returned by tokio lib.
    #[error("IO error: {0}")]
    Io(#[from] tokio::io::Error),
}

impl Error {
    pub fn status_code(&self) -> Option<StatusCode> {
        match &self {
            Self::Transport(error) => Some(error.status_code),
            Self::Client(error) => error.status(),
            Self::Configuration(_) => Some(StatusCode::BAD_REQUEST),
            Self::MalformedResponse(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Json(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Self::UrlParse(_) => Some(StatusCode::BAD_REQUEST),
            Self::Io(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// Non-success response. The body is kept verbatim, the client does not interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    pub status_code: StatusCode,
    pub raw_body: String,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.raw_body.is_empty() {
            write!(f, "(code={})", self.status_code)
        } else {
            write!(f, "(code={}, body={})", self.status_code, self.raw_body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let error = Error::from(TransportError {
            status_code: StatusCode::NOT_FOUND,
            raw_body: r#"{"error":"IndexMissingException[[articles] missing]","status":404}"#
                .to_string(),
        });
        assert_eq!(error.status_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            error.to_string(),
            r#"transport error: (code=404 Not Found, body={"error":"IndexMissingException[[articles] missing]","status":404})"#
        );
        let error = TransportError {
            status_code: StatusCode::SERVICE_UNAVAILABLE,
            raw_body: String::new(),
        };
        assert_eq!(error.to_string(), "(code=503 Service Unavailable)");
    }

    #[test]
    fn test_configuration_error_status_code() {
        let error = Error::from(ConfigurationError::DuplicateFacet {
            name: "tags".to_string(),
        });
        assert_eq!(error.status_code(), Some(StatusCode::BAD_REQUEST));
    }
}
