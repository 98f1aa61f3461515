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

//! Asynchronous REST client for search engines speaking the Elasticsearch 0.x/1.x dialect.
//!
//! Search requests are assembled with `tire-query`, sent through a [`Transport`] and
//! materialized into a [`tire_query::ResultSet`]. Failed calls are never retried.

mod bulk;
mod curl;
pub mod error;
pub mod models;
pub mod rest_client;
pub mod transport;

pub use curl::to_curl;
pub use error::{Error, TransportError};
pub use models::{BulkImportReport, BulkOptions, Timeout, TransportResponse};
pub use rest_client::{
    DocumentClient, IndexClient, TireClient, TireClientBuilder, DEFAULT_BASE_URL,
};
#[cfg(any(test, feature = "testsuite"))]
pub use transport::MockTransport;
pub use transport::{HttpTransport, Transport, TransportExt};
