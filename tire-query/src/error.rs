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

use thiserror::Error;

/// Error raised while assembling a search request. It is always local and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("facet `{name}` is already defined in this request")]
    DuplicateFacet { name: String },
    #[error("query clause is already set and the builder rejects overrides")]
    QueryAlreadySet,
}

/// Error raised when a search response does not have the minimal expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedResponse {
    #[error("response has no `hits` section")]
    MissingHits,
    #[error("response has no `count` field")]
    MissingCount,
    #[error("`hits.hits` is missing or is not a list")]
    HitsNotAList,
    #[error("hit #{position} is invalid: {reason}")]
    InvalidHit { position: usize, reason: String },
    #[error("document is invalid: {reason}")]
    InvalidDocument { reason: String },
    #[error("facet `{name}` is invalid: {reason}")]
    InvalidFacet { name: String, reason: String },
}
