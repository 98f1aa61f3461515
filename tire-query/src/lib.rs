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

//! Request DSL for a remote search engine speaking the Elasticsearch REST dialect, and the
//! materialization of its responses into typed results.
//!
//! See the query DSL documentation here:
//! <https://www.elastic.co/guide/en/elasticsearch/reference/current/query-dsl.html>

// Nothing in this crate performs I/O: a `SearchRequest` is a plain serializable document and a
// `ResultSet` is built from an already parsed JSON value.

mod error;
mod facet;
mod filter;
mod highlight;
mod json_literal;
mod one_field_map;
mod query_dsl;
mod result_set;
mod search_request;
mod sort;

pub use error::{ConfigurationError, MalformedResponse};
pub use facet::{DateHistogramFacet, FacetDefinition, FacetKind, TermsFacet, TermsFacetOrder};
pub use filter::{FieldFilter, FilterClause, RangeBounds, RangeFilter, TermsFilter};
pub use highlight::{Highlight, HighlightOptions, DEFAULT_HIGHLIGHT_TAG};
pub use json_literal::JsonLiteral;
pub use one_field_map::OneFieldMap;
pub use query_dsl::{
    BoolQuery, DefaultOperator, IdsQuery, MatchAllQuery, QueryClause, QueryStringQuery,
    TermQuery, TermsQuery,
};
pub use result_set::{DateCount, FacetResult, ResultSet, SearchResult, TermCount};
pub use search_request::{Facets, QueryOverride, SearchRequest, SearchRequestBuilder};
pub use sort::{SortClause, SortOrder};
