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

// As you add queries in this module please keep `QueryClause` variants and their constructors
// in the same order.

mod bool_query;
mod ids_query;
mod match_all_query;
mod query_string_query;
mod term_query;
mod terms_query;

pub use bool_query::BoolQuery;
pub use ids_query::IdsQuery;
pub use match_all_query::MatchAllQuery;
pub use query_string_query::{DefaultOperator, QueryStringQuery};
use serde::Serialize;
pub use term_query::TermQuery;
pub use terms_query::TermsQuery;

use crate::JsonLiteral;

/// A single query expression. Exactly one variant is active per clause.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QueryClause {
    QueryString(QueryStringQuery),
    Term(TermQuery),
    Terms(TermsQuery),
    MatchAll(MatchAllQuery),
    Ids(IdsQuery),
    Bool(BoolQuery),
}

impl QueryClause {
    /// Raw query-syntax string. The remote engine is the sole validator of its syntax.
    pub fn string(query: impl Into<String>) -> QueryStringQuery {
        QueryStringQuery::new(query)
    }

    pub fn term(field: impl Into<String>, value: impl Into<JsonLiteral>) -> TermQuery {
        TermQuery::new(field, value)
    }

    pub fn terms<I, V>(field: impl Into<String>, values: I) -> TermsQuery
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonLiteral>,
    {
        TermsQuery::new(field, values)
    }

    pub fn match_all() -> QueryClause {
        QueryClause::MatchAll(MatchAllQuery::default())
    }

    pub fn ids<I, S>(ids: I) -> IdsQuery
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IdsQuery::new(ids)
    }

    pub fn boolean() -> BoolQuery {
        BoolQuery::default()
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, QueryClause::MatchAll(_))
    }
}

impl Default for QueryClause {
    fn default() -> Self {
        QueryClause::match_all()
    }
}
