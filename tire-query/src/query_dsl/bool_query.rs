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

use serde::Serialize;

use crate::query_dsl::QueryClause;

/// Boolean combination of clauses.
///
/// Empty occurrence lists are not serialized.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<QueryClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<QueryClause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<QueryClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_number_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn must(mut self, clause: impl Into<QueryClause>) -> Self {
        self.must.push(clause.into());
        self
    }

    pub fn should(mut self, clause: impl Into<QueryClause>) -> Self {
        self.should.push(clause.into());
        self
    }

    pub fn must_not(mut self, clause: impl Into<QueryClause>) -> Self {
        self.must_not.push(clause.into());
        self
    }

    pub fn minimum_number_should_match(mut self, minimum: u32) -> Self {
        self.minimum_number_should_match = Some(minimum);
        self
    }
}

impl From<BoolQuery> for QueryClause {
    fn from(bool_query: BoolQuery) -> Self {
        QueryClause::Bool(bool_query)
    }
}
