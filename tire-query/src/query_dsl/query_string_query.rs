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

#[derive(Serialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum DefaultOperator {
    #[serde(rename = "AND")]
    And,
    #[default]
    #[serde(rename = "OR")]
    Or,
}

/// `{"query_string": {"query": "title:T*"}}`
///
/// The query text is passed through untouched.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct QueryStringQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<DefaultOperator>,
}

impl QueryStringQuery {
    pub fn new(query: impl Into<String>) -> Self {
        QueryStringQuery {
            query: query.into(),
            default_field: None,
            fields: None,
            default_operator: None,
        }
    }

    pub fn default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_operator(mut self, default_operator: DefaultOperator) -> Self {
        self.default_operator = Some(default_operator);
        self
    }
}

impl From<QueryStringQuery> for QueryClause {
    fn from(query_string_query: QueryStringQuery) -> Self {
        QueryClause::QueryString(query_string_query)
    }
}
