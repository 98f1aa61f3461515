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

use serde::{Serialize, Serializer};

use crate::query_dsl::QueryClause;
use crate::{JsonLiteral, OneFieldMap};

/// Exact-value clause.
///
/// Serialized in its short form `{"field": "value"}` unless a boost is set, in which case the
/// long form `{"field": {"value": "value", "boost": 2.0}}` is used.
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub value: JsonLiteral,
    pub boost: Option<f32>,
}

#[derive(Serialize)]
struct TermQueryParams<'a> {
    value: &'a JsonLiteral,
    boost: f32,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<JsonLiteral>) -> Self {
        TermQuery {
            field: field.into(),
            value: value.into(),
            boost: None,
        }
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }
}

impl Serialize for TermQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(boost) = self.boost {
            let params = TermQueryParams {
                value: &self.value,
                boost,
            };
            OneFieldMap::new(self.field.clone(), params).serialize(serializer)
        } else {
            OneFieldMap::new(self.field.clone(), &self.value).serialize(serializer)
        }
    }
}

impl From<TermQuery> for QueryClause {
    fn from(term_query: TermQuery) -> Self {
        QueryClause::Term(term_query)
    }
}
