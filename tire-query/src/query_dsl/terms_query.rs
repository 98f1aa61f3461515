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

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::query_dsl::QueryClause;
use crate::JsonLiteral;

/// Multi-value clause: `{"tags": ["ruby", "python"], "minimum_match": 2}`.
///
/// When `minimum_match` is not set, the key is omitted and the remote engine applies its own
/// default (one value must match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsQuery {
    pub field: String,
    pub values: Vec<JsonLiteral>,
    pub minimum_match: Option<u32>,
}

impl TermsQuery {
    pub fn new<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonLiteral>,
    {
        TermsQuery {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            minimum_match: None,
        }
    }

    pub fn minimum_match(mut self, minimum_match: u32) -> Self {
        self.minimum_match = Some(minimum_match);
        self
    }
}

impl Serialize for TermsQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let num_entries = if self.minimum_match.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(num_entries))?;
        map.serialize_entry(&self.field, &self.values)?;
        if let Some(minimum_match) = self.minimum_match {
            map.serialize_entry("minimum_match", &minimum_match)?;
        }
        map.end()
    }
}

impl From<TermsQuery> for QueryClause {
    fn from(terms_query: TermsQuery) -> Self {
        QueryClause::Terms(terms_query)
    }
}
