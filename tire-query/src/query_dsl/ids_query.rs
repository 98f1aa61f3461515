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

/// `{"ids": {"values": ["1", "2"], "type": "article"}}`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IdsQuery {
    pub values: Vec<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

impl IdsQuery {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IdsQuery {
            values: ids.into_iter().map(Into::into).collect(),
            doc_type: None,
        }
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }
}

impl From<IdsQuery> for QueryClause {
    fn from(ids_query: IdsQuery) -> Self {
        QueryClause::Ids(ids_query)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ids_query_with_type() {
        let ids_query = IdsQuery::new(["1", "2"]).doc_type("article");
        assert_eq!(
            serde_json::to_value(&ids_query).unwrap(),
            json!({"values": ["1", "2"], "type": "article"})
        );
    }
}
