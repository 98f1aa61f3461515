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

use crate::FilterClause;

/// A named aggregation computed by the remote engine.
///
/// Wire format: `{"terms": {"field": "tags"}, "global": true}`. `global` is omitted when false.
/// A global facet ignores the query and filter restrictions; the client only expresses this.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FacetDefinition {
    #[serde(flatten)]
    pub kind: FacetKind,
    #[serde(skip_serializing_if = "is_false")]
    pub global: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_filter: Option<FilterClause>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Terms(TermsFacet),
    DateHistogram(DateHistogramFacet),
}

impl FacetDefinition {
    pub fn terms(field: impl Into<String>) -> Self {
        TermsFacet::new(field).into()
    }

    pub fn date_histogram(field: impl Into<String>, interval: impl Into<String>) -> Self {
        DateHistogramFacet::new(field, interval).into()
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn facet_filter(mut self, facet_filter: impl Into<FilterClause>) -> Self {
        self.facet_filter = Some(facet_filter.into());
        self
    }

    pub fn field(&self) -> &str {
        match &self.kind {
            FacetKind::Terms(terms_facet) => &terms_facet.field,
            FacetKind::DateHistogram(date_histogram_facet) => &date_histogram_facet.field,
        }
    }
}

impl From<FacetKind> for FacetDefinition {
    fn from(kind: FacetKind) -> Self {
        FacetDefinition {
            kind,
            global: false,
            facet_filter: None,
        }
    }
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TermsFacetOrder {
    #[default]
    Count,
    Term,
    ReverseCount,
    ReverseTerm,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TermsFacet {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<TermsFacetOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_terms: Option<bool>,
}

impl TermsFacet {
    pub fn new(field: impl Into<String>) -> Self {
        TermsFacet {
            field: field.into(),
            size: None,
            order: None,
            all_terms: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn order(mut self, order: TermsFacetOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn all_terms(mut self, all_terms: bool) -> Self {
        self.all_terms = Some(all_terms);
        self
    }
}

impl From<TermsFacet> for FacetDefinition {
    fn from(terms_facet: TermsFacet) -> Self {
        FacetKind::Terms(terms_facet).into()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DateHistogramFacet {
    pub field: String,
    /// `year`, `month`, `day`, `hour`... or a duration such as `1.5h`.
    pub interval: String,
}

impl DateHistogramFacet {
    pub fn new(field: impl Into<String>, interval: impl Into<String>) -> Self {
        DateHistogramFacet {
            field: field.into(),
            interval: interval.into(),
        }
    }
}

impl From<DateHistogramFacet> for FacetDefinition {
    fn from(date_histogram_facet: DateHistogramFacet) -> Self {
        FacetKind::DateHistogram(date_histogram_facet).into()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_terms_facet_local() {
        let facet = FacetDefinition::terms("tags");
        assert_eq!(
            serde_json::to_value(&facet).unwrap(),
            json!({"terms": {"field": "tags"}})
        );
    }

    #[test]
    fn test_terms_facet_global() {
        let facet = FacetDefinition::from(TermsFacet::new("tags").size(10)).global(true);
        assert_eq!(
            serde_json::to_value(&facet).unwrap(),
            json!({"terms": {"field": "tags", "size": 10}, "global": true})
        );
    }

    #[test]
    fn test_terms_facet_options() {
        let facet: FacetDefinition = TermsFacet::new("tags")
            .order(TermsFacetOrder::ReverseCount)
            .all_terms(true)
            .into();
        assert_eq!(
            serde_json::to_value(&facet).unwrap(),
            json!({"terms": {"field": "tags", "order": "reverse_count", "all_terms": true}})
        );
    }

    #[test]
    fn test_date_histogram_facet_with_facet_filter() {
        let facet = FacetDefinition::date_histogram("published_on", "month")
            .facet_filter(FilterClause::terms("tags", ["ruby"]));
        assert_eq!(facet.field(), "published_on");
        assert_eq!(
            serde_json::to_value(&facet).unwrap(),
            json!({
                "date_histogram": {"field": "published_on", "interval": "month"},
                "facet_filter": {"terms": {"tags": ["ruby"]}}
            })
        );
    }
}
