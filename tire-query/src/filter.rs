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

use crate::query_dsl::{IdsQuery, TermQuery};
use crate::{JsonLiteral, OneFieldMap};

/// A restriction applied to the result set. Filters do not change the scope of facets, unless
/// those are global.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FilterClause {
    Term(TermQuery),
    Terms(TermsFilter),
    Range(RangeFilter),
    Exists(FieldFilter),
    Missing(FieldFilter),
    Ids(IdsQuery),
}

impl FilterClause {
    pub fn term(field: impl Into<String>, value: impl Into<JsonLiteral>) -> FilterClause {
        FilterClause::Term(TermQuery::new(field, value))
    }

    pub fn terms<I, V>(field: impl Into<String>, values: I) -> FilterClause
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonLiteral>,
    {
        FilterClause::Terms(TermsFilter {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn range(field: impl Into<String>) -> RangeFilter {
        RangeFilter {
            field: field.into(),
            bounds: RangeBounds::default(),
        }
    }

    pub fn exists(field: impl Into<String>) -> FilterClause {
        FilterClause::Exists(FieldFilter {
            field: field.into(),
        })
    }

    pub fn missing(field: impl Into<String>) -> FilterClause {
        FilterClause::Missing(FieldFilter {
            field: field.into(),
        })
    }

    pub fn ids<I, S>(ids: I) -> FilterClause
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterClause::Ids(IdsQuery::new(ids))
    }
}

/// `{"terms": {"tags": ["ruby", "python"]}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsFilter {
    pub field: String,
    pub values: Vec<JsonLiteral>,
}

impl Serialize for TermsFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OneFieldMap::new(self.field.clone(), &self.values).serialize(serializer)
    }
}

/// `{"range": {"published_on": {"gte": "2011-01-01", "lt": "2012-01-01"}}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub field: String,
    pub bounds: RangeBounds,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<JsonLiteral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<JsonLiteral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<JsonLiteral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<JsonLiteral>,
}

impl RangeFilter {
    pub fn gt(mut self, bound: impl Into<JsonLiteral>) -> Self {
        self.bounds.gt = Some(bound.into());
        self
    }

    pub fn gte(mut self, bound: impl Into<JsonLiteral>) -> Self {
        self.bounds.gte = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<JsonLiteral>) -> Self {
        self.bounds.lt = Some(bound.into());
        self
    }

    pub fn lte(mut self, bound: impl Into<JsonLiteral>) -> Self {
        self.bounds.lte = Some(bound.into());
        self
    }
}

impl Serialize for RangeFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OneFieldMap::new(self.field.clone(), &self.bounds).serialize(serializer)
    }
}

impl From<RangeFilter> for FilterClause {
    fn from(range_filter: RangeFilter) -> Self {
        FilterClause::Range(range_filter)
    }
}

/// `{"exists": {"field": "title"}}`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
}

/// Filters are ANDed together: a single filter is emitted as is, several filters are wrapped in
/// an `and` filter which preserves their order.
#[allow(clippy::ptr_arg)]
pub(crate) fn serialize_filters<S: Serializer>(
    filters: &Vec<FilterClause>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match filters.as_slice() {
        [filter] => filter.serialize(serializer),
        _ => OneFieldMap::new("and", filters).serialize(serializer),
    }
}
