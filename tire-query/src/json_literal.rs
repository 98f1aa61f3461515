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

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value used in term-level clauses and returned in facet terms.
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
#[serde(untagged)]
pub enum JsonLiteral {
    Number(serde_json::Number),
    String(String),
    Bool(bool),
}

impl fmt::Display for JsonLiteral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JsonLiteral::Number(number) => write!(f, "{number}"),
            JsonLiteral::String(text) => write!(f, "{text}"),
            JsonLiteral::Bool(bool_val) => write!(f, "{bool_val}"),
        }
    }
}

impl From<&str> for JsonLiteral {
    fn from(text: &str) -> Self {
        JsonLiteral::String(text.to_string())
    }
}

impl From<String> for JsonLiteral {
    fn from(text: String) -> Self {
        JsonLiteral::String(text)
    }
}

impl From<&String> for JsonLiteral {
    fn from(text: &String) -> Self {
        JsonLiteral::String(text.clone())
    }
}

impl From<bool> for JsonLiteral {
    fn from(bool_val: bool) -> Self {
        JsonLiteral::Bool(bool_val)
    }
}

macro_rules! impl_from_integer {
    ($($int_type:ty),*) => {
        $(
            impl From<$int_type> for JsonLiteral {
                fn from(int_val: $int_type) -> Self {
                    JsonLiteral::Number(serde_json::Number::from(int_val))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);
