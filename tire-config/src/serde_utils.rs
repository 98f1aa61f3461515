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
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Duration written the human way, such as `10s` or `1m 30s`. `none` disables the
/// corresponding limit.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct HumanDuration {
    repr: String,
    duration_opt: Option<Duration>,
}

impl HumanDuration {
    pub fn none() -> Self {
        HumanDuration {
            repr: "none".to_string(),
            duration_opt: None,
        }
    }

    /// Returns `None` when the limit is disabled.
    pub fn duration_opt(&self) -> Option<Duration> {
        self.duration_opt
    }
}

impl FromStr for HumanDuration {
    type Err = humantime::DurationError;

    fn from_str(duration_str: &str) -> Result<Self, Self::Err> {
        let duration_str = duration_str.trim();
        if duration_str.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }
        let duration = humantime::parse_duration(duration_str)?;
        Ok(HumanDuration {
            repr: duration_str.to_string(),
            duration_opt: Some(duration),
        })
    }
}

impl TryFrom<String> for HumanDuration {
    type Error = humantime::DurationError;

    fn try_from(duration_str: String) -> Result<Self, Self::Error> {
        duration_str.parse()
    }
}

impl From<HumanDuration> for String {
    fn from(human_duration: HumanDuration) -> String {
        human_duration.repr
    }
}

impl From<Duration> for HumanDuration {
    fn from(duration: Duration) -> Self {
        HumanDuration {
            repr: humantime::format_duration(duration).to_string(),
            duration_opt: Some(duration),
        }
    }
}

impl fmt::Debug for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.repr.fmt(f)
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration_deserialize() {
        let human_duration: HumanDuration = serde_json::from_str("\"10s\"").unwrap();
        assert_eq!(
            human_duration.duration_opt(),
            Some(Duration::from_secs(10))
        );
        let human_duration: HumanDuration = serde_json::from_str("\"1m 30s\"").unwrap();
        assert_eq!(
            human_duration.duration_opt(),
            Some(Duration::from_secs(90))
        );
        let human_duration: HumanDuration = serde_json::from_str("\"None\"").unwrap();
        assert!(human_duration.duration_opt().is_none());

        let deser_error = serde_json::from_str::<HumanDuration>("\"10\"").unwrap_err();
        assert_eq!(
            deser_error.to_string(),
            "time unit needed, for example 10sec or 10ms"
        );
    }

    #[test]
    fn test_human_duration_serialize() {
        let human_duration = HumanDuration::from(Duration::from_secs(120));
        assert_eq!(human_duration.to_string(), "2m");
        assert_eq!(serde_json::to_string(&human_duration).unwrap(), "\"2m\"");
    }
}
