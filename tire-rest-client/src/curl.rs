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

use reqwest::{Method, Url};

/// Renders a request as a `curl` command which can be pasted in a POSIX shell.
///
/// ```
/// use reqwest::{Method, Url};
/// use tire_rest_client::to_curl;
///
/// let url = Url::parse("http://localhost:9200/articles/_search").unwrap();
/// let curl = to_curl(&Method::POST, &url, Some(&br#"{"query":{"match_all":{}}}"#[..]));
/// assert_eq!(
///     curl,
///     r#"curl -X POST 'http://localhost:9200/articles/_search?pretty' -d '{"query":{"match_all":{}}}'"#
/// );
/// ```
pub fn to_curl(method: &Method, url: &Url, body_opt: Option<&[u8]>) -> String {
    let mut pretty_url = url.clone();
    pretty_url.query_pairs_mut().append_key_only("pretty");
    let mut curl = format!(
        "curl -X {method} {}",
        shell_quote(pretty_url.as_str())
    );
    if let Some(body) = body_opt {
        if !body.is_empty() {
            curl.push_str(" -d ");
            curl.push_str(&shell_quote(&String::from_utf8_lossy(body)));
        }
    }
    curl
}

/// Wraps `text` in single quotes. Inner single quotes are closed, escaped and reopened.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r#"'\''"#))
}
