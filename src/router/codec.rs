//! Fragment route encoding.
//!
//! Routes live in the location fragment as `#/<path>?<key>=<value>&...`. Both
//! directions are pure functions and never fail.
//!
//! ```
//! use console_client::router::codec::{build, parse, RouteParams};
//!
//! let mut params = RouteParams::new();
//! params.insert("table".to_string(), "users".to_string());
//!
//! let fragment = build("/records", Some(&params));
//! assert_eq!(fragment, "#/records?table=users");
//! assert_eq!(parse(&fragment).params["table"], "users");
//! ```

use std::collections::BTreeMap;

/// Route shown when the fragment is empty.
pub const DEFAULT_PATH: &str = "/tables";

/// Query parameters of a route, kept in key order.
pub type RouteParams = BTreeMap<String, String>;

/// A decoded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    /// Always starts with `/`
    pub path: String,
    pub params: RouteParams,
}

impl ParsedRoute {
    /// The route for an empty fragment.
    pub fn default_route() -> Self {
        ParsedRoute {
            path: DEFAULT_PATH.to_string(),
            params: RouteParams::new(),
        }
    }

    /// A single query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl Default for ParsedRoute {
    fn default() -> Self {
        Self::default_route()
    }
}

/// Decode a fragment, with or without its leading `#`.
///
/// Repeated keys keep their last value. Malformed percent escapes decode
/// lossily.
pub fn parse(raw: &str) -> ParsedRoute {
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    // Exactly one leading slash, matching `build`.
    let path = if path.is_empty() {
        DEFAULT_PATH.to_string()
    } else {
        format!("/{}", path.trim_start_matches('/'))
    };

    let params = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect::<RouteParams>()
        })
        .unwrap_or_default();

    ParsedRoute { path, params }
}

/// Encode a route as a fragment.
///
/// Entries with empty values are omitted; no `?` is written when nothing is
/// left.
pub fn build(path: &str, params: Option<&RouteParams>) -> String {
    let mut fragment = format!("#/{}", path.trim_start_matches('/'));

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params.into_iter().flatten() {
        if !value.is_empty() {
            query.append_pair(key, value);
            any = true;
        }
    }
    if any {
        fragment.push('?');
        fragment.push_str(&query.finish());
    }
    fragment
}
