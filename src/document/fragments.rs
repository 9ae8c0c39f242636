//! Advanced-fragment parsing.
//!
//! Operators may attach free-form route fragments to a host. The field is a
//! string and has accumulated several accepted shapes over time: a JSON array
//! of routes, a single route object, a bare handler object, and a legacy
//! redirect shorthand. A broken fragment for one host must never block
//! configuration generation for all other hosts, so this parser degrades to
//! an empty list on anything it does not recognize and never returns an
//! error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::model::{Handler, MatchClause, Route};

/// Default redirect status for the legacy `redir` shorthand.
const DEFAULT_REDIRECT_STATUS: u16 = 301;

/// Parse a host's advanced-config string into zero or more route fragments.
///
/// Match clauses come back with `host: []` unless the fragment named hosts
/// explicitly; the document builder overwrites the host list with the owning
/// domain either way.
pub fn parse_fragments(raw: &str) -> Vec<Route> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "advanced config is not valid JSON, ignoring");
            return Vec::new();
        }
    };

    match routes_from_value(&value) {
        Some(routes) => routes,
        None => {
            tracing::warn!("advanced config has an unrecognized shape, ignoring");
            Vec::new()
        }
    }
}

fn routes_from_value(value: &Value) -> Option<Vec<Route>> {
    match value {
        Value::Array(items) => {
            let mut routes = Vec::with_capacity(items.len());
            for item in items {
                routes.push(route_from_object(item)?);
            }
            Some(routes)
        }
        Value::Object(map) => {
            if let Some(redirs) = map.get("redir") {
                redirect_routes(redirs)
            } else if map.contains_key("match") && map.contains_key("handle") {
                route_from_object(value).map(|route| vec![route])
            } else if map.contains_key("handler") {
                bare_handler_route(value).map(|route| vec![route])
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Normalize one `{match, handle}` object into a Route. A single-object
/// `match` is wrapped into a one-element list before deserialization.
fn route_from_object(value: &Value) -> Option<Route> {
    let map = value.as_object()?;
    if !map.contains_key("match") || !map.contains_key("handle") {
        return None;
    }

    let mut normalized = value.clone();
    if normalized["match"].is_object() {
        let clause = normalized["match"].take();
        normalized["match"] = Value::Array(vec![clause]);
    }

    serde_json::from_value(normalized).ok()
}

/// Wrap a bare handler object into a route with no host or path restriction.
fn bare_handler_route(value: &Value) -> Option<Route> {
    let handler: Handler = serde_json::from_value(value.clone()).ok()?;
    Some(Route {
        matchers: vec![MatchClause::default()],
        handle: vec![handler],
        terminal: false,
    })
}

/// Legacy shorthand: `{"redir": [{from, to, status_code?}, ...]}`.
fn redirect_routes(redirs: &Value) -> Option<Vec<Route>> {
    let items = redirs.as_array()?;
    let mut routes = Vec::with_capacity(items.len());

    for item in items {
        let entry = item.as_object()?;
        let from = entry.get("from")?.as_str()?;
        let to = entry.get("to")?.as_str()?;
        let status = match entry.get("status_code") {
            None => DEFAULT_REDIRECT_STATUS,
            Some(v) => parse_status(v)?,
        };

        let mut headers = BTreeMap::new();
        headers.insert("Location".to_string(), vec![to.to_string()]);

        routes.push(Route {
            matchers: vec![MatchClause {
                path: Some(vec![from.to_string()]),
                ..MatchClause::default()
            }],
            handle: vec![Handler::StaticResponse {
                status_code: Some(status),
                headers,
                body: None,
            }],
            terminal: true,
        });
    }

    Some(routes)
}

// Operators have written status codes both as numbers and as strings.
fn parse_status(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => u16::try_from(n.as_u64()?).ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
