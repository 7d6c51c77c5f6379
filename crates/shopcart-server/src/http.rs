//! Transport-neutral request and response values.
//!
//! A request is one function-invocation event: method, path, headers, a
//! raw JSON body and the authenticated subject (if any).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Name of the cookie carrying the shopper's session id.
pub const SESSION_COOKIE: &str = "sessionId";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Subject claim of the authenticated caller.
    #[serde(default)]
    pub user_sub: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        parse_cookies(self.header("cookie")).remove(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body)
            .unwrap_or_else(|_| json!({ "message": "Unserializable response" }).to_string());
        Self {
            status_code,
            headers: BTreeMap::from([("Content-Type".into(), "application/json".into())]),
            body,
        }
    }

    pub fn message(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &json!({ "message": message }))
    }

    pub fn not_found_route(path: &str, http_method: &str) -> Self {
        Self::json(
            404,
            &json!({ "message": "NOT FOUND", "path": path, "httpMethod": http_method }),
        )
    }

    pub fn with_session_cookie(mut self, session_id: &str) -> Self {
        self.headers.insert(
            "Set-Cookie".into(),
            format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax"),
        );
        self
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Split a `Cookie` header into name/value pairs.
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    let Some(header) = header else {
        return HashMap::new();
    };

    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_pairs() {
        let cookies = parse_cookies(Some("sessionId=abc; theme = dark ;broken; =x"));
        assert_eq!(cookies.get("sessionId").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(cookies.len(), 2);
        assert!(parse_cookies(None).is_empty());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            headers: HashMap::from([("cookie".into(), "sessionId=s1".into())]),
            ..Default::default()
        };
        assert_eq!(request.header("Cookie"), Some("sessionId=s1"));
        assert_eq!(request.cookie(SESSION_COOKIE).as_deref(), Some("s1"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let response = HttpResponse::message(200, "ok").with_session_cookie("s1");
        let cookie = &response.headers["Set-Cookie"];
        assert!(cookie.starts_with("sessionId=s1;"));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(response.body_json()["message"], "ok");
    }
}
