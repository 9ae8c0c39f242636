//! Configuration document model.
//!
//! The subset of the control-plane document schema this engine produces:
//! admin/logging settings, one HTTP server block with an ordered route list,
//! and the TLS automation block. Route handlers are a tagged enum with an
//! opaque passthrough variant so operator-supplied fragments may use handler
//! kinds this crate does not model natively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Complete document accepted by the control plane's load endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub admin: AdminSettings,
    pub logging: LoggingSettings,
    pub apps: Apps,
}

/// Admin API surface of the remote server. The publisher overwrites this
/// block with the running server's own admin settings when one is reachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    pub listen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub logs: BTreeMap<String, LogSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        let mut logs = BTreeMap::new();
        logs.insert("default".to_string(), LogSettings { level: "INFO".to_string() });
        Self { logs }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apps {
    pub http: HttpApp,
    pub tls: TlsApp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpApp {
    pub servers: BTreeMap<String, Server>,
}

/// One HTTP server block. This engine emits exactly one, `srv0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub listen: Vec<String>,
    pub routes: Vec<Route>,
    pub automatic_https: AutomaticHttps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomaticHttps {
    pub disable: bool,
}

/// One match+handle rule. Order in the route list is first-match-wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "match", default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<MatchClause>,
    #[serde(default)]
    pub handle: Vec<Handler>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub terminal: bool,
}

/// One match clause. `host` is never serialized as null; an empty list means
/// "owning domain to be injected by the builder".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    /// Request scheme matcher ("http"/"https"), used by forced-SSL redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Matcher kinds not modeled natively (path_regexp, header, ...),
    /// preserved verbatim from operator fragments.
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl MatchClause {
    pub fn host(domain: &str) -> Self {
        Self {
            host: vec![domain.to_string()],
            ..Self::default()
        }
    }
}

/// Route handler variants modeled natively, plus an opaque passthrough for
/// everything else the control plane understands but this crate does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum Handler {
    Authentication {
        providers: AuthProviders,
    },
    ReverseProxy {
        upstreams: Vec<Upstream>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transport: Option<Transport>,
    },
    StaticResponse {
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    },
    /// Forward-compatible passthrough; must stay the last variant.
    #[serde(untagged)]
    Opaque(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthProviders {
    pub http_basic: HttpBasicAuth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpBasicAuth {
    pub accounts: Vec<BasicAuthAccount>,
    pub hash: PasswordHash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicAuthAccount {
    pub username: String,
    /// The stored bcrypt hash, never a plaintext password.
    pub password: String,
}

/// Hash algorithm declaration for basic-auth accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub algorithm: String,
}

impl PasswordHash {
    pub fn bcrypt() -> Self {
        Self { algorithm: "bcrypt".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
    pub dial: String,
}

/// Outbound transport settings for a reverse-proxy handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TransportTls>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportTls {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsApp {
    pub automation: TlsAutomation,
    pub certificates: TlsCertificates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsAutomation {
    pub policies: Vec<AutomationPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationPolicy {
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsCertificates {
    pub automate: Vec<String>,
}
