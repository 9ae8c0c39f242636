//! Document generation from the host record set.
//!
//! # Data Flow
//! ```text
//! full host set (normalized)
//!     → per enabled host: auth handler? + reverse_proxy route
//!     → advanced fragments injected before the host's base route
//!     → global listener protocols + TLS automation derived from the union
//!     → ConfigDocument
//! ```
//!
//! # Design Decisions
//! - Pure function of its input; the publisher owns admin-block preservation
//! - A host with a broken auth setup loses its auth handler, never its route
//! - Cross-host invariants (duplicate domains) pass through unchanged;
//!   first-match-wins is the target server's routing semantic

use crate::config::ControlPlaneSettings;
use crate::document::fragments::parse_fragments;
use crate::document::model::{
    AdminSettings, Apps, AuthProviders, AutomaticHttps, AutomationPolicy, BasicAuthAccount,
    ConfigDocument, Handler, HttpApp, HttpBasicAuth, LoggingSettings, MatchClause, PasswordHash,
    Route, Server, TlsApp, TlsAutomation, TlsCertificates, Transport, TransportTls, Upstream,
};
use crate::store::{HostRecord, TargetProtocol};

/// The single server block this engine manages.
const SERVER_NAME: &str = "srv0";

/// Build the complete configuration document for the given host set.
/// Disabled hosts contribute nothing; a host never fails the whole build.
pub fn build_document(hosts: &[HostRecord], settings: &ControlPlaneSettings) -> ConfigDocument {
    let mut routes = Vec::new();

    for host in hosts.iter().filter(|h| h.enabled) {
        if host.ssl_enabled && host.force_ssl {
            routes.push(https_redirect_route(&host.domain));
        }

        // Custom fragments go first so they can intercept before the
        // default proxy behavior, in the order the operator wrote them.
        for mut fragment in parse_fragments(&host.advanced_config) {
            scope_to_domain(&mut fragment, &host.domain);
            routes.push(fragment);
        }

        routes.push(base_route(host));
    }

    let server = Server {
        listen: vec![":80".to_string(), ":443".to_string()],
        routes,
        automatic_https: AutomaticHttps { disable: false },
        protocols: Some(listener_protocols(hosts)),
    };

    let tls_domains = ssl_domains(hosts);

    ConfigDocument {
        admin: AdminSettings { listen: settings.admin_listen.clone() },
        logging: LoggingSettings::default(),
        apps: Apps {
            http: HttpApp {
                servers: [(SERVER_NAME.to_string(), server)].into_iter().collect(),
            },
            tls: TlsApp {
                automation: TlsAutomation {
                    policies: vec![AutomationPolicy { subjects: tls_domains.clone() }],
                },
                certificates: TlsCertificates { automate: tls_domains },
            },
        },
    }
}

/// Build the base proxy route for one host: optional basic-auth handler
/// followed by the reverse-proxy handler.
fn base_route(host: &HostRecord) -> Route {
    let mut handle = Vec::with_capacity(2);

    if host.basic_auth_enabled {
        match auth_handler(host) {
            Some(handler) => handle.push(handler),
            None => tracing::warn!(
                domain = %host.domain,
                "basic auth enabled but no usable credentials stored, omitting auth handler"
            ),
        }
    }

    handle.push(proxy_handler(host));

    Route {
        matchers: vec![MatchClause::host(&host.domain)],
        handle,
        terminal: true,
    }
}

/// The authentication handler, only when the stored hash carries a valid
/// format tag and the username is non-empty.
fn auth_handler(host: &HostRecord) -> Option<Handler> {
    if host.basic_auth_username.trim().is_empty() || !host.basic_auth_password.is_usable_hash() {
        return None;
    }
    let password = host.basic_auth_password.as_str()?.to_string();

    Some(Handler::Authentication {
        providers: AuthProviders {
            http_basic: HttpBasicAuth {
                accounts: vec![BasicAuthAccount {
                    username: host.basic_auth_username.clone(),
                    password,
                }],
                hash: PasswordHash::bcrypt(),
            },
        },
    })
}

fn proxy_handler(host: &HostRecord) -> Handler {
    let dial = format!("{}:{}", normalize_target_host(&host.target_host), host.target_port);

    // An https target always gets the TLS transport; an http target never
    // does.
    let transport = match host.target_protocol {
        TargetProtocol::Https => Some(Transport {
            protocol: "http".to_string(),
            tls: Some(TransportTls { insecure_skip_verify: host.ignore_invalid_cert }),
        }),
        TargetProtocol::Http => None,
    };

    Handler::ReverseProxy {
        upstreams: vec![Upstream { dial }],
        transport,
    }
}

/// Terminal HTTP→HTTPS redirect emitted ahead of everything else for hosts
/// with forced SSL.
fn https_redirect_route(domain: &str) -> Route {
    let mut headers = std::collections::BTreeMap::new();
    headers.insert(
        "Location".to_string(),
        vec!["https://{http.request.host}{http.request.uri}".to_string()],
    );

    Route {
        matchers: vec![MatchClause {
            host: vec![domain.to_string()],
            protocol: Some("http".to_string()),
            ..MatchClause::default()
        }],
        handle: vec![Handler::StaticResponse {
            status_code: Some(308),
            headers,
            body: None,
        }],
        terminal: true,
    }
}

/// Force every match clause of a fragment onto the owning domain.
fn scope_to_domain(route: &mut Route, domain: &str) {
    if route.matchers.is_empty() {
        route.matchers.push(MatchClause::default());
    }
    for clause in &mut route.matchers {
        clause.host = vec![domain.to_string()];
    }
}

/// Strip a leading protocol scheme and surrounding slashes from a stored
/// target host.
fn normalize_target_host(target: &str) -> String {
    let trimmed = target.trim();
    let without_scheme = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed,
    };
    without_scheme.trim_matches('/').to_string()
}

/// Listener protocol set derived from the union of all enabled hosts. Base
/// is h1; h2 and h3 upgrade independently when any host requests them.
fn listener_protocols(hosts: &[HostRecord]) -> Vec<String> {
    let enabled = || hosts.iter().filter(|h| h.enabled);
    let mut protocols = vec!["h1".to_string()];
    if enabled().any(|h| h.http2_support) {
        protocols.push("h2".to_string());
    }
    if enabled().any(|h| h.http3_support) {
        protocols.push("h3".to_string());
    }
    protocols
}

/// Domains of all enabled, SSL-enabled hosts, deduplicated in first-seen
/// order.
fn ssl_domains(hosts: &[HostRecord]) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for host in hosts.iter().filter(|h| h.enabled && h.ssl_enabled) {
        if !domains.contains(&host.domain) {
            domains.push(host.domain.clone());
        }
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredSecret;
    use chrono::Utc;

    fn settings() -> ControlPlaneSettings {
        ControlPlaneSettings::default()
    }

    fn host(domain: &str) -> HostRecord {
        let now = Utc::now();
        HostRecord {
            id: 1,
            domain: domain.to_string(),
            target_host: "10.0.0.1".to_string(),
            target_port: 8080,
            target_protocol: TargetProtocol::Http,
            ssl_enabled: false,
            force_ssl: false,
            http2_support: false,
            http3_support: false,
            ignore_invalid_cert: false,
            enabled: true,
            basic_auth_enabled: false,
            basic_auth_username: String::new(),
            basic_auth_password: StoredSecret::Absent,
            advanced_config: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn server(doc: &ConfigDocument) -> &Server {
        &doc.apps.http.servers[SERVER_NAME]
    }

    #[test]
    fn disabled_hosts_contribute_nothing() {
        let mut disabled = host("off.example.com");
        disabled.enabled = false;
        disabled.ssl_enabled = true;
        disabled.http2_support = true;

        let doc = build_document(&[host("on.example.com"), disabled], &settings());
        let srv = server(&doc);

        assert_eq!(srv.routes.len(), 1);
        for route in &srv.routes {
            for clause in &route.matchers {
                assert!(!clause.host.contains(&"off.example.com".to_string()));
            }
        }
        assert_eq!(srv.protocols, Some(vec!["h1".to_string()]));
        assert!(doc.apps.tls.certificates.automate.is_empty());
    }

    #[test]
    fn two_host_scenario_derives_global_settings() {
        let a = host("a.example.com");
        let mut b = host("b.example.com");
        b.ssl_enabled = true;
        b.http2_support = true;

        let doc = build_document(&[a, b], &settings());
        let srv = server(&doc);

        assert_eq!(srv.routes.len(), 2);
        assert_eq!(srv.routes[0].matchers[0].host, vec!["a.example.com"]);
        assert_eq!(srv.routes[1].matchers[0].host, vec!["b.example.com"]);
        assert_eq!(srv.protocols, Some(vec!["h1".to_string(), "h2".to_string()]));
        assert_eq!(doc.apps.tls.automation.policies[0].subjects, vec!["b.example.com"]);
        assert_eq!(doc.apps.tls.certificates.automate, vec!["b.example.com"]);
    }

    #[test]
    fn http3_upgrades_independently_of_http2() {
        let mut h = host("h3.example.com");
        h.http3_support = true;

        let doc = build_document(&[h], &settings());
        assert_eq!(
            server(&doc).protocols,
            Some(vec!["h1".to_string(), "h3".to_string()])
        );
    }

    #[test]
    fn auth_handler_requires_tagged_hash_and_username() {
        let mut valid = host("auth.example.com");
        valid.basic_auth_enabled = true;
        valid.basic_auth_username = "admin".to_string();
        valid.basic_auth_password = StoredSecret::Present("$2b$10$hashhashhash".to_string());

        let doc = build_document(&[valid.clone()], &settings());
        match &server(&doc).routes[0].handle[0] {
            Handler::Authentication { providers } => {
                let account = &providers.http_basic.accounts[0];
                assert_eq!(account.username, "admin");
                assert_eq!(account.password, "$2b$10$hashhashhash");
                assert_eq!(providers.http_basic.hash.algorithm, "bcrypt");
            }
            other => panic!("expected authentication handler first, got {:?}", other),
        }

        // Untagged (plaintext) password: route survives, auth handler does not.
        let mut plaintext = valid.clone();
        plaintext.basic_auth_password = StoredSecret::Present("hunter2".to_string());
        let doc = build_document(&[plaintext], &settings());
        assert_eq!(server(&doc).routes[0].handle.len(), 1);
        assert!(matches!(server(&doc).routes[0].handle[0], Handler::ReverseProxy { .. }));

        // Absent password.
        let mut missing = valid.clone();
        missing.basic_auth_password = StoredSecret::Absent;
        let doc = build_document(&[missing], &settings());
        assert_eq!(server(&doc).routes[0].handle.len(), 1);

        // Empty username.
        let mut anonymous = valid;
        anonymous.basic_auth_username = String::new();
        let doc = build_document(&[anonymous], &settings());
        assert_eq!(server(&doc).routes[0].handle.len(), 1);
    }

    #[test]
    fn target_host_is_normalized_before_dialing() {
        let mut h = host("dial.example.com");
        h.target_host = "https://backend.internal/".to_string();
        h.target_port = 8443;
        h.target_protocol = TargetProtocol::Https;
        h.ignore_invalid_cert = true;

        let doc = build_document(&[h], &settings());
        match &server(&doc).routes[0].handle[0] {
            Handler::ReverseProxy { upstreams, transport } => {
                assert_eq!(upstreams[0].dial, "backend.internal:8443");
                let transport = transport.as_ref().expect("https target needs a TLS transport");
                assert!(transport.tls.as_ref().unwrap().insecure_skip_verify);
            }
            other => panic!("expected reverse_proxy handler, got {:?}", other),
        }
    }

    #[test]
    fn http_target_has_no_transport_block() {
        let doc = build_document(&[host("plain.example.com")], &settings());
        match &server(&doc).routes[0].handle[0] {
            Handler::ReverseProxy { transport, .. } => assert!(transport.is_none()),
            other => panic!("expected reverse_proxy handler, got {:?}", other),
        }
    }

    #[test]
    fn fragments_precede_base_route_and_are_scoped_to_the_domain() {
        let mut h = host("frag.example.com");
        h.advanced_config = serde_json::json!([
            {"match": [{"path": ["/one"]}], "handle": [{"handler": "static_response", "status_code": 404}]},
            {"match": [{"path": ["/two"]}], "handle": [{"handler": "static_response", "status_code": 410}]}
        ])
        .to_string();

        let doc = build_document(&[h], &settings());
        let routes = &server(&doc).routes;

        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].matchers[0].path, Some(vec!["/one".to_string()]));
        assert_eq!(routes[1].matchers[0].path, Some(vec!["/two".to_string()]));
        for fragment in &routes[0..2] {
            assert_eq!(fragment.matchers[0].host, vec!["frag.example.com"]);
        }
        assert!(matches!(routes[2].handle[0], Handler::ReverseProxy { .. }));
    }

    #[test]
    fn legacy_redir_fragment_scenario() {
        let mut h = host("c.example.com");
        h.advanced_config = r#"{"redir":[{"from":"/old","to":"/new"}]}"#.to_string();

        let doc = build_document(&[h], &settings());
        let routes = &server(&doc).routes;

        assert_eq!(routes.len(), 2);
        let redirect = &routes[0];
        assert!(redirect.terminal);
        assert_eq!(redirect.matchers[0].host, vec!["c.example.com"]);
        assert_eq!(redirect.matchers[0].path, Some(vec!["/old".to_string()]));
        match &redirect.handle[0] {
            Handler::StaticResponse { status_code, headers, .. } => {
                assert_eq!(*status_code, Some(301));
                assert_eq!(headers["Location"], vec!["/new".to_string()]);
            }
            other => panic!("expected static_response, got {:?}", other),
        }
    }

    #[test]
    fn malformed_advanced_config_leaves_base_route_intact() {
        let mut h = host("broken.example.com");
        h.advanced_config = "{not json".to_string();

        let doc = build_document(&[h, host("fine.example.com")], &settings());
        let routes = &server(&doc).routes;

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].matchers[0].host, vec!["broken.example.com"]);
        assert_eq!(routes[1].matchers[0].host, vec!["fine.example.com"]);
    }

    #[test]
    fn forced_ssl_emits_leading_redirect_route() {
        let mut h = host("secure.example.com");
        h.ssl_enabled = true;
        h.force_ssl = true;

        let doc = build_document(&[h], &settings());
        let routes = &server(&doc).routes;

        assert_eq!(routes.len(), 2);
        let redirect = &routes[0];
        assert_eq!(redirect.matchers[0].protocol.as_deref(), Some("http"));
        match &redirect.handle[0] {
            Handler::StaticResponse { status_code, .. } => assert_eq!(*status_code, Some(308)),
            other => panic!("expected static_response, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_domains_produce_independent_routes_in_order() {
        let mut first = host("dup.example.com");
        first.target_port = 8001;
        let mut second = host("dup.example.com");
        second.target_port = 8002;
        second.ssl_enabled = true;
        let mut third = host("dup.example.com");
        third.ssl_enabled = true;

        let doc = build_document(&[first, second, third], &settings());
        assert_eq!(server(&doc).routes.len(), 3);
        // TLS lists stay deduplicated.
        assert_eq!(doc.apps.tls.certificates.automate, vec!["dup.example.com"]);
    }
}
