//! Proxy and SSL environment for child processes.
//!
//! Declared overrides win; otherwise the model-level proxy settings Juju
//! exports as `JUJU_CHARM_*` apply.

use pro_charm_core::DesiredConfig;

pub const JUJU_HTTP_PROXY: &str = "JUJU_CHARM_HTTP_PROXY";
pub const JUJU_HTTPS_PROXY: &str = "JUJU_CHARM_HTTPS_PROXY";
pub const JUJU_NO_PROXY: &str = "JUJU_CHARM_NO_PROXY";

/// Effective proxy settings for this pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyEnv {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub no_proxy: Option<String>,
    pub ssl_cert_file: Option<String>,
}

impl ProxyEnv {
    /// Resolve from declared config and the process environment.
    pub fn from_config(config: &DesiredConfig) -> Self {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve<F>(config: &DesiredConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            http_proxy: config
                .override_http_proxy()
                .map(str::to_owned)
                .or_else(|| from_env(JUJU_HTTP_PROXY)),
            https_proxy: config
                .override_https_proxy()
                .map(str::to_owned)
                .or_else(|| from_env(JUJU_HTTPS_PROXY)),
            no_proxy: from_env(JUJU_NO_PROXY),
            ssl_cert_file: config.override_ssl_cert_file().map(str::to_owned),
        }
    }

    /// Variables to set on child processes that reach the network.
    pub fn vars(&self) -> Vec<(&'static str, String)> {
        [
            ("http_proxy", &self.http_proxy),
            ("https_proxy", &self.https_proxy),
            ("no_proxy", &self.no_proxy),
            ("SSL_CERT_FILE", &self.ssl_cert_file),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_PROXY_URL: &str = "http://squid.internal:3128";
    const TEST_NO_PROXY: &str = "127.0.0.1,localhost,::1";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn juju_environment_is_the_fallback() {
        let proxy = ProxyEnv::resolve(
            &DesiredConfig::default(),
            env(&[
                (JUJU_HTTP_PROXY, TEST_PROXY_URL),
                (JUJU_HTTPS_PROXY, TEST_PROXY_URL),
                (JUJU_NO_PROXY, TEST_NO_PROXY),
            ]),
        );
        assert_eq!(proxy.http_proxy.as_deref(), Some(TEST_PROXY_URL));
        assert_eq!(proxy.https_proxy.as_deref(), Some(TEST_PROXY_URL));
        assert_eq!(proxy.no_proxy.as_deref(), Some(TEST_NO_PROXY));
    }

    #[test]
    fn overrides_win_over_environment() {
        let config = DesiredConfig {
            override_http_proxy: Some("http://localhost:3128".into()),
            override_ssl_cert_file: Some("/etc/ssl/certs/proxy.pem".into()),
            ..Default::default()
        };
        let proxy = ProxyEnv::resolve(&config, env(&[(JUJU_HTTP_PROXY, TEST_PROXY_URL)]));
        assert_eq!(proxy.http_proxy.as_deref(), Some("http://localhost:3128"));
        assert_eq!(proxy.https_proxy, None);
        assert_eq!(
            proxy.vars(),
            vec![
                ("http_proxy", "http://localhost:3128".to_string()),
                ("SSL_CERT_FILE", "/etc/ssl/certs/proxy.pem".to_string()),
            ]
        );
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let proxy = ProxyEnv::resolve(&DesiredConfig::default(), env(&[(JUJU_HTTP_PROXY, " ")]));
        assert_eq!(proxy, ProxyEnv::default());
        assert!(proxy.vars().is_empty());
    }
}
