//! Remote and engine configuration.
//!
//! `RemoteConfig` is the loosely typed shape clients collect from flags, env
//! vars and profile files. `RemoteConfig::resolve` validates it into the
//! `ResolvedRemoteConfig` the Supabase client is built from.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
pub use crate::util::normalize_text_option;
use crate::util::is_http_url;

/// Default remote table name
pub const DEFAULT_TABLE: &str = "records";

/// How long a soft-deleted record stays in the local store
pub const RETENTION_WINDOW: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Remote store settings as collected from the environment.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// User access token; requests fall back to the anon key without one
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_anon_key",
                &self.supabase_anon_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("table", &self.table)
            .finish()
    }
}

impl RemoteConfig {
    /// Trim every field and drop empty values.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            supabase_url: normalize_text_option(self.supabase_url),
            supabase_anon_key: normalize_text_option(self.supabase_anon_key),
            access_token: normalize_text_option(self.access_token),
            table: normalize_text_option(self.table),
        }
    }

    /// Fill fields missing from `self` with values from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        let this = self.normalized();
        let fallback = fallback.normalized();
        Self {
            supabase_url: this.supabase_url.or(fallback.supabase_url),
            supabase_anon_key: this.supabase_anon_key.or(fallback.supabase_anon_key),
            access_token: this.access_token.or(fallback.access_token),
            table: this.table.or(fallback.table),
        }
    }

    /// Whether both the project URL and the anon key are present.
    pub fn is_configured(&self) -> bool {
        normalize_text_option(self.supabase_url.clone()).is_some()
            && normalize_text_option(self.supabase_anon_key.clone()).is_some()
    }

    /// Validate into a client-ready configuration.
    pub fn resolve(self) -> Result<ResolvedRemoteConfig> {
        let config = self.normalized();
        let url = config
            .supabase_url
            .ok_or_else(|| Error::Config("Supabase URL is required".to_string()))?;
        let anon_key = config
            .supabase_anon_key
            .ok_or_else(|| Error::Config("Supabase anon key is required".to_string()))?;
        let table = config.table.unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if !table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Config(format!(
                "table name '{table}' may only contain letters, digits and underscores"
            )));
        }

        Ok(ResolvedRemoteConfig {
            rest_url: normalize_rest_url(&url)?,
            anon_key,
            access_token: config.access_token,
            table,
        })
    }
}

/// Validated Supabase settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedRemoteConfig {
    /// PostgREST base, always ending in `/rest/v1`
    pub rest_url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub table: String,
}

impl ResolvedRemoteConfig {
    /// Token sent as `Authorization: Bearer`.
    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    /// Endpoint of the records table.
    pub fn table_url(&self) -> String {
        format!("{}/{}", self.rest_url, self.table)
    }
}

impl fmt::Debug for ResolvedRemoteConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResolvedRemoteConfig")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("table", &self.table)
            .finish()
    }
}

/// Tunables for the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Soft-deleted records older than this are purged by the sweeper
    pub retention: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention: RETENTION_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Retention window in milliseconds.
    pub fn retention_ms(&self) -> i64 {
        i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Normalize a Supabase project URL into its PostgREST base.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("Supabase URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Config(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configured() -> RemoteConfig {
        RemoteConfig {
            supabase_url: Some(" https://demo.supabase.co/ ".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            access_token: None,
            table: None,
        }
    }

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/rest/v1/").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
    }

    #[test]
    fn normalize_rest_url_rejects_invalid_values() {
        assert!(normalize_rest_url("  ").is_err());
        assert!(normalize_rest_url("demo.supabase.co").is_err());
    }

    #[test]
    fn resolve_defaults_table_and_uses_anon_bearer() {
        let resolved = configured().resolve().unwrap();
        assert_eq!(resolved.table_url(), "https://demo.supabase.co/rest/v1/records");
        assert_eq!(resolved.bearer_token(), "anon");
    }

    #[test]
    fn resolve_prefers_access_token_for_bearer() {
        let resolved = RemoteConfig {
            access_token: Some("user-jwt".to_string()),
            ..configured()
        }
        .resolve()
        .unwrap();
        assert_eq!(resolved.bearer_token(), "user-jwt");
    }

    #[test]
    fn resolve_requires_url_and_key() {
        let missing_key = RemoteConfig {
            supabase_anon_key: Some("   ".to_string()),
            ..configured()
        };
        assert!(!missing_key.is_configured());
        assert!(missing_key.resolve().is_err());
        assert!(RemoteConfig::default().resolve().is_err());
    }

    #[test]
    fn resolve_rejects_suspicious_table_names() {
        let config = RemoteConfig {
            table: Some("records?select=*".to_string()),
            ..configured()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn or_fills_missing_fields_only() {
        let explicit = RemoteConfig {
            supabase_url: Some("https://explicit.supabase.co".to_string()),
            ..RemoteConfig::default()
        };
        let merged = explicit.or(configured());
        assert_eq!(
            merged.supabase_url.as_deref(),
            Some("https://explicit.supabase.co")
        );
        assert_eq!(merged.supabase_anon_key.as_deref(), Some("anon"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = RemoteConfig {
            access_token: Some("secret-token".to_string()),
            supabase_anon_key: Some("secret-anon".to_string()),
            ..configured()
        };
        let rendered = format!("{config:?} {:?}", config.clone().resolve().unwrap());
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("secret-anon"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        let error = serde_json::from_str::<RemoteConfig>(r#"{"supabase_url":"x","extra":1}"#)
            .unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn default_retention_is_five_days() {
        assert_eq!(EngineConfig::default().retention_ms(), 5 * 24 * 60 * 60 * 1000);
    }
}
