use tracing::debug;

use crate::errors::ForecastError;

/// Resolve a credential value. A value starting with '$' is an environment
/// variable reference; an unset or empty variable resolves to `None`.
pub fn resolve_credential(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) if !resolved.trim().is_empty() => {
                debug!(var = %var_name, "Resolved credential from environment");
                Some(resolved.trim().to_string())
            }
            _ => {
                debug!(var = %var_name, "Credential environment variable not set");
                None
            }
        }
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Resolve a credential that a source cannot run without.
pub fn require_credential(source: &str, value: Option<&str>) -> Result<String, ForecastError> {
    let configured = value.ok_or_else(|| {
        ForecastError::Configuration(format!("Source '{}' requires an API key but none is configured", source))
    })?;
    resolve_credential(configured).ok_or_else(|| {
        ForecastError::Configuration(format!(
            "Source '{}' API key '{}' did not resolve to a value",
            source,
            redact(configured)
        ))
    })
}

/// Mask a credential for logs, keeping `$VAR` references readable.
pub fn redact(value: &str) -> String {
    if value.starts_with('$') {
        value.to_string()
    } else if value.chars().count() <= 4 {
        "[REDACTED]".to_string()
    } else {
        let prefix: String = value.chars().take(2).collect();
        format!("{}…[REDACTED]", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_credential() {
        assert_eq!(resolve_credential("abc123"), Some("abc123".to_string()));
    }

    #[test]
    fn test_empty_credential_is_none() {
        assert_eq!(resolve_credential("   "), None);
    }

    #[test]
    fn test_env_credential() {
        std::env::set_var("VULNFORECAST_TEST_KEY_SET", "secret-value");
        assert_eq!(
            resolve_credential("$VULNFORECAST_TEST_KEY_SET"),
            Some("secret-value".to_string())
        );
    }

    #[test]
    fn test_unset_env_credential_is_configuration_error() {
        let err = require_credential("nvd", Some("$VULNFORECAST_TEST_KEY_UNSET")).unwrap_err();
        assert!(matches!(err, ForecastError::Configuration(_)));
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        assert!(matches!(require_credential("nvd", None), Err(ForecastError::Configuration(_))));
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("$NVD_API_KEY"), "$NVD_API_KEY");
        assert_eq!(redact("abcd"), "[REDACTED]");
        assert!(redact("abcdefgh").starts_with("ab"));
        assert!(!redact("abcdefgh").contains("efgh"));
    }
}
