//! Provider selection with ordered-credential fallback.
//!
//! Tries the configured credentials strictly in priority order and returns
//! the first constructible provider handle. Selection happens once per
//! process lifetime; a transient failure at startup is not retried without
//! a restart, so callers treat an absent handle as a standing degraded
//! state rather than a per-request error.

use std::sync::Arc;

use tracing::{error, info};

use super::config::{Credential, CredentialKind, ResolverConfig};
use super::provider::LlmProvider;
use super::providers::OpenAiCompatProvider;
use crate::error::Error;

/// Selects and constructs one reasoning backend from the configured
/// credential list.
///
/// Each construction failure is logged and the selector advances to the
/// next credential; it never retries the same one. No side effects beyond
/// logging.
///
/// # Errors
///
/// Returns [`Error::NoProviderAvailable`] only when every credential has
/// failed or the list is empty.
pub fn select_provider(config: &ResolverConfig) -> Result<Arc<dyn LlmProvider>, Error> {
    for credential in &config.credentials {
        match construct(credential, config) {
            Ok(provider) => {
                info!(provider = provider.name(), "reasoning provider initialized");
                return Ok(provider);
            }
            Err(e) => {
                error!(
                    kind = credential.kind.as_str(),
                    error = %e,
                    "provider construction failed, trying next credential"
                );
            }
        }
    }

    error!("no valid reasoning-backend credentials found");
    Err(Error::NoProviderAvailable)
}

/// Constructs a provider for a single credential.
fn construct(
    credential: &Credential,
    config: &ResolverConfig,
) -> Result<Arc<dyn LlmProvider>, Error> {
    if credential.key.trim().is_empty() {
        return Err(Error::Provider {
            message: format!("empty {} API key", credential.kind.as_str()),
            status: None,
        });
    }

    let provider = match credential.kind {
        CredentialKind::Gemini => OpenAiCompatProvider::new(
            "gemini",
            &credential.key,
            &config.gemini_base_url,
            config.timeout,
        ),
        CredentialKind::Anthropic => OpenAiCompatProvider::new(
            "anthropic",
            &credential.key,
            &config.anthropic_base_url,
            config.timeout,
        ),
    };

    Ok(Arc::new(provider))
}

/// Returns the model identifier for whichever backend was selected.
#[must_use]
pub fn model_for(provider_name: &str, config: &ResolverConfig) -> String {
    if provider_name == "anthropic" {
        config.anthropic_model.clone()
    } else {
        config.gemini_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(credentials: Vec<Credential>) -> ResolverConfig {
        ResolverConfig::builder().credentials(credentials).build()
    }

    #[test]
    fn test_empty_credential_list_is_no_provider() {
        let result = select_provider(&config_with(Vec::new()));
        assert!(matches!(result, Err(Error::NoProviderAvailable)));
    }

    #[test]
    fn test_first_credential_wins() {
        let config = config_with(vec![
            Credential {
                kind: CredentialKind::Gemini,
                key: "gemini-key".to_string(),
            },
            Credential {
                kind: CredentialKind::Anthropic,
                key: "anthropic-key".to_string(),
            },
        ]);
        let provider = match select_provider(&config) {
            Ok(p) => p,
            Err(e) => unreachable!("selection failed: {e}"),
        };
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_falls_through_unconstructible_credential() {
        let config = config_with(vec![
            Credential {
                kind: CredentialKind::Gemini,
                key: "   ".to_string(),
            },
            Credential {
                kind: CredentialKind::Anthropic,
                key: "anthropic-key".to_string(),
            },
        ]);
        let provider = match select_provider(&config) {
            Ok(p) => p,
            Err(e) => unreachable!("selection failed: {e}"),
        };
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_all_credentials_failing_is_no_provider() {
        let config = config_with(vec![
            Credential {
                kind: CredentialKind::Gemini,
                key: String::new(),
            },
            Credential {
                kind: CredentialKind::Anthropic,
                key: "  ".to_string(),
            },
        ]);
        let result = select_provider(&config);
        assert!(matches!(result, Err(Error::NoProviderAvailable)));
    }

    #[test]
    fn test_priority_respects_list_order_not_kind() {
        let config = config_with(vec![
            Credential {
                kind: CredentialKind::Anthropic,
                key: "anthropic-key".to_string(),
            },
            Credential {
                kind: CredentialKind::Gemini,
                key: "gemini-key".to_string(),
            },
        ]);
        let provider = match select_provider(&config) {
            Ok(p) => p,
            Err(e) => unreachable!("selection failed: {e}"),
        };
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_model_for_selected_backend() {
        let config = ResolverConfig::builder().build();
        assert_eq!(model_for("gemini", &config), config.gemini_model);
        assert_eq!(model_for("anthropic", &config), config.anthropic_model);
    }
}
