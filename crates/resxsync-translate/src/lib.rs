//! Online translation back ends. Each provider turns one phrase into one
//! phrase; failures degrade to the untranslated input.

mod bing;
mod google;
mod languages;

use std::time::Duration;

use color_eyre::eyre::eyre;
use resxsync_core::Result;
use serde::Deserialize;

pub use bing::{parse_bing_response, BingProvider};
pub use google::{parse_google_response, GoogleProvider};
pub use languages::{find_language, Language, LANGUAGES};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("resxsync/", env!("CARGO_PKG_VERSION"));

pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One request, no retries.
    fn try_translate(&self, text: &str) -> Result<String>;

    /// Translated text, or `text` itself when the provider fails.
    fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        match self.try_translate(text) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(
                    event = "provider_failed",
                    provider = self.name(),
                    text = text,
                    error = %err,
                );
                text.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    Bing,
}

impl std::str::FromStr for ProviderKind {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            other => Err(eyre!("unknown provider `{other}` (expected google or bing)")),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Google => "google",
            Self::Bing => "bing",
        })
    }
}

/// Connection settings shared by all providers. `None` means the built-in default.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub google_endpoint: Option<String>,
    pub bing_endpoint: Option<String>,
    pub bing_app_id: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    fn client(&self) -> Result<reqwest::blocking::Client> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .timeout(Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()?;
        Ok(client)
    }
}

pub fn build_provider(
    kind: ProviderKind,
    from: &str,
    to: &str,
    settings: &ProviderSettings,
) -> Result<Box<dyn TranslationProvider>> {
    let client = settings.client()?;
    let provider: Box<dyn TranslationProvider> = match kind {
        ProviderKind::Google => Box::new(GoogleProvider::new(client, from, to).with_endpoint(
            settings
                .google_endpoint
                .as_deref()
                .unwrap_or(google::DEFAULT_ENDPOINT),
        )),
        ProviderKind::Bing => Box::new(
            BingProvider::new(client, from, to, settings.bing_app_id.as_deref().unwrap_or(""))
                .with_endpoint(settings.bing_endpoint.as_deref().unwrap_or(bing::DEFAULT_ENDPOINT)),
        ),
    };
    tracing::debug!(event = "provider_built", provider = provider.name(), from = from, to = to);
    Ok(provider)
}

/// Reject HTML bodies early; both services answer with a page when throttled.
fn ensure_not_html(body: &str) -> Result<&str> {
    let body = body.trim_start_matches('\u{feff}').trim();
    if body.starts_with('<') {
        return Err(eyre!("service returned an HTML page instead of translation data"));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing {
        calls: AtomicUsize,
    }

    impl TranslationProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn try_translate(&self, _text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(eyre!("connection refused"))
        }
    }

    #[test]
    fn failures_degrade_to_input_without_retry() {
        let p = Failing {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(p.translate("Hello"), "Hello");
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blank_text_is_not_sent() {
        let p = Failing {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(p.translate("  "), "  ");
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn provider_kind_parses_case_insensitively() {
        assert_eq!("Bing".parse::<ProviderKind>().unwrap(), ProviderKind::Bing);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert!("deepl".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Bing.to_string(), "bing");
    }

    #[test]
    fn providers_are_built_from_settings() {
        let settings = ProviderSettings {
            google_endpoint: Some("http://127.0.0.1:9/translate".into()),
            timeout_secs: Some(1),
            ..Default::default()
        };
        let p = build_provider(ProviderKind::Google, "en", "es", &settings).unwrap();
        assert_eq!(p.name(), "google");
        let p = build_provider(ProviderKind::Bing, "en", "es", &settings).unwrap();
        assert_eq!(p.name(), "bing");
    }
}
