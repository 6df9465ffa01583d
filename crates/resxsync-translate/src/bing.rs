use color_eyre::eyre::eyre;
use resxsync_core::Result;
use serde::Deserialize;

use crate::{ensure_not_html, TranslationProvider};

pub(crate) const DEFAULT_ENDPOINT: &str = "http://api.microsofttranslator.com/v2/ajax.svc/TranslateArray2";

/// Client for the AJAX `TranslateArray2` endpoint. Every query value is a
/// JSON literal: quoted strings and a one-element array of texts.
pub struct BingProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    from: String,
    to: String,
    app_id: String,
}

impl BingProvider {
    pub fn new(client: reqwest::blocking::Client, from: &str, to: &str, app_id: &str) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            app_id: app_id.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl TranslationProvider for BingProvider {
    fn name(&self) -> &str {
        "bing"
    }

    fn try_translate(&self, text: &str) -> Result<String> {
        if self.app_id.is_empty() {
            return Err(eyre!("bing_app_id is not configured"));
        }
        let quote = |s: &str| serde_json::Value::from(s).to_string();
        let texts = serde_json::json!([text]).to_string();
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("appId", quote(&self.app_id)),
                ("texts", texts),
                ("from", quote(&self.from)),
                ("to", quote(&self.to)),
            ])
            .header("Content-Type", "application/json")
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        parse_bing_response(&body)
    }
}

#[derive(Deserialize)]
struct BingResult {
    #[serde(rename = "TranslatedText")]
    translated_text: Option<String>,
}

/// First `TranslatedText` of a `TranslateArray2` reply.
pub fn parse_bing_response(body: &str) -> Result<String> {
    let body = ensure_not_html(body)?;
    let results: Vec<BingResult> = serde_json::from_str(body)?;
    results
        .into_iter()
        .next()
        .and_then(|r| r.translated_text)
        .ok_or_else(|| eyre!("response carries no translation"))
}
