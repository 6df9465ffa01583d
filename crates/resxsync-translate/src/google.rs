use color_eyre::eyre::eyre;
use resxsync_core::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::{ensure_not_html, TranslationProvider};

pub(crate) const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    from: String,
    to: String,
}

impl GoogleProvider {
    pub fn new(client: reqwest::blocking::Client, from: &str, to: &str) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl TranslationProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn try_translate(&self, text: &str) -> Result<String> {
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.from.as_str()),
                ("tl", self.to.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        parse_google_response(&body)
    }
}

#[derive(Deserialize)]
struct LegacyResponse {
    sentences: Vec<LegacySentence>,
}

#[derive(Deserialize)]
struct LegacySentence {
    #[serde(default)]
    trans: Option<String>,
}

/// Accepts the `[[["Hola","Hello",..],..],..]` shape of the gtx endpoint and
/// the older `{"sentences":[{"trans":..}]}` shape. Sentences are concatenated.
pub fn parse_google_response(body: &str) -> Result<String> {
    let body = ensure_not_html(body)?;
    if body.starts_with('{') {
        let legacy: LegacyResponse = serde_json::from_str(body)?;
        let text: String = legacy.sentences.into_iter().filter_map(|s| s.trans).collect();
        if text.is_empty() {
            return Err(eyre!("response carries no sentences"));
        }
        return Ok(text);
    }

    let value: Value = serde_json::from_str(body)?;
    let sentences = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| eyre!("unexpected response shape"))?;
    let text: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(eyre!("response carries no sentences"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_array_sentences_are_joined() {
        let body = r#"[[["Hola. ","Hello. ",null,null,10],["¿Cómo estás?","How are you?",null,null,10]],null,"en"]"#;
        assert_eq!(parse_google_response(body).unwrap(), "Hola. ¿Cómo estás?");
    }

    #[test]
    fn legacy_object_shape() {
        let body = r#"{"sentences":[{"trans":"Sólo un valor","orig":"Only one value"}],"src":"en"}"#;
        assert_eq!(parse_google_response(body).unwrap(), "Sólo un valor");
    }

    #[test]
    fn html_pages_are_errors() {
        assert!(parse_google_response("<!DOCTYPE html><html></html>").is_err());
    }

    #[test]
    fn empty_results_are_errors() {
        assert!(parse_google_response("[null,null,\"en\"]").is_err());
        assert!(parse_google_response(r#"{"sentences":[]}"#).is_err());
    }
}
