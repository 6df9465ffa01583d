use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\{\w+(?:[:,][^}]*)?\}|%s|%d)").expect("valid placeholder regex"))
}

/// Format placeholders in `text`: `{0}`, `{name}`, `{0:N2}`, `%s`, `%d`.
pub fn placeholders(text: &str) -> BTreeSet<String> {
    placeholder_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Human readable note when `translated` does not carry the same
/// placeholders as `english`.
pub fn placeholder_mismatch(english: &str, translated: &str) -> Option<String> {
    let expected = placeholders(english);
    let actual = placeholders(translated);
    if expected == actual {
        return None;
    }
    let missing: Vec<_> = expected.difference(&actual).map(String::as_str).collect();
    let extra: Vec<_> = actual.difference(&expected).map(String::as_str).collect();
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing {}", missing.join(" ")));
    }
    if !extra.is_empty() {
        parts.push(format!("unexpected {}", extra.join(" ")));
    }
    Some(format!("Placeholder mismatch: {}", parts.join("; ")))
}
