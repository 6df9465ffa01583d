use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Key used for notifications that report a lookup miss instead of a write.
pub const WARNING_KEY: &str = "WARNING";
/// Key used for the single notification emitted when a run fails.
pub const ERROR_KEY: &str = "ERROR";

/// One row of a translation table.
///
/// When `key` is present it addresses a target entry directly; otherwise
/// `english_value` is matched against the values of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub key: Option<String>,
    pub english_value: String,
    pub translated_value: String,
}

impl TranslationEntry {
    pub fn new(key: Option<&str>, english_value: &str, translated_value: &str) -> Self {
        Self {
            key: key.map(str::to_string),
            english_value: english_value.to_string(),
            translated_value: translated_value.to_string(),
        }
    }

    /// Rows with nothing in any column carry no information.
    pub fn is_blank(&self) -> bool {
        self.key.as_deref().unwrap_or("").trim().is_empty()
            && self.english_value.trim().is_empty()
            && self.translated_value.trim().is_empty()
    }
}

/// What a notification reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Written,
    Warning,
    Failure,
}

/// Notification payload: one committed write, one warning, or one run failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TranslatedItem {
    #[serde(default)]
    pub kind: ItemKind,
    pub key: String,
    pub english_value: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TranslatedItem {
    pub fn written(key: &str, english_value: &str, translation: &str) -> Self {
        Self {
            kind: ItemKind::Written,
            key: key.to_string(),
            english_value: english_value.to_string(),
            translation: translation.to_string(),
            comment: None,
        }
    }

    pub fn missing_source(english_value: &str) -> Self {
        Self {
            kind: ItemKind::Warning,
            key: WARNING_KEY.to_string(),
            english_value: english_value.to_string(),
            translation: "No translation can be made.".to_string(),
            comment: Some("No source key could be found!".to_string()),
        }
    }

    /// The target holds `key` as a typed payload, so no string goes there.
    pub fn typed_target(key: &str, english_value: &str) -> Self {
        Self {
            kind: ItemKind::Warning,
            key: key.to_string(),
            english_value: english_value.to_string(),
            translation: "No translation can be made.".to_string(),
            comment: Some(format!("`{key}` holds a non-string resource in the target file")),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            kind: ItemKind::Failure,
            key: ERROR_KEY.to_string(),
            english_value: String::new(),
            translation: String::new(),
            comment: Some(message.to_string()),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.kind == ItemKind::Warning
    }

    pub fn is_failure(&self) -> bool {
        self.kind == ItemKind::Failure
    }
}

/// Answer to "overwrite the existing value with this translation?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteAnswer {
    Yes,
    YesToAll,
    No,
    Cancel,
}

/// Answer to "use this translation for all N matching keys?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseForAllAnswer {
    Yes,
    /// Same as `Yes`, and later ambiguous rows of the run are not asked again.
    YesToAll,
    No,
    Cancel,
}

/// Answer to "use this translation for this one key?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseForKeyAnswer {
    Yes,
    No,
}

/// What the engine decided to do with one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Overwrite,
    OverwriteAll,
    Skip,
    Cancel,
}

impl From<OverwriteAnswer> for Resolution {
    fn from(answer: OverwriteAnswer) -> Self {
        match answer {
            OverwriteAnswer::Yes => Resolution::Overwrite,
            OverwriteAnswer::YesToAll => Resolution::OverwriteAll,
            OverwriteAnswer::No => Resolution::Skip,
            OverwriteAnswer::Cancel => Resolution::Cancel,
        }
    }
}

/// Configuration errors. Fatal for the run, reported verbatim.
#[derive(Debug, Error)]
pub enum ResxError {
    #[error("No <root> element can be found in {path}. Please verify that it is a resource file following the ResX schema version 2.0")]
    MissingRoot { path: PathBuf },

    #[error("{path}: key `{key}` is defined more than once (keys are case-insensitive)")]
    DuplicateKey { path: PathBuf, key: String },

    #[error("{path}: invalid XML: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("worksheet {sheet} not found (CSV workbooks contain only worksheet 1)")]
    SheetNotFound { sheet: usize },

    #[error("{path}: expected a *.{expected} file")]
    InvalidExtension { path: PathBuf, expected: &'static str },

    #[error("{path}: file not found")]
    NotFound { path: PathBuf },
}
