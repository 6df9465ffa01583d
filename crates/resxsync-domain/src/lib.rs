use resxsync_core::TranslatedItem;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub schema_version: u32,
    /// "table" or "online"
    pub mode: String,
    pub written: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub cancelled: bool,
    pub failure: Option<String>,
    pub dry_run: bool,
    pub elapsed_secs: f64,
    pub items: Vec<TranslatedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportReport {
    pub schema_version: u32,
    pub path: String,
    pub rows: usize,
    pub untranslated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LookupMatch {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LookupOutput {
    pub schema_version: u32,
    pub query: String,
    pub matches: Vec<LookupMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InitReport {
    pub schema_version: u32,
    pub path: String,
    pub keys: usize,
    /// created / replaced / planned / skipped
    pub status: String,
}
