use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "resxsync.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResxSyncConfig {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    /// "google" | "bing"
    pub provider: Option<String>,
    pub table: Option<TableCfg>,
    pub online: Option<OnlineCfg>,
    pub sync: Option<SyncCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableCfg {
    pub sheet: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnlineCfg {
    pub google_endpoint: Option<String>,
    pub bing_endpoint: Option<String>,
    pub bing_app_id: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncCfg {
    pub backup: Option<bool>,
    /// Answer used for every prompt when running unattended.
    pub assume: Option<String>,
}

impl ResxSyncConfig {
    pub fn source_lang(&self) -> &str {
        self.source_lang.as_deref().unwrap_or("en")
    }

    pub fn target_lang(&self) -> &str {
        self.target_lang.as_deref().unwrap_or("es")
    }

    pub fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or("google")
    }

    pub fn sheet(&self) -> usize {
        self.table.as_ref().and_then(|t| t.sheet).unwrap_or(1)
    }

    pub fn backup(&self) -> bool {
        self.sync.as_ref().and_then(|s| s.backup).unwrap_or(false)
    }

    pub fn assume(&self) -> Option<&str> {
        self.sync.as_ref().and_then(|s| s.assume.as_deref())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Search order: `./resxsync.toml`, then `<config_dir>/resxsync/resxsync.toml`.
pub fn load_config() -> Result<ResxSyncConfig, ConfigError> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::current_dir() {
        paths.push(p.join(FILE_NAME));
    }
    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("resxsync").join(FILE_NAME));
    }
    load_from(&paths)
}

/// Merge the given files in order; the first file that sets a field wins.
/// Missing or unparsable files are skipped.
pub fn load_from(paths: &[PathBuf]) -> Result<ResxSyncConfig, ConfigError> {
    let mut merged = ResxSyncConfig::default();
    for path in paths {
        if let Some(cfg) = read_file(path) {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

fn read_file(path: &Path) -> Option<ResxSyncConfig> {
    let s = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ResxSyncConfig>(&s) {
        Ok(cfg) => {
            tracing::debug!(event = "config_loaded", path = %path.display());
            Some(cfg)
        }
        Err(e) => {
            tracing::warn!(event = "config_invalid", path = %path.display(), error = %e);
            None
        }
    }
}

fn merge(mut a: ResxSyncConfig, b: ResxSyncConfig) -> ResxSyncConfig {
    if a.source_lang.is_none() {
        a.source_lang = b.source_lang;
    }
    if a.target_lang.is_none() {
        a.target_lang = b.target_lang;
    }
    if a.provider.is_none() {
        a.provider = b.provider;
    }
    a.table = merge_opt(a.table, b.table, merge_table);
    a.online = merge_opt(a.online, b.online, merge_online);
    a.sync = merge_opt(a.sync, b.sync, merge_sync);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_table(mut a: TableCfg, b: TableCfg) -> TableCfg {
    if a.sheet.is_none() {
        a.sheet = b.sheet;
    }
    a
}

fn merge_online(mut a: OnlineCfg, b: OnlineCfg) -> OnlineCfg {
    if a.google_endpoint.is_none() {
        a.google_endpoint = b.google_endpoint;
    }
    if a.bing_endpoint.is_none() {
        a.bing_endpoint = b.bing_endpoint;
    }
    if a.bing_app_id.is_none() {
        a.bing_app_id = b.bing_app_id;
    }
    if a.user_agent.is_none() {
        a.user_agent = b.user_agent;
    }
    if a.timeout_secs.is_none() {
        a.timeout_secs = b.timeout_secs;
    }
    a
}

fn merge_sync(mut a: SyncCfg, b: SyncCfg) -> SyncCfg {
    if a.backup.is_none() {
        a.backup = b.backup;
    }
    if a.assume.is_none() {
        a.assume = b.assume;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_files() {
        let cfg = load_from(&[]).unwrap();
        assert_eq!(cfg.source_lang(), "en");
        assert_eq!(cfg.target_lang(), "es");
        assert_eq!(cfg.provider(), "google");
        assert_eq!(cfg.sheet(), 1);
        assert!(!cfg.backup());
        assert!(cfg.assume().is_none());
    }

    #[test]
    fn first_file_wins_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.toml");
        let global = dir.path().join("global.toml");
        let broken = dir.path().join("broken.toml");
        std::fs::write(&local, "target_lang = \"fr\"\n[online]\ntimeout_secs = 5\n").unwrap();
        std::fs::write(
            &global,
            "target_lang = \"de\"\nprovider = \"bing\"\n[online]\ntimeout_secs = 60\nbing_app_id = \"abc\"\n[sync]\nbackup = true\n",
        )
        .unwrap();
        std::fs::write(&broken, "target_lang = [").unwrap();

        let cfg = load_from(&[broken, local, global, dir.path().join("absent.toml")]).unwrap();
        assert_eq!(cfg.target_lang(), "fr");
        assert_eq!(cfg.provider(), "bing");
        let online = cfg.online.as_ref().unwrap();
        assert_eq!(online.timeout_secs, Some(5));
        assert_eq!(online.bing_app_id.as_deref(), Some("abc"));
        assert!(cfg.backup());
    }
}
