use crate::merge::DEFAULT_MAX_MERGE_POSTINGS;
use crate::query::scorer::Bm25Params;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "postmerge";
const CONFIG_FILE: &str = "config.json";

/// Default upper bound on query terms accepted from a caller
pub const DEFAULT_MAX_QUERY_TERMS: usize = 64;

/// Query settings, loaded from `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// BM25 tunables
    #[serde(default)]
    pub bm25: Bm25Params,

    /// Maximum number of postings merged in one session
    #[serde(default = "default_max_merge_postings")]
    pub max_merge_postings: usize,

    /// Maximum number of terms accepted in one query
    #[serde(default = "default_max_query_terms")]
    pub max_query_terms: usize,

    /// Stop merging after this many hits (None = no limit)
    #[serde(default)]
    pub max_hits: Option<usize>,
}

fn default_max_merge_postings() -> usize {
    DEFAULT_MAX_MERGE_POSTINGS
}

fn default_max_query_terms() -> usize {
    DEFAULT_MAX_QUERY_TERMS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            max_merge_postings: default_max_merge_postings(),
            max_query_terms: default_max_query_terms(),
            max_hits: None,
        }
    }
}

impl Settings {
    /// Load settings from the user config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values BM25 or the merge driver cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.bm25.k1.is_finite() && self.bm25.k1 >= 0.0) {
            bail!("bm25.k1 must be a non-negative number, got {}", self.bm25.k1);
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            bail!("bm25.b must be within [0, 1], got {}", self.bm25.b);
        }
        if self.max_merge_postings == 0 {
            bail!("max_merge_postings must be at least 1");
        }
        if self.max_query_terms == 0 {
            bail!("max_query_terms must be at least 1");
        }
        if self.max_hits == Some(0) {
            bail!("max_hits must be at least 1 when set");
        }
        Ok(())
    }
}

/// Path of the user config file (`<config dir>/postmerge/config.json`)
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME).join(CONFIG_FILE))
}
