//! Optional TOML file with defaults for the connection and table shape.
//!
//! ```toml
//! ch_addr = "clickhouse.internal:8123"
//! table = "service_logs"
//! fields = "level,message"
//! text_field = "message"
//! reverse = true
//! limit = 0
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use lg_core::ScanConfig;

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub ch_addr: String,
    pub table: String,
    pub fields: String,
    pub text_field: String,
    pub reverse: bool,
    pub limit: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        let base = ScanConfig::default();
        Self {
            ch_addr: base.endpoint,
            table: base.table,
            fields: base.fields,
            text_field: base.text_field,
            reverse: base.reverse,
            limit: base.limit,
        }
    }
}

impl FileConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
