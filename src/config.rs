use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
/// Same order of magnitude as a browser's per-origin local storage allowance.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: SocketAddr,
    /// Directory for the file-backed medium; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub quota_bytes: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = lookup("TASKFLOW_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr.parse().with_context(|| format!("invalid TASKFLOW_ADDR `{addr}`"))?;
        let data_dir = lookup("TASKFLOW_DATA_DIR").filter(|d| !d.trim().is_empty()).map(PathBuf::from);
        let quota_bytes = match lookup("TASKFLOW_QUOTA_BYTES") {
            Some(raw) => raw.trim().parse().with_context(|| format!("invalid TASKFLOW_QUOTA_BYTES `{raw}`"))?,
            None => DEFAULT_QUOTA_BYTES,
        };
        Ok(Self { addr, data_dir, quota_bytes })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.data_dir, None);
        assert_eq!(cfg.quota_bytes, DEFAULT_QUOTA_BYTES);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("TASKFLOW_ADDR", "0.0.0.0:8080"),
            ("TASKFLOW_DATA_DIR", "/var/lib/taskflow"),
            ("TASKFLOW_QUOTA_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/taskflow")));
        assert_eq!(cfg.quota_bytes, 1024);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("TASKFLOW_ADDR", "nowhere")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TASKFLOW_QUOTA_BYTES", "lots")])).is_err());
    }
}
