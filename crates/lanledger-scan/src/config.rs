//! Configuration for the lanledger scanner.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::Deserialize;

use crate::error::{Result, ScanError};

/// Target used when neither config nor `NMAP_TARGET` names one.
pub const DEFAULT_TARGET: &str = "192.168.1.0/24";

/// Environment variable read by the scan wrapper scripts for the target range.
pub const LEGACY_TARGET_VAR: &str = "NMAP_TARGET";

/// Top-level scan configuration.
///
/// Loaded from `lanledger.toml` `[scan]` section or
/// `LANLEDGER__SCAN__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Path to the nmap binary.
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Network range handed to `nmap -sn`.
    #[serde(default = "default_target")]
    pub target: String,

    /// SQLite database holding the device inventory.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// If set, the raw text of each scan is saved here.
    #[serde(default)]
    pub report_path: Option<String>,

    /// Seconds between passes in daemon mode.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Upper bound on a single nmap run.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_nmap_path() -> String {
    "/usr/bin/nmap".to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_db_path() -> String {
    "nmap_devices.db".to_string()
}

fn default_interval() -> u64 {
    3600
}

fn default_timeout() -> u64 {
    300
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            target: default_target(),
            db_path: default_db_path(),
            report_path: None,
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ScanConfig {
    /// Reject values that would make the scheduler or scanner misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(ScanError::Config("interval_secs must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ScanError::Config("timeout_secs must be at least 1".into()));
        }
        if self.db_path.trim().is_empty() {
            return Err(ScanError::Config("db_path must not be empty".into()));
        }
        self.target.parse::<ScanTarget>()?;
        Ok(())
    }
}

/// Load the `[scan]` section from `<file_prefix>.toml` and the environment.
///
/// `NMAP_TARGET` supplies the target when neither source sets one.
pub fn load_scan_config(file_prefix: &str) -> Result<ScanConfig> {
    build_scan_config(file_prefix, std::env::var(LEGACY_TARGET_VAR).ok())
}

fn build_scan_config(file_prefix: &str, legacy_target: Option<String>) -> Result<ScanConfig> {
    let target = legacy_target
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(default_target);

    let cfg = config::Config::builder()
        .set_default("scan.target", target)
        .map_err(|e| ScanError::Config(e.to_string()))?
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LANLEDGER")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ScanError::Config(e.to_string()))?;

    let scan = cfg
        .get::<ScanConfig>("scan")
        .map_err(|e| ScanError::Config(e.to_string()))?;
    scan.validate()?;
    Ok(scan)
}

/// What nmap is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// CIDR range, e.g. `192.168.1.0/24`.
    Network(IpNet),
    /// Single address.
    Address(IpAddr),
    /// Hostname or nmap range expression such as `10.0.0.1-20`.
    Expression(String),
}

impl FromStr for ScanTarget {
    type Err = ScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(net) = s.parse::<IpNet>() {
            return Ok(Self::Network(net));
        }
        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(Self::Address(addr));
        }

        // Anything else goes to nmap verbatim, so it must not look like a flag.
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ',' | ':' | '/');
        if s.is_empty() || s.starts_with('-') || !s.chars().all(allowed) {
            return Err(ScanError::InvalidTarget(s.to_string()));
        }
        Ok(Self::Expression(s.to_string()))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(net) => write!(f, "{net}"),
            Self::Address(addr) => write!(f, "{addr}"),
            Self::Expression(expr) => f.write_str(expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.nmap_path, "/usr/bin/nmap");
        assert_eq!(config.target, "192.168.1.0/24");
        assert_eq!(config.db_path, "nmap_devices.db");
        assert_eq!(config.report_path, None);
        assert_eq!(config.interval_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lanledger.toml"),
            "[scan]\n\
             target = \"10.0.0.0/24\"\n\
             db_path = \"/var/lib/lanledger/devices.db\"\n\
             report_path = \"scan_network.txt\"\n\
             interval_secs = 900\n",
        )
        .unwrap();

        let prefix = dir.path().join("lanledger");
        let config = build_scan_config(prefix.to_str().unwrap(), None).unwrap();
        assert_eq!(config.target, "10.0.0.0/24");
        assert_eq!(config.db_path, "/var/lib/lanledger/devices.db");
        assert_eq!(config.report_path.as_deref(), Some("scan_network.txt"));
        assert_eq!(config.interval_secs, 900);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_legacy_target_fills_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config =
            build_scan_config(prefix.to_str().unwrap(), Some("172.16.0.0/16".to_string())).unwrap();
        assert_eq!(config.target, "172.16.0.0/16");
    }

    #[test]
    fn test_file_target_beats_legacy_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lanledger.toml"), "[scan]\ntarget = \"10.1.0.0/24\"\n").unwrap();

        let prefix = dir.path().join("lanledger");
        let config =
            build_scan_config(prefix.to_str().unwrap(), Some("172.16.0.0/16".to_string())).unwrap();
        assert_eq!(config.target, "10.1.0.0/24");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ScanConfig {
            interval_secs: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_scan_target_kinds() {
        assert!(matches!(
            "192.168.1.0/24".parse::<ScanTarget>().unwrap(),
            ScanTarget::Network(_)
        ));
        assert!(matches!(
            "10.0.0.7".parse::<ScanTarget>().unwrap(),
            ScanTarget::Address(_)
        ));
        assert_eq!(
            "10.0.0.1-20".parse::<ScanTarget>().unwrap(),
            ScanTarget::Expression("10.0.0.1-20".to_string())
        );
        assert_eq!(
            "192.168.1.0/24".parse::<ScanTarget>().unwrap().to_string(),
            "192.168.1.0/24"
        );
    }

    #[test]
    fn test_scan_target_rejects_flags_and_spaces() {
        assert!("-oN /tmp/x".parse::<ScanTarget>().is_err());
        assert!("--script=evil".parse::<ScanTarget>().is_err());
        assert!("10.0.0.1; rm -rf".parse::<ScanTarget>().is_err());
        assert!("".parse::<ScanTarget>().is_err());
    }
}
