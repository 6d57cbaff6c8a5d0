use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KernelConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Chemin du document servers.json du dashboard.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Nombre de pings lancés en parallèle dans un lot.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Modèle de commande du terminal SSH, jetons {user} et {ip}.
    /// Ex: "gnome-terminal -- ssh {user}@{ip}"
    #[serde(default = "default_ssh_terminal")]
    pub ssh_terminal: String,
}

fn default_port() -> u16 {
    8080
}

fn default_data_file() -> String {
    "./data/servers.json".to_string()
}

fn default_batch_size() -> usize {
    crate::scan::DEFAULT_BATCH_SIZE
}

fn default_ping_timeout_ms() -> u64 {
    crate::scan::DEFAULT_PING_TIMEOUT_MS
}

fn default_ssh_terminal() -> String {
    if cfg!(target_os = "windows") {
        r#"cmd /C start powershell -NoExit -Command "ssh {user}@{ip}""#.to_string()
    } else {
        "gnome-terminal -- ssh {user}@{ip}".to_string()
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_file: default_data_file(),
            scan: ScanConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            ping_timeout_ms: default_ping_timeout_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ssh_terminal: default_ssh_terminal(),
        }
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("GSB_KERNEL_CONFIG").unwrap_or_else(|_| "gsb.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return KernelConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("config invalide dans {path}: {e}");
            KernelConfig::default()
        })
    } else {
        info!("pas de {path}, configuration par défaut");
        KernelConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = KernelConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.data_file, "./data/servers.json");
        assert_eq!(cfg.scan.batch_size, 50);
        assert_eq!(cfg.scan.ping_timeout_ms, 1000);
        assert!(cfg.session.ssh_terminal.contains("{user}"));
        assert!(cfg.session.ssh_terminal.contains("{ip}"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg: KernelConfig = serde_yaml::from_str("port: 9090\n").unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.scan.batch_size, 50);
        assert_eq!(cfg.data_file, "./data/servers.json");
    }

    #[test]
    fn test_scan_section_overrides() {
        let cfg: KernelConfig =
            serde_yaml::from_str("scan:\n  batch_size: 10\n  ping_timeout_ms: 500\n").unwrap();
        assert_eq!(cfg.scan.batch_size, 10);
        assert_eq!(cfg.scan.ping_timeout_ms, 500);
        assert_eq!(cfg.port, 8080);
    }
}
