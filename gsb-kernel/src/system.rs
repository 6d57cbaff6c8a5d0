use serde::Serialize;
use sysinfo::System;

/// Identification de l'hôte, affichée dans la barre de statut du dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SystemIdentity {
    pub platform: String,
    pub app_version: String,
    pub os_version: String,
    pub kernel_version: String,
}

pub fn identify() -> SystemIdentity {
    SystemIdentity {
        platform: std::env::consts::OS.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
        kernel_version: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_reports_platform_and_versions() {
        let identity = identify();
        assert_eq!(identity.platform, std::env::consts::OS);
        assert_eq!(identity.app_version, env!("CARGO_PKG_VERSION"));
        assert!(!identity.os_version.is_empty());
    }
}
