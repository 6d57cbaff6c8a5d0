use serde::{Deserialize, Serialize};

/// Système d'exploitation d'un serveur du parc. Détermine le mode de
/// connexion : Windows => RDP, Linux => SSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerOs {
    Windows,
    Linux,
}

impl ServerOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerOs::Windows => "Windows",
            ServerOs::Linux => "Linux",
        }
    }
}

/// Enregistrement serveur tel que persisté dans servers.json.
/// Les clés majuscules sont le format historique du fichier du dashboard,
/// conservé tel quel pour rester compatible avec les documents existants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "Zone")]
    pub zone: String,
    #[serde(rename = "OS")]
    pub os: ServerOs,
    #[serde(rename = "Color", default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "White".to_string()
}

/// Formulaire d'ajout/modification envoyé par le dashboard.
/// L'ID n'en fait pas partie : il est attribué par le store à l'ajout
/// (max+1) et imposé par la route à la modification.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerForm {
    pub name: String,
    pub ip: String,
    pub user: String,
    pub zone: String,
    pub os: ServerOs,
    #[serde(default = "default_color")]
    pub color: String,
}

impl ServerForm {
    /// Normalise le formulaire en enregistrement, champs trimés.
    pub fn into_record(self, id: u32) -> ServerRecord {
        ServerRecord {
            id,
            name: self.name.trim().to_string(),
            ip: self.ip.trim().to_string(),
            user: self.user.trim().to_string(),
            zone: self.zone.trim().to_string(),
            os: self.os,
            color: self.color,
        }
    }
}

/// Critères de la barre de recherche du dashboard. `os` et `zone` arrivent
/// en query string, chaîne vide = pas de filtre (valeur du <select> vide).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecordFilter {
    pub search: Option<String>,
    pub os: Option<String>,
    pub zone: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ServerRecord) -> bool {
        let search_ok = match self.search.as_deref() {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                record.name.to_lowercase().contains(&term)
                    || record.ip.contains(&term)
                    || record.zone.to_lowercase().contains(&term)
                    || record.user.to_lowercase().contains(&term)
            }
        };
        let os_ok = match self.os.as_deref() {
            None | Some("") => true,
            Some(os) => record.os.as_str().eq_ignore_ascii_case(os),
        };
        let zone_ok = match self.zone.as_deref() {
            None | Some("") => true,
            Some(zone) => record.zone == zone,
        };
        search_ok && os_ok && zone_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ServerRecord {
        ServerRecord {
            id: 4,
            name: "SRV-WEB".to_string(),
            ip: "172.16.0.10".to_string(),
            user: "gsbadmin".to_string(),
            zone: "DMZ".to_string(),
            os: ServerOs::Linux,
            color: "White".to_string(),
        }
    }

    #[test]
    fn test_wire_format_keeps_dashboard_keys() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["ID"], 4);
        assert_eq!(value["Name"], "SRV-WEB");
        assert_eq!(value["OS"], "Linux");
        assert_eq!(value["Color"], "White");
    }

    #[test]
    fn test_record_parses_without_color() {
        let raw = r#"{"ID":1,"Name":"SRV-AD","IP":"192.168.10.2","User":"administrateur","Zone":"VLAN_SERVEURS","OS":"Windows"}"#;
        let record: ServerRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.os, ServerOs::Windows);
        assert_eq!(record.color, "White");
    }

    #[test]
    fn test_form_trims_fields() {
        let form = ServerForm {
            name: "  SRV-WEB ".to_string(),
            ip: " 172.16.0.10".to_string(),
            user: "gsbadmin ".to_string(),
            zone: " DMZ".to_string(),
            os: ServerOs::Linux,
            color: "White".to_string(),
        };
        let record = form.into_record(9);
        assert_eq!(record.id, 9);
        assert_eq!(record.name, "SRV-WEB");
        assert_eq!(record.ip, "172.16.0.10");
        assert_eq!(record.zone, "DMZ");
    }

    #[test]
    fn test_filter_search_spans_name_ip_zone_user() {
        let record = record();
        for term in ["web", "172.16", "dmz", "gsbadmin"] {
            let filter = RecordFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            assert!(filter.matches(&record), "terme {term}");
        }
        let filter = RecordFilter {
            search: Some("oracle".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_filter_empty_values_match_everything() {
        let filter = RecordFilter {
            search: Some(String::new()),
            os: Some(String::new()),
            zone: Some(String::new()),
        };
        assert!(filter.matches(&record()));
    }

    #[test]
    fn test_filter_os_and_zone_are_exact() {
        let record = record();
        let filter = RecordFilter {
            os: Some("Linux".to_string()),
            zone: Some("DMZ".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&record));

        let filter = RecordFilter {
            os: Some("Windows".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&record));

        // la zone est une égalité stricte, pas un sous-texte
        let filter = RecordFilter {
            zone: Some("DM".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&record));
    }
}
