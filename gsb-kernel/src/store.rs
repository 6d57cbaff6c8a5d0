/**
 * RECORD STORE - Persistance JSON de l'inventaire serveurs
 *
 * RÔLE :
 * Ce module est le propriétaire unique de la collection de serveurs du parc.
 * Toutes les mutations passent par lui et sont persistées en bloc dans
 * servers.json après chaque opération (pas d'écriture incrémentale).
 *
 * FONCTIONNEMENT :
 * - open() = lecture tolérante : BOM UTF-8 accepté, fichier absent ou JSON
 *   invalide => collection vide, jamais d'erreur remontée au dashboard
 * - save() = sérialisation indentée 4 espaces (format historique du fichier)
 *   vers un fichier temporaire puis rename, pour ne jamais laisser un
 *   servers.json tronqué
 * - CRUD du dashboard : insert (ID = max+1), update par ID, remove par ID,
 *   filter (recherche + OS + zone)
 *
 * UTILITÉ :
 * 🎯 Source de vérité du dashboard : une seule collection, un seul écrivain
 * 🎯 Compatibilité : relit tel quel les servers.json produits par l'ancien outil
 */

use crate::models::{RecordFilter, ServerForm, ServerRecord};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("server {0} not found")]
    NotFound(u32),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct RecordStore {
    path: PathBuf,
    records: Vec<ServerRecord>,
}

impl RecordStore {
    /// Ouvre le store sur un document servers.json. Politique volontaire de
    /// repli : tout échec de lecture ou de parsing donne une collection vide.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                // BOM toléré en lecture (fichiers édités sous Windows)
                let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
                match serde_json::from_str::<Vec<ServerRecord>>(raw) {
                    Ok(records) => {
                        info!("{} serveurs chargés depuis {}", records.len(), path.display());
                        records
                    }
                    Err(e) => {
                        warn!("{} illisible ({e}), démarrage à vide", path.display());
                        Vec::new()
                    }
                }
            }
            Err(_) => {
                info!("pas de {}, démarrage à vide", path.display());
                Vec::new()
            }
        };
        Self { path, records }
    }

    /// Persiste la collection entière. Écriture dans un fichier temporaire du
    /// même répertoire puis rename : atomique du point de vue du dashboard.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        // Indentation 4 espaces : format d'origine du fichier, sans BOM.
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.records.serialize(&mut ser)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("{} serveurs persistés dans {}", self.records.len(), self.path.display());
        Ok(())
    }

    pub fn records(&self) -> &[ServerRecord] {
        &self.records
    }

    pub fn get(&self, id: u32) -> Option<&ServerRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Prochain ID libre : max des IDs existants + 1, 1 sur collection vide.
    /// C'est la seule garantie d'unicité, comme dans le dashboard d'origine.
    pub fn next_id(&self) -> u32 {
        self.records.iter().map(|r| r.id).max().map_or(1, |m| m + 1)
    }

    /// Remplacement en bloc de la collection (canal save-servers du dashboard).
    /// Aucune validation d'unicité des IDs : le client est responsable.
    pub fn replace_all(&mut self, records: Vec<ServerRecord>) -> Result<usize, StoreError> {
        self.records = records;
        self.save()?;
        Ok(self.records.len())
    }

    pub fn insert(&mut self, form: ServerForm) -> Result<ServerRecord, StoreError> {
        let record = form.into_record(self.next_id());
        validate(&record)?;
        self.records.push(record.clone());
        self.save()?;
        info!("serveur {} ajouté (ID {})", record.name, record.id);
        Ok(record)
    }

    /// Remplace l'enregistrement en place, position dans la séquence conservée.
    pub fn update(&mut self, id: u32, form: ServerForm) -> Result<ServerRecord, StoreError> {
        let record = form.into_record(id);
        validate(&record)?;
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = record.clone();
        self.save()?;
        info!("serveur {} modifié (ID {id})", record.name);
        Ok(record)
    }

    pub fn remove(&mut self, id: u32) -> Result<ServerRecord, StoreError> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.records.remove(pos);
        self.save()?;
        info!("serveur {} supprimé (ID {id})", removed.name);
        Ok(removed)
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<ServerRecord> {
        self.records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

fn validate(record: &ServerRecord) -> Result<(), StoreError> {
    if record.name.is_empty()
        || record.ip.is_empty()
        || record.user.is_empty()
        || record.zone.is_empty()
    {
        return Err(StoreError::Invalid("all fields are required".into()));
    }
    if Ipv4Addr::from_str(&record.ip).is_err() {
        return Err(StoreError::Invalid(format!("invalid IPv4 address: {}", record.ip)));
    }
    Ok(())
}
