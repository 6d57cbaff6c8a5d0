/**
 * LIVENESS SCANNER - Sondes ICMP via l'utilitaire ping de l'OS
 *
 * RÔLE :
 * Classe les hôtes du parc en ligne / hors ligne. Une sonde = un seul echo
 * ICMP avec timeout court, délégué au binaire ping de la plateforme.
 *
 * FONCTIONNEMENT :
 * - probe_host : un sous-processus ping, exit 0 = en ligne, tout le reste
 *   (exit non nul, binaire absent) = hors ligne, jamais une erreur
 * - expand_range : expansion du dernier octet si les trois premiers sont
 *   égaux, sinon repli volontaire sur les deux bornes
 * - scan_range : lots de taille fixe, parallélisme total dans le lot,
 *   barrière stricte entre les lots pour borner les processus simultanés
 */

use crate::config::ScanConfig;
use crate::state::{record_probe, Shared, StatusMap};
use futures::future::join_all;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 1000;

/// Hôte ayant répondu lors d'un scan. Les hôtes muets sont omis du
/// résultat, le statut vaut donc toujours "online".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanHit {
    pub ip: String,
    pub status: ScanStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Online,
}

/// Invocation ping de la plateforme : un seul echo, timeout court.
/// Windows : -n <count> -w <ms> ; ailleurs : -c <count> -W <s>.
fn ping_invocation(ip: Ipv4Addr, timeout_ms: u64) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "windows") {
        (
            "ping",
            vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout_ms.to_string(),
                ip.to_string(),
            ],
        )
    } else {
        let secs = (timeout_ms / 1000).max(1);
        (
            "ping",
            vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                secs.to_string(),
                ip.to_string(),
            ],
        )
    }
}

/// Une sonde = un sous-processus ping. L'échec de connectivité est un
/// résultat normal (false), pas un chemin d'erreur.
pub async fn probe_host(ip: Ipv4Addr, timeout_ms: u64) -> bool {
    let (program, args) = ping_invocation(ip, timeout_ms);
    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    matches!(status, Ok(s) if s.success())
}

/// Expansion d'une plage d'adresses. Même réseau /24 (trois premiers octets
/// égaux) : tous les derniers octets de start à end inclus. Sinon, repli
/// assumé sur les deux bornes seules — pas de parcours CIDR général.
pub fn expand_range(start: Ipv4Addr, end: Ipv4Addr) -> Vec<Ipv4Addr> {
    let s = start.octets();
    let e = end.octets();
    if s[..3] == e[..3] {
        (s[3]..=e[3])
            .map(|last| Ipv4Addr::new(s[0], s[1], s[2], last))
            .collect()
    } else {
        vec![start, end]
    }
}

/// Scanne la plage par lots : chaque lot est sondé en parallèle puis joint
/// avant de lancer le suivant. L'ordre du résultat suit l'ordre des lots et,
/// dans un lot, l'ordre des adresses en entrée. Pas d'annulation : un scan
/// lancé va au bout.
pub async fn scan_range(
    start: Ipv4Addr,
    end: Ipv4Addr,
    cfg: &ScanConfig,
    statuses: &Shared<StatusMap>,
) -> Vec<ScanHit> {
    let ips = expand_range(start, end);
    info!("scan de {start} à {end} : {} adresses", ips.len());

    let batch_size = cfg.batch_size.max(1);
    let mut hits = Vec::new();

    for batch in ips.chunks(batch_size) {
        let probes = batch.iter().map(|&ip| probe_host(ip, cfg.ping_timeout_ms));
        let outcomes = join_all(probes).await;

        for (&ip, online) in batch.iter().zip(outcomes) {
            record_probe(statuses, ip, online);
            if online {
                hits.push(ScanHit {
                    ip: ip.to_string(),
                    status: ScanStatus::Online,
                });
            }
        }
    }

    info!("scan terminé : {}/{} en ligne", hits.len(), ips.len());
    hits
}
