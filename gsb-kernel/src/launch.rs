/**
 * SESSION LAUNCHERS - Ouverture de sessions distantes via les outils de l'OS
 *
 * RÔLE :
 * Délégations fire-and-forget vers les clients natifs : mstsc pour RDP,
 * un terminal + ssh pour Linux, le navigateur par défaut pour le web.
 *
 * FONCTIONNEMENT :
 * - le succès signifie que le spawn a abouti, pas que la connexion distante
 *   est établie ; le processus enfant n'est pas suivi ensuite
 * - tout échec (plateforme sans RDP, binaire absent) est rendu comme valeur
 *   structurée {success:false, error}, jamais comme panique
 * - la commande du terminal SSH est un modèle configurable, jetons {user}
 *   et {ip} remplacés après découpage shell
 */

use crate::config::SessionConfig;
use crate::models::{ServerOs, ServerRecord};
use serde::Serialize;
use std::process::{Command, Stdio};
use tracing::{info, warn};
use uuid::Uuid;

/// Résultat d'un lancement, rendu tel quel au dashboard qui l'affiche en
/// notification transitoire.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub launch_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LaunchOutcome {
    fn launched() -> Self {
        Self {
            launch_id: Uuid::new_v4().to_string(),
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            launch_id: Uuid::new_v4().to_string(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Découpe le modèle de commande puis remplace {user}/{ip} jeton par jeton,
/// pour que les valeurs ne soient jamais réinterprétées par le découpage.
fn render_template(template: &str, user: &str, ip: &str) -> Result<Vec<String>, String> {
    let tokens =
        shell_words::split(template).map_err(|e| format!("invalid session template: {e}"))?;
    if tokens.is_empty() {
        return Err("empty session template".to_string());
    }
    Ok(tokens
        .into_iter()
        .map(|t| t.replace("{user}", user).replace("{ip}", ip))
        .collect())
}

/// Spawn détaché : le handle enfant est abandonné aussitôt, personne ne
/// suit la vie du processus lancé.
fn spawn_detached(program: &str, args: &[String]) -> LaunchOutcome {
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            let outcome = LaunchOutcome::launched();
            info!(
                "session {} lancée ({program}, pid {})",
                outcome.launch_id,
                child.id()
            );
            outcome
        }
        Err(e) => {
            warn!("échec lancement {program}: {e}");
            LaunchOutcome::failed(format!("failed to launch {program}: {e}"))
        }
    }
}

/// Session RDP via le client natif Windows. Refus structuré ailleurs.
pub fn open_rdp(ip: &str) -> LaunchOutcome {
    if cfg!(target_os = "windows") {
        spawn_detached("mstsc", &[format!("/v:{ip}")])
    } else {
        LaunchOutcome::failed("RDP sessions require a Windows host")
    }
}

/// Session SSH dans un terminal, commande issue de la configuration.
pub fn open_ssh(cfg: &SessionConfig, user: &str, ip: &str) -> LaunchOutcome {
    match render_template(&cfg.ssh_terminal, user, ip) {
        Ok(tokens) => spawn_detached(&tokens[0], &tokens[1..]),
        Err(e) => LaunchOutcome::failed(e),
    }
}

/// Interface web de l'hôte dans le navigateur par défaut.
pub fn open_web(ip: &str) -> LaunchOutcome {
    let url = format!("http://{ip}");
    if cfg!(target_os = "windows") {
        spawn_detached("cmd", &["/C".to_string(), "start".to_string(), url])
    } else if cfg!(target_os = "macos") {
        spawn_detached("open", &[url])
    } else {
        spawn_detached("xdg-open", &[url])
    }
}

/// Règle du dashboard : un serveur Windows se joint en RDP, un serveur
/// Linux en SSH avec l'utilisateur enregistré.
pub fn open_session(cfg: &SessionConfig, server: &ServerRecord) -> LaunchOutcome {
    match server.os {
        ServerOs::Windows => open_rdp(&server.ip),
        ServerOs::Linux => open_ssh(cfg, &server.user, &server.ip),
    }
}
