/**
 * GSB KERNEL - Point d'entrée du backend de gestion du parc
 *
 * RÔLE : Orchestration des modules : config, store, scan, sessions, HTTP.
 * Le dashboard (fenêtre, cartes, notifications) est un client externe de
 * cette API ; rien ici ne rend de l'interface.
 *
 * ARCHITECTURE : API REST locale + store JSON à écrivain unique + sondes
 * ICMP à la demande. Pas de tâche planifiée : tout part d'une action
 * utilisateur.
 */

mod config;
mod http;
mod launch;
mod models;
mod scan;
mod state;
mod store;
mod system;

use crate::config::load_config;
use crate::http::AppState;
use crate::state::{new_state, StatusMap};
use crate::store::RecordStore;

use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg = load_config().await;

    // store et statuts partagés
    let store = new_state(RecordStore::open(&cfg.data_file));
    let statuses = new_state(StatusMap::new());

    let identity = system::identify();
    info!(
        "gsb-kernel v{} sur {} ({})",
        identity.app_version, identity.platform, identity.os_version
    );

    let port = cfg.port;
    let app_state = AppState {
        store,
        statuses,
        cfg,
    };
    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app).await.context("serveur HTTP")?;
    Ok(())
}
