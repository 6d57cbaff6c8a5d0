/**
 * API REST GSB - Surface HTTP locale du kernel
 *
 * RÔLE :
 * Ce module expose au dashboard les opérations du parc : inventaire CRUD,
 * sondes de connectivité, scan de plage et lancement de sessions. Chaque
 * ancien canal IPC du dashboard correspond à une route.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, routes /servers, /ping, /scan, /system, /health
 * - Sérialisation JSON automatique des réponses
 * - Échecs de persistance rendus en {ok:false, error} + code HTTP, jamais
 *   fatals au processus
 *
 * SÉCURITÉ :
 * - Header x-api-key exigé sur tout sauf /health quand GSB_API_KEY est
 *   définie ; poste mono-utilisateur sans clé = accès local libre
 */

use crate::config::KernelConfig;
use crate::launch::{self, LaunchOutcome};
use crate::models::{RecordFilter, ServerForm, ServerRecord};
use crate::scan;
use crate::state::{record_probe, Shared, StatusMap};
use crate::store::{RecordStore, StoreError};
use crate::system::{self, SystemIdentity};

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Shared<RecordStore>,
    pub statuses: Shared<StatusMap>,
    pub cfg: KernelConfig,
}

/// Enregistrement + dernier état de sonde connu, pour les cartes serveur.
#[derive(Debug, Serialize)]
pub struct ServerView {
    #[serde(flatten)]
    pub record: ServerRecord,
    pub online: Option<bool>,
    pub checked_at: Option<String>, // RFC3339
}

fn to_view(record: &ServerRecord, statuses: &StatusMap) -> ServerView {
    let status = record
        .ip
        .parse::<Ipv4Addr>()
        .ok()
        .and_then(|ip| statuses.get(&ip).copied());
    ServerView {
        record: record.clone(),
        online: status.map(|s| s.online),
        checked_at: status.and_then(|s| s.checked_at.format(&Rfc3339).ok()),
    }
}

async fn require_api_key(req: Request, next: Next) -> Result<Response, StatusCode> {
    // Health check toujours accessible
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let expected = std::env::var("GSB_API_KEY").unwrap_or_default();
    if expected.is_empty() {
        // Poste mono-utilisateur sans clé configurée : accès local libre.
        return Ok(next.run(req).await);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        warn!("requête refusée sur {} : x-api-key absente ou invalide", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system", get(get_system))
        .route(
            "/servers",
            get(list_servers).post(create_server).put(replace_servers),
        )
        .route(
            "/servers/{id}",
            get(get_server).put(update_server).delete(delete_server),
        )
        .route("/servers/{id}/session", post(open_session))
        .route("/servers/{id}/web", post(open_web))
        .route("/ping", post(ping_host))
        .route("/scan", post(scan_network))
        .with_state(app_state)
        .layer(middleware::from_fn(require_api_key))
}

fn store_failure(e: StoreError) -> (StatusCode, Json<serde_json::Value>) {
    let code = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(serde_json::json!({ "ok": false, "error": e.to_string() })))
}

// GET /system (identification de l'hôte, affichage seulement)
async fn get_system() -> Json<SystemIdentity> {
    Json(system::identify())
}

// GET /servers (liste filtrée selon la barre de recherche)
async fn list_servers(
    State(app): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Json<Vec<ServerView>> {
    let store = app.store.lock();
    let statuses = app.statuses.lock();
    let list = store
        .filter(&filter)
        .iter()
        .map(|r| to_view(r, &statuses))
        .collect();
    Json(list)
}

// GET /servers/:id (détail)
async fn get_server(
    State(app): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ServerView>, StatusCode> {
    let store = app.store.lock();
    let statuses = app.statuses.lock();
    let Some(record) = store.get(id) else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(to_view(record, &statuses)))
}

// POST /servers (ajout, ID attribué par le store)
async fn create_server(
    State(app): State<AppState>,
    Json(form): Json<ServerForm>,
) -> Result<(StatusCode, Json<ServerRecord>), (StatusCode, Json<serde_json::Value>)> {
    match app.store.lock().insert(form) {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => Err(store_failure(e)),
    }
}

// PUT /servers/:id (modification en place)
async fn update_server(
    State(app): State<AppState>,
    Path(id): Path<u32>,
    Json(form): Json<ServerForm>,
) -> Result<Json<ServerRecord>, (StatusCode, Json<serde_json::Value>)> {
    match app.store.lock().update(id, form) {
        Ok(record) => Ok(Json(record)),
        Err(e) => Err(store_failure(e)),
    }
}

// DELETE /servers/:id
async fn delete_server(
    State(app): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match app.store.lock().remove(id) {
        Ok(removed) => Ok(Json(serde_json::json!({ "ok": true, "removed": removed.id }))),
        Err(e) => Err(store_failure(e)),
    }
}

// PUT /servers (remplacement en bloc, canal save-servers du dashboard)
async fn replace_servers(
    State(app): State<AppState>,
    Json(records): Json<Vec<ServerRecord>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match app.store.lock().replace_all(records) {
        Ok(count) => Ok(Json(serde_json::json!({ "ok": true, "count": count }))),
        Err(e) => Err(store_failure(e)),
    }
}

#[derive(Debug, Deserialize)]
struct PingParams {
    ip: Ipv4Addr,
}

#[derive(Debug, Serialize)]
struct PingReport {
    online: bool,
}

// POST /ping (sonde unitaire, résultat mémorisé pour les vues)
async fn ping_host(
    State(app): State<AppState>,
    Json(params): Json<PingParams>,
) -> Json<PingReport> {
    let online = scan::probe_host(params.ip, app.cfg.scan.ping_timeout_ms).await;
    record_probe(&app.statuses, params.ip, online);
    Json(PingReport { online })
}

#[derive(Debug, Deserialize)]
struct ScanParams {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

// POST /scan (scan de plage par lots)
async fn scan_network(
    State(app): State<AppState>,
    Json(params): Json<ScanParams>,
) -> Json<Vec<scan::ScanHit>> {
    let hits = scan::scan_range(params.start, params.end, &app.cfg.scan, &app.statuses).await;
    Json(hits)
}

// POST /servers/:id/session (RDP ou SSH selon l'OS du serveur)
async fn open_session(
    State(app): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<LaunchOutcome>, StatusCode> {
    let server = app.store.lock().get(id).cloned();
    let Some(server) = server else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(launch::open_session(&app.cfg.session, &server)))
}

// POST /servers/:id/web (interface web dans le navigateur)
async fn open_web(
    State(app): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<LaunchOutcome>, StatusCode> {
    let server = app.store.lock().get(id).cloned();
    let Some(server) = server else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(launch::open_web(&server.ip)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServerOs;
    use crate::state::ProbeStatus;
    use time::OffsetDateTime;

    fn record() -> ServerRecord {
        ServerRecord {
            id: 1,
            name: "SRV-AD".to_string(),
            ip: "192.168.10.2".to_string(),
            user: "administrateur".to_string(),
            zone: "VLAN_SERVEURS".to_string(),
            os: ServerOs::Windows,
            color: "White".to_string(),
        }
    }

    #[test]
    fn test_to_view_joins_last_probe_status() {
        let mut statuses = StatusMap::new();
        statuses.insert(
            "192.168.10.2".parse().unwrap(),
            ProbeStatus {
                online: true,
                checked_at: OffsetDateTime::now_utc(),
            },
        );

        let view = to_view(&record(), &statuses);
        assert_eq!(view.online, Some(true));
        assert!(view.checked_at.is_some());

        let value = serde_json::to_value(&view).unwrap();
        // l'enregistrement est aplati avec ses clés historiques
        assert_eq!(value["ID"], 1);
        assert_eq!(value["online"], true);
    }

    #[test]
    fn test_to_view_without_probe_is_unknown() {
        let view = to_view(&record(), &StatusMap::new());
        assert_eq!(view.online, None);
        assert!(view.checked_at.is_none());
    }

    #[test]
    fn test_store_failure_maps_http_codes() {
        let (code, _) = store_failure(StoreError::NotFound(7));
        assert_eq!(code, StatusCode::NOT_FOUND);
        let (code, body) = store_failure(StoreError::Invalid("bad ip".into()));
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.0["ok"], false);
    }
}
