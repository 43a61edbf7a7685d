use actix_web::{web, HttpResponse, Responder};
use std::sync::atomic::Ordering;

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database_ok = match state.db.conn() {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Health check could not reach the database: {}", e);
            false
        }
    };

    let telegram_ok = state.telegram_running.load(Ordering::SeqCst);

    HttpResponse::Ok().json(serde_json::json!({
        "status": if database_ok && telegram_ok { "ok" } else { "degraded" },
        "database": database_ok,
        "telegram": telegram_ok,
        "version": VERSION,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "open_dialogs": state.notes.open_dialogs(),
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
