use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use teloxide::Bot;

mod channels;
mod config;
mod controllers;
mod db;
mod errors;
mod models;
mod notes;

use channels::{telegram, NotesDispatcher};
use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub notes: Arc<NotesDispatcher>,
    /// Server start time for uptime calculation
    pub started_at: std::time::Instant,
    /// Cleared when the Telegram dispatcher stops
    pub telegram_running: Arc<AtomicBool>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!("Loaded config: {:?}", config);

    config.ensure_database_dir()?;
    log::info!("Initializing database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let notes = Arc::new(NotesDispatcher::new(db.clone(), config.page_size));

    let bot = Bot::new(config.telegram_bot_token.clone());
    telegram::register_commands(&bot).await;

    let mut bot_dispatcher = telegram::build_dispatcher(bot, notes.clone());
    let bot_shutdown = bot_dispatcher.shutdown_token();
    let telegram_running = Arc::new(AtomicBool::new(true));
    let bot_running = telegram_running.clone();
    let mut bot_task = tokio::spawn(async move {
        log::info!("[TELEGRAM] Polling for updates");
        bot_dispatcher.dispatch().await;
        bot_running.store(false, Ordering::SeqCst);
        log::info!("[TELEGRAM] Dispatcher stopped");
    });

    let port = config.port;
    let started_at = std::time::Instant::now();
    let server_db = db.clone();
    let server_notes = notes.clone();
    let server_telegram = telegram_running.clone();

    log::info!("Health endpoint listening on 0.0.0.0:{}", port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&server_db),
                notes: Arc::clone(&server_notes),
                started_at,
                telegram_running: Arc::clone(&server_telegram),
            }))
            .wrap(Logger::default())
            .configure(controllers::health::config_routes)
    })
    .bind(("0.0.0.0", port))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let ctrl_c_handle = server_handle.clone();

    // Spawn Ctrl+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");
        log::info!("Stopping HTTP server...");
        ctrl_c_handle.stop(true).await;
    });

    tokio::pin!(server);
    let served = tokio::select! {
        served = &mut server => served,
        joined = &mut bot_task => {
            telegram_running.store(false, Ordering::SeqCst);
            match joined {
                Ok(()) => log::error!("[TELEGRAM] Dispatcher exited, stopping HTTP server"),
                Err(e) => log::error!("[TELEGRAM] Dispatcher task failed: {}, stopping HTTP server", e),
            }
            server_handle.stop(true).await;
            server.await?;
            return Err(std::io::Error::other("telegram dispatcher stopped"));
        }
    };

    // Stop polling Telegram once the HTTP side is gone, for whatever reason.
    match bot_shutdown.shutdown() {
        Ok(stopping) => {
            if tokio::time::timeout(std::time::Duration::from_secs(5), stopping)
                .await
                .is_err()
            {
                log::warn!("Timeout waiting for Telegram dispatcher to stop, forcing exit...");
                bot_task.abort();
            }
        }
        Err(_) => {
            log::debug!("Telegram dispatcher was not running");
            bot_task.abort();
        }
    }
    if let Err(e) = bot_task.await {
        if !e.is_cancelled() {
            log::error!("Telegram dispatcher task failed: {}", e);
        }
    }

    log::info!("Shutdown complete");
    served
}
