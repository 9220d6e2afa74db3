mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod store;
mod validation;

use config::ServerConfig;
use db::Db;
use ntex::web;
use ntex_cors::Cors;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[ntex::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let db = Db::open(&config.database_path, config.store_timeout).map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("Failed to open database: {}", e))
    })?;
    let db = Arc::new(db);
    let game = Arc::new(config.game.clone());

    info!(
        "North Hero server starting on {}:{} ({} levels, {} open at launch, {:?}/{:?})",
        config.host,
        config.port,
        game.total_levels,
        game.initially_unlocked,
        game.resubmission,
        game.accumulation
    );

    web::HttpServer::new(move || {
        web::App::new()
            .state(db.clone())
            .state(game.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            .route("/health", web::get().to(health))
            .route("/internal/launch", web::post().to(handlers::levels::initialize_launch))
            // Level unlocks
            .route("/levels/unlock-status", web::get().to(handlers::levels::get_unlock_status))
            .route("/levels/all-info", web::get().to(handlers::levels::get_all_levels_info))
            .route("/levels/{number}/unlocked", web::get().to(handlers::levels::is_level_unlocked))
            // Scores
            .route("/score/submit", web::post().to(handlers::score::submit_score))
            // Leaderboard
            .route("/leaderboard/top", web::get().to(handlers::leaderboard::get_top_players))
            .route(
                "/leaderboard/standing/{user_id}",
                web::get().to(handlers::leaderboard::get_player_standing),
            )
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
