use actix_web::{middleware::Logger, web, App, HttpServer};
use fogwar_server::{
    config,
    game::{snapshot::SnapshotStore, Engine},
    http::{self, auth::AuthKeys},
    metrics,
};
use redis::Client as RedisClient;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let settings = config::settings().clone();
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    let mut engine = Engine::new(settings.clone());

    // Redis snapshots are optional
    if let Ok(redis_url) = env::var("REDIS_URL") {
        let redis_client = RedisClient::open(redis_url.as_str()).expect("Invalid REDIS_URL");
        let store = SnapshotStore::new(redis_client, settings.snapshot_ttl);
        match store.load_all().await {
            Ok(snaps) => {
                for snap in snaps {
                    engine.restore(snap);
                }
                log::info!("restored {} games from redis", engine.game_count());
            }
            Err(e) => log::warn!("snapshot restore skipped: {e:?}"),
        }
        engine = engine.with_snapshots(store);
    } else {
        log::info!("REDIS_URL not set; games live in memory only");
    }

    let engine = web::Data::new(engine);
    let keys = web::Data::new(AuthKeys::new(jwt_secret));

    log::info!("listening on {server_addr}");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(engine.clone())
            .app_data(keys.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
