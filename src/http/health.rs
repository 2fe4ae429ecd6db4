//! Simple liveness / readiness check

use actix_web::{get, web, HttpResponse, Responder};

use crate::game::Engine;

#[get("/healthz")]
pub async fn healthz(engine: web::Data<Engine>) -> impl Responder {
    // Check Redis only when snapshots are enabled
    if let Some(store) = engine.snapshot_store() {
        if !store.ping().await {
            return HttpResponse::ServiceUnavailable().body("redis");
        }
    }

    HttpResponse::Ok().body("ok")
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
