//! Game lifecycle: create / join / start / end.

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::CoreError, game::Engine, http::auth::JwtAuth};

#[derive(Deserialize)]
pub struct JoinReq {
    pub code: String,
}

#[derive(Deserialize)]
pub struct StartReq {
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub items: Option<u32>,
}

/// POST /api/games
#[post("/games")]
pub async fn create(auth: JwtAuth, engine: web::Data<Engine>) -> Result<HttpResponse, CoreError> {
    let out = engine.create_game(&auth.0).await?;
    Ok(HttpResponse::Created().json(out))
}

/// POST /api/games/join
#[post("/games/join")]
pub async fn join(
    auth: JwtAuth,
    info: web::Json<JoinReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let out = engine.join_game(&auth.0, &info.code).await?;
    Ok(HttpResponse::Ok().json(out))
}

/// POST /api/games/{id}/start
#[post("/games/{id}/start")]
pub async fn start(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    info: Option<web::Json<StartReq>>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let items = info.and_then(|b| b.into_inner().items);
    let out = engine.start_game(&auth.0, path.into_inner(), items).await?;
    Ok(HttpResponse::Ok().json(out))
}

/// POST /api/games/{id}/end
#[post("/games/{id}/end")]
pub async fn end(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let game = engine.end_game(&auth.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(game))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create)
        .service(join)
        .service(start)
        .service(end);
}
