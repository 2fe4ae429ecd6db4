//! Private fog-of-war maps.

use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::CoreError,
    game::{types::TileState, Engine},
    http::auth::JwtAuth,
};

#[derive(Deserialize)]
pub struct TileReq {
    pub row: i32,
    pub col: i32,
    pub state: TileState,
}

/// POST /api/games/{id}/map/{player_id}/ensure
#[post("/games/{id}/map/{player_id}/ensure")]
pub async fn ensure_map(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    engine.ensure_player_map(&auth.0, gid, pid).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/games/{id}/map/{player_id}
#[get("/games/{id}/map/{player_id}")]
pub async fn tiles(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    let tiles = engine.get_tiles(&auth.0, gid, pid).await?;
    Ok(HttpResponse::Ok().json(tiles))
}

/// PUT /api/games/{id}/map/{player_id}
#[put("/games/{id}/map/{player_id}")]
pub async fn set_tile(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    info: web::Json<TileReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    let tile = engine
        .set_tile(&auth.0, gid, pid, info.row, info.col, info.state)
        .await?;
    Ok(HttpResponse::Ok().json(tile))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(ensure_map).service(tiles).service(set_tile);
}
