//! Player rows: ensure / rename, and GM direct edits (placement, vitals).

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::CoreError,
    game::{types::VitalsUpdate, Engine},
    http::auth::JwtAuth,
};

#[derive(Deserialize)]
pub struct NameReq {
    pub name: String,
}

#[derive(Deserialize)]
pub struct PositionReq {
    pub row: i32,
    pub col: i32,
}

/// POST /api/players/ensure
#[post("/players/ensure")]
pub async fn ensure(auth: JwtAuth, engine: web::Data<Engine>) -> Result<HttpResponse, CoreError> {
    let player = engine.ensure_player(&auth.0).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// POST /api/players/name
#[post("/players/name")]
pub async fn set_name(
    auth: JwtAuth,
    info: web::Json<NameReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let player = engine.set_name(&auth.0, &info.name).await?;
    Ok(HttpResponse::Ok().json(player))
}

/// POST /api/games/{id}/players/{player_id}/position   (GM drag-and-drop)
#[post("/games/{id}/players/{player_id}/position")]
pub async fn force_move(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    info: web::Json<PositionReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    let player = engine
        .force_move(&auth.0, gid, pid, info.row, info.col)
        .await?;
    Ok(HttpResponse::Ok().json(player))
}

/// POST /api/games/{id}/players/{player_id}/vitals
#[post("/games/{id}/players/{player_id}/vitals")]
pub async fn set_vitals(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    info: web::Json<VitalsUpdate>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    let player = engine
        .set_vitals(&auth.0, gid, pid, info.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(player))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(ensure)
        .service(set_name)
        .service(force_move)
        .service(set_vitals);
}
