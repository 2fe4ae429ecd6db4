//! Move requests: player submission, GM review and bulk apply.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::CoreError,
    game::{types::Resolution, Engine},
    http::auth::JwtAuth,
};

#[derive(Deserialize)]
pub struct MoveReq {
    pub to_row: i32,
    pub to_col: i32,
}

#[derive(Deserialize)]
pub struct ResolveReq {
    pub action: Resolution,
}

#[derive(Serialize)]
pub struct Applied {
    pub applied: usize,
}

/// POST /api/games/{id}/moves
#[post("/games/{id}/moves")]
pub async fn request_move(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    info: web::Json<MoveReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let req = engine
        .request_move(&auth.0, path.into_inner(), info.to_row, info.to_col)
        .await?;
    Ok(HttpResponse::Ok().json(req))
}

/// GET /api/games/{id}/moves/mine
#[get("/games/{id}/moves/mine")]
pub async fn mine(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let latest = engine.my_move(&auth.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(latest))
}

/// GET /api/games/{id}/moves/pending   (GM)
#[get("/games/{id}/moves/pending")]
pub async fn pending(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let rows = engine.list_pending(&auth.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/moves/{request_id}/resolve   (GM)
#[post("/moves/{request_id}/resolve")]
pub async fn resolve(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    info: web::Json<ResolveReq>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let req = engine
        .resolve(&auth.0, path.into_inner(), info.action)
        .await?;
    Ok(HttpResponse::Ok().json(req))
}

/// POST /api/games/{id}/moves/apply   (GM)
#[post("/games/{id}/moves/apply")]
pub async fn apply(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let applied = engine.apply_approved(&auth.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Applied { applied }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(request_move)
        .service(mine)
        .service(pending)
        .service(resolve)
        .service(apply);
}
