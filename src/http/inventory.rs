//! Inventory read-out (claimed loot per player).

use actix_web::{get, web, HttpResponse};
use uuid::Uuid;

use crate::{error::CoreError, game::Engine, http::auth::JwtAuth};

/// GET /api/games/{id}/inventory/{player_id}
#[get("/games/{id}/inventory/{player_id}")]
pub async fn get_inventory(
    auth: JwtAuth,
    path: web::Path<(Uuid, Uuid)>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let (gid, pid) = path.into_inner();
    let items = engine.list_inventory(&auth.0, gid, pid).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_inventory);
}
