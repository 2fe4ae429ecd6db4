use actix_web::{get, web, HttpResponse};
use uuid::Uuid;

use crate::{error::CoreError, game::Engine, http::auth::JwtAuth};

/// GET /api/games/{id}/dashboard   (GM)
#[get("/games/{id}/dashboard")]
pub async fn dashboard(
    auth: JwtAuth,
    path: web::Path<Uuid>,
    engine: web::Data<Engine>,
) -> Result<HttpResponse, CoreError> {
    let dash = engine.build_dashboard(&auth.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(dash))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard);
}
