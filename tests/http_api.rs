use actix_web::{http::StatusCode, test, web, App};
use fogwar_server::{
    config::Settings,
    game::Engine,
    http::{
        self,
        auth::{AuthKeys, Claims},
    },
};
use serde_json::{json, Value};

const SECRET: &str = "test-secret";

fn token(sub: &str, gm: bool) -> String {
    let claims = Claims {
        sub: sub.into(),
        gm,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    AuthKeys::new(SECRET).issue(&claims).unwrap()
}

fn bearer(sub: &str, gm: bool) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(sub, gm)))
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Engine::new(Settings::default())))
                .app_data(web::Data::new(AuthKeys::new(SECRET)))
                .configure(http::routes::init_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn health_is_public() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/healthz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/players/ensure")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/players/ensure")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn players_cannot_create_games() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer("alice", false))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "not_authorized");
    assert_eq!(body["error"]["code"], "NOT_AUTHORIZED");
}

#[actix_web::test]
async fn full_round_over_http() {
    let app = app!();

    // GM opens a table
    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer("gm", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let game_id = created["game_id"].as_str().unwrap().to_owned();
    let code = created["join_code"].as_str().unwrap().to_lowercase();

    // player names themselves and joins with a lower-cased code
    let req = test::TestRequest::post()
        .uri("/api/players/name")
        .insert_header(bearer("alice", false))
        .set_json(json!({ "name": "Alice" }))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["name"], "Alice");
    let alice_id = me["id"].as_str().unwrap().to_owned();

    let req = test::TestRequest::post()
        .uri("/api/games/join")
        .insert_header(bearer("alice", false))
        .set_json(json!({ "code": code }))
        .to_request();
    let joined: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(joined["game_id"], game_id.as_str());

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/start"))
        .insert_header(bearer("gm", true))
        .set_json(json!({ "items": 0 }))
        .to_request();
    let summary: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(summary["players_count"], 1);
    assert_eq!(summary["objects_count"], 0);

    // GM drops the player on (1, 1)
    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/players/{alice_id}/position"))
        .insert_header(bearer("gm", true))
        .set_json(json!({ "row": 1, "col": 1 }))
        .to_request();
    let placed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!((placed["row"].clone(), placed["col"].clone()), (json!(1), json!(1)));

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/moves"))
        .insert_header(bearer("alice", false))
        .set_json(json!({ "to_row": 3, "to_col": 4 }))
        .to_request();
    let mv: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mv["status"], "pending");
    let request_id = mv["id"].as_str().unwrap().to_owned();

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/moves/pending"))
        .insert_header(bearer("gm", true))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["player_name"], "Alice");

    let req = test::TestRequest::post()
        .uri(&format!("/api/moves/{request_id}/resolve"))
        .insert_header(bearer("gm", true))
        .set_json(json!({ "action": "approved" }))
        .to_request();
    let resolved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resolved["status"], "approved");

    // resolving again is a conflict
    let req = test::TestRequest::post()
        .uri(&format!("/api/moves/{request_id}/resolve"))
        .insert_header(bearer("gm", true))
        .set_json(json!({ "action": "rejected" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/moves/apply"))
        .insert_header(bearer("gm", true))
        .to_request();
    let applied: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(applied["applied"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/moves/mine"))
        .insert_header(bearer("alice", false))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine["status"], "applied");

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/dashboard"))
        .insert_header(bearer("gm", true))
        .to_request();
    let dash: Value = test::call_and_read_body_json(&app, req).await;
    let alice = dash["players"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == alice_id.as_str())
        .unwrap();
    assert_eq!((alice["row"].clone(), alice["col"].clone()), (json!(3), json!(4)));
}

#[actix_web::test]
async fn map_routes_enforce_privacy() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer("gm", true))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let game_id = created["game_id"].as_str().unwrap().to_owned();
    let code = created["join_code"].as_str().unwrap().to_owned();

    let mut ids = Vec::new();
    for who in ["alice", "bob"] {
        let req = test::TestRequest::post()
            .uri("/api/games/join")
            .insert_header(bearer(who, false))
            .set_json(json!({ "code": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/players/ensure")
            .insert_header(bearer(who, false))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(me["id"].as_str().unwrap().to_owned());
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/map/{}", ids[0]))
        .insert_header(bearer("alice", false))
        .to_request();
    let tiles: Value = test::call_and_read_body_json(&app, req).await;
    let tiles = tiles.as_array().unwrap();
    assert_eq!(tiles.len(), 64);
    assert!(tiles.iter().all(|t| t["state"] == "unknown"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/map/{}", ids[0]))
        .insert_header(bearer("bob", false))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/games/{game_id}/map/{}", ids[1]))
        .insert_header(bearer("bob", false))
        .set_json(json!({ "row": 2, "col": 2, "state": "blocked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game_id}/inventory/{}", ids[1]))
        .insert_header(bearer("bob", false))
        .to_request();
    let inv: Value = test::call_and_read_body_json(&app, req).await;
    assert!(inv.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn out_of_bounds_move_is_a_bad_request() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer("gm", true))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let game_id = created["game_id"].as_str().unwrap().to_owned();

    let req = test::TestRequest::post()
        .uri("/api/games/join")
        .insert_header(bearer("alice", false))
        .set_json(json!({ "code": created["join_code"] }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/start"))
        .insert_header(bearer("gm", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/api/games/{game_id}/moves"))
        .insert_header(bearer("alice", false))
        .set_json(json!({ "to_row": 0, "to_col": 9 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "out_of_bounds");
}
