//! actix-web transport over the [`crate::game::Engine`] operations.

pub mod auth;
pub mod dashboard;
pub mod games;
pub mod health;
pub mod inventory;
pub mod map;
pub mod moves;
pub mod players;
pub mod routes;
