//! Fog-of-war board game coordinator: a GM-run 8×8 session where players
//! see private maps and move only through GM-approved requests.

pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod metrics;
