//! Session state machine: board, players, fog maps, loot and move requests.

pub mod board;
pub mod dashboard;
pub mod directory;
pub mod engine;
pub mod fog;
pub mod loot;
pub mod moves;
pub mod snapshot;
pub mod state;
pub mod types;

pub use engine::Engine;
