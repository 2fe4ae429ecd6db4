//! GM dashboard: read-only join of seats, profiles, objects and inventories.

use crate::{
    error::Result,
    game::{
        directory::PlayerDirectory,
        state::GameState,
        types::{Dashboard, Player, PlayerInventory},
    },
};

/// Builds the dashboard from a state the caller holds locked, so the
/// result is one consistent snapshot.
pub fn build(state: &GameState, directory: &PlayerDirectory) -> Result<Dashboard> {
    let seats = state.seats();

    let mut players = Vec::with_capacity(seats.len());
    for seat in &seats {
        let profile = directory.get(seat.player_id)?;
        players.push(Player::from_parts(&profile, Some(seat)));
    }

    let inventories = seats
        .iter()
        .map(|s| PlayerInventory {
            player_id: s.player_id,
            items: state.inventory(s.player_id),
        })
        .collect();

    Ok(Dashboard {
        game: state.game.clone(),
        players,
        objects: state.objects().to_vec(),
        inventories,
    })
}
