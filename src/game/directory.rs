//! Player Directory: one profile per identity, plus its game binding.
//!
//! Each profile is mutated through its own DashMap entry, so writes to one
//! player never contend with another's.

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    game::types::{Caller, Profile},
};

#[derive(Debug, Default)]
pub struct PlayerDirectory {
    profiles: DashMap<Uuid, Profile>,
    by_identity: DashMap<String, Uuid>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the caller's profile, creating it on first sight.
    /// Concurrent calls for one identity converge on a single row.
    pub fn ensure(&self, caller: &Caller) -> Result<Profile> {
        let identity = caller.identity.trim();
        if identity.is_empty() {
            return Err(CoreError::Validation("empty identity".into()));
        }

        let id = *self
            .by_identity
            .entry(identity.to_owned())
            .or_insert_with(|| {
                let profile = Profile {
                    id: Uuid::new_v4(),
                    identity_ref: identity.to_owned(),
                    name: String::new(),
                    game_id: None,
                    is_gm: false,
                    created_at: Utc::now(),
                };
                let id = profile.id;
                self.profiles.insert(id, profile);
                log::info!("player {id} created for identity {identity}");
                id
            });

        self.get(id)
    }

    pub fn get(&self, id: Uuid) -> Result<Profile> {
        self.profiles
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(CoreError::PlayerNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Sets the display name once. A second call fails with `NameLocked`
    /// and leaves the stored name untouched.
    pub fn set_name(&self, id: Uuid, name: &str) -> Result<Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("name must not be empty".into()));
        }

        let mut entry = self
            .profiles
            .get_mut(&id)
            .ok_or(CoreError::PlayerNotFound(id))?;
        if !entry.name.is_empty() {
            return Err(CoreError::NameLocked);
        }
        entry.name = name.to_owned();
        Ok(entry.clone())
    }

    /// Binds a player to `game_id` and returns the game they were bound to
    /// before, if it was a different one. `may_leave` vets that previous
    /// game while the entry is held, so two binds of one player serialise.
    pub fn bind<F>(
        &self,
        id: Uuid,
        game_id: Uuid,
        is_gm: bool,
        may_leave: F,
    ) -> Result<Option<Uuid>>
    where
        F: FnOnce(Uuid) -> Result<()>,
    {
        let mut entry = self
            .profiles
            .get_mut(&id)
            .ok_or(CoreError::PlayerNotFound(id))?;
        let previous = entry.game_id.filter(|g| *g != game_id);
        if let Some(old) = previous {
            may_leave(old)?;
        }
        entry.game_id = Some(game_id);
        entry.is_gm = is_gm;
        Ok(previous)
    }

    /// Re-inserts a profile loaded from a snapshot. Existing rows win.
    pub fn restore(&self, profile: Profile) {
        self.by_identity
            .entry(profile.identity_ref.clone())
            .or_insert(profile.id);
        self.profiles.entry(profile.id).or_insert(profile);
    }
}
