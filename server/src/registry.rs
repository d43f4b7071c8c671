//! Process-wide table of open lobbies, keyed by their join code.

use crate::lobby::{Lobby, Presence};
use crate::utils::generate_lobby_id;
use log::{info, warn};
use rand::Rng;
use shared::Settings;
use std::collections::HashMap;
use thiserror::Error;

/// Fresh codes drawn before giving up on finding an unused one
pub const MAX_ID_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Could not allocate a lobby code")]
    IdSpaceExhausted,
}

#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: HashMap<String, Lobby>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a lobby led by the given player under a fresh, unused code.
    ///
    /// Missing or zero settings fall back to the defaults.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        leader_id: String,
        leader_name: String,
        presence: Presence,
        win_length: Option<u32>,
        max_players: Option<u32>,
    ) -> Result<&mut Lobby, RegistryError> {
        let id = self.unused_id(rng)?;

        let defaults = Settings::default();
        let settings = Settings {
            win_length: win_length.filter(|v| *v > 0).unwrap_or(defaults.win_length),
            max_players: max_players.filter(|v| *v > 0).unwrap_or(defaults.max_players),
        };

        info!(
            "Lobby {} created by {} (win length {}, max players {})",
            id, leader_id, settings.win_length, settings.max_players
        );
        let lobby = Lobby::new(id.clone(), leader_id, leader_name, presence, settings);
        Ok(self.lobbies.entry(id).or_insert(lobby))
    }

    fn unused_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, RegistryError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_lobby_id(rng);
            if !self.lobbies.contains_key(&id) {
                return Ok(id);
            }
        }
        warn!("No free lobby code after {} attempts", MAX_ID_ATTEMPTS);
        Err(RegistryError::IdSpaceExhausted)
    }

    /// Looks up a lobby by its code
    pub fn get(&self, id: &str) -> Option<&Lobby> {
        self.lobbies.get(id)
    }

    /// Mutable lookup by code
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(id)
    }

    /// Removes a lobby and its game, returning it if it existed
    pub fn delete(&mut self, id: &str) -> Option<Lobby> {
        let lobby = self.lobbies.remove(id)?;
        info!("Lobby {} closed", id);
        Some(lobby)
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}
