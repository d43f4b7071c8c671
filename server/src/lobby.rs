//! Lobby membership, settings and leadership.
//!
//! A lobby owns its players, its spectators and at most one game. Every
//! operation returns a `Result` whose error is a [`LobbyError`]; nothing
//! here panics on bad client input and nothing here talks to the network.
//!
//! Membership (is this identity part of the lobby) is kept apart from
//! reachability (is there a live connection to it). A member's
//! [`Presence`] only tracks the latter, so a player who drops mid-game
//! keeps their seat and their turn slot.

use crate::client_manager::ConnectionId;
use crate::game::{Game, GameError};
use log::debug;
use rand::Rng;
use shared::{GamePlayer, LobbySnapshot, PlayerInfo, Settings, SpectatorInfo};
use thiserror::Error;

pub const MIN_PLAYERS_TO_START: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("Lobby is full")]
    LobbyFull,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Spectator not found")]
    SpectatorNotFound,
    #[error("Already in this lobby")]
    AlreadyMember,
    #[error("Symbol already taken")]
    SymbolTaken,
    #[error("Please select a symbol first")]
    NoSymbolSelected,
    #[error("Cannot set max players to {requested}. There are already {current} players in the lobby.")]
    MaxPlayersBelowCurrentCount { requested: u32, current: u32 },
    #[error("Cannot become spectator as the only player")]
    SoleLeaderCannotSpectate,
    #[error("Need at least 2 players")]
    NotEnoughPlayers,
    #[error("All players must select a symbol and be ready")]
    PlayersNotReady,
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Whether a member currently has a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Connected(ConnectionId),
    /// Seat kept for a player who dropped during an active game
    Disconnected,
}

impl Presence {
    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            Presence::Connected(conn) => Some(*conn),
            Presence::Disconnected => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LobbyPlayer {
    pub id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub ready: bool,
    pub presence: Presence,
}

impl LobbyPlayer {
    fn new(id: String, name: String, presence: Presence) -> Self {
        Self {
            id,
            name,
            symbol: None,
            ready: false,
            presence,
        }
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            ready: self.ready,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spectator {
    pub id: String,
    pub name: String,
    pub presence: Presence,
}

impl Spectator {
    pub fn info(&self) -> SpectatorInfo {
        SpectatorInfo {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Lobby {
    id: String,
    leader: Option<String>,
    players: Vec<LobbyPlayer>,
    spectators: Vec<Spectator>,
    settings: Settings,
    game: Option<Game>,
}

impl Lobby {
    /// Creates a lobby whose only member is its leader
    pub fn new(
        id: String,
        leader_id: String,
        leader_name: String,
        presence: Presence,
        settings: Settings,
    ) -> Self {
        Self {
            id,
            leader: Some(leader_id.clone()),
            players: vec![LobbyPlayer::new(leader_id, leader_name, presence)],
            spectators: Vec::new(),
            settings,
            game: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub fn is_leader(&self, id: &str) -> bool {
        self.leader.as_deref() == Some(id)
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn players(&self) -> &[LobbyPlayer] {
        &self.players
    }

    pub fn spectators(&self) -> &[Spectator] {
        &self.spectators
    }

    pub fn player(&self, id: &str) -> Option<&LobbyPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn spectator(&self, id: &str) -> Option<&Spectator> {
        self.spectators.iter().find(|s| s.id == id)
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.player(id).is_some() || self.spectator(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        self.game.as_mut()
    }

    /// True while a game exists and nobody has won it yet
    pub fn has_active_game(&self) -> bool {
        self.game.as_ref().is_some_and(|g| !g.is_finished())
    }

    /// Checks whether `id` could take a player seat without changing anything
    pub fn can_add_player(&self, id: &str) -> Result<(), LobbyError> {
        if self.players.len() >= self.settings.max_players as usize {
            return Err(LobbyError::LobbyFull);
        }
        if self.is_member(id) {
            return Err(LobbyError::AlreadyMember);
        }
        Ok(())
    }

    /// Seats a new player, making them leader if the lobby has none.
    ///
    /// Fails when the lobby is at its player limit or `id` is already a member.
    pub fn add_player(
        &mut self,
        id: String,
        name: String,
        presence: Presence,
    ) -> Result<&LobbyPlayer, LobbyError> {
        self.can_add_player(&id)?;

        if self.leader.is_none() {
            self.leader = Some(id.clone());
        }
        self.players.push(LobbyPlayer::new(id, name, presence));
        Ok(&self.players[self.players.len() - 1])
    }

    /// Spectators are never capped
    pub fn add_spectator(
        &mut self,
        id: String,
        name: String,
        presence: Presence,
    ) -> Result<&Spectator, LobbyError> {
        if self.is_member(&id) {
            return Err(LobbyError::AlreadyMember);
        }

        self.spectators.push(Spectator { id, name, presence });
        Ok(&self.spectators[self.spectators.len() - 1])
    }

    /// Removes a player, handing leadership to the first remaining player
    /// if needed. Returns false if there was no such player.
    pub fn remove_player(&mut self, id: &str) -> bool {
        let Some(index) = self.players.iter().position(|p| p.id == id) else {
            return false;
        };
        self.players.remove(index);

        if self.is_leader(id) {
            self.leader = self.players.first().map(|p| p.id.clone());
            debug!("Lobby {}: leadership passed to {:?}", self.id, self.leader);
        }
        true
    }

    /// Removes a spectator. Returns false if there was no such spectator.
    pub fn remove_spectator(&mut self, id: &str) -> bool {
        let before = self.spectators.len();
        self.spectators.retain(|s| s.id != id);
        self.spectators.len() != before
    }

    /// Claims `symbol` for a player; re-claiming one's own symbol is allowed.
    /// Any claim clears the player's ready flag.
    pub fn claim_symbol(&mut self, player_id: &str, symbol: &str) -> Result<&LobbyPlayer, LobbyError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(LobbyError::PlayerNotFound)?;

        let taken = self
            .players
            .iter()
            .any(|p| p.id != player_id && p.symbol.as_deref() == Some(symbol));
        if taken {
            return Err(LobbyError::SymbolTaken);
        }

        let player = &mut self.players[index];
        player.symbol = Some(symbol.to_string());
        player.ready = false;
        Ok(player)
    }

    /// Flips a player's ready flag and returns the new value
    pub fn toggle_ready(&mut self, player_id: &str) -> Result<bool, LobbyError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(LobbyError::PlayerNotFound)?;

        if player.symbol.is_none() {
            return Err(LobbyError::NoSymbolSelected);
        }

        player.ready = !player.ready;
        Ok(player.ready)
    }

    /// Applies the provided fields; zero counts as not provided.
    ///
    /// Validation happens before anything is written, so a rejected update
    /// leaves the settings exactly as they were.
    pub fn update_settings(
        &mut self,
        win_length: Option<u32>,
        max_players: Option<u32>,
    ) -> Result<Settings, LobbyError> {
        let win_length = win_length.filter(|v| *v > 0);
        let max_players = max_players.filter(|v| *v > 0);

        if let Some(requested) = max_players {
            let current = self.players.len() as u32;
            if requested < current {
                return Err(LobbyError::MaxPlayersBelowCurrentCount { requested, current });
            }
        }

        if let Some(win_length) = win_length {
            self.settings.win_length = win_length;
        }
        if let Some(max_players) = max_players {
            self.settings.max_players = max_players;
        }
        Ok(self.settings)
    }

    /// Moves a player to the spectators, dropping symbol and ready state.
    ///
    /// A leader with company hands leadership to the first other player
    /// before moving. Returns the leader after the switch.
    pub fn switch_player_to_spectator(&mut self, id: &str) -> Result<Option<String>, LobbyError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(LobbyError::PlayerNotFound)?;

        if self.is_leader(id) && self.players.len() == 1 {
            return Err(LobbyError::SoleLeaderCannotSpectate);
        }

        let player = self.players.remove(index);
        if self.is_leader(id) {
            self.leader = self.players.first().map(|p| p.id.clone());
        }

        self.spectators.push(Spectator {
            id: player.id,
            name: player.name,
            presence: player.presence,
        });
        Ok(self.leader.clone())
    }

    /// Moves a spectator into the next free player seat.
    ///
    /// The newcomer starts without a symbol and not ready. If the lobby has no
    /// leader they become it.
    pub fn switch_spectator_to_player(&mut self, id: &str) -> Result<&LobbyPlayer, LobbyError> {
        if self.players.len() >= self.settings.max_players as usize {
            return Err(LobbyError::LobbyFull);
        }

        let index = self
            .spectators
            .iter()
            .position(|s| s.id == id)
            .ok_or(LobbyError::SpectatorNotFound)?;

        let spectator = self.spectators.remove(index);
        if self.leader.is_none() {
            self.leader = Some(spectator.id.clone());
        }

        self.players.push(LobbyPlayer::new(
            spectator.id,
            spectator.name,
            spectator.presence,
        ));
        Ok(&self.players[self.players.len() - 1])
    }

    /// Checks that at least two players are seated and that every one of
    /// them has a symbol and is ready.
    pub fn can_start_game(&self) -> Result<(), LobbyError> {
        if self.players.len() < MIN_PLAYERS_TO_START {
            return Err(LobbyError::NotEnoughPlayers);
        }
        if !self.players.iter().all(|p| p.ready && p.symbol.is_some()) {
            return Err(LobbyError::PlayersNotReady);
        }
        Ok(())
    }

    /// Starts a new game from the current players, replacing any previous one
    pub fn start_game<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Game, LobbyError> {
        self.can_start_game()?;

        let players: Vec<GamePlayer> = self
            .players
            .iter()
            .filter_map(|p| {
                p.symbol.as_ref().map(|symbol| GamePlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    symbol: symbol.clone(),
                })
            })
            .collect();

        let game = Game::new(players, self.settings.win_length, rng)?;
        Ok(self.game.insert(game))
    }

    /// Points a member at a new connection.
    ///
    /// Returns `Some(is_spectator)` if the member exists.
    pub fn attach(&mut self, id: &str, conn: ConnectionId) -> Option<bool> {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.presence = Presence::Connected(conn);
            return Some(false);
        }
        if let Some(spectator) = self.spectators.iter_mut().find(|s| s.id == id) {
            spectator.presence = Presence::Connected(conn);
            return Some(true);
        }
        None
    }

    /// Keeps a player's seat but forgets their connection
    pub fn detach_player(&mut self, id: &str) -> bool {
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) => {
                player.presence = Presence::Disconnected;
                true
            }
            None => false,
        }
    }

    /// Players whose seats are only being held for a reconnect
    pub fn disconnected_players(&self) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.presence == Presence::Disconnected)
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn presence_of(&self, id: &str) -> Option<Presence> {
        self.player(id)
            .map(|p| p.presence)
            .or_else(|| self.spectator(id).map(|s| s.presence))
    }

    /// Live connections of every member, players first
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.players
            .iter()
            .map(|p| p.presence)
            .chain(self.spectators.iter().map(|s| s.presence))
            .filter_map(|presence| presence.connection())
            .collect()
    }

    /// Full view of the lobby as sent on create, join and restore
    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            id: self.id.clone(),
            leader: self.leader.clone(),
            players: self.players.iter().map(LobbyPlayer::info).collect(),
            spectators: self.spectators.iter().map(Spectator::info).collect(),
            settings: self.settings,
            game: self.game.as_ref().map(Game::snapshot),
        }
    }
}
