//! Client-side copy of the lobby, rebuilt from server messages.
//!
//! The server only sends a full [`LobbySnapshot`] when this client enters a
//! lobby. Everything after that arrives as deltas, and [`LobbyMirror::apply`]
//! folds each one into the local copy so it keeps matching the server.

use log::{debug, warn};
use shared::{Cell, GameSnapshot, LobbySnapshot, PlayerInfo, ServerMessage, SpectatorInfo};

#[derive(Debug, Clone, Default)]
pub struct LobbyMirror {
    player_id: Option<String>,
    is_spectator: bool,
    lobby: Option<LobbySnapshot>,
}

impl LobbyMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn is_spectator(&self) -> bool {
        self.is_spectator
    }

    pub fn lobby(&self) -> Option<&LobbySnapshot> {
        self.lobby.as_ref()
    }

    pub fn game(&self) -> Option<&GameSnapshot> {
        self.lobby.as_ref().and_then(|lobby| lobby.game.as_ref())
    }

    pub fn is_leader(&self) -> bool {
        match (&self.lobby, &self.player_id) {
            (Some(lobby), Some(id)) => lobby.leader.as_ref() == Some(id),
            _ => false,
        }
    }

    pub fn is_my_turn(&self) -> bool {
        match (self.game(), &self.player_id) {
            (Some(game), Some(id)) => !game.is_finished() && &game.current_player == id,
            _ => false,
        }
    }

    /// Name of a lobby member, falling back to the game roster for players
    /// who have since left.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        let lobby = self.lobby.as_ref()?;
        lobby
            .players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
            .or_else(|| {
                lobby
                    .spectators
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.name.as_str())
            })
            .or_else(|| {
                lobby
                    .game
                    .as_ref()
                    .and_then(|game| game.players.iter().find(|p| p.id == id))
                    .map(|p| p.name.as_str())
            })
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::LobbyCreated {
                lobby,
                player_id,
                is_spectator,
                ..
            }
            | ServerMessage::LobbyJoined {
                lobby,
                player_id,
                is_spectator,
                ..
            }
            | ServerMessage::SessionRestored {
                lobby,
                player_id,
                is_spectator,
            } => {
                debug!("Entered lobby {} as {}", lobby.id, player_id);
                self.lobby = Some(lobby.clone());
                self.player_id = Some(player_id.clone());
                self.is_spectator = *is_spectator;
            }
            ServerMessage::SessionRestoreFailed { .. } => {
                self.lobby = None;
                self.is_spectator = false;
            }
            ServerMessage::Error { .. } | ServerMessage::YourTurn { .. } => {}
            _ => self.apply_delta(message),
        }
    }

    fn apply_delta(&mut self, message: &ServerMessage) {
        let own_id = self.player_id.clone();
        let Some(lobby) = self.lobby.as_mut() else {
            warn!("Ignoring lobby update received outside a lobby");
            return;
        };

        match message {
            ServerMessage::PlayerJoined { player } => {
                lobby.players.retain(|p| p.id != player.id);
                lobby.players.push(player.clone());
                if lobby.leader.is_none() {
                    lobby.leader = Some(player.id.clone());
                }
            }
            ServerMessage::PlayerLeft {
                player_id,
                new_leader,
            } => {
                lobby.players.retain(|p| &p.id != player_id);
                lobby.leader = new_leader.clone();
            }
            ServerMessage::SpectatorJoined { spectator } => {
                lobby.spectators.retain(|s| s.id != spectator.id);
                lobby.spectators.push(spectator.clone());
            }
            ServerMessage::SpectatorLeft { spectator_id } => {
                lobby.spectators.retain(|s| &s.id != spectator_id);
            }
            ServerMessage::SpectatorModeChanged {
                player_id,
                is_spectator,
                new_leader,
            } => {
                if *is_spectator {
                    if let Some(index) = lobby.players.iter().position(|p| &p.id == player_id) {
                        let player = lobby.players.remove(index);
                        lobby.spectators.push(SpectatorInfo {
                            id: player.id,
                            name: player.name,
                        });
                    }
                } else if let Some(index) = lobby.spectators.iter().position(|s| &s.id == player_id)
                {
                    let spectator = lobby.spectators.remove(index);
                    lobby.players.push(PlayerInfo {
                        id: spectator.id,
                        name: spectator.name,
                        symbol: None,
                        ready: false,
                    });
                }
                lobby.leader = new_leader.clone();

                if own_id.as_ref() == Some(player_id) {
                    self.is_spectator = *is_spectator;
                }
            }
            ServerMessage::SymbolClaimed {
                player_id,
                symbol,
                ready,
            } => {
                if let Some(player) = lobby.players.iter_mut().find(|p| &p.id == player_id) {
                    player.symbol = Some(symbol.clone());
                    player.ready = *ready;
                }
            }
            ServerMessage::PlayerReadyChanged { player_id, ready } => {
                if let Some(player) = lobby.players.iter_mut().find(|p| &p.id == player_id) {
                    player.ready = *ready;
                }
            }
            ServerMessage::SettingsUpdated { settings } => {
                lobby.settings = *settings;
            }
            ServerMessage::GameStarted { game } => {
                lobby.game = Some(game.clone());
            }
            ServerMessage::MoveMade {
                last_move,
                next_player,
                next_symbol,
            } => {
                if let Some(game) = lobby.game.as_mut() {
                    game.board
                        .insert(Cell::new(last_move.x, last_move.y), last_move.symbol.clone());
                    game.move_count += 1;
                    game.current_player = next_player.clone();
                    game.current_symbol = next_symbol.clone();
                }
            }
            ServerMessage::GameOver {
                winner,
                winning_cells,
                last_move,
            } => {
                if let Some(game) = lobby.game.as_mut() {
                    game.board
                        .insert(Cell::new(last_move.x, last_move.y), last_move.symbol.clone());
                    game.move_count += 1;
                    game.winner = Some(winner.id.clone());
                    game.winning_cells = winning_cells.clone();
                }
            }
            _ => {}
        }
    }
}
