//! Message routing for the lobby server.
//!
//! The router owns every piece of mutable server state: the lobby
//! registry, the connection registry and the random generator. It is
//! driven by a single event loop, one message at a time, so each handler
//! runs to completion (state change plus all resulting sends) before the
//! next message is looked at.
//!
//! Handlers return `Result<(), RouteError>`. A failure is reported to the
//! sender alone and leaves state untouched; the router is the only place
//! where domain errors turn into user-visible messages.

use crate::client_manager::{ClientManager, ConnectionId};
use crate::game::{GameError, MoveOutcome};
use crate::lobby::{Lobby, LobbyError, Presence};
use crate::registry::{LobbyRegistry, RegistryError};
use crate::utils::generate_client_id;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use shared::{ClientMessage, LobbySnapshot, ServerMessage};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

pub const YOUR_TURN_NOTICE: &str = "It's your turn!";
pub const SPECTATOR_FALLBACK_NOTICE: &str = "Game in progress - joined as spectator";
pub const SERVER_FULL: &str = "Server full";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Invalid message format")]
    InvalidMessage,
    #[error("Unknown connection")]
    UnknownConnection,
    #[error("Not in a lobby")]
    NotInLobby,
    #[error("Lobby not found")]
    LobbyNotFound,
    #[error("Player not found in lobby")]
    SessionNotFound,
    #[error("Only leader can start game")]
    NotLeaderToStart,
    #[error("Only leader can update settings")]
    NotLeaderToUpdateSettings,
    #[error("Game not found")]
    GameNotFound,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Game already in progress")]
    GameInProgress,
    #[error("Cannot change mode during active game")]
    ModeLockedDuringGame,
    #[error("Cannot change symbol during active game")]
    SymbolLockedDuringGame,
    #[error(transparent)]
    Lobby(#[from] LobbyError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct Router {
    lobbies: LobbyRegistry,
    clients: ClientManager,
    rng: StdRng,
}

impl Router {
    pub fn new(max_clients: usize, rng: StdRng) -> Self {
        Self {
            lobbies: LobbyRegistry::new(),
            clients: ClientManager::new(max_clients),
            rng,
        }
    }

    pub fn lobbies(&self) -> &LobbyRegistry {
        &self.lobbies
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    /// Registers a new connection under a fresh client id.
    ///
    /// At capacity the connection is told the server is full and `None` is
    /// returned; the caller is expected to close it.
    pub fn connect(&mut self, sender: UnboundedSender<ServerMessage>) -> Option<ConnectionId> {
        let player_id = generate_client_id(&mut self.rng);
        if self.clients.len() >= self.clients.max_clients() {
            warn!("Rejecting connection, {} clients connected", self.clients.len());
            let _ = sender.send(ServerMessage::error(SERVER_FULL));
            return None;
        }
        self.clients.add_client(player_id, sender)
    }

    /// Handles a transport-level close
    pub fn disconnect(&mut self, conn: ConnectionId) {
        self.leave_lobby(conn);
        self.clients.remove_client(conn);
    }

    /// Decodes and handles one text frame
    pub fn handle_text(&mut self, conn: ConnectionId, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(message) => self.handle_message(conn, message),
            Err(e) => {
                debug!("Client {} sent an invalid message: {}", conn, e);
                self.clients
                    .send(conn, ServerMessage::error(RouteError::InvalidMessage.to_string()));
            }
        }
    }

    pub fn handle_message(&mut self, conn: ConnectionId, message: ClientMessage) {
        let result = match message {
            ClientMessage::SetPlayerId { player_id } => self.set_player_id(conn, player_id),
            ClientMessage::RestoreSession {
                lobby_id,
                player_id,
            } => {
                if let Err(e) = self.restore_session(conn, &lobby_id, player_id) {
                    debug!("Client {} failed to restore a session: {}", conn, e);
                    self.clients.send(
                        conn,
                        ServerMessage::SessionRestoreFailed {
                            message: e.to_string(),
                        },
                    );
                }
                return;
            }
            ClientMessage::CreateLobby {
                username,
                win_length,
                max_players,
            } => self.create_lobby(conn, username, win_length, max_players),
            ClientMessage::JoinLobby {
                lobby_id,
                username,
                as_spectator,
            } => self.join_lobby(conn, &lobby_id, username, as_spectator),
            ClientMessage::ToggleSpectator {} => self.toggle_spectator(conn),
            ClientMessage::ClaimSymbol { symbol } => self.claim_symbol(conn, &symbol),
            ClientMessage::ToggleReady {} => self.toggle_ready(conn),
            ClientMessage::UpdateSettings {
                win_length,
                max_players,
            } => self.update_settings(conn, win_length, max_players),
            ClientMessage::StartGame {} => self.start_game(conn),
            ClientMessage::MakeMove { x, y } => self.make_move(conn, x, y),
        };

        if let Err(e) = result {
            debug!("Client {} request rejected: {}", conn, e);
            self.clients.send(conn, ServerMessage::error(e.to_string()));
        }
    }

    fn player_id(&self, conn: ConnectionId) -> Result<String, RouteError> {
        self.clients
            .get(conn)
            .map(|client| client.player_id.clone())
            .ok_or(RouteError::UnknownConnection)
    }

    fn current_lobby(&self, conn: ConnectionId) -> Option<String> {
        self.clients.get(conn).and_then(|client| client.lobby_id.clone())
    }

    /// The sender's identity and the lobby it is attached to
    fn membership(&self, conn: ConnectionId) -> Result<(String, String), RouteError> {
        let client = self.clients.get(conn).ok_or(RouteError::UnknownConnection)?;
        let lobby_id = client.lobby_id.clone().ok_or(RouteError::NotInLobby)?;
        Ok((client.player_id.clone(), lobby_id))
    }

    fn set_player_id(&mut self, conn: ConnectionId, player_id: String) -> Result<(), RouteError> {
        let current = self.player_id(conn)?;
        if player_id.is_empty() || player_id == current {
            return Ok(());
        }

        // Memberships belong to the old identity
        self.leave_lobby(conn);
        self.clients.set_identity(conn, player_id);
        Ok(())
    }

    fn restore_session(
        &mut self,
        conn: ConnectionId,
        lobby_id: &str,
        player_id: String,
    ) -> Result<(), RouteError> {
        let client = self.clients.get(conn).ok_or(RouteError::UnknownConnection)?;
        let same_session =
            client.player_id == player_id && client.lobby_id.as_deref() == Some(lobby_id);

        let lobby = self.lobbies.get(lobby_id).ok_or(RouteError::LobbyNotFound)?;
        if !lobby.is_member(&player_id) {
            return Err(RouteError::SessionNotFound);
        }

        if !same_session {
            self.leave_lobby(conn);
            self.clients.set_identity(conn, player_id.clone());
        }

        let (is_spectator, lobby) = self.reattach(conn, lobby_id, &player_id)?;
        info!("Session restored for {} in lobby {}", player_id, lobby_id);
        self.clients.send(
            conn,
            ServerMessage::SessionRestored {
                lobby,
                player_id: player_id.clone(),
                is_spectator,
            },
        );
        self.notify_if_current(lobby_id, &player_id);
        Ok(())
    }

    fn create_lobby(
        &mut self,
        conn: ConnectionId,
        username: String,
        win_length: Option<u32>,
        max_players: Option<u32>,
    ) -> Result<(), RouteError> {
        let player_id = self.player_id(conn)?;
        self.leave_lobby(conn);

        let lobby = self.lobbies.create(
            &mut self.rng,
            player_id.clone(),
            username,
            Presence::Connected(conn),
            win_length,
            max_players,
        )?;
        let lobby_id = lobby.id().to_string();
        let snapshot = lobby.snapshot();

        self.clients.set_lobby(conn, Some(lobby_id.clone()));
        self.clients.send(
            conn,
            ServerMessage::LobbyCreated {
                lobby_id,
                lobby: snapshot,
                player_id,
                is_spectator: false,
            },
        );
        Ok(())
    }

    fn join_lobby(
        &mut self,
        conn: ConnectionId,
        lobby_id: &str,
        username: String,
        as_spectator: bool,
    ) -> Result<(), RouteError> {
        let player_id = self.player_id(conn)?;
        let lobby = self.lobbies.get(lobby_id).ok_or(RouteError::LobbyNotFound)?;
        let returning = lobby.is_member(&player_id);

        // Late arrivals watch until the running game ends
        let forced = !as_spectator
            && lobby
                .game()
                .is_some_and(|game| !game.is_finished() && !game.is_active_player(&player_id));
        let is_spectator = as_spectator || forced;
        if !returning && !is_spectator {
            lobby.can_add_player(&player_id)?;
        }

        if self.current_lobby(conn).as_deref() != Some(lobby_id) {
            self.leave_lobby(conn);
        }

        if returning {
            let (is_spectator, lobby) = self.reattach(conn, lobby_id, &player_id)?;
            self.clients.send(
                conn,
                ServerMessage::LobbyJoined {
                    lobby_id: lobby_id.to_string(),
                    lobby,
                    player_id: player_id.clone(),
                    is_spectator,
                    message: None,
                },
            );
            self.notify_if_current(lobby_id, &player_id);
            return Ok(());
        }

        let lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or(RouteError::LobbyNotFound)?;

        let presence = Presence::Connected(conn);
        let announcement = if is_spectator {
            let spectator = lobby.add_spectator(player_id.clone(), username, presence)?.info();
            ServerMessage::SpectatorJoined { spectator }
        } else {
            let player = lobby.add_player(player_id.clone(), username, presence)?.info();
            ServerMessage::PlayerJoined { player }
        };

        info!(
            "{} joined lobby {} as {} ({}/{} players)",
            player_id,
            lobby_id,
            if is_spectator { "spectator" } else { "player" },
            lobby.players().len(),
            lobby.settings().max_players
        );

        self.clients.set_lobby(conn, Some(lobby_id.to_string()));
        self.clients.send(
            conn,
            ServerMessage::LobbyJoined {
                lobby_id: lobby_id.to_string(),
                lobby: lobby.snapshot(),
                player_id,
                is_spectator,
                message: forced.then(|| SPECTATOR_FALLBACK_NOTICE.to_string()),
            },
        );
        broadcast(&self.clients, lobby, &announcement, Some(conn));
        Ok(())
    }

    fn toggle_spectator(&mut self, conn: ConnectionId) -> Result<(), RouteError> {
        let (player_id, lobby_id) = self.membership(conn)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::NotInLobby)?;

        if lobby.has_active_game() {
            return Err(RouteError::ModeLockedDuringGame);
        }

        let message = if lobby.player(&player_id).is_some() {
            let new_leader = lobby.switch_player_to_spectator(&player_id)?;
            ServerMessage::SpectatorModeChanged {
                player_id,
                is_spectator: true,
                new_leader,
            }
        } else if lobby.spectator(&player_id).is_some() {
            lobby.switch_spectator_to_player(&player_id)?;
            ServerMessage::SpectatorModeChanged {
                player_id,
                is_spectator: false,
                new_leader: lobby.leader().map(String::from),
            }
        } else {
            return Err(RouteError::PlayerNotFound);
        };

        broadcast(&self.clients, lobby, &message, None);
        Ok(())
    }

    fn claim_symbol(&mut self, conn: ConnectionId, symbol: &str) -> Result<(), RouteError> {
        let (player_id, lobby_id) = self.membership(conn)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::NotInLobby)?;

        if lobby.has_active_game() {
            return Err(RouteError::SymbolLockedDuringGame);
        }

        let player = lobby.claim_symbol(&player_id, symbol)?;
        let message = ServerMessage::SymbolClaimed {
            player_id: player.id.clone(),
            symbol: symbol.to_string(),
            ready: player.ready,
        };

        broadcast(&self.clients, lobby, &message, None);
        Ok(())
    }

    fn toggle_ready(&mut self, conn: ConnectionId) -> Result<(), RouteError> {
        let (player_id, lobby_id) = self.membership(conn)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::NotInLobby)?;

        let ready = lobby.toggle_ready(&player_id)?;
        let message = ServerMessage::PlayerReadyChanged { player_id, ready };

        broadcast(&self.clients, lobby, &message, None);
        Ok(())
    }

    fn update_settings(
        &mut self,
        conn: ConnectionId,
        win_length: Option<u32>,
        max_players: Option<u32>,
    ) -> Result<(), RouteError> {
        let (player_id, lobby_id) = self.membership(conn)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::NotInLobby)?;

        if !lobby.is_leader(&player_id) {
            return Err(RouteError::NotLeaderToUpdateSettings);
        }

        let settings = lobby.update_settings(win_length, max_players)?;
        info!(
            "Lobby {} settings: win length {}, max players {}",
            lobby_id, settings.win_length, settings.max_players
        );

        broadcast(
            &self.clients,
            lobby,
            &ServerMessage::SettingsUpdated { settings },
            None,
        );
        Ok(())
    }

    fn start_game(&mut self, conn: ConnectionId) -> Result<(), RouteError> {
        let (player_id, lobby_id) = self.membership(conn)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::NotInLobby)?;

        if !lobby.is_leader(&player_id) {
            return Err(RouteError::NotLeaderToStart);
        }
        if lobby.has_active_game() {
            return Err(RouteError::GameInProgress);
        }

        let game = lobby.start_game(&mut self.rng)?.snapshot();
        info!(
            "Game started in lobby {} (win length {})",
            lobby_id, game.win_length
        );

        broadcast(&self.clients, lobby, &ServerMessage::GameStarted { game }, None);
        notify_turn(&self.clients, lobby);
        Ok(())
    }

    fn make_move(&mut self, conn: ConnectionId, x: i64, y: i64) -> Result<(), RouteError> {
        let player_id = self.player_id(conn)?;
        let lobby_id = self.current_lobby(conn).ok_or(RouteError::GameNotFound)?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RouteError::GameNotFound)?;

        if lobby.game().is_none() {
            return Err(RouteError::GameNotFound);
        }
        if lobby.player(&player_id).is_none() {
            return Err(RouteError::PlayerNotFound);
        }

        let game = lobby.game_mut().ok_or(RouteError::GameNotFound)?;
        let symbol = match game.symbol_of(&player_id) {
            Some(symbol) => symbol.to_string(),
            None if game.is_finished() => return Err(GameError::GameAlreadyFinished.into()),
            None => return Err(GameError::NotYourTurn.into()),
        };

        match game.make_move(&player_id, x, y, &symbol)? {
            MoveOutcome::Won {
                winning_cells,
                last_move,
            } => {
                let winner = game
                    .game_player(&player_id)
                    .cloned()
                    .ok_or(RouteError::PlayerNotFound)?;
                info!(
                    "{} won in lobby {} after {} moves",
                    winner.name,
                    lobby_id,
                    game.move_count()
                );

                let message = ServerMessage::GameOver {
                    winner,
                    winning_cells: winning_cells.iter().map(|cell| cell.to_pair()).collect(),
                    last_move,
                };
                broadcast(&self.clients, lobby, &message, None);

                // Held seats only last while the game runs
                for player_id in lobby.disconnected_players() {
                    lobby.remove_player(&player_id);
                    info!("{} removed from lobby {} after the game", player_id, lobby_id);
                    let message = ServerMessage::PlayerLeft {
                        player_id,
                        new_leader: lobby.leader().map(String::from),
                    };
                    broadcast(&self.clients, lobby, &message, None);
                }
            }
            MoveOutcome::Continue {
                next_player,
                last_move,
            } => {
                let next_symbol = game.symbol_of(&next_player).map(String::from);
                let message = ServerMessage::MoveMade {
                    last_move,
                    next_player,
                    next_symbol,
                };
                broadcast(&self.clients, lobby, &message, None);
                notify_turn(&self.clients, lobby);
            }
        }
        Ok(())
    }

    /// Points a member's presence at `conn` and returns their role and the
    /// lobby as it now stands.
    fn reattach(
        &mut self,
        conn: ConnectionId,
        lobby_id: &str,
        player_id: &str,
    ) -> Result<(bool, LobbySnapshot), RouteError> {
        let lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or(RouteError::LobbyNotFound)?;

        let previous = lobby.presence_of(player_id).and_then(|p| p.connection());
        let is_spectator = lobby
            .attach(player_id, conn)
            .ok_or(RouteError::SessionNotFound)?;

        // The old socket no longer speaks for this member
        if let Some(previous) = previous.filter(|p| *p != conn) {
            self.clients.set_lobby(previous, None);
        }
        self.clients.set_lobby(conn, Some(lobby_id.to_string()));

        debug!("{} attached to lobby {} on {}", player_id, lobby_id, conn);
        Ok((is_spectator, lobby.snapshot()))
    }

    /// Detaches a connection from its lobby.
    ///
    /// A player in a running game keeps their seat with no connection; anyone
    /// else leaves for good, which the rest of the lobby is told about. A lobby
    /// is closed once it is empty, or once no game is running and nobody left in
    /// it is connected.
    fn leave_lobby(&mut self, conn: ConnectionId) {
        let Some(client) = self.clients.get(conn) else {
            return;
        };
        let Some(lobby_id) = client.lobby_id.clone() else {
            return;
        };
        let player_id = client.player_id.clone();
        self.clients.set_lobby(conn, None);

        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };

        if lobby.presence_of(&player_id) != Some(Presence::Connected(conn)) {
            debug!(
                "Connection {} for {} is no longer attached to lobby {}",
                conn, player_id, lobby_id
            );
            return;
        }

        if lobby.has_active_game() && lobby.player(&player_id).is_some() {
            lobby.detach_player(&player_id);
            info!(
                "{} disconnected during a game in lobby {}, seat kept",
                player_id, lobby_id
            );
            return;
        }

        let announcement = if lobby.remove_player(&player_id) {
            ServerMessage::PlayerLeft {
                player_id,
                new_leader: lobby.leader().map(String::from),
            }
        } else if lobby.remove_spectator(&player_id) {
            ServerMessage::SpectatorLeft {
                spectator_id: player_id,
            }
        } else {
            return;
        };

        if lobby.is_empty() || (!lobby.has_active_game() && lobby.connections().is_empty()) {
            self.lobbies.delete(&lobby_id);
            return;
        }

        broadcast(&self.clients, lobby, &announcement, None);
    }

    fn notify_if_current(&self, lobby_id: &str, player_id: &str) {
        let Some(lobby) = self.lobbies.get(lobby_id) else {
            return;
        };
        let is_current = lobby
            .game()
            .is_some_and(|game| !game.is_finished() && game.current_player() == player_id);
        if is_current {
            notify_turn(&self.clients, lobby);
        }
    }
}

/// Sends `message` to every live member of `lobby` except `except`
fn broadcast(
    clients: &ClientManager,
    lobby: &Lobby,
    message: &ServerMessage,
    except: Option<ConnectionId>,
) {
    for conn in lobby.connections() {
        if Some(conn) != except {
            clients.send(conn, message.clone());
        }
    }
}

/// Tells the player whose turn it is, if they are connected
fn notify_turn(clients: &ClientManager, lobby: &Lobby) {
    let Some(game) = lobby.game().filter(|game| !game.is_finished()) else {
        return;
    };

    match lobby
        .presence_of(game.current_player())
        .and_then(|presence| presence.connection())
    {
        Some(conn) => clients.send(
            conn,
            ServerMessage::YourTurn {
                message: YOUR_TURN_NOTICE.to_string(),
            },
        ),
        None => debug!(
            "Lobby {} waiting on disconnected player {}",
            lobby.id(),
            game.current_player()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use shared::{GamePlayer, Move, Settings};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Peer {
        id: &'static str,
        conn: ConnectionId,
        rx: UnboundedReceiver<ServerMessage>,
    }

    impl Peer {
        fn connect(router: &mut Router, id: &'static str) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            let conn = router.connect(tx).unwrap();
            router.handle_message(
                conn,
                ClientMessage::SetPlayerId {
                    player_id: id.to_string(),
                },
            );
            Self { id, conn, rx }
        }

        fn send(&self, router: &mut Router, message: ClientMessage) {
            router.handle_message(self.conn, message);
        }

        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Ok(message) = self.rx.try_recv() {
                messages.push(message);
            }
            messages
        }

        fn name(&self) -> String {
            let mut chars = self.id.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }

        fn symbol(&self) -> &'static str {
            if self.id == "alice" {
                "X"
            } else {
                "O"
            }
        }
    }

    fn router() -> Router {
        Router::new(16, StdRng::seed_from_u64(11))
    }

    fn error(message: &str) -> ServerMessage {
        ServerMessage::error(message)
    }

    fn create_lobby(router: &mut Router, peer: &mut Peer, win_length: Option<u32>) -> String {
        peer.send(
            router,
            ClientMessage::CreateLobby {
                username: peer.name(),
                win_length,
                max_players: None,
            },
        );
        match peer.drain().pop() {
            Some(ServerMessage::LobbyCreated { lobby_id, .. }) => lobby_id,
            other => panic!("Expected lobbyCreated, got {:?}", other),
        }
    }

    fn join(router: &mut Router, peer: &Peer, lobby_id: &str, as_spectator: bool) {
        peer.send(
            router,
            ClientMessage::JoinLobby {
                lobby_id: lobby_id.to_string(),
                username: peer.name(),
                as_spectator,
            },
        );
    }

    fn claim_and_ready(router: &mut Router, peer: &Peer) {
        peer.send(
            router,
            ClientMessage::ClaimSymbol {
                symbol: peer.symbol().to_string(),
            },
        );
        peer.send(router, ClientMessage::ToggleReady {});
    }

    fn current_player(router: &Router, lobby_id: &str) -> String {
        router
            .lobbies()
            .get(lobby_id)
            .unwrap()
            .game()
            .unwrap()
            .current_player()
            .to_string()
    }

    fn make_move(router: &mut Router, peer: &Peer, x: i64, y: i64) {
        peer.send(router, ClientMessage::MakeMove { x, y });
    }

    /// Alice and Bob in a started game, returned in turn order
    fn started_game(router: &mut Router, win_length: Option<u32>) -> (String, Peer, Peer) {
        let mut alice = Peer::connect(router, "alice");
        let mut bob = Peer::connect(router, "bob");
        let lobby_id = create_lobby(router, &mut alice, win_length);
        join(router, &bob, &lobby_id, false);
        claim_and_ready(router, &alice);
        claim_and_ready(router, &bob);
        alice.send(router, ClientMessage::StartGame {});
        alice.drain();
        bob.drain();

        if current_player(router, &lobby_id) == "alice" {
            (lobby_id, alice, bob)
        } else {
            (lobby_id, bob, alice)
        }
    }

    #[test]
    fn test_invalid_json_keeps_connection_usable() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");

        router.handle_text(alice.conn, "{not json");
        router.handle_text(alice.conn, r#"{"type":"teleport"}"#);
        assert_eq!(
            alice.drain(),
            vec![
                error("Invalid message format"),
                error("Invalid message format")
            ]
        );

        router.handle_text(alice.conn, r#"{"type":"createLobby","username":"Alice"}"#);
        assert!(matches!(
            alice.drain().as_slice(),
            [ServerMessage::LobbyCreated { .. }]
        ));
    }

    #[test]
    fn test_connect_over_capacity() {
        let mut router = Router::new(1, StdRng::seed_from_u64(1));
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        assert!(router.connect(tx1).is_some());
        assert!(router.connect(tx2).is_none());
        assert_eq!(rx2.try_recv().unwrap(), error("Server full"));
        assert_eq!(router.clients().len(), 1);
    }

    #[test]
    fn test_fresh_connection_gets_generated_identity() {
        let mut router = router();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).unwrap();

        let id = router.clients().get(conn).unwrap().player_id.clone();
        assert_eq!(id.len(), 8);

        router.handle_message(
            conn,
            ClientMessage::SetPlayerId {
                player_id: String::new(),
            },
        );
        assert_eq!(router.clients().get(conn).unwrap().player_id, id);
    }

    #[test]
    fn test_create_lobby() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        alice.send(
            &mut router,
            ClientMessage::CreateLobby {
                username: "Alice".to_string(),
                win_length: Some(5),
                max_players: Some(0),
            },
        );

        match alice.drain().as_slice() {
            [ServerMessage::LobbyCreated {
                lobby_id,
                lobby,
                player_id,
                is_spectator,
            }] => {
                assert_eq!(lobby_id, &lobby.id);
                assert_eq!(player_id, "alice");
                assert!(!is_spectator);
                assert_eq!(lobby.leader.as_deref(), Some("alice"));
                assert_eq!(
                    lobby.settings,
                    Settings {
                        win_length: 5,
                        max_players: 4
                    }
                );
            }
            other => panic!("Unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_join_announces_to_others_only() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);

        join(&mut router, &bob, &lobby_id, false);

        match bob.drain().as_slice() {
            [ServerMessage::LobbyJoined {
                lobby,
                is_spectator,
                message,
                ..
            }] => {
                assert!(!is_spectator);
                assert!(message.is_none());
                assert_eq!(lobby.players.len(), 2);
            }
            other => panic!("Unexpected messages {:?}", other),
        }
        match alice.drain().as_slice() {
            [ServerMessage::PlayerJoined { player }] => {
                assert_eq!(player.id, "bob");
                assert_eq!(player.name, "Bob");
                assert!(player.symbol.is_none());
            }
            other => panic!("Unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_join_as_spectator() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut carol = Peer::connect(&mut router, "carol");
        let lobby_id = create_lobby(&mut router, &mut alice, None);

        join(&mut router, &carol, &lobby_id, true);

        assert!(matches!(
            carol.drain().as_slice(),
            [ServerMessage::LobbyJoined {
                is_spectator: true,
                ..
            }]
        ));
        match alice.drain().as_slice() {
            [ServerMessage::SpectatorJoined { spectator }] => assert_eq!(spectator.id, "carol"),
            other => panic!("Unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_join_failures() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");

        join(&mut router, &bob, "NOPE00", false);
        assert_eq!(bob.drain(), vec![error("Lobby not found")]);

        alice.send(
            &mut router,
            ClientMessage::CreateLobby {
                username: "Alice".to_string(),
                win_length: None,
                max_players: Some(1),
            },
        );
        let lobby_id = match alice.drain().pop() {
            Some(ServerMessage::LobbyCreated { lobby_id, .. }) => lobby_id,
            other => panic!("Unexpected message {:?}", other),
        };

        join(&mut router, &bob, &lobby_id, false);
        assert_eq!(bob.drain(), vec![error("Lobby is full")]);
        assert!(alice.drain().is_empty());
        assert!(router.clients().get(bob.conn).unwrap().lobby_id.is_none());
    }

    #[test]
    fn test_failed_join_keeps_current_lobby() {
        let mut router = router();
        let (home, mut first, mut second) = started_game(&mut router, None);
        let mut carol = Peer::connect(&mut router, "carol");

        carol.send(
            &mut router,
            ClientMessage::CreateLobby {
                username: carol.name(),
                win_length: None,
                max_players: Some(1),
            },
        );
        let full = match carol.drain().pop() {
            Some(ServerMessage::LobbyCreated { lobby_id, .. }) => lobby_id,
            other => panic!("Unexpected message {:?}", other),
        };

        join(&mut router, &second, &full, false);
        assert_eq!(second.drain(), vec![error("Lobby is full")]);
        assert!(first.drain().is_empty());
        assert!(carol.drain().is_empty());

        let lobby = router.lobbies().get(&home).unwrap();
        assert_eq!(
            lobby.presence_of(second.id),
            Some(Presence::Connected(second.conn))
        );
        assert_eq!(
            router.clients().get(second.conn).unwrap().lobby_id.as_deref(),
            Some(home.as_str())
        );
        assert_eq!(router.lobbies().get(&full).unwrap().players().len(), 1);
    }

    #[test]
    fn test_requests_outside_a_lobby() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");

        alice.send(&mut router, ClientMessage::ToggleReady {});
        alice.send(&mut router, ClientMessage::ToggleSpectator {});
        alice.send(&mut router, ClientMessage::StartGame {});
        alice.send(
            &mut router,
            ClientMessage::ClaimSymbol {
                symbol: "X".to_string(),
            },
        );
        make_move(&mut router, &alice, 0, 0);

        assert_eq!(
            alice.drain(),
            vec![
                error("Not in a lobby"),
                error("Not in a lobby"),
                error("Not in a lobby"),
                error("Not in a lobby"),
                error("Game not found"),
            ]
        );
    }

    #[test]
    fn test_symbol_claims() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        alice.drain();
        bob.drain();

        alice.send(
            &mut router,
            ClientMessage::ClaimSymbol {
                symbol: "X".to_string(),
            },
        );
        let claimed = ServerMessage::SymbolClaimed {
            player_id: "alice".to_string(),
            symbol: "X".to_string(),
            ready: false,
        };
        assert_eq!(alice.drain(), vec![claimed.clone()]);
        assert_eq!(bob.drain(), vec![claimed]);

        bob.send(
            &mut router,
            ClientMessage::ClaimSymbol {
                symbol: "X".to_string(),
            },
        );
        assert_eq!(bob.drain(), vec![error("Symbol already taken")]);
        assert!(alice.drain().is_empty());
    }

    #[test]
    fn test_ready_requires_symbol() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        create_lobby(&mut router, &mut alice, None);

        alice.send(&mut router, ClientMessage::ToggleReady {});
        assert_eq!(alice.drain(), vec![error("Please select a symbol first")]);

        claim_and_ready(&mut router, &alice);
        assert_eq!(
            alice.drain().pop(),
            Some(ServerMessage::PlayerReadyChanged {
                player_id: "alice".to_string(),
                ready: true,
            })
        );
    }

    #[test]
    fn test_settings_updates() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        alice.drain();
        bob.drain();

        bob.send(
            &mut router,
            ClientMessage::UpdateSettings {
                win_length: Some(5),
                max_players: None,
            },
        );
        assert_eq!(bob.drain(), vec![error("Only leader can update settings")]);

        alice.send(
            &mut router,
            ClientMessage::UpdateSettings {
                win_length: Some(5),
                max_players: Some(1),
            },
        );
        assert_eq!(
            alice.drain(),
            vec![error(
                "Cannot set max players to 1. There are already 2 players in the lobby."
            )]
        );

        alice.send(
            &mut router,
            ClientMessage::UpdateSettings {
                win_length: Some(5),
                max_players: None,
            },
        );
        let updated = ServerMessage::SettingsUpdated {
            settings: Settings {
                win_length: 5,
                max_players: 4,
            },
        };
        assert_eq!(alice.drain(), vec![updated.clone()]);
        assert_eq!(bob.drain(), vec![updated]);
    }

    #[test]
    fn test_start_game_preconditions() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);

        alice.send(&mut router, ClientMessage::StartGame {});
        assert_eq!(alice.drain(), vec![error("Need at least 2 players")]);

        join(&mut router, &bob, &lobby_id, false);
        bob.drain();
        bob.send(&mut router, ClientMessage::StartGame {});
        assert_eq!(bob.drain(), vec![error("Only leader can start game")]);

        alice.send(&mut router, ClientMessage::StartGame {});
        assert_eq!(
            alice.drain().pop(),
            Some(error("All players must select a symbol and be ready"))
        );
    }

    #[test]
    fn test_start_game_notifies_first_player() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        claim_and_ready(&mut router, &alice);
        claim_and_ready(&mut router, &bob);
        alice.drain();
        bob.drain();

        alice.send(&mut router, ClientMessage::StartGame {});
        let first = current_player(&router, &lobby_id);

        let (mut starter, mut waiter) = if first == "alice" {
            (alice, bob)
        } else {
            (bob, alice)
        };

        match starter.drain().as_slice() {
            [ServerMessage::GameStarted { game }, ServerMessage::YourTurn { message }] => {
                assert_eq!(game.current_player, first);
                assert_eq!(game.move_count, 0);
                assert_eq!(game.active_players.len(), 2);
                assert_eq!(message, YOUR_TURN_NOTICE);
            }
            other => panic!("Unexpected messages {:?}", other),
        }
        assert!(matches!(
            waiter.drain().as_slice(),
            [ServerMessage::GameStarted { .. }]
        ));
    }

    #[test]
    fn test_moves_and_turn_notices() {
        let mut router = router();
        let (_, mut first, mut second) = started_game(&mut router, None);

        make_move(&mut router, &second, 0, 0);
        assert_eq!(second.drain(), vec![error("Not your turn")]);
        assert!(first.drain().is_empty());

        make_move(&mut router, &first, 0, 0);
        let moved = ServerMessage::MoveMade {
            last_move: Move {
                x: 0,
                y: 0,
                symbol: first.symbol().to_string(),
            },
            next_player: second.id.to_string(),
            next_symbol: Some(second.symbol().to_string()),
        };
        assert_eq!(first.drain(), vec![moved.clone()]);
        assert_eq!(
            second.drain(),
            vec![
                moved,
                ServerMessage::YourTurn {
                    message: YOUR_TURN_NOTICE.to_string()
                }
            ]
        );

        make_move(&mut router, &second, 0, 0);
        assert_eq!(second.drain(), vec![error("Cell already taken")]);
    }

    #[test]
    fn test_winning_move_ends_game() {
        let mut router = router();
        let (_, mut first, mut second) = started_game(&mut router, None);

        make_move(&mut router, &first, 0, 0);
        make_move(&mut router, &second, 1, 0);
        make_move(&mut router, &first, 0, 1);
        make_move(&mut router, &second, 1, 1);
        first.drain();
        second.drain();

        make_move(&mut router, &first, 0, 2);
        let over = ServerMessage::GameOver {
            winner: GamePlayer {
                id: first.id.to_string(),
                name: first.name(),
                symbol: first.symbol().to_string(),
            },
            winning_cells: vec![[0, 0], [0, 1], [0, 2]],
            last_move: Move {
                x: 0,
                y: 2,
                symbol: first.symbol().to_string(),
            },
        };
        assert_eq!(first.drain(), vec![over.clone()]);
        assert_eq!(second.drain(), vec![over]);

        make_move(&mut router, &second, 5, 5);
        assert_eq!(second.drain(), vec![error("Game already finished")]);
    }

    #[test]
    fn test_game_can_restart_after_a_win() {
        let mut router = router();
        let (lobby_id, mut first, mut second) = started_game(&mut router, Some(1));

        make_move(&mut router, &first, 3, 3);
        first.drain();
        second.drain();

        let leader = if first.id == "alice" { &first } else { &second };
        leader.send(&mut router, ClientMessage::StartGame {});

        let game = router.lobbies().get(&lobby_id).unwrap().game().unwrap();
        assert_eq!(game.move_count(), 0);
        assert!(!game.is_finished());
    }

    #[test]
    fn test_locked_actions_during_game() {
        let mut router = router();
        let (_, mut first, mut second) = started_game(&mut router, None);

        for peer in [&mut first, &mut second] {
            peer.send(&mut router, ClientMessage::ToggleSpectator {});
            peer.send(
                &mut router,
                ClientMessage::ClaimSymbol {
                    symbol: "Q".to_string(),
                },
            );
            let mut expected = vec![
                error("Cannot change mode during active game"),
                error("Cannot change symbol during active game"),
            ];
            if peer.id == "alice" {
                peer.send(&mut router, ClientMessage::StartGame {});
                expected.push(error("Game already in progress"));
            }
            assert_eq!(peer.drain(), expected);
        }
    }

    #[test]
    fn test_late_joiner_is_forced_to_spectate() {
        let mut router = router();
        let (lobby_id, mut first, mut second) = started_game(&mut router, None);
        let mut carol = Peer::connect(&mut router, "carol");

        join(&mut router, &carol, &lobby_id, false);

        match carol.drain().as_slice() {
            [ServerMessage::LobbyJoined {
                is_spectator,
                message,
                lobby,
                ..
            }] => {
                assert!(is_spectator);
                assert_eq!(message.as_deref(), Some(SPECTATOR_FALLBACK_NOTICE));
                assert!(lobby.game.is_some());
            }
            other => panic!("Unexpected messages {:?}", other),
        }
        for peer in [&mut first, &mut second] {
            assert!(matches!(
                peer.drain().as_slice(),
                [ServerMessage::SpectatorJoined { .. }]
            ));
        }

        // Spectators see moves too
        make_move(&mut router, &first, 0, 0);
        assert!(matches!(
            carol.drain().as_slice(),
            [ServerMessage::MoveMade { .. }]
        ));
    }

    #[test]
    fn test_disconnect_during_game_keeps_seat_and_pauses() {
        let mut router = router();
        let (lobby_id, mut first, second) = started_game(&mut router, None);

        make_move(&mut router, &first, 0, 0);
        first.drain();

        router.disconnect(second.conn);
        assert!(first.drain().is_empty());

        let lobby = router.lobbies().get(&lobby_id).unwrap();
        assert_eq!(lobby.presence_of(second.id), Some(Presence::Disconnected));
        assert_eq!(lobby.players().len(), 2);

        // Nobody else can take the absent player's turn
        make_move(&mut router, &first, 1, 1);
        assert_eq!(first.drain(), vec![error("Not your turn")]);
    }

    #[test]
    fn test_disconnected_players_leave_when_game_ends() {
        let mut router = router();
        let (lobby_id, mut first, second) = started_game(&mut router, Some(1));

        router.disconnect(second.conn);
        make_move(&mut router, &first, 0, 0);

        match first.drain().as_slice() {
            [ServerMessage::GameOver { winner, .. }, left] => {
                assert_eq!(winner.id, first.id);
                assert_eq!(
                    left,
                    &ServerMessage::PlayerLeft {
                        player_id: second.id.to_string(),
                        new_leader: Some(first.id.to_string()),
                    }
                );
            }
            other => panic!("Unexpected messages {:?}", other),
        }

        let lobby = router.lobbies().get(&lobby_id).unwrap();
        assert_eq!(lobby.players().len(), 1);
        assert!(!lobby.is_member(second.id));
        assert!(lobby.is_leader(first.id));

        // The freed seat is not counted towards a new game
        first.send(&mut router, ClientMessage::StartGame {});
        assert_eq!(first.drain(), vec![error("Need at least 2 players")]);

        let mut carol = Peer::connect(&mut router, "carol");
        join(&mut router, &carol, &lobby_id, false);
        match carol.drain().as_slice() {
            [ServerMessage::LobbyJoined {
                is_spectator,
                message,
                ..
            }] => {
                assert!(!is_spectator);
                assert!(message.is_none());
            }
            other => panic!("Unexpected messages {:?}", other),
        }
    }

    #[test]
    fn test_restore_session_resumes_turn() {
        let mut router = router();
        let (lobby_id, mut first, second) = started_game(&mut router, None);
        make_move(&mut router, &first, 0, 0);
        router.disconnect(second.conn);
        first.drain();

        let mut back = Peer::connect(&mut router, second.id);
        back.send(
            &mut router,
            ClientMessage::RestoreSession {
                lobby_id: lobby_id.clone(),
                player_id: second.id.to_string(),
            },
        );

        match back.drain().as_slice() {
            [ServerMessage::SessionRestored {
                lobby,
                player_id,
                is_spectator,
            }, ServerMessage::YourTurn { .. }] => {
                assert_eq!(player_id, second.id);
                assert!(!is_spectator);
                let game = lobby.game.as_ref().unwrap();
                assert_eq!(game.move_count, 1);
                assert_eq!(game.board.len(), 1);
            }
            other => panic!("Unexpected messages {:?}", other),
        }

        make_move(&mut router, &back, 1, 1);
        assert!(matches!(
            first.drain().as_slice(),
            [ServerMessage::MoveMade { .. }, ServerMessage::YourTurn { .. }]
        ));
    }

    #[test]
    fn test_restore_session_failures() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        let mut stranger = Peer::connect(&mut router, "stranger");

        stranger.send(
            &mut router,
            ClientMessage::RestoreSession {
                lobby_id: "NOPE00".to_string(),
                player_id: "alice".to_string(),
            },
        );
        stranger.send(
            &mut router,
            ClientMessage::RestoreSession {
                lobby_id,
                player_id: "ghost".to_string(),
            },
        );

        assert_eq!(
            stranger.drain(),
            vec![
                ServerMessage::SessionRestoreFailed {
                    message: "Lobby not found".to_string()
                },
                ServerMessage::SessionRestoreFailed {
                    message: "Player not found in lobby".to_string()
                },
            ]
        );
        assert_eq!(
            router.clients().get(stranger.conn).unwrap().player_id,
            "stranger"
        );
    }

    #[test]
    fn test_leaving_without_game_promotes_next_leader() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        bob.drain();

        router.disconnect(alice.conn);

        assert_eq!(
            bob.drain(),
            vec![ServerMessage::PlayerLeft {
                player_id: "alice".to_string(),
                new_leader: Some("bob".to_string()),
            }]
        );
        assert_eq!(
            router.lobbies().get(&lobby_id).unwrap().leader(),
            Some("bob")
        );
    }

    #[test]
    fn test_spectator_leaving_is_announced() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let carol = Peer::connect(&mut router, "carol");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &carol, &lobby_id, true);
        alice.drain();

        router.disconnect(carol.conn);
        assert_eq!(
            alice.drain(),
            vec![ServerMessage::SpectatorLeft {
                spectator_id: "carol".to_string()
            }]
        );
    }

    #[test]
    fn test_last_member_leaving_deletes_lobby() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let lobby_id = create_lobby(&mut router, &mut alice, None);

        router.disconnect(alice.conn);
        assert!(router.lobbies().get(&lobby_id).is_none());
        assert!(router.clients().is_empty());
    }

    #[test]
    fn test_lobby_of_absent_players_closes_after_game() {
        let mut router = router();
        let (lobby_id, first, second) = started_game(&mut router, Some(1));

        router.disconnect(second.conn);
        make_move(&mut router, &first, 0, 0);
        assert!(router.lobbies().get(&lobby_id).is_some());

        router.disconnect(first.conn);
        assert!(router.lobbies().get(&lobby_id).is_none());
    }

    #[test]
    fn test_stale_connection_close_is_ignored() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        bob.drain();

        let mut alice_again = Peer::connect(&mut router, "alice");
        alice_again.send(
            &mut router,
            ClientMessage::RestoreSession {
                lobby_id: lobby_id.clone(),
                player_id: "alice".to_string(),
            },
        );
        assert!(matches!(
            alice_again.drain().as_slice(),
            [ServerMessage::SessionRestored {
                is_spectator: false,
                ..
            }]
        ));

        router.disconnect(alice.conn);
        assert!(bob.drain().is_empty());

        let lobby = router.lobbies().get(&lobby_id).unwrap();
        assert_eq!(
            lobby.presence_of("alice"),
            Some(Presence::Connected(alice_again.conn))
        );
    }

    #[test]
    fn test_rejoin_reattaches_existing_member() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);
        join(&mut router, &bob, &lobby_id, false);
        alice.drain();

        let mut bob_again = Peer::connect(&mut router, "bob");
        join(&mut router, &bob_again, &lobby_id, true);

        assert!(matches!(
            bob_again.drain().as_slice(),
            [ServerMessage::LobbyJoined {
                is_spectator: false,
                ..
            }]
        ));
        assert!(alice.drain().is_empty());
        assert_eq!(router.lobbies().get(&lobby_id).unwrap().players().len(), 2);
    }

    #[test]
    fn test_joining_another_lobby_leaves_the_first() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let mut carol = Peer::connect(&mut router, "carol");
        let first = create_lobby(&mut router, &mut alice, None);
        let second = create_lobby(&mut router, &mut carol, None);
        join(&mut router, &bob, &first, false);
        alice.drain();

        join(&mut router, &bob, &second, false);

        assert_eq!(
            alice.drain(),
            vec![ServerMessage::PlayerLeft {
                player_id: "bob".to_string(),
                new_leader: Some("alice".to_string()),
            }]
        );
        assert!(matches!(
            carol.drain().as_slice(),
            [ServerMessage::PlayerJoined { .. }]
        ));
        assert!(matches!(
            bob.drain().last(),
            Some(ServerMessage::LobbyJoined { .. })
        ));
    }

    #[test]
    fn test_toggle_spectator() {
        let mut router = router();
        let mut alice = Peer::connect(&mut router, "alice");
        let mut bob = Peer::connect(&mut router, "bob");
        let lobby_id = create_lobby(&mut router, &mut alice, None);

        alice.send(&mut router, ClientMessage::ToggleSpectator {});
        assert_eq!(
            alice.drain(),
            vec![error("Cannot become spectator as the only player")]
        );

        join(&mut router, &bob, &lobby_id, false);
        alice.drain();
        bob.drain();

        alice.send(&mut router, ClientMessage::ToggleSpectator {});
        let to_spectator = ServerMessage::SpectatorModeChanged {
            player_id: "alice".to_string(),
            is_spectator: true,
            new_leader: Some("bob".to_string()),
        };
        assert_eq!(alice.drain(), vec![to_spectator.clone()]);
        assert_eq!(bob.drain(), vec![to_spectator]);

        alice.send(&mut router, ClientMessage::ToggleSpectator {});
        assert_eq!(
            bob.drain(),
            vec![ServerMessage::SpectatorModeChanged {
                player_id: "alice".to_string(),
                is_spectator: false,
                new_leader: Some("bob".to_string()),
            }]
        );
        let lobby = router.lobbies().get(&lobby_id).unwrap();
        assert!(lobby.player("alice").is_some());
        assert!(lobby.player("alice").unwrap().symbol.is_none());
    }
}
