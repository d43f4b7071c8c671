//! Connection registry for the lobby server
//!
//! This module tracks every live WebSocket connection, including:
//! - The connection handle assigned when the socket is accepted
//! - The player identity the connection currently speaks for
//! - The lobby the connection is attached to, if any
//! - The outbound channel drained by the connection's writer task
//!
//! Identity and connection are deliberately separate: a player identity
//! outlives any single socket, so a reconnecting player gets a new
//! [`ConnectionId`] but keeps their player id.

use log::{debug, info};
use shared::ServerMessage;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Server-assigned handle for one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Represents a connected client
#[derive(Debug)]
pub struct Client {
    /// Handle assigned by the server on accept
    pub id: ConnectionId,
    /// Player identity this connection acts as
    pub player_id: String,
    /// Lobby this connection is attached to
    pub lobby_id: Option<String>,
    /// Outbound messages, drained by the connection's writer task
    pub sender: UnboundedSender<ServerMessage>,
    pub connected_at: Instant,
}

impl Client {
    pub fn new(id: ConnectionId, player_id: String, sender: UnboundedSender<ServerMessage>) -> Self {
        Self {
            id,
            player_id,
            lobby_id: None,
            sender,
            connected_at: Instant::now(),
        }
    }
}

/// Manages all live connections
///
/// Enforces the server's connection cap and hands out connection ids,
/// which are never reused during the lifetime of the process.
pub struct ClientManager {
    /// Connected clients indexed by their connection id
    clients: HashMap<ConnectionId, Client>,
    /// Next available connection id
    next_client_id: u64,
    /// Maximum number of concurrent connections allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to register a new connection
    ///
    /// Returns None if the server is at capacity.
    pub fn add_client(
        &mut self,
        player_id: String,
        sender: UnboundedSender<ServerMessage>,
    ) -> Option<ConnectionId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let id = ConnectionId(self.next_client_id);
        self.next_client_id += 1;

        info!("Client {} connected as {}", id, player_id);
        self.clients.insert(id, Client::new(id, player_id, sender));

        Some(id)
    }

    /// Removes a connection, returning its final state
    pub fn remove_client(&mut self, id: ConnectionId) -> Option<Client> {
        let client = self.clients.remove(&id)?;
        info!(
            "Client {} ({}) disconnected after {:?}",
            id,
            client.player_id,
            client.connected_at.elapsed()
        );
        Some(client)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    /// Replaces the player identity a connection acts as
    pub fn set_identity(&mut self, id: ConnectionId, player_id: String) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) => {
                debug!("Client {} now acting as {}", id, player_id);
                client.player_id = player_id;
                true
            }
            None => false,
        }
    }

    pub fn set_lobby(&mut self, id: ConnectionId, lobby_id: Option<String>) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) => {
                client.lobby_id = lobby_id;
                true
            }
            None => false,
        }
    }

    /// Queues a message for a connection.
    ///
    /// Unknown connections and closed channels are skipped silently; the
    /// reader task reports the disconnect separately.
    pub fn send(&self, id: ConnectionId, message: ServerMessage) {
        if let Some(client) = self.clients.get(&id) {
            if client.sender.send(message).is_err() {
                debug!("Dropping message for closed connection {}", id);
            }
        }
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
