//! # Lobby Server Library
//!
//! This library provides the authoritative server for real-time connect-N
//! games. Players gather in lobbies, pick symbols, ready up and then take
//! turns placing symbols on an unbounded grid until someone completes a
//! line of the lobby's win length.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! Every lobby and every game lives here. Clients only send intents
//! (claim a symbol, make a move) and receive the resulting state deltas;
//! nothing a client says is applied without validation.
//!
//! ### Lobby Lifecycle
//! Handles the complete lifecycle of a lobby including:
//! - Creation under a short join code
//! - Players and spectators joining, leaving and switching roles
//! - Leadership hand-over when the leader leaves
//! - Deletion once the last member is gone
//!
//! ### Reconnection
//! A player identity outlives its socket. A player who drops during a game
//! keeps their seat and turn slot and can restore the session from a new
//! connection.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! Each connection runs its own reader and writer tasks, but all state
//! changes happen on one loop that owns the [`router::Router`]. Messages
//! are handled one at a time and to completion, so no lobby is ever seen
//! half-updated and no locks are needed.
//!
//! ### WebSocket Transport
//! Clients speak JSON text frames over WebSocket. The message catalogue
//! lives in the `shared` crate and is used by both ends.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The connect-N engine: turn order, move validation and win detection.
//!
//! ### Lobby Module (`lobby`)
//! Lobby membership, symbols, readiness, settings and leadership.
//!
//! ### Registry Module (`registry`)
//! The table of open lobbies and join code allocation.
//!
//! ### Client Manager Module (`client_manager`)
//! Live connections, the identity each one speaks for and its outbound
//! queue.
//!
//! ### Router Module (`router`)
//! Dispatches client messages, enforces authorization and decides who is
//! told about each outcome.
//!
//! ### Network Module (`network`)
//! TCP accept loop, WebSocket handshake and per-connection tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Listen on port 3000 and allow up to 1024 simultaneous connections
//!     let server = Server::bind("127.0.0.1:3000", 1024, StdRng::from_entropy()).await?;
//!
//!     // Runs until the process is stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod lobby;
pub mod network;
pub mod registry;
pub mod router;
pub mod utils;
