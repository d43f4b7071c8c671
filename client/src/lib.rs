//! # Lobby Client Library
//!
//! This library provides a terminal client for the connect-N lobby server.
//! It connects over WebSocket, turns typed commands into protocol messages
//! and keeps a local copy of the lobby and game that it draws as text.
//!
//! ## Architecture Overview
//!
//! The server is authoritative. The client never changes its local state in
//! response to its own commands; it only applies what the server sends
//! back. Every member of a lobby receives the same stream of deltas, so
//! every client ends up with the same picture.
//!
//! ### State Mirroring
//! On entering a lobby the client receives a full snapshot. Everything after
//! that arrives as small deltas (a player joined, a symbol was claimed, a
//! move was made) which are folded into the snapshot in arrival order.
//!
//! ## Module Organization
//!
//! ### Mirror Module (`mirror`)
//! The local lobby and game state:
//! - Snapshot replacement on create, join and session restore
//! - Membership, symbol, readiness and settings deltas
//! - Board updates from moves and the final result
//!
//! ### Input Module (`input`)
//! Parses terminal lines into protocol messages or local actions.
//!
//! ### Network Module (`network`)
//! WebSocket connection handling and the interactive loop.
//!
//! ### Rendering Module (`rendering`)
//! Text output for the lobby roster, the board and server events.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use shared::ClientMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("ws://127.0.0.1:3000").await?;
//!
//!     client
//!         .send(&ClientMessage::CreateLobby {
//!             username: "Ann".to_string(),
//!             win_length: Some(4),
//!             max_players: None,
//!         })
//!         .await?;
//!
//!     // The reply is applied to the local mirror before it is returned
//!     if let Some(message) = client.recv().await? {
//!         println!("{:?}", message);
//!     }
//!     println!("{:?}", client.mirror().lobby());
//!
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod mirror;
pub mod network;
pub mod rendering;
