//! Wire protocol shared by the lobby server and its clients.
//!
//! Every frame on the channel is a single JSON object tagged by a `type`
//! field. Field names are camelCase so the protocol stays compatible with
//! browser clients. Both directions derive `Serialize` and `Deserialize`;
//! the server encodes [`ServerMessage`] and decodes [`ClientMessage`], the
//! terminal client does the opposite.

pub mod cell;

pub use cell::{Cell, CellParseError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_WIN_LENGTH: u32 = 3;
pub const DEFAULT_MAX_PLAYERS: u32 = 4;

/// Lobby-wide game settings
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub win_length: u32,
    pub max_players: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            win_length: DEFAULT_WIN_LENGTH,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// A lobby player as other members see it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub ready: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SpectatorInfo {
    pub id: String,
    pub name: String,
}

/// A player as captured when the game started
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GamePlayer {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Move {
    pub x: i64,
    pub y: i64,
    pub symbol: String,
}

/// Full game state as sent in `gameStarted` and inside lobby snapshots
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub current_player: String,
    pub current_symbol: Option<String>,
    pub board: BTreeMap<Cell, String>,
    pub move_count: u32,
    pub winner: Option<String>,
    pub player_order: Vec<String>,
    pub winning_cells: Vec<[i64; 2]>,
    pub win_length: u32,
    pub active_players: Vec<String>,
    pub players: Vec<GamePlayer>,
}

impl GameSnapshot {
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }
}

/// Full lobby state as sent on create, join and session restore
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LobbySnapshot {
    pub id: String,
    pub leader: Option<String>,
    pub players: Vec<PlayerInfo>,
    pub spectators: Vec<SpectatorInfo>,
    pub settings: Settings,
    pub game: Option<GameSnapshot>,
}

/// Messages sent by clients to the server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    SetPlayerId {
        player_id: String,
    },
    RestoreSession {
        lobby_id: String,
        player_id: String,
    },
    CreateLobby {
        username: String,
        #[serde(default)]
        win_length: Option<u32>,
        #[serde(default)]
        max_players: Option<u32>,
    },
    JoinLobby {
        lobby_id: String,
        username: String,
        #[serde(default)]
        as_spectator: bool,
    },
    ToggleSpectator {},
    ClaimSymbol {
        symbol: String,
    },
    ToggleReady {},
    UpdateSettings {
        #[serde(default)]
        win_length: Option<u32>,
        #[serde(default)]
        max_players: Option<u32>,
    },
    StartGame {},
    MakeMove {
        x: i64,
        y: i64,
    },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent by the server to clients
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Error {
        message: String,
    },
    LobbyCreated {
        lobby_id: String,
        lobby: LobbySnapshot,
        player_id: String,
        is_spectator: bool,
    },
    LobbyJoined {
        lobby_id: String,
        lobby: LobbySnapshot,
        player_id: String,
        is_spectator: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    SessionRestored {
        lobby: LobbySnapshot,
        player_id: String,
        is_spectator: bool,
    },
    SessionRestoreFailed {
        message: String,
    },
    PlayerJoined {
        player: PlayerInfo,
    },
    PlayerLeft {
        player_id: String,
        new_leader: Option<String>,
    },
    SpectatorJoined {
        spectator: SpectatorInfo,
    },
    SpectatorLeft {
        spectator_id: String,
    },
    SpectatorModeChanged {
        player_id: String,
        is_spectator: bool,
        new_leader: Option<String>,
    },
    SymbolClaimed {
        player_id: String,
        symbol: String,
        ready: bool,
    },
    PlayerReadyChanged {
        player_id: String,
        ready: bool,
    },
    SettingsUpdated {
        settings: Settings,
    },
    GameStarted {
        game: GameSnapshot,
    },
    YourTurn {
        message: String,
    },
    MoveMade {
        #[serde(rename = "move")]
        last_move: Move,
        next_player: String,
        next_symbol: Option<String>,
    },
    GameOver {
        winner: GamePlayer,
        winning_cells: Vec<[i64; 2]>,
        #[serde(rename = "move")]
        last_move: Move,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
