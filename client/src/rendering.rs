//! Text rendering of the lobby, the board and server events

use crate::mirror::LobbyMirror;
use shared::{Cell, GameSnapshot, LobbySnapshot, ServerMessage};
use std::collections::HashSet;
use std::fmt::Write;

/// Empty cells drawn around the occupied area
const BOARD_MARGIN: i64 = 1;

/// Draws the bounding box of the occupied cells plus a margin.
///
/// Rows run top to bottom in increasing `y`. Winning cells are bracketed.
pub fn render_board(game: &GameSnapshot) -> String {
    let (min_x, max_x, min_y, max_y) = bounds(game);
    let winning: HashSet<Cell> = game.winning_cells.iter().map(|&pair| Cell::from(pair)).collect();

    let label_width = (min_y..=max_y)
        .map(|y| y.to_string().chars().count())
        .max()
        .unwrap_or(1);
    let inner = (min_x..=max_x)
        .map(|x| x.to_string().chars().count())
        .chain(game.board.values().map(|s| s.chars().count()))
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    let _ = write!(out, "{:>width$}", "", width = label_width);
    for x in min_x..=max_x {
        let _ = write!(out, " {:^inner$} ", x, inner = inner);
    }
    out.push('\n');

    for y in min_y..=max_y {
        let _ = write!(out, "{:>width$}", y, width = label_width);
        for x in min_x..=max_x {
            let cell = Cell::new(x, y);
            let symbol = game.board.get(&cell).map(String::as_str).unwrap_or(".");
            if winning.contains(&cell) {
                let _ = write!(out, "[{:^inner$}]", symbol, inner = inner);
            } else {
                let _ = write!(out, " {:^inner$} ", symbol, inner = inner);
            }
        }
        out.push('\n');
    }

    out
}

fn bounds(game: &GameSnapshot) -> (i64, i64, i64, i64) {
    let mut cells = game.board.keys();
    let Some(first) = cells.next() else {
        return (-BOARD_MARGIN, BOARD_MARGIN, -BOARD_MARGIN, BOARD_MARGIN);
    };

    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for cell in cells {
        min_x = min_x.min(cell.x);
        max_x = max_x.max(cell.x);
        min_y = min_y.min(cell.y);
        max_y = max_y.max(cell.y);
    }

    (
        min_x.saturating_sub(BOARD_MARGIN),
        max_x.saturating_add(BOARD_MARGIN),
        min_y.saturating_sub(BOARD_MARGIN),
        max_y.saturating_add(BOARD_MARGIN),
    )
}

pub fn render_lobby(lobby: &LobbySnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Lobby {} (win length {}, up to {} players)",
        lobby.id, lobby.settings.win_length, lobby.settings.max_players
    );

    for player in &lobby.players {
        let leader = if lobby.leader.as_ref() == Some(&player.id) {
            " (leader)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} [{}] {}{}{}",
            player.name,
            player.id,
            player.symbol.as_deref().unwrap_or("-"),
            if player.ready { " ready" } else { "" },
            leader
        );
    }
    for spectator in &lobby.spectators {
        let _ = writeln!(out, "  {} [{}] watching", spectator.name, spectator.id);
    }

    out
}

/// One line describing what a server message means to the user.
///
/// Call before applying the message so departing members still have a name.
pub fn describe(message: &ServerMessage, mirror: &LobbyMirror) -> String {
    let name = |id: &str| mirror.name_of(id).unwrap_or(id).to_string();

    match message {
        ServerMessage::Error { message } => format!("Error: {}", message),
        ServerMessage::LobbyCreated { lobby_id, .. } => {
            format!("Lobby {} created, share the code to invite others", lobby_id)
        }
        ServerMessage::LobbyJoined {
            lobby_id,
            is_spectator,
            message,
            ..
        } => {
            let role = if *is_spectator { "spectator" } else { "player" };
            match message {
                Some(notice) => format!("Joined lobby {} as {}: {}", lobby_id, role, notice),
                None => format!("Joined lobby {} as {}", lobby_id, role),
            }
        }
        ServerMessage::SessionRestored { lobby, player_id, .. } => {
            format!("Session restored in lobby {} as {}", lobby.id, player_id)
        }
        ServerMessage::SessionRestoreFailed { message } => {
            format!("Could not restore session: {}", message)
        }
        ServerMessage::PlayerJoined { player } => format!("{} joined", player.name),
        ServerMessage::PlayerLeft { player_id, .. } => format!("{} left", name(player_id)),
        ServerMessage::SpectatorJoined { spectator } => {
            format!("{} is watching", spectator.name)
        }
        ServerMessage::SpectatorLeft { spectator_id } => {
            format!("{} stopped watching", name(spectator_id))
        }
        ServerMessage::SpectatorModeChanged {
            player_id,
            is_spectator,
            ..
        } => {
            if *is_spectator {
                format!("{} is now spectating", name(player_id))
            } else {
                format!("{} is now playing", name(player_id))
            }
        }
        ServerMessage::SymbolClaimed {
            player_id, symbol, ..
        } => format!("{} claimed {}", name(player_id), symbol),
        ServerMessage::PlayerReadyChanged { player_id, ready } => {
            if *ready {
                format!("{} is ready", name(player_id))
            } else {
                format!("{} is not ready", name(player_id))
            }
        }
        ServerMessage::SettingsUpdated { settings } => format!(
            "Settings: win length {}, up to {} players",
            settings.win_length, settings.max_players
        ),
        ServerMessage::GameStarted { game } => {
            format!("Game started, {} goes first", name(&game.current_player))
        }
        ServerMessage::YourTurn { message } => message.clone(),
        ServerMessage::MoveMade {
            last_move,
            next_player,
            ..
        } => format!(
            "{} played ({}, {}), {} to move",
            last_move.symbol,
            last_move.x,
            last_move.y,
            name(next_player)
        ),
        ServerMessage::GameOver { winner, .. } => {
            format!("Game over! {} ({}) wins", winner.name, winner.symbol)
        }
    }
}
