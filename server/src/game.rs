//! Authoritative connect-N engine for a single game.
//!
//! The board is an unbounded sparse grid: only occupied cells are stored,
//! and coordinates can be any pair of `i64`s. Turn order is a random
//! permutation of the starting players, fixed for the whole game. The
//! engine does no I/O and knows nothing about connections; the router
//! decides who gets told about each outcome.

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Cell, GamePlayer, GameSnapshot, Move};
use std::collections::HashMap;
use thiserror::Error;

/// Line families scanned after every move, in precedence order:
/// horizontal, vertical, diagonal-down, diagonal-up.
const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Game already finished")]
    GameAlreadyFinished,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Cell already taken")]
    CellOccupied,
    #[error("A game needs at least one player")]
    NoPlayers,
    #[error("Win length must be at least 1")]
    InvalidWinLength,
}

/// Result of an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move completed a line; the game is now over.
    Won {
        winning_cells: Vec<Cell>,
        last_move: Move,
    },
    /// Play passes to `next_player`.
    Continue {
        next_player: String,
        last_move: Move,
    },
}

#[derive(Debug, Clone)]
pub struct Game {
    board: HashMap<Cell, String>,
    player_order: Vec<String>,
    current_player_index: usize,
    win_length: u32,
    winner: Option<String>,
    winning_cells: Vec<Cell>,
    move_count: u32,
    active_players: Vec<String>,
    players: Vec<GamePlayer>,
}

impl Game {
    /// Starts a game for `players`, shuffling them into a turn order.
    ///
    /// The shuffle is Fisher-Yates driven by `rng`, so a seeded generator
    /// reproduces the same order.
    pub fn new<R: Rng + ?Sized>(
        players: Vec<GamePlayer>,
        win_length: u32,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        if win_length == 0 {
            return Err(GameError::InvalidWinLength);
        }

        let active_players: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
        let mut player_order = active_players.clone();
        player_order.shuffle(rng);

        info!(
            "New game: {} players, win length {}, order {:?}",
            players.len(),
            win_length,
            player_order
        );

        Ok(Self {
            board: HashMap::new(),
            player_order,
            current_player_index: 0,
            win_length,
            winner: None,
            winning_cells: Vec::new(),
            move_count: 0,
            active_players,
            players,
        })
    }

    /// Places `symbol` at `(x, y)` for `player_id`.
    ///
    /// The caller is trusted to pass the player's own symbol; turn order is
    /// what keeps anyone else from moving. A rejected move leaves the game
    /// untouched.
    pub fn make_move(
        &mut self,
        player_id: &str,
        x: i64,
        y: i64,
        symbol: &str,
    ) -> Result<MoveOutcome, GameError> {
        if self.winner.is_some() {
            return Err(GameError::GameAlreadyFinished);
        }
        if self.current_player() != player_id {
            return Err(GameError::NotYourTurn);
        }

        let cell = Cell::new(x, y);
        if self.board.contains_key(&cell) {
            return Err(GameError::CellOccupied);
        }

        self.board.insert(cell, symbol.to_string());
        self.move_count += 1;

        let last_move = Move {
            x,
            y,
            symbol: symbol.to_string(),
        };

        if let Some(winning_cells) = self.check_win(cell, symbol) {
            self.winner = Some(player_id.to_string());
            self.winning_cells = winning_cells.clone();
            return Ok(MoveOutcome::Won {
                winning_cells,
                last_move,
            });
        }

        // Pure round-robin: absent players keep their slot
        self.current_player_index = (self.current_player_index + 1) % self.player_order.len();

        Ok(MoveOutcome::Continue {
            next_player: self.current_player().to_string(),
            last_move,
        })
    }

    /// Looks for a run of `win_length` through `cell` in each line family.
    ///
    /// Cells are returned in line order: negative-direction matches first,
    /// then the placed cell, then positive-direction matches.
    fn check_win(&self, cell: Cell, symbol: &str) -> Option<Vec<Cell>> {
        let reach = i64::from(self.win_length) - 1;

        for (dx, dy) in DIRECTIONS {
            let forward = self.run_length(cell, dx, dy, reach, symbol);
            let backward = self.run_length(cell, -dx, -dy, reach, symbol);

            if (1 + forward + backward) as u32 >= self.win_length {
                let mut cells = Vec::with_capacity(1 + forward + backward);
                for step in (1..=backward as i64).rev() {
                    cells.extend(cell.offset(-dx, -dy, step));
                }
                cells.push(cell);
                for step in 1..=forward as i64 {
                    cells.extend(cell.offset(dx, dy, step));
                }
                return Some(cells);
            }
        }

        None
    }

    /// Counts consecutive `symbol` cells after `cell` along `(dx, dy)`, up to `reach`.
    fn run_length(&self, cell: Cell, dx: i64, dy: i64, reach: i64, symbol: &str) -> usize {
        let mut count = 0;
        for step in 1..=reach {
            let matches = cell
                .offset(dx, dy, step)
                .and_then(|next| self.board.get(&next))
                .is_some_and(|s| s == symbol);
            if !matches {
                break;
            }
            count += 1;
        }
        count
    }

    /// Id of the player whose turn it is.
    ///
    /// After a win this stays on the winner.
    pub fn current_player(&self) -> &str {
        &self.player_order[self.current_player_index]
    }

    /// Symbol the current player places
    pub fn current_symbol(&self) -> Option<&str> {
        self.symbol_of(self.current_player())
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    /// Symbol the player had when the game started
    pub fn symbol_of(&self, player_id: &str) -> Option<&str> {
        self.game_player(player_id).map(|p| p.symbol.as_str())
    }

    pub fn game_player(&self, player_id: &str) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Whether `player_id` was one of the players when the game started
    pub fn is_active_player(&self, player_id: &str) -> bool {
        self.active_players.iter().any(|id| id == player_id)
    }

    /// A game finishes only when someone wins
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// The line that decided the game, empty until then
    pub fn winning_cells(&self) -> &[Cell] {
        &self.winning_cells
    }

    /// Turn order fixed at the start of the game
    pub fn player_order(&self) -> &[String] {
        &self.player_order
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn win_length(&self) -> u32 {
        self.win_length
    }

    /// Symbol at `(x, y)`, if that cell has been played
    pub fn cell(&self, x: i64, y: i64) -> Option<&str> {
        self.board.get(&Cell::new(x, y)).map(String::as_str)
    }

    /// Serializable view of the whole game as sent to clients
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            current_player: self.current_player().to_string(),
            current_symbol: self.current_symbol().map(str::to_string),
            board: self
                .board
                .iter()
                .map(|(cell, symbol)| (*cell, symbol.clone()))
                .collect(),
            move_count: self.move_count,
            winner: self.winner.clone(),
            player_order: self.player_order.clone(),
            winning_cells: self.winning_cells.iter().map(|c| c.to_pair()).collect(),
            win_length: self.win_length,
            active_players: self.active_players.clone(),
            players: self.players.clone(),
        }
    }
}
