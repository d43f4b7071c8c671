//! Terminal command parsing
//!
//! Each line typed by the user becomes either a [`ClientMessage`] for the
//! server or a local action such as redrawing the board.

use shared::ClientMessage;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  create <name> [winLength] [maxPlayers]   open a new lobby
  join <lobby> <name>                      join a lobby as a player
  watch <lobby> <name>                     join a lobby as a spectator
  restore <lobby> <playerId>               resume an earlier session
  id <playerId>                            choose the identity to play as
  symbol <symbol>                          claim a symbol
  ready                                    toggle ready
  spectate                                 switch between player and spectator
  settings <winLength|-> <maxPlayers|->    change lobby settings (leader)
  start                                    start the game (leader)
  move <x> <y>                             place your symbol
  board                                    show the board
  help                                     show this text
  quit                                     leave";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),
    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("Too many arguments for '{0}'")]
    TooManyArguments(&'static str),
    #[error("'{0}' is not of the form LOBBY:PLAYER")]
    InvalidSession(String),
}

/// What a line of input asks the client to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(ClientMessage),
    ShowBoard,
    Help,
    Quit,
}

/// Parses one input line; blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let verb = head.to_lowercase();
    let command = match verb.as_str() {
        "create" => {
            let [name, rest @ ..] = args.as_slice() else {
                return Err(missing("create", "name"));
            };
            if rest.len() > 2 {
                return Err(InputError::TooManyArguments("create"));
            }
            Command::Send(ClientMessage::CreateLobby {
                username: name.to_string(),
                win_length: rest.first().map(|v| parse_number(v)).transpose()?,
                max_players: rest.get(1).map(|v| parse_number(v)).transpose()?,
            })
        }
        "join" | "watch" => {
            let as_spectator = verb == "watch";
            let command = if as_spectator { "watch" } else { "join" };
            let (lobby_id, username) = two_words(command, &args, "lobby code", "name")?;
            Command::Send(ClientMessage::JoinLobby {
                lobby_id: lobby_id.to_uppercase(),
                username: username.to_string(),
                as_spectator,
            })
        }
        "restore" => {
            let (lobby_id, player_id) = two_words("restore", &args, "lobby code", "player id")?;
            Command::Send(ClientMessage::RestoreSession {
                lobby_id: lobby_id.to_uppercase(),
                player_id: player_id.to_string(),
            })
        }
        "id" => Command::Send(ClientMessage::SetPlayerId {
            player_id: one_word("id", &args, "player id")?.to_string(),
        }),
        "symbol" => Command::Send(ClientMessage::ClaimSymbol {
            symbol: one_word("symbol", &args, "symbol")?.to_string(),
        }),
        "ready" => no_args("ready", &args, ClientMessage::ToggleReady {})?,
        "spectate" => no_args("spectate", &args, ClientMessage::ToggleSpectator {})?,
        "start" => no_args("start", &args, ClientMessage::StartGame {})?,
        "settings" => {
            let (win_length, max_players) =
                two_words("settings", &args, "win length", "player limit")?;
            Command::Send(ClientMessage::UpdateSettings {
                win_length: optional_number(win_length)?,
                max_players: optional_number(max_players)?,
            })
        }
        "move" => {
            let (x, y) = two_words("move", &args, "x coordinate", "y coordinate")?;
            Command::Send(ClientMessage::MakeMove {
                x: parse_number(x)?,
                y: parse_number(y)?,
            })
        }
        "board" => Command::ShowBoard,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(InputError::UnknownCommand(head.to_string())),
    };

    Ok(Some(command))
}

/// Splits a `LOBBY:PLAYER` pair as given to `--restore`
pub fn parse_session(value: &str) -> Result<(String, String), InputError> {
    match value.split_once(':') {
        Some((lobby_id, player_id)) if !lobby_id.is_empty() && !player_id.is_empty() => {
            Ok((lobby_id.to_uppercase(), player_id.to_string()))
        }
        _ => Err(InputError::InvalidSession(value.to_string())),
    }
}

fn missing(command: &'static str, argument: &'static str) -> InputError {
    InputError::MissingArgument { command, argument }
}

fn one_word<'a>(
    command: &'static str,
    args: &[&'a str],
    argument: &'static str,
) -> Result<&'a str, InputError> {
    match args {
        [] => Err(missing(command, argument)),
        [word] => Ok(*word),
        _ => Err(InputError::TooManyArguments(command)),
    }
}

fn two_words<'a>(
    command: &'static str,
    args: &[&'a str],
    first: &'static str,
    second: &'static str,
) -> Result<(&'a str, &'a str), InputError> {
    match args {
        [] => Err(missing(command, first)),
        [_] => Err(missing(command, second)),
        [a, b] => Ok((*a, *b)),
        _ => Err(InputError::TooManyArguments(command)),
    }
}

fn no_args(
    command: &'static str,
    args: &[&str],
    message: ClientMessage,
) -> Result<Command, InputError> {
    if args.is_empty() {
        Ok(Command::Send(message))
    } else {
        Err(InputError::TooManyArguments(command))
    }
}

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, InputError> {
    word.parse()
        .map_err(|_| InputError::InvalidNumber(word.to_string()))
}

/// `-` leaves a setting unchanged
fn optional_number(word: &str) -> Result<Option<u32>, InputError> {
    if word == "-" {
        Ok(None)
    } else {
        parse_number(word).map(Some)
    }
}
