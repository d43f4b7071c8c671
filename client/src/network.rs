use crate::input::{parse_command, Command, HELP};
use crate::mirror::LobbyMirror;
use crate::rendering::{describe, render_board, render_lobby};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, ServerMessage};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mirror: LobbyMirror,
}

impl Client {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _) = connect_async(url).await?;
        info!("Connected to {}", url);

        Ok(Client {
            ws,
            mirror: LobbyMirror::new(),
        })
    }

    pub fn mirror(&self) -> &LobbyMirror {
        &self.mirror
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = message.to_json()?;
        debug!("Sending {}", text);
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Waits for the next server message and folds it into the mirror.
    ///
    /// Returns `Ok(None)` once the server closes the connection.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        let message = self.next_message().await?;
        if let Some(message) = &message {
            self.mirror.apply(message);
        }
        Ok(message)
    }

    async fn next_message(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        while let Some(frame) = self.ws.next().await {
            match frame? {
                Message::Text(text) => match ServerMessage::from_json(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => warn!("Ignoring unreadable server message: {}", e),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Interactive loop: sends `startup` first, then relays typed commands
    /// and prints server events until the user quits or the server goes away.
    pub async fn run(mut self, startup: Vec<ClientMessage>) -> Result<(), ClientError> {
        for message in &startup {
            self.send(message).await?;
        }

        println!("{}", HELP);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_command(&line) {
                        Ok(Some(Command::Send(message))) => self.send(&message).await?,
                        Ok(Some(Command::ShowBoard)) => self.show_board(),
                        Ok(Some(Command::Help)) => println!("{}", HELP),
                        Ok(Some(Command::Quit)) => break,
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    }
                },

                message = self.next_message() => {
                    match message? {
                        Some(message) => self.show(&message),
                        None => {
                            println!("Server closed the connection");
                            return Ok(());
                        }
                    }
                },
            }
        }

        let _ = self.ws.close(None).await;
        Ok(())
    }

    fn show(&mut self, message: &ServerMessage) {
        println!("{}", describe(message, &self.mirror));
        self.mirror.apply(message);

        match message {
            ServerMessage::LobbyCreated { .. }
            | ServerMessage::LobbyJoined { .. }
            | ServerMessage::SessionRestored { .. } => {
                if let Some(lobby) = self.mirror.lobby() {
                    print!("{}", render_lobby(lobby));
                }
                self.show_board();
            }
            ServerMessage::GameStarted { .. }
            | ServerMessage::MoveMade { .. }
            | ServerMessage::GameOver { .. } => self.show_board(),
            _ => {}
        }
    }

    fn show_board(&self) {
        match self.mirror.game() {
            Some(game) => print!("{}", render_board(game)),
            None => println!("No game yet"),
        }
    }
}
