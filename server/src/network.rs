//! Server network layer handling WebSocket connections and the event loop

use crate::client_manager::ConnectionId;
use crate::router::Router;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use shared::ServerMessage;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Events sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    /// A socket finished its handshake; the loop answers with its id, or
    /// `None` if the server is full.
    Connected {
        sender: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    Message {
        conn: ConnectionId,
        text: String,
    },
    Disconnected {
        conn: ConnectionId,
    },
}

/// Accepts WebSocket clients and feeds their frames to a single [`Router`]
pub struct Server {
    listener: TcpListener,
    router: Router,

    // Communication channels
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(addr: &str, max_clients: usize, rng: StdRng) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            router: Router::new(max_clients, rng),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Main server loop: accepts sockets and applies their events in order
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!("Accepted TCP connection from {}", addr);
                            spawn_connection(stream, addr, self.event_tx.clone());
                        }
                        Err(e) => warn!("Failed to accept connection: {}", e),
                    }
                },

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected { sender, reply } => {
                let conn = self.router.connect(sender);
                if reply.send(conn).is_err() {
                    // The socket went away during registration
                    if let Some(conn) = conn {
                        self.router.disconnect(conn);
                    }
                }
            }
            ServerEvent::Message { conn, text } => self.router.handle_text(conn, &text),
            ServerEvent::Disconnected { conn } => self.router.disconnect(conn),
        }
    }
}

fn spawn_connection(
    stream: TcpStream,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    tokio::spawn(async move {
        if let Err(e) = serve_connection(stream, addr, events).await {
            warn!("Connection from {} ended with an error: {}", addr, e);
        }
    });
}

/// Runs one client connection to completion.
///
/// Outbound messages are drained by a writer task. The writer stops once the
/// router drops the connection's sender, closing the socket behind it.
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<ServerEvent>,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (reply_tx, reply_rx) = oneshot::channel();

    if events
        .send(ServerEvent::Connected {
            sender: msg_tx,
            reply: reply_tx,
        })
        .is_err()
    {
        return Ok(());
    }

    let writer = tokio::spawn(async move {
        while let Some(message) = msg_rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let conn = match reply_rx.await {
        Ok(Some(conn)) => conn,
        _ => {
            info!("Turned away connection from {}", addr);
            let _ = writer.await;
            return Ok(());
        }
    };
    debug!("Connection {} established from {}", conn, addr);

    let result = read_frames(conn, &mut ws_receiver, &events).await;
    let _ = events.send(ServerEvent::Disconnected { conn });
    result
}

async fn read_frames(
    conn: ConnectionId,
    receiver: &mut SplitStream<WebSocketStream<TcpStream>>,
    events: &mpsc::UnboundedSender<ServerEvent>,
) -> Result<(), ServerError> {
    while let Some(frame) = receiver.next().await {
        match frame? {
            Message::Text(text) => {
                if events.send(ServerEvent::Message { conn, text }).is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Binary(_) => debug!("Ignoring binary frame from {}", conn),
            _ => {}
        }
    }
    Ok(())
}
