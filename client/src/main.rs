use clap::Parser;
use client::input::parse_session;
use client::network::Client;
use log::info;
use shared::ClientMessage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the lobby server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Identity to play as; the server assigns one if omitted
    #[arg(short = 'i', long)]
    player_id: Option<String>,

    /// Resume an earlier session, given as LOBBY:PLAYER
    #[arg(short = 'r', long, value_parser = parse_session)]
    restore: Option<(String, String)>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut startup = Vec::new();
    if let Some(player_id) = args.player_id {
        startup.push(ClientMessage::SetPlayerId { player_id });
    }
    if let Some((lobby_id, player_id)) = args.restore {
        info!("Restoring session {} in lobby {}", player_id, lobby_id);
        startup.push(ClientMessage::RestoreSession {
            lobby_id,
            player_id,
        });
    }

    info!("Connecting to: {}", args.server);
    let client = Client::connect(&args.server).await?;
    client.run(startup).await?;

    Ok(())
}
