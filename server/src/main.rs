use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::network::Server;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "3000")]
    port: u16,
    /// Maximum number of simultaneous connections
    #[clap(short, long, default_value = "1024")]
    max_clients: usize,
}

/// Parses command-line arguments, then runs the lobby server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let server = Server::bind(&address, args.max_clients, StdRng::from_entropy()).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
