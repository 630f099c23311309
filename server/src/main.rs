use clap::Parser;
use log::info;
use server::network::Server;
use shared::{tick_period, Field, FIELD_HEIGHT, FIELD_WIDTH, TICK_RATE};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = TICK_RATE)]
    tick_rate: u32,

    /// Maximum number of connected players
    #[arg(short, long, default_value_t = 8)]
    max_clients: usize,

    /// Playfield width in pixels
    #[arg(long, default_value_t = FIELD_WIDTH)]
    width: f32,

    /// Playfield height in pixels
    #[arg(long, default_value_t = FIELD_HEIGHT)]
    height: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    info!(
        "Starting server on {} at {} Hz, up to {} players",
        addr, args.tick_rate, args.max_clients
    );

    let mut server = Server::new(
        &addr,
        tick_period(args.tick_rate),
        args.max_clients,
        Field::new(args.width, args.height),
    )
    .await?;

    server.run().await
}
