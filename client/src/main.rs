use clap::Parser;
use client::game::{ClientGameState, LogSoundSink};
use client::input::{FrameInput, InputManager};
use client::network::{Session, SessionHandle};
use client::rendering::MacroquadRenderer;
use log::info;
use macroquad::prelude::{is_key_pressed, KeyCode};
use macroquad::window::{next_frame, Conf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value_t = 640)]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value_t = 480)]
    height: i32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: arrows to steer and thrust, Space to fire, click to aim, Esc to quit");

    // The socket lives on the tokio runtime; macroquad owns the main thread
    let runtime = tokio::runtime::Runtime::new()?;
    let session = runtime.block_on(Session::connect(&args.server))?;
    let handle = {
        let _guard = runtime.enter();
        session.spawn()
    };

    let conf = Conf {
        window_title: "Asteroids".to_string(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, frame_loop(handle));

    runtime.shutdown_timeout(std::time::Duration::from_millis(200));
    Ok(())
}

async fn frame_loop(mut handle: SessionHandle) {
    let mut state = ClientGameState::new();
    let mut input = InputManager::new();
    let mut sounds = LogSoundSink;
    let mut renderer = MacroquadRenderer::new(state.field);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        for packet in handle.poll() {
            state.handle_packet(packet, &mut sounds);
        }
        if state.check_timeout(Instant::now()) {
            input.reset();
        }

        if state.client_id().is_some() {
            for (sequence, event) in input.update(&FrameInput::capture(&state.field)) {
                handle.send_input(sequence, event);
            }
        }

        renderer.set_field(state.field);
        state.render(&mut renderer);

        next_frame().await;
    }

    handle.disconnect();
    info!("Client shutting down");
}
