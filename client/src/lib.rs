//! # Asteroids Game Client
//!
//! Thin client for the networked vector shooter. It sends key transitions and
//! aimed shots to the server, revives the snapshot document the server sends
//! each tick, and draws it. There is no local simulation: what is on screen is
//! always the last state the server published.
//!
//! ## Modules
//!
//! - [`game`]: the latest revived snapshot, connection state and audio sink
//! - [`input`]: per-frame key edge detection and input sequencing
//! - [`network`]: the UDP [`network::Session`] and its frame-loop handle
//! - [`rendering`]: macroquad implementation of [`shared::Renderer`]
//!
//! ## Frame loop
//!
//! ```rust,no_run
//! use client::game::{ClientGameState, LogSoundSink};
//! use client::input::{FrameInput, InputManager};
//! use client::network::Session;
//! use client::rendering::MacroquadRenderer;
//!
//! async fn play(runtime: &tokio::runtime::Runtime) -> Result<(), Box<dyn std::error::Error>> {
//!     let session = runtime.block_on(Session::connect("127.0.0.1:8080"))?;
//!     let mut handle = {
//!         let _guard = runtime.enter();
//!         session.spawn()
//!     };
//!
//!     let mut state = ClientGameState::new();
//!     let mut input = InputManager::new();
//!     let mut sounds = LogSoundSink;
//!     let mut renderer = MacroquadRenderer::new(state.field);
//!
//!     loop {
//!         for packet in handle.poll() {
//!             state.handle_packet(packet, &mut sounds);
//!         }
//!         for (sequence, event) in input.update(&FrameInput::capture(&state.field)) {
//!             handle.send_input(sequence, event);
//!         }
//!         renderer.set_field(state.field);
//!         state.render(&mut renderer);
//!         macroquad::window::next_frame().await;
//!     }
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
