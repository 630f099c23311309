//! # Asteroids Game Server
//!
//! Authoritative server for the networked vector shooter. It owns the only
//! copy of the world, advances it at a fixed tick rate and sends every client
//! a snapshot addressed to it after each tick.
//!
//! ## Modules
//!
//! - [`client_manager`]: sessions, held-key tracking, input queues, timeouts
//! - [`game`]: the [`game::World`] simulation (ships, bullets, asteroids, waves)
//! - [`network`]: UDP transport and the tick loop driving the world
//!
//! ## Tick loop
//!
//! Packets are received on a separate task and only enqueued. On each tick the
//! main loop drains the queued inputs into the world, calls
//! [`game::World::step`], encodes one snapshot document per client and
//! broadcasts any explosion or fire-sound events. A slow tick delays the next
//! one rather than bursting to catch up.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::Field;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         shared::tick_period(shared::TICK_RATE),
//!         8,
//!         Field::default(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
