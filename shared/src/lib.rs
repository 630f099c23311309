//! Game model and wire format shared by the server and its clients
//!
//! The server runs the simulation on these types; clients receive snapshot
//! documents and revive them into the same types before drawing.

pub mod collision;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod protocol;
pub mod render;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use entity::{Asteroid, AsteroidSize, Bullet, Entity, EntityKind, Ship};
pub use error::{CodecError, GeometryError};
pub use geometry::{point_in_polygon, Polygon};
pub use protocol::{GameEvent, InputEvent, Key, Packet};
pub use render::Renderer;
pub use snapshot::{revive_snapshot, Snapshot, WireSnapshot};

pub const FIELD_WIDTH: f32 = 640.0;
pub const FIELD_HEIGHT: f32 = 480.0;
pub const TICK_RATE: u32 = 35;

pub const SHIP_SCALE: f32 = 2.0;
pub const SHIP_TURN_RATE: f32 = 0.09;
pub const SHIP_THRUST: f32 = 0.12;
pub const SHIP_MAX_SPEED: f32 = 6.0;
pub const SHIP_FRICTION: f32 = 0.99;
pub const SHIP_BRAKE: f32 = 0.9;

pub const BULLET_SPEED: f32 = 7.0;
pub const BULLET_TTL: u32 = 50;
pub const FIRE_COOLDOWN: u32 = 6;

pub const RESPAWN_DELAY: u32 = 70;
pub const STARTING_LIVES: u32 = 3;
pub const INITIAL_WAVE_SIZE: usize = 4;
pub const MAX_WAVE_SIZE: usize = 11;

pub const WRAP_MARGIN_FACTOR: f32 = 6.0;

pub const PROTOCOL_VERSION: u32 = 1;

/// Playfield bounds used for wrap-around, bullet expiry and rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

/// Length of one simulation tick at the given rate
pub fn tick_period(tick_rate: u32) -> std::time::Duration {
    std::time::Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64)
}
