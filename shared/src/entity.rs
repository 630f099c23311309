//! Ships, bullets and asteroids: positioned polygons with per-tick motion
//!
//! Every entity keeps its outline in local coordinates and its world position
//! separately. Motion is integrated once per tick with velocities expressed in
//! pixels per tick, so the simulation has no delta-time input.

use crate::geometry::Polygon;
use crate::{
    Field, BULLET_SPEED, BULLET_TTL, SHIP_BRAKE, SHIP_FRICTION, SHIP_MAX_SPEED, SHIP_SCALE,
    SHIP_THRUST, WRAP_MARGIN_FACTOR,
};
use rand::Rng;
use std::f32::consts::TAU;

/// Ship outline, nose pointing along +x
pub const SHIP_POINTS: [f32; 8] = [6.0, 0.0, -3.0, -3.0, -2.0, 0.0, -3.0, 3.0];

/// Exhaust flame drawn behind the ship while thrusting
pub const FLAME_POINTS: [f32; 8] = [-2.0, 0.0, -3.0, -1.0, -5.0, 0.0, -3.0, 1.0];

/// Unit asteroid outlines, scaled by the size class at spawn
pub const ASTEROID_TEMPLATES: [&[f32]; 5] = [
    &[
        -4.0, -2.0, -2.0, -4.0, 0.0, -2.0, 2.0, -4.0, 4.0, -2.0, 3.0, 0.0, 4.0, 2.0, 1.0, 4.0,
        -2.0, 4.0, -4.0, 2.0,
    ],
    &[
        -3.0, 0.0, -4.0, -2.0, -2.0, -4.0, 0.0, -3.0, 2.0, -4.0, 4.0, -2.0, 2.0, -1.0, 4.0, 1.0,
        2.0, 4.0, -1.0, 3.0, -2.0, 4.0, -4.0, 2.0,
    ],
    &[
        -2.0, 0.0, -4.0, -1.0, -1.0, -4.0, 2.0, -4.0, 4.0, -1.0, 4.0, 1.0, 2.0, 4.0, 0.0, 4.0,
        0.0, 1.0, -2.0, 4.0, -4.0, 1.0,
    ],
    &[
        -1.0, -2.0, -2.0, -4.0, 1.0, -4.0, 4.0, -2.0, 4.0, -1.0, 1.0, 0.0, 4.0, 2.0, 2.0, 4.0,
        1.0, 3.0, -2.0, 4.0, -4.0, 1.0, -4.0, -2.0,
    ],
    &[
        -4.0, -2.0, -2.0, -4.0, 2.0, -4.0, 4.0, -2.0, 4.0, 2.0, 2.0, 4.0, -2.0, 4.0, -4.0, 2.0,
    ],
];

const fn is_outline(points: &[f32]) -> bool {
    points.len() % 2 == 0 && points.len() >= 6
}

// Every built-in table must satisfy the polygon invariant
const _: () = {
    assert!(is_outline(&SHIP_POINTS));
    assert!(is_outline(&FLAME_POINTS));
    let mut i = 0;
    while i < ASTEROID_TEMPLATES.len() {
        assert!(is_outline(ASTEROID_TEMPLATES[i]));
        i += 1;
    }
};

/// Discriminant carried by every entity and every wire record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ship,
    Bullet,
    Asteroid,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Ship => "ship",
            EntityKind::Bullet => "bullet",
            EntityKind::Asteroid => "asteroid",
        }
    }
}

/// Asteroid size tier
///
/// The tier (3/2/1) is what travels on the wire; the scale factor (8/4/2)
/// sizes the outline, sets the wrap margin and doubles as the explosion code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    pub fn from_tier(tier: u8) -> Option<Self> {
        match tier {
            1 => Some(AsteroidSize::Small),
            2 => Some(AsteroidSize::Medium),
            3 => Some(AsteroidSize::Large),
            _ => None,
        }
    }

    pub fn tier(self) -> u8 {
        match self {
            AsteroidSize::Small => 1,
            AsteroidSize::Medium => 2,
            AsteroidSize::Large => 3,
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            AsteroidSize::Small => 2.0,
            AsteroidSize::Medium => 4.0,
            AsteroidSize::Large => 8.0,
        }
    }

    /// Score awarded for shooting an asteroid of this size
    pub fn points(self) -> u32 {
        match self {
            AsteroidSize::Small => 100,
            AsteroidSize::Medium => 50,
            AsteroidSize::Large => 20,
        }
    }

    /// Explosion sound code: 8 large, 4 medium, 2 small
    pub fn explosion_code(self) -> u8 {
        self.scale() as u8
    }

    /// Size of the two fragments left behind, if any
    pub fn smaller(self) -> Option<Self> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

/// Toroidal wrap for one coordinate
///
/// The `WRAP_MARGIN_FACTOR * size` margin lets a shape leave the field
/// completely before it re-enters from the opposite edge.
pub fn wrap_coordinate(value: f32, max: f32, size: f32) -> f32 {
    let margin = WRAP_MARGIN_FACTOR * size;

    if value > max + margin {
        -margin
    } else if value < -margin {
        max + margin
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub polygon: Polygon,
    pub flames: Polygon,
    pub x: f32,
    pub y: f32,
    /// Radians, 0 points along +x
    pub heading: f32,
    pub vx: f32,
    pub vy: f32,
    pub alive: bool,
    /// Set while thrust is applied this tick; draws the flames
    pub thrusting: bool,
}

impl Ship {
    pub fn new(x: f32, y: f32) -> Self {
        let mut polygon = Polygon::from_template(&SHIP_POINTS);
        let mut flames = Polygon::from_template(&FLAME_POINTS);
        polygon.scale(SHIP_SCALE);
        flames.scale(SHIP_SCALE);

        Self {
            polygon,
            flames,
            x,
            y,
            heading: 0.0,
            vx: 0.0,
            vy: 0.0,
            alive: true,
            thrusting: false,
        }
    }

    /// Rotates heading and outline together
    pub fn turn(&mut self, delta: f32) {
        self.heading = (self.heading + delta).rem_euclid(TAU);
        self.polygon.rotate(delta);
        self.flames.rotate(delta);
    }

    /// Accelerates along the heading, clamped to the maximum speed
    pub fn thrust(&mut self) {
        self.vx += SHIP_THRUST * self.heading.cos();
        self.vy += SHIP_THRUST * self.heading.sin();
        self.thrusting = true;

        let speed = self.speed();
        if speed > SHIP_MAX_SPEED {
            self.vx *= SHIP_MAX_SPEED / speed;
            self.vy *= SHIP_MAX_SPEED / speed;
        }
    }

    pub fn brake(&mut self) {
        self.vx *= SHIP_BRAKE;
        self.vy *= SHIP_BRAKE;
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn update(&mut self, field: &Field) {
        self.x += self.vx;
        self.y += self.vy;
        self.vx *= SHIP_FRICTION;
        self.vy *= SHIP_FRICTION;

        self.x = wrap_coordinate(self.x, field.width, SHIP_SCALE);
        self.y = wrap_coordinate(self.y, field.height, SHIP_SCALE);
    }

    /// World position of the ship's nose, where bullets leave
    pub fn nose(&self) -> (f32, f32) {
        let (nx, ny) = (self.polygon.points()[0], self.polygon.points()[1]);
        (self.x + nx, self.y + ny)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    /// Player credited when this bullet scores
    pub owner: u32,
    pub x: f32,
    pub y: f32,
    pub prevx: f32,
    pub prevy: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining lifetime in ticks
    pub ttl: u32,
}

impl Bullet {
    pub fn new(owner: u32, x: f32, y: f32, direction: f32) -> Self {
        Self {
            owner,
            x,
            y,
            prevx: x,
            prevy: y,
            vx: BULLET_SPEED * direction.cos(),
            vy: BULLET_SPEED * direction.sin(),
            ttl: BULLET_TTL,
        }
    }

    pub fn update(&mut self) {
        self.prevx = self.x;
        self.prevy = self.y;
        self.x += self.vx;
        self.y += self.vy;
        self.ttl = self.ttl.saturating_sub(1);
    }

    /// Bullets do not wrap; they die at the field edge or when ttl runs out
    pub fn is_expired(&self, field: &Field) -> bool {
        self.ttl == 0
            || !self.x.is_finite()
            || !self.y.is_finite()
            || self.x < 0.0
            || self.x > field.width
            || self.y < 0.0
            || self.y > field.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub polygon: Polygon,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Radians added to the outline every tick
    pub rotation_speed: f32,
    pub size: AsteroidSize,
    pub visible: bool,
}

impl Asteroid {
    /// Random outline, heading, speed and spin at the given position
    pub fn new<R: Rng + ?Sized>(size: AsteroidSize, x: f32, y: f32, rng: &mut R) -> Self {
        let template = ASTEROID_TEMPLATES[rng.gen_range(0..ASTEROID_TEMPLATES.len())];
        let mut polygon = Polygon::from_template(template);
        polygon.scale(size.scale());

        let direction = TAU * rng.gen::<f32>();
        let speed = rng.gen::<f32>() + 1.0;

        Self {
            polygon,
            x,
            y,
            vx: speed * direction.cos(),
            vy: speed * direction.sin(),
            rotation_speed: 0.02 * (rng.gen::<f32>() + 1.0),
            size,
            visible: true,
        }
    }

    pub fn update(&mut self, field: &Field) {
        self.x += self.vx;
        self.y += self.vy;

        let size = self.size.scale();
        self.x = wrap_coordinate(self.x, field.width, size);
        self.y = wrap_coordinate(self.y, field.height, size);

        self.polygon.rotate(self.rotation_speed);
    }
}

/// Any revived entity, tagged with its kind
///
/// Behavior that differs per kind (drawing, kind reporting) dispatches on this
/// enum rather than through a shared base type.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Ship(Ship),
    Bullet(Bullet),
    Asteroid(Asteroid),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Ship(_) => EntityKind::Ship,
            Entity::Bullet(_) => EntityKind::Bullet,
            Entity::Asteroid(_) => EntityKind::Asteroid,
        }
    }
}
