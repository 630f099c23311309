//! Pairwise hit-testing between bullets, ships and asteroids
//!
//! Detection only reports overlaps. Deciding what an overlap does (scoring,
//! splitting, losing a life) belongs to the simulation that owns the entities.

use crate::entity::{Asteroid, Bullet, Ship};

/// One overlap found during a tick, by index into the caller's collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    BulletAsteroid { bullet: usize, asteroid: usize },
    ShipAsteroid { player: u32, asteroid: usize },
}

/// Bullets are treated as points: only the tip is tested
pub fn bullet_hits(bullet: &Bullet, asteroid: &Asteroid) -> bool {
    asteroid
        .polygon
        .contains(asteroid.x, asteroid.y, bullet.x, bullet.y)
}

/// Polygon overlap by sampling vertices in both directions
///
/// A ship vertex inside the asteroid or an asteroid vertex inside the ship
/// counts as a hit. Edge-only crossings with no vertex inside either shape
/// are missed; both outlines are dense enough for that not to matter at
/// per-tick speeds.
pub fn ship_hits(ship: &Ship, asteroid: &Asteroid) -> bool {
    let ship_in_asteroid = ship.polygon.vertices().any(|(vx, vy)| {
        asteroid
            .polygon
            .contains(asteroid.x, asteroid.y, ship.x + vx, ship.y + vy)
    });

    ship_in_asteroid
        || asteroid.polygon.vertices().any(|(vx, vy)| {
            ship.polygon
                .contains(ship.x, ship.y, asteroid.x + vx, asteroid.y + vy)
        })
}

/// Reports every bullet/asteroid and ship/asteroid overlap
///
/// Dead ships and hidden asteroids are ignored. Output order is bullets in
/// order against asteroids in order, then ships in the order given.
pub fn detect<'a, I>(ships: I, bullets: &[Bullet], asteroids: &[Asteroid]) -> Vec<Collision>
where
    I: IntoIterator<Item = (u32, &'a Ship)>,
{
    let mut collisions = Vec::new();

    for (bullet_index, bullet) in bullets.iter().enumerate() {
        for (asteroid_index, asteroid) in asteroids.iter().enumerate() {
            if asteroid.visible && bullet_hits(bullet, asteroid) {
                collisions.push(Collision::BulletAsteroid {
                    bullet: bullet_index,
                    asteroid: asteroid_index,
                });
            }
        }
    }

    for (player, ship) in ships {
        if !ship.alive {
            continue;
        }
        for (asteroid_index, asteroid) in asteroids.iter().enumerate() {
            if asteroid.visible && ship_hits(ship, asteroid) {
                collisions.push(Collision::ShipAsteroid {
                    player,
                    asteroid: asteroid_index,
                });
            }
        }
    }

    collisions
}
