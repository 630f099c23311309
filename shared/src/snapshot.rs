//! Snapshot documents and their revival into typed entities
//!
//! The server captures the world into a [`WireSnapshot`] of plain records and
//! encodes it as JSON. A client decodes the document and calls
//! [`revive_snapshot`], which checks every record's `kind` tag against the
//! slot it sits in and builds real [`Ship`], [`Bullet`] and [`Asteroid`]
//! values. Nothing is drawn from unrevived records.

use crate::entity::{Asteroid, AsteroidSize, Bullet, Entity, EntityKind, Ship};
use crate::error::CodecError;
use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};

/// Top-level fields a document must have to count as a snapshot
const REQUIRED_FIELDS: [&str; 5] = ["score", "lives", "ship", "bullets", "asteroids"];

/// One entity on the wire, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRecord {
    Ship(ShipRecord),
    Bullet(BulletRecord),
    Asteroid(AsteroidRecord),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Ship(_) => EntityKind::Ship,
            EntityRecord::Bullet(_) => EntityKind::Bullet,
            EntityRecord::Asteroid(_) => EntityKind::Asteroid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub vx: f32,
    pub vy: f32,
    pub alive: bool,
    pub thrusting: bool,
    pub points: Vec<f32>,
    pub flames: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletRecord {
    pub owner: u32,
    pub x: f32,
    pub y: f32,
    pub prevx: f32,
    pub prevy: f32,
    pub vx: f32,
    pub vy: f32,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsteroidRecord {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub rotation_speed: f32,
    /// Size tier: 3 large, 2 medium, 1 small
    pub size: u8,
    pub visible: bool,
    pub points: Vec<f32>,
}

impl From<&Ship> for EntityRecord {
    fn from(ship: &Ship) -> Self {
        EntityRecord::Ship(ShipRecord {
            x: ship.x,
            y: ship.y,
            heading: ship.heading,
            vx: ship.vx,
            vy: ship.vy,
            alive: ship.alive,
            thrusting: ship.thrusting,
            points: ship.polygon.points().to_vec(),
            flames: ship.flames.points().to_vec(),
        })
    }
}

impl From<&Bullet> for EntityRecord {
    fn from(bullet: &Bullet) -> Self {
        EntityRecord::Bullet(BulletRecord {
            owner: bullet.owner,
            x: bullet.x,
            y: bullet.y,
            prevx: bullet.prevx,
            prevy: bullet.prevy,
            vx: bullet.vx,
            vy: bullet.vy,
            ttl: bullet.ttl,
        })
    }
}

impl From<&Asteroid> for EntityRecord {
    fn from(asteroid: &Asteroid) -> Self {
        EntityRecord::Asteroid(AsteroidRecord {
            x: asteroid.x,
            y: asteroid.y,
            vx: asteroid.vx,
            vy: asteroid.vy,
            rotation_speed: asteroid.rotation_speed,
            size: asteroid.size.tier(),
            visible: asteroid.visible,
            points: asteroid.polygon.points().to_vec(),
        })
    }
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        match entity {
            Entity::Ship(ship) => ship.into(),
            Entity::Bullet(bullet) => bullet.into(),
            Entity::Asteroid(asteroid) => asteroid.into(),
        }
    }
}

/// World state at one tick as addressed to one player
///
/// `score`, `lives`, `game_over` and `ship` belong to the recipient; `ships`
/// holds everyone else's ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSnapshot {
    #[serde(default)]
    pub tick: u32,
    pub score: u32,
    pub lives: u32,
    #[serde(default)]
    pub game_over: bool,
    pub ship: EntityRecord,
    #[serde(default)]
    pub ships: Vec<EntityRecord>,
    pub bullets: Vec<EntityRecord>,
    pub asteroids: Vec<EntityRecord>,
}

/// Revived snapshot holding behavior-bearing entities
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u32,
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
    pub ship: Ship,
    pub ships: Vec<Ship>,
    pub bullets: Vec<Bullet>,
    pub asteroids: Vec<Asteroid>,
}

impl Snapshot {
    /// Back to plain records, the inverse of [`revive_snapshot`]
    pub fn to_wire(&self) -> WireSnapshot {
        WireSnapshot {
            tick: self.tick,
            score: self.score,
            lives: self.lives,
            game_over: self.game_over,
            ship: (&self.ship).into(),
            ships: self.ships.iter().map(EntityRecord::from).collect(),
            bullets: self.bullets.iter().map(EntityRecord::from).collect(),
            asteroids: self.asteroids.iter().map(EntityRecord::from).collect(),
        }
    }

    /// Every entity in draw order: bullets, asteroids, other ships, own ship
    pub fn entities(&self) -> Vec<Entity> {
        self.bullets
            .iter()
            .cloned()
            .map(Entity::Bullet)
            .chain(self.asteroids.iter().cloned().map(Entity::Asteroid))
            .chain(self.ships.iter().cloned().map(Entity::Ship))
            .chain(std::iter::once(Entity::Ship(self.ship.clone())))
            .collect()
    }
}

pub fn encode(snapshot: &WireSnapshot) -> Result<String, CodecError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Parses a snapshot document
///
/// A well-formed JSON value without the snapshot fields yields
/// [`CodecError::NotASnapshot`] so callers can simply wait for the next one.
pub fn decode(document: &str) -> Result<WireSnapshot, CodecError> {
    let value: serde_json::Value = serde_json::from_str(document)?;

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| value.get(**field).is_none()) {
        return Err(CodecError::NotASnapshot(format!("missing `{}`", missing)));
    }

    Ok(serde_json::from_value(value)?)
}

/// Builds the typed entity a record describes
pub fn revive_entity(record: EntityRecord) -> Result<Entity, CodecError> {
    match record {
        EntityRecord::Ship(ship) => {
            let polygon = revive_polygon(EntityKind::Ship, ship.points)?;
            let flames = revive_polygon(EntityKind::Ship, ship.flames)?;
            Ok(Entity::Ship(Ship {
                polygon,
                flames,
                x: ship.x,
                y: ship.y,
                heading: ship.heading,
                vx: ship.vx,
                vy: ship.vy,
                alive: ship.alive,
                thrusting: ship.thrusting,
            }))
        }
        EntityRecord::Bullet(bullet) => Ok(Entity::Bullet(Bullet {
            owner: bullet.owner,
            x: bullet.x,
            y: bullet.y,
            prevx: bullet.prevx,
            prevy: bullet.prevy,
            vx: bullet.vx,
            vy: bullet.vy,
            ttl: bullet.ttl,
        })),
        EntityRecord::Asteroid(asteroid) => {
            let size = AsteroidSize::from_tier(asteroid.size)
                .ok_or(CodecError::UnknownSize(asteroid.size))?;
            let polygon = revive_polygon(EntityKind::Asteroid, asteroid.points)?;
            Ok(Entity::Asteroid(Asteroid {
                polygon,
                x: asteroid.x,
                y: asteroid.y,
                vx: asteroid.vx,
                vy: asteroid.vy,
                rotation_speed: asteroid.rotation_speed,
                size,
                visible: asteroid.visible,
            }))
        }
    }
}

/// Revives a decoded snapshot, rejecting any record in the wrong slot
pub fn revive_snapshot(wire: WireSnapshot) -> Result<Snapshot, CodecError> {
    let ship = revive_ship("ship", wire.ship)?;

    let ships = wire
        .ships
        .into_iter()
        .map(|record| revive_ship("ships", record))
        .collect::<Result<Vec<_>, _>>()?;

    let bullets = wire
        .bullets
        .into_iter()
        .map(|record| -> Result<Bullet, CodecError> {
            match revive_entity(record)? {
                Entity::Bullet(bullet) => Ok(bullet),
                other => Err(mismatch("bullets", EntityKind::Bullet, other.kind())),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let asteroids = wire
        .asteroids
        .into_iter()
        .map(|record| -> Result<Asteroid, CodecError> {
            match revive_entity(record)? {
                Entity::Asteroid(asteroid) => Ok(asteroid),
                other => Err(mismatch("asteroids", EntityKind::Asteroid, other.kind())),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot {
        tick: wire.tick,
        score: wire.score,
        lives: wire.lives,
        game_over: wire.game_over,
        ship,
        ships,
        bullets,
        asteroids,
    })
}

fn revive_ship(slot: &'static str, record: EntityRecord) -> Result<Ship, CodecError> {
    match revive_entity(record)? {
        Entity::Ship(ship) => Ok(ship),
        other => Err(mismatch(slot, EntityKind::Ship, other.kind())),
    }
}

fn revive_polygon(kind: EntityKind, points: Vec<f32>) -> Result<Polygon, CodecError> {
    Polygon::new(points).map_err(|source| CodecError::InvalidPolygon {
        kind: kind.name(),
        source,
    })
}

fn mismatch(slot: &'static str, expected: EntityKind, found: EntityKind) -> CodecError {
    CodecError::KindMismatch {
        slot,
        expected: expected.name(),
        found: found.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_wire() -> WireSnapshot {
        let ship = Ship::new(320.0, 240.0);

        let mut bullet = Bullet::new(1, 100.0, 50.0, 0.3);
        bullet.prevx = 95.0;
        bullet.prevy = 48.0;

        let mut rng = StdRng::seed_from_u64(11);
        let asteroid = Asteroid::new(AsteroidSize::Large, 10.0, 10.0, &mut rng);

        WireSnapshot {
            tick: 5,
            score: 10,
            lives: 3,
            game_over: false,
            ship: (&ship).into(),
            ships: vec![(&Ship::new(50.0, 60.0)).into()],
            bullets: vec![(&bullet).into()],
            asteroids: vec![(&asteroid).into()],
        }
    }

    #[test]
    fn test_encode_decode_revive_reencode_is_identical() {
        let document = encode(&sample_wire()).unwrap();

        let revived = revive_snapshot(decode(&document).unwrap()).unwrap();
        let reencoded = encode(&revived.to_wire()).unwrap();

        assert_eq!(reencoded, document);
    }

    #[test]
    fn test_revive_preserves_kinds_positions_and_sizes() {
        let revived = revive_snapshot(sample_wire()).unwrap();

        assert_eq!(revived.score, 10);
        assert_eq!(revived.lives, 3);
        assert_eq!((revived.ship.x, revived.ship.y), (320.0, 240.0));
        assert_eq!(revived.bullets.len(), 1);
        assert_eq!((revived.bullets[0].prevx, revived.bullets[0].prevy), (95.0, 48.0));
        assert_eq!(revived.asteroids[0].size, AsteroidSize::Large);
        assert_eq!((revived.asteroids[0].x, revived.asteroids[0].y), (10.0, 10.0));

        let kinds: Vec<EntityKind> = revived.entities().iter().map(Entity::kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Bullet, EntityKind::Asteroid, EntityKind::Ship, EntityKind::Ship]
        );
    }

    #[test]
    fn test_document_keeps_field_names_and_tags() {
        let document = encode(&sample_wire()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&document).unwrap();

        assert_eq!(value["score"], 10);
        assert_eq!(value["ship"]["kind"], "ship");
        assert_eq!(value["bullets"][0]["kind"], "bullet");
        assert_eq!(value["bullets"][0]["prevx"], 95.0);
        assert_eq!(value["asteroids"][0]["kind"], "asteroid");
        assert_eq!(value["asteroids"][0]["size"], 3);
    }

    #[test]
    fn test_integer_coordinates_are_accepted() {
        let document = r#"{
            "score": 10, "lives": 3,
            "ship": {"kind": "ship", "x": 320, "y": 240, "heading": 0, "vx": 0, "vy": 0,
                     "alive": true, "thrusting": false,
                     "points": [12, 0, -6, -6, -4, 0, -6, 6],
                     "flames": [-4, 0, -6, -2, -10, 0, -6, 2]},
            "bullets": [{"kind": "bullet", "owner": 1, "x": 100, "y": 50, "prevx": 95, "prevy": 48,
                         "vx": 5, "vy": 2, "ttl": 30}],
            "asteroids": [{"kind": "asteroid", "x": 10, "y": 10, "vx": 1, "vy": 0,
                           "rotation_speed": 0.03, "size": 3, "visible": true,
                           "points": [-32, -16, 0, -32, 32, -16, 0, 32]}]
        }"#;

        let revived = revive_snapshot(decode(document).unwrap()).unwrap();
        assert_eq!(revived.tick, 0);
        assert!(revived.ships.is_empty());
        assert_eq!(revived.ship.polygon.vertex_count(), 4);
        assert_eq!(revived.bullets[0].x, 100.0);
        assert_eq!(revived.asteroids[0].size, AsteroidSize::Large);
    }

    #[test]
    fn test_missing_bullets_is_not_a_snapshot() {
        let result = decode(r#"{"score": 0, "lives": 3, "ship": null, "asteroids": []}"#);
        assert!(matches!(result, Err(CodecError::NotASnapshot(_))));

        let result = decode(r#""waiting""#);
        assert!(matches!(result, Err(CodecError::NotASnapshot(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(decode("{\"score\":"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_record_in_wrong_slot_is_rejected() {
        let mut wire = sample_wire();
        wire.bullets.push(wire.asteroids[0].clone());

        match revive_snapshot(wire) {
            Err(CodecError::KindMismatch { slot, expected, found }) => {
                assert_eq!(slot, "bullets");
                assert_eq!(expected, "bullet");
                assert_eq!(found, "asteroid");
            }
            other => panic!("expected kind mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_size_tier_is_rejected() {
        let mut wire = sample_wire();
        if let EntityRecord::Asteroid(record) = &mut wire.asteroids[0] {
            record.size = 9;
        }
        assert!(matches!(revive_snapshot(wire), Err(CodecError::UnknownSize(9))));
    }

    #[test]
    fn test_degenerate_polygon_is_rejected() {
        let mut wire = sample_wire();
        if let EntityRecord::Ship(record) = &mut wire.ship {
            record.points = vec![1.0, 2.0, 3.0, 4.0];
        }

        match revive_snapshot(wire) {
            Err(CodecError::InvalidPolygon { kind, source }) => {
                assert_eq!(kind, "ship");
                assert_eq!(source, GeometryError::TooFewPoints(2));
            }
            other => panic!("expected invalid polygon, got {:?}", other),
        }
    }
}
