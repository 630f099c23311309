//! Authoritative simulation: players, bullets and asteroids advanced tick by tick
//!
//! The network layer never touches entities directly. It queues session
//! commands and input events here, then calls [`World::step`] once per tick;
//! every mutation of the world happens inside that call.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::collision::{self, Collision};
use shared::snapshot::{EntityRecord, WireSnapshot};
use shared::{
    Asteroid, AsteroidSize, Bullet, Field, GameEvent, InputEvent, Key, Ship, FIRE_COOLDOWN,
    INITIAL_WAVE_SIZE, MAX_WAVE_SIZE, RESPAWN_DELAY, SHIP_TURN_RATE, STARTING_LIVES,
};
use std::collections::{BTreeMap, HashSet};

/// Join and leave requests, applied at the start of the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    Join(u32),
    Leave(u32),
}

/// Per-player game state: one ship, its score and its remaining lives
#[derive(Debug, Clone)]
pub struct Player {
    pub ship: Ship,
    pub score: u32,
    pub lives: u32,
    pub keys: HashSet<Key>,
    pub fire_cooldown: u32,
    /// Ticks until the ship comes back, while dead with lives remaining
    pub respawn_in: Option<u32>,
    pub game_over: bool,
}

impl Player {
    fn new(field: &Field) -> Self {
        let (x, y) = field.center();
        Self {
            ship: Ship::new(x, y),
            score: 0,
            lives: STARTING_LIVES,
            keys: HashSet::new(),
            fire_cooldown: 0,
            respawn_in: None,
            game_over: false,
        }
    }
}

pub struct World {
    pub field: Field,
    pub tick: u32,
    pub wave: u32,
    players: BTreeMap<u32, Player>,
    bullets: Vec<Bullet>,
    asteroids: Vec<Asteroid>,
    commands: Vec<SessionCommand>,
    inputs: Vec<(u32, InputEvent)>,
    rng: StdRng,
}

impl World {
    pub fn new(field: Field) -> Self {
        Self::with_rng(field, StdRng::from_entropy())
    }

    /// Deterministic world for tests and replays
    pub fn with_seed(field: Field, seed: u64) -> Self {
        Self::with_rng(field, StdRng::seed_from_u64(seed))
    }

    fn with_rng(field: Field, rng: StdRng) -> Self {
        Self {
            field,
            tick: 0,
            wave: 0,
            players: BTreeMap::new(),
            bullets: Vec::new(),
            asteroids: Vec::new(),
            commands: Vec::new(),
            inputs: Vec::new(),
            rng,
        }
    }

    pub fn add_player(&mut self, player_id: u32) {
        self.commands.push(SessionCommand::Join(player_id));
    }

    pub fn remove_player(&mut self, player_id: u32) {
        self.commands.push(SessionCommand::Leave(player_id));
    }

    pub fn queue_input(&mut self, player_id: u32, event: InputEvent) {
        self.inputs.push((player_id, event));
    }

    /// Places a large-or-smaller asteroid outside of wave spawning
    pub fn spawn_asteroid(&mut self, asteroid: Asteroid) {
        self.asteroids.push(asteroid);
    }

    pub fn spawn_bullet(&mut self, bullet: Bullet) {
        self.bullets.push(bullet);
    }

    pub fn player(&self, player_id: u32) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn player_mut(&mut self, player_id: u32) -> Option<&mut Player> {
        self.players.get_mut(&player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn asteroids_mut(&mut self) -> &mut Vec<Asteroid> {
        &mut self.asteroids
    }

    /// Advances the world by one tick and returns the events it raised
    pub fn step(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.apply_session_commands();
        self.tick_respawns();
        self.apply_inputs(&mut events);
        self.integrate();
        self.resolve_collisions(&mut events);
        self.check_round();

        self.tick = self.tick.wrapping_add(1);
        events
    }

    fn apply_session_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            match command {
                SessionCommand::Join(id) => {
                    let player = Player::new(&self.field);
                    info!("Player {} joined at ({}, {})", id, player.ship.x, player.ship.y);
                    self.players.insert(id, player);
                }
                SessionCommand::Leave(id) => {
                    if let Some(player) = self.players.remove(&id) {
                        self.inputs.retain(|(owner, _)| *owner != id);
                        info!("Player {} left with score {}", id, player.score);
                    }
                }
            }
        }
    }

    fn tick_respawns(&mut self) {
        let (x, y) = self.field.center();

        for (id, player) in self.players.iter_mut() {
            let Some(remaining) = player.respawn_in else {
                continue;
            };

            if remaining <= 1 {
                player.respawn_in = None;
                player.ship = Ship::new(x, y);
                debug!("Player {} respawned", id);
            } else {
                player.respawn_in = Some(remaining - 1);
            }
        }
    }

    fn apply_inputs(&mut self, events: &mut Vec<GameEvent>) {
        let mut aims: Vec<(u32, f32, f32)> = Vec::new();

        for (id, event) in std::mem::take(&mut self.inputs) {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };

            match event {
                InputEvent::Fire { x, y } if !(x.is_finite() && y.is_finite()) => {
                    debug!("Player {} aimed at a non-finite position", id);
                }
                InputEvent::KeyDown { code } => {
                    let Some(key) = Key::from_code(code) else {
                        continue;
                    };
                    if key == Key::Spacebar && player.game_over {
                        // Keys still held carry over; the session will not resend them
                        let mut keys = std::mem::take(&mut player.keys);
                        keys.remove(&Key::Spacebar);
                        *player = Player::new(&self.field);
                        player.keys = keys;
                        info!("Player {} restarted", id);
                        continue;
                    }
                    player.keys.insert(key);
                }
                InputEvent::KeyUp { code } => {
                    if let Some(key) = Key::from_code(code) {
                        player.keys.remove(&key);
                    }
                }
                InputEvent::Fire { x, y } => aims.push((id, x, y)),
            }
        }

        for (id, player) in self.players.iter_mut() {
            player.fire_cooldown = player.fire_cooldown.saturating_sub(1);
            player.ship.thrusting = false;

            if !player.ship.alive {
                continue;
            }

            let ship = &mut player.ship;
            if player.keys.contains(&Key::Left) {
                ship.turn(-SHIP_TURN_RATE);
            }
            if player.keys.contains(&Key::Right) {
                ship.turn(SHIP_TURN_RATE);
            }
            if player.keys.contains(&Key::Up) {
                ship.thrust();
            }
            if player.keys.contains(&Key::Down) {
                ship.brake();
            }

            if player.keys.contains(&Key::Spacebar) && player.fire_cooldown == 0 {
                let (nx, ny) = ship.nose();
                self.bullets.push(Bullet::new(*id, nx, ny, ship.heading));
                player.fire_cooldown = FIRE_COOLDOWN;
                events.push(GameEvent::FireSound);
            }
        }

        for (id, x, y) in aims {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            if !player.ship.alive || player.fire_cooldown > 0 {
                continue;
            }

            let ship = &player.ship;
            let direction = (y - ship.y).atan2(x - ship.x);
            self.bullets.push(Bullet::new(id, ship.x, ship.y, direction));
            player.fire_cooldown = FIRE_COOLDOWN;
            events.push(GameEvent::FireSound);
        }
    }

    fn integrate(&mut self) {
        for player in self.players.values_mut() {
            if player.ship.alive {
                player.ship.update(&self.field);
            }
        }

        for bullet in &mut self.bullets {
            bullet.update();
        }
        let field = self.field;
        self.bullets.retain(|bullet| !bullet.is_expired(&field));

        for asteroid in &mut self.asteroids {
            asteroid.update(&self.field);
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
        let collisions = collision::detect(
            self.players.iter().map(|(id, player)| (*id, &player.ship)),
            &self.bullets,
            &self.asteroids,
        );
        if collisions.is_empty() {
            return;
        }

        let mut spent_bullets = vec![false; self.bullets.len()];
        let mut spent_asteroids = vec![false; self.asteroids.len()];
        let mut fragments = Vec::new();

        for hit in collisions {
            match hit {
                Collision::BulletAsteroid { bullet, asteroid } => {
                    if spent_bullets[bullet] || spent_asteroids[asteroid] {
                        continue;
                    }
                    spent_bullets[bullet] = true;
                    spent_asteroids[asteroid] = true;

                    let target = &self.asteroids[asteroid];
                    let size = target.size;
                    let owner = self.bullets[bullet].owner;
                    if let Some(player) = self.players.get_mut(&owner) {
                        player.score += size.points();
                    }
                    events.push(GameEvent::Explosion {
                        size: size.explosion_code(),
                    });

                    if let Some(smaller) = size.smaller() {
                        let (x, y) = (target.x, target.y);
                        for _ in 0..2 {
                            fragments.push(Asteroid::new(smaller, x, y, &mut self.rng));
                        }
                    }
                }
                Collision::ShipAsteroid { player, asteroid } => {
                    if spent_asteroids[asteroid] {
                        continue;
                    }
                    let Some(state) = self.players.get_mut(&player) else {
                        continue;
                    };
                    if !state.ship.alive {
                        continue;
                    }

                    state.ship.alive = false;
                    state.ship.thrusting = false;
                    state.lives = state.lives.saturating_sub(1);
                    events.push(GameEvent::Explosion {
                        size: AsteroidSize::Large.explosion_code(),
                    });

                    if state.lives > 0 {
                        state.respawn_in = Some(RESPAWN_DELAY);
                    } else {
                        state.game_over = true;
                        info!("Player {} is out of lives, final score {}", player, state.score);
                    }
                }
            }
        }

        let mut spent = spent_bullets.into_iter();
        self.bullets.retain(|_| !spent.next().unwrap_or(false));
        let mut spent = spent_asteroids.into_iter();
        self.asteroids.retain(|_| !spent.next().unwrap_or(false));
        self.asteroids.extend(fragments);
    }

    fn check_round(&mut self) {
        if !self.asteroids.is_empty() || self.players.is_empty() {
            return;
        }

        self.wave += 1;
        let count = (INITIAL_WAVE_SIZE + self.wave as usize - 1).min(MAX_WAVE_SIZE);
        info!("Wave {}: spawning {} asteroids", self.wave, count);

        for _ in 0..count {
            let (x, y) = if self.rng.gen_bool(0.5) {
                (0.0, self.rng.gen::<f32>() * self.field.height)
            } else {
                (self.rng.gen::<f32>() * self.field.width, 0.0)
            };
            let asteroid = Asteroid::new(AsteroidSize::Large, x, y, &mut self.rng);
            self.asteroids.push(asteroid);
        }
    }

    /// State as seen by one player: their own ship in `ship`, everyone else's
    /// in `ships`
    pub fn snapshot_for(&self, player_id: u32) -> Option<WireSnapshot> {
        let player = self.players.get(&player_id)?;

        Some(WireSnapshot {
            tick: self.tick,
            score: player.score,
            lives: player.lives,
            game_over: player.game_over,
            ship: EntityRecord::from(&player.ship),
            ships: self
                .players
                .iter()
                .filter(|(id, _)| **id != player_id)
                .map(|(_, other)| EntityRecord::from(&other.ship))
                .collect(),
            bullets: self.bullets.iter().map(EntityRecord::from).collect(),
            asteroids: self.asteroids.iter().map(EntityRecord::from).collect(),
        })
    }
}
