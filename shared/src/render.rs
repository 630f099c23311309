//! Drawing contract between revived entities and a concrete renderer
//!
//! Entities know what to draw; a [`Renderer`] implementation knows how. The
//! server never draws, the client supplies a macroquad-backed renderer.

use crate::entity::{Asteroid, Bullet, Entity, Ship, SHIP_POINTS};
use crate::geometry::Polygon;
use crate::snapshot::Snapshot;
use crate::Field;

pub trait Renderer {
    /// Strokes the closed outline with its local origin at `(x, y)`
    fn draw_polygon(&mut self, polygon: &Polygon, x: f32, y: f32);

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32);

    fn clear_all(&mut self);

    /// Vector text; a missing `x` centres the text horizontally
    fn vector_text(&mut self, text: &str, scale: f32, x: Option<f32>, y: Option<f32>);
}

impl Ship {
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if !self.alive {
            return;
        }
        renderer.draw_polygon(&self.polygon, self.x, self.y);
        if self.thrusting {
            renderer.draw_polygon(&self.flames, self.x, self.y);
        }
    }
}

impl Bullet {
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.draw_line(self.prevx, self.prevy, self.x, self.y);
    }
}

impl Asteroid {
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if self.visible {
            renderer.draw_polygon(&self.polygon, self.x, self.y);
        }
    }
}

impl Entity {
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        match self {
            Entity::Ship(ship) => ship.draw(renderer),
            Entity::Bullet(bullet) => bullet.draw(renderer),
            Entity::Asteroid(asteroid) => asteroid.draw(renderer),
        }
    }
}

/// Small upward-pointing ship used for the remaining-lives row
pub fn life_icon() -> Polygon {
    let mut icon = Polygon::from_template(&SHIP_POINTS);
    icon.rotate(-std::f32::consts::FRAC_PI_2);
    icon
}

impl Snapshot {
    /// Draws one full frame: score, lives, entities, and the game-over banner
    pub fn render(&self, renderer: &mut dyn Renderer, field: &Field) {
        renderer.clear_all();
        renderer.vector_text(&self.score.to_string(), 3.0, Some(20.0), Some(10.0));

        let icon = life_icon();
        for i in 0..self.lives {
            renderer.draw_polygon(&icon, 30.0 + 15.0 * i as f32, 45.0);
        }

        for bullet in &self.bullets {
            bullet.draw(renderer);
        }
        for asteroid in &self.asteroids {
            asteroid.draw(renderer);
        }
        for ship in &self.ships {
            ship.draw(renderer);
        }
        self.ship.draw(renderer);

        if self.game_over {
            renderer.vector_text("GAME OVER", 4.0, None, Some(field.height / 2.0 - 12.0));
            renderer.vector_text("PRESS SPACE", 2.0, None, Some(field.height / 2.0 + 20.0));
        }
    }
}
