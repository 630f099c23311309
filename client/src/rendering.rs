//! macroquad implementation of the shared vector [`Renderer`]
//!
//! Everything is stroked in one color, scaled from field coordinates to the
//! current window size.

use macroquad::prelude::*;
use shared::{Field, Polygon, Renderer};

const LINE_WIDTH: f32 = 1.5;
/// Pixel height of scale-1 text before field scaling
const TEXT_UNIT: f32 = 8.0;

pub struct MacroquadRenderer {
    field: Field,
    color: Color,
    background: Color,
}

impl MacroquadRenderer {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            color: WHITE,
            background: BLACK,
        }
    }

    pub fn set_field(&mut self, field: Field) {
        self.field = field;
    }

    fn scale(&self) -> (f32, f32) {
        (
            screen_width() / self.field.width,
            screen_height() / self.field.height,
        )
    }
}

impl Renderer for MacroquadRenderer {
    fn draw_polygon(&mut self, polygon: &Polygon, x: f32, y: f32) {
        let (sx, sy) = self.scale();
        let vertices: Vec<(f32, f32)> = polygon.vertices().collect();

        for (i, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            draw_line(
                (x + x0) * sx,
                (y + y0) * sy,
                (x + x1) * sx,
                (y + y1) * sy,
                LINE_WIDTH,
                self.color,
            );
        }
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let (sx, sy) = self.scale();
        draw_line(x0 * sx, y0 * sy, x1 * sx, y1 * sy, LINE_WIDTH, self.color);
    }

    fn clear_all(&mut self) {
        clear_background(self.background);
    }

    fn vector_text(&mut self, text: &str, scale: f32, x: Option<f32>, y: Option<f32>) {
        let (sx, sy) = self.scale();
        let font_size = (TEXT_UNIT * scale * sy).round().max(1.0) as u16;
        let size = measure_text(text, None, font_size, 1.0);

        let px = match x {
            Some(x) => x * sx,
            None => (screen_width() - size.width) / 2.0,
        };
        // Field y is the top of the text; macroquad draws from the baseline
        let py = y.unwrap_or(0.0) * sy + size.offset_y;

        draw_text(text, px, py, font_size as f32, self.color);
    }
}
