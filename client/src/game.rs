//! Client-side view of the game: the latest revived snapshot plus session info
//!
//! The client never simulates. It keeps whatever the server last sent, revived
//! into typed entities, and hands audio signals to a [`SoundSink`].

use log::{debug, info, warn};
use shared::snapshot::{decode, revive_snapshot};
use shared::{CodecError, Field, Packet, Renderer, Snapshot};
use std::time::{Duration, Instant};

/// Silence after which the server is presumed gone
pub const SERVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Receiver for the server's one-shot audio signals
pub trait SoundSink {
    /// `size` is 8, 4 or 2 for a large, medium or small bang
    fn explosion(&mut self, size: u8);

    fn fire(&mut self);
}

/// Default sink: no playback, just a debug log line per signal
#[derive(Debug, Default)]
pub struct LogSoundSink;

impl SoundSink for LogSoundSink {
    fn explosion(&mut self, size: u8) {
        debug!("sound: explosion {}", size);
    }

    fn fire(&mut self) {
        debug!("sound: fire");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Connecting,
    Connected { client_id: u32 },
    Disconnected { reason: String },
}

pub struct ClientGameState {
    pub connection: ConnectionState,
    pub field: Field,
    snapshot: Option<Snapshot>,
    last_tick: Option<u32>,
    /// Arrival time of the last packet, or creation time before the first
    last_heard: Instant,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Connecting,
            field: Field::default(),
            snapshot: None,
            last_tick: None,
            last_heard: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn client_id(&self) -> Option<u32> {
        match self.connection {
            ConnectionState::Connected { client_id } => Some(client_id),
            _ => None,
        }
    }

    pub fn handle_packet(&mut self, packet: Packet, sounds: &mut dyn SoundSink) {
        self.last_heard = Instant::now();

        match packet {
            Packet::Connected { client_id, field } => {
                info!(
                    "Connected! Client ID: {} ({}x{} field)",
                    client_id, field.width, field.height
                );
                self.connection = ConnectionState::Connected { client_id };
                self.field = field;
                self.snapshot = None;
                self.last_tick = None;
            }

            Packet::Snapshot { tick, document } => self.apply_snapshot(tick, &document),

            Packet::Explosion { size } => sounds.explosion(size),

            Packet::FireSound => sounds.fire(),

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.disconnect(reason);
            }

            other => warn!("Unexpected packet from server: {:?}", other),
        }
    }

    /// Tears the session down if the server has been silent too long
    ///
    /// Returns true only on the call that detects the loss.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        if matches!(self.connection, ConnectionState::Disconnected { .. }) {
            return false;
        }
        if now.saturating_duration_since(self.last_heard) <= SERVER_TIMEOUT {
            return false;
        }

        warn!("No word from the server for {:?}, giving up", SERVER_TIMEOUT);
        self.disconnect("Server timed out".to_string());
        true
    }

    fn disconnect(&mut self, reason: String) {
        self.connection = ConnectionState::Disconnected { reason };
        self.snapshot = None;
        self.last_tick = None;
    }

    /// Replaces the current snapshot unless the document is older or unusable
    ///
    /// A document that is not a snapshot yet leaves the previous frame in
    /// place; the next tick will bring a fresh one.
    pub fn apply_snapshot(&mut self, tick: u32, document: &str) {
        if self.last_tick.is_some_and(|last| tick <= last) {
            debug!("Dropping out-of-order snapshot {}", tick);
            return;
        }

        match decode(document).and_then(revive_snapshot) {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.last_tick = Some(tick);
            }
            Err(CodecError::NotASnapshot(reason)) => {
                debug!("Deferring render, tick {} is not a snapshot: {}", tick, reason);
            }
            Err(e) => warn!("Discarding snapshot {}: {}", tick, e),
        }
    }

    /// Draws the latest frame, or a status line while there is none
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if let Some(snapshot) = &self.snapshot {
            snapshot.render(renderer, &self.field);
            return;
        }

        renderer.clear_all();
        let status = match &self.connection {
            ConnectionState::Connecting => "CONNECTING".to_string(),
            ConnectionState::Connected { .. } => "WAITING FOR SERVER".to_string(),
            ConnectionState::Disconnected { reason } => reason.to_uppercase(),
        };
        renderer.vector_text(&status, 2.0, None, Some(self.field.height / 2.0));
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::snapshot::{encode, EntityRecord, WireSnapshot};
    use shared::{Polygon, Ship};

    #[derive(Default)]
    struct RecordingSink {
        explosions: Vec<u8>,
        fires: usize,
    }

    impl SoundSink for RecordingSink {
        fn explosion(&mut self, size: u8) {
            self.explosions.push(size);
        }

        fn fire(&mut self) {
            self.fires += 1;
        }
    }

    #[derive(Default)]
    struct TextRenderer {
        texts: Vec<String>,
        polygons: usize,
    }

    impl Renderer for TextRenderer {
        fn draw_polygon(&mut self, _polygon: &Polygon, _x: f32, _y: f32) {
            self.polygons += 1;
        }

        fn draw_line(&mut self, _x0: f32, _y0: f32, _x1: f32, _y1: f32) {}

        fn clear_all(&mut self) {
            self.texts.clear();
            self.polygons = 0;
        }

        fn vector_text(&mut self, text: &str, _scale: f32, _x: Option<f32>, _y: Option<f32>) {
            self.texts.push(text.to_string());
        }
    }

    fn document(score: u32) -> String {
        let wire = WireSnapshot {
            tick: 0,
            score,
            lives: 3,
            game_over: false,
            ship: EntityRecord::from(&Ship::new(320.0, 240.0)),
            ships: Vec::new(),
            bullets: Vec::new(),
            asteroids: Vec::new(),
        };
        encode(&wire).unwrap()
    }

    #[test]
    fn test_connected_sets_id_and_field() {
        let mut state = ClientGameState::new();
        let mut sink = LogSoundSink;

        state.handle_packet(
            Packet::Connected {
                client_id: 4,
                field: Field::new(800.0, 600.0),
            },
            &mut sink,
        );

        assert_eq!(state.client_id(), Some(4));
        assert_eq!(state.field, Field::new(800.0, 600.0));
    }

    #[test]
    fn test_snapshot_is_revived() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(1, &document(10));

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.score, 10);
        assert_eq!((snapshot.ship.x, snapshot.ship.y), (320.0, 240.0));
    }

    #[test]
    fn test_older_snapshot_is_dropped() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(5, &document(50));
        state.apply_snapshot(4, &document(40));
        state.apply_snapshot(5, &document(45));

        assert_eq!(state.snapshot().unwrap().score, 50);

        state.apply_snapshot(6, &document(60));
        assert_eq!(state.snapshot().unwrap().score, 60);
    }

    #[test]
    fn test_non_snapshot_document_defers() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(1, &document(10));

        state.apply_snapshot(2, r#"{"score":20,"lives":3}"#);
        state.apply_snapshot(3, "not json");

        assert_eq!(state.snapshot().unwrap().score, 10);

        // Rejected documents do not advance the tick watermark
        state.apply_snapshot(2, &document(20));
        assert_eq!(state.snapshot().unwrap().score, 20);
    }

    #[test]
    fn test_audio_signals_reach_the_sink() {
        let mut state = ClientGameState::new();
        let mut sink = RecordingSink::default();

        state.handle_packet(Packet::Explosion { size: 8 }, &mut sink);
        state.handle_packet(Packet::FireSound, &mut sink);
        state.handle_packet(Packet::Explosion { size: 2 }, &mut sink);

        assert_eq!(sink.explosions, vec![8, 2]);
        assert_eq!(sink.fires, 1);
    }

    #[test]
    fn test_render_without_snapshot_shows_status() {
        let mut state = ClientGameState::new();
        let mut renderer = TextRenderer::default();

        state.render(&mut renderer);
        assert_eq!(renderer.texts, vec!["CONNECTING".to_string()]);

        state.handle_packet(
            Packet::Disconnected {
                reason: "Server full".to_string(),
            },
            &mut LogSoundSink,
        );
        state.render(&mut renderer);
        assert_eq!(renderer.texts, vec!["SERVER FULL".to_string()]);
    }

    #[test]
    fn test_silent_server_tears_session_down() {
        let mut state = ClientGameState::new();
        state.handle_packet(
            Packet::Connected {
                client_id: 2,
                field: Field::default(),
            },
            &mut LogSoundSink,
        );
        state.apply_snapshot(1, &document(10));

        let heard = state.last_heard;
        assert!(!state.check_timeout(heard + SERVER_TIMEOUT));
        assert!(state.snapshot().is_some());

        assert!(state.check_timeout(heard + SERVER_TIMEOUT + Duration::from_millis(1)));
        assert_eq!(
            state.connection,
            ConnectionState::Disconnected {
                reason: "Server timed out".to_string()
            }
        );
        assert!(state.snapshot().is_none());
        assert_eq!(state.client_id(), None);

        // Reported once
        assert!(!state.check_timeout(heard + SERVER_TIMEOUT * 2));

        let mut renderer = TextRenderer::default();
        state.render(&mut renderer);
        assert_eq!(renderer.texts, vec!["SERVER TIMED OUT".to_string()]);
    }

    #[test]
    fn test_server_that_never_answers_times_out() {
        let mut state = ClientGameState::new();
        let created = state.last_heard;

        assert!(state.check_timeout(created + SERVER_TIMEOUT + Duration::from_secs(1)));
        assert!(matches!(state.connection, ConnectionState::Disconnected { .. }));
    }

    #[test]
    fn test_disconnected_packet_drops_snapshot() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(1, &document(10));

        state.handle_packet(
            Packet::Disconnected {
                reason: "Server full".to_string(),
            },
            &mut LogSoundSink,
        );

        assert!(state.snapshot().is_none());
    }

    #[test]
    fn test_render_with_snapshot_draws_frame() {
        let mut state = ClientGameState::new();
        state.apply_snapshot(1, &document(10));

        let mut renderer = TextRenderer::default();
        state.render(&mut renderer);

        assert_eq!(renderer.texts, vec!["10".to_string()]);
        // Three life icons plus the ship
        assert_eq!(renderer.polygons, 4);
    }
}
