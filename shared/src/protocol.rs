//! Datagram protocol between clients and the authoritative server
//!
//! Every UDP datagram carries exactly one bincode-encoded [`Packet`]. The
//! per-tick world state travels inside [`Packet::Snapshot`] as a JSON document
//! so its field names survive the trip; see [`crate::snapshot`].

use crate::Field;
use serde::{Deserialize, Serialize};

/// Largest datagram either side will send or accept
pub const MAX_DATAGRAM: usize = 65_507;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // Client to server
    Connect {
        client_version: u32,
    },
    Input {
        sequence: u32,
        event: InputEvent,
    },
    Heartbeat,
    Disconnect,

    // Server to client
    Connected {
        client_id: u32,
        field: Field,
    },
    Snapshot {
        tick: u32,
        document: String,
    },
    Explosion {
        size: u8,
    },
    FireSound,
    Disconnected {
        reason: String,
    },
}

impl From<GameEvent> for Packet {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::Explosion { size } => Packet::Explosion { size },
            GameEvent::FireSound => Packet::FireSound,
        }
    }
}

/// Raw input as captured on the client
///
/// Key codes are sent untranslated; the server maps them through
/// [`Key::from_code`] and ignores anything outside the logical key set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { code: u32 },
    KeyUp { code: u32 },
    Fire { x: f32, y: f32 },
}

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
    Spacebar,
}

impl Key {
    pub const ALL: [Key; 5] = [Key::Left, Key::Up, Key::Right, Key::Down, Key::Spacebar];

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            37 => Some(Key::Left),
            38 => Some(Key::Up),
            39 => Some(Key::Right),
            40 => Some(Key::Down),
            32 => Some(Key::Spacebar),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Key::Left => 37,
            Key::Up => 38,
            Key::Right => 39,
            Key::Down => 40,
            Key::Spacebar => 32,
        }
    }
}

/// One-shot signals raised by the simulation for client-side audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Size code 8, 4 or 2 selects the large, medium or small bang
    Explosion { size: u8 },
    FireSound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        for key in Key::ALL {
            assert_eq!(Key::from_code(key.code()), Some(key));
        }
        assert_eq!(Key::from_code(65), None);
        assert_eq!(Key::from_code(0), None);
    }

    #[test]
    fn test_packet_serialization_connect() {
        let packet = Packet::Connect { client_version: 42 };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Connect { client_version } => assert_eq!(client_version, 42),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_input() {
        let packet = Packet::Input {
            sequence: 123,
            event: InputEvent::Fire { x: 12.5, y: 400.0 },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Input { sequence, event } => {
                assert_eq!(sequence, 123);
                assert_eq!(event, InputEvent::Fire { x: 12.5, y: 400.0 });
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let packet = Packet::Snapshot {
            tick: 42,
            document: "{\"score\":10}".to_string(),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();
        assert_eq!(deserialized, packet);
    }

    #[test]
    fn test_connected_carries_field() {
        let packet = Packet::Connected {
            client_id: 3,
            field: Field::new(800.0, 600.0),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        match bincode::deserialize::<Packet>(&serialized).unwrap() {
            Packet::Connected { client_id, field } => {
                assert_eq!(client_id, 3);
                assert_eq!(field, Field::new(800.0, 600.0));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_game_event_into_packet() {
        assert_eq!(
            Packet::from(GameEvent::Explosion { size: 4 }),
            Packet::Explosion { size: 4 }
        );
        assert_eq!(Packet::from(GameEvent::FireSound), Packet::FireSound);
    }
}
