//! Client sessions: connection lifecycle and input queuing for the server
//!
//! Each session tracks which logical keys its player is holding so that
//! repeated key-down or key-up events collapse into a single transition, and
//! buffers the surviving events until the next tick drains them into the world.

use log::{debug, info};
use shared::{InputEvent, Key};
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Silence after which a client is dropped
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Logical keys currently held down by one client
#[derive(Debug, Default, Clone)]
pub struct KeyState {
    down: HashSet<Key>,
}

impl KeyState {
    /// Returns true on an up→down transition, false if the key was already down
    pub fn press(&mut self, key: Key) -> bool {
        self.down.insert(key)
    }

    /// Returns true on a down→up transition, false if the key was already up
    pub fn release(&mut self, key: Key) -> bool {
        self.down.remove(&key)
    }
}

/// A connected client and its buffered input
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    /// Last time any packet arrived from this client
    pub last_seen: Instant,
    /// Highest input sequence accepted so far
    pub last_sequence: u32,
    pub keys: KeyState,
    pub pending_inputs: VecDeque<InputEvent>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            last_sequence: 0,
            keys: KeyState::default(),
            pending_inputs: VecDeque::new(),
        }
    }

    /// Accepts one input event, returning whether it was queued
    ///
    /// Stale sequences, unmapped key codes, aims at non-finite positions and
    /// key events that do not change the held-key state are dropped.
    pub fn add_input(&mut self, sequence: u32, event: InputEvent) -> bool {
        self.last_seen = Instant::now();

        if sequence <= self.last_sequence {
            debug!(
                "Client {} dropped stale input {} (last {})",
                self.id, sequence, self.last_sequence
            );
            return false;
        }
        self.last_sequence = sequence;

        let changed = match event {
            InputEvent::KeyDown { code } => Key::from_code(code).is_some_and(|k| self.keys.press(k)),
            InputEvent::KeyUp { code } => Key::from_code(code).is_some_and(|k| self.keys.release(k)),
            InputEvent::Fire { x, y } => x.is_finite() && y.is_finite(),
        };

        if changed {
            self.pending_inputs.push_back(event);
        }
        changed
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }
}

/// All connected clients, bounded by `max_clients`
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    /// Client IDs start from 1 and are never reused
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Returns None when the server is full
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Drops the session and any input it had queued
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} disconnected ({} queued inputs discarded)",
                client.id,
                client.pending_inputs.len()
            );
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Returns false if the client ID is unknown or the event was dropped
    pub fn add_input(&mut self, client_id: u32, sequence: u32, event: InputEvent) -> bool {
        self.clients
            .get_mut(&client_id)
            .is_some_and(|client| client.add_input(sequence, event))
    }

    /// Records liveness for packets that carry no input
    pub fn touch(&mut self, client_id: u32) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.touch();
        }
    }

    /// Empties every client's queue, ordered by client ID then arrival
    pub fn drain_inputs(&mut self) -> Vec<(u32, InputEvent)> {
        let mut ids: Vec<u32> = self.clients.keys().copied().collect();
        ids.sort_unstable();

        let mut drained = Vec::new();
        for id in ids {
            if let Some(client) = self.clients.get_mut(&id) {
                drained.extend(client.pending_inputs.drain(..).map(|event| (id, event)));
            }
        }
        drained
    }

    /// Removes and returns clients silent for longer than [`CLIENT_TIMEOUT`]
    /// as of `now`
    pub fn check_timeouts_at(&mut self, now: Instant) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(now, CLIENT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
