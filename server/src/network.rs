//! Server network layer: UDP transport, session handling and the tick loop

use crate::client_manager::ClientManager;
use crate::game::World;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::protocol::MAX_DATAGRAM;
use shared::snapshot;
use shared::{Field, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    world: World,
    tick_duration: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        field: Field,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_world(addr, tick_duration, max_clients, World::new(field)).await
    }

    /// Binds the socket around an already-built world, e.g. a seeded one
    pub async fn with_world(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        world: World,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!(
            "Server listening on {} ({}x{} field)",
            socket.local_addr()?,
            world.field.width,
            world.field.height
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            world,
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping [`Server::run`] from another task
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match deserialize::<Packet>(&buffer[..len]) {
                        Ok(packet) => {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                debug!("Main loop gone, stopping receiver");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to deserialize packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = send_packet_to(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = send_packet_to(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                if !expire_clients(&clients, &server_tx, Instant::now()).await {
                    return;
                }
            }
        });
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Updates sessions from one packet; the world only sees queued commands
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!("Client connecting from {} (version: {})", addr, client_version);

                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: format!(
                                "Protocol version mismatch: server {}, client {}",
                                PROTOCOL_VERSION, client_version
                            ),
                        },
                        addr,
                    );
                    return;
                }

                let mut clients = self.clients.write().await;

                // A reconnect from the same address replaces the old session
                if let Some(existing_id) = clients.find_client_by_addr(addr) {
                    info!("Replacing existing client {} from {}", existing_id, addr);
                    clients.remove_client(&existing_id);
                    self.world.remove_player(existing_id);
                }

                match clients.add_client(addr) {
                    Some(client_id) => {
                        self.world.add_player(client_id);
                        self.send_packet(
                            Packet::Connected {
                                client_id,
                                field: self.world.field,
                            },
                            addr,
                        );
                    }
                    None => {
                        warn!("Rejecting {}: server full", addr);
                        self.send_packet(
                            Packet::Disconnected {
                                reason: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::Input { sequence, event } => {
                let mut clients = self.clients.write().await;
                match clients.find_client_by_addr(addr) {
                    Some(client_id) => {
                        clients.add_input(client_id, sequence, event);
                    }
                    None => debug!("Input from unknown address {}", addr),
                }
            }

            Packet::Heartbeat => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.touch(client_id);
                }
            }

            Packet::Disconnect => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.remove_client(&client_id);
                    self.world.remove_player(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// One simulation tick: drain input, step the world, publish state
    async fn tick(&mut self) {
        let inputs = {
            let mut clients = self.clients.write().await;
            clients.drain_inputs()
        };
        for (client_id, event) in inputs {
            self.world.queue_input(client_id, event);
        }

        let events = self.world.step();

        let recipients = {
            let clients = self.clients.read().await;
            clients.get_client_addrs()
        };
        for (client_id, addr) in recipients {
            if let Some(packet) = self.snapshot_packet(client_id) {
                self.send_packet(packet, addr);
            }
        }

        for event in events {
            self.broadcast_packet(Packet::from(event));
        }
    }

    fn snapshot_packet(&self, client_id: u32) -> Option<Packet> {
        let wire = self.world.snapshot_for(client_id)?;
        match snapshot::encode(&wire) {
            Ok(document) => Some(Packet::Snapshot {
                tick: self.world.tick,
                document,
            }),
            Err(e) => {
                error!("Failed to encode snapshot for client {}: {}", client_id, e);
                None
            }
        }
    }

    /// Applies one message from the network tasks; false means stop
    async fn handle_message(&mut self, message: Option<ServerMessage>) -> bool {
        match message {
            Some(ServerMessage::PacketReceived { packet, addr }) => {
                self.handle_packet(packet, addr).await;
                true
            }
            Some(ServerMessage::ClientTimeout { client_id }) => {
                self.world.remove_player(client_id);
                true
            }
            Some(ServerMessage::Shutdown) | None => {
                info!("Server shutting down");
                false
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    if !self.handle_message(message).await {
                        break;
                    }
                },

                _ = tick_interval.tick() => {
                    let started = Instant::now();
                    self.tick().await;

                    let elapsed = started.elapsed();
                    if elapsed > self.tick_duration {
                        warn!("Tick {} overran: {:?} > {:?}", self.world.tick, elapsed, self.tick_duration);
                    }

                    if self.world.tick % 175 == 0 && self.world.player_count() > 0 {
                        debug!(
                            "Tick {}: {} players, wave {}, {} asteroids, {} bullets",
                            self.world.tick,
                            self.world.player_count(),
                            self.world.wave,
                            self.world.asteroids().len(),
                            self.world.bullets().len()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}

/// Drops sessions silent as of `now` and reports each to the main loop
///
/// Returns false once the main loop has gone away.
async fn expire_clients(
    clients: &RwLock<ClientManager>,
    server_tx: &mpsc::UnboundedSender<ServerMessage>,
    now: Instant,
) -> bool {
    let timed_out = {
        let mut clients_guard = clients.write().await;
        clients_guard.check_timeouts_at(now)
    };

    for client_id in timed_out {
        info!("Client {} timed out", client_id);
        if server_tx.send(ServerMessage::ClientTimeout { client_id }).is_err() {
            return false;
        }
    }
    true
}

async fn send_packet_to(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let data = serialize(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}
