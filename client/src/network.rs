//! Client session: one UDP socket talking to one server
//!
//! The [`Session`] owns its socket. [`Session::spawn`] moves it onto a tokio
//! task and returns a [`SessionHandle`] the frame loop uses to queue outgoing
//! packets and collect incoming ones without blocking.

use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::protocol::MAX_DATAGRAM;
use shared::{InputEvent, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Keeps the server's timeout from firing while the player sits idle
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

pub struct Session {
    socket: UdpSocket,
    server_addr: SocketAddr,
}

impl Session {
    /// Binds a local socket and sends `Connect` to the server
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let bind_addr = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;

        let session = Session {
            socket,
            server_addr,
        };

        info!("Connecting to {}...", server_addr);
        session
            .send(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })
            .await?;

        Ok(session)
    }

    pub async fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Waits for the next packet from the server, skipping strangers
    pub async fn recv(&self) -> Result<Packet, Box<dyn std::error::Error>> {
        let mut buffer = vec![0u8; MAX_DATAGRAM];

        loop {
            let (len, from) = self.socket.recv_from(&mut buffer).await?;
            if from != self.server_addr {
                debug!("Ignoring datagram from {}", from);
                continue;
            }
            return Ok(deserialize::<Packet>(&buffer[..len])?);
        }
    }

    /// Runs the session on the current tokio runtime
    pub fn spawn(self) -> SessionHandle {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        tokio::spawn(self.run(outgoing_rx, incoming_tx));

        SessionHandle {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        }
    }

    async fn run(
        self,
        mut outgoing: mpsc::UnboundedReceiver<Packet>,
        incoming: mpsc::UnboundedSender<Packet>,
    ) {
        let mut heartbeat = interval(HEARTBEAT_INTERVAL);
        let mut buffer = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, from)) if from == self.server_addr => {
                            match deserialize::<Packet>(&buffer[..len]) {
                                Ok(packet) => {
                                    if incoming.send(packet).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => warn!("Failed to deserialize packet: {}", e),
                            }
                        }
                        Ok((_, from)) => debug!("Ignoring datagram from {}", from),
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                packet = outgoing.recv() => {
                    let Some(packet) = packet else {
                        break;
                    };
                    let last = packet == Packet::Disconnect;
                    if let Err(e) = self.send_raw(&packet).await {
                        error!("Error sending packet: {}", e);
                    }
                    if last {
                        break;
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(e) = self.send_raw(&Packet::Heartbeat).await {
                        error!("Error sending heartbeat: {}", e);
                    }
                },
            }
        }

        info!("Session with {} closed", self.server_addr);
    }

    async fn send_raw(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }
}

/// Frame-loop side of a running session
pub struct SessionHandle {
    outgoing: mpsc::UnboundedSender<Packet>,
    incoming: mpsc::UnboundedReceiver<Packet>,
}

impl SessionHandle {
    pub fn send_input(&self, sequence: u32, event: InputEvent) {
        self.queue(Packet::Input { sequence, event });
    }

    /// Everything received since the last call
    pub fn poll(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.incoming.try_recv() {
            packets.push(packet);
        }
        packets
    }

    /// Tells the server goodbye and stops the session task
    pub fn disconnect(&self) {
        self.queue(Packet::Disconnect);
    }

    fn queue(&self, packet: Packet) {
        if self.outgoing.send(packet).is_err() {
            warn!("Session closed, dropping outgoing packet");
        }
    }
}
