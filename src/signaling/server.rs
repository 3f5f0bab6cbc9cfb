use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, error, info, warn};

use super::actor::RouterHandle;
use super::messages::IceServer;
use super::route::extract_room_name;
use super::types::{Connection, ConnectionId, OutboundMessage, RoomName};

pub const DEFAULT_SIGNALING_PORT: u16 = 8080;
const PING_INTERVAL: Duration = Duration::from_secs(30);
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SignalingServer {
    listener: TcpListener,
    handle: RouterHandle,
}

impl SignalingServer {
    /// Bind the listener and start the router actor
    pub async fn bind(addr: &str, ice_servers: Vec<IceServer>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Signaling server listening on {}", listener.local_addr()?);
        info!("Advertising {} ICE server(s)", ice_servers.len());

        Ok(Self {
            listener,
            handle: RouterHandle::spawn(ice_servers),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let handle = self.handle.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, handle).await {
                    error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handle: RouterHandle,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut room: Option<RoomName> = None;

    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |request: &Request, response: Response| match extract_room_name(request.uri().path()) {
            Ok(name) => {
                room = Some(name);
                Ok(response)
            }
            Err(e) => {
                let mut reject = ErrorResponse::new(Some(e.to_string()));
                *reject.status_mut() = StatusCode::NOT_FOUND;
                Err(reject)
            }
        },
    )
    .await?;

    let Some(room) = room else {
        return Err("handshake completed without a session name".into());
    };

    let id = ConnectionId::next();
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    info!("WebSocket connection {} from {} for '{}'", id, addr, room);

    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ctrl_tx, mut ctrl_rx) = mpsc::unbounded_channel::<Message>();

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    let mut waiting_for_pong = false;
    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    let ws_msg = Message::Text(msg.into_inner());
                    if ws_tx.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Some(ctrl_msg) = ctrl_rx.recv() => {
                    if ws_tx.send(ctrl_msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    if let Err(e) = handle.open(Connection::new(id, tx), room).await {
        send_task.abort();
        return Err(e.into());
    }

    loop {
        let pong_timeout = async {
            match pong_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = ping_interval.tick() => {
                if waiting_for_pong {
                    warn!("No Pong received, disconnecting {}", id);
                    break;
                }
                if ctrl_tx.send(Message::Ping(Bytes::new())).is_err() {
                    break;
                }
                waiting_for_pong = true;
                pong_deadline = Some(tokio::time::Instant::now() + PONG_TIMEOUT);
                debug!("Ping sent to {}", id);
            }

            _ = pong_timeout => {
                warn!("Pong timeout, disconnecting {}", id);
                break;
            }

            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WebSocket error on {}: {}", id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        handle.message(id, text.as_str().to_owned()).await;
                    }
                    Message::Pong(_) => {
                        waiting_for_pong = false;
                        pong_deadline = None;
                        debug!("Pong received from {}", id);
                    }
                    Message::Close(_) => {
                        info!("Close received from {}", id);
                        break;
                    }
                    Message::Binary(_) => {
                        debug!("Ignoring binary frame from {}", id);
                    }
                    _ => {}
                }
            }
        }
    }

    handle.close(id).await;

    send_task.abort();
    info!("WebSocket disconnected: {} ({})", id, addr);

    Ok(())
}
