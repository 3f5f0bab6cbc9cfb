use tracing::{debug, info, warn};

use super::messages::{ClientMessage, IceServer, ServerMessage};
use super::registry::RoomRegistry;
use super::types::{Connection, ConnectionId, OutboundMessage, Role, RoomName};

/// Turns transport events into registry updates and peer-to-peer forwards.
///
/// The router is not synchronised itself; it expects a single owner
/// (see `router_actor`) to feed it events one at a time.
pub struct SignalingRouter {
    registry: RoomRegistry,
    ice_servers: Vec<IceServer>,
}

impl SignalingRouter {
    pub fn new(ice_servers: Vec<IceServer>) -> Self {
        Self {
            registry: RoomRegistry::new(),
            ice_servers,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn on_open(&mut self, conn: Connection, room: RoomName) {
        info!("{} opened session '{}'", conn.id(), room);
        let information = self.information(&room);
        self.registry.track(conn.clone(), room);
        deliver(&conn, information);
    }

    pub fn on_close(&mut self, id: ConnectionId) {
        let Some(room) = self.registry.room_of(id).cloned() else {
            debug!("close for untracked {}", id);
            return;
        };

        self.registry.untrack(id);
        self.vacate(&room, id);
        info!("{} closed session '{}'", id, room);
    }

    pub fn on_message(&mut self, id: ConnectionId, text: &str) {
        let Some(room) = self.registry.room_of(id).cloned() else {
            debug!("message from untracked {}", id);
            return;
        };

        match ClientMessage::parse(text) {
            ClientMessage::Host => self.claim(&room, id, Role::Host),
            ClientMessage::Join => self.claim(&room, id, Role::Joiner),
            ClientMessage::Leave => self.vacate(&room, id),
            ClientMessage::AnswerRequest(offer) => {
                let msg = ServerMessage::AnswerRequest {
                    answer_request: offer,
                };
                self.forward_to(&room, Role::Joiner, msg);
            }
            ClientMessage::AnswerResponse(answer) => {
                let msg = ServerMessage::AnswerResponse {
                    answer_response: answer,
                };
                self.forward_to(&room, Role::Host, msg);
            }
            ClientMessage::ConnectError(error) => match self.registry.role_of(&room, id) {
                Some(role) => {
                    let msg = ServerMessage::ConnectError {
                        connect_error: error,
                    };
                    self.forward_to(&room, role.other(), msg);
                }
                None => debug!("{} reported a connect error without a role", id),
            },
            ClientMessage::Unrecognized => debug!("ignoring unrecognized frame from {}", id),
        }
    }

    fn claim(&mut self, room: &RoomName, id: ConnectionId, role: Role) {
        let Some(conn) = self.registry.connection(id).cloned() else {
            return;
        };

        if let Some(previous) = self.registry.holder(room, role) {
            if previous.id() != id {
                info!("{} displaces {} as {} of '{}'", id, previous.id(), role, room);
            }
        }

        self.registry.assign(room, conn, role);
        info!("{} is now {} of '{}'", id, role, room);
        self.broadcast(room);
    }

    /// Release every role `id` holds in `room`, broadcasting once per role freed
    fn vacate(&mut self, room: &RoomName, id: ConnectionId) {
        for role in [Role::Host, Role::Joiner] {
            if self.registry.clear_if_holder(room, id, role) {
                info!("{} is no longer {} of '{}'", id, role, room);
                self.broadcast(room);
            }
        }
    }

    fn forward_to(&self, room: &RoomName, role: Role, msg: ServerMessage) {
        match self.registry.holder(room, role) {
            Some(target) => {
                debug!("forwarding to {} of '{}' ({})", role, room, target.id());
                deliver(target, msg.to_outbound());
            }
            None => debug!("no {} in '{}', dropping forward", role, room),
        }
    }

    fn information(&self, room: &RoomName) -> OutboundMessage {
        ServerMessage::Information {
            can_host: self.registry.can_host(room),
            can_join: self.registry.can_join(room),
            ice_servers: self.ice_servers.clone(),
        }
        .to_outbound()
    }

    fn broadcast(&self, room: &RoomName) {
        let msg = self.information(room);
        for member in self.registry.members_of(room) {
            if member.is_open() {
                deliver(&member, msg.clone());
            }
        }
    }
}

fn deliver(conn: &Connection, msg: OutboundMessage) {
    if let Err(e) = conn.send(msg) {
        warn!("Dropping message: {}", e);
    }
}
