//! WebSocket rendezvous for two-party peer-to-peer sessions

mod actor;
mod messages;
mod registry;
mod route;
mod router;
mod server;
mod types;

pub use actor::RouterHandle;
pub use messages::{ClientMessage, IceServer, ServerMessage};
pub use registry::RoomRegistry;
pub use route::{SESSION_PATH_TEMPLATE, extract_room_name};
pub use router::SignalingRouter;
pub use server::{DEFAULT_SIGNALING_PORT, SignalingServer};
pub use types::{Connection, ConnectionId, OutboundMessage, Role, RoomName, SignalingError};
