use tokio::sync::{mpsc, oneshot};
use tracing::info;

use super::messages::IceServer;
use super::router::SignalingRouter;
use super::types::{Connection, ConnectionId, RoomName, SignalingError};

/// Commands sent to the router actor
pub(crate) enum RouterCommand {
    Open {
        conn: Connection,
        room: RoomName,
        reply: oneshot::Sender<()>,
    },
    Message {
        id: ConnectionId,
        text: String,
    },
    Close {
        id: ConnectionId,
    },
}

/// Sole owner of the router; every event is applied in arrival order.
pub(crate) async fn router_actor(
    mut rx: mpsc::Receiver<RouterCommand>,
    ice_servers: Vec<IceServer>,
) {
    let mut router = SignalingRouter::new(ice_servers);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            RouterCommand::Open { conn, room, reply } => {
                router.on_open(conn, room);
                let _ = reply.send(());
            }
            RouterCommand::Message { id, text } => router.on_message(id, &text),
            RouterCommand::Close { id } => router.on_close(id),
        }
    }

    info!(
        "Router stopped with {} connection(s) tracked",
        router.registry().connection_count()
    );
}

/// Handle to communicate with the router actor
#[derive(Clone)]
pub struct RouterHandle {
    pub(crate) tx: mpsc::Sender<RouterCommand>,
}

impl RouterHandle {
    /// Spawn a router actor on the current runtime
    pub fn spawn(ice_servers: Vec<IceServer>) -> Self {
        let (tx, rx) = mpsc::channel::<RouterCommand>(1024);
        tokio::spawn(router_actor(rx, ice_servers));
        Self { tx }
    }

    /// Register a freshly opened connection and send it the room's information.
    ///
    /// Returns once the router has processed the open, so later messages
    /// from the same connection are always seen after it.
    pub async fn open(&self, conn: Connection, room: RoomName) -> Result<(), SignalingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RouterCommand::Open {
                conn,
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))?;
        reply_rx
            .await
            .map_err(|_| SignalingError::Internal("actor channel closed".to_string()))
    }

    /// Hand a text frame from `id` to the router
    pub async fn message(&self, id: ConnectionId, text: String) {
        let _ = self.tx.send(RouterCommand::Message { id, text }).await;
    }

    /// Report that `id` has closed
    pub async fn close(&self, id: ConnectionId) {
        let _ = self.tx.send(RouterCommand::Close { id }).await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::signaling::types::OutboundMessage;

    async fn next_json(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> Value {
        let msg = rx.recv().await.expect("channel closed");
        serde_json::from_str(msg.as_str()).unwrap()
    }

    fn connect() -> (Connection, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(ConnectionId::next(), tx), rx)
    }

    #[tokio::test]
    async fn open_replies_after_information_is_queued() {
        let handle = RouterHandle::spawn(Vec::new());
        let (conn, mut rx) = connect();

        handle.open(conn, RoomName::from("actor-open")).await.unwrap();

        let info = rx.try_recv().expect("information queued before open returns");
        let info: Value = serde_json::from_str(info.as_str()).unwrap();
        assert_eq!(info["canHost"], true);
        assert_eq!(info["canJoin"], true);
        assert_eq!(info["iceServers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn events_are_applied_in_order() {
        let handle = RouterHandle::spawn(Vec::new());
        let (host, mut host_rx) = connect();
        let (joiner, mut joiner_rx) = connect();
        let host_id = host.id();
        let joiner_id = joiner.id();
        let room = RoomName::from("actor-order");

        handle.open(host, room.clone()).await.unwrap();
        handle.open(joiner, room).await.unwrap();
        next_json(&mut host_rx).await;
        next_json(&mut joiner_rx).await;

        handle.message(host_id, "host".to_string()).await;
        handle.message(joiner_id, "join".to_string()).await;
        handle.message(host_id, "answerRequest:OFFER".to_string()).await;

        assert_eq!(next_json(&mut joiner_rx).await["canJoin"], true);
        assert_eq!(next_json(&mut joiner_rx).await["canJoin"], false);
        assert_eq!(next_json(&mut joiner_rx).await["answerRequest"], "OFFER");

        handle.close(host_id).await;
        let info = next_json(&mut joiner_rx).await;
        assert_eq!(info["canHost"], true);
        assert_eq!(info["canJoin"], false);
    }

    #[tokio::test]
    async fn open_fails_once_actor_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = RouterHandle { tx };
        let (conn, _rx) = connect();

        let err = handle.open(conn, RoomName::from("gone")).await.unwrap_err();
        assert!(matches!(err, SignalingError::Internal(_)));
    }
}
