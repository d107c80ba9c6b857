use std::collections::HashMap;

use broker_core::{ConnId, Engine};
use broker_protocol::{Codec, Payload, WireFrame};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// One request a connection task sends to the engine-actor task.
///
/// The engine itself (`broker_core::Engine`) is synchronous and confined to
/// the actor's task — no `Mutex` ever wraps it. Message-passing over this
/// channel is what gives every connection task a way to mutate shared state
/// without sharing it, per §5's "no locks ... needed or permitted".
pub enum EngineCommand {
    /// Registers a newly handshaken connection's outbound queue and codec.
    /// Must be sent before any `Publish`/`Subscribe`/`Cancel`/`List` that
    /// names this `conn`.
    Register {
        conn: ConnId,
        codec: Codec,
        outbox: mpsc::UnboundedSender<WireFrame>,
    },
    Publish {
        topic: String,
        value: Payload,
    },
    Subscribe {
        topic: String,
        conn: ConnId,
    },
    Cancel {
        topic: String,
        conn: ConnId,
    },
    List {
        reply: oneshot::Sender<Vec<String>>,
    },
    Disconnect {
        conn: ConnId,
    },
}

struct ConnEntry {
    codec: Codec,
    outbox: mpsc::UnboundedSender<WireFrame>,
}

/// Runs the engine actor to completion, draining `commands` until every
/// sender (every connection task, plus the listener's own handle) has
/// dropped. One task owns the `Engine` and the connection registry for the
/// broker's entire lifetime; nothing else ever touches either.
pub async fn run(mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
    let mut engine = Engine::new();
    let mut conns: HashMap<ConnId, ConnEntry> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            EngineCommand::Register {
                conn,
                codec,
                outbox,
            } => {
                trace!(?conn, ?codec, "registered connection with engine");
                conns.insert(conn, ConnEntry { codec, outbox });
            }
            EngineCommand::Publish { topic, value } => {
                let deliveries = engine.publish(&topic, value);
                debug!(topic = %topic, fanout = deliveries.len(), "published");
                for delivery in deliveries {
                    deliver(&conns, delivery.conn, delivery.frame);
                }
            }
            EngineCommand::Subscribe { topic, conn } => {
                let Some(entry) = conns.get(&conn) else {
                    continue;
                };
                if let Some(delivery) = engine.subscribe(&topic, conn, entry.codec) {
                    deliver(&conns, delivery.conn, delivery.frame);
                }
            }
            EngineCommand::Cancel { topic, conn } => {
                engine.cancel(&topic, conn);
            }
            EngineCommand::List { reply } => {
                let _ = reply.send(engine.list_topics());
            }
            EngineCommand::Disconnect { conn } => {
                engine.disconnect(conn);
                conns.remove(&conn);
            }
        }
    }
}

/// Best-effort send to one connection's outbound queue. A closed queue
/// means that connection's task has already torn down (§7: a dead
/// subscriber is discovered on its next read failure, not here) — dropping
/// the frame silently is correct, not an error.
fn deliver(conns: &HashMap<ConnId, ConnEntry>, conn: ConnId, frame: WireFrame) {
    if let Some(entry) = conns.get(&conn) {
        let _ = entry.outbox.send(frame);
    }
}
