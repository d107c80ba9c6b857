use std::collections::{HashMap, HashSet};

use broker_protocol::Codec;

/// Opaque handle identifying a connection to the engine. The engine never
/// touches a socket; callers (the connection tasks in `services/broker`)
/// mint and own these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

/// The `(topic, connection, codec)` registry of §3.
///
/// A connection may hold at most one subscription per exact topic string;
/// subscribing again on the same topic just overwrites the stored codec
/// (idempotent, per the invariant) rather than creating a second entry.
/// A reverse index by connection makes disconnect teardown (§4.1, I4)
/// linear in that connection's subscription count rather than in every
/// topic the broker has ever seen.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_topic: HashMap<String, HashMap<ConnId, Codec>>,
    by_conn: HashMap<ConnId, HashSet<String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or refreshes a subscription. Returns `true` if this is a new
    /// subscription (no prior entry for this exact `(topic, conn)` pair),
    /// matching the "re-subscribing is idempotent in the registry" wording
    /// of §3 — callers use the return value to decide whether a relation
    /// counts as newly established for logging, not for replay: replay
    /// happens unconditionally per §4.3.3's "does re-trigger" note.
    pub fn subscribe(&mut self, topic: &str, conn: ConnId, codec: Codec) -> bool {
        let is_new = self
            .by_topic
            .entry(topic.to_owned())
            .or_default()
            .insert(conn, codec)
            .is_none();
        self.by_conn
            .entry(conn)
            .or_default()
            .insert(topic.to_owned());
        is_new
    }

    pub fn cancel(&mut self, topic: &str, conn: ConnId) {
        if let Some(subs) = self.by_topic.get_mut(topic) {
            subs.remove(&conn);
        }
        if let Some(topics) = self.by_conn.get_mut(&conn) {
            topics.remove(topic);
        }
    }

    /// Removes every subscription held by `conn`, across every topic
    /// (§4.1's teardown step, I4).
    pub fn disconnect(&mut self, conn: ConnId) {
        if let Some(topics) = self.by_conn.remove(&conn) {
            for topic in topics {
                if let Some(subs) = self.by_topic.get_mut(&topic) {
                    subs.remove(&conn);
                }
            }
        }
    }

    /// Every `(connection, codec)` subscribed to the exact topic `topic`.
    pub fn subscribers_of(&self, topic: &str) -> impl Iterator<Item = (ConnId, Codec)> + '_ {
        self.by_topic
            .get(topic)
            .into_iter()
            .flatten()
            .map(|(&conn, &codec)| (conn, codec))
    }
}
