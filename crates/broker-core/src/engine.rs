use broker_protocol::{Codec, Method, Payload, WireFrame};

use crate::hierarchy::HierarchyIndex;
use crate::subscription::{ConnId, SubscriptionRegistry};

/// One outbound frame the engine wants delivered to one connection, in that
/// connection's own codec. The engine never touches a socket; the caller
/// (a connection task in `services/broker`) is responsible for actually
/// writing it, and for treating a write failure as "subscriber dead" per
/// §7 without reporting it back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub conn: ConnId,
    pub codec: Codec,
    pub frame: WireFrame,
}

/// The pub/sub engine of §3/§4.2: topic last-values, the hierarchy index,
/// and the subscription registry, with no I/O and no locking. A single
/// owner (the engine-actor task in `services/broker`) mutates this from
/// one place, satisfying §5's "no locks on engine state" by construction
/// rather than by synchronization.
#[derive(Debug, Default)]
pub struct Engine {
    last_value: std::collections::HashMap<String, Payload>,
    hierarchy: HierarchyIndex,
    subs: SubscriptionRegistry,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `PUBLISH(topic, value)` — §4.3.2.
    ///
    /// Stores the last value unconditionally (every publish overwrites,
    /// regardless of whether one was already stored — see DESIGN.md on
    /// the original's first-write-wins quirk, which is not reproduced),
    /// then fans out to every subscriber of `topic` itself and of every
    /// topic the hierarchy index relates to it. The `MESSAGE` frame always
    /// carries the *published* topic, even when delivered to a subscriber
    /// of a merely-related topic `U`.
    pub fn publish(&mut self, topic: &str, value: Payload) -> Vec<Delivery> {
        self.last_value.insert(topic.to_owned(), value.clone());
        self.hierarchy.ensure_known(topic);

        let mut deliveries = Vec::new();
        for (conn, codec) in self.subs.subscribers_of(topic) {
            deliveries.push(Delivery {
                conn,
                codec,
                frame: WireFrame::new(Method::Message, topic, value.clone()),
            });
        }
        for related in self.hierarchy.related(topic).map(str::to_owned).collect::<Vec<_>>() {
            for (conn, codec) in self.subs.subscribers_of(&related) {
                deliveries.push(Delivery {
                    conn,
                    codec,
                    frame: WireFrame::new(Method::Message, topic, value.clone()),
                });
            }
        }
        deliveries
    }

    /// `SUBSCRIBE(topic)` — §4.2/§4.3.3. Registers the subscription (even
    /// for a topic nobody has published to yet, so a later publish reaches
    /// it), ensures the hierarchy entry exists, and — if a last value is on
    /// file for this *exact* topic — returns the one `LAST_MESSAGE` reply
    /// addressed to this connection alone.
    pub fn subscribe(&mut self, topic: &str, conn: ConnId, codec: Codec) -> Option<Delivery> {
        self.hierarchy.ensure_known(topic);
        self.subs.subscribe(topic, conn, codec);
        self.last_value.get(topic).cloned().map(|value| Delivery {
            conn,
            codec,
            frame: WireFrame::new(Method::LastMessage, topic, value),
        })
    }

    /// `CANCEL(topic)` — removes this connection's subscription on the
    /// exact topic named. A no-op if it held none.
    pub fn cancel(&mut self, topic: &str, conn: ConnId) {
        self.subs.cancel(topic, conn);
    }

    /// Connection teardown (§4.1, I4): purge every subscription this
    /// connection held, on every topic.
    pub fn disconnect(&mut self, conn: ConnId) {
        self.subs.disconnect(conn);
    }

    /// `LIST` — §4.3.4: every topic ever mentioned, no duplicates, in
    /// unspecified order.
    pub fn list_topics(&self) -> Vec<String> {
        self.hierarchy.known_topics().map(str::to_owned).collect()
    }

    /// Test-support query: the current last value for `topic`, if any.
    /// Mirrors the original `Broker.get_topic` direct method (§8 scenarios
    /// 1-2); has no wire exposure of its own.
    pub fn get_topic(&self, topic: &str) -> Option<&Payload> {
        self.last_value.get(topic)
    }

    /// Test-support query: publishes `value` on `topic` without returning
    /// the resulting deliveries, mirroring the original `Broker.put_topic`
    /// direct method. Overwrite semantics are unconditional, same as
    /// [`Engine::publish`] — see DESIGN.md.
    pub fn put_topic(&mut self, topic: &str, value: Payload) {
        self.publish(topic, value);
    }

    /// Test-support query: every `(connection, codec)` subscribed to the
    /// exact topic `topic`, mirroring the original's `list_subscriptions`.
    pub fn list_subscriptions(&self, topic: &str) -> Vec<(ConnId, Codec)> {
        self.subs.subscribers_of(topic).collect()
    }
}
