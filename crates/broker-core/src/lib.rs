//! The pub/sub engine: topic last-values, the hierarchy index, and the
//! subscription registry.
//!
//! Deliberately free of I/O and async: every operation is a synchronous
//! mutation of in-memory state, so it needs no lock and no runtime.
//! `services/broker` owns one [`Engine`] on a single task and drives it
//! from decoded [`broker_protocol::WireFrame`]s.

mod engine;
mod hierarchy;
mod subscription;

pub use engine::{Delivery, Engine};
pub use subscription::ConnId;
