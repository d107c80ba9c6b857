//! The broker binary's async shell: TCP listener, per-connection tasks, and
//! the engine-actor task that owns all pub/sub state. Wire framing and
//! codecs live in `broker-protocol`; topic/subscription semantics live in
//! `broker-core`. This crate wires the two together onto real sockets.

pub mod config;
pub mod connection;
pub mod engine_actor;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use config::Config;

/// Runs the broker: binds `config.bind_addr`, spawns the engine actor, and
/// accepts connections until `shutdown` resolves.
///
/// Each accepted connection gets its own task (`connection::handle`);
/// engine state lives on a single separate task reached only through
/// `EngineCommand` messages, so nothing here ever locks.
pub async fn run(config: Config, shutdown: impl std::future::Future<Output = ()>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "broker listening");

    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine_task = tokio::spawn(engine_actor::run(engine_rx));

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "accepted connection");
                        if let Err(err) = stream.set_nodelay(true) {
                            warn!(%addr, %err, "failed to set TCP_NODELAY");
                        }
                        let engine_tx = engine_tx.clone();
                        tokio::spawn(async move {
                            connection::handle(stream, addr, engine_tx).await;
                        });
                    }
                    Err(err) => warn!(%err, "failed to accept connection"),
                }
            }
            () = &mut shutdown => {
                info!("shutdown signal received, closing listener");
                break;
            }
        }
    }

    drop(engine_tx);
    let _ = engine_task.await;
    Ok(())
}
