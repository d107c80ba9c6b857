use std::net::SocketAddr;

use broker_core::ConnId;
use broker_protocol::{decode_handshake, new_framed, Method, Payload, WireFrame};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::engine_actor::EngineCommand;

/// A connection's place in its own lifecycle, per the §9 redesign note
/// preferring a small state machine over attaching callbacks to a raw file
/// descriptor. Advanced by [`handle`]; never observed from outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHandshake,
    Ready,
    Closing,
}

/// Drives one accepted connection from handshake to teardown.
///
/// Reads are framed length-prefixed messages (§6.1); the first is always
/// the JSON handshake (§6.2.1), every one after is decoded/encoded under
/// the negotiated codec. Outbound fan-out frames arrive on `outbox_rx`,
/// fed by the engine actor via [`EngineCommand::Register`].
pub async fn handle<IO>(io: IO, addr: SocketAddr, engine_tx: mpsc::UnboundedSender<EngineCommand>)
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let conn = ConnId(next_conn_id());
    let mut framed = new_framed(io);

    // State::AwaitingHandshake is implicit: nothing below this point runs
    // until the handshake resolves one way or the other.
    let Some(Ok(handshake_bytes)) = framed.next().await else {
        debug!(%addr, "connection closed before sending a handshake");
        return;
    };
    let codec = match decode_handshake(&handshake_bytes) {
        Ok(codec) => codec,
        Err(err) => {
            warn!(%addr, %err, "handshake failed, closing without reply");
            return;
        }
    };
    debug!(%addr, ?codec, "handshake complete");
    let mut state = State::Ready;

    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
    let own_outbox = outbox_tx.clone();
    if engine_tx
        .send(EngineCommand::Register {
            conn,
            codec,
            outbox: outbox_tx,
        })
        .is_err()
    {
        warn!(%addr, "engine actor unavailable, dropping connection");
        return;
    }

    while state == State::Ready {
        tokio::select! {
            incoming = framed.next() => {
                match incoming {
                    Some(Ok(bytes)) => {
                        if let Err(err) = dispatch(&bytes, codec, conn, &engine_tx, &own_outbox).await {
                            warn!(%addr, %err, "decode error, closing connection");
                            state = State::Closing;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(%addr, %err, "framing error, closing connection");
                        state = State::Closing;
                    }
                    None => {
                        debug!(%addr, "peer closed connection");
                        state = State::Closing;
                    }
                }
            }
            outgoing = outbox_rx.recv() => {
                match outgoing {
                    Some(frame) => {
                        if let Err(err) = send_frame(&mut framed, codec, &frame).await {
                            warn!(%addr, %err, "write failed, treating subscriber as dead");
                            state = State::Closing;
                        }
                    }
                    None => {
                        // Engine actor shut down; nothing left to deliver.
                        state = State::Closing;
                    }
                }
            }
        }
    }

    let _ = engine_tx.send(EngineCommand::Disconnect { conn });
}

/// Decodes one data-message frame under `codec` and dispatches it per
/// §4.2. `MESSAGE`/`LAST_MESSAGE`/`LIST_TOPICS_REP` arriving inbound (the
/// broker never sends itself one) and any `Method::Unrecognized` token are
/// "unknown method" per §7: the frame decoded fine, so it's simply dropped
/// rather than treated as a decode error that tears the connection down.
async fn dispatch(
    bytes: &[u8],
    codec: broker_protocol::Codec,
    conn: ConnId,
    engine_tx: &mpsc::UnboundedSender<EngineCommand>,
    own_outbox: &mpsc::UnboundedSender<WireFrame>,
) -> Result<(), broker_protocol::CodecError> {
    let frame = codec.decode(bytes)?;
    match frame.method {
        Method::Publish => {
            let _ = engine_tx.send(EngineCommand::Publish {
                topic: frame.topic,
                value: frame.msg,
            });
        }
        Method::Subscribe => {
            let _ = engine_tx.send(EngineCommand::Subscribe {
                topic: frame.topic,
                conn,
            });
        }
        Method::Cancel => {
            let _ = engine_tx.send(EngineCommand::Cancel {
                topic: frame.topic,
                conn,
            });
        }
        Method::List => {
            // The topic field is meaningless for LIST (§9): the reply
            // carries the topic list as its payload instead, and goes
            // straight back to this connection rather than through the
            // engine's fan-out path.
            let (reply_tx, reply_rx) = oneshot::channel();
            if engine_tx.send(EngineCommand::List { reply: reply_tx }).is_ok() {
                if let Ok(topics) = reply_rx.await {
                    let reply = WireFrame::new(
                        Method::ListTopicsRep,
                        String::new(),
                        Payload::from(topics),
                    );
                    let _ = own_outbox.send(reply);
                }
            }
        }
        Method::Message | Method::LastMessage | Method::ListTopicsRep | Method::Unrecognized(_) => {
            // §7: unknown method, frame already consumed, connection lives on.
        }
    }
    Ok(())
}

async fn send_frame<IO>(
    framed: &mut tokio_util::codec::Framed<IO, tokio_util::codec::LengthDelimitedCodec>,
    codec: broker_protocol::Codec,
    frame: &WireFrame,
) -> Result<(), broker_protocol::CodecError>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    let bytes = codec.encode(frame)?;
    framed
        .send(bytes.into())
        .await
        .map_err(|err| broker_protocol::CodecError::Encode {
            codec,
            reason: err.to_string(),
        })
}

fn next_conn_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
