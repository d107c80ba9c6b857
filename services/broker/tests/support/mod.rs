//! Shared test harness: spawns a real broker on an ephemeral port and gives
//! tests a framed client to drive it over an actual `TcpStream`, the same
//! pattern `services/server/tests/admin.rs`'s `make_server` helper uses for
//! the teacher's HTTP service.

use std::net::SocketAddr;
use std::time::Duration;

use broker::Config;
use broker_protocol::{encode_handshake, new_framed, Codec};
use futures::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

pub struct RunningBroker {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl RunningBroker {
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.handle.await;
    }
}

pub async fn spawn_broker() -> RunningBroker {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config {
        bind_addr: addr.to_string(),
        log_level: "error".to_owned(),
    };
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        broker::run(config, async {
            let _ = stop_rx.await;
        })
        .await
        .unwrap();
    });
    // Give the listener a moment to bind before clients connect.
    tokio::time::sleep(Duration::from_millis(20)).await;
    RunningBroker {
        addr,
        handle,
        stop: stop_tx,
    }
}

pub type ClientStream = Framed<TcpStream, LengthDelimitedCodec>;

pub async fn connect(addr: SocketAddr, codec: Codec) -> ClientStream {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut framed = new_framed(stream);
    framed.send(encode_handshake(codec).into()).await.unwrap();
    framed
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
