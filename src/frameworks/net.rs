//! TCP transport: line-framed reader and writer tasks per connection.
//!
//! Each connection owns a receive loop that forwards whole lines into the
//! session event channel, and a writer loop draining that connection's
//! outbound queue. The runtime loop is the only consumer of events, so
//! inbound messages are applied between ticks, never during one.

use crate::frameworks::config;
use crate::interface_adapters::session::SessionEvent;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, mpsc};

static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// Accept loop for a hosting process. Holds connections to
/// [`config::MAX_REMOTE_PEERS`]; further dials wait in the backlog until a
/// permit frees up.
pub async fn listen(listener: TcpListener, events: mpsc::Sender<SessionEvent>) {
    let permits = Arc::new(Semaphore::new(config::MAX_REMOTE_PEERS));
    loop {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        let (stream, address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                continue;
            }
        };
        let peer = NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed);
        tracing::info!(peer, %address, "connection accepted");
        let events = events.clone();
        tokio::spawn(async move {
            drive_connection(peer, stream, events).await;
            drop(permit);
        });
    }
}

/// Dials a host. A single attempt; failure is terminal and reported upward.
pub async fn connect(
    address: &str,
    events: mpsc::Sender<SessionEvent>,
) -> std::io::Result<()> {
    let stream = TcpStream::connect(address).await.inspect_err(|error| {
        tracing::error!(%address, %error, "connect failed");
    })?;
    let peer = NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed);
    tracing::info!(peer, %address, "connected");
    tokio::spawn(async move {
        drive_connection(peer, stream, events).await;
    });
    Ok(())
}

/// Runs one connection to completion: announce it, pump lines both ways,
/// then announce the disconnect. EOF, a read error, or a closed outbound
/// queue all end the connection.
async fn drive_connection(peer: u64, stream: TcpStream, events: mpsc::Sender<SessionEvent>) {
    let (outbound_tx, mut outbound_rx) =
        mpsc::channel::<String>(config::OUTBOUND_CHANNEL_CAPACITY);
    if events
        .send(SessionEvent::Connected {
            peer,
            tx: outbound_tx,
        })
        .await
        .is_err()
    {
        return;
    }

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    loop {
        tokio::select! {
            inbound = lines.next_line() => {
                match inbound {
                    Ok(Some(line)) => {
                        if events.send(SessionEvent::Line { peer, line }).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!(peer, "peer closed the stream");
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(peer, %error, "read failed");
                        break;
                    }
                }
            }
            outbound = outbound_rx.recv() => {
                let Some(mut line) = outbound else {
                    break;
                };
                line.push('\n');
                if let Err(error) = write_half.write_all(line.as_bytes()).await {
                    tracing::warn!(peer, %error, "write failed");
                    break;
                }
            }
        }
    }
    let _ = events.send(SessionEvent::Disconnected { peer }).await;
}
