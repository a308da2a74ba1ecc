//! Listener instances: each runs one sequential accept-and-handle loop

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::http::{read_request, write_response, Response};
use crate::routes::Handler;

/// Pause after a failed accept (e.g. fd exhaustion) before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// One bound port. Connections on it are handled strictly one at a time.
pub struct ServerInstance {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerInstance {
    pub async fn bind(
        host: &str,
        port: u16,
        handler: Arc<Handler>,
        read_timeout: Duration,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| ServerError::PortUnavailable { port, source })?;
        let addr = listener.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            listener,
            handler,
            read_timeout,
            running.clone(),
            shutdown_rx,
        ));

        info!(%addr, "Listening");
        Ok(Self {
            addr,
            running,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting and wait for the in-flight connection, if any.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
        info!(addr = %self.addr, "Listener stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<Handler>,
    read_timeout: Duration,
    running: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    while running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "Connection accepted");
                    handle_connection(stream, &handler, read_timeout).await;
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
    running.store(false, Ordering::SeqCst);
}

/// Serve one request. Never fails: errors become a best-effort 500, and
/// errors writing that are dropped.
pub async fn handle_connection(stream: TcpStream, handler: &Handler, read_timeout: Duration) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let outcome = async {
        let request = tokio::time::timeout(read_timeout, read_request(&mut reader))
            .await
            .map_err(|_| ServerError::Malformed("request read timed out"))??;
        let Some(request) = request else {
            return Ok(());
        };
        debug!(method = %request.method, path = %request.path, "Request");
        let response = handler.dispatch(&request).await?;
        write_response(&mut write_half, &response).await
    }
    .await;

    if let Err(e) = outcome {
        warn!(error = %e, "Client error");
        let _ = write_response(&mut write_half, &Response::internal_error()).await;
    }
}
