//! Process wiring: storage, relay, ingest loop and HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::IngestWorker;
use crate::platform;
use crate::relay::{RelayReceiver, RelaySender};
use crate::shutdown::ShutdownHandle;
use crate::storage::Storage;
use crate::web::{self, AppState};

/// A fully bound but not yet running formrelay instance.
///
/// Binding and running are separate so that startup failures surface before
/// any task is spawned and so tests can bind to port 0 and read back the
/// chosen addresses.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    storage: Storage,
    receiver: RelayReceiver,
    sender: RelaySender,
    listener: TcpListener,
}

impl Daemon {
    /// Prepare storage and bind the relay and HTTP sockets.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the record file
    /// cannot be prepared, or either socket cannot be bound.
    pub async fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let storage = Storage::open(&config.storage.path)?;
        let max_payload = config.relay.max_payload;

        let receiver = RelayReceiver::bind(config.relay_addr(), max_payload).await?;
        let sender = RelaySender::bind(receiver.local_addr()?, max_payload).await?;

        let http_addr = config.http_addr();
        let listener = TcpListener::bind(http_addr)
            .await
            .map_err(|source| Error::Bind {
                addr: http_addr,
                source,
            })?;

        Ok(Self {
            config,
            storage,
            receiver,
            sender,
            listener,
        })
    }

    /// Address the HTTP server is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn http_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Address the relay receiver is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn relay_addr(&self) -> Result<SocketAddr> {
        self.receiver.local_addr()
    }

    /// The record file this instance writes to.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Run the ingest loop and the HTTP server until `shutdown` fires.
    ///
    /// Both run as separate tasks; this returns once both have finished. If
    /// either task ends on its own the other is stopped as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails or a task panics.
    pub async fn run(self, shutdown: ShutdownHandle) -> Result<()> {
        let http_addr = self.http_addr()?;
        let Self {
            config,
            storage,
            receiver,
            sender,
            listener,
        } = self;

        let worker = IngestWorker::new(receiver, storage.clone(), config.storage.echo_table);
        let ingest = tokio::spawn(worker.run(shutdown.clone()));

        let app = web::router(AppState::new(storage, Arc::new(sender)), &config);
        let server_shutdown = shutdown.clone();
        let server = tokio::spawn(async move {
            info!("HTTP server listening on http://{}", http_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.wait().await })
                .await
        });

        join_tasks(server, ingest, &shutdown).await?;

        info!("formrelay stopped");
        Ok(())
    }
}

/// Wait for the server and ingest tasks, stopping both when either ends.
async fn join_tasks(
    mut server: JoinHandle<std::io::Result<()>>,
    mut ingest: JoinHandle<()>,
    shutdown: &ShutdownHandle,
) -> Result<()> {
    let (served, ingested) = tokio::select! {
        served = &mut server => (Some(served), None),
        ingested = &mut ingest => (None, Some(ingested)),
    };

    if !shutdown.is_triggered() {
        if ingested.is_some() {
            error!("Ingest loop stopped unexpectedly, shutting down");
        } else {
            error!("HTTP server stopped unexpectedly, shutting down");
        }
    }
    shutdown.trigger();

    let served = match served {
        Some(served) => served,
        None => server.await,
    };
    let ingested = match ingested {
        Some(ingested) => ingested,
        None => ingest.await,
    };

    ingested.map_err(|e| Error::internal(format!("ingest task failed: {e}")))?;
    served.map_err(|e| Error::internal(format!("HTTP server task failed: {e}")))??;
    Ok(())
}

/// Run formrelay in the foreground until Ctrl-C.
///
/// With `open_browser` set the front page is opened in the default browser
/// once the sockets are bound.
///
/// # Errors
///
/// Returns an error if startup fails or the server stops with an error.
pub async fn serve(config: Config, open_browser: bool) -> Result<()> {
    let daemon = Daemon::bind(config).await?;
    let shutdown = ShutdownHandle::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                signal.trigger();
            }
            Err(e) => error!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    if open_browser {
        let url = Config::browser_url(daemon.http_addr()?.port());
        match platform::open_url(&url) {
            Ok(()) => info!("Opened {} in the default browser", url),
            Err(e) => warn!("Could not open a browser at {}: {}", url, e),
        }
    }

    daemon.run(shutdown).await
}
