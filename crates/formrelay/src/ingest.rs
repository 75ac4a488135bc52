//! The ingest loop: the only writer of the record file.
//!
//! Datagrams are handled strictly one at a time. Each payload is parsed as a
//! form body, stamped with the current local time and merged into the record
//! file. Bad payloads are logged and dropped; the loop itself only ends on
//! shutdown.

use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::format::render_table;
use crate::form::parse_form;
use crate::record::timestamp_now;
use crate::relay::{Datagram, RelayReceiver};
use crate::shutdown::ShutdownHandle;
use crate::storage::Storage;

/// Consumes relay datagrams and persists them as records.
#[derive(Debug)]
pub struct IngestWorker {
    receiver: RelayReceiver,
    storage: Storage,
    echo_table: bool,
}

impl IngestWorker {
    /// Create a worker reading from `receiver` and writing to `storage`.
    ///
    /// With `echo_table` set, the full record table is printed to stdout
    /// after every stored submission.
    #[must_use]
    pub fn new(receiver: RelayReceiver, storage: Storage, echo_table: bool) -> Self {
        Self {
            receiver,
            storage,
            echo_table,
        }
    }

    /// Receive and store datagrams until `shutdown` fires.
    ///
    /// A payload already being stored is finished first; datagrams still
    /// queued on the socket are not drained.
    pub async fn run(mut self, shutdown: ShutdownHandle) {
        match self.receiver.local_addr() {
            Ok(addr) => info!("Ingest loop listening on udp://{}", addr),
            Err(_) => info!("Ingest loop started"),
        }

        loop {
            let received = tokio::select! {
                () = shutdown.wait() => break,
                received = self.receiver.receive() => received,
            };

            match received {
                Ok(Datagram::Payload(payload)) => {
                    if let Err(e) = self.handle_payload(&payload).await {
                        if e.is_form_error() {
                            warn!("Dropping submission: {}", e);
                        } else {
                            error!("Failed to store submission: {}", e);
                        }
                    }
                }
                Ok(Datagram::Oversize { len }) => {
                    warn!("Dropping oversize datagram ({} bytes or more)", len);
                }
                Err(e) => error!("Relay receive error: {}", e),
            }
        }

        info!("Ingest loop stopped");
    }

    /// Parse one payload and append it to the record file.
    ///
    /// File access runs on the blocking thread pool and is awaited before
    /// returning. Returns the key the record was stored under.
    ///
    /// # Errors
    ///
    /// Returns a form error for a malformed body, or a storage error if the
    /// record file cannot be loaded or saved. The record file is unchanged on
    /// error.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<String> {
        let record = parse_form(payload)?;
        let (key, store) = self.storage.append_async(record, timestamp_now()).await?;
        debug!("Stored submission as {}", key);

        if self.echo_table {
            println!("{}", render_table(&store));
        }
        Ok(key)
    }
}
