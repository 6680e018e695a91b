//! # ReplicationJournal: the minion-side forwarding stub.
//!
//! Non-authoritative nodes have no local authority over storage, so their
//! journal is a stub that implements the same [`Journal`] contract as the
//! broker but forwards every operation to the authoritative node over a
//! [`ReplicationTransport`]. No local append store or backend is touched.
//!
//! ## Rules
//! - Remote failures surface to the caller exactly as local ones would; a
//!   remote failure is never masked as success.
//! - `watch` forwards the subscription upstream. If the transport cannot
//!   establish it, the stub returns an idle handle and logs the failure —
//!   it never serves stale or local-only data.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::JournalError;
use crate::journal::{Journal, WatchHandle};
use crate::rows::Row;

/// Transport to the authoritative node's broker.
///
/// The wire protocol is out of scope here; implementations typically wrap
/// the cluster's API client. Every method maps one-to-one onto the remote
/// journal's contract.
#[async_trait]
pub trait ReplicationTransport: Send + Sync + 'static {
    /// Startup probe. Failing here makes the process fall back to a local
    /// journal rather than crash (degraded, local-only operation).
    async fn connect(&self) -> Result<(), JournalError>;

    /// Forwards a direct append to a known path.
    async fn append(&self, path: &str, rows: &[Row]) -> Result<(), JournalError>;

    /// Forwards an artifact-addressed write.
    async fn push_rows(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
        rows: &[Row],
    ) -> Result<(), JournalError>;

    /// Forwards a subscription to the authoritative node.
    async fn watch(
        &self,
        queue_name: &str,
        token: CancellationToken,
    ) -> Result<WatchHandle, JournalError>;
}

/// Journal implementation active on minion nodes.
pub struct ReplicationJournal {
    transport: Arc<dyn ReplicationTransport>,
}

impl std::fmt::Debug for ReplicationJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationJournal").finish_non_exhaustive()
    }
}

impl ReplicationJournal {
    /// Probes the transport and, on success, returns the forwarding stub.
    ///
    /// # Errors
    /// [`JournalError::Replication`] when the authoritative node cannot be
    /// reached; the caller is expected to fall back to a local journal.
    pub async fn connect(transport: Arc<dyn ReplicationTransport>) -> Result<Self, JournalError> {
        transport.connect().await?;
        info!("replication journal connected to authoritative node");
        Ok(Self { transport })
    }
}

#[async_trait]
impl Journal for ReplicationJournal {
    async fn append(&self, path: &str, rows: &[Row]) -> Result<(), JournalError> {
        self.transport.append(path, rows).await
    }

    async fn push_rows(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
        rows: &[Row],
    ) -> Result<(), JournalError> {
        self.transport
            .push_rows(artifact, source, client_id, flow_id, rows)
            .await
    }

    async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle {
        match self.transport.watch(queue_name, token.clone()).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(
                    queue = queue_name,
                    error = %err,
                    "remote watch failed; subscription will not deliver"
                );
                WatchHandle::idle(&token)
            }
        }
    }
}
