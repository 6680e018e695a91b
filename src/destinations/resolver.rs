//! # Destination resolution.
//!
//! [`ResolveDestination`] maps `(artifact, source, client_id, flow_id)` to a
//! [`Destination`]. The broker resolves once per `route` call and then
//! dispatches on the destination's kind.
//!
//! [`ArtifactCatalog`] is the in-process implementation: a registry of
//! [`ArtifactDefinition`]s with stable path conventions:
//!
//! ```text
//! client-scoped plain:  clients/<client>/artifacts/<artifact[/source]>/<flow>
//! server plain:         server_artifacts/<artifact[/source]>
//! event:                server_events/<artifact[/source]>   (path prefix)
//! ```
//!
//! Event streams use the queue name (`artifact` or `artifact/source`) as
//! their subscription identity regardless of how the backend partitions the
//! prefix.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::destinations::{Destination, DestinationKind};
use crate::error::JournalError;

/// Resolution seam between callers and path layout.
///
/// Implementations must be pure with respect to their inputs: resolving the
/// same spec twice yields the same destination.
pub trait ResolveDestination: Send + Sync {
    /// Resolves a destination spec, or fails with [`JournalError::Resolution`].
    fn resolve(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
    ) -> Result<Destination, JournalError>;
}

/// Definition of one artifact known to the catalog.
#[derive(Clone, Debug)]
pub struct ArtifactDefinition {
    /// Artifact name, e.g. `Generic.Client.Info`.
    pub name: String,
    /// Plain (cumulative log) or event (live stream).
    pub kind: DestinationKind,
    /// True when results are stored per client/flow rather than server-wide.
    pub client_scoped: bool,
}

impl ArtifactDefinition {
    /// Convenience constructor for a server-side plain artifact.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DestinationKind::Plain,
            client_scoped: false,
        }
    }

    /// Convenience constructor for a client-scoped plain artifact.
    pub fn client_plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DestinationKind::Plain,
            client_scoped: true,
        }
    }

    /// Convenience constructor for an event artifact.
    pub fn event(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DestinationKind::Event,
            client_scoped: false,
        }
    }
}

/// In-process registry of artifact definitions.
///
/// Definitions may be registered at any time; resolution takes a short read
/// lock only. Unknown artifacts and client-scoped artifacts resolved without
/// client/flow identifiers fail with [`JournalError::Resolution`].
#[derive(Default)]
pub struct ArtifactCatalog {
    defs: RwLock<HashMap<String, ArtifactDefinition>>,
}

impl ArtifactCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a definition.
    pub fn register(&self, def: ArtifactDefinition) {
        let mut defs = self.defs.write().unwrap_or_else(|e| e.into_inner());
        defs.insert(def.name.clone(), def);
    }

    fn lookup(&self, artifact: &str) -> Option<ArtifactDefinition> {
        let defs = self.defs.read().unwrap_or_else(|e| e.into_inner());
        defs.get(artifact).cloned()
    }
}

fn queue_name(artifact: &str, source: Option<&str>) -> String {
    match source {
        Some(source) if !source.is_empty() => format!("{artifact}/{source}"),
        _ => artifact.to_string(),
    }
}

impl ResolveDestination for ArtifactCatalog {
    fn resolve(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
    ) -> Result<Destination, JournalError> {
        let def = self
            .lookup(artifact)
            .ok_or_else(|| JournalError::resolution(artifact, "unknown artifact"))?;

        let queue = queue_name(artifact, source);

        let path = match def.kind {
            DestinationKind::Event => format!("server_events/{queue}"),
            DestinationKind::Plain if def.client_scoped => {
                let client = client_id.filter(|c| !c.is_empty()).ok_or_else(|| {
                    JournalError::resolution(artifact, "client-scoped artifact requires client_id")
                })?;
                let flow = flow_id.filter(|f| !f.is_empty()).ok_or_else(|| {
                    JournalError::resolution(artifact, "client-scoped artifact requires flow_id")
                })?;
                format!("clients/{client}/artifacts/{queue}/{flow}")
            }
            DestinationKind::Plain => format!("server_artifacts/{queue}"),
        };

        Ok(Destination {
            queue_name: queue,
            path,
            kind: def.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ArtifactCatalog {
        let catalog = ArtifactCatalog::new();
        catalog.register(ArtifactDefinition::client_plain("Generic.Client.Info"));
        catalog.register(ArtifactDefinition::plain("Server.Audit.Logs"));
        catalog.register(ArtifactDefinition::event("Server.Monitor.Health"));
        catalog
    }

    #[test]
    fn test_client_scoped_plain_path() {
        let dest = catalog()
            .resolve("Generic.Client.Info", None, Some("C.1"), Some("F.2"))
            .unwrap();
        assert_eq!(dest.kind, DestinationKind::Plain);
        assert_eq!(dest.path, "clients/C.1/artifacts/Generic.Client.Info/F.2");
    }

    #[test]
    fn test_source_extends_queue_name() {
        let dest = catalog()
            .resolve("Server.Monitor.Health", Some("Prometheus"), None, None)
            .unwrap();
        assert!(dest.is_event());
        assert_eq!(dest.queue_name, "Server.Monitor.Health/Prometheus");
        assert_eq!(dest.path, "server_events/Server.Monitor.Health/Prometheus");
    }

    #[test]
    fn test_unknown_artifact_fails_resolution() {
        let err = catalog().resolve("No.Such.Artifact", None, None, None).unwrap_err();
        assert_eq!(err.as_label(), "resolution_failed");
    }

    #[test]
    fn test_client_scoped_requires_identifiers() {
        let err = catalog()
            .resolve("Generic.Client.Info", None, None, None)
            .unwrap_err();
        assert!(matches!(err, JournalError::Resolution { .. }));

        let err = catalog()
            .resolve("Generic.Client.Info", None, Some("C.1"), Some(""))
            .unwrap_err();
        assert!(matches!(err, JournalError::Resolution { .. }));
    }

    #[test]
    fn test_resolution_is_stable() {
        let catalog = catalog();
        let first = catalog.resolve("Server.Audit.Logs", None, None, None).unwrap();
        let second = catalog.resolve("Server.Audit.Logs", None, None, None).unwrap();
        assert_eq!(first, second);
    }
}
