//! Destinations: logical log names and their resolution.
//!
//! A destination is the write target derived from an artifact name plus an
//! optional source qualifier and, for client-scoped artifacts, a client and
//! flow identifier. Classification (plain vs event) is a static property of
//! the artifact definition, resolved once per `route` call, never per row.
//!
//! ## Contents
//! - [`Destination`], [`DestinationKind`] — resolved write target
//! - [`ResolveDestination`] — the resolution seam
//! - [`ArtifactCatalog`], [`ArtifactDefinition`] — in-process resolver

mod destination;
mod resolver;

pub use destination::{Destination, DestinationKind};
pub use resolver::{ArtifactCatalog, ArtifactDefinition, ResolveDestination};
