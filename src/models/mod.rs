//! Domain models for devlog-relay.
//!
//! # Core Concepts
//!
//! - [`Project`]: A remote project as reported by the source API, carrying the
//!   authoritative list of its devlog ids.
//! - [`Devlog`]: A single timestamped entry on a project. Immutable once fetched.
//! - [`Registration`]: What a credential owns: the Slack channel to notify and
//!   the projects it tracks.

mod devlog;
mod project;
mod registration;

pub use devlog::*;
pub use project::*;
pub use registration::*;

/// Identifier of a project on the source API.
pub type ProjectId = u64;

/// Identifier of a devlog on the source API.
pub type DevlogId = u64;
