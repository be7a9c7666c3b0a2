use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a single source API credential is used for.
///
/// Project ids are kept as strings because that is how the registry file
/// stores them; the sync parses them when it walks the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    /// Slack channel that receives notifications for these projects.
    pub channel: String,
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Credential → registration, in registration order.
pub type Registrations = IndexMap<String, Registration>;

/// Input for registering a credential (or adding projects to an existing one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub credential: String,
    pub channel: String,
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Input for re-keying the credential owned by a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RekeyInput {
    pub credential: String,
}
