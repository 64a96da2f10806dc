// Persistence collaborators. The service owns no storage of record itself:
// rows live in the remote row store, with a local JSON fallback for ephemeral
// identities and remote outages.

pub mod local;
pub mod remote;

use serde::Serialize;

/// Which store actually served an operation. Callers render this as the
/// "saved locally" advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Remote,
    Local,
}
