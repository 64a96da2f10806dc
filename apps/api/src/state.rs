use std::sync::Arc;

use crate::config::Config;
use crate::lifecycle::LifecycleManager;
use crate::store::remote::RemoteClient;
use crate::suggestions::SuggestionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single authority over application records and store selection.
    pub lifecycle: Arc<LifecycleManager>,
    /// Row-store client for the social tables (profiles, friends).
    pub remote: RemoteClient,
    /// Pluggable suggestion backend. Default: CannedSuggester. Swap via SUGGESTIONS_URL env.
    pub suggester: Arc<dyn SuggestionProvider>,
    pub config: Config,
}
