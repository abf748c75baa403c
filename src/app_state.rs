use crate::cli::CommandLineArgs;
use crate::store::DatasetStore;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Dataset store, pre-populated with the sample dataset.
    pub store: DatasetStore,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        Self {
            args: args.clone(),
            store: DatasetStore::with_sample(),
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
