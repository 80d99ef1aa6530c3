//! Application state for HTTP handlers.

use std::sync::Arc;

use permtree_domain::graph::LocalDispatcher;
use permtree_domain::namespace::CachingNamespaceManager;
use permtree_storage::Datastore;

/// Default depth budget for expansions when the client sends none.
pub const DEFAULT_EXPAND_DEPTH: u16 = 50;

/// Application state shared across all HTTP handlers: the datastore, the
/// caching namespace manager over it, and the local dispatcher serving
/// expansions.
pub struct AppState<S> {
    pub datastore: Arc<S>,
    pub namespaces: Arc<CachingNamespaceManager<S>>,
    pub dispatcher: Arc<LocalDispatcher<S, CachingNamespaceManager<S>>>,
    pub default_depth: u16,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            datastore: Arc::clone(&self.datastore),
            namespaces: Arc::clone(&self.namespaces),
            dispatcher: Arc::clone(&self.dispatcher),
            default_depth: self.default_depth,
        }
    }
}

impl<S: Datastore + 'static> AppState<S> {
    /// Creates application state with the default expansion depth.
    pub fn new(datastore: Arc<S>) -> Self {
        Self::with_default_depth(datastore, DEFAULT_EXPAND_DEPTH)
    }

    /// Creates application state with a custom default expansion depth.
    pub fn with_default_depth(datastore: Arc<S>, default_depth: u16) -> Self {
        let namespaces = Arc::new(CachingNamespaceManager::new(Arc::clone(&datastore)));
        let dispatcher = LocalDispatcher::new(Arc::clone(&namespaces), Arc::clone(&datastore));
        Self {
            datastore,
            namespaces,
            dispatcher,
            default_depth,
        }
    }
}
