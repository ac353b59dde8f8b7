//! Script tag loading for third-party APIs.

use crate::fetcher::{HttpScriptFetcher, ScriptFetcher, DEFAULT_CONNECT_TIMEOUT};
use async_trait::async_trait;
use dom::{Event, EventType, NodeId, Window};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Load error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },
    #[error("Timeout")]
    Timeout,
    #[error("Cancelled")]
    Cancelled,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Loads and unloads `<script>` tags by URL.
///
/// Concurrent loads of the same URL must share one tag and one fetch.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Resolves once the script's `load` event has fired.
    async fn load_script(&self, url: &str) -> Result<(), LoadError>;

    /// Remove the script tag. Unloading a script that is not loaded is a no-op.
    async fn unload_script(&self, url: &str) -> Result<(), LoadError>;
}

/// Where new script tags are inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptPlacement {
    /// Before the first `<script>` in the document, falling back to `<head>`.
    #[default]
    BeforeFirstScript,
    Head,
    Body,
}

/// Loader configuration.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Request timeout.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Set the `async` attribute on inserted tags.
    pub mark_async: bool,
    pub placement: ScriptPlacement,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_redirects: 10,
            user_agent: format!("youtube-media/{}", env!("CARGO_PKG_VERSION")),
            mark_async: true,
            placement: ScriptPlacement::default(),
        }
    }
}

impl LoaderConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_placement(mut self, placement: ScriptPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_async(mut self, mark_async: bool) -> Self {
        self.mark_async = mark_async;
        self
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<(), LoadError>>>;

struct ScriptEntry {
    node: NodeId,
    generation: u64,
    load: SharedLoad,
}

type ScriptTable = Mutex<HashMap<String, ScriptEntry>>;

/// Script loader that manages real `<script>` elements in a window's
/// document and fetches their bodies through a [`ScriptFetcher`].
pub struct ResourceManager {
    window: Arc<Window>,
    fetcher: Arc<dyn ScriptFetcher>,
    config: LoaderConfig,
    scripts: Arc<ScriptTable>,
    next_generation: AtomicU64,
}

impl ResourceManager {
    pub fn new(window: Arc<Window>, fetcher: Arc<dyn ScriptFetcher>) -> Self {
        Self::with_config(window, fetcher, LoaderConfig::default())
    }

    pub fn with_config(window: Arc<Window>, fetcher: Arc<dyn ScriptFetcher>, config: LoaderConfig) -> Self {
        Self {
            window,
            fetcher,
            config,
            scripts: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// A manager fetching over HTTP.
    pub fn http(window: Arc<Window>, config: LoaderConfig) -> Result<Self, LoadError> {
        let fetcher = Arc::new(HttpScriptFetcher::with_config(&config)?);
        Ok(Self::with_config(window, fetcher, config))
    }

    /// Whether a load for `url` is pending or has completed.
    pub fn is_tracked(&self, url: &str) -> bool {
        self.scripts.lock().contains_key(url)
    }

    /// Number of tracked scripts.
    pub fn tracked_count(&self) -> usize {
        self.scripts.lock().len()
    }

    fn start_load(&self, url: &str) -> Result<SharedLoad, LoadError> {
        let mut scripts = self.scripts.lock();
        if let Some(entry) = scripts.get(url) {
            debug!(url, "Joining in-flight script load");
            return Ok(entry.load.clone());
        }

        let (node, resolved) = {
            let mut doc = self.window.document.write();
            let resolved = doc
                .resolve_url(url)
                .map_err(|e| LoadError::InvalidUrl(format!("{}: {}", url, e)))?;

            let node = doc.create_element("script");
            if let Some(script) = doc.tree.get_element_mut(node) {
                script.set_attribute("src", url);
                if self.config.mark_async {
                    script.set_attribute("async", "");
                }
            }

            let first_script = doc.get_elements_by_tag_name("script").into_iter().next();
            let (parent, reference) = match self.config.placement {
                ScriptPlacement::BeforeFirstScript => match first_script {
                    Some(first) => (doc.tree.parent(first), Some(first)),
                    None => (doc.head.or(doc.body), None),
                },
                ScriptPlacement::Head => (doc.head.or(doc.body), None),
                ScriptPlacement::Body => (doc.body.or(doc.head), None),
            };
            let parent = parent.unwrap_or_else(|| doc.tree.root());
            doc.tree.insert_before(parent, node, reference);

            (node, resolved)
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let fetcher = Arc::clone(&self.fetcher);
        let window = Arc::downgrade(&self.window);
        let table = Arc::downgrade(&self.scripts);
        let key = url.to_string();

        let load = async move {
            let result = fetcher.fetch(&resolved).await.map(|_| ());
            finish_load(&table, &window, &key, generation, node, result)
        }
        .boxed()
        .shared();

        info!(url, "Inserted script tag");
        scripts.insert(
            url.to_string(),
            ScriptEntry {
                node,
                generation,
                load: load.clone(),
            },
        );
        Ok(load)
    }
}

/// Settle a fetch: fire `load` or `error` on the tag. Failed tags are removed
/// so a later load starts over.
fn finish_load(
    table: &Weak<ScriptTable>,
    window: &Weak<Window>,
    url: &str,
    generation: u64,
    node: NodeId,
    result: Result<(), LoadError>,
) -> Result<(), LoadError> {
    let (Some(table), Some(window)) = (table.upgrade(), window.upgrade()) else {
        return Err(LoadError::Cancelled);
    };

    let current = table
        .lock()
        .get(url)
        .map_or(false, |entry| entry.generation == generation);
    if !current {
        debug!(url, "Script was unloaded before it finished loading");
        return Err(LoadError::Cancelled);
    }

    match result {
        Ok(()) => {
            info!(url, "Script loaded");
            window.dispatch_event(node, Event::new(EventType::Load));
            Ok(())
        }
        Err(err) => {
            warn!(url, error = %err, "Script failed to load");
            window.dispatch_event(node, Event::error(err.to_string()));
            {
                let mut scripts = table.lock();
                if scripts.get(url).map_or(false, |e| e.generation == generation) {
                    scripts.remove(url);
                }
            }
            window.document.write().tree.remove(node);
            Err(err)
        }
    }
}

#[async_trait]
impl ScriptLoader for ResourceManager {
    async fn load_script(&self, url: &str) -> Result<(), LoadError> {
        let load = self.start_load(url)?;
        load.await
    }

    async fn unload_script(&self, url: &str) -> Result<(), LoadError> {
        let Some(entry) = self.scripts.lock().remove(url) else {
            debug!(url, "Unload of untracked script ignored");
            return Ok(());
        };
        self.window.document.write().tree.remove(entry.node);
        info!(url, "Removed script tag");
        Ok(())
    }
}
