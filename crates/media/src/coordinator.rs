//! Page-wide coordination of video elements.
//!
//! One coordinator per window owns the player API script gate and the
//! registry of live instances.

use crate::config::PlayerConfig;
use crate::error::PlayerError;
use crate::native::PlayerFactory;
use crate::registry::PlayerRegistry;
use crate::video::{VideoShared, YoutubeVideo};
use dom::{CallbackToken, GlobalCallback, NodeId, Window};
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use networking::ScriptLoader;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Resolves once the API script has loaded and its ready callback fired.
pub type ScriptReady = Shared<BoxFuture<'static, Result<(), PlayerError>>>;

struct ScriptGate {
    generation: u64,
    ready: ScriptReady,
    token: CallbackToken,
}

/// Shared state for every video element on a page.
pub struct PlayerCoordinator {
    me: Weak<Self>,
    config: PlayerConfig,
    window: Arc<Window>,
    loader: Arc<dyn ScriptLoader>,
    factory: Arc<dyn PlayerFactory>,
    pub(crate) registry: PlayerRegistry<VideoShared>,
    gate: Mutex<Option<ScriptGate>>,
    generations: AtomicU64,
}

impl PlayerCoordinator {
    pub fn new(
        window: Arc<Window>,
        loader: Arc<dyn ScriptLoader>,
        factory: Arc<dyn PlayerFactory>,
    ) -> Arc<Self> {
        Self::with_config(PlayerConfig::default(), window, loader, factory)
    }

    pub fn with_config(
        config: PlayerConfig,
        window: Arc<Window>,
        loader: Arc<dyn ScriptLoader>,
        factory: Arc<dyn PlayerFactory>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            window,
            loader,
            factory,
            registry: PlayerRegistry::new(),
            gate: Mutex::new(None),
            generations: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub(crate) fn factory(&self) -> &Arc<dyn PlayerFactory> {
        &self.factory
    }

    /// Wrap `element` as a video instance and register it.
    pub fn create_video(self: &Arc<Self>, element: NodeId) -> YoutubeVideo {
        YoutubeVideo::new(self, element)
    }

    /// Number of registered instances.
    pub fn live_instances(&self) -> usize {
        self.registry.len()
    }

    /// Whether a script gate is pending or resolved.
    pub fn script_requested(&self) -> bool {
        self.gate.lock().is_some()
    }

    /// Single-flight gate on the player API script.
    ///
    /// Every caller gets the same future until the gate is released or fails.
    /// Fails with [`PlayerError::ReadyCallbackOccupied`] when another script
    /// already owns the window's ready callback.
    pub fn ensure_script_loaded(&self) -> ScriptReady {
        let mut gate = self.gate.lock();
        if let Some(existing) = gate.as_ref() {
            return existing.ready.clone();
        }

        let name = self.config.ready_callback.clone();
        let (tx, rx) = oneshot::channel::<()>();
        let sender = Mutex::new(Some(tx));
        let window = Arc::downgrade(&self.window);
        let callback_name = name.clone();
        let handler: GlobalCallback = Arc::new(move || {
            if let Some(window) = window.upgrade() {
                window.remove_global_callback(&callback_name);
            }
            if let Some(tx) = sender.lock().take() {
                let _ = tx.send(());
            }
        });

        let Some(token) = self.window.install_global_callback_if_vacant(&name, handler) else {
            warn!(callback = %name, "Ready callback already owned by another script");
            return future::ready(Err(PlayerError::ReadyCallbackOccupied(name)))
                .boxed()
                .shared();
        };

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let loader = Arc::clone(&self.loader);
        let url = self.config.script_url.clone();
        let me = self.me.clone();

        let ready = async move {
            let loaded = async { loader.load_script(&url).await.map_err(PlayerError::from) };
            let fired = async { rx.await.map_err(|_| PlayerError::ScriptReleased) };
            let result = future::try_join(loaded, fired).await.map(|_| ());

            match &result {
                Ok(()) => info!(url = %url, "Player API ready"),
                Err(err) => {
                    error!(url = %url, error = %err, "Player API failed to load");
                    if let Some(me) = me.upgrade() {
                        me.discard_gate(generation);
                    }
                }
            }
            result
        }
        .boxed()
        .shared();

        debug!(generation, "Requested player API script");
        *gate = Some(ScriptGate {
            generation,
            ready: ready.clone(),
            token,
        });
        ready
    }

    /// Drop a failed gate so the next load starts a fresh cycle.
    fn discard_gate(&self, generation: u64) {
        let discarded = {
            let mut gate = self.gate.lock();
            match gate.as_ref() {
                Some(current) if current.generation == generation => gate.take(),
                _ => None,
            }
        };
        if let Some(gate) = discarded {
            self.window
                .remove_global_callback_if(&self.config.ready_callback, gate.token);
        }
    }

    /// Discard the gate now and return a future that unloads the script.
    ///
    /// Our ready callback is removed if it never fired; a callback installed
    /// since by someone else is left alone. The next load starts a fresh
    /// gate whether or not the returned future is polled; dropping it only
    /// leaves the old `<script>` tag in the document.
    pub fn release_script(&self) -> BoxFuture<'static, ()> {
        let released = self.gate.lock().take();
        if let Some(gate) = released {
            debug!(generation = gate.generation, "Discarded player API gate");
            self.window
                .remove_global_callback_if(&self.config.ready_callback, gate.token);
        }

        let loader = Arc::clone(&self.loader);
        let url = self.config.script_url.clone();
        async move {
            match loader.unload_script(&url).await {
                Ok(()) => info!(url = %url, "Released player API script"),
                Err(err) => warn!(url = %url, error = %err, "Failed to unload player API script"),
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for PlayerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCoordinator")
            .field("config", &self.config)
            .field("live_instances", &self.registry.len())
            .field("script_requested", &self.script_requested())
            .finish_non_exhaustive()
    }
}
