//! The `<youtube-video>` element.
//!
//! Lifecycle: `Unloaded -> Loading -> Ready -> Destroyed`. `load()` wraps the
//! element in a container, waits for the player API script, builds the
//! native player once, and memoizes the whole operation. `destroy()` is
//! terminal and puts the DOM back the way it was found.

use crate::coordinator::{PlayerCoordinator, ScriptReady};
use crate::error::PlayerError;
use crate::media_element::{MediaElement, MediaNetworkState, MediaReadyState};
use crate::native::{PlayerEvents, PlayerHandle, PlayerOptions, PlayerVar, PlayerVars};
use crate::url::{extract_video_id, parse_query_params};
use dom::{ElementData, Event, EventCallback, EventListenerOptions, EventType, ListenerId, NodeId, TagName};
use futures::channel::oneshot;
use futures::future::{self, AbortHandle, Abortable, BoxFuture, FutureExt, Shared};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// The memoized result of `load()`: the ready native player.
pub type PlayerFuture = Shared<BoxFuture<'static, Result<PlayerHandle, PlayerError>>>;

/// Lifecycle state of a video element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Unloaded,
    Loading,
    Ready,
    Destroyed,
}

/// DOM nodes created by `load()`.
#[derive(Debug)]
struct Wrapping {
    container: NodeId,
    mount: Option<NodeId>,
    original_parent: NodeId,
    original_style: Option<String>,
}

struct Lifecycle {
    state: LifecycleState,
    wrapping: Option<Wrapping>,
    /// Handle returned by the factory (or passed to `on_ready`).
    native: Option<PlayerHandle>,
    /// Set by `on_ready`; commands are only forwarded once ready.
    ready: bool,
    load: Option<PlayerFuture>,
    abort: Option<AbortHandle>,
    build: Option<PlayerFuture>,
    settle: Option<oneshot::Sender<Result<PlayerHandle, PlayerError>>>,
    /// Bumped by every build and by a failed load. Native callbacks carry the
    /// attempt they were created for and are dropped once it is stale.
    attempt: u64,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: LifecycleState::Unloaded,
            wrapping: None,
            native: None,
            ready: false,
            load: None,
            abort: None,
            build: None,
            settle: None,
            attempt: 0,
        }
    }

    /// Whether callbacks from build `attempt` still apply to this instance.
    fn accepts(&self, attempt: u64) -> bool {
        self.state != LifecycleState::Destroyed && self.attempt == attempt
    }

    fn ready_player(&self) -> Option<PlayerHandle> {
        if self.ready && self.state != LifecycleState::Destroyed {
            self.native.clone()
        } else {
            None
        }
    }

    fn container(&self) -> Option<NodeId> {
        self.wrapping.as_ref().map(|w| w.container)
    }
}

fn failed(err: PlayerError) -> PlayerFuture {
    future::ready(Err(err)).boxed().shared()
}

/// State shared by every handle to one video element.
pub(crate) struct VideoShared {
    pub(crate) id: u64,
    pub(crate) coordinator: Arc<PlayerCoordinator>,
    pub(crate) element: NodeId,
    pub(crate) media: MediaElement,
    source: OnceCell<Option<String>>,
    video_id: OnceCell<String>,
    lifecycle: Mutex<Lifecycle>,
}

/// A YouTube-backed video element.
///
/// Cloning yields another handle to the same element.
#[derive(Clone)]
pub struct YoutubeVideo {
    shared: Arc<VideoShared>,
}

impl YoutubeVideo {
    /// Register `element` as a video instance of `coordinator`.
    pub fn new(coordinator: &Arc<PlayerCoordinator>, element: NodeId) -> Self {
        let id = coordinator.registry.next_id();
        let shared = Arc::new(VideoShared {
            id,
            coordinator: Arc::clone(coordinator),
            element,
            media: MediaElement::new(),
            source: OnceCell::new(),
            video_id: OnceCell::new(),
            lifecycle: Mutex::new(Lifecycle::new()),
        });
        coordinator.registry.insert(id, &shared);
        debug!(instance = id, "Registered video element");
        Self { shared }
    }

    /// Instance id, unique among live instances.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// The wrapped element.
    pub fn element(&self) -> NodeId {
        self.shared.element
    }

    /// The element's own `id` attribute. Mount and container ids are derived
    /// from [`YoutubeVideo::id`] instead, so they never collide with it.
    pub fn element_id(&self) -> Option<String> {
        self.shared.attribute("id")
    }

    /// The container that replaces the element while loaded.
    pub fn container(&self) -> Option<NodeId> {
        self.shared.lifecycle.lock().container()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.lifecycle.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.shared.lifecycle.lock().ready_player().is_some()
    }

    /// The source URL: `src`, or the first `<source type="video/youtube">`.
    pub fn source_url(&self) -> Option<String> {
        self.shared.source_url()
    }

    pub fn video_id(&self) -> String {
        self.shared.video_id()
    }

    /// Options passed to the native player, explicit options first.
    pub fn player_vars(&self) -> PlayerVars {
        self.shared.player_vars()
    }

    pub fn media(&self) -> &MediaElement {
        &self.shared.media
    }

    /// Last known play state, as reported by the native player.
    pub fn paused(&self) -> bool {
        self.shared.media.paused()
    }

    pub fn error(&self) -> Option<PlayerError> {
        self.shared.media.error()
    }

    /// Start loading. Idempotent: every call before `destroy()` returns the
    /// same future, and the player is constructed at most once.
    ///
    /// Like any future, nothing past the DOM setup happens until it is polled.
    pub fn load(&self) -> PlayerFuture {
        self.shared.load()
    }

    /// Build the native player, or return the in-flight build.
    pub fn build_player(&self) -> PlayerFuture {
        self.shared.build_player()
    }

    /// Ask the native player to play.
    ///
    /// Without a source this records and dispatches [`PlayerError::NoSource`]
    /// and returns it. Before the player is ready it does nothing.
    pub fn play(&self) -> Result<(), PlayerError> {
        self.shared.play()
    }

    /// Ask the native player to pause. No-op before ready.
    pub fn pause(&self) {
        let native = self.shared.lifecycle.lock().ready_player();
        if let Some(native) = native {
            native.pause_video();
        }
    }

    /// Stop the native player and drop the playing class. No-op before ready.
    pub fn stop(&self) {
        let native = self.shared.lifecycle.lock().ready_player();
        if let Some(native) = native {
            native.stop_video();
            self.shared.set_container_class(&self.shared.coordinator.config().playing_class, false);
        }
    }

    /// Tear down. Terminal and idempotent.
    ///
    /// Teardown happens before this returns. The future only unloads the
    /// player API script once the last instance is gone; dropping it leaves
    /// the `<script>` tag behind but the next load still starts afresh.
    pub fn destroy(&self) -> BoxFuture<'static, ()> {
        self.shared.destroy()
    }

    /// Element was attached to the document.
    pub fn connected(&self) -> PlayerFuture {
        self.load()
    }

    /// Element was removed from the document.
    pub fn disconnected(&self) -> BoxFuture<'static, ()> {
        self.destroy()
    }

    /// Listen for an event dispatched on the element.
    pub fn add_event_listener(&self, event_type: &str, callback: EventCallback) -> ListenerId {
        self.shared.coordinator.window().add_event_listener(
            self.shared.element,
            event_type,
            callback,
            EventListenerOptions::default(),
        )
    }

    pub fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool {
        self.shared
            .coordinator
            .window()
            .remove_event_listener(self.shared.element, event_type, id)
    }
}

impl std::fmt::Debug for YoutubeVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeVideo")
            .field("id", &self.shared.id)
            .field("element", &self.shared.element)
            .field("element_id", &self.element_id())
            .field("state", &self.state())
            .finish()
    }
}

impl VideoShared {
    pub(crate) fn source_url(&self) -> Option<String> {
        self.source
            .get_or_init(|| {
                let doc = self.coordinator.window().document.read();
                let element = doc.tree.get_element(self.element)?;
                if let Some(src) = element.get_attribute("src").filter(|s| !s.is_empty()) {
                    return Some(src.to_string());
                }
                doc.tree
                    .descendants(self.element)
                    .filter_map(|id| doc.tree.get_element(id))
                    .filter(|e| e.tag_name == "source")
                    .find(|e| e.get_attribute("type") == Some("video/youtube"))
                    .and_then(|e| e.get_attribute("src"))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .clone()
    }

    pub(crate) fn video_id(&self) -> String {
        self.video_id
            .get_or_init(|| self.source_url().map(|src| extract_video_id(&src)).unwrap_or_default())
            .clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let doc = self.coordinator.window().document.read();
        doc.tree
            .get_element(self.element)
            .and_then(|e| e.get_attribute(name))
            .map(str::to_string)
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.attribute(name).map(|value| !value.eq_ignore_ascii_case("false"))
    }

    fn dimension(&self, name: &str) -> Option<u32> {
        self.attribute(name).and_then(|value| value.trim().parse().ok())
    }

    pub(crate) fn player_vars(&self) -> PlayerVars {
        let config = self.coordinator.config();
        let mut vars = PlayerVars::new();
        vars.insert("autoplay".into(), self.flag("autoplay").unwrap_or(false).into());
        vars.insert("controls".into(), self.flag("controls").unwrap_or(false).into());
        vars.insert(
            "playsinline".into(),
            self.flag("playsinline").unwrap_or(config.playsinline).into(),
        );
        if config.force_ssl {
            vars.insert("forceSSL".into(), PlayerVar::Int(1));
        }

        if let Some(src) = self.source_url() {
            for (key, value) in parse_query_params(&src) {
                vars.entry(key).or_insert(PlayerVar::Text(value));
            }
        }
        vars
    }

    pub(crate) fn dispatch(&self, event: Event) {
        self.coordinator.window().dispatch_event(self.element, event);
    }

    pub(crate) fn set_container_class(&self, class: &str, on: bool) {
        let Some(container) = self.lifecycle.lock().container() else {
            return;
        };
        let mut doc = self.coordinator.window().document.write();
        if let Some(el) = doc.tree.get_element_mut(container) {
            if on {
                el.add_class(class);
            } else {
                el.remove_class(class);
            }
        }
    }

    /// Put a container where the element is, and the element inside it.
    fn wrap_element(&self) -> Result<Wrapping, PlayerError> {
        let config = self.coordinator.config();
        let mut doc = self.coordinator.window().document.write();
        let original_parent = doc.tree.parent(self.element).ok_or(PlayerError::NotMounted)?;

        let container = doc.tree.create_element(
            ElementData::new(TagName::div())
                .with_attribute("id", &config.container_id(self.id))
                .with_attribute("class", &config.wrapper_class)
                .with_attribute("style", "position: relative"),
        );
        doc.tree.replace_child(original_parent, container, self.element);
        doc.tree.append_child(container, self.element);

        let original_style = doc.tree.get_element_mut(self.element).and_then(|el| {
            let original = el.get_attribute("style").map(str::to_string);
            el.set_attribute("style", "position: absolute; top: 0; left: 0; z-index: -1");
            original
        });

        Ok(Wrapping {
            container,
            mount: None,
            original_parent,
            original_style,
        })
    }

    fn load(self: &Arc<Self>) -> PlayerFuture {
        let future = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == LifecycleState::Destroyed {
                return failed(PlayerError::Destroyed);
            }
            if let Some(load) = &lifecycle.load {
                return load.clone();
            }

            if lifecycle.wrapping.is_none() {
                match self.wrap_element() {
                    Ok(wrapping) => lifecycle.wrapping = Some(wrapping),
                    Err(err) => {
                        warn!(instance = self.id, error = %err, "Cannot load a detached video element");
                        return failed(err);
                    }
                }
            }

            let gate = self.coordinator.ensure_script_loaded();
            let (abort, registration) = AbortHandle::new_pair();
            let future = Abortable::new(run_load(Arc::downgrade(self), gate), registration)
                .map(|result| result.unwrap_or(Err(PlayerError::Destroyed)))
                .boxed()
                .shared();

            lifecycle.state = LifecycleState::Loading;
            lifecycle.load = Some(future.clone());
            lifecycle.abort = Some(abort);
            future
        };

        if let Some(src) = self.source_url() {
            self.media.set_current_src(&src);
        }
        self.media.set_network_state(MediaNetworkState::Loading);
        self.set_container_class(&self.coordinator.config().loading_class, true);
        let element_id = self.attribute("id").unwrap_or_default();
        debug!(instance = self.id, element_id = %element_id, video_id = %self.video_id(), "Loading");
        self.dispatch(Event::new(EventType::LoadStart));
        future
    }

    fn build_player(self: &Arc<Self>) -> PlayerFuture {
        let config = self.coordinator.config();
        let (build, mount, attempt) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == LifecycleState::Destroyed {
                return failed(PlayerError::Destroyed);
            }
            if let Some(build) = &lifecycle.build {
                return build.clone();
            }
            let Some(container) = lifecycle.container() else {
                return failed(PlayerError::NotMounted);
            };

            let mount = {
                let mut doc = self.coordinator.window().document.write();
                let mount = doc.tree.create_element(
                    ElementData::new(TagName::div()).with_attribute("id", &config.mount_id(self.id)),
                );
                doc.tree.append_child(container, mount);
                mount
            };

            let (tx, rx) = oneshot::channel();
            let build = rx
                .map(|settled| settled.unwrap_or(Err(PlayerError::Destroyed)))
                .boxed()
                .shared();
            lifecycle.settle = Some(tx);
            lifecycle.build = Some(build.clone());
            lifecycle.attempt += 1;
            if let Some(wrapping) = lifecycle.wrapping.as_mut() {
                wrapping.mount = Some(mount);
            }
            (build, mount, lifecycle.attempt)
        };

        let options = PlayerOptions {
            width: self.dimension("width"),
            height: self.dimension("height"),
            video_id: self.video_id(),
            player_vars: self.player_vars(),
            events: self.player_events(attempt),
        };
        debug!(instance = self.id, video_id = %options.video_id, "Constructing native player");
        let handle = self.coordinator.factory().create(mount, options);

        let orphaned = {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.accepts(attempt) {
                Some(handle)
            } else {
                if lifecycle.native.is_none() {
                    lifecycle.native = Some(handle);
                }
                None
            }
        };
        if let Some(handle) = orphaned {
            handle.destroy();
        }
        build
    }

    fn player_events(self: &Arc<Self>, attempt: u64) -> PlayerEvents {
        let ready = Arc::downgrade(self);
        let state = Arc::downgrade(self);
        let failure = Arc::downgrade(self);
        PlayerEvents {
            on_ready: Box::new(move |handle| {
                if let Some(video) = ready.upgrade() {
                    video.on_player_ready(attempt, handle);
                }
            }),
            on_state_change: Arc::new(move |code| {
                if let Some(video) = state.upgrade() {
                    video.on_state_change(attempt, code);
                }
            }),
            on_error: Arc::new(move |code| {
                if let Some(video) = failure.upgrade() {
                    video.on_player_error(attempt, code);
                }
            }),
        }
    }

    /// Whether native callbacks from build `attempt` still apply.
    pub(crate) fn is_current(&self, attempt: u64) -> bool {
        self.lifecycle.lock().accepts(attempt)
    }

    fn on_player_ready(&self, attempt: u64, handle: PlayerHandle) {
        let settle = {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.accepts(attempt) {
                debug!(instance = self.id, attempt, "Ignoring ready from a stale player");
                return;
            }
            lifecycle.native = Some(Arc::clone(&handle));
            lifecycle.ready = true;
            lifecycle.settle.take()
        };

        info!(instance = self.id, video_id = %self.video_id(), "Player ready");
        self.media.set_ready_state(MediaReadyState::HaveEnoughData);
        self.dispatch(Event::new(EventType::CanPlay));
        if let Some(tx) = settle {
            let _ = tx.send(Ok(handle));
        }
    }

    fn on_player_error(&self, attempt: u64, code: i32) {
        let settle = {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.accepts(attempt) {
                debug!(instance = self.id, attempt, code, "Ignoring error from a stale player");
                return;
            }
            lifecycle.settle.take()
        };

        let err = PlayerError::PlayerBuild { code };
        error!(instance = self.id, code, "Player error");
        self.media.set_error(err.clone());
        self.dispatch(Event::error(err.to_string()));
        if let Some(tx) = settle {
            let _ = tx.send(Err(err));
        }
    }

    fn finish_load(&self, result: &Result<PlayerHandle, PlayerError>) {
        let config = self.coordinator.config();
        let (broken, stale_mount) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == LifecycleState::Destroyed {
                return;
            }
            match result {
                Ok(_) => {
                    lifecycle.state = LifecycleState::Ready;
                    (None, None)
                }
                Err(_) => {
                    lifecycle.state = LifecycleState::Unloaded;
                    lifecycle.load = None;
                    lifecycle.abort = None;
                    lifecycle.build = None;
                    lifecycle.settle = None;
                    lifecycle.ready = false;
                    lifecycle.attempt += 1;
                    let mount = lifecycle.wrapping.as_mut().and_then(|w| w.mount.take());
                    (lifecycle.native.take(), mount)
                }
            }
        };
        if let Some(mount) = stale_mount {
            self.coordinator.window().document.write().tree.remove(mount);
        }

        self.set_container_class(&config.loading_class, false);
        self.media.set_network_state(MediaNetworkState::Idle);
        match result {
            Ok(_) => debug!(instance = self.id, "Ready"),
            Err(err) => {
                if let Some(native) = broken {
                    native.destroy();
                }
                if !matches!(err, PlayerError::PlayerBuild { .. }) {
                    self.media.set_error(err.clone());
                    self.dispatch(Event::error(err.to_string()));
                }
                error!(instance = self.id, error = %err, "Load failed");
            }
        }
    }

    fn play(&self) -> Result<(), PlayerError> {
        if self.source_url().is_none() {
            let err = PlayerError::NoSource;
            warn!(instance = self.id, "{}", err);
            self.media.set_network_state(MediaNetworkState::NoSource);
            self.media.set_error(err.clone());
            self.dispatch(Event::error(err.to_string()));
            return Err(err);
        }

        let native = self.lifecycle.lock().ready_player();
        if let Some(native) = native {
            native.play_video();
        }
        Ok(())
    }

    /// Pause this player if it is currently playing.
    pub(crate) fn pause_if_playing(&self) {
        let native = self.lifecycle.lock().ready_player();
        if let Some(native) = native {
            if native.player_state() == crate::native::PlayerState::Playing.code() {
                debug!(instance = self.id, "Pausing for another instance");
                native.pause_video();
            }
        }
    }

    fn destroy(&self) -> BoxFuture<'static, ()> {
        let (native, settle, abort, wrapping) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == LifecycleState::Destroyed {
                return future::ready(()).boxed();
            }
            lifecycle.state = LifecycleState::Destroyed;
            lifecycle.ready = false;
            lifecycle.load = None;
            lifecycle.build = None;
            (
                lifecycle.native.take(),
                lifecycle.settle.take(),
                lifecycle.abort.take(),
                lifecycle.wrapping.take(),
            )
        };
        debug!(instance = self.id, "Destroying");

        let now_empty = self.coordinator.registry.remove(self.id) == Some(true);
        if now_empty {
            self.coordinator.registry.reset_ids();
        }

        if let Some(native) = native {
            native.destroy();
        }
        if let Some(tx) = settle {
            let _ = tx.send(Err(PlayerError::Destroyed));
        }
        if let Some(abort) = abort {
            abort.abort();
        }
        if let Some(wrapping) = wrapping {
            self.unwrap_element(wrapping);
        }
        self.media.reset();

        if now_empty {
            self.coordinator.release_script()
        } else {
            future::ready(()).boxed()
        }
    }

    /// Put the element back in its original place and drop the container.
    fn unwrap_element(&self, wrapping: Wrapping) {
        let mut doc = self.coordinator.window().document.write();
        let tree = &mut doc.tree;

        if tree.parent(wrapping.container) == Some(wrapping.original_parent) {
            tree.insert_before(wrapping.original_parent, self.element, Some(wrapping.container));
        } else {
            debug!(instance = self.id, "Container was moved; leaving element detached");
            tree.remove_from_parent(self.element);
        }
        tree.remove(wrapping.container);

        if let Some(el) = tree.get_element_mut(self.element) {
            match &wrapping.original_style {
                Some(style) => el.set_attribute("style", style),
                None => el.remove_attribute("style"),
            }
        }
    }
}

impl Drop for VideoShared {
    fn drop(&mut self) {
        // Dropped without destroy(): keep the registry accurate and free the
        // native player. The script stays until a destroy() empties the page.
        let lifecycle = self.lifecycle.get_mut();
        if lifecycle.state == LifecycleState::Destroyed {
            return;
        }
        self.coordinator.registry.remove(self.id);
        if let Some(native) = lifecycle.native.take() {
            native.destroy();
        }
    }
}

async fn run_load(video: Weak<VideoShared>, gate: ScriptReady) -> Result<PlayerHandle, PlayerError> {
    let result = match gate.await {
        Ok(()) => match video.upgrade() {
            Some(shared) => {
                let build = shared.build_player();
                drop(shared);
                build.await
            }
            None => Err(PlayerError::Destroyed),
        },
        Err(err) => Err(err),
    };

    if let Some(shared) = video.upgrade() {
        shared.finish_load(&result);
    }
    result
}
