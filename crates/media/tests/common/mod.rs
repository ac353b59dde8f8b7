#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dom::{Event, NodeId, Window};
use networking::{LoadError, ScriptFetcher, ScriptLoader};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use url::Url;
use youtube_media::{
    NativePlayer, PlayerConfig, PlayerCoordinator, PlayerFactory, PlayerHandle, PlayerOptions, PlayerVars,
    YoutubeVideo,
};

pub const READY_CALLBACK: &str = "onYouTubeIframeAPIReady";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Script loader that yields once, then "runs" the script by invoking the
/// window's ready callback.
pub struct FakeLoader {
    window: Weak<Window>,
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
    pub fail: Mutex<Option<LoadError>>,
    pub fire_ready: AtomicBool,
}

impl FakeLoader {
    pub fn new(window: &Arc<Window>) -> Arc<Self> {
        Arc::new(Self {
            window: Arc::downgrade(window),
            loads: AtomicUsize::new(0),
            unloads: AtomicUsize::new(0),
            fail: Mutex::new(None),
            fire_ready: AtomicBool::new(true),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptLoader for FakeLoader {
    async fn load_script(&self, _url: &str) -> Result<(), LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(err) = self.fail.lock().clone() {
            return Err(err);
        }
        if self.fire_ready.load(Ordering::SeqCst) {
            if let Some(window) = self.window.upgrade() {
                window.invoke_global_callback(READY_CALLBACK);
            }
        }
        Ok(())
    }

    async fn unload_script(&self, _url: &str) -> Result<(), LoadError> {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fetcher for the real `ResourceManager`: "executes" the API script by
/// invoking the ready callback.
pub struct ApiFetcher {
    window: Weak<Window>,
    pub fetches: AtomicUsize,
}

impl ApiFetcher {
    pub fn new(window: &Arc<Window>) -> Arc<Self> {
        Arc::new(Self {
            window: Arc::downgrade(window),
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ScriptFetcher for ApiFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Bytes, LoadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(window) = self.window.upgrade() {
            window.invoke_global_callback(READY_CALLBACK);
        }
        Ok(Bytes::from_static(b"window.YT = {};"))
    }
}

/// Native player double. `play_video`/`pause_video` report the new state
/// synchronously, as the IFrame API may.
pub struct FakePlayer {
    pub state: AtomicI32,
    pub plays: AtomicUsize,
    pub pauses: AtomicUsize,
    pub stops: AtomicUsize,
    pub destroys: AtomicUsize,
    on_state_change: Arc<dyn Fn(i32) + Send + Sync>,
    on_error: Arc<dyn Fn(i32) + Send + Sync>,
}

impl FakePlayer {
    /// Report a state change as the provider would.
    pub fn emit(&self, code: i32) {
        self.state.store(code, Ordering::SeqCst);
        (self.on_state_change)(code);
    }

    /// Report an error as the provider would.
    pub fn fail(&self, code: i32) {
        (self.on_error)(code);
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl NativePlayer for FakePlayer {
    fn play_video(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.emit(1);
    }

    fn pause_video(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.emit(2);
    }

    fn stop_video(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.emit(5);
    }

    fn player_state(&self) -> i32 {
        self.state.load(Ordering::SeqCst)
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a factory was asked to build.
#[derive(Clone, Debug)]
pub struct Built {
    pub mount: NodeId,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub video_id: String,
    pub player_vars: PlayerVars,
}

type ReadyCallback = Box<dyn FnOnce(PlayerHandle) + Send>;

/// Player factory double. Readies players immediately unless told to hold
/// them, and can fail construction with an error code. A failing factory that
/// holds players keeps `on_ready` so it can be fired after the error.
pub struct FakeFactory {
    pub built: Mutex<Vec<Built>>,
    pub players: Mutex<Vec<Arc<FakePlayer>>>,
    pending: Mutex<Vec<Option<ReadyCallback>>>,
    pub auto_ready: AtomicBool,
    pub fail_with: Mutex<Option<i32>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            built: Mutex::new(Vec::new()),
            players: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            auto_ready: AtomicBool::new(true),
            fail_with: Mutex::new(None),
        })
    }

    pub fn creates(&self) -> usize {
        self.built.lock().len()
    }

    pub fn player(&self, index: usize) -> Arc<FakePlayer> {
        Arc::clone(&self.players.lock()[index])
    }

    /// Fire `on_ready` for a held player.
    pub fn ready(&self, index: usize) {
        let callback = self.pending.lock()[index].take();
        if let Some(callback) = callback {
            let player: PlayerHandle = self.player(index);
            callback(player);
        }
    }
}

impl PlayerFactory for FakeFactory {
    fn create(&self, mount: NodeId, options: PlayerOptions) -> PlayerHandle {
        self.built.lock().push(Built {
            mount,
            width: options.width,
            height: options.height,
            video_id: options.video_id.clone(),
            player_vars: options.player_vars.clone(),
        });

        let player = Arc::new(FakePlayer {
            state: AtomicI32::new(-1),
            plays: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            on_state_change: options.events.on_state_change,
            on_error: Arc::clone(&options.events.on_error),
        });
        self.players.lock().push(Arc::clone(&player));

        let fail_with = *self.fail_with.lock();
        if let Some(code) = fail_with {
            let held = (!self.auto_ready.load(Ordering::SeqCst)).then_some(options.events.on_ready);
            self.pending.lock().push(held);
            (options.events.on_error)(code);
        } else if self.auto_ready.load(Ordering::SeqCst) {
            self.pending.lock().push(None);
            let handle: PlayerHandle = player.clone();
            (options.events.on_ready)(handle);
        } else {
            self.pending.lock().push(Some(options.events.on_ready));
        }
        player
    }
}

/// A window with a fake loader and factory.
pub struct Page {
    pub window: Arc<Window>,
    pub loader: Arc<FakeLoader>,
    pub factory: Arc<FakeFactory>,
    pub coordinator: Arc<PlayerCoordinator>,
}

impl Page {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        init_tracing();
        let window = Window::blank();
        let loader = FakeLoader::new(&window);
        let factory = FakeFactory::new();
        let coordinator =
            PlayerCoordinator::with_config(config, Arc::clone(&window), loader.clone(), factory.clone());
        Self {
            window,
            loader,
            factory,
            coordinator,
        }
    }

    /// Append `<video src=...>` with extra attributes to the body.
    pub fn add_element(&self, src: Option<&str>, attrs: &[(&str, &str)]) -> NodeId {
        let mut doc = self.window.document.write();
        let node = doc.create_element("video");
        if let Some(el) = doc.tree.get_element_mut(node) {
            if let Some(src) = src {
                el.set_attribute("src", src);
            }
            for (name, value) in attrs {
                el.set_attribute(name, value);
            }
        }
        doc.append_to_body(node);
        node
    }

    pub fn video(&self, src: &str) -> YoutubeVideo {
        let element = self.add_element(Some(src), &[]);
        self.coordinator.create_video(element)
    }

    pub fn body(&self) -> NodeId {
        self.window.document.read().body().expect("document has a body")
    }

    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.window.document.read().tree.children(parent).collect()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.window
            .document
            .read()
            .tree
            .get_element(node)
            .map_or(false, |el| el.has_class(class))
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.window
            .document
            .read()
            .tree
            .get_element(node)
            .and_then(|el| el.get_attribute(name))
            .map(str::to_string)
    }
}

/// Record the named events dispatched on a video, in order.
pub fn record(video: &YoutubeVideo, names: &[&str]) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in names {
        let log = Arc::clone(&log);
        video.add_event_listener(
            name,
            Arc::new(move |event: &mut Event| {
                log.lock().push(event.event_type.as_str().to_string());
            }),
        );
    }
    log
}

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const EMBED_URL: &str = "https://www.youtube.com/embed/nOEw9iiopwI";
