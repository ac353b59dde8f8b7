//! DOM Events implementation.

use crate::node::NodeId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event type enumeration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    // Resource events
    Load,
    Error,

    // Media events
    LoadStart,
    CanPlay,
    Play,
    Playing,
    Pause,
    Ended,

    // Other
    Custom(String),
}

impl EventType {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "load" => EventType::Load,
            "error" => EventType::Error,
            "loadstart" => EventType::LoadStart,
            "canplay" => EventType::CanPlay,
            "play" => EventType::Play,
            "playing" => EventType::Playing,
            "pause" => EventType::Pause,
            "ended" => EventType::Ended,
            other => EventType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Load => "load",
            EventType::Error => "error",
            EventType::LoadStart => "loadstart",
            EventType::CanPlay => "canplay",
            EventType::Play => "play",
            EventType::Playing => "playing",
            EventType::Pause => "pause",
            EventType::Ended => "ended",
            EventType::Custom(s) => s,
        }
    }

    /// Resource and media events never bubble; custom events default to not
    /// bubbling either, like `new CustomEvent(name)`.
    pub fn bubbles(&self) -> bool {
        false
    }

    pub fn cancelable(&self) -> bool {
        matches!(self, EventType::Custom(_))
    }
}

/// Event phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// DOM Event.
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    /// Target element.
    pub target: Option<NodeId>,
    /// Current target during propagation.
    pub current_target: Option<NodeId>,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub immediate_propagation_stopped: bool,
    /// Whether event is trusted (engine-generated).
    pub is_trusted: bool,
    /// Error message carried by `error` events.
    pub message: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: f64,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;

        let bubbles = event_type.bubbles();
        let cancelable = event_type.cancelable();

        Self {
            event_type,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            bubbles,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            is_trusted: false,
            message: None,
            timestamp,
        }
    }

    /// An `error` event carrying a message, like `ErrorEvent`.
    pub fn error(message: impl Into<String>) -> Self {
        let mut event = Self::new(EventType::Error);
        event.message = Some(message.into());
        event
    }

    pub fn with_options(event_type: EventType, bubbles: bool, cancelable: bool) -> Self {
        let mut event = Self::new(event_type);
        event.bubbles = bubbles;
        event.cancelable = cancelable;
        event
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.immediate_propagation_stopped = true;
        self.propagation_stopped = true;
    }
}

/// Event listener callback type.
pub type EventCallback = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// Event listener options.
#[derive(Clone, Debug, Default)]
pub struct EventListenerOptions {
    pub capture: bool,
    pub once: bool,
}

/// Handle returned by [`EventManager::add_listener`], used for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct EventListener {
    id: ListenerId,
    callback: EventCallback,
    options: EventListenerOptions,
}

type ListenerTable = HashMap<NodeId, HashMap<String, Vec<EventListener>>>;

/// Event manager for handling event dispatch.
///
/// Listeners are snapshotted before they run, so a callback may add or
/// remove listeners, or dispatch further events, without deadlocking.
#[derive(Default)]
pub struct EventManager {
    listeners: RwLock<ListenerTable>,
    next_id: AtomicU64,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add event listener for a node.
    pub fn add_listener(
        &self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
        options: EventListenerOptions,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(EventListener { id, callback, options });
        id
    }

    /// Remove a single listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(type_listeners) = listeners.get_mut(&node).and_then(|n| n.get_mut(event_type)) else {
            return false;
        };
        let before = type_listeners.len();
        type_listeners.retain(|l| l.id != id);
        before != type_listeners.len()
    }

    /// Number of listeners registered for a node and event type.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .read()
            .get(&node)
            .and_then(|n| n.get(event_type))
            .map_or(0, Vec::len)
    }

    /// Dispatch an event along `path`, where `path[0]` is the target and the
    /// rest are its ancestors, nearest first. Returns `false` if the default
    /// action was prevented.
    pub fn dispatch(&self, event: &mut Event, path: &[NodeId]) -> bool {
        let Some((&target, ancestors)) = path.split_first() else {
            return true;
        };
        event.target = Some(target);
        event.is_trusted = true;

        event.phase = EventPhase::Capturing;
        for &node in ancestors.iter().rev() {
            event.current_target = Some(node);
            self.invoke_listeners(node, event, Some(true));
            if event.propagation_stopped {
                return !event.default_prevented;
            }
        }

        event.phase = EventPhase::AtTarget;
        event.current_target = Some(target);
        self.invoke_listeners(target, event, None);
        if event.propagation_stopped {
            return !event.default_prevented;
        }

        if event.bubbles {
            event.phase = EventPhase::Bubbling;
            for &node in ancestors {
                event.current_target = Some(node);
                self.invoke_listeners(node, event, Some(false));
                if event.propagation_stopped {
                    return !event.default_prevented;
                }
            }
        }

        event.phase = EventPhase::None;
        !event.default_prevented
    }

    /// `capture` of `None` runs every listener (target phase).
    fn invoke_listeners(&self, node: NodeId, event: &mut Event, capture: Option<bool>) {
        let event_type = event.event_type.as_str().to_string();

        let snapshot: Vec<EventListener> = {
            let mut listeners = self.listeners.write();
            let Some(type_listeners) = listeners.get_mut(&node).and_then(|n| n.get_mut(&event_type)) else {
                return;
            };
            let selected: Vec<EventListener> = type_listeners
                .iter()
                .filter(|l| capture.map_or(true, |c| l.options.capture == c))
                .cloned()
                .collect();
            type_listeners.retain(|l| !(l.options.once && selected.iter().any(|s| s.id == l.id)));
            selected
        };

        for listener in snapshot {
            (listener.callback)(event);
            if event.immediate_propagation_stopped {
                break;
            }
        }
    }
}
