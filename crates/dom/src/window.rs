//! DOM Window object implementation.

use crate::document::{Document, DocumentRef};
use crate::events::{Event, EventCallback, EventListenerOptions, EventManager, ListenerId};
use crate::node::NodeId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// A named global function, such as `window.onSomethingReady`.
pub type GlobalCallback = Arc<dyn Fn() + Send + Sync>;

/// Identifies one installation of a global callback, so an owner can remove
/// its own handler without clobbering one installed later by someone else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackToken(u64);

/// Browser window object.
///
/// Owns the document, the event listeners registered on its nodes, and the
/// named global callback slots that third-party scripts invoke.
pub struct Window {
    /// Associated document.
    pub document: DocumentRef,
    events: EventManager,
    globals: Mutex<HashMap<String, (CallbackToken, GlobalCallback)>>,
    next_token: AtomicU64,
}

impl Window {
    pub fn new(document: Document) -> Self {
        Self {
            document: document.into_ref(),
            events: EventManager::new(),
            globals: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// A window over a blank document.
    pub fn blank() -> Arc<Self> {
        Arc::new(Self::new(Document::blank()))
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn add_event_listener(
        &self,
        target: NodeId,
        event_type: &str,
        callback: EventCallback,
        options: EventListenerOptions,
    ) -> ListenerId {
        self.events.add_listener(target, event_type, callback, options)
    }

    pub fn remove_event_listener(&self, target: NodeId, event_type: &str, id: ListenerId) -> bool {
        self.events.remove_listener(target, event_type, id)
    }

    /// Dispatch an event at `target`. The document lock is only held while
    /// the propagation path is computed, so listeners may mutate the tree.
    pub fn dispatch_event(&self, target: NodeId, mut event: Event) -> bool {
        let path: Vec<NodeId> = {
            let doc = self.document.read();
            if doc.tree.get(target).is_none() {
                return true;
            }
            std::iter::once(target).chain(doc.tree.ancestors(target)).collect()
        };
        trace!(event = event.event_type.as_str(), "Dispatching event");
        self.events.dispatch(&mut event, &path)
    }

    pub fn has_global_callback(&self, name: &str) -> bool {
        self.globals.lock().contains_key(name)
    }

    /// Install a global callback, replacing any existing one.
    pub fn install_global_callback(&self, name: &str, callback: GlobalCallback) -> CallbackToken {
        let token = self.next_token();
        self.globals.lock().insert(name.to_string(), (token, callback));
        token
    }

    /// Install a global callback only if the slot is empty.
    pub fn install_global_callback_if_vacant(
        &self,
        name: &str,
        callback: GlobalCallback,
    ) -> Option<CallbackToken> {
        let mut globals = self.globals.lock();
        if globals.contains_key(name) {
            return None;
        }
        let token = self.next_token();
        globals.insert(name.to_string(), (token, callback));
        Some(token)
    }

    /// Remove a global callback regardless of who installed it.
    pub fn remove_global_callback(&self, name: &str) -> bool {
        self.globals.lock().remove(name).is_some()
    }

    /// Remove a global callback only if it is still the installation
    /// identified by `token`.
    pub fn remove_global_callback_if(&self, name: &str, token: CallbackToken) -> bool {
        let mut globals = self.globals.lock();
        match globals.get(name) {
            Some((installed, _)) if *installed == token => {
                globals.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Invoke a global callback by name, as a loaded script would. Returns
    /// `false` if nothing is installed.
    pub fn invoke_global_callback(&self, name: &str) -> bool {
        let callback = self.globals.lock().get(name).map(|(_, cb)| Arc::clone(cb));
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn next_token(&self) -> CallbackToken {
        CallbackToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("globals", &self.globals.lock().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
