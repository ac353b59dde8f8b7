//! DOM (Document Object Model) implementation.
//!
//! This crate provides the node tree, element attributes and class lists,
//! event dispatch and the `Window` global object that embedded components
//! (such as the YouTube video element) are mounted into.

pub mod node;
pub mod document;
pub mod element;
pub mod tree;
pub mod events;
pub mod attributes;
pub mod window;

pub use node::{Node, NodeData, NodeId};
pub use document::{Document, DocumentRef};
pub use element::{ElementData, TagName};
pub use tree::DomTree;
pub use events::{Event, EventCallback, EventListenerOptions, EventManager, EventPhase, EventType, ListenerId};
pub use attributes::AttributeMap;
pub use window::{CallbackToken, GlobalCallback, Window};
