//! Elements: tag names, attributes and class lists.

use crate::attributes::AttributeMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// A lowercase tag name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagName(Arc<str>);

impl TagName {
    pub fn new(name: &str) -> Self {
        TagName(Arc::from(name.to_ascii_lowercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn html() -> Self {
        Self::new("html")
    }
    pub fn head() -> Self {
        Self::new("head")
    }
    pub fn body() -> Self {
        Self::new("body")
    }
    pub fn div() -> Self {
        Self::new("div")
    }
    pub fn video() -> Self {
        Self::new("video")
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for TagName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

/// Data held by an element node.
///
/// `class_list` mirrors the `class` attribute; both are kept in step by the
/// mutators here.
#[derive(Clone, Debug)]
pub struct ElementData {
    pub tag_name: TagName,
    pub attributes: AttributeMap,
    pub class_list: SmallVec<[Arc<str>; 4]>,
}

impl ElementData {
    pub fn new(tag_name: TagName) -> Self {
        Self {
            tag_name,
            attributes: AttributeMap::new(),
            class_list: SmallVec::new(),
        }
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Attribute names are case-insensitive and stored lowercase.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "class" {
            self.class_list = value.split_whitespace().map(Arc::from).collect();
        }
        self.attributes.set(&name, value);
    }

    pub fn remove_attribute(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        if name == "class" {
            self.class_list.clear();
        }
        self.attributes.remove(&name);
    }

    #[inline]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    #[inline]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(&name.to_ascii_lowercase())
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list.iter().any(|c| c.as_ref() == class)
    }

    /// Add a class; no-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        self.class_list.push(Arc::from(class));
        self.sync_class_attribute();
    }

    /// Remove a class; no-op if absent.
    pub fn remove_class(&mut self, class: &str) {
        let before = self.class_list.len();
        self.class_list.retain(|c| c.as_ref() != class);
        if self.class_list.len() != before {
            self.sync_class_attribute();
        }
    }

    fn sync_class_attribute(&mut self) {
        let joined = self.class_list.join(" ");
        self.attributes.set("class", &joined);
    }
}
