//! Element attributes.

use indexmap::IndexMap;

/// Attributes of one element, in insertion order. Names are expected to be
/// lowercase already; [`ElementData`](crate::ElementData) normalizes them.
#[derive(Clone, Debug, Default)]
pub struct AttributeMap {
    entries: IndexMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.get_mut(name) {
            Some(existing) => {
                existing.clear();
                existing.push_str(value);
            }
            None => {
                self.entries.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Remove an attribute; the rest keep their order.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_survives_update_and_removal() {
        let mut attrs = AttributeMap::new();
        attrs.set("src", "a");
        attrs.set("width", "640");
        attrs.set("height", "360");
        attrs.set("width", "480");
        attrs.remove("src");

        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("width", "480"), ("height", "360")]);
        assert!(!attrs.contains("src"));
        assert_eq!(attrs.get("src"), None);
    }
}
