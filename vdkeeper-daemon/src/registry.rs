//! Live virtual displays, keyed by name.

use std::collections::HashMap;

use vdkeeper_core::{DisplayName, DisplaySpec, OutputId};

/// A display the platform created for us and that we keep alive.
#[derive(Debug)]
pub struct ActiveDisplay<H> {
    pub spec: DisplaySpec,
    pub handle: H,
    pub resolved_id: Option<OutputId>,
    /// Distinguishes this display from an earlier one with the same name.
    pub generation: u64,
}

#[derive(Debug)]
pub struct DisplayRegistry<H> {
    displays: HashMap<DisplayName, ActiveDisplay<H>>,
    next_generation: u64,
}

impl<H> Default for DisplayRegistry<H> {
    fn default() -> Self {
        Self {
            displays: HashMap::new(),
            next_generation: 1,
        }
    }
}

impl<H> DisplayRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly created display and return its generation.
    ///
    /// The name must not already be present.
    pub fn insert(&mut self, spec: DisplaySpec, handle: H) -> u64 {
        debug_assert!(!self.displays.contains_key(&spec.name));
        let generation = self.next_generation;
        self.next_generation += 1;
        self.displays.insert(
            spec.name.clone(),
            ActiveDisplay {
                spec,
                handle,
                resolved_id: None,
                generation,
            },
        );
        generation
    }

    pub fn remove(&mut self, name: &DisplayName) -> Option<ActiveDisplay<H>> {
        self.displays.remove(name)
    }

    pub fn get(&self, name: &DisplayName) -> Option<&ActiveDisplay<H>> {
        self.displays.get(name)
    }

    /// The entry for `name`, only if it is still the one created as `generation`.
    pub fn current(&self, name: &DisplayName, generation: u64) -> Option<&ActiveDisplay<H>> {
        self.displays
            .get(name)
            .filter(|display| display.generation == generation)
    }

    /// Record the output id for `name` if `generation` still matches.
    pub fn set_resolved(&mut self, name: &DisplayName, generation: u64, id: OutputId) -> bool {
        match self.displays.get_mut(name) {
            Some(display) if display.generation == generation => {
                display.resolved_id = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &DisplayName) -> bool {
        self.displays.contains_key(name)
    }

    /// Sorted, for deterministic logs and removal order.
    pub fn names(&self) -> Vec<DisplayName> {
        let mut names: Vec<_> = self.displays.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn drain(&mut self) -> Vec<ActiveDisplay<H>> {
        self.displays.drain().map(|(_, display)| display).collect()
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> DisplaySpec {
        DisplaySpec {
            name: DisplayName::from(name),
            width: 1920,
            height: 1080,
            refresh_rate: 60.0,
            hidpi: false,
            connect_on_startup: true,
        }
    }

    #[test]
    fn stale_generation_cannot_resolve() {
        let mut registry = DisplayRegistry::new();
        let name = DisplayName::from("A");
        let old = registry.insert(spec("A"), ());
        registry.remove(&name);
        let new = registry.insert(spec("A"), ());
        assert_ne!(old, new);

        assert!(!registry.set_resolved(&name, old, OutputId(3)));
        assert!(registry.current(&name, old).is_none());
        assert!(registry.set_resolved(&name, new, OutputId(4)));
        assert_eq!(registry.get(&name).and_then(|d| d.resolved_id), Some(OutputId(4)));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = DisplayRegistry::new();
        for name in ["c", "a", "b"] {
            registry.insert(spec(name), ());
        }
        let names: Vec<_> = registry.names().into_iter().map(|n| n.0).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(registry.drain().len(), 3);
        assert!(registry.is_empty());
    }
}
