//! Process-wide cache of imported template modules
use super::module::parent_modules;
use super::source::{TemplateMember, TemplateSource};
use super::TemplateRules;
use crate::error::TemplateError;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info};

/// Handle to a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleSlot(usize);

#[derive(Debug)]
struct CachedModule {
    path: String,
    members: Option<Vec<TemplateMember>>,
    loads: u32,
}

/// Arena of imported modules keyed by dotted path.
///
/// A module is imported once and reused by every object that attaches it.
/// Only [`TemplateCache::reload`] forces a fresh import; failed imports are
/// not cached and are retried on the next request.
pub struct TemplateCache {
    source: Box<dyn TemplateSource>,
    slots: Vec<CachedModule>,
    index: HashMap<String, ModuleSlot>,
}

impl TemplateCache {
    pub fn new(source: Box<dyn TemplateSource>) -> Self {
        Self {
            source,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Members of the module at `path`, importing it on first use.
    pub fn get_or_load(&mut self, path: &str) -> Result<&[TemplateMember], TemplateError> {
        let slot = self.slot_for(path);
        let entry = &mut self.slots[slot.0];

        if entry.members.is_none() {
            match self.source.load(path) {
                Ok(members) => {
                    info!("📦 Loaded template module {} ({} members)", path, members.len());
                    entry.loads += 1;
                    entry.members = Some(members);
                }
                Err(e) => {
                    error!("❌ Failed to load template module {}: {}", path, e);
                    return Err(e);
                }
            }
        }

        Ok(entry.members.as_deref().unwrap_or_default())
    }

    /// Imports `path` and every module its classes inherit from, following
    /// parents transitively. Only a failure of `path` itself is returned; a
    /// parent module that fails to import leaves its subclasses undiscovered.
    pub fn load_with_parents(&mut self, path: &str, rules: &TemplateRules) -> Result<(), TemplateError> {
        let mut pending = parent_modules(path, self.get_or_load(path)?, rules);
        let mut seen: HashSet<String> = HashSet::from([path.to_string()]);

        while let Some(parent) = pending.pop() {
            if !seen.insert(parent.clone()) {
                continue;
            }

            match self.get_or_load(&parent) {
                Ok(members) => pending.extend(parent_modules(&parent, members, rules)),
                Err(_) => debug!("Parent module {} of {} is unavailable", parent, path),
            }
        }

        Ok(())
    }

    /// Members of an already imported module.
    pub fn members(&self, path: &str) -> Option<&[TemplateMember]> {
        self.index
            .get(path)
            .and_then(|slot| self.slots[slot.0].members.as_deref())
    }

    /// Drops the cached import of `path` so the next request re-imports it.
    /// Returns whether anything was cached.
    pub fn reload(&mut self, path: &str) -> bool {
        match self.index.get(path) {
            Some(slot) => {
                let entry = &mut self.slots[slot.0];
                info!("🔄 Invalidated template module {}", entry.path);
                entry.members.take().is_some()
            }
            None => false,
        }
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.index
            .get(path)
            .map(|slot| self.slots[slot.0].members.is_some())
            .unwrap_or(false)
    }

    /// How many successful imports `path` has gone through.
    pub fn load_count(&self, path: &str) -> u32 {
        self.index
            .get(path)
            .map(|slot| self.slots[slot.0].loads)
            .unwrap_or(0)
    }

    fn slot_for(&mut self, path: &str) -> ModuleSlot {
        if let Some(slot) = self.index.get(path) {
            return *slot;
        }

        let slot = ModuleSlot(self.slots.len());
        self.slots.push(CachedModule {
            path: path.to_string(),
            members: None,
            loads: 0,
        });
        self.index.insert(path.to_string(), slot);
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::source::RegisteredTemplates;

    fn cache() -> TemplateCache {
        let source = RegisteredTemplates::new().with_module(
            "game.pawns",
            vec![TemplateMember::class("Pawn", "Replicable")],
        );
        TemplateCache::new(Box::new(source))
    }

    #[test]
    fn test_module_imported_once() {
        let mut cache = cache();
        assert_eq!(cache.get_or_load("game.pawns").unwrap().len(), 1);
        assert_eq!(cache.get_or_load("game.pawns").unwrap().len(), 1);
        assert_eq!(cache.load_count("game.pawns"), 1);
        assert!(cache.is_cached("game.pawns"));
    }

    #[test]
    fn test_reload_forces_fresh_import() {
        let mut cache = cache();
        cache.get_or_load("game.pawns").unwrap();

        assert!(cache.reload("game.pawns"));
        assert!(!cache.is_cached("game.pawns"));
        cache.get_or_load("game.pawns").unwrap();
        assert_eq!(cache.load_count("game.pawns"), 2);

        assert!(!cache.reload("never.loaded"));
    }

    #[test]
    fn test_parent_modules_are_imported_alongside() {
        let source = RegisteredTemplates::new()
            .with_module("game.base", vec![TemplateMember::class("Actor", "Replicable")])
            .with_module("game.mid", vec![TemplateMember::class("Soldier", "game.base.Actor")])
            .with_module("game.top", vec![TemplateMember::class("Captain", "game.mid.Soldier")]);
        let mut cache = TemplateCache::new(Box::new(source));

        cache.load_with_parents("game.top", &TemplateRules::default()).unwrap();
        assert!(cache.is_cached("game.mid"));
        assert!(cache.is_cached("game.base"));
        assert_eq!(cache.members("game.base").unwrap()[0].name, "Actor");
        assert!(cache.members("game.other").is_none());

        assert!(cache.load_with_parents("game.absent", &TemplateRules::default()).is_err());
    }

    #[test]
    fn test_failed_import_is_retried() {
        let mut cache = cache();
        assert!(cache.get_or_load("game.missing").is_err());
        assert!(!cache.is_cached("game.missing"));
        assert!(cache.get_or_load("game.missing").is_err());
        assert_eq!(cache.load_count("game.missing"), 0);
    }
}
