//! Worklist of field resolutions postponed until the whole object graph
//! exists. Entries accumulate across every `load_all` pass of a startup
//! cycle and are drained exactly once by `complete_load`; the registry is
//! empty between cycles.

use log::warn;
use uuid::Uuid;

use crate::db::codec;
use crate::db::schema::{FieldDef, Indexed, ReferenceIndex};

/// One postponed resolution, closed over its owning entity's id and the raw
/// stored token.
struct DeferredEntry<R> {
    type_name: &'static str,
    field: &'static str,
    apply: Box<dyn FnOnce(&mut R) + Send>,
}

/// Registry of deferred field entries, scoped to one full load cycle.
pub struct DeferredRegistry<R> {
    entries: Vec<DeferredEntry<R>>,
}

impl<R: ReferenceIndex> Default for DeferredRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ReferenceIndex> DeferredRegistry<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a deferred attribute seen while loading one record.
    pub fn push<T: Indexed<R>>(&mut self, def: &'static FieldDef<T>, owner: Uuid, raw: String) {
        let type_name = T::schema().type_name;
        let field = def.name;
        let apply = Box::new(move |registry: &mut R| {
            // Same fallback rule as the immediate path: an unparsable token
            // keeps the field's default.
            let Some(value) = codec::decode(&raw, &def.kind) else {
                return;
            };
            if let Some(check) = def.check_ref {
                if !check(&*registry, &value) {
                    warn!(
                        "deferred {}.{} on {} references an entity that never loaded; keeping default",
                        type_name, field, owner
                    );
                    return;
                }
            }
            match T::lookup_mut(registry, owner) {
                Some(entity) => (def.set)(entity, value),
                None => warn!(
                    "deferred {}.{} owner {} is not registered; dropping entry",
                    type_name, field, owner
                ),
            }
        });
        self.entries.push(DeferredEntry {
            type_name,
            field,
            apply,
        });
    }

    /// Apply every entry in recording order, then clear the registry.
    pub fn drain(&mut self, registry: &mut R) {
        for entry in self.entries.drain(..) {
            log::trace!("resolving deferred {}.{}", entry.type_name, entry.field);
            (entry.apply)(registry);
        }
    }
}
