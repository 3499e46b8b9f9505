//! Static attribute tables: the compile-time replacement for reflection.
//!
//! Each persistable entity type declares exactly one [`EntitySchema`]: its
//! storage directory, its fields in declaration order, and any computed
//! ("save as getter") properties whose persisted form differs from their
//! backing storage. The store walks these tables instead of inspecting the
//! object at runtime.

use uuid::Uuid;

use crate::db::codec::{FieldKind, FieldValue};

/// Reads one attribute off an entity. `None` omits the key from the record.
pub type Getter<T> = fn(&T) -> Option<FieldValue>;

/// Writes one decoded attribute back onto an entity.
pub type Setter<T> = fn(&mut T, FieldValue);

/// Validates that a deferred value's entity references are present in the
/// registry before the value is applied.
pub type RefCheck = fn(&dyn ReferenceIndex, &FieldValue) -> bool;

/// One persistable attribute: name, declared kind, routing flags, accessors.
pub struct FieldDef<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Resolution waits until every entity type has finished loading.
    pub deferred: bool,
    /// Excluded from storage entirely; recomputed or defaulted on load.
    pub transient: bool,
    pub get: Getter<T>,
    pub set: Setter<T>,
    pub check_ref: Option<RefCheck>,
}

impl<T> FieldDef<T> {
    pub const fn new(name: &'static str, kind: FieldKind, get: Getter<T>, set: Setter<T>) -> Self {
        Self {
            name,
            kind,
            deferred: false,
            transient: false,
            get,
            set,
            check_ref: None,
        }
    }

    /// Mark the field deferred; `check` guards against dangling references
    /// when the entry is finally applied.
    pub const fn deferred(mut self, check: RefCheck) -> Self {
        self.deferred = true;
        self.check_ref = Some(check);
        self
    }

    pub const fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// A computed property: written on save, ignored on load.
pub struct ComputedDef<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub get: Getter<T>,
}

/// The complete persistence description of one entity type.
pub struct EntitySchema<T: 'static> {
    /// Short name used in registry lookups and log lines.
    pub type_name: &'static str,
    /// Directory under the data root holding this type's record files.
    pub directory: &'static str,
    /// All fields in stable declaration order.
    pub fields: &'static [FieldDef<T>],
    pub computed: &'static [ComputedDef<T>],
}

/// A domain object the flat-file store can persist.
pub trait Saveable: Sized + Send + 'static {
    fn schema() -> &'static EntitySchema<Self>;

    /// Construct a blank instance with an absent (nil) identifier; the
    /// record's own `uuid` key restores the real one during load.
    fn blank() -> Self;

    /// Globally unique, stable identifier. Names the record file.
    fn id(&self) -> Uuid;
}

/// Presence checks over the in-memory registry, used when deferred
/// cross-type references are resolved.
pub trait ReferenceIndex {
    fn contains(&self, type_name: &str, id: Uuid) -> bool;
}

/// Locates an entity of this type inside registry `R` so a deferred field
/// can be applied after the owning object has been handed off.
pub trait Indexed<R>: Saveable {
    fn lookup_mut(registry: &mut R, id: Uuid) -> Option<&mut Self>;
}
