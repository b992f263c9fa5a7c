use crate::flags::StoreFlags;
use crate::type_name::ShapeKind;
use std::any::{Any, TypeId};

/// A stored payload together with the type information recorded at registration
pub(crate) struct Entry {
    type_name: String,
    type_id: TypeId,
    shape: ShapeKind,
    flags: StoreFlags,
    value: Box<dyn Any + Send>,
}

impl Entry {
    pub(crate) fn new(
        type_name: String,
        type_id: TypeId,
        shape: ShapeKind,
        flags: StoreFlags,
        value: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            type_name,
            type_id,
            shape,
            flags,
            value,
        }
    }

    pub(crate) fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn flags(&self) -> StoreFlags {
        self.flags
    }

    /// Check if the payload is of type V
    pub(crate) fn is_type<V: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<V>()
    }

    pub(crate) fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        self.value.downcast_ref::<V>()
    }

    pub(crate) fn downcast_mut<V: 'static>(&mut self) -> Option<&mut V> {
        self.value.downcast_mut::<V>()
    }

    pub(crate) fn value(&self) -> &(dyn Any + Send) {
        self.value.as_ref()
    }

    pub(crate) fn value_mut(&mut self) -> &mut (dyn Any + Send) {
        self.value.as_mut()
    }

    pub(crate) fn info(&self) -> EntryInfo {
        EntryInfo {
            type_name: self.type_name.clone(),
            shape: self.shape,
            flags: self.flags,
        }
    }
}

/// Read-only description of an entry, as returned by
/// [`EventStore::snapshot`](crate::EventStore::snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Canonical type name recorded at registration.
    pub type_name: String,
    /// Storage shape the type name was synthesized from.
    pub shape: ShapeKind,
    /// Flags given at registration.
    pub flags: StoreFlags,
}
