use crate::catalog::TypeCatalog;
use crate::entry::{Entry, EntryInfo};
use crate::error::StoreError;
use crate::flags::StoreFlags;
use crate::type_name::{Collection, OwningCollection, Scalar, Shape, StoreType};
use std::any::Any;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use tracing::{debug, trace};

/// A named, runtime-typed object store.
///
/// Stages publish objects by registering a name, which allocates a default
/// value owned by the store and hands back a mutable reference to fill in.
/// Later stages fetch the object by name; every typed lookup compares the
/// canonical type name recorded at registration with the one requested, so a
/// stage can never read an entry as the wrong type.
///
/// Entries are append-only: there is no removal or replacement. Every payload
/// is released when the store is dropped.
///
/// The store has no internal locking. [`EventStore::instance`] wraps the
/// process-wide store in a mutex for callers that need one.
///
/// # Examples
///
/// ```
/// use sovran_eventstore::{EventStore, StoreFlags, StoreType};
///
/// #[derive(Default, Debug, Clone, PartialEq)]
/// struct Track {
///     momentum: f64,
/// }
///
/// impl StoreType for Track {
///     const TYPE_NAME: &'static str = "Track";
/// }
///
/// let mut store = EventStore::new();
///
/// let tracks = store.register_collection::<Track>("Tracks", StoreFlags::PERSIST)?;
/// tracks.push(Track { momentum: 1.5 });
/// tracks.push(Track { momentum: 4.0 });
///
/// // Same element type, different shape: not interchangeable
/// assert!(store.get_owning_collection::<Track>("Tracks").is_none());
///
/// let tracks = store.get_collection::<Track>("Tracks").unwrap();
/// assert_eq!(tracks.len(), 2);
/// assert_eq!(store.type_name("Tracks"), Some("collection<Track>"));
/// # Ok::<(), sovran_eventstore::StoreError>(())
/// ```
#[derive(Default)]
pub struct EventStore {
    entries: BTreeMap<String, Entry>,
    catalog: TypeCatalog,
}

impl EventStore {
    /// Creates an empty store with an empty catalog.
    pub fn new() -> Self {
        Self::with_catalog(TypeCatalog::new())
    }

    /// Creates an empty store that can allocate the types declared in `catalog`.
    pub fn with_catalog(catalog: TypeCatalog) -> Self {
        debug!(declared_types = catalog.len(), "creating event store");
        Self {
            entries: BTreeMap::new(),
            catalog,
        }
    }

    /// Returns the catalog of types this store can allocate by name.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Declares `T` so that it can be registered through
    /// [`register_untyped`](Self::register_untyped).
    ///
    /// Typed registration declares its element type automatically.
    ///
    /// # Errors
    ///
    /// See [`TypeCatalog::add`].
    pub fn declare<T: StoreType>(&mut self) -> Result<(), StoreError> {
        self.catalog.add::<T>()
    }

    /// Returns true if an entry with this name has been registered.
    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the canonical type name recorded for `name`.
    pub fn type_name(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(Entry::type_name)
    }

    /// Returns the flags given when `name` was registered.
    pub fn flags(&self, name: &str) -> Option<StoreFlags> {
        self.entries.get(name).map(Entry::flags)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the payload for `name` without checking its declared type.
    ///
    /// This is the escape hatch for callers that have no static type to ask
    /// for. Downcasting the result is the caller's responsibility; prefer the
    /// typed getters.
    pub fn get_untyped(&self, name: &str) -> Option<&(dyn Any + Send)> {
        self.entries.get(name).map(Entry::value)
    }

    /// Mutable form of [`get_untyped`](Self::get_untyped).
    pub fn get_untyped_mut(&mut self, name: &str) -> Option<&mut (dyn Any + Send)> {
        self.entries.get_mut(name).map(Entry::value_mut)
    }

    /// Allocates a default value of the declared type `type_name` under `name`.
    ///
    /// The returned reference points at the store-owned payload so the caller
    /// can populate it in place.
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::EmptyName` if `name` is empty
    /// - Returns `StoreError::DuplicateName` if `name` is already registered
    /// - Returns `StoreError::UnknownType` if `type_name` is not in the catalog
    ///
    /// The store is unchanged on error.
    pub fn register_untyped(
        &mut self,
        name: &str,
        type_name: &str,
        flags: StoreFlags,
    ) -> Result<&mut (dyn Any + Send), StoreError> {
        self.insert(name, type_name, flags).map(Entry::value_mut)
    }

    /// Registers a scalar `T` under `name`.
    ///
    /// # Errors
    ///
    /// Same as [`register_untyped`](Self::register_untyped), plus the catalog
    /// errors of [`TypeCatalog::add`] for `T`.
    pub fn register<T: StoreType>(
        &mut self,
        name: &str,
        flags: StoreFlags,
    ) -> Result<&mut T, StoreError> {
        self.register_shaped::<Scalar<T>>(name, flags)
    }

    /// Registers a `Vec<T>` under `name`; its type name is `collection<T>`.
    pub fn register_collection<T: StoreType>(
        &mut self,
        name: &str,
        flags: StoreFlags,
    ) -> Result<&mut Vec<T>, StoreError> {
        self.register_shaped::<Collection<T>>(name, flags)
    }

    /// Registers a `Vec<Box<T>>` under `name`; its type name is `collection<T*>`.
    pub fn register_owning_collection<T: StoreType>(
        &mut self,
        name: &str,
        flags: StoreFlags,
    ) -> Result<&mut Vec<Box<T>>, StoreError> {
        self.register_shaped::<OwningCollection<T>>(name, flags)
    }

    /// Returns the scalar `T` registered under `name`.
    ///
    /// Returns `None` both when `name` is absent and when it holds another type.
    pub fn get<T: StoreType>(&self, name: &str) -> Option<&T> {
        self.lookup::<Scalar<T>>(name).ok()
    }

    /// Returns the `Vec<T>` registered under `name`.
    pub fn get_collection<T: StoreType>(&self, name: &str) -> Option<&Vec<T>> {
        self.lookup::<Collection<T>>(name).ok()
    }

    /// Returns the `Vec<Box<T>>` registered under `name`.
    pub fn get_owning_collection<T: StoreType>(&self, name: &str) -> Option<&Vec<Box<T>>> {
        self.lookup::<OwningCollection<T>>(name).ok()
    }

    /// Mutable form of [`get`](Self::get).
    pub fn get_mut<T: StoreType>(&mut self, name: &str) -> Option<&mut T> {
        self.lookup_mut::<Scalar<T>>(name).ok()
    }

    /// Mutable form of [`get_collection`](Self::get_collection).
    pub fn get_collection_mut<T: StoreType>(&mut self, name: &str) -> Option<&mut Vec<T>> {
        self.lookup_mut::<Collection<T>>(name).ok()
    }

    /// Mutable form of [`get_owning_collection`](Self::get_owning_collection).
    pub fn get_owning_collection_mut<T: StoreType>(
        &mut self,
        name: &str,
    ) -> Option<&mut Vec<Box<T>>> {
        self.lookup_mut::<OwningCollection<T>>(name).ok()
    }

    /// Typed lookup that reports why it failed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_eventstore::{EventStore, Scalar, StoreError, StoreFlags};
    ///
    /// let mut store = EventStore::new();
    /// *store.register::<f64>("Threshold", StoreFlags::empty())? = 0.7;
    ///
    /// assert_eq!(store.lookup::<Scalar<f64>>("Threshold")?, &0.7);
    /// assert!(matches!(
    ///     store.lookup::<Scalar<i32>>("Threshold"),
    ///     Err(StoreError::TypeMismatch { .. })
    /// ));
    /// assert!(matches!(
    ///     store.lookup::<Scalar<f64>>("Missing"),
    ///     Err(StoreError::KeyNotFound(_))
    /// ));
    /// # Ok::<(), StoreError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::KeyNotFound` if `name` is absent
    /// - Returns `StoreError::TypeMismatch` if the entry was registered with another type
    pub fn lookup<S: Shape>(&self, name: &str) -> Result<&S::Target, StoreError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| not_found(name))?;
        check_type::<S>(name, entry)?;
        entry
            .downcast_ref::<S::Target>()
            .ok_or_else(|| mismatch::<S>(name, entry.type_name()))
    }

    /// Mutable form of [`lookup`](Self::lookup).
    pub fn lookup_mut<S: Shape>(&mut self, name: &str) -> Result<&mut S::Target, StoreError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| not_found(name))?;
        check_type::<S>(name, entry)?;
        // check_type matched the stored name against S
        entry
            .downcast_mut::<S::Target>()
            .ok_or_else(|| mismatch::<S>(name, &S::type_name()))
    }

    /// Returns name, type and flags of every entry, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, EntryInfo> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.info()))
            .collect()
    }

    /// Returns the names of entries carrying all of `flags`, ordered by name.
    pub fn names_with_flags(&self, flags: StoreFlags) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.flags().contains(flags))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Prints every entry's name, type and flags to stdout.
    pub fn dump(&self) {
        print!("{}", self);
    }

    fn register_shaped<S: Shape>(
        &mut self,
        name: &str,
        flags: StoreFlags,
    ) -> Result<&mut S::Target, StoreError> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.entries.contains_key(name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        self.catalog.add::<S::Element>()?;

        let type_name = S::type_name();
        self.insert(name, &type_name, flags)?
            .downcast_mut::<S::Target>()
            .ok_or_else(|| mismatch::<S>(name, &type_name))
    }

    fn insert(
        &mut self,
        name: &str,
        type_name: &str,
        flags: StoreFlags,
    ) -> Result<&mut Entry, StoreError> {
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        match self.entries.entry(name.to_string()) {
            btree_map::Entry::Occupied(_) => Err(StoreError::DuplicateName(name.to_string())),
            btree_map::Entry::Vacant(slot) => {
                let (type_id, shape, value) = self.catalog.instantiate(type_name)?;
                debug!(entry = name, type_name, flags = %flags.label(), "registered entry");
                Ok(slot.insert(Entry::new(
                    type_name.to_string(),
                    type_id,
                    shape,
                    flags,
                    value,
                )))
            }
        }
    }
}

fn not_found(name: &str) -> StoreError {
    trace!(entry = name, "lookup of unregistered entry");
    StoreError::KeyNotFound(name.to_string())
}

fn mismatch<S: Shape>(name: &str, found: &str) -> StoreError {
    StoreError::TypeMismatch {
        name: name.to_string(),
        expected: S::type_name(),
        found: found.to_string(),
    }
}

fn check_type<S: Shape>(name: &str, entry: &Entry) -> Result<(), StoreError> {
    let requested = S::type_name();
    if entry.type_name() == requested && entry.is_type::<S::Target>() {
        return Ok(());
    }
    trace!(
        entry = name,
        stored = entry.type_name(),
        requested = %requested,
        "lookup with mismatched type"
    );
    Err(mismatch::<S>(name, entry.type_name()))
}

impl fmt::Display for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "EventStore: {} entries", self.entries.len())?;
        for (name, entry) in &self.entries {
            writeln!(
                f,
                "  {:<24} {:<32} {}",
                name,
                entry.type_name(),
                entry.flags().label()
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventStore")
            .field("entries", &self.snapshot())
            .field("catalog", &self.catalog)
            .finish()
    }
}
