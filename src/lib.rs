//! # sovran-eventstore
//!
//! A named, runtime-typed object store for sequential processing pipelines.
//!
//! `sovran-eventstore` lets independent processing stages exchange data by name
//! without sharing compile-time type information. A stage registers an object
//! under a name, fills it in, and later stages look it up by name and get a
//! type-checked reference back. Type identity is carried by a canonical type
//! name that every stage agrees on, so stages only need to agree on
//! [`StoreType::TYPE_NAME`], not on a shared crate graph.
//!
//! ## Key Features
//!
//! - **Type-checked**: Every typed lookup compares the requested canonical type name with the one recorded at registration
//! - **Three shapes**: Scalars (`T`), value collections (`Vec<T>`) and owning collections (`Vec<Box<T>>`), never interchangeable
//! - **Store-owned**: The store allocates every payload itself and releases them all when dropped
//! - **Append-only**: Each name is registered once; duplicates are rejected without touching the existing entry
//! - **Process-wide**: [`EventStore::instance`] hands out the single shared store
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_eventstore::{EventStore, StoreError, StoreFlags, StoreType};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Vertex {
//!     position: [f64; 3],
//! }
//!
//! impl StoreType for Vertex {
//!     const TYPE_NAME: &'static str = "Vertex";
//! }
//!
//! #[derive(Default)]
//! struct Jet;
//!
//! impl StoreType for Jet {
//!     const TYPE_NAME: &'static str = "Jet";
//! }
//!
//! fn main() -> Result<(), StoreError> {
//!     let mut store = EventStore::new();
//!
//!     // The store allocates; the caller fills in place
//!     let vertex = store.register::<Vertex>("PrimaryVertex", StoreFlags::PERSIST)?;
//!     vertex.position = [0.0, 0.1, -0.2];
//!
//!     // Retrieve with the registered type
//!     let vertex = store.get::<Vertex>("PrimaryVertex");
//!     assert_eq!(vertex.map(|v| v.position), Some([0.0, 0.1, -0.2]));
//!
//!     // Any other type is a silent miss
//!     assert!(store.get::<Jet>("PrimaryVertex").is_none());
//!     assert!(store.get::<Vertex>("SecondaryVertex").is_none());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Owning Collections
//!
//! ```rust
//! use sovran_eventstore::{EventStore, StoreError, StoreFlags, StoreType};
//!
//! #[derive(Default)]
//! struct Jet {
//!     energy: f64,
//! }
//!
//! impl StoreType for Jet {
//!     const TYPE_NAME: &'static str = "Jet";
//! }
//!
//! fn main() -> Result<(), StoreError> {
//!     let mut store = EventStore::new();
//!
//!     let jets = store.register_owning_collection::<Jet>("Jets", StoreFlags::empty())?;
//!     jets.push(Box::new(Jet { energy: 91.2 }));
//!
//!     assert_eq!(store.type_name("Jets"), Some("collection<Jet*>"));
//!
//!     // The value-collection shape of the same element type does not match
//!     assert!(store.get_collection::<Jet>("Jets").is_none());
//!
//!     let total: f64 = store
//!         .get_owning_collection::<Jet>("Jets")
//!         .map(|jets| jets.iter().map(|jet| jet.energy).sum::<f64>())
//!         .unwrap_or_default();
//!     assert_eq!(total, 91.2);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Registering by Type Name
//!
//! Stages that only know a type by name can still register it, as long as the
//! type has been declared to the store's catalog.
//!
//! ```rust
//! use sovran_eventstore::{EventStore, StoreError, StoreFlags, StoreType, TypeCatalog};
//!
//! #[derive(Default)]
//! struct Track {
//!     charge: i8,
//! }
//!
//! impl StoreType for Track {
//!     const TYPE_NAME: &'static str = "Track";
//! }
//!
//! fn main() -> Result<(), StoreError> {
//!     let mut catalog = TypeCatalog::new();
//!     catalog.add::<Track>()?;
//!     let mut store = EventStore::with_catalog(catalog);
//!
//!     let payload = store.register_untyped("Tracks", "collection<Track>", StoreFlags::empty())?;
//!     if let Some(tracks) = payload.downcast_mut::<Vec<Track>>() {
//!         tracks.push(Track { charge: -1 });
//!     }
//!
//!     assert_eq!(store.get_collection::<Track>("Tracks").map(Vec::len), Some(1));
//!
//!     // Unknown type names are refused
//!     match store.register_untyped("Clusters", "Cluster", StoreFlags::empty()) {
//!         Err(StoreError::UnknownType(name)) => println!("{} is not declared", name),
//!         Err(e) => println!("Other error: {}", e),
//!         Ok(_) => unreachable!(),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! The `get` family answers with `Option` because a missing or differently
//! typed entry is an ordinary outcome when stages negotiate optional data.
//! [`EventStore::lookup`] reports which of the two happened.
//!
//! ```rust
//! use sovran_eventstore::{EventStore, Scalar, StoreError, StoreFlags};
//!
//! let mut store = EventStore::new();
//! if let Err(e) = store.register::<String>("Detector", StoreFlags::empty()) {
//!     eprintln!("Failed to register: {}", e);
//!     return;
//! }
//!
//! match store.lookup::<Scalar<i32>>("Detector") {
//!     Ok(value) => println!("Detector: {}", value),
//!     Err(StoreError::KeyNotFound(_)) => println!("Detector not registered"),
//!     Err(StoreError::TypeMismatch { found, .. }) => println!("Detector is a {}", found),
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // A second registration under the same name is refused
//! assert!(matches!(
//!     store.register::<String>("Detector", StoreFlags::empty()),
//!     Err(StoreError::DuplicateName(_))
//! ));
//! ```

mod catalog;
mod entry;
mod error;
mod flags;
mod global;
mod store;
mod type_name;

pub use catalog::TypeCatalog;
pub use entry::EntryInfo;
pub use error::StoreError;
pub use flags::StoreFlags;
pub use store::EventStore;
pub use type_name::{Collection, OwningCollection, Scalar, Shape, ShapeKind, StoreType};

// Re-export std::any for convenience
pub use std::any::Any;
