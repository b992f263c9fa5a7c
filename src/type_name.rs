use crate::error::StoreError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// A type that can be stored in an [`EventStore`](crate::EventStore).
///
/// `TYPE_NAME` is the canonical name the store records at registration and
/// compares on every typed lookup. Stages that never share a Rust type graph
/// still agree on an entry's type as long as they agree on this name, so it
/// must be unique per type and stable across builds.
///
/// Names may only contain ASCII alphanumerics, `_` and `:`. The characters
/// `<`, `>` and `*` are reserved for synthesized collection names.
///
/// `Default` is required because the store allocates every payload itself.
///
/// # Examples
///
/// ```
/// use sovran_eventstore::StoreType;
///
/// #[derive(Default)]
/// struct Vertex {
///     position: [f64; 3],
/// }
///
/// impl StoreType for Vertex {
///     const TYPE_NAME: &'static str = "flavtag::Vertex";
/// }
/// ```
pub trait StoreType: Any + Send + Default {
    const TYPE_NAME: &'static str;
}

macro_rules! impl_store_type {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl StoreType for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )*
    };
}

impl_store_type! {
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    String => "String",
}

/// Checks that `name` is usable as an element type name.
pub(crate) fn validate_type_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTypeName(name.to_string()))
    }
}

/// The three storage shapes an entry can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// A single value of `T`.
    Scalar,
    /// A `Vec<T>`.
    Collection,
    /// A `Vec<Box<T>>`: every element is separately heap-owned.
    OwningCollection,
}

impl ShapeKind {
    /// Synthesizes the canonical type name for this shape over `element`.
    ///
    /// ```
    /// use sovran_eventstore::ShapeKind;
    ///
    /// assert_eq!(ShapeKind::Scalar.canonical_name("Track"), "Track");
    /// assert_eq!(ShapeKind::Collection.canonical_name("Track"), "collection<Track>");
    /// assert_eq!(ShapeKind::OwningCollection.canonical_name("Track"), "collection<Track*>");
    /// ```
    pub fn canonical_name(self, element: &str) -> String {
        match self {
            ShapeKind::Scalar => element.to_string(),
            ShapeKind::Collection => format!("collection<{}>", element),
            ShapeKind::OwningCollection => format!("collection<{}*>", element),
        }
    }

    /// Splits a canonical type name back into its shape and element name.
    pub fn parse(type_name: &str) -> (ShapeKind, &str) {
        match type_name
            .strip_prefix("collection<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            Some(inner) => match inner.strip_suffix('*') {
                Some(element) => (ShapeKind::OwningCollection, element),
                None => (ShapeKind::Collection, inner),
            },
            None => (ShapeKind::Scalar, type_name),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShapeKind::Scalar => write!(f, "scalar"),
            ShapeKind::Collection => write!(f, "collection"),
            ShapeKind::OwningCollection => write!(f, "owning collection"),
        }
    }
}

/// Maps a storage shape over an element type to the value the store holds.
///
/// Implemented by the marker types [`Scalar`], [`Collection`] and
/// [`OwningCollection`]; used with [`EventStore::lookup`](crate::EventStore::lookup).
pub trait Shape {
    type Element: StoreType;
    type Target: Any + Send + Default;
    const KIND: ShapeKind;

    fn type_name() -> String {
        Self::KIND.canonical_name(<Self::Element as StoreType>::TYPE_NAME)
    }
}

/// Marker for a single `T`.
pub struct Scalar<T>(PhantomData<fn() -> T>);

/// Marker for a `Vec<T>`.
pub struct Collection<T>(PhantomData<fn() -> T>);

/// Marker for a `Vec<Box<T>>`.
pub struct OwningCollection<T>(PhantomData<fn() -> T>);

impl<T: StoreType> Shape for Scalar<T> {
    type Element = T;
    type Target = T;
    const KIND: ShapeKind = ShapeKind::Scalar;
}

impl<T: StoreType> Shape for Collection<T> {
    type Element = T;
    type Target = Vec<T>;
    const KIND: ShapeKind = ShapeKind::Collection;
}

impl<T: StoreType> Shape for OwningCollection<T> {
    type Element = T;
    type Target = Vec<Box<T>>;
    const KIND: ShapeKind = ShapeKind::OwningCollection;
}
