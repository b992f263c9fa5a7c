use crate::error::StoreError;
use crate::type_name::{
    validate_type_name, Collection, OwningCollection, Scalar, Shape, ShapeKind, StoreType,
};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tracing::debug;

type Factory = fn() -> Box<dyn Any + Send>;

fn new_boxed<V: Any + Send + Default>() -> Box<dyn Any + Send> {
    Box::new(V::default())
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    type_id: TypeId,
    shape: ShapeKind,
    factory: Factory,
}

impl Binding {
    fn of<S: Shape>() -> (String, Self) {
        (
            S::type_name(),
            Self {
                type_id: TypeId::of::<S::Target>(),
                shape: S::KIND,
                factory: new_boxed::<S::Target>,
            },
        )
    }
}

/// The set of types a store can allocate by name.
///
/// Every canonical type name is bound to exactly one Rust type. Declaring a
/// type binds all three of its shapes at once, so an untyped registration of
/// `"collection<Track*>"` works as soon as `Track` has been declared.
///
/// # Examples
///
/// ```
/// use sovran_eventstore::{StoreType, TypeCatalog};
///
/// #[derive(Default)]
/// struct Track;
///
/// impl StoreType for Track {
///     const TYPE_NAME: &'static str = "Track";
/// }
///
/// let mut catalog = TypeCatalog::new();
/// catalog.add::<Track>()?;
///
/// assert!(catalog.contains("Track"));
/// assert!(catalog.contains("collection<Track>"));
/// assert!(catalog.contains("collection<Track*>"));
/// # Ok::<(), sovran_eventstore::StoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct TypeCatalog {
    bindings: HashMap<String, Binding>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Declares `T` together with its collection shapes.
    ///
    /// Declaring the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::InvalidTypeName` if `T::TYPE_NAME` is not a valid element name
    /// - Returns `StoreError::TypeNameCollision` if another type already uses any of the
    ///   three canonical names; the catalog is left unchanged
    pub fn add<T: StoreType>(&mut self) -> Result<(), StoreError> {
        validate_type_name(T::TYPE_NAME)?;

        let bindings = [
            Binding::of::<Scalar<T>>(),
            Binding::of::<Collection<T>>(),
            Binding::of::<OwningCollection<T>>(),
        ];

        let mut fresh = false;
        for (name, binding) in &bindings {
            match self.bindings.get(name) {
                Some(existing) if existing.type_id == binding.type_id => {}
                Some(_) => return Err(StoreError::TypeNameCollision(name.clone())),
                None => fresh = true,
            }
        }

        if fresh {
            debug!(type_name = T::TYPE_NAME, "declared store type");
            self.bindings.extend(bindings);
        }
        Ok(())
    }

    /// Returns true if `type_name` can be allocated by this catalog.
    pub fn contains(&self, type_name: &str) -> bool {
        self.bindings.contains_key(type_name)
    }

    /// Returns every declared canonical type name, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of canonical type names (three per declared type).
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Allocates a default value for `type_name`.
    pub(crate) fn instantiate(
        &self,
        type_name: &str,
    ) -> Result<(TypeId, ShapeKind, Box<dyn Any + Send>), StoreError> {
        let binding = self
            .bindings
            .get(type_name)
            .ok_or_else(|| StoreError::UnknownType(type_name.to_string()))?;
        Ok((binding.type_id, binding.shape, (binding.factory)()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Jet {
        energy: f64,
    }

    impl StoreType for Jet {
        const TYPE_NAME: &'static str = "Jet";
    }

    // Claims the same name as Jet.
    #[derive(Default)]
    struct Impostor;

    impl StoreType for Impostor {
        const TYPE_NAME: &'static str = "Jet";
    }

    #[derive(Default)]
    struct Malformed;

    impl StoreType for Malformed {
        const TYPE_NAME: &'static str = "collection<Jet>";
    }

    #[test]
    fn test_add_binds_all_shapes() -> Result<(), StoreError> {
        let mut catalog = TypeCatalog::new();
        assert!(catalog.is_empty());

        catalog.add::<Jet>()?;
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.type_names(),
            vec!["Jet", "collection<Jet*>", "collection<Jet>"]
        );

        // Re-declaring is harmless
        catalog.add::<Jet>()?;
        assert_eq!(catalog.len(), 3);
        Ok(())
    }

    #[test]
    fn test_collision_is_rejected() -> Result<(), StoreError> {
        let mut catalog = TypeCatalog::new();
        catalog.add::<Jet>()?;

        assert_eq!(
            catalog.add::<Impostor>(),
            Err(StoreError::TypeNameCollision("Jet".to_string()))
        );
        assert_eq!(catalog.len(), 3);
        Ok(())
    }

    #[test]
    fn test_reserved_characters_are_rejected() {
        let mut catalog = TypeCatalog::new();
        assert_eq!(
            catalog.add::<Malformed>(),
            Err(StoreError::InvalidTypeName("collection<Jet>".to_string()))
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_instantiate() -> Result<(), StoreError> {
        let mut catalog = TypeCatalog::new();
        catalog.add::<Jet>()?;

        let (type_id, shape, value) = catalog.instantiate("Jet")?;
        assert_eq!(type_id, TypeId::of::<Jet>());
        assert_eq!(shape, ShapeKind::Scalar);
        assert_eq!(value.downcast_ref::<Jet>(), Some(&Jet::default()));

        let (type_id, shape, value) = catalog.instantiate("collection<Jet*>")?;
        assert_eq!(type_id, TypeId::of::<Vec<Box<Jet>>>());
        assert_eq!(shape, ShapeKind::OwningCollection);
        assert!(value.downcast_ref::<Vec<Box<Jet>>>().is_some_and(Vec::is_empty));

        assert!(matches!(
            catalog.instantiate("Vertex"),
            Err(StoreError::UnknownType(name)) if name == "Vertex"
        ));
        Ok(())
    }
}
