use sovran_eventstore::{
    Collection, EventStore, OwningCollection, Scalar, ShapeKind, StoreError, StoreFlags,
    StoreType, TypeCatalog,
};
use std::any::Any;

#[derive(Debug, Default, Clone, PartialEq)]
struct Vertex {
    position: [f64; 3],
    chi2: f64,
}

impl StoreType for Vertex {
    const TYPE_NAME: &'static str = "flavtag::Vertex";
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Track {
    momentum: [f64; 3],
    charge: i8,
}

impl StoreType for Track {
    const TYPE_NAME: &'static str = "flavtag::Track";
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Jet {
    energy: f64,
    tracks: Vec<usize>,
}

impl StoreType for Jet {
    const TYPE_NAME: &'static str = "flavtag::Jet";
}

// Claims Jet's name from another stage.
#[derive(Default)]
struct ForeignJet;

impl StoreType for ForeignJet {
    const TYPE_NAME: &'static str = "flavtag::Jet";
}

fn track(charge: i8) -> Track {
    Track {
        momentum: [1.0, 0.0, f64::from(charge)],
        charge,
    }
}

#[test]
fn test_primary_vertex_scenario() -> Result<(), StoreError> {
    let mut store = EventStore::new();

    let vertex = store.register::<Vertex>("PrimaryVertex", StoreFlags::empty())?;
    vertex.position = [0.01, -0.02, 0.5];

    assert!(store.exists("PrimaryVertex"));
    assert_eq!(
        store.get::<Vertex>("PrimaryVertex").map(|v| v.position),
        Some([0.01, -0.02, 0.5])
    );
    assert!(store.get::<Jet>("PrimaryVertex").is_none());
    assert_eq!(store.type_name("PrimaryVertex"), Some("flavtag::Vertex"));
    Ok(())
}

#[test]
fn test_tracks_scenario() -> Result<(), StoreError> {
    let mut store = EventStore::new();

    let expected = vec![track(1), track(-1), track(1)];
    store
        .register_collection::<Track>("Tracks", StoreFlags::empty())?
        .extend(expected.iter().cloned());

    assert!(store.get_owning_collection::<Track>("Tracks").is_none());
    assert_eq!(store.get_collection::<Track>("Tracks"), Some(&expected));
    Ok(())
}

#[test]
fn test_jets_scenario() -> Result<(), StoreError> {
    let mut store = EventStore::new();

    store
        .register_owning_collection::<Jet>("Jets", StoreFlags::PERSIST)?
        .push(Box::new(Jet {
            energy: 45.6,
            tracks: vec![0, 2],
        }));

    let second = store.register_owning_collection::<Jet>("Jets", StoreFlags::empty());
    assert!(matches!(second, Err(StoreError::DuplicateName(ref name)) if name == "Jets"));

    let jets = store
        .get_owning_collection::<Jet>("Jets")
        .expect("first registration is kept");
    assert_eq!(jets.len(), 1);
    assert_eq!(jets[0].tracks, vec![0, 2]);
    assert_eq!(store.flags("Jets"), Some(StoreFlags::PERSIST));
    Ok(())
}

#[test]
fn test_duplicate_with_other_shape_is_rejected() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    *store.register::<f64>("Threshold", StoreFlags::empty())? = 0.25;

    assert!(store
        .register_collection::<f64>("Threshold", StoreFlags::empty())
        .is_err());
    assert!(store
        .register_untyped("Threshold", "collection<f64*>", StoreFlags::empty())
        .is_err());

    assert_eq!(store.type_name("Threshold"), Some("f64"));
    assert_eq!(store.get::<f64>("Threshold"), Some(&0.25));
    Ok(())
}

#[test]
fn test_round_trip_for_every_shape() -> Result<(), StoreError> {
    let mut store = EventStore::new();

    *store.register::<Track>("scalar", StoreFlags::empty())? = track(1);
    store
        .register_collection::<Track>("values", StoreFlags::empty())?
        .push(track(-1));
    store
        .register_owning_collection::<Track>("owned", StoreFlags::empty())?
        .push(Box::new(track(1)));

    assert_eq!(store.get::<Track>("scalar"), Some(&track(1)));
    assert_eq!(store.get_collection::<Track>("values"), Some(&vec![track(-1)]));
    assert_eq!(
        store.get_owning_collection::<Track>("owned"),
        Some(&vec![Box::new(track(1))])
    );

    // Each shape only answers to itself
    assert!(store.get_collection::<Track>("scalar").is_none());
    assert!(store.get_owning_collection::<Track>("scalar").is_none());
    assert!(store.get::<Track>("values").is_none());
    assert!(store.get_owning_collection::<Track>("values").is_none());
    assert!(store.get::<Track>("owned").is_none());
    assert!(store.get_collection::<Track>("owned").is_none());

    // Same shape, other element type
    assert!(store.get::<Vertex>("scalar").is_none());
    assert!(store.get_collection::<Vertex>("values").is_none());
    assert!(store.get_owning_collection::<Vertex>("owned").is_none());
    Ok(())
}

#[test]
fn test_typed_get_returns_the_registered_object() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    let registered: *const Vertex =
        store.register::<Vertex>("PrimaryVertex", StoreFlags::empty())?;

    // Later registrations must not move existing payloads
    for i in 0..64 {
        store.register::<u64>(&format!("filler{}", i), StoreFlags::empty())?;
    }

    let fetched: *const Vertex = store.get::<Vertex>("PrimaryVertex").unwrap();
    assert_eq!(registered, fetched);
    Ok(())
}

#[test]
fn test_absent_names() {
    let store = EventStore::new();

    assert!(!store.exists("Nothing"));
    assert!(store.type_name("Nothing").is_none());
    assert!(store.flags("Nothing").is_none());
    assert!(store.get_untyped("Nothing").is_none());
    assert!(store.get::<Vertex>("Nothing").is_none());
    assert!(store.get::<i32>("Nothing").is_none());
    assert!(store.get_collection::<Track>("Nothing").is_none());
    assert!(store.get_owning_collection::<Jet>("Nothing").is_none());
    assert!(matches!(
        store.lookup::<Collection<Track>>("Nothing"),
        Err(StoreError::KeyNotFound(_))
    ));
}

#[test]
fn test_lookup_reports_mismatch() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    store.register_collection::<Track>("Tracks", StoreFlags::empty())?;

    match store.lookup::<OwningCollection<Track>>("Tracks") {
        Err(StoreError::TypeMismatch {
            name,
            expected,
            found,
        }) => {
            assert_eq!(name, "Tracks");
            assert_eq!(expected, "collection<flavtag::Track*>");
            assert_eq!(found, "collection<flavtag::Track>");
        }
        other => panic!("expected a type mismatch, got {:?}", other.map(|_| ())),
    }

    assert!(store.lookup::<Collection<Track>>("Tracks").is_ok());
    Ok(())
}

#[test]
fn test_untyped_registration_through_catalog() -> Result<(), StoreError> {
    let mut catalog = TypeCatalog::new();
    catalog.add::<Track>()?;
    let mut store = EventStore::with_catalog(catalog);

    let payload = store.register_untyped(
        "SelectedTracks",
        "collection<flavtag::Track*>",
        StoreFlags::JET_EXTRACT_VERTEX,
    )?;
    payload
        .downcast_mut::<Vec<Box<Track>>>()
        .expect("allocated as an owning collection")
        .push(Box::new(track(-1)));

    let tracks = store
        .get_owning_collection::<Track>("SelectedTracks")
        .expect("typed view of an untyped registration");
    assert_eq!(tracks[0].charge, -1);

    assert_eq!(
        store
            .register_untyped("Vertices", "flavtag::Vertex", StoreFlags::empty())
            .err(),
        Some(StoreError::UnknownType("flavtag::Vertex".to_string()))
    );
    assert!(!store.exists("Vertices"));

    store.declare::<Vertex>()?;
    assert!(store
        .register_untyped("Vertices", "collection<flavtag::Vertex>", StoreFlags::empty())
        .is_ok());
    assert_eq!(store.get_collection::<Vertex>("Vertices"), Some(&Vec::new()));
    Ok(())
}

#[test]
fn test_get_untyped_skips_type_check() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    *store.register::<String>("Detector", StoreFlags::empty())? = "ILD".to_string();

    let raw: &dyn Any = store.get_untyped("Detector").expect("registered");
    assert_eq!(raw.downcast_ref::<String>().map(String::as_str), Some("ILD"));
    assert!(raw.downcast_ref::<i32>().is_none());

    if let Some(raw) = store.get_untyped_mut("Detector") {
        if let Some(detector) = raw.downcast_mut::<String>() {
            detector.push_str("-v2");
        }
    }
    assert_eq!(store.get::<String>("Detector").map(String::as_str), Some("ILD-v2"));
    Ok(())
}

#[test]
fn test_type_name_collision_is_rejected() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    store.register::<Jet>("Jet", StoreFlags::empty())?;

    assert_eq!(
        store.register::<ForeignJet>("OtherJet", StoreFlags::empty()).err(),
        Some(StoreError::TypeNameCollision("flavtag::Jet".to_string()))
    );
    assert_eq!(
        store.declare::<ForeignJet>(),
        Err(StoreError::TypeNameCollision("flavtag::Jet".to_string()))
    );
    assert!(!store.exists("OtherJet"));
    assert_eq!(store.len(), 1);
    Ok(())
}

#[test]
fn test_snapshot_and_flag_selection() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    store.register::<Vertex>("PrimaryVertex", StoreFlags::PERSIST)?;
    store.register_collection::<Track>("Tracks", StoreFlags::empty())?;
    store.register_owning_collection::<Jet>(
        "Jets",
        StoreFlags::PERSIST | StoreFlags::JET_EXTRACT_VERTEX,
    )?;

    let snapshot = store.snapshot();
    let names: Vec<&str> = snapshot.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Jets", "PrimaryVertex", "Tracks"]);

    let jets = &snapshot["Jets"];
    assert_eq!(jets.type_name, "collection<flavtag::Jet*>");
    assert_eq!(jets.shape, ShapeKind::OwningCollection);
    assert!(jets.flags.contains(StoreFlags::JET_EXTRACT_VERTEX));
    assert_eq!(snapshot["Tracks"].shape, ShapeKind::Collection);
    assert_eq!(snapshot["PrimaryVertex"].shape, ShapeKind::Scalar);

    assert_eq!(
        store.names_with_flags(StoreFlags::PERSIST),
        vec!["Jets", "PrimaryVertex"]
    );
    assert_eq!(
        store.names_with_flags(StoreFlags::JET_EXTRACT_VERTEX),
        vec!["Jets"]
    );
    Ok(())
}

#[test]
fn test_dump_does_not_mutate() -> Result<(), StoreError> {
    let mut store = EventStore::new();
    store.register::<Vertex>("PrimaryVertex", StoreFlags::PERSIST)?;
    let before = store.snapshot();

    store.dump();
    let listing = format!("{}", store);
    assert!(listing.contains("PrimaryVertex"));
    assert!(listing.contains("flavtag::Vertex"));

    assert_eq!(store.snapshot(), before);
    Ok(())
}

#[test]
fn test_scalar_shape_names() {
    assert_eq!(
        ShapeKind::parse("collection<flavtag::Jet*>"),
        (ShapeKind::OwningCollection, "flavtag::Jet")
    );
    assert_eq!(
        <Scalar<Vertex> as sovran_eventstore::Shape>::type_name(),
        "flavtag::Vertex"
    );
}

#[test]
fn test_error_display() {
    assert_eq!(StoreError::LockError.to_string(), "Failed to acquire lock");
    assert_eq!(
        StoreError::KeyNotFound("Jets".to_string()).to_string(),
        "No entry named 'Jets' in store"
    );
    assert_eq!(
        StoreError::TypeMismatch {
            name: "Jets".to_string(),
            expected: "flavtag::Jet".to_string(),
            found: "collection<flavtag::Jet*>".to_string(),
        }
        .to_string(),
        "Type mismatch for 'Jets': requested flavtag::Jet, stored collection<flavtag::Jet*>"
    );
    assert_eq!(
        StoreError::DuplicateName("Jets".to_string()).to_string(),
        "An entry named 'Jets' is already registered"
    );

    // Test Debug implementation
    assert!(format!("{:?}", StoreError::EmptyName).contains("EmptyName"));
}
