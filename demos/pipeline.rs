//! Demonstrates stages of an event-processing pipeline exchanging data
//! through the process-wide EventStore.
//!
//! Each stage only knows the names and types of the entries it reads and
//! writes. The finder publishes tracks, the fitter reads them and publishes a
//! vertex and jets, and the writer picks everything marked for persistence.
//!
//! Run with: RUST_LOG=debug cargo run --example pipeline

use sovran_eventstore::{EventStore, StoreError, StoreFlags, StoreType};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut store = EventStore::instance()?;

    TrackFinder.process(&mut store)?;
    VertexFitter { max_chi2: 5.0 }.process(&mut store)?;
    JetClustering { cone: 0.7 }.process(&mut store)?;
    Writer.process(&mut store)?;

    store.dump();
    Ok(())
}

#[derive(Debug, Default, Clone)]
struct Track {
    phi: f64,
    pt: f64,
    d0: f64,
}

impl StoreType for Track {
    const TYPE_NAME: &'static str = "demo::Track";
}

#[derive(Debug, Default)]
struct Vertex {
    position: [f64; 3],
    chi2: f64,
    ntracks: usize,
}

impl StoreType for Vertex {
    const TYPE_NAME: &'static str = "demo::Vertex";
}

#[derive(Debug, Default)]
struct Jet {
    phi: f64,
    pt: f64,
    tracks: Vec<usize>,
}

impl StoreType for Jet {
    const TYPE_NAME: &'static str = "demo::Jet";
}

trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, store: &mut EventStore) -> Result<(), StoreError>;

    fn process(&self, store: &mut EventStore) -> Result<(), StoreError> {
        info!(stage = self.name(), "running stage");
        self.run(store)
    }
}

struct TrackFinder;

impl Stage for TrackFinder {
    fn name(&self) -> &'static str {
        "TrackFinder"
    }

    fn run(&self, store: &mut EventStore) -> Result<(), StoreError> {
        let tracks = store.register_collection::<Track>("Tracks", StoreFlags::PERSIST)?;
        tracks.extend([
            Track {
                phi: 0.10,
                pt: 12.0,
                d0: 0.01,
            },
            Track {
                phi: 0.25,
                pt: 7.5,
                d0: 0.02,
            },
            Track {
                phi: 2.90,
                pt: 20.0,
                d0: 0.30,
            },
            Track {
                phi: 3.05,
                pt: 4.0,
                d0: 0.01,
            },
        ]);
        Ok(())
    }
}

struct VertexFitter {
    max_chi2: f64,
}

impl Stage for VertexFitter {
    fn name(&self) -> &'static str {
        "VertexFitter"
    }

    fn run(&self, store: &mut EventStore) -> Result<(), StoreError> {
        // Tracks are mandatory here, so a miss becomes an error for this stage
        let tracks = store
            .get_collection::<Track>("Tracks")
            .ok_or_else(|| StoreError::KeyNotFound("Tracks".to_string()))?;

        let prompt: Vec<&Track> = tracks.iter().filter(|t| t.d0 < 0.1).collect();
        let chi2 = prompt.iter().map(|t| t.d0 * t.d0 * 1e3).sum::<f64>();
        let ntracks = prompt.len();

        if chi2 > self.max_chi2 {
            info!(chi2, "vertex fit rejected");
            return Ok(());
        }

        let vertex = store.register::<Vertex>("PrimaryVertex", StoreFlags::PERSIST)?;
        vertex.chi2 = chi2;
        vertex.ntracks = ntracks;
        vertex.position = [0.0, 0.0, 0.01];
        Ok(())
    }
}

struct JetClustering {
    cone: f64,
}

impl Stage for JetClustering {
    fn name(&self) -> &'static str {
        "JetClustering"
    }

    fn run(&self, store: &mut EventStore) -> Result<(), StoreError> {
        let tracks = store
            .get_collection::<Track>("Tracks")
            .cloned()
            .unwrap_or_default();

        let mut jets: Vec<Box<Jet>> = Vec::new();
        for (index, track) in tracks.iter().enumerate() {
            match jets
                .iter_mut()
                .find(|jet| (jet.phi - track.phi).abs() < self.cone)
            {
                Some(jet) => {
                    jet.pt += track.pt;
                    jet.tracks.push(index);
                }
                None => jets.push(Box::new(Jet {
                    phi: track.phi,
                    pt: track.pt,
                    tracks: vec![index],
                })),
            }
        }

        // The vertex is optional: jets are only tagged for extraction when it exists
        let flags = if store.get::<Vertex>("PrimaryVertex").is_some() {
            StoreFlags::PERSIST | StoreFlags::JET_EXTRACT_VERTEX
        } else {
            StoreFlags::PERSIST
        };
        store
            .register_owning_collection::<Jet>("Jets", flags)?
            .extend(jets);
        Ok(())
    }
}

struct Writer;

impl Stage for Writer {
    fn name(&self) -> &'static str {
        "Writer"
    }

    fn run(&self, store: &mut EventStore) -> Result<(), StoreError> {
        for (name, info) in store.snapshot() {
            if info.flags.contains(StoreFlags::PERSIST) {
                info!(
                    name = %name,
                    type_name = %info.type_name,
                    shape = %info.shape,
                    "persisting entry"
                );
            }
        }

        if let Some(vertex) = store.get::<Vertex>("PrimaryVertex") {
            println!(
                "PrimaryVertex: {:?} chi2={:.3} ntracks={}",
                vertex.position, vertex.chi2, vertex.ntracks
            );
        }
        if let Some(jets) = store.get_owning_collection::<Jet>("Jets") {
            for jet in jets {
                println!(
                    "Jet: phi={:.2} pt={:.1} tracks={:?}",
                    jet.phi, jet.pt, jet.tracks
                );
            }
        }
        Ok(())
    }
}
