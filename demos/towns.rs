//! Writes a few towns into a temporary archive, evolves the schema, and reads them back.
//!
//! Run with `RUST_LOG=packfold=debug cargo run --example towns` to see the engine's logs.

use packfold::{Archivable, Archive, PackerRegistry};
use std::collections::HashMap;

#[derive(Archivable, Debug, Default)]
struct Location {
    #[archive]
    world: String,
    #[archive]
    x: f64,
    #[archive]
    z: f64,
}

#[derive(Archivable, Debug, Default)]
struct Town {
    #[archive]
    name: String,
    #[archive]
    mayor: Option<String>,
    #[archive]
    spawn: Option<Location>,
    #[archive]
    plots: HashMap<String, i32>,
    #[archive]
    upkeep: f64,
}

/// The same record type after `upkeep` was dropped and `public` was added.
#[derive(Archivable, Debug, Default)]
#[archive(name = "Town")]
struct TownV2 {
    #[archive]
    name: String,
    #[archive]
    mayor: Option<String>,
    #[archive]
    public: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("packfold=info".parse()?),
        )
        .init();

    let registry = PackerRegistry::builder()
        .with_primitives()
        .record::<Location>()
        .map::<String, i32>()
        .build()?;
    println!("Registered packers: {}", registry.names().join(", "));

    let root = tempfile::tempdir()?;
    let archive = Archive::builder(root.path()).registry(registry).build()?;
    let towns = archive.folder("towns")?;

    for (i, name) in ["Spawn", "Harbor", "Aldgate"].into_iter().enumerate() {
        let mut town = Town {
            name: name.to_string(),
            mayor: (i != 1).then(|| format!("mayor-{i}")),
            spawn: Some(Location {
                world: "overworld".into(),
                x: i as f64 * 100.0,
                z: -(i as f64) * 50.0,
            }),
            upkeep: 12.5 * (i + 1) as f64,
            ..Town::default()
        };
        town.plots.insert(format!("{i},0"), i as i32);
        towns.write(&name.to_lowercase(), &town)?;
    }

    println!("Stored towns: {:?}", towns.list_record_names()?);
    if let Some(report) = towns.inspect("spawn")? {
        print!("{report}");
    }

    for name in towns.list_record_names()? {
        let mut town = TownV2 {
            public: true,
            ..TownV2::default()
        };
        let summary = towns.read(&name, &mut town)?;
        println!(
            "{name}: {town:?} (applied {}, skipped {:?})",
            summary.applied, summary.unresolved
        );
    }

    Ok(())
}
