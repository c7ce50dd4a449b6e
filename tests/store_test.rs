#![allow(missing_docs)]

mod common;

use common::{Town, registry, sample_town};
use packfold::{Archive, ArchiveError, ArchiveOptions, PackerRegistry, RecordWriter};

/// Listing returns exactly the written records, sorted, and nothing else.
#[test]
fn test_list_record_names() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let towns = Archive::builder(dir.path())
        .registry(registry()?)
        .build()?
        .folder("towns")?;

    assert!(towns.list_record_names()?.is_empty());

    for name in ["Spawn", "harbor", "Aldgate"] {
        towns.write(name, &sample_town())?;
    }
    std::fs::create_dir(towns.path().join("not-a-record"))?;
    std::fs::write(towns.path().join(".pending-abc"), b"partial")?;

    assert_eq!(towns.list_record_names()?, ["Aldgate", "Spawn", "harbor"]);
    Ok(())
}

/// A length header far beyond the file size is rejected before anything is allocated.
#[test]
fn test_oversized_field_name_is_rejected() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let towns = Archive::builder(dir.path())
        .registry(registry()?)
        .build()?
        .folder("towns")?;

    let mut out = RecordWriter::new();
    out.put_len(1)?;
    out.put(&(1u64 << 40))?;
    out.put_bool(true)?;
    std::fs::write(towns.path().join("huge"), out.into_bytes())?;

    let err = towns.read("huge", &mut Town::default()).err();
    assert!(
        matches!(
            err.as_ref().map(ArchiveError::root_cause),
            Some(ArchiveError::Serialization(_) | ArchiveError::Format(_))
        ),
        "unexpected: {err:?}"
    );

    let err = towns.inspect("huge").err();
    assert!(
        matches!(
            err.as_ref().map(ArchiveError::root_cause),
            Some(ArchiveError::Serialization(_) | ArchiveError::Format(_))
        ),
        "unexpected: {err:?}"
    );
    Ok(())
}

/// Reading a record that does not exist is a no-op.
#[test]
fn test_missing_record_is_noop() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let towns = Archive::builder(dir.path())
        .registry(registry()?)
        .build()?
        .folder("towns")?;

    let before = sample_town();
    let mut town = before.clone();
    let summary = towns.read("nowhere", &mut town)?;

    assert!(!summary.found);
    assert_eq!(summary.applied, 0);
    assert_eq!(town, before);
    assert!(!towns.contains("nowhere")?);
    Ok(())
}

/// A missing packer aborts the write and leaves the folder untouched.
#[test]
fn test_failed_write_leaves_nothing_behind() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let towns = Archive::builder(dir.path())
        .registry(PackerRegistry::primitives()?)
        .build()?
        .folder("towns")?;

    let err = towns.write("spawn", &sample_town()).err();
    match &err {
        Some(ArchiveError::Record {
            record,
            field: Some(field),
            ..
        }) => {
            assert_eq!(record, "spawn");
            assert_eq!(field, "plots");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(
        err.as_ref().map(ArchiveError::root_cause),
        Some(ArchiveError::PackerNotFound(_))
    ));

    assert!(!towns.contains("spawn")?);
    assert_eq!(std::fs::read_dir(towns.path())?.count(), 0);
    Ok(())
}

/// Writing again replaces the previous record.
#[test]
fn test_overwrite_and_remove() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let towns = Archive::builder(dir.path())
        .registry(registry()?)
        .build()?
        .folder("towns")?;

    towns.write("spawn", &sample_town())?;
    let renamed = Town {
        name: "New Spawn".into(),
        ..sample_town()
    };
    towns.write("spawn", &renamed)?;

    let mut loaded = Town::default();
    towns.read("spawn", &mut loaded)?;
    assert_eq!(loaded.name, "New Spawn");
    assert_eq!(towns.list_record_names()?, ["spawn"]);

    assert!(towns.remove("spawn")?);
    assert!(!towns.remove("spawn")?);
    assert!(towns.list_record_names()?.is_empty());
    Ok(())
}

/// Names that are not a single file name are refused.
#[test]
fn test_invalid_names() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = Archive::builder(dir.path()).registry(registry()?).build()?;
    let towns = archive.folder("towns")?;

    for bad in ["", "..", "../escape", "a/b"] {
        assert!(matches!(
            towns.write(bad, &sample_town()),
            Err(ArchiveError::InvalidName(_))
        ));
        assert!(matches!(
            towns.read(bad, &mut Town::default()),
            Err(ArchiveError::InvalidName(_))
        ));
    }
    assert!(matches!(
        archive.folder("x/y"),
        Err(ArchiveError::InvalidName(_))
    ));
    Ok(())
}

/// With folder creation disabled, folders must already exist.
#[test]
fn test_folders_not_created_when_disabled() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let options = ArchiveOptions::builder().create_folders(false).build();
    let archive = Archive::builder(dir.path())
        .registry(registry()?)
        .options(options)
        .build()?;

    let towns = archive.folder("towns")?;
    assert!(!towns.path().exists());
    assert!(towns.list_record_names()?.is_empty());
    assert!(matches!(
        towns.write("spawn", &sample_town()).err().as_ref().map(ArchiveError::root_cause),
        Some(ArchiveError::Io(_))
    ));

    std::fs::create_dir(towns.path())?;
    towns.write("spawn", &sample_town())?;
    assert!(towns.contains("spawn")?);
    Ok(())
}

/// Folders opened from one archive share one field cache.
#[test]
fn test_folders_share_the_context() -> packfold::Result<()> {
    let dir = tempfile::tempdir()?;
    let archive = Archive::builder(dir.path())
        .registry(registry()?)
        .field_cache_idle(std::time::Duration::from_secs(120))
        .build()?;
    let a = archive.folder("a")?;
    let b = archive.folder("b")?;

    a.write("spawn", &sample_town())?;
    let scans = archive.context().field_cache().scan_count();
    b.write("spawn", &sample_town())?;

    assert_eq!(archive.context().field_cache().scan_count(), scans);
    assert_eq!(archive.options().field_cache_idle_secs, 120);
    Ok(())
}
