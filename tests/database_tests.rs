// Integration tests for the serialized API level database
// These tests go through the public builder, loader and lookup engine

use apidb::database::{
    format, open_data_access, AndroidApiDataAccess, BackingStore, ByteSource, DatabaseBuilder,
};
use apidb::graph::{DexField, DexMethod, DexProto, DexType};
use apidb::{AndroidApiLevel, AndroidApiLevelDatabase, AndroidApiLevelHashingDatabase, Diagnostics};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Collects warnings instead of logging them.
#[derive(Default)]
struct Recorder {
    warnings: Mutex<Vec<String>>,
}

impl Recorder {
    fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

impl Diagnostics for Recorder {
    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}

/// The two-class database used throughout: `Foo.x:I` introduced at K.
fn scenario_builder() -> DatabaseBuilder {
    let mut builder = DatabaseBuilder::new();
    builder.add_constant(b"LFoo;").unwrap();
    builder.add_constant(b"LBar;").unwrap();
    builder.add_level(b"LFoo;", 1).unwrap();
    builder.add_level(b"LBar;", 1).unwrap();
    builder.add_level(b"LFoo;->x:I", 19).unwrap();
    builder
}

fn foo_x() -> DexField {
    DexField::new(DexType::new("LFoo;"), "x", DexType::int())
}

fn bar_y() -> DexField {
    DexField::new(DexType::new("LBar;"), "y", DexType::int())
}

fn write_archive(path: &std::path::Path, data: &[u8], compression: CompressionMethod) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
    zip.write_all(b"Manifest-Version: 1.0\n").unwrap();
    zip.start_file(
        "api_database/api_database.ser",
        SimpleFileOptions::default().compression_method(compression),
    )
    .unwrap();
    zip.write_all(data).unwrap();
    zip.finish().unwrap();
}

/// Example scenario: pool ["Foo", "Bar"], Foo.x stored at 19
#[test]
fn test_example_scenario() {
    let bytes = scenario_builder().build().unwrap();
    let access = AndroidApiDataAccess::new(BackingStore::InMemory(bytes));

    assert_eq!(access.constant_pool_size(), 2);
    assert_eq!(access.resolve_level(b"LFoo;->x:I"), Some(19));
    assert_eq!(access.resolve_level(b"LBar;->y:I"), None);

    let db = AndroidApiLevelHashingDatabase::new(access);
    assert_eq!(db.get_field_api_level(&foo_x()), Some(AndroidApiLevel::K));
    assert_eq!(db.get_field_api_level(&bar_y()), None);
}

/// Two serialized references sharing an API level bucket must both resolve
#[test]
fn test_api_level_bucket_collision() {
    let holder = DexType::new("LFoo;");
    let mut seen: HashMap<usize, DexField> = HashMap::new();
    let mut collision = None;
    for i in 0..200_000 {
        let field = DexField::new(holder.clone(), format!("f{}", i), DexType::int());
        let key = apidb::graph::DexReference::Field(field.clone()).to_key_string();
        let bucket = format::api_level_hash(key.as_bytes());
        if let Some(previous) = seen.insert(bucket, field.clone()) {
            collision = Some((previous, field));
            break;
        }
    }
    let (first, second) = collision.expect("no bucket collision found");

    let mut builder = DatabaseBuilder::new();
    builder.add_constant(b"LFoo;").unwrap();
    let first_key = apidb::graph::DexReference::Field(first.clone()).to_key_string();
    let second_key = apidb::graph::DexReference::Field(second.clone()).to_key_string();
    builder.add_level(first_key.as_bytes(), 21).unwrap();
    builder.add_level(second_key.as_bytes(), 30).unwrap();
    let db = AndroidApiLevelHashingDatabase::new(AndroidApiDataAccess::new(
        BackingStore::InMemory(builder.build().unwrap()),
    ));

    assert_eq!(db.get_field_api_level(&first), Some(AndroidApiLevel::L));
    assert_eq!(db.get_field_api_level(&second), Some(AndroidApiLevel::R));
}

/// Two pooled descriptors with the same constant-pool hash both resolve
#[test]
fn test_constant_pool_bucket_collision() {
    let mut builder = DatabaseBuilder::new();
    builder.add_constant(b"LAa;").unwrap();
    builder.add_constant(b"LBB;").unwrap();
    builder.add_level(b"LAa;->run()V", 24).unwrap();
    builder.add_level(b"LBB;->run()V", 26).unwrap();
    let db = AndroidApiLevelHashingDatabase::new(AndroidApiDataAccess::new(
        BackingStore::InMemory(builder.build().unwrap()),
    ));
    let run = |holder: &str| {
        DexMethod::new(DexType::new(holder), "run", DexProto::new(DexType::void(), vec![]))
    };

    assert_eq!(db.get_method_api_level(&run("LAa;")), Some(AndroidApiLevel::N));
    assert_eq!(db.get_method_api_level(&run("LBB;")), Some(AndroidApiLevel::O));
    assert_eq!(db.get_method_api_level(&run("LC#;")), None);
}

/// A file is memory-mapped without warnings
#[test]
fn test_mapped_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("api_database.ser");
    scenario_builder().write_to_file(&path).unwrap();
    let recorder = Recorder::default();

    let access = open_data_access(&ByteSource::file(&path), true, &recorder);

    assert!(recorder.warnings().is_empty());
    assert_eq!(access.store().kind_name(), "memory-mapped");
    let db = AndroidApiLevelHashingDatabase::new(access);
    assert_eq!(db.get_field_api_level(&foo_x()), Some(AndroidApiLevel::K));
}

/// A stored archive entry is mapped from its offset inside the archive
#[test]
fn test_mapped_archive_entry() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("r8.jar");
    write_archive(&archive, &scenario_builder().build().unwrap(), CompressionMethod::Stored);
    let recorder = Recorder::default();

    let access = open_data_access(
        &ByteSource::archive_entry(&archive, "api_database/api_database.ser"),
        true,
        &recorder,
    );

    assert!(recorder.warnings().is_empty());
    assert_eq!(access.store().kind_name(), "memory-mapped");
    assert_eq!(access.constant_pool_size(), 2);
    assert_eq!(access.resolve_level(b"LFoo;->x:I"), Some(19));
}

/// A compressed entry cannot be mapped: one warning, then in-memory lookups
#[test]
fn test_map_failure_falls_back_to_memory() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("r8.jar");
    write_archive(&archive, &scenario_builder().build().unwrap(), CompressionMethod::Deflated);
    let recorder = Recorder::default();

    let access = open_data_access(
        &ByteSource::archive_entry(&archive, "api_database/api_database.ser"),
        true,
        &recorder,
    );

    assert_eq!(recorder.warnings().len(), 1);
    assert_eq!(access.store().kind_name(), "in-memory");
    let db = AndroidApiLevelHashingDatabase::new(access);
    assert_eq!(db.get_field_api_level(&foo_x()), Some(AndroidApiLevel::K));
    assert_eq!(db.get_field_api_level(&bar_y()), None);
}

/// Missing resources degrade to an unavailable database with one warning
#[test]
fn test_missing_resources() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("r8.jar");
    write_archive(&archive, b"unused", CompressionMethod::Stored);

    let sources = [
        ByteSource::Missing,
        ByteSource::file(temp_dir.path().join("absent.ser")),
        ByteSource::archive_entry(&archive, "api_database/absent.ser"),
    ];
    for source in &sources {
        let recorder = Recorder::default();
        let access = open_data_access(source, true, &recorder);
        assert!(access.is_unavailable(), "{:?}", source);
        assert_eq!(recorder.warnings().len(), 1, "{:?}", source);

        let db = AndroidApiLevelHashingDatabase::new(access);
        assert_eq!(db.get_field_api_level(&foo_x()), None);
    }
}

/// Truncated bytes are rejected at open time
#[test]
fn test_truncated_database_is_unavailable() {
    let bytes = scenario_builder().build().unwrap();
    let recorder = Recorder::default();

    let access = open_data_access(&ByteSource::Bytes(bytes.slice(..1024)), false, &recorder);

    assert!(access.is_unavailable());
    assert_eq!(recorder.warnings().len(), 1);
}

/// In-memory and mapped backings answer identically
#[test]
fn test_backings_agree() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("api_database.ser");
    scenario_builder().write_to_file(&path).unwrap();
    let recorder = Recorder::default();

    let mapped = open_data_access(&ByteSource::file(&path), true, &recorder);
    let in_memory = open_data_access(&ByteSource::file(&path), false, &recorder);
    assert_eq!(in_memory.store().kind_name(), "in-memory");

    for key in [&b"LFoo;"[..], b"LBar;", b"LFoo;->x:I", b"LBar;->y:I", b"LBaz;"] {
        assert_eq!(mapped.resolve_level(key), in_memory.resolve_level(key));
        assert_eq!(
            mapped.resolve_constant_pool_index(key),
            in_memory.resolve_constant_pool_index(key)
        );
    }
    assert!(recorder.warnings().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_constant_pool_round_trip(
        names in prop::collection::hash_set("[A-Za-z][A-Za-z0-9/]{0,12}", 1..64),
        absent in "[A-Za-z][A-Za-z0-9/]{0,12}",
    ) {
        let mut builder = DatabaseBuilder::new();
        let mut indices = Vec::new();
        for name in &names {
            let descriptor = format!("L{};", name);
            let index = builder.add_constant(descriptor.as_bytes()).unwrap();
            indices.push((descriptor, index));
        }
        let access = AndroidApiDataAccess::new(BackingStore::InMemory(builder.build().unwrap()));

        for (descriptor, index) in &indices {
            prop_assert_eq!(access.resolve_constant_pool_index(descriptor.as_bytes()), Some(*index));
            prop_assert!(access.constant_pool_entry_matches(*index, descriptor.as_bytes()));
        }
        if !names.contains(&absent) {
            let descriptor = format!("L{};", absent);
            prop_assert_eq!(access.resolve_constant_pool_index(descriptor.as_bytes()), None);
        }
    }
}
