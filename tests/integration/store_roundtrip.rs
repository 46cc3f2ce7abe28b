use cratedigger::error::{FormatError, StorageError};
use cratedigger::record::CrateRecord;
use cratedigger::session::StoreSession;
use cratedigger::store::{CrateStore, DirectoryStore};
use tempfile::TempDir;

fn record(name: &str, tracks: &[&str]) -> CrateRecord {
    let mut record = CrateRecord::new(name);
    record.tracks = tracks.iter().map(|t| t.to_string()).collect();
    record
}

#[test]
fn crate_file_roundtrips_through_directory_store() {
    let temp = TempDir::new().unwrap();
    let store = DirectoryStore::new(temp.path().join("Subcrates"));
    let original = record(
        "Media%%serato%%8mm",
        &["8mm/a.mp3", "8mm/b.flac", "8mm/Ünïcødé 🎧.m4a"],
    );
    store.save(&original).unwrap();

    let path = temp.path().join("Subcrates").join("Media%%serato%%8mm.crate");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"vrsn");

    let loaded = store.load("Media%%serato%%8mm").unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.columns, vec!["song", "artist", "album", "length"]);
}

#[test]
fn session_reads_hierarchy_from_disk() {
    let temp = TempDir::new().unwrap();
    let store = DirectoryStore::new(temp.path());
    for name in ["Root%%A", "Root%%A%%B", "Root%%A%%C", "Root%%D", "Other%%X"] {
        store.save(&record(name, &[])).unwrap();
    }

    let session = StoreSession::new(store, "Root").unwrap();
    let tree = session.read().unwrap();
    let names: Vec<&str> = tree.records().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Root%%A", "Root%%A%%B", "Root%%A%%C", "Root%%D"]);

    let a = tree.find("Root%%A").unwrap();
    assert_eq!(tree.descendant_count(a), 2);
    assert!(tree.find("Other%%X").is_none());
}

#[test]
fn corrupt_file_aborts_the_read() {
    let temp = TempDir::new().unwrap();
    let store = DirectoryStore::new(temp.path());
    store.save(&record("Root%%A", &["a.mp3"])).unwrap();

    let path = temp.path().join("Root%%A.crate");
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 3);
    std::fs::write(&path, bytes).unwrap();

    let session = StoreSession::new(store, "Root").unwrap();
    match session.read().unwrap_err() {
        StorageError::Format { name, source } => {
            assert_eq!(name, "Root%%A");
            assert!(matches!(source, FormatError::TruncatedInput { .. }));
        }
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn rewriting_a_read_tree_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let first = DirectoryStore::new(temp.path().join("first"));
    first.save(&record("Media%%root", &[])).unwrap();
    first
        .save(&record("Media%%root%%Users", &["Users/dj/a.mp3"]))
        .unwrap();

    let tree = StoreSession::new(first, "Media").unwrap().read().unwrap();
    let second = StoreSession::new(DirectoryStore::new(temp.path().join("second")), "Media").unwrap();
    assert_eq!(second.write(&tree).unwrap(), 2);

    for file in ["Media%%root.crate", "Media%%root%%Users.crate"] {
        assert_eq!(
            std::fs::read(temp.path().join("first").join(file)).unwrap(),
            std::fs::read(temp.path().join("second").join(file)).unwrap(),
        );
    }
}
