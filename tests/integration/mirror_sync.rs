use cratedigger::mirror::{MediaFilter, MirrorBuilder};
use cratedigger::session::StoreSession;
use cratedigger::store::DirectoryStore;
use cratedigger::volume::Volume;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

fn library(temp: &TempDir) -> PathBuf {
    let root = temp.path().join("serato");
    touch(&root, "8mm/Opener EP/01 Opener.mp3");
    touch(&root, "8mm/Opener EP/notes.txt");
    touch(&root, "8mm/Between Here & There/Around Your Room.flac");
    touch(&root, "Tycho/Dive/A Walk.aif");
    root
}

#[test]
fn sync_writes_one_crate_per_directory() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    let volume = Volume::explicit(&root);
    let session = StoreSession::new(DirectoryStore::new(&volume.store_root), "Media").unwrap();
    let builder = MirrorBuilder::new(volume.clone());

    let report = session.sync(&builder, &root.join("8mm"), false).unwrap();
    assert_eq!(report.crates, 4);
    assert_eq!(report.tracks, 2);

    let subcrates = root.join("_Serato_").join("Subcrates");
    for name in [
        "Media%%serato",
        "Media%%serato%%8mm",
        "Media%%serato%%8mm%%Opener EP",
        "Media%%serato%%8mm%%Between Here & There",
    ] {
        assert!(
            subcrates.join(format!("{}.crate", name)).is_file(),
            "missing {}",
            name
        );
    }
    assert!(!subcrates.join("Media%%serato%%Tycho.crate").exists());

    let tree = session.read().unwrap();
    let opener = tree.find("Media%%serato%%8mm%%Opener EP").unwrap();
    assert_eq!(
        tree.get(opener).unwrap().tracks(),
        &["8mm/Opener EP/01 Opener.mp3".to_string()]
    );
}

#[test]
fn resync_is_stable() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    let volume = Volume::explicit(&root).with_serato_dir(temp.path().join("serato-home"));
    let session = StoreSession::new(DirectoryStore::new(&volume.store_root), "Media").unwrap();
    let builder = MirrorBuilder::new(volume.clone());

    session.sync(&builder, &root, false).unwrap();
    let file = volume.store_root.join("Media%%serato%%Tycho%%Dive.crate");
    let before = std::fs::read(&file).unwrap();
    let first = session.read().unwrap();

    session.sync(&builder, &root, false).unwrap();
    assert_eq!(std::fs::read(&file).unwrap(), before);
    assert_eq!(session.read().unwrap(), first);
}

#[test]
fn dry_run_leaves_store_untouched() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    let volume = Volume::explicit(&root);
    let session = StoreSession::new(DirectoryStore::new(&volume.store_root), "Media").unwrap();
    let report = session
        .sync(&MirrorBuilder::new(volume.clone()), &root, true)
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.written, 0);
    assert!(!volume.store_root.exists());
}

#[test]
fn custom_label_and_filter() {
    let temp = TempDir::new().unwrap();
    let root = library(&temp);
    let volume = Volume::explicit(&root);
    let session = StoreSession::new(DirectoryStore::new(&volume.store_root), "Library").unwrap();
    let builder = MirrorBuilder::new(volume.clone())
        .with_root_label("Library")
        .with_filter(MediaFilter::from_extensions(["txt"]));

    let report = session.sync(&builder, &root, false).unwrap();
    assert_eq!(report.tracks, 1);
    let tree = session.read().unwrap();
    let opener = tree.find("Library%%serato%%8mm%%Opener EP").unwrap();
    assert_eq!(
        tree.get(opener).unwrap().tracks(),
        &["8mm/Opener EP/notes.txt".to_string()]
    );
}
