use cratedigger::config::CrateDiggerConfig;
use cratedigger::error::ApiError;
use cratedigger::tooling::cli::{CliContext, Commands};
use std::path::PathBuf;
use tempfile::TempDir;

fn context() -> CliContext {
    CliContext::from_config(CrateDiggerConfig::default())
}

fn media_volume(temp: &TempDir) -> PathBuf {
    let root = temp.path().join("serato");
    for file in ["8mm/Opener EP/01 Opener.mp3", "8mm/cover.jpg", "Tycho/Dive/A Walk.aif"] {
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }
    root
}

fn sync(cli: &CliContext, temp: &TempDir, volume: &PathBuf, format: &str) -> String {
    cli.execute(&Commands::Sync {
        library_dir: volume.join("8mm"),
        serato_dir: Some(temp.path().join("home")),
        volume_root: Some(volume.clone()),
        dry_run: false,
        format: format.to_string(),
    })
    .unwrap()
}

#[test]
fn sync_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let volume = media_volume(&temp);
    let output = sync(&context(), &temp, &volume, "json");

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["volume"]["volume_id"], "serato");
    assert!(parsed["volume"]["store_root"].as_str().is_some());
    assert_eq!(parsed["report"]["crates"], 3);
    assert_eq!(parsed["report"]["tracks"], 1);
    assert_eq!(parsed["report"]["written"], 3);
    assert_eq!(parsed["report"]["dry_run"], false);

    let subcrates = temp.path().join("home").join("_Serato_").join("Subcrates");
    assert!(subcrates.join("Media%%serato%%8mm%%Opener EP.crate").is_file());
}

#[test]
fn list_json_contract_renders_tree() {
    let temp = TempDir::new().unwrap();
    let volume = media_volume(&temp);
    let cli = context();
    sync(&cli, &temp, &volume, "text");

    let output = cli
        .execute(&Commands::List {
            serato_dir: Some(temp.path().join("home")),
            store: None,
            root: None,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["root"], "Media");
    assert_eq!(parsed["crates"], 3);
    let volume_node = &parsed["children"][0];
    assert_eq!(volume_node["name"], "Media%%serato");
    assert_eq!(volume_node["children"][0]["segment"], "8mm");
}

#[test]
fn list_text_uses_tree_guides() {
    let temp = TempDir::new().unwrap();
    let volume = media_volume(&temp);
    let cli = context();
    sync(&cli, &temp, &volume, "text");

    let output = cli
        .execute(&Commands::List {
            serato_dir: None,
            store: Some(temp.path().join("home").join("_Serato_").join("Subcrates")),
            root: Some(String::new()),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("(store)"));
    assert!(output.contains("└── Media"));
    assert!(output.contains("Opener EP [1]"));
}

#[test]
fn show_json_contract_has_record_fields() {
    let temp = TempDir::new().unwrap();
    let volume = media_volume(&temp);
    let cli = context();
    sync(&cli, &temp, &volume, "text");

    let path = temp
        .path()
        .join("home")
        .join("_Serato_")
        .join("Subcrates")
        .join("Media%%serato%%8mm%%Opener EP.crate");
    let output = cli
        .execute(&Commands::Show {
            path,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["name"], "Media%%serato%%8mm%%Opener EP");
    assert_eq!(parsed["version"], "81.0");
    assert_eq!(parsed["sort_key"], "song");
    assert_eq!(parsed["tracks"][0], "8mm/Opener EP/01 Opener.mp3");
}

#[test]
fn show_missing_file_is_invalid_argument() {
    let temp = TempDir::new().unwrap();
    let result = context().execute(&Commands::Show {
        path: temp.path().join("nope.crate"),
        format: "text".to_string(),
    });
    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
}

#[test]
fn resolve_json_contract() {
    let output = context()
        .execute(&Commands::Resolve {
            path: "/Volumes/Backup/Music".to_string(),
            format: "json".to_string(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["platform"], "mac");
    assert_eq!(parsed["volume_id"], "Backup");
    assert_eq!(parsed["store_root"], "/Volumes/Backup/_Serato_/Subcrates");

    let output = context()
        .execute(&Commands::Resolve {
            path: "D:\\Music".to_string(),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("D:\\_Serato_\\Subcrates"));
}

#[test]
fn resolve_relative_path_fails() {
    let result = context().execute(&Commands::Resolve {
        path: "Music/House".to_string(),
        format: "text".to_string(),
    });
    assert!(matches!(result, Err(ApiError::VolumeError(_))));
}

#[test]
fn unknown_format_is_rejected() {
    let result = context().execute(&Commands::Resolve {
        path: "/Volumes/Backup".to_string(),
        format: "yaml".to_string(),
    });
    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
}

#[test]
fn sync_missing_library_dir_is_invalid_argument() {
    let temp = TempDir::new().unwrap();
    let result = context().execute(&Commands::Sync {
        library_dir: temp.path().join("missing"),
        serato_dir: None,
        volume_root: None,
        dry_run: true,
        format: "text".to_string(),
    });
    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
}
