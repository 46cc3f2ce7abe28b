//! Format sync reports, crate trees, crates, and volumes for the CLI.

use crate::record::CrateRecord;
use crate::session::SyncReport;
use crate::tree::{CrateTree, NodeId};
use crate::volume::Volume;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn key_value_table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    table
}

fn volume_rows(volume: &Volume) -> Vec<(&'static str, String)> {
    vec![
        ("Platform", volume.platform.to_string()),
        ("Volume", volume.volume_id.clone()),
        ("Volume root", volume.volume_root.display().to_string()),
        ("Store", volume.store_root.display().to_string()),
    ]
}

pub fn format_sync_text(report: &SyncReport, volume: &Volume) -> String {
    let title = if report.dry_run { "Sync (dry run)" } else { "Sync" };
    let mut rows = vec![("Source", report.source.clone())];
    rows.extend(volume_rows(volume));
    rows.push(("Crates", report.crates.to_string()));
    rows.push(("Tracks", report.tracks.to_string()));
    rows.push(("Written", report.written.to_string()));
    format!(
        "{}\n\n{}\n",
        format_section_heading(title),
        key_value_table(rows)
    )
}

pub fn format_sync_json(report: &SyncReport, volume: &Volume) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "volume": volume,
        "report": report,
    }))
}

pub fn format_tree_text(tree: &CrateTree, location: &str) -> String {
    let mut out = format!("{}\n", format_section_heading("Crates"));
    out.push_str(&format!("  Store: {}\n", location));
    out.push_str(&format!(
        "  Crates: {}  Tracks: {}\n\n",
        tree.descendant_count(tree.root()),
        tree.track_count()
    ));
    out.push_str(&tree.render());
    out
}

pub fn format_tree_json(tree: &CrateTree, location: &str) -> Result<String, serde_json::Error> {
    let children: Vec<Value> = tree
        .children(tree.root())
        .iter()
        .map(|&child| node_json(tree, child))
        .collect();
    serde_json::to_string_pretty(&json!({
        "store": location,
        "root": tree.root_name(),
        "crates": tree.descendant_count(tree.root()),
        "tracks": tree.track_count(),
        "children": children,
    }))
}

fn node_json(tree: &CrateTree, id: NodeId) -> Value {
    let Some(node) = tree.get(id) else {
        return Value::Null;
    };
    let children: Vec<Value> = node
        .children()
        .iter()
        .map(|&child| node_json(tree, child))
        .collect();
    json!({
        "name": node.name(),
        "segment": node.segment(),
        "tracks": node.tracks(),
        "children": children,
    })
}

pub fn format_crate_text(record: &CrateRecord) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Crate {}", record.display_name()))
    );
    let rows = vec![
        ("Name", record.name.clone()),
        ("Version", record.version.clone()),
        ("Sorted by", record.sort_key.clone()),
        ("Sort flag", record.sort_reversed.to_string()),
        ("Columns", record.columns.join(", ")),
    ];
    out.push_str(&format!("{}\n\n", key_value_table(rows)));

    if record.tracks.is_empty() {
        out.push_str("No tracks.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Track"]);
    for (i, track) in record.tracks.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), track.clone()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_crate_json(record: &CrateRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

pub fn format_volume_text(path: &str, volume: &Volume) -> String {
    let mut rows = vec![("Path", path.to_string())];
    rows.extend(volume_rows(volume));
    format!(
        "{}\n\n{}\n",
        format_section_heading("Volume"),
        key_value_table(rows)
    )
}

pub fn format_volume_json(volume: &Volume) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(volume)
}
