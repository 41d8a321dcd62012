use std::path::PathBuf;
use tempfile::TempDir;

use fontshare_downloader::output::OutputLayout;
use fontshare_downloader::ResourceIdentifier;

fn id(slug: &str) -> ResourceIdentifier {
    ResourceIdentifier::parse(slug).unwrap()
}

#[test]
fn test_artifact_path_is_derived_from_slug_only() {
    let layout = OutputLayout::new("out");
    assert_eq!(
        layout.artifact_path(&id("cabinet-grotesk")),
        PathBuf::from("out/fonts/cabinet-grotesk/cabinet-grotesk.zip")
    );
    assert_eq!(
        layout.artifact_dir(&id("cabinet-grotesk")),
        PathBuf::from("out/fonts/cabinet-grotesk")
    );
}

#[test]
fn test_distinct_slugs_never_share_a_path() {
    let layout = OutputLayout::new("out");
    let a = layout.artifact_path(&id("clash"));
    let b = layout.artifact_path(&id("clash-display"));
    assert_ne!(a, b);
    assert_ne!(a.parent(), b.parent());
}

#[test]
fn test_report_paths() {
    let layout = OutputLayout::new("out");
    assert_eq!(layout.log_path(), PathBuf::from("out/logs/download.log"));
    assert_eq!(
        layout.manifest_path(),
        PathBuf::from("out/metadata/manifest.json")
    );
    assert_eq!(
        layout.catalog_path(),
        PathBuf::from("out/metadata/font-list.json")
    );
}

#[test]
fn test_artifacts_stay_under_root() {
    let temp = TempDir::new().unwrap();
    let layout = OutputLayout::new(temp.path());
    for slug in ["a", "satoshi", "font-2024"] {
        assert!(layout.artifact_path(&id(slug)).starts_with(layout.fonts_dir()));
    }
}

#[test]
fn test_existing_artifact_size() {
    let temp = TempDir::new().unwrap();
    let layout = OutputLayout::new(temp.path());
    let font = id("zodiak");
    assert_eq!(layout.existing_artifact_size(&font), None);

    let path = layout.artifact_path(&font);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"").unwrap();
    assert_eq!(layout.existing_artifact_size(&font), None);

    std::fs::write(&path, b"PK\x03\x04").unwrap();
    assert_eq!(layout.existing_artifact_size(&font), Some(4));
}
