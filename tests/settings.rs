use desk_companion::settings::Settings;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings.character_pos, (900, 300));
    assert!(settings.blink_enabled);
    assert!(!settings.debug_logging);
    assert_eq!(settings.loose_drift_px, 150);
}

#[test]
fn partial_files_fall_back_per_field() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "debug_logging": true, "memo_autosave_secs": 2.5 }"#).unwrap();

    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert!(settings.debug_logging);
    assert_eq!(settings.memo_autosave_secs, 2.5);
    assert_eq!(settings.memo_file, "data/memo.txt");
    assert_eq!(settings.timeline_refresh_secs, 30.0);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut settings = Settings::default();
    settings.character_pos = (10, 20);
    settings.blink_enabled = false;
    settings.log_file = Some("companion.log".into());
    settings.save(path.to_str().unwrap()).unwrap();

    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.character_pos, (10, 20));
    assert!(!loaded.blink_enabled);
    assert_eq!(loaded.log_file.as_deref(), Some("companion.log"));
}
