use super::*;

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.tempo.bpm, 120);
    assert_eq!(config.improvisation.beats_of_silence, 256);
    assert!(!config.improvisation.auto);
    assert_eq!(config.input.high_pass_threshold, 70);
    assert_eq!(config.controls.pitches(), [21, 22, 107, 108]);
    assert_eq!(config.paths.history, PathBuf::from("music_history.json"));
    assert_eq!(config.dispatch.queue_capacity, 1024);
    assert_eq!(config.midi, MidiSection::default());
    assert!(!config.logging.debug);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_missing_config_writes_default_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig::load(dir.path()).expect("load");
    assert_eq!(config, AppConfig::default());

    let written = dir.path().join(JSON_FILE);
    assert!(written.exists());
    let reloaded = AppConfig::load(dir.path()).expect("reload");
    assert_eq!(reloaded, config);
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join(TOML_FILE),
        "[tempo]\nbpm = 90\n\n[improvisation]\nauto = true\n\n[controls]\nsave = 24\n",
    )
    .expect("write toml");

    let config = AppConfig::load(dir.path()).expect("load");
    assert_eq!(config.tempo.bpm, 90);
    assert!(config.improvisation.auto);
    assert_eq!(config.improvisation.beats_of_silence, 256);
    assert_eq!(config.controls.save, 24);
    assert_eq!(config.controls.replay, 22);
    assert!(!dir.path().join(JSON_FILE).exists());
}

#[test]
fn test_toml_preferred_over_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(TOML_FILE), "[tempo]\nbpm = 100\n").expect("write toml");
    fs::write(dir.path().join(JSON_FILE), r#"{"tempo":{"bpm":140}}"#).expect("write json");

    assert_eq!(AppConfig::load(dir.path()).expect("load").tempo.bpm, 100);
}

#[test]
fn test_invalid_json_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(JSON_FILE), "{ not json").expect("write json");

    let err = AppConfig::load(dir.path()).expect_err("should fail");
    assert!(format!("{err:#}").contains("invalid JSON config"));
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.tempo.bpm = 0;
    assert_eq!(config.validate(), Err(ConfigError::ZeroBpm));

    let mut config = AppConfig::default();
    config.dispatch.max_in_flight = 0;
    assert_eq!(
        config.validate(),
        Err(ConfigError::ZeroCapacity {
            field: "max_in_flight"
        })
    );

    let mut config = AppConfig::default();
    config.controls.teach = config.controls.save;
    assert_eq!(
        config.validate(),
        Err(ConfigError::DuplicateControl { pitch: 21 })
    );

    let mut config = AppConfig::default();
    config.controls.improvise = 200;
    assert_eq!(
        config.validate(),
        Err(ConfigError::ControlOutOfRange { pitch: 200 })
    );
}

#[test]
fn test_history_path_is_relative_to_root() {
    let config = AppConfig::default();
    assert_eq!(
        config.history_path("/tmp/session"),
        PathBuf::from("/tmp/session/music_history.json")
    );
}
