use pd_data::{DashboardConfig, DataError, load_config, load_upload, save_config};

#[test]
fn roundtrip_yaml_config() {
    let mut config = DashboardConfig::default();
    config.thresholds.run_threshold = 4;
    config.thresholds.require_serial_baseline = false;
    config.chart.title = Some("Sorting".to_string());
    config.chart.v_axis.log_scale = Some(true);
    config.store_root = Some("data/store".into());

    let path = std::env::temp_dir().join("pd_data_roundtrip_config.yaml");
    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn invalid_config_is_not_loaded() {
    let path = std::env::temp_dir().join("pd_data_invalid_config.yaml");
    std::fs::write(&path, "thresholds:\n  run_threshold: 0\n").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, DataError::Validation(_)));
}

#[test]
fn upload_file_is_parsed_from_disk() {
    let path = std::env::temp_dir().join("pd_data_upload.csv");
    std::fs::write(
        &path,
        "100,0,1,1.0,1.2\n100,0,2,1.2,1.4\n100,4,1,0.3,0.4\nbad line\n",
    )
    .unwrap();

    let upload = load_upload(&path).unwrap();
    assert_eq!(upload.records.len(), 3);
    assert_eq!(upload.errors.len(), 1);
    assert_eq!(upload.errors[0].line(), 4);
}
