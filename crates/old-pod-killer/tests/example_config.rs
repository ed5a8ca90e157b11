use std::path::Path;
use std::time::Duration;

use old_pod_killer::config::GlobalConfig;
use old_pod_killer::config::WorkloadKind;
use old_pod_killer::config::MIN_DURATION;
use similar_asserts::assert_eq;

fn example() -> GlobalConfig {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.yaml");
    GlobalConfig::load(&path).unwrap()
}

#[test]
fn example_config_loads() {
    let config = example();

    assert!(!config.dry_run);
    assert!(!config.batch_mode);
    assert_eq!(config.default_interval, Duration::from_secs(600));

    let kinds: Vec<_> = config
        .targets
        .iter()
        .map(|target| target.workload_kind().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            WorkloadKind::Deployment,
            WorkloadKind::DaemonSet,
            WorkloadKind::StatefulSet
        ]
    );
}

#[test]
fn example_config_durations() {
    let config = example();

    let api = &config.targets[0];
    assert_eq!(api.max_life, Duration::from_secs(24 * 3600));
    assert_eq!(api.interval, Duration::from_secs(300));
    assert_eq!(api.batch_max_kill, 1);

    // no interval given, inherits the default
    let exporter = &config.targets[1];
    assert_eq!(exporter.max_life, Duration::from_secs(7 * 24 * 3600));
    assert_eq!(exporter.interval, config.default_interval);

    let redis = &config.targets[2];
    assert_eq!(redis.max_life, Duration::from_secs(72 * 3600 + 30 * 60));
    assert_eq!(redis.to_string(), "cache statefulset/redis");

    assert!(config
        .targets
        .iter()
        .all(|target| target.max_life >= MIN_DURATION && target.interval >= MIN_DURATION));
}
