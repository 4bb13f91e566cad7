use tenax_engine::config::schema::TenaxConfig;
use tenax_engine::config::ConfigLoader;
use tenax_engine::signature::{ObstructionKind, Severity};

#[test]
fn defaults_match_the_observed_call_sites() {
    let config = TenaxConfig::default();

    assert_eq!(config.driver.deadline_ms, 15000);
    assert_eq!(config.driver.poll_interval_ms, 500);
    assert_eq!(config.suppressor.aggressive_z_threshold, 500);
    assert_eq!(config.suppressor.conservative_z_threshold, 1000);
    assert_eq!(
        config.suppressor.threshold_for(Severity::Aggressive),
        500
    );
    assert_eq!(
        config.suppressor.threshold_for(Severity::Conservative),
        1000
    );

    // The shipped signature set covers the ad-network conventions seen on
    // the supported sites.
    assert!(config
        .suppressor
        .signatures
        .iter()
        .any(|s| s.kind == ObstructionKind::Frame && s.matcher.contains("aswift_")));
    assert!(config
        .suppressor
        .signatures
        .iter()
        .any(|s| s.kind == ObstructionKind::InterstitialContainer
            && s.matcher == "#google_vignette"));

    assert_eq!(config.interstitial.markers, vec!["google_vignette"]);
    assert!(config.interstitial.canonical_root.is_none());
}

#[test]
fn partial_yaml_overrides_keep_remaining_defaults() {
    let yaml = r##"
driver:
  deadline_ms: 9000
suppressor:
  aggressive_z_threshold: 250
  signatures:
    - kind: frame
      matcher: iframe[src*="ads"]
    - kind: overlay
      matcher: div
      z_index_threshold: 1500
    - kind: interstitial_container
      matcher: "#ad-break"
interstitial:
  markers: ["#ad_break"]
  canonical_root: https://shop.example/
"##;

    let config: TenaxConfig = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.driver.deadline_ms, 9000);
    assert_eq!(config.driver.poll_interval_ms, 500, "default retained");
    assert_eq!(config.suppressor.aggressive_z_threshold, 250);
    assert_eq!(
        config.suppressor.conservative_z_threshold, 1000,
        "default retained"
    );

    assert_eq!(config.suppressor.signatures.len(), 3);
    assert_eq!(config.suppressor.signatures[0].kind, ObstructionKind::Frame);
    assert_eq!(
        config.suppressor.signatures[1].z_index_threshold,
        Some(1500)
    );
    assert_eq!(
        config.suppressor.signatures[2].kind,
        ObstructionKind::InterstitialContainer
    );

    assert_eq!(
        config.interstitial.canonical_root.as_deref(),
        Some("https://shop.example/")
    );
}

#[tokio::test]
async fn loader_reads_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tenax.yaml");
    std::fs::write(
        &path,
        "driver:\n  deadline_ms: 20000\n  poll_interval_ms: 300\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from(&path).await.unwrap();
    assert_eq!(config.driver.deadline_ms, 20000);
    assert_eq!(config.driver.poll_interval_ms, 300);
}

#[tokio::test]
async fn loader_rejects_malformed_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tenax.yaml");
    std::fs::write(&path, "driver: [not, a, mapping]\n").unwrap();

    assert!(ConfigLoader::load_from(&path).await.is_err());
}
