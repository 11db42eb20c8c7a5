use super::*;

#[test]
fn defaults_follow_the_generation() {
    let gen9 = VppConfig::default();
    assert_eq!(gen9.generation, Generation::Gen9);
    assert!(gen9.vebox_enabled());
    assert!(gen9.gpe_scaling_enabled());
    assert_eq!(gen9.max_pp_surfaces, 48);

    let gen8 = VppConfig::for_generation(Generation::Gen8);
    assert!(gen8.vebox_enabled());
    assert!(!gen8.gpe_scaling_enabled());

    let gen7 = VppConfig::for_generation(Generation::Gen7);
    assert!(!gen7.vebox_enabled());
}

#[test]
fn json_overrides_and_fills_defaults() {
    let cfg = VppConfig::from_json_str(r#"{"generation":"gen75","vebox":false}"#).unwrap();
    assert_eq!(cfg.generation, Generation::Gen75);
    assert!(!cfg.vebox_enabled());
    assert_eq!(cfg.batch_size_hint, 0x1000);

    let cfg = VppConfig::from_json_str(r#"{"generation":"gen8","gpe_scaling":true}"#).unwrap();
    assert!(cfg.gpe_scaling_enabled());
}

#[test]
fn invalid_configs_are_rejected() {
    let err = VppConfig::from_json_str(r#"{"max_pp_surfaces":0}"#).unwrap_err();
    assert!(matches!(err, VppError::InvalidValue(_)));
    let err = VppConfig::from_json_str(r#"{"generation":"gen6","vebox":true}"#).unwrap_err();
    assert!(matches!(err, VppError::InvalidValue(_)));
    let err = VppConfig::from_json_str(r#"{"surfaces":3}"#).unwrap_err();
    assert!(matches!(err, VppError::Other(_)));
}

#[test]
fn synthetic_store_covers_every_kernel() {
    let gen9 = KernelStore::synthetic(Generation::Gen9);
    assert_eq!(gen9.len(), 14);
    assert!(gen9.contains("pl2_to_pl2"));
    assert!(gen9.contains("pl016_scaling"));
    assert!(gen9.contains("pl2_8bit_420_scaling"));
    assert!(!gen9.contains("dndi"));

    let gen5 = KernelStore::synthetic(Generation::Gen5);
    assert_eq!(gen5.len(), 13);
    assert!(gen5.contains("nv12_dndi"));
    assert!(!gen5.contains("pl016_scaling"));
}

#[test]
fn store_from_dir_uses_the_generation_extension() {
    let dir = std::env::temp_dir().join(format!("intel-vpp-kernels-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("avs.g8b"), [1u8, 2, 3, 4]).unwrap();
    std::fs::write(dir.join("avs.g9b"), [9u8]).unwrap();

    let store = KernelStore::from_dir(&dir, Generation::Gen8).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("avs"), Some(&[1u8, 2, 3, 4][..]));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn inserting_replaces_blobs() {
    let mut store = KernelStore::new();
    assert!(store.is_empty());
    store.insert("null", vec![1]).insert("null", vec![2]);
    assert_eq!(store.get("null"), Some(&[2u8][..]));
    assert_eq!(store.len(), 1);
}

#[test]
fn config_loads_from_a_file() {
    let path = std::env::temp_dir().join(format!("intel-vpp-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "generation": "gen7", "max_pp_surfaces": 32 }"#).unwrap();
    let cfg = VppConfig::from_path(&path).unwrap();
    assert_eq!(cfg.generation, Generation::Gen7);
    assert_eq!(cfg.max_pp_surfaces, 32);
    std::fs::remove_file(&path).unwrap();

    let err = VppConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, VppError::Other(_)));
    assert!(err.to_string().contains("read VPP config"));
}
