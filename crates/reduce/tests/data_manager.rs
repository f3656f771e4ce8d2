//! Integration tests for typed scan data storage

use hidra_reduce::{DataKey, DataManager, DiffractionPattern, Error, ScanData};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;

fn pattern(offset: f64) -> DiffractionPattern {
    DiffractionPattern {
        x: vec![80.0, 80.5, 81.0],
        y: vec![offset, offset + 1.0, offset],
        ..Default::default()
    }
}

fn scan(file_name: &str) -> ScanData {
    let patterns = BTreeMap::from([(1, pattern(1.0)), (2, pattern(2.0)), (3, pattern(3.0))]);
    let logs = BTreeMap::from([
        ("vx".to_string(), vec![0.0, 1.0, 2.0]),
        ("2theta".to_string(), vec![82.0, 82.0, 82.0]),
    ]);
    ScanData::new(file_name, patterns, logs).unwrap()
}

#[fixture]
fn manager() -> DataManager {
    let mut manager = DataManager::new();
    manager.add(scan("/data/HB2B_1017.h5"), false).unwrap();
    manager
}

#[rstest]
fn sample_logs_must_match_scans() {
    let patterns = BTreeMap::from([(1, pattern(1.0)), (2, pattern(2.0))]);
    let logs = BTreeMap::from([("vx".to_string(), vec![0.0, 1.0, 2.0])]);
    let result = ScanData::new("bad.h5", patterns, logs);
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[rstest]
fn lookup(manager: DataManager) {
    let key = DataKey::from_file("/data/HB2B_1017.h5");
    assert!(manager.contains(&key));
    assert_eq!(manager.key_for_file("/data/HB2B_1017.h5"), Some(&key));

    let data = manager.get(&key).unwrap();
    assert_eq!(data.scan_indexes(), vec![1, 2, 3]);
    assert_eq!(data.scan_index_range(), Some((1, 3)));
    assert_eq!(data.sample_log_names(), vec!["2theta", "vx"]);

    assert_eq!(manager.pattern(&key, 2).unwrap().y, vec![2.0, 3.0, 2.0]);
    assert_eq!(manager.sample_log(&key, "vx").unwrap(), &[0.0, 1.0, 2.0]);
}

#[rstest]
fn missing_entries(manager: DataManager) {
    let key = DataKey::from_file("/data/HB2B_1017.h5");

    assert!(matches!(
        manager.pattern(&key, 7),
        Err(Error::ScanIndexNotFound {
            index: 7,
            min: 1,
            max: 3
        })
    ));
    assert!(matches!(
        manager.sample_log(&key, "vz"),
        Err(Error::SampleLogNotFound(_))
    ));
    assert!(matches!(
        manager.get(&DataKey::new("nothing")),
        Err(Error::DataKeyNotFound(_))
    ));
}

#[rstest]
fn reload_needs_replace(mut manager: DataManager) {
    let result = manager.add(scan("/data/HB2B_1017.h5"), false);
    assert!(matches!(result, Err(Error::DataAlreadyLoaded(_))));
    assert!(manager.add(scan("/data/HB2B_1017.h5"), true).is_ok());
    assert_eq!(manager.keys().count(), 1);
}

#[rstest]
fn detector_sets(mut manager: DataManager) {
    let set = vec![(1, scan("/data/rot_0.h5")), (2, scan("/data/rot_90.h5"))];
    let main = manager.add_set(set, false).unwrap();

    assert_eq!(main.sub, None);
    assert_eq!(manager.sub_keys(&main.main), vec![1, 2]);
    assert!(manager.contains(&main));

    let detector = DataKey::with_sub(main.main.clone(), 2);
    assert_eq!(manager.get(&detector).unwrap().file_name(), "/data/rot_90.h5");
    assert_eq!(detector.main_key(), main);

    // removing one detector keeps the other
    manager.delete(&detector).unwrap();
    assert_eq!(manager.sub_keys(&main.main), vec![1]);

    // removing the main key removes the rest of the set
    manager.delete(&main).unwrap();
    assert!(!manager.contains(&main));
    assert_eq!(manager.keys().count(), 1);
    assert!(manager.delete(&main).is_err());
}
