//! Typed storage of reduced scan data
//!
//! Loaded data is referenced by a [DataKey]. A plain file gets a key with only
//! a main part. A set of files taken together (one per detector, e.g. for
//! multiple sample rotations) shares one main key and is told apart by a
//! detector sub key.

// crate modules
use crate::error::{Error, Result};
use crate::pattern::DiffractionPattern;

// standard library
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

// external crates
use log::debug;

/// Identifier of data held by a [DataManager]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataKey {
    /// Reference to the loaded file (or set of files)
    pub main: String,
    /// Detector within a set of files
    pub sub: Option<u32>,
}

impl DataKey {
    /// Key with only a main part
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: None,
        }
    }

    /// Key for one detector within a set
    pub fn with_sub(main: impl Into<String>, sub: u32) -> Self {
        Self {
            main: main.into(),
            sub: Some(sub),
        }
    }

    /// Quasi-unique key generated from a file name
    ///
    /// The file stem is followed by a small checksum of the directory, so the
    /// same file name in different directories gets different keys.
    ///
    /// ```rust
    /// # use hidra_reduce::DataKey;
    /// let a = DataKey::from_file("/data/run_1234.h5");
    /// let b = DataKey::from_file("/archive/run_1234.h5");
    /// assert!(a.main.starts_with("run_1234_"));
    /// assert_ne!(a, b);
    /// assert_eq!(a.sub, None);
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(format!("{stem}_{}", directory_checksum(path)))
    }

    /// Main key generated for a set of files, using the first file name
    pub fn from_file_set<P: AsRef<Path>>(paths: &[P]) -> Self {
        match paths.first() {
            Some(first) => {
                let first = first.as_ref();
                let stem = first
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                Self::new(format!(
                    "{stem}_{}_{}",
                    paths.len(),
                    directory_checksum(first)
                ))
            }
            None => Self::new(""),
        }
    }

    /// The main-only key this key belongs to
    pub fn main_key(&self) -> DataKey {
        Self::new(self.main.clone())
    }
}

impl std::fmt::Display for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}:{}", self.main, sub),
            None => write!(f, "{}", self.main),
        }
    }
}

fn directory_checksum(path: &Path) -> u32 {
    let directory = path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    directory.bytes().map(u32::from).sum::<u32>() % 256
}

/// Reduced patterns and sample logs of one file
///
/// Every sample log must have one value per scan index.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanData {
    file_name: String,
    patterns: BTreeMap<u32, DiffractionPattern>,
    sample_logs: BTreeMap<String, Vec<f64>>,
}

impl ScanData {
    /// Validate and collect the data for one file
    pub fn new(
        file_name: impl Into<String>,
        patterns: BTreeMap<u32, DiffractionPattern>,
        sample_logs: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self> {
        for (name, values) in &sample_logs {
            if values.len() != patterns.len() {
                return Err(Error::ShapeMismatch {
                    quantity: format!("sample log \"{name}\""),
                    expected: patterns.len(),
                    found: values.len(),
                });
            }
        }

        Ok(Self {
            file_name: file_name.into(),
            patterns,
            sample_logs,
        })
    }

    /// Name of the file the data came from
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Number of scan indexes
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if there are no scan indexes
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Sorted list of scan indexes
    pub fn scan_indexes(&self) -> Vec<u32> {
        self.patterns.keys().copied().collect()
    }

    /// First and last scan index, if any
    pub fn scan_index_range(&self) -> Option<(u32, u32)> {
        let first = self.patterns.keys().next()?;
        let last = self.patterns.keys().next_back()?;
        Some((*first, *last))
    }

    /// Diffraction pattern of one scan index
    pub fn pattern(&self, scan_index: u32) -> Result<&DiffractionPattern> {
        self.patterns.get(&scan_index).ok_or_else(|| {
            let (min, max) = self.scan_index_range().unwrap_or((0, 0));
            Error::ScanIndexNotFound {
                index: scan_index,
                min,
                max,
            }
        })
    }

    /// Names of all sample logs
    pub fn sample_log_names(&self) -> Vec<&str> {
        self.sample_logs.keys().map(|k| k.as_str()).collect()
    }

    /// Values of a sample log, one per scan index
    pub fn sample_log(&self, name: &str) -> Result<&[f64]> {
        self.sample_logs
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::SampleLogNotFound(name.to_string()))
    }
}

/// Collection of loaded [ScanData] referenced by [DataKey]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataManager {
    data: BTreeMap<DataKey, ScanData>,
    file_refs: HashMap<String, DataKey>,
}

impl DataManager {
    /// Empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the data of one file, returning its key
    ///
    /// Loading a file that is already present fails unless `replace` is set.
    pub fn add(&mut self, scan: ScanData, replace: bool) -> Result<DataKey> {
        let key = DataKey::from_file(scan.file_name());

        if self.data.contains_key(&key) && !replace {
            return Err(Error::DataAlreadyLoaded(scan.file_name().to_string()));
        }

        debug!("Adding {} as {key}", scan.file_name());
        self.file_refs.insert(scan.file_name().to_string(), key.clone());
        self.data.insert(key.clone(), scan);
        Ok(key)
    }

    /// Add a set of files, one per detector, under a single main key
    pub fn add_set(&mut self, detectors: Vec<(u32, ScanData)>, replace: bool) -> Result<DataKey> {
        if detectors.is_empty() {
            return Err(Error::EmptyInput("detector data set".to_string()));
        }

        let names: Vec<&str> = detectors.iter().map(|(_, s)| s.file_name()).collect();
        let main = DataKey::from_file_set(&names);

        if self.contains(&main) && !replace {
            return Err(Error::DataAlreadyLoaded(main.main.clone()));
        }

        // replacing a set replaces every detector in it
        self.data.retain(|k, _| k.main != main.main);

        for (detector, scan) in detectors {
            let key = DataKey::with_sub(main.main.clone(), detector);
            debug!("Adding {} as {key}", scan.file_name());
            self.file_refs.insert(scan.file_name().to_string(), key.clone());
            self.data.insert(key, scan);
        }

        Ok(main)
    }

    /// Whether the key (or any sub key of a main-only key) exists
    pub fn contains(&self, key: &DataKey) -> bool {
        match key.sub {
            Some(_) => self.data.contains_key(key),
            None => self.data.keys().any(|k| k.main == key.main),
        }
    }

    /// Remove data, a main-only key removes every detector in a set
    pub fn delete(&mut self, key: &DataKey) -> Result<()> {
        if !self.contains(key) {
            return Err(Error::DataKeyNotFound(key.to_string()));
        }

        match key.sub {
            Some(_) => {
                self.data.remove(key);
            }
            None => self.data.retain(|k, _| k.main != key.main),
        }
        self.file_refs.retain(|_, k| self.data.contains_key(k));
        Ok(())
    }

    /// Scan data for an exact key
    pub fn get(&self, key: &DataKey) -> Result<&ScanData> {
        self.data
            .get(key)
            .ok_or_else(|| Error::DataKeyNotFound(key.to_string()))
    }

    /// Diffraction pattern of one scan index
    pub fn pattern(&self, key: &DataKey, scan_index: u32) -> Result<&DiffractionPattern> {
        self.get(key)?.pattern(scan_index)
    }

    /// Values of one sample log
    pub fn sample_log(&self, key: &DataKey, name: &str) -> Result<&[f64]> {
        self.get(key)?.sample_log(name)
    }

    /// All exact keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &DataKey> {
        self.data.keys()
    }

    /// Detector sub keys of a main key
    pub fn sub_keys(&self, main: &str) -> Vec<u32> {
        self.data
            .keys()
            .filter(|k| k.main == main)
            .filter_map(|k| k.sub)
            .collect()
    }

    /// Key a file was loaded under
    pub fn key_for_file(&self, file_name: &str) -> Option<&DataKey> {
        self.file_refs.get(file_name)
    }
}
