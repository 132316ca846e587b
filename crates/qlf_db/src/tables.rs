//! Parsing of `*.db` feature tables and the in-memory [`FeatureTables`].

use crate::error::DatabaseError;
use qlf_bitstream::{Feature, FeatureBit, FeatureDatabase};
use qlf_common::Coord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parses a single bit specifier like `"5_5"` or `"!12_40"`.
///
/// # Errors
///
/// Returns an error string if the format is invalid.
pub fn parse_bit_spec(spec: &str) -> Result<FeatureBit, String> {
    let (set, rest) = match spec.strip_prefix('!') {
        Some(s) => (false, s),
        None => (true, spec),
    };

    let (wl, bl) = rest
        .split_once('_')
        .ok_or_else(|| format!("invalid bit spec '{spec}': expected 'wl_bl' or '!wl_bl'"))?;
    let wl = wl
        .parse::<u32>()
        .map_err(|e| format!("invalid wordline in '{spec}': {e}"))?;
    let bl = bl
        .parse::<u32>()
        .map_err(|e| format!("invalid bitline in '{spec}': {e}"))?;

    Ok(FeatureBit {
        coord: Coord::new(wl, bl),
        set,
    })
}

/// Parses one table into `(line number, feature)` pairs in file order.
///
/// Empty lines and lines starting with `#` are skipped. `file` is only used
/// to label errors.
///
/// # Errors
///
/// Returns [`DatabaseError::Parse`] for a malformed bit or a feature
/// without bits.
pub fn parse_table(file: &str, content: &str) -> Result<Vec<(usize, Feature)>, DatabaseError> {
    let mut entries = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_err = |message: String| DatabaseError::Parse {
            file: file.to_string(),
            line: line_no + 1,
            message,
        };

        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };

        let bits = parts
            .map(parse_bit_spec)
            .collect::<Result<Vec<_>, _>>()
            .map_err(parse_err)?;
        if bits.is_empty() {
            return Err(parse_err(format!("feature '{name}' has no bits")));
        }

        entries.push((
            line_no + 1,
            Feature {
                name: name.to_string(),
                bits,
            },
        ));
    }

    Ok(entries)
}

/// All features of one device, loaded from a database directory.
#[derive(Debug, Clone, Default)]
pub struct FeatureTables {
    features: Vec<Feature>,
    index: HashMap<String, usize>,
    root: Option<PathBuf>,
}

impl FeatureTables {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.db` file in `dir`, in file-name order.
    ///
    /// # Errors
    ///
    /// Fails if `dir` is not a readable directory, holds no tables, or any
    /// table is malformed or redefines a feature.
    pub fn load(dir: &Path) -> Result<Self, DatabaseError> {
        if !dir.is_dir() {
            return Err(DatabaseError::NotADirectory(dir.to_path_buf()));
        }
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DatabaseError::Io { path, source }
        };

        let mut tables = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "db") {
                tables.push(path);
            }
        }
        if tables.is_empty() {
            return Err(DatabaseError::Empty(dir.to_path_buf()));
        }
        tables.sort();

        let mut db = Self::new();
        db.root = Some(dir.to_path_buf());
        for path in tables {
            let content = fs::read_to_string(&path).map_err(io_err(&path))?;
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            db.add_table(&file, &content)?;
        }
        Ok(db)
    }

    /// Parses `content` as a table named `file` and appends its features.
    ///
    /// # Errors
    ///
    /// Fails on a malformed line or a feature already defined by this or an
    /// earlier table. Nothing is added on failure.
    pub fn add_table(&mut self, file: &str, content: &str) -> Result<(), DatabaseError> {
        let entries = parse_table(file, content)?;

        let mut seen = HashMap::new();
        for (line, feature) in &entries {
            if self.index.contains_key(&feature.name)
                || seen.insert(feature.name.as_str(), *line).is_some()
            {
                return Err(DatabaseError::DuplicateFeature {
                    feature: feature.name.clone(),
                    file: file.to_string(),
                    line: *line,
                });
            }
        }

        for (_, feature) in entries {
            self.index.insert(feature.name.clone(), self.features.len());
            self.features.push(feature);
        }
        Ok(())
    }

    /// Number of features loaded.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if no features are loaded.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The directory this database was loaded from, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl FeatureDatabase for FeatureTables {
    fn get_feature(&self, name: &str) -> Option<&Feature> {
        self.index.get(name).map(|&i| &self.features[i])
    }

    fn features(&self) -> Box<dyn Iterator<Item = &Feature> + '_> {
        Box::new(self.features.iter())
    }
}
