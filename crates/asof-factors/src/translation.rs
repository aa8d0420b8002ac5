//! Industry code translation between classification levels.
//!
//! Translation data maps each native-level code of a source table to its
//! ancestor code at every coarser level:
//!
//! ```json
//! { "sw_industry": { "Planting": { "level_1": "Agriculture", "level_2": "Crop Farming" } } }
//! ```

use crate::error::{FactorError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

type RawTranslation = HashMap<String, HashMap<String, HashMap<String, String>>>;

/// Translation data packaged with the crate.
const PACKAGED_TRANSLATION: &str = include_str!("../data/industry.json");

/// Source of industry translation tables.
pub trait TranslationSource: Send + Sync + std::fmt::Debug {
    /// Load the mapping for one industry table.
    ///
    /// Fails with [`FactorError::Config`] when the data is malformed or the
    /// table is not covered.
    fn load_translation(&self, table: &str) -> Result<IndustryTranslation>;
}

/// Native code -> `{level -> code}` mapping for one industry table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndustryTranslation {
    codes: HashMap<String, BTreeMap<u8, String>>,
}

impl IndustryTranslation {
    /// Build a translation from raw `{"level_N": code}` entries.
    fn from_raw(table: &str, raw: &HashMap<String, HashMap<String, String>>) -> Result<Self> {
        let mut codes = HashMap::with_capacity(raw.len());
        for (code, levels) in raw {
            let mut parsed = BTreeMap::new();
            for (key, target) in levels {
                parsed.insert(parse_level_key(table, key)?, target.clone());
            }
            codes.insert(code.clone(), parsed);
        }
        let translation = Self { codes };
        translation.check_hierarchy(table)?;
        Ok(translation)
    }

    /// Code at `level` for the native `code`, if the mapping covers it.
    pub fn translate(&self, code: &str, level: u8) -> Option<&str> {
        self.codes.get(code)?.get(&level).map(String::as_str)
    }

    /// Translate a code that is already at `from` to the coarser `to` level.
    pub fn coarsen(&self, code: &str, from: u8, to: u8) -> Option<&str> {
        self.codes
            .values()
            .find(|levels| levels.get(&from).is_some_and(|c| c == code))
            .and_then(|levels| levels.get(&to))
            .map(String::as_str)
    }

    /// Native code -> code at `level`, for every code the mapping covers at that level.
    pub fn level_map(&self, level: u8) -> HashMap<String, String> {
        self.codes
            .iter()
            .filter_map(|(code, levels)| Some((code.clone(), levels.get(&level)?.clone())))
            .collect()
    }

    /// Number of native codes covered.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no codes are covered.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Every code at a finer level must map to a single code at each coarser level.
    fn check_hierarchy(&self, table: &str) -> Result<()> {
        let mut parents: HashMap<(u8, &str, u8), &str> = HashMap::new();
        for levels in self.codes.values() {
            for (fine_level, fine_code) in levels {
                for (coarse_level, coarse_code) in levels.range(..*fine_level) {
                    let key = (*fine_level, fine_code.as_str(), *coarse_level);
                    match parents.insert(key, coarse_code.as_str()) {
                        Some(previous) if previous != coarse_code => {
                            return Err(FactorError::Config(format!(
                                "{table}: level {fine_level} code {fine_code:?} maps to both \
                                 {previous:?} and {coarse_code:?} at level {coarse_level}"
                            )));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_level_key(table: &str, key: &str) -> Result<u8> {
    key.strip_prefix("level_")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| FactorError::Config(format!("{table}: invalid level key {key:?}")))
}

/// JSON-backed translation source.
#[derive(Debug, Clone)]
pub struct JsonTranslation {
    tables: RawTranslation,
}

impl JsonTranslation {
    /// Translation data packaged with the crate.
    pub fn packaged() -> Result<Self> {
        Self::from_json_str(PACKAGED_TRANSLATION)
    }

    /// Parse translation data from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tables: RawTranslation = serde_json::from_str(json)
            .map_err(|e| FactorError::Config(format!("malformed industry translation: {e}")))?;
        Ok(Self { tables })
    }

    /// Read translation data from a user-supplied JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FactorError::Config(format!("cannot read industry translation {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded industry translation file");
        Self::from_json_str(&json)
    }

    /// Tables covered by this source.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        tables.sort_unstable();
        tables
    }
}

impl TranslationSource for JsonTranslation {
    fn load_translation(&self, table: &str) -> Result<IndustryTranslation> {
        let raw = self.tables.get(table).ok_or_else(|| {
            FactorError::Config(format!("industry translation has no entry for {table}"))
        })?;
        IndustryTranslation::from_raw(table, raw)
    }
}
