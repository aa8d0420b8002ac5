//! Industry classification providers.

use crate::error::FactorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Industry classification data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryProvider {
    /// CITIC Securities industry classification
    Citic,

    /// Shenwan (SWS Research) industry classification
    Sw,

    /// China Securities Index industry classification
    Csi,

    /// Wind industry classification
    Wind,

    /// Global Industry Classification Standard
    Gics,
}

impl IndustryProvider {
    /// Returns all providers.
    pub fn all() -> Vec<Self> {
        vec![Self::Citic, Self::Sw, Self::Csi, Self::Wind, Self::Gics]
    }

    /// Finest level the provider's table is stored at.
    pub const fn native_level(&self) -> u8 {
        match self {
            Self::Citic | Self::Sw => 3,
            Self::Csi | Self::Wind | Self::Gics => 4,
        }
    }

    /// Short identifier used in table names and configuration.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Citic => "citic",
            Self::Sw => "sw",
            Self::Csi => "csi",
            Self::Wind => "wind",
            Self::Gics => "gics",
        }
    }

    /// Returns the full provider name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Citic => "CITIC",
            Self::Sw => "Shenwan",
            Self::Csi => "China Securities Index",
            Self::Wind => "Wind",
            Self::Gics => "GICS",
        }
    }

    /// Store table holding this provider's classification events.
    pub fn table_name(&self) -> String {
        format!("{}_industry", self.code())
    }

    /// Check that `level` is in `(0, native_level]`.
    pub fn check_level(&self, level: u8) -> Result<(), FactorError> {
        if level == 0 || level > self.native_level() {
            return Err(FactorError::InvalidParameter(format!(
                "{} industry has no level {level} (levels 1..={})",
                self.name(),
                self.native_level()
            )));
        }
        Ok(())
    }
}

impl FromStr for IndustryProvider {
    type Err = FactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(s) || p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FactorError::InvalidParameter(format!("unknown industry provider {s:?}")))
    }
}

impl fmt::Display for IndustryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_providers() {
        assert_eq!(IndustryProvider::all().len(), 5);
    }

    #[test]
    fn test_native_levels() {
        assert_eq!(IndustryProvider::Sw.native_level(), 3);
        assert_eq!(IndustryProvider::Citic.native_level(), 3);
        assert_eq!(IndustryProvider::Gics.native_level(), 4);
    }

    #[test]
    fn test_check_level() {
        assert!(IndustryProvider::Sw.check_level(1).is_ok());
        assert!(IndustryProvider::Sw.check_level(3).is_ok());
        assert!(matches!(
            IndustryProvider::Sw.check_level(4),
            Err(FactorError::InvalidParameter(_))
        ));
        assert!(IndustryProvider::Sw.check_level(0).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("sw".parse::<IndustryProvider>().unwrap(), IndustryProvider::Sw);
        assert_eq!("GICS".parse::<IndustryProvider>().unwrap(), IndustryProvider::Gics);
        assert_eq!("Shenwan".parse::<IndustryProvider>().unwrap(), IndustryProvider::Sw);
        assert!("nope".parse::<IndustryProvider>().is_err());
    }

    #[test]
    fn test_table_name_and_display() {
        assert_eq!(IndustryProvider::Sw.table_name(), "sw_industry");
        assert_eq!(format!("{}", IndustryProvider::Csi), "China Securities Index");
    }
}
