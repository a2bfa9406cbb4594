// trialgate-core/src/domain/promotion/layer.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// Ordered like the lake itself: a promotion always moves one step to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataLayer {
    #[default]
    Bronze,
    Silver,
    Gold,
    Quarantine,
}

impl DataLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Quarantine => "quarantine",
        }
    }

    /// Layer a promoted batch lands in. Gold is terminal; quarantined data is only released by review.
    pub fn next(&self) -> Option<DataLayer> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold | Self::Quarantine => None,
        }
    }

    /// Where a PROMOTE verdict sends a batch read from this layer.
    pub fn promotion_target(&self) -> DataLayer {
        self.next().unwrap_or(*self)
    }
}

impl fmt::Display for DataLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bronze" | "raw" => Ok(Self::Bronze),
            "silver" | "validated" => Ok(Self::Silver),
            "gold" | "curated" => Ok(Self::Gold),
            "quarantine" => Ok(Self::Quarantine),
            _ => Err(format!("Unknown data layer: {}", s)),
        }
    }
}
