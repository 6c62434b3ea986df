//! Ration card categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The category a document is classified into.
///
/// Exactly one category is produced per classification; it selects the
/// background image used for composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Antyodaya Anna Yojana
    Aay,
    /// Above poverty line (non-priority household)
    Apl,
    /// Below poverty line (priority household)
    Bpl,
    /// Nothing recognized
    Default,
}

impl Category {
    /// All categories, in a stable order.
    pub const ALL: [Category; 4] = [
        Category::Aay,
        Category::Apl,
        Category::Bpl,
        Category::Default,
    ];

    /// The upper-case tag (`AAY`, `APL`, `BPL`, `DEFAULT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Aay => "AAY",
            Category::Apl => "APL",
            Category::Bpl => "BPL",
            Category::Default => "DEFAULT",
        }
    }

    /// Caption written onto synthesized placeholder backgrounds.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Aay => "AAY Background",
            Category::Apl => "APL Background",
            Category::Bpl => "BPL Background",
            Category::Default => "Default Background",
        }
    }

    /// Default background file name for this category.
    pub fn default_image_name(&self) -> &'static str {
        match self {
            Category::Aay => "aay_card.jpg",
            Category::Apl => "apl_card.jpg",
            Category::Bpl => "bpl_card.jpg",
            Category::Default => "default_bg.jpg",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AAY" => Ok(Category::Aay),
            "APL" => Ok(Category::Apl),
            "BPL" => Ok(Category::Bpl),
            "DEFAULT" => Ok(Category::Default),
            other => Err(Error::Other(format!("Unknown category: {}", other))),
        }
    }
}
