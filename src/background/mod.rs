//! Category → background image resolution.
//!
//! [`BackgroundConfig`] names an image path per category. A
//! [`BackgroundResolver`] built from it must be initialized once before use;
//! initialization synthesizes a placeholder for every configured path that
//! does not exist yet.
//!
//! ```no_run
//! use rationpdf::background::{BackgroundConfig, BackgroundResolver};
//! use rationpdf::Category;
//!
//! fn main() -> rationpdf::Result<()> {
//!     let resolver = BackgroundResolver::new(BackgroundConfig::new().with_static_dir("assets"));
//!     resolver.initialize()?;
//!     println!("{}", resolver.resolve(Category::Bpl).display());
//!     Ok(())
//! }
//! ```

mod placeholder;

pub use placeholder::{materialize, placeholder_image, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Category;

/// Directory default background images live in.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Serializes placeholder creation across every resolver in the process.
static MATERIALIZE_LOCK: Mutex<()> = Mutex::new(());

/// Background image locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Directory holding the default image file names
    pub static_dir: PathBuf,

    /// Per-category paths replacing the default file name
    pub overrides: BTreeMap<Category, PathBuf>,
}

impl BackgroundConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory default file names are resolved against.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Use `path` as the background for `category`.
    pub fn with_path(mut self, category: Category, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(category, path.into());
        self
    }

    /// The configured image path for a category.
    pub fn path_for(&self, category: Category) -> PathBuf {
        self.overrides
            .get(&category)
            .cloned()
            .unwrap_or_else(|| self.static_dir.join(category.default_image_name()))
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            overrides: BTreeMap::new(),
        }
    }
}

/// Maps categories to background image files.
#[derive(Debug, Clone)]
pub struct BackgroundResolver {
    paths: BTreeMap<Category, PathBuf>,
}

impl BackgroundResolver {
    pub fn new(config: BackgroundConfig) -> Self {
        let paths = Category::ALL
            .iter()
            .map(|&category| (category, config.path_for(category)))
            .collect();
        Self { paths }
    }

    /// Make sure every configured image exists, creating placeholders for
    /// the missing ones. Safe to call repeatedly and concurrently.
    pub fn initialize(&self) -> Result<()> {
        let _guard = MATERIALIZE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (category, path) in &self.paths {
            materialize(path, category.label()).map_err(|e| {
                Error::Configuration(format!(
                    "cannot create background for {} at {}: {}",
                    category,
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// The background image for a category.
    pub fn resolve(&self, category: Category) -> &Path {
        // Every category is inserted by `new`.
        &self.paths[&category]
    }

    /// All (category, path) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Path)> {
        self.paths.iter().map(|(c, p)| (*c, p.as_path()))
    }
}

impl Default for BackgroundResolver {
    fn default() -> Self {
        Self::new(BackgroundConfig::default())
    }
}
