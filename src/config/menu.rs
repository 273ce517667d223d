//! Default menu catalog loading from TOML.
//!
//! The catalog seeds the menu on a device that has neither a reachable remote store
//! nor a saved menu. A copy ships inside the binary (`menu.toml`); a different file
//! can be supplied with [`load_catalog`].

use crate::errors::{Error, Result};
use crate::models::MenuItem;
use serde::Deserialize;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../menu.toml");

/// Structure of a catalog file
#[derive(Debug, Deserialize)]
pub struct Catalog {
    /// Items in display order
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

/// Parses a catalog and checks every item.
///
/// # Errors
/// Returns an error if the TOML is invalid, an item breaks [`MenuItem::validate`],
/// or two items share an id.
pub fn parse_catalog(contents: &str) -> Result<Vec<MenuItem>> {
    let catalog: Catalog = toml::from_str(contents)?;
    let mut seen = std::collections::HashSet::new();
    for item in &catalog.menu {
        item.validate()?;
        if !seen.insert(item.id.as_str()) {
            return Err(Error::Config {
                message: format!("Duplicate menu item id '{}' in catalog", item.id),
            });
        }
    }
    Ok(catalog.menu)
}

/// Loads a catalog from a TOML file.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<MenuItem>> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read menu catalog: {e}"),
    })?;
    parse_catalog(&contents)
}

/// The catalog compiled into the binary.
pub fn builtin_catalog() -> Result<Vec<MenuItem>> {
    parse_catalog(BUILTIN_CATALOG)
}
