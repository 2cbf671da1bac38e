// Licensed under the Apache-2.0 license

//! Loading of configuration documents.
//!
//! Files ending in `.json` are read with `serde_json`; anything else is
//! treated as TOML. Missing fields take the model defaults.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(path, &text).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(toml::from_str(text)?)
    }
}
