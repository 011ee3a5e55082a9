// src/options.rs

//! User-configurable package options
//!
//! Two options exist: `shared` (build a shared library instead of a static
//! one) and `fPIC` (position-independent code). `fPIC` is removed entirely
//! for Windows targets, where it has no meaning.

use crate::error::{Error, Result};
use crate::settings::Os;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved option values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub shared: bool,
    /// `None` once the option has been removed for the target
    #[serde(rename = "fPIC", skip_serializing_if = "Option::is_none")]
    pub fpic: Option<bool>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            shared: true,
            fpic: Some(true),
        }
    }
}

impl Options {
    /// Apply `key=value` option overrides on top of the defaults
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Set a single option by name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = parse_bool(key, value)?;
        match key {
            "shared" => self.shared = value,
            "fPIC" => self.fpic = Some(value),
            _ => return Err(Error::InvalidOption(format!("unknown option '{}'", key))),
        }
        Ok(())
    }

    /// Drop options that make no sense for the target OS
    ///
    /// Consumes and returns the options so that callers cannot keep using
    /// the unresolved set.
    pub fn configure_for(mut self, os: Os) -> Self {
        match os {
            Os::Windows => self.fpic = None,
            Os::Linux | Os::Macos | Os::FreeBsd => {}
        }
        self
    }

    /// Whether position-independent code should be requested
    pub fn pic_enabled(&self) -> bool {
        self.fpic.unwrap_or(false)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "True" | "true" | "1" | "yes" => Ok(true),
        "False" | "false" | "0" | "no" => Ok(false),
        _ => Err(Error::InvalidOption(format!(
            "'{}' expects True or False, got '{}'",
            key, value
        ))),
    }
}
