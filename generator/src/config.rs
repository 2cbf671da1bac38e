// Licensed under the Apache-2.0 license

//! Configuration for identifier derivation and generation.
//!
//! [`NameConfig`] controls how PWM resource names are turned into phase
//! enumerators and short phase names, and which fallback names are used for
//! blank modulator names. [`GeneratorConfig`] bundles it with the
//! [`TimeSource`] that stamps generated files.

use std::sync::Arc;

use crate::clock::{SystemClock, TimeSource};
use crate::util::symbol_prefix;

/// Configuration for name transformations during code generation.
///
/// # Example
///
/// ```
/// use modulator_codegen::config::NameConfig;
///
/// let config = NameConfig::with_defaults();
/// assert_eq!(config.phase_tag("PWM_A_INNER"), "A_INNER");
/// assert_eq!(config.phase_name("PWM_A_INNER"), "A");
/// assert_eq!(config.symbol_prefix(""), "MODULATOR");
///
/// let config = NameConfig::with_defaults().add_fragment("_MID");
/// assert_eq!(config.phase_name("PWM_B_MID"), "B");
/// ```
#[derive(Clone, Debug, Default)]
pub struct NameConfig {
    /// Marker removed from PWM identifiers to form phase enumerators.
    /// Every occurrence is removed, not only a leading one.
    pub pwm_marker: String,

    /// Fragments additionally removed (every occurrence, in order) when
    /// forming short phase names for ADC macros, controllers and DMA channels.
    pub phase_fragments: Vec<String>,

    /// Base file name used when the first modulator has no name.
    pub fallback_base_name: String,

    /// Symbol prefix used for a modulator with a blank name.
    pub fallback_prefix: String,
}

impl NameConfig {
    /// Create a NameConfig with the standard marker, fragments and fallbacks:
    /// `PWM_`, `_INNER`/`_OUTER`, `modulator_config` and `MODULATOR`.
    pub fn with_defaults() -> Self {
        Self {
            pwm_marker: "PWM_".to_string(),
            phase_fragments: vec!["_INNER".to_string(), "_OUTER".to_string()],
            fallback_base_name: "modulator_config".to_string(),
            fallback_prefix: "MODULATOR".to_string(),
        }
    }

    /// Add a fragment stripped from short phase names.
    pub fn add_fragment(mut self, fragment: &str) -> Self {
        self.phase_fragments.push(fragment.to_string());
        self
    }

    /// Replace the base file name used when the first modulator has no name.
    pub fn fallback_base_name(mut self, name: &str) -> Self {
        self.fallback_base_name = name.to_string();
        self
    }

    /// Replace the prefix used for blank modulator names.
    pub fn fallback_prefix(mut self, prefix: &str) -> Self {
        self.fallback_prefix = prefix.to_string();
        self
    }

    /// Symbol prefix for a modulator, falling back for blank names.
    pub fn symbol_prefix(&self, name: &str) -> String {
        let prefix = symbol_prefix(name);
        if prefix.is_empty() {
            self.fallback_prefix.clone()
        } else {
            prefix
        }
    }

    /// Phase enumerator suffix: the PWM identifier without the marker.
    pub fn phase_tag(&self, pwm: &str) -> String {
        if self.pwm_marker.is_empty() {
            return pwm.to_string();
        }
        pwm.replace(&self.pwm_marker, "")
    }

    /// Short phase name: the phase tag with every fragment removed.
    pub fn phase_name(&self, pwm: &str) -> String {
        self.phase_fragments
            .iter()
            .filter(|f| !f.is_empty())
            .fold(self.phase_tag(pwm), |name, fragment| {
                name.replace(fragment.as_str(), "")
            })
    }
}

/// Everything a generator needs besides its input model.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub names: NameConfig,
    pub time_source: Arc<dyn TimeSource>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GeneratorConfig {
    /// Default names, stamped with the local wall clock.
    pub fn with_defaults() -> Self {
        Self {
            names: NameConfig::with_defaults(),
            time_source: Arc::new(SystemClock),
        }
    }

    pub fn with_names(mut self, names: NameConfig) -> Self {
        self.names = names;
        self
    }

    pub fn with_time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.time_source = Arc::new(source);
        self
    }
}
