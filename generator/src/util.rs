// Licensed under the Apache-2.0 license

//! Identifier sanitizing for generated C code and file names.
//!
//! Every generated identifier is derived from free-text names typed by the
//! user. The functions here are pure and are recomputed on every generation
//! call; nothing is cached across calls.

use crate::model::Modulator;

/// Converts a name into a file-name stem.
///
/// Lower-cases the name and replaces spaces, hyphens and periods with
/// underscores. Also used to build include guards.
///
/// # Examples
/// ```
/// use modulator_codegen::util::file_stem;
/// assert_eq!(file_stem("Buck 1"), "buck_1");
/// assert_eq!(file_stem("Boost-Stage.v2"), "boost_stage_v2");
/// ```
pub fn file_stem(name: &str) -> String {
    name.to_lowercase().replace(&[' ', '-', '.'][..], "_")
}

/// Converts a name into the prefix for enum tags, macros and phase enumerators.
///
/// Upper-cases the name and replaces spaces and hyphens with underscores.
/// Returns an empty string for a blank name; callers substitute their own
/// fallback token (see [`crate::config::NameConfig::symbol_prefix`]).
///
/// # Examples
/// ```
/// use modulator_codegen::util::symbol_prefix;
/// assert_eq!(symbol_prefix("Buck 1"), "BUCK_1");
/// assert_eq!(symbol_prefix("pfc-front"), "PFC_FRONT");
/// assert_eq!(symbol_prefix("   "), "");
/// ```
pub fn symbol_prefix(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }
    name.to_uppercase().replace(&[' ', '-'][..], "_")
}

/// Converts a modulator name into the lower-case stem of its C variables,
/// types and functions (`{instance}_config`, `{instance}_init`, ...).
///
/// Only spaces are replaced.
pub fn instance_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Upper-case macro stem for a peripheral (`LED_1_PORT`, `UART_BAUD_RATE`, ...).
pub fn macro_name(name: &str) -> String {
    name.to_uppercase().replace(' ', "_")
}

/// Case-preserving C identifier for a peripheral's functions (`Led_1_Write`).
pub fn c_identifier(name: &str) -> String {
    name.replace(' ', "_")
}

/// Include guard for a generated header with the given base name.
///
/// # Examples
/// ```
/// use modulator_codegen::util::include_guard;
/// assert_eq!(include_guard("buck_1"), "BUCK_1_H");
/// ```
pub fn include_guard(base_name: &str) -> String {
    format!("{}_H", base_name.to_uppercase())
}

/// Picks the base file name for a batch of modulators.
///
/// The name is derived from the **first** modulator only. If the list is
/// empty or that modulator's name is blank, `fallback` is returned. Output
/// naming therefore depends on list order.
pub fn base_file_name(modulators: &[Modulator], fallback: &str) -> String {
    match modulators.first() {
        Some(first) if !first.name.trim().is_empty() => file_stem(&first.name),
        _ => fallback.to_string(),
    }
}

/// Formats a byte as a two-digit upper-case hex literal (`0x50`).
pub fn hex_byte(val: u8) -> String {
    format!("0x{val:02X}")
}
