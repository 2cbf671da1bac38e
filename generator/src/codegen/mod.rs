// Licensed under the Apache-2.0 license

//! Entry points for generating C translation units from a configuration.
//!
//! The implementation is split across submodules:
//! - `modulator`: PWM modulator drivers, duty/deadtime control and ISRs
//! - `peripheral`: pin, timer and serial peripheral setup
//!
//! Every entry point is a pure function of its input snapshot and the
//! configured time source. Nothing is retained between calls, so independent
//! calls may run concurrently.

mod modulator;
mod peripheral;

#[cfg(test)]
mod tests;

use log::debug;

use crate::config::GeneratorConfig;
use crate::error::GenerateResult;
use crate::model::{Modulator, PsocConfiguration};
use crate::output::GeneratedFiles;

use modulator::ModulatorCode;
use peripheral::PeripheralCode;

pub use modulator::{
    DEFAULT_DEADTIME, DEFAULT_DUTY_CYCLE, DEFAULT_SWITCHING_FREQUENCY, MAX_DUTY, MIN_DUTY,
};
pub use peripheral::PERIPHERAL_BASE_NAME;

/// Generate the header/source pair for a list of modulators, stamped with the
/// local wall clock.
///
/// The files are named after the first modulator (see
/// [`crate::util::base_file_name`]).
pub fn generate_modulator_code(modulators: &[Modulator]) -> GenerateResult<GeneratedFiles> {
    generate_modulator_code_with_config(modulators, &GeneratorConfig::with_defaults())
}

/// Generate the header/source pair for a list of modulators.
pub fn generate_modulator_code_with_config(
    modulators: &[Modulator],
    config: &GeneratorConfig,
) -> GenerateResult<GeneratedFiles> {
    let mut header = String::new();
    let mut source = String::new();
    let base_name = write_modulator_code(modulators, config, &mut header, &mut source)?;

    debug!(
        "generated {base_name}.h ({} bytes) and {base_name}.c ({} bytes)",
        header.len(),
        source.len()
    );
    Ok(GeneratedFiles::new(&base_name, header, source))
}

/// Render the modulator header and source into caller-provided sinks.
///
/// Both sinks carry the same timestamp. Returns the base file name the
/// header and source should be saved under.
pub fn write_modulator_code(
    modulators: &[Modulator],
    config: &GeneratorConfig,
    header: &mut dyn std::fmt::Write,
    source: &mut dyn std::fmt::Write,
) -> GenerateResult<String> {
    let code = ModulatorCode::plan(modulators, config);
    code.log_summary();
    code.write_header(header)?;
    code.write_source(source)?;
    Ok(code.base_name().to_string())
}

/// Generate `psoc_config.h`/`psoc_config.c`, stamped with the local wall clock.
pub fn generate_peripheral_code(config: &PsocConfiguration) -> GenerateResult<GeneratedFiles> {
    generate_peripheral_code_with_config(config, &GeneratorConfig::with_defaults())
}

/// Generate `psoc_config.h`/`psoc_config.c`.
///
/// Both files carry the same timestamp.
pub fn generate_peripheral_code_with_config(
    psoc: &PsocConfiguration,
    config: &GeneratorConfig,
) -> GenerateResult<GeneratedFiles> {
    let code = PeripheralCode::new(psoc, config.time_source.timestamp());
    code.log_summary();

    let mut header = String::new();
    code.write_header(&mut header)?;
    let mut source = String::new();
    code.write_source(&mut source)?;
    Ok(GeneratedFiles::new(PERIPHERAL_BASE_NAME, header, source))
}

/// Generate only `psoc_config.h`.
pub fn generate_peripheral_header(
    psoc: &PsocConfiguration,
    config: &GeneratorConfig,
) -> GenerateResult<String> {
    let mut header = String::new();
    PeripheralCode::new(psoc, config.time_source.timestamp()).write_header(&mut header)?;
    Ok(header)
}

/// Generate only `psoc_config.c`.
pub fn generate_peripheral_source(
    psoc: &PsocConfiguration,
    config: &GeneratorConfig,
) -> GenerateResult<String> {
    let mut source = String::new();
    PeripheralCode::new(psoc, config.time_source.timestamp()).write_source(&mut source)?;
    Ok(source)
}
