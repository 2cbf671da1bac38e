// Licensed under the Apache-2.0 license

//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use log::info;
use modulator_codegen::model::{Modulator, ModulatorConfiguration, PsocConfiguration};
use modulator_codegen::{
    generate_modulator_code, generate_peripheral_code, import_design_file, GeneratedFiles,
};
use std::path::{Path, PathBuf};

use crate::config_file;

/// Generate the modulator header/source pair described by `config`.
pub fn modulators(config: &Path, out_dir: &Path, check: bool) -> Result<Vec<PathBuf>> {
    let configuration: ModulatorConfiguration = config_file::load(config)?;
    info!(
        "Generating code for {} modulator(s) from {}",
        configuration.modulators.len(),
        config.display()
    );
    let files = generate_modulator_code(&configuration.modulators)?;
    emit(&files, out_dir, check)
}

/// Generate `psoc_config.h`/`psoc_config.c` from `config`.
pub fn peripherals(config: &Path, out_dir: &Path, check: bool) -> Result<Vec<PathBuf>> {
    let configuration: PsocConfiguration = config_file::load(config)?;
    info!(
        "Generating peripheral code for {} from {}",
        configuration.project_name,
        config.display()
    );
    let files = generate_peripheral_code(&configuration)?;
    emit(&files, out_dir, check)
}

/// Import the PWM phases of a design file as a modulator named after the file.
///
/// The modulator is written as JSON to `output`, or printed when no output
/// is given.
pub fn import(design: &Path, output: Option<&Path>) -> Result<Modulator> {
    let xml = std::fs::read_to_string(design)
        .with_context(|| format!("failed to read {}", design.display()))?;
    let result = import_design_file(&xml);
    if !result.success {
        bail!("{}: {}", design.display(), result.error_message);
    }

    let name = design
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let modulator = Modulator {
        id: 1,
        name,
        phases: result.phases,
        ..Default::default()
    };
    let json = serde_json::to_string_pretty(&modulator)?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!(
            "Imported {} phase(s) into {}",
            modulator.phases.len(),
            output_path.display()
        );
    } else {
        println!("{}", json);
    }
    Ok(modulator)
}

/// Write both generated files into `out_dir`, or only report them in check
/// mode. Returns the paths written.
fn emit(files: &GeneratedFiles, out_dir: &Path, check: bool) -> Result<Vec<PathBuf>> {
    if check {
        for (name, text) in files.files() {
            info!("{}: {} bytes (not written)", name, text.len());
        }
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let mut written = Vec::new();
    for (name, text) in files.files() {
        let path = out_dir.join(name);
        std::fs::write(&path, text)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Output written to: {}", path.display());
        written.push(path);
    }
    Ok(written)
}
