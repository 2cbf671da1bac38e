// Licensed under the Apache-2.0 license

//! C code generator for PWM modulators and PSoC peripherals.
//!
//! This crate turns a configuration model into pairs of C header/source
//! files for a PSoC-class microcontroller, and imports PWM phases from
//! ModusToolbox design files (`.modus`).
//!
//! ## Usage
//!
//! ```no_run
//! use modulator_codegen::model::{Modulator, Phase};
//! use modulator_codegen::{
//!     generate_modulator_code, generate_modulator_code_with_config, import_design_file,
//!     GeneratorConfig, NameConfig,
//! };
//!
//! let modulator = Modulator {
//!     name: "Buck 1".to_string(),
//!     phases: vec![Phase {
//!         pwm: "PWM_A_INNER".to_string(),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! // buck_1.h / buck_1.c
//! let files = generate_modulator_code(&[modulator.clone()]).unwrap();
//!
//! // Or with custom name configuration
//! let config = GeneratorConfig::with_defaults()
//!     .with_names(NameConfig::with_defaults().add_fragment("_MID"));
//! let files = generate_modulator_code_with_config(&[modulator], &config).unwrap();
//!
//! // Phases from a design file
//! let imported = import_design_file(&std::fs::read_to_string("design.modus").unwrap());
//! ```
//!
//! ## Module Organization
//!
//! - [`model`]: Modulators, phases and peripheral descriptions
//! - [`util`]: Name conversion utilities (file stems, symbol prefixes, hex formatting)
//! - [`config`]: Configuration for name transformations ([`NameConfig`])
//! - [`clock`]: Time sources for the generated banner
//! - [`output`]: Generated file pairs and flat result records
//! - [`import`]: Design-file importer
//! - `codegen`: Modulator and peripheral generators, re-exported at the crate root

pub mod clock;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod output;
pub mod util;

mod codegen;

// Re-export main public API
pub use codegen::{
    generate_modulator_code, generate_modulator_code_with_config, generate_peripheral_code,
    generate_peripheral_code_with_config, generate_peripheral_header, generate_peripheral_source,
    write_modulator_code, DEFAULT_DEADTIME, DEFAULT_DUTY_CYCLE,
    DEFAULT_SWITCHING_FREQUENCY, MAX_DUTY, MIN_DUTY, PERIPHERAL_BASE_NAME,
};
pub use config::{GeneratorConfig, NameConfig};
pub use error::{GenerateError, GenerateResult, ImportError};
pub use import::{import_design_file, parse_design_file, ImportResult};
pub use output::{CodeGenerationResult, GeneratedFiles};
