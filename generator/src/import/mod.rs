// Licensed under the Apache-2.0 license

//! Importer for ModusToolbox-style hardware design files (`.modus`).
//!
//! The design file lists configured peripheral blocks as `Personality`
//! elements. Every PWM personality with an alias becomes one [`Phase`]:
//!
//! ```text
//! <Personality template="mxs40pwm_ver2">
//!   <Block location="PWM_A_INNER">             -> Phase::pwm
//!     <Aliases><Alias value="buck_a"/></Aliases> -> Phase::alias
//!   </Block>
//!   <Parameters>
//!     <Param id="PhaseShift" value="90"/>       -> Phase::phase_shift
//!     <Param id="InvertPwm" value="true"/>      -> Phase::is_inverted
//!     <Param id="GroupNumber" value="1"/>       -> Phase::group_number
//!     <Param id="PwmAlignment" value="LeftAligned"/> -> Phase::alignment
//!   </Parameters>
//! </Personality>
//! ```
//!
//! The import is all-or-nothing for documents that are not well-formed XML,
//! and tolerant of everything else: personalities without a block or alias
//! are skipped, and unknown or unparsable parameters keep the phase defaults.

mod document;


use std::str::FromStr;

use log::{debug, info};
use serde::Serialize;

use crate::error::ImportError;
use crate::model::{Phase, PwmAlignment};
use document::{read_document, Element};

/// Namespace of every element the importer looks at.
pub const DESIGN_NAMESPACE: &str = "http://cypress.com/xsd/cydesignfile_v5";
/// `template` attribute of PWM personalities.
pub const PWM_TEMPLATE: &str = "mxs40pwm_ver2";

pub const PARAM_PHASE_SHIFT: &str = "PhaseShift";
pub const PARAM_INVERT: &str = "InvertPwm";
pub const PARAM_GROUP_NUMBER: &str = "GroupNumber";
pub const PARAM_ALIGNMENT: &str = "PwmAlignment";

/// Flat outcome of an import.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportResult {
    pub phases: Vec<Phase>,
    pub success: bool,
    pub error_message: String,
}

impl From<Result<Vec<Phase>, ImportError>> for ImportResult {
    fn from(result: Result<Vec<Phase>, ImportError>) -> Self {
        match result {
            Ok(phases) => Self {
                phases,
                success: true,
                error_message: String::new(),
            },
            Err(err) => Self {
                phases: Vec::new(),
                success: false,
                error_message: format!("Error parsing .modus file: {err}"),
            },
        }
    }
}

/// Imports the PWM phases of a design file.
///
/// Never fails; a document that cannot be read yields `success == false`, no
/// phases and a message describing the cause.
pub fn import_design_file(xml: &str) -> ImportResult {
    parse_design_file(xml).into()
}

/// Imports the PWM phases of a design file.
///
/// Phases are numbered from 1 in document order. Personalities that are
/// skipped do not consume a number.
pub fn parse_design_file(xml: &str) -> Result<Vec<Phase>, ImportError> {
    let root = read_document(xml)?;

    let personalities = root.descendants_where(|e: &Element| {
        e.is(DESIGN_NAMESPACE, "Personality") && e.attribute("template") == Some(PWM_TEMPLATE)
    });

    let mut phases: Vec<Phase> = Vec::new();
    for personality in personalities {
        let Some(block) = personality.child(DESIGN_NAMESPACE, "Block") else {
            debug!("skipping PWM personality without a block");
            continue;
        };
        let location = block.attribute("location").unwrap_or_default();
        let alias = block
            .child(DESIGN_NAMESPACE, "Aliases")
            .and_then(|aliases| aliases.child(DESIGN_NAMESPACE, "Alias"))
            .and_then(|alias| alias.attribute("value"))
            .unwrap_or_default();
        if alias.trim().is_empty() {
            debug!("skipping PWM block '{location}' without an alias");
            continue;
        }

        let mut phase = Phase {
            id: phases.len() as u32 + 1,
            alias: alias.to_string(),
            pwm: location.to_string(),
            ..Default::default()
        };
        if let Some(parameters) = personality.child(DESIGN_NAMESPACE, "Parameters") {
            for param in parameters.children_named(DESIGN_NAMESPACE, "Param") {
                match (param.attribute("id"), param.attribute("value")) {
                    (Some(id), Some(value)) if !id.is_empty() && !value.is_empty() => {
                        apply_parameter(&mut phase, id, value)
                    }
                    _ => {}
                }
            }
        }
        phases.push(phase);
    }

    info!("imported {} PWM phase(s)", phases.len());
    Ok(phases)
}

/// Maps one known parameter onto `phase`. Anything else is ignored.
fn apply_parameter(phase: &mut Phase, id: &str, value: &str) {
    match id {
        PARAM_PHASE_SHIFT => phase.phase_shift = value.to_string(),
        PARAM_INVERT => phase.is_inverted = value == "true",
        PARAM_GROUP_NUMBER => match value.trim().parse() {
            Ok(group) => phase.group_number = group,
            Err(_) => debug!("{}: ignoring group number '{value}'", phase.alias),
        },
        PARAM_ALIGNMENT => match PwmAlignment::from_str(value) {
            Ok(alignment) => phase.alignment = alignment,
            Err(_) => debug!("{}: ignoring alignment '{value}'", phase.alias),
        },
        _ => debug!("{}: ignoring parameter '{id}'", phase.alias),
    }
}
