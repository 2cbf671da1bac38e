// Licensed under the Apache-2.0 license

//! Generated output types.
//!
//! Both generators produce a [`GeneratedFiles`] pair or a
//! [`GenerateError`]. Consumers that want the flat success/message shape
//! (for display in a form, say) convert that result into a
//! [`CodeGenerationResult`]; on failure no text is carried, so a partial
//! file can never be offered for download.

use serde::Serialize;

use crate::error::GenerateError;

/// A generated C header/source pair and its suggested file names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedFiles {
    pub header: String,
    pub source: String,
    pub header_file_name: String,
    pub source_file_name: String,
}

impl GeneratedFiles {
    /// Files named `{base}.h` and `{base}.c`.
    pub fn new(base_name: &str, header: String, source: String) -> Self {
        Self {
            header,
            source,
            header_file_name: format!("{base_name}.h"),
            source_file_name: format!("{base_name}.c"),
        }
    }

    /// `(file name, contents)` for the header then the source.
    pub fn files(&self) -> [(&str, &str); 2] {
        [
            (self.header_file_name.as_str(), self.header.as_str()),
            (self.source_file_name.as_str(), self.source.as_str()),
        ]
    }
}

/// Flat outcome of a generation call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CodeGenerationResult {
    pub header_file: String,
    pub source_file: String,
    pub header_file_name: String,
    pub source_file_name: String,
    pub success: bool,
    pub error_message: String,
}

impl From<Result<GeneratedFiles, GenerateError>> for CodeGenerationResult {
    fn from(result: Result<GeneratedFiles, GenerateError>) -> Self {
        match result {
            Ok(files) => Self {
                header_file: files.header,
                source_file: files.source,
                header_file_name: files.header_file_name,
                source_file_name: files.source_file_name,
                success: true,
                error_message: String::new(),
            },
            Err(err) => Self {
                success: false,
                error_message: err.to_string(),
                ..Default::default()
            },
        }
    }
}
