// Licensed under the Apache-2.0 license

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Errors that abort a code generation call.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The output sink rejected a write.
    #[error("failed to write generated code: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Errors that abort a design-file import.
///
/// Unknown elements, attributes and parameter ids are not errors; only a
/// document that is not well-formed XML fails the import.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),
    #[error("{0}")]
    Attribute(#[from] AttrError),
    #[error("data at the root level is invalid: the document has no root element")]
    NoRootElement,
    #[error("there are multiple root elements")]
    MultipleRootElements,
    #[error("data at the root level is invalid: unexpected text outside the root element")]
    TextOutsideRoot,
    #[error("unexpected end of file: element <{0}> is not closed")]
    UnclosedElement(String),
    #[error("'{0}' is an undeclared namespace prefix")]
    UndeclaredPrefix(String),
    #[error("elements are nested deeper than {0} levels")]
    TooDeep(usize),
}

pub type GenerateResult<T> = std::result::Result<T, GenerateError>;
