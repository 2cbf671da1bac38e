// Licensed under the Apache-2.0 license

//! A minimal, namespace-aware element tree read with `quick_xml`.
//!
//! Only what the importer needs is kept: resolved namespace, local name,
//! unescaped attributes and child elements. Text content is dropped. The
//! reader still rejects documents that are not well-formed, and documents
//! nested deeper than [`MAX_DEPTH`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::ImportError;

/// Deepest element nesting accepted by [`read_document`].
pub(super) const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, Default)]
pub(super) struct Element {
    /// Resolved namespace URI, if the element is in one.
    pub namespace: Option<String>,
    pub name: String,
    /// Attributes by qualified name, in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    fn from_start(ns: ResolveResult, start: &BytesStart) -> Result<Self, ImportError> {
        let namespace = match ns {
            ResolveResult::Bound(Namespace(uri)) => {
                Some(String::from_utf8_lossy(uri).into_owned())
            }
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(ImportError::UndeclaredPrefix(
                    String::from_utf8_lossy(&prefix).into_owned(),
                ))
            }
        };
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// True if this element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given name.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// Direct children with the given name, in document order.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// This element and all its descendants in document order that satisfy
    /// `predicate`.
    pub fn descendants_where<'a>(
        &'a self,
        predicate: impl Fn(&Element) -> bool,
    ) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            if predicate(element) {
                found.push(element);
            }
            pending.extend(element.children.iter().rev());
        }
        found
    }
}

/// Parses `xml` into its root element.
pub(super) fn read_document(xml: &str) -> Result<Element, ImportError> {
    let mut reader = NsReader::from_str(xml);
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(ImportError::MultipleRootElements);
                }
                if open.len() == MAX_DEPTH {
                    return Err(ImportError::TooDeep(MAX_DEPTH));
                }
                open.push(Element::from_start(ns, &start)?);
            }
            Event::Empty(_) if open.len() == MAX_DEPTH => {
                return Err(ImportError::TooDeep(MAX_DEPTH));
            }
            Event::Empty(start) => {
                let element = Element::from_start(ns, &start)?;
                close(element, &mut open, &mut root)?;
            }
            Event::End(_) => {
                // quick_xml has already matched the end tag to its start tag.
                if let Some(element) = open.pop() {
                    close(element, &mut open, &mut root)?;
                }
            }
            Event::Text(text) if open.is_empty() => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ImportError::TextOutsideRoot);
                }
            }
            Event::CData(_) if open.is_empty() => return Err(ImportError::TextOutsideRoot),
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ImportError::UnclosedElement(unclosed.name.clone()));
    }
    root.ok_or(ImportError::NoRootElement)
}

/// Attaches a finished element to its parent, or makes it the root.
fn close(
    element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ImportError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(ImportError::MultipleRootElements),
        None => *root = Some(element),
    }
    Ok(())
}
