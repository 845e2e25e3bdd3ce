//! Read-only element tree for XAML-like markup.
//!
//! Element and attribute names are resolved against their namespace
//! declarations, so `x:Uid` compares equal to
//! `{http://schemas.microsoft.com/winfx/2006/xaml}Uid` whatever prefix the
//! document binds that namespace to.

use quick_xml::{
    NsReader,
    events::{BytesStart, Event},
    name::{LocalName, ResolveResult},
};

use crate::{error::Error, types::QualifiedName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualifiedName,
    /// Attributes in document order; namespace declarations are not included.
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    /// 1-based line of the opening tag.
    pub line: usize,
}

impl Element {
    pub fn attribute(&self, name: &QualifiedName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// This element and all of its descendants, depth-first in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupDocument {
    root: Element,
}

impl MarkupDocument {
    /// Parses `text`, failing on anything that is not a single well-formed element tree.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let body = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = NsReader::from_str(body);
        let mut lines = LineCounter::new(body);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event()?;
            let end = reader.buffer_position() as usize;
            match event {
                Event::Start(ref e) => {
                    let line = lines.line_of_tag(end);
                    stack.push(read_element(&reader, e, line)?);
                }
                Event::Empty(ref e) => {
                    let line = lines.line_of_tag(end);
                    let element = read_element(&reader, e, line)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::malformed("unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref e) => {
                    // Unescaping rejects unknown entities.
                    let text = e.unescape()?;
                    if stack.is_empty() && !text.trim().is_empty() {
                        return Err(Error::malformed(format!(
                            "text outside the root element on line {}",
                            lines.line_at(end)
                        )));
                    }
                }
                Event::CData(_) if stack.is_empty() => {
                    return Err(Error::malformed(format!(
                        "CDATA outside the root element on line {}",
                        lines.line_at(end)
                    )));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::malformed(format!(
                "unclosed element `{}` opened on line {}",
                open.name.local, open.line
            )));
        }
        let root = root.ok_or_else(|| Error::malformed("document has no root element"))?;
        Ok(MarkupDocument { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// All elements, depth-first in document order.
    pub fn elements(&self) -> Descendants<'_> {
        self.root.descendants()
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Error::malformed(format!(
                "second root element `{}` on line {}",
                element.name.local, element.line
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn read_element<R>(
    reader: &NsReader<R>,
    start: &BytesStart,
    line: usize,
) -> Result<Element, Error> {
    let name = qualified_name(reader.resolve_element(start.name()), line)?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = qualified_name(reader.resolve_attribute(attr.key), line)?;
        if attr.value.contains(&b'<') {
            return Err(Error::malformed(format!(
                "`<` in value of attribute `{}` on line {}",
                name.local, line
            )));
        }
        let value = attr.unescape_value()?.into_owned();
        attributes.push(Attribute { name, value });
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        line,
    })
}

fn qualified_name(
    (resolved, local): (ResolveResult, LocalName),
    line: usize,
) -> Result<QualifiedName, Error> {
    let local = String::from_utf8_lossy(local.as_ref()).into_owned();
    match resolved {
        ResolveResult::Unbound => Ok(QualifiedName::local(local)),
        ResolveResult::Bound(ns) => Ok(QualifiedName::namespaced(
            String::from_utf8_lossy(ns.as_ref()),
            local,
        )),
        ResolveResult::Unknown(prefix) => Err(Error::malformed(format!(
            "undeclared namespace prefix `{}` on line {}",
            String::from_utf8_lossy(&prefix),
            line
        ))),
    }
}

/// Maps byte offsets to 1-based line numbers; offsets must be non-decreasing.
struct LineCounter<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
        }
    }

    /// Line of the `<` that opens the tag ending at byte `end`.
    fn line_of_tag(&mut self, end: usize) -> usize {
        let end = end.min(self.text.len());
        let start = self.text[..end].rfind('<').unwrap_or(0).max(self.offset);
        self.line += self.text[self.offset..start].matches('\n').count();
        self.offset = start;
        self.line
    }

    /// Line of byte `at`, which must not precede the last tag counted.
    fn line_at(&mut self, at: usize) -> usize {
        let at = at.min(self.text.len()).max(self.offset);
        self.line += self.text[self.offset..at].matches('\n').count();
        self.offset = at;
        self.line
    }
}
