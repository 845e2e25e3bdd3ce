//! Support for `.resw` string tables.
//!
//! A table is a `root` element holding `data` entries:
//!
//! ```xml
//! <data name="Save.Content" xml:space="preserve">
//!   <value>Save</value>
//!   <comment></comment>
//! </data>
//! ```
//!
//! Only the entries are modelled. The original text is kept as-is and new
//! entries are spliced in just before `</root>`, so schema, headers, comments and
//! formatting of untouched parts of the file survive byte-for-byte.

use std::{
    collections::HashSet,
    io::{BufRead, Write},
};

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use serde::Serialize;

use crate::{
    error::Error,
    traits::{Parser, read_to_string},
};

const BOM: &str = "\u{feff}";
const DEFAULT_INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comment: Some(String::new()),
        }
    }
}

/// Where new entries go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootLayout {
    /// Byte offset of `</root>`.
    Open { close_at: usize },
    /// Byte span of `<root/>`.
    SelfClosing { start: usize, end: usize },
}

#[derive(Debug, Clone)]
pub struct ResourceDocument {
    source: String,
    bom: bool,
    layout: RootLayout,
    indent: String,
    /// Line break used by the document, `"\r\n"` or `"\n"`.
    newline: &'static str,
    entries: Vec<ResourceEntry>,
    names: HashSet<String>,
    pending: Vec<ResourceEntry>,
}

impl ResourceDocument {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let (bom, body) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let scan = scan(body)?;
        let names = scan.entries.iter().map(|e| e.name.clone()).collect();
        Ok(ResourceDocument {
            source: body.to_string(),
            bom,
            layout: scan.layout,
            indent: scan.indent.unwrap_or_else(|| DEFAULT_INDENT.to_string()),
            newline: if body.contains("\r\n") { "\r\n" } else { "\n" },
            entries: scan.entries,
            names,
            pending: Vec::new(),
        })
    }

    /// Existing entries followed by appended ones.
    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter().chain(self.pending.iter())
    }

    pub fn get(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a `data` entry unless `name` is already present.
    ///
    /// Returns whether the entry was added.
    pub fn append(&mut self, name: &str, value: &str) -> bool {
        if !self.names.insert(name.to_string()) {
            return false;
        }
        self.pending.push(ResourceEntry::new(name, value));
        true
    }

    /// Entries appended since parsing.
    pub fn appended(&self) -> &[ResourceEntry] {
        &self.pending
    }

    pub fn is_modified(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The full document text including appended entries.
    pub fn render(&self) -> Result<String, Error> {
        let mut out = String::with_capacity(self.source.len() + self.pending.len() * 96);
        if self.bom {
            out.push_str(BOM);
        }
        if self.pending.is_empty() {
            out.push_str(&self.source);
            return Ok(out);
        }

        let block = self.render_entries()?;
        let src = self.source.as_str();
        match self.layout {
            RootLayout::Open { close_at } => {
                let line_start = src[..close_at].rfind('\n').map(|i| i + 1);
                match line_start {
                    Some(ls) if src[ls..close_at].trim().is_empty() => {
                        out.push_str(&src[..ls]);
                        out.push_str(&block);
                        out.push_str(&src[ls..]);
                    }
                    _ => {
                        out.push_str(&src[..close_at]);
                        out.push_str(self.newline);
                        out.push_str(&block);
                        out.push_str(&src[close_at..]);
                    }
                }
            }
            RootLayout::SelfClosing { start, end } => {
                let open_tag = src[start..end].trim_end_matches("/>").trim_end();
                out.push_str(&src[..start]);
                out.push_str(open_tag);
                out.push('>');
                out.push_str(self.newline);
                out.push_str(&block);
                out.push_str("</root>");
                out.push_str(&src[end..]);
            }
        }
        Ok(out)
    }

    fn render_entries(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        let inner = format!("{}{}{}", self.newline, self.indent, self.indent);
        let outer = format!("{}{}", self.newline, self.indent);

        for entry in &self.pending {
            let mut data = BytesStart::new("data");
            data.push_attribute(("name", entry.name.as_str()));
            data.push_attribute(("xml:space", "preserve"));

            writer.write_event(Event::Text(BytesText::from_escaped(self.indent.as_str())))?;
            writer.write_event(Event::Start(data))?;
            writer.write_event(Event::Text(BytesText::from_escaped(inner.as_str())))?;
            writer.write_event(Event::Start(BytesStart::new("value")))?;
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
                &entry.value,
            ))))?;
            writer.write_event(Event::End(BytesEnd::new("value")))?;
            writer.write_event(Event::Text(BytesText::from_escaped(inner.as_str())))?;
            writer.write_event(Event::Start(BytesStart::new("comment")))?;
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
                entry.comment.as_deref().unwrap_or_default(),
            ))))?;
            writer.write_event(Event::End(BytesEnd::new("comment")))?;
            writer.write_event(Event::Text(BytesText::from_escaped(outer.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("data")))?;
            writer.write_event(Event::Text(BytesText::from_escaped(self.newline)))?;
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

impl Parser for ResourceDocument {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        Self::parse(&read_to_string(reader)?)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(self.render()?.as_bytes())?;
        Ok(())
    }
}

struct Scan {
    layout: RootLayout,
    indent: Option<String>,
    entries: Vec<ResourceEntry>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Value,
    Comment,
}

/// A `data` element being read.
struct OpenEntry {
    name: Option<String>,
    depth: usize,
    value: String,
    comment: Option<String>,
    /// Child currently collecting text, with its depth.
    field: Option<(Field, usize)>,
}

impl OpenEntry {
    fn new(start: &BytesStart, depth: usize) -> Result<Self, Error> {
        let mut name = None;
        for attr in start.attributes().with_checks(false) {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_ref() == b"name" {
                name = Some(attr.unescape_value()?.to_string());
            }
        }
        Ok(Self {
            name,
            depth,
            value: String::new(),
            comment: None,
            field: None,
        })
    }

    fn push_text(&mut self, text: &str) {
        match self.field {
            Some((Field::Value, _)) => self.value.push_str(text),
            Some((Field::Comment, _)) => self
                .comment
                .get_or_insert_with(String::new)
                .push_str(text),
            None => {}
        }
    }

    fn finish(self) -> Option<ResourceEntry> {
        match self.name {
            Some(name) => Some(ResourceEntry {
                name,
                value: self.value,
                comment: self.comment,
            }),
            None => {
                tracing::warn!("ignoring `data` element without a `name` attribute");
                None
            }
        }
    }
}

fn scan(text: &str) -> Result<Scan, Error> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut layout = None;
    let mut indent = None;
    let mut entries = Vec::new();
    let mut open: Option<OpenEntry> = None;

    loop {
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(ref e) => {
                check_attribute_values(e)?;
                if depth == 0 {
                    check_root(e, layout.is_some())?;
                } else if e.name().as_ref() == b"data" && open.is_none() {
                    if depth == 1 && indent.is_none() {
                        indent = leading_indent(text, tag_start(text, end));
                    }
                    open = Some(OpenEntry::new(e, depth)?);
                } else if let Some(entry) = open.as_mut() {
                    if depth == entry.depth + 1 && entry.field.is_none() {
                        entry.field = match e.name().as_ref() {
                            b"value" => Some((Field::Value, depth)),
                            b"comment" => {
                                entry.comment = Some(String::new());
                                Some((Field::Comment, depth))
                            }
                            _ => None,
                        };
                    }
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                check_attribute_values(e)?;
                if depth == 0 {
                    check_root(e, layout.is_some())?;
                    layout = Some(RootLayout::SelfClosing {
                        start: tag_start(text, end),
                        end,
                    });
                } else if e.name().as_ref() == b"data" && open.is_none() {
                    if depth == 1 && indent.is_none() {
                        indent = leading_indent(text, tag_start(text, end));
                    }
                    entries.extend(OpenEntry::new(e, depth)?.finish());
                } else if let Some(entry) = open.as_mut() {
                    if depth == entry.depth + 1 && e.name().as_ref() == b"comment" {
                        entry.comment = Some(String::new());
                    }
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::malformed("unexpected closing tag"))?;
                if depth == 0 {
                    layout = Some(RootLayout::Open {
                        close_at: tag_start(text, end),
                    });
                }
                let closes_entry = match open.as_mut() {
                    Some(entry) if matches!(entry.field, Some((_, d)) if d == depth) => {
                        entry.field = None;
                        false
                    }
                    Some(entry) => entry.depth == depth,
                    None => false,
                };
                if closes_entry {
                    entries.extend(open.take().and_then(OpenEntry::finish));
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                if depth == 0 && !text.trim().is_empty() {
                    return Err(Error::malformed("text outside the root element"));
                }
                if let Some(entry) = open.as_mut() {
                    entry.push_text(&text);
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(Error::malformed("CDATA outside the root element"));
            }
            Event::CData(ref e) => {
                if let Some(entry) = open.as_mut() {
                    entry.push_text(&String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(Error::malformed("unclosed element at end of document"));
    }
    let layout = layout.ok_or_else(|| Error::structural("missing root element `root`"))?;
    Ok(Scan {
        layout,
        indent,
        entries,
    })
}

fn check_root(start: &BytesStart, seen: bool) -> Result<(), Error> {
    if seen {
        return Err(Error::malformed("more than one top-level element"));
    }
    if start.name().as_ref() != b"root" {
        return Err(Error::structural(format!(
            "expected root element `root`, found `{}`",
            String::from_utf8_lossy(start.name().as_ref())
        )));
    }
    Ok(())
}

fn check_attribute_values(start: &BytesStart) -> Result<(), Error> {
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.value.contains(&b'<') {
            return Err(Error::malformed(format!(
                "`<` in value of attribute `{}`",
                String::from_utf8_lossy(attr.key.as_ref())
            )));
        }
        attr.unescape_value()?;
    }
    Ok(())
}

/// Offset of the `<` opening the tag that ends at `end`.
fn tag_start(text: &str, end: usize) -> usize {
    text[..end.min(text.len())].rfind('<').unwrap_or(0)
}

/// Whitespace between the start of the line and `at`, if that is all there is.
fn leading_indent(text: &str, at: usize) -> Option<String> {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let lead = &text[line_start..at];
    if !lead.is_empty() && lead.chars().all(|c| c == ' ' || c == '\t') {
        Some(lead.to_string())
    } else {
        None
    }
}
