//! Minimal XML element tree on top of quick-xml.
//!
//! Parsing is strict about well-formedness: one root element, balanced tags,
//! valid names, resolvable entities, no character data outside the root. The
//! declared encoding is honoured and general entities declared in the internal
//! DTD subset are expanded. Only element names, attributes and the text before
//! an element's first child are kept; comments, processing instructions and
//! text after a child are dropped. Whitespace-only text in front of a first
//! child is treated as indentation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use quick_xml::Writer;
use quick_xml::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use thiserror::Error;

static ENTITY_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"'>]+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
        .expect("valid entity declaration pattern")
});

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("text outside the root element")]
    TextOutsideRoot,
    #[error("closing tag without a matching opening tag")]
    UnexpectedEnd,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error("attribute `{0}` contains a raw `<`")]
    LtInAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Every element below this one (not this one) with the given name, in
    /// document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(element) = pending.pop() {
            if element.name == name {
                found.push(element);
            }
            pending.extend(element.children.iter().rev());
        }
        found
    }
}

/// Parses a complete document and returns its root element.
pub fn parse(bytes: &[u8]) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_reader(bytes);
    reader.check_comments(true);

    let mut buf = Vec::new();
    let mut open: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut entities: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if open.is_empty() && root.is_some() {
                    return Err(XmlError::MultipleRoots);
                }
                let element = open_element(&reader, &e, &entities)?;
                begin_child(&mut open);
                open.push(element);
            }
            Event::Empty(e) => {
                let element = open_element(&reader, &e, &entities)?;
                begin_child(&mut open);
                attach(&mut open, &mut root, element)?;
            }
            Event::End(_) => {
                let element = open.pop().ok_or(XmlError::UnexpectedEnd)?;
                attach(&mut open, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape_with(|name| entities.get(name).map(String::as_str))?;
                push_text(&mut open, &text)?;
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = reader.decoder().decode(&raw)?;
                push_text(&mut open, &text)?;
            }
            Event::DocType(e) => {
                let declaration = reader.decoder().decode(&e)?;
                collect_entities(&declaration, &mut entities);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = open.pop() {
        return Err(XmlError::Unclosed(unclosed.name));
    }
    root.ok_or(XmlError::NoRoot)
}

/// Serializes a document with an XML declaration and two-space indentation.
pub fn to_bytes(root: &XmlElement) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn open_element<R>(
    reader: &Reader<R>,
    start: &BytesStart<'_>,
    entities: &HashMap<String, String>,
) -> Result<XmlElement, XmlError> {
    let name = checked_name(reader, start.name().as_ref())?;
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = checked_name(reader, attribute.key.as_ref())?;
        if attribute.value.contains(&b'<') {
            return Err(XmlError::LtInAttribute(key));
        }
        let value = attribute
            .decode_and_unescape_value_with(reader, |name| entities.get(name).map(String::as_str))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn checked_name<R>(reader: &Reader<R>, raw: &[u8]) -> Result<String, XmlError> {
    let name = reader.decoder().decode(raw)?.into_owned();
    if is_xml_name(&name) {
        Ok(name)
    } else {
        Err(XmlError::InvalidName(name))
    }
}

/// `Name` production of XML 1.0 (fifth edition).
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Records general entities declared in the internal subset. Parameter and
/// external entities are not expanded.
fn collect_entities(doctype: &str, entities: &mut HashMap<String, String>) {
    for decl in ENTITY_DECL.captures_iter(doctype) {
        let name = decl[1].to_string();
        let Some(raw) = decl.get(2).or_else(|| decl.get(3)) else {
            continue;
        };
        let value = escape::unescape(raw.as_str())
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw.as_str().to_string());
        // The first declaration of an entity is binding.
        entities.entry(name).or_insert(value);
    }
}

fn attach(
    open: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

/// Whitespace in front of an element's first child is indentation.
fn begin_child(open: &mut [XmlElement]) {
    if let Some(parent) = open.last_mut() {
        if parent.children.is_empty() && parent.text.trim().is_empty() {
            parent.text.clear();
        }
    }
}

fn push_text(open: &mut [XmlElement], text: &str) -> Result<(), XmlError> {
    match open.last_mut() {
        Some(element) if element.children.is_empty() => element.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::TextOutsideRoot),
    }
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&element.text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_nesting_text_and_attributes() {
        let root = parse(
            br#"<?xml version="1.0"?>
<Contacts source="import">
  <Contact><Name>Anna &amp; Co</Name><Phone/></Contact>
</Contacts>"#,
        )
        .unwrap();

        assert_eq!(root.name, "Contacts");
        assert_eq!(root.attributes, vec![("source".to_string(), "import".to_string())]);
        let contact = root.child("Contact").unwrap();
        assert_eq!(contact.child("Name").unwrap().text, "Anna & Co");
        assert_eq!(contact.child("Phone").unwrap().text, "");
    }

    #[test]
    fn test_parse_reads_cdata_as_text() {
        let root = parse(b"<Name><![CDATA[<b>Anna</b>]]></Name>").unwrap();
        assert_eq!(root.text, "<b>Anna</b>");
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        assert!(matches!(parse(b"not xml"), Err(XmlError::TextOutsideRoot)));
        assert!(matches!(parse(b""), Err(XmlError::NoRoot)));
        assert!(matches!(parse(b"<a/><b/>"), Err(XmlError::MultipleRoots)));
        assert!(matches!(parse(b"<a><b></a>"), Err(XmlError::Syntax(_))));
        assert!(parse(b"<a><b>").is_err());
        assert!(parse(b"<a>&undefined;</a>").is_err());
        assert!(parse(b"<a/>trailing").is_err());
    }

    #[test]
    fn test_descendants_in_document_order_excluding_self() {
        let root = parse(
            b"<Contact><Group><Contact id=\"1\"/></Group><Contact id=\"2\"><Contact id=\"3\"/></Contact></Contact>",
        )
        .unwrap();
        let ids: Vec<&str> = root
            .descendants_named("Contact")
            .iter()
            .map(|c| c.attributes[0].1.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_written_document_parses_back() {
        let mut root = XmlElement::new("Contacts");
        let mut contact = XmlElement::new("Contact");
        contact.children.push(XmlElement::with_text("Name", "Иван <Иванов>"));
        root.children.push(contact);

        let bytes = to_bytes(&root).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("&lt;Иванов&gt;"));
        assert_eq!(parse(&bytes).unwrap(), root);
    }

    #[test]
    fn test_parse_decodes_declared_encoding() {
        // "Иван" in windows-1251
        let root = parse(
            b"<?xml version=\"1.0\" encoding=\"windows-1251\"?>\n<Contacts><Contact><Name>\xC8\xE2\xE0\xED</Name></Contact></Contacts>",
        )
        .unwrap();
        let contact = root.child("Contact").unwrap();
        assert_eq!(contact.child("Name").unwrap().text, "Иван");
    }

    #[test]
    fn test_parse_expands_internal_subset_entities() {
        let root = parse(
            br#"<!DOCTYPE a [<!ENTITY co "Company"> <!ENTITY amp2 '&amp;'>]><a title="&co;">&co; &amp2; Sons</a>"#,
        )
        .unwrap();
        assert_eq!(root.text, "Company & Sons");
        assert_eq!(root.attributes, vec![("title".to_string(), "Company".to_string())]);
    }

    #[test]
    fn test_parse_rejects_invalid_names_and_markup() {
        assert!(matches!(parse(b"<1Contacts/>"), Err(XmlError::InvalidName(_))));
        assert!(matches!(parse(b"<a 2b=\"x\"/>"), Err(XmlError::InvalidName(_))));
        assert!(matches!(parse(b"<a b=\"<\"/>"), Err(XmlError::LtInAttribute(_))));
        assert!(parse(b"<a><!-- x -- y --></a>").is_err());
        assert!(parse(b"<a><!-- fine - comment --></a>").is_ok());
        assert!(parse("<Контакты><_x.y-z/></Контакты>".as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_keeps_surrounding_whitespace_in_text() {
        let root = parse(
            b"<Contacts>\n  <Contact>\n    <Name>  Old  Name </Name>\n    <Phone> </Phone>\n  </Contact>\n</Contacts>",
        )
        .unwrap();
        assert_eq!(root.text, "");
        let contact = root.child("Contact").unwrap();
        assert_eq!(contact.text, "");
        assert_eq!(contact.child("Name").unwrap().text, "  Old  Name ");
        assert_eq!(contact.child("Phone").unwrap().text, " ");

        let reparsed = parse(&to_bytes(&root).unwrap()).unwrap();
        assert_eq!(reparsed, root);
    }
}
