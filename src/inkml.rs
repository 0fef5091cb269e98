//! Minimal InkML element tree.
//!
//! Both the ink loader and the annotation loader query the same document, so
//! the file is decoded and parsed once into a small owned tree built from
//! `quick-xml` events. Element and attribute names are stored by local name,
//! which makes `id` and `xml:id` (and any namespace prefix) equivalent.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{InkError, InkResult};

/// One element of a parsed InkML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name of the element (namespace prefix stripped).
    pub name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Value of the attribute with the given local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct text content, trimmed. `None` when the element has no text.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn from_start(start: &BytesStart<'_>) -> InkResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }
}

/// Read and decode an InkML file.
///
/// Files are tried as UTF-8 first; anything else is decoded as Latin-1
/// (windows-1252, its superset), which never fails.
pub fn read_file(path: &Path) -> InkResult<String> {
    let bytes = std::fs::read(path).map_err(|e| InkError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(decode(&bytes).into_owned())
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("input is not UTF-8, decoding as Latin-1");
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Parse markup into an element tree rooted at the document element.
pub fn parse(source: &str) -> InkResult<Element> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element::from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| InkError::Xml {
                    message: "unexpected closing tag".into(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(xml_error)?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(InkError::Xml {
                    message: format!("at byte {}: {e}", reader.buffer_position()),
                });
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(InkError::Xml {
            message: format!("unclosed element <{}>", open.name),
        });
    }
    root.ok_or_else(|| InkError::Xml {
        message: "document has no root element".into(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> InkResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(InkError::Xml {
            message: format!("second root element <{}>", element.name),
        });
    }
    *root = Some(element);
    Ok(())
}

fn xml_error(e: impl std::fmt::Display) -> InkError {
    InkError::Xml {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ink xmlns="http://www.w3.org/2003/InkML">
  <annotation type="truth">$a$</annotation>
  <trace id="0">1 2, 3 4</trace>
  <trace xml:id="1">5 6</trace>
  <traceGroup xml:id="7">
    <traceView traceDataRef="0"/>
  </traceGroup>
</ink>"#;

    #[test]
    fn builds_tree_by_local_name() {
        let root = parse(SAMPLE).unwrap();
        assert_eq!(root.name, "ink");
        let traces: Vec<_> = root.children_named("trace").collect();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].attr("id"), Some("0"));
        assert_eq!(traces[1].attr("id"), Some("1"));
        assert_eq!(traces[0].text(), Some("1 2, 3 4"));
    }

    #[test]
    fn empty_elements_become_children() {
        let root = parse(SAMPLE).unwrap();
        let group = root.child("traceGroup").unwrap();
        let view = group.child("traceView").unwrap();
        assert_eq!(view.attr("traceDataRef"), Some("0"));
        assert_eq!(view.text(), None);
    }

    #[test]
    fn entities_are_unescaped() {
        let root = parse("<a><b>x &lt; y</b></a>").unwrap();
        assert_eq!(root.child("b").unwrap().text(), Some("x < y"));
    }

    #[test]
    fn malformed_markup_is_rejected() {
        assert!(matches!(parse("<a><b></a>"), Err(InkError::Xml { .. })));
        assert!(matches!(parse("<a><b>"), Err(InkError::Xml { .. })));
        assert!(matches!(parse(""), Err(InkError::Xml { .. })));
    }

    #[test]
    fn latin1_fallback_decodes() {
        let bytes = b"<a>caf\xe9</a>";
        let text = decode(bytes);
        assert_eq!(text, "<a>caf\u{e9}</a>");
    }
}
