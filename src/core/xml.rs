// src/core/xml.rs
//
// Owned, index-addressed XML tree for WordprocessingML parts. Qualified
// names and attributes are kept verbatim so markup we never touch
// round-trips through parse + serialize unchanged.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written in the source, e.g. `w:tbl`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its namespace prefix (`w:tbl` -> `tbl`).
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute lookup by local name (`val` matches `w:val`).
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.rsplit(':').next() == Some(local))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn push_element(&mut self, el: XmlElement) {
        self.children.push(XmlNode::Element(el));
    }

    pub fn push_text(&mut self, text: &str) {
        self.children.push(XmlNode::Text(text.to_string()));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn first_child(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(local))
    }

    pub fn first_child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|el| el.is(local))
    }

    /// Pre-order walk over descendant elements, self excluded.
    pub fn descendants(&self) -> Descendants<'_> {
        // The stack pops from the back, so the first child goes on last.
        let stack: Vec<&XmlElement> = self
            .children
            .iter()
            .rev()
            .filter_map(XmlNode::as_element)
            .collect();
        Descendants { stack }
    }

    /// Pre-order walk including self; `f` runs on a node before its children
    /// are visited, so replacing a node's children prunes the walk beneath it.
    pub fn for_each_element_mut<F: FnMut(&mut XmlElement)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                el.for_each_element_mut(f);
            }
        }
    }

    /// Child-index paths (relative to self) of every descendant element
    /// matching `pred`, in document order.
    pub fn find_paths<F: Fn(&XmlElement) -> bool>(&self, pred: &F) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.collect_paths(pred, &mut path, &mut out);
        out
    }

    fn collect_paths<F: Fn(&XmlElement) -> bool>(
        &self,
        pred: &F,
        path: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        for (i, child) in self.children.iter().enumerate() {
            if let XmlNode::Element(el) = child {
                path.push(i);
                if pred(el) {
                    out.push(path.clone());
                }
                el.collect_paths(pred, path, out);
                path.pop();
            }
        }
    }

    pub fn element_at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &idx in path {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    pub fn element_at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &idx in path {
            current = current.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.append_text(&mut text);
        text
    }

    fn append_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => buf.push_str(t),
                XmlNode::Element(el) => el.append_text(buf),
            }
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        for child in el.children.iter().rev() {
            if let XmlNode::Element(e) = child {
                self.stack.push(e);
            }
        }
        Some(el)
    }
}

/// Parse one XML part into an owned tree rooted at its document element.
pub fn parse_part(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event().context("malformed XML in document part")? {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let el = element_from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(el)),
                    None => root = Some(el),
                }
            }
            Event::End(_) => {
                let el = match stack.pop() {
                    Some(el) => el,
                    None => bail!("unbalanced end tag in document part"),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(el)),
                    None => root = Some(el),
                }
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    let text = t.unescape().context("bad character data")?;
                    if !text.is_empty() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text =
                        String::from_utf8(c.into_inner().into_owned()).context("bad CDATA")?;
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        bail!("unclosed element in document part");
    }
    root.context("document part contains no root element")
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8(e.name().as_ref().to_vec()).context("non-UTF-8 element name")?;
    let mut el = XmlElement::new(&name);
    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        let key =
            String::from_utf8(attr.key.as_ref().to_vec()).context("non-UTF-8 attribute name")?;
        let value = attr.unescape_value().context("bad attribute value")?;
        el.attrs.push((key, value.into_owned()));
    }
    Ok(el)
}

/// Serialize a tree back into a standalone XML part.
pub fn write_part(root: &XmlElement) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attrs {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}
