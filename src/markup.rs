//! A small owned element tree and its XML writer.

use xml::writer::{EmitterConfig, XmlEvent};

use crate::error::Result;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The first direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }
}

/// Writes `root` inside a `<kml>` element carrying the namespace
/// declarations the rest of the document relies on.
pub fn write_document(root: &Element, pretty: bool) -> Result<String> {
    let mut buffer = Vec::new();

    {
        let mut writer = EmitterConfig::new()
            .perform_indent(pretty)
            .create_writer(&mut buffer);

        writer.write(
            XmlEvent::start_element("kml")
                .default_ns(KML_NAMESPACE)
                .ns("gx", GX_NAMESPACE)
                .ns("atom", ATOM_NAMESPACE),
        )?;

        let mut stack = vec![Some(root)];
        while let Some(next) = stack.pop() {
            let element = match next {
                Some(element) => element,
                None => {
                    writer.write(XmlEvent::end_element())?;
                    continue;
                }
            };

            let mut start = XmlEvent::start_element(element.tag.as_str());
            for (name, value) in &element.attributes {
                start = start.attr(name.as_str(), value);
            }
            writer.write(start)?;

            if let Some(text) = &element.text {
                writer.write(XmlEvent::characters(text))?;
            }

            stack.push(None);
            stack.extend(element.children.iter().rev().map(Some));
        }

        writer.write(XmlEvent::end_element())?;
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_nested_elements_in_order() {
        let root = Element::new("Document")
            .with_attribute("id", "e1")
            .with_child(Element::new("name").with_text("Harbour & pier"))
            .with_child(
                Element::new("Placemark")
                    .with_attribute("id", "e2")
                    .with_child(Element::new("visibility").with_text("1")),
            );

        let markup = write_document(&root, false).unwrap();

        let document = markup.find("<Document id=\"e1\">").unwrap();
        let name = markup.find("<name>Harbour &amp; pier</name>").unwrap();
        let placemark = markup.find("<Placemark id=\"e2\">").unwrap();
        assert!(document < name && name < placemark);
        assert!(markup.contains(KML_NAMESPACE));
        assert!(markup.contains(GX_NAMESPACE));
        assert!(markup.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn lookup_helpers() {
        let element = Element::new("hotSpot")
            .with_attribute("x", "0.5")
            .with_child(Element::new("inner"));

        assert_eq!(element.attribute("x"), Some("0.5"));
        assert_eq!(element.attribute("y"), None);
        assert!(element.child("inner").is_some());
    }
}
