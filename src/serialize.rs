//! Renders entities to markup. Rendering is a pure function of the tree's
//! current state and never touches synchronization bookkeeping.

use crate::{
    error::Result,
    markup::Element,
    scene::{EntityId, FieldDescriptor, FieldRule, FieldValue, SceneTree},
};

/// Renders the entity with its fields in registry order, followed by its
/// children in slot order when `include_children` is set.
pub fn serialize(tree: &SceneTree, id: EntityId, include_children: bool) -> Result<Element> {
    let entity = tree.entity(id)?;
    let kind = tree.kind_of(entity);

    let mut element = Element::new(kind.tag());
    if !kind.suppress_id() {
        element = element.with_attribute("id", id.to_string());
    }

    for (field, value) in kind.fields().iter().zip(&entity.values) {
        if let Some(value) = value {
            element.push(field_element(field, Some(value)));
        }
    }

    if !include_children {
        return Ok(element);
    }

    for (descriptor, contents) in kind.slots().iter().zip(&entity.slots) {
        for &child in contents.ids() {
            let rendered = serialize(tree, child, true)?;

            match descriptor.wrapper {
                Some(wrapper) => element.push(Element::new(wrapper).with_child(rendered)),
                None => element.push(rendered),
            }
        }
    }

    Ok(element)
}

/// Renders one field. A missing value renders as an empty element, which is
/// how a change instruction clears a field.
pub fn field_element(field: &FieldDescriptor, value: Option<&FieldValue>) -> Element {
    let mut element = Element::new(field.tag);

    let value = match value {
        Some(value) => value,
        None => return element,
    };

    let mut inner = match field.rule {
        FieldRule::Nested(path) => path.last().map(|tag| Element::new(*tag)),
        FieldRule::Direct | FieldRule::Symbol(_) => None,
    };

    {
        let target = inner.as_mut().unwrap_or(&mut element);
        for (name, attribute) in value.attributes() {
            target.attributes.push((name.to_owned(), attribute));
        }
        target.text = value.text();
    }

    if let (FieldRule::Nested(path), Some(inner)) = (field.rule, inner) {
        let mut wrapped = inner;
        for tag in path.iter().rev().skip(1) {
            wrapped = Element::new(*tag).with_child(wrapped);
        }
        element.push(wrapped);
    }

    element
}
