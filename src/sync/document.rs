//! The documents produced by a synchronization cycle.

use serde::Serialize;

use crate::{
    config::{ControlSettings, SyncSettings},
    error::Result,
    markup::{write_document, Element},
    scene::EntityId,
};

/// What one cycle looked at and emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entities the walk entered. Unchanged subtrees are never entered.
    pub visited: usize,
    pub deleted: usize,
    pub created: usize,
    pub changed: usize,

    /// The update limit stopped the walk. The rest is emitted next cycle.
    pub truncated: bool,
}

/// A single operation on the viewer's copy, addressed by entity id.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Delete {
        id: EntityId,
        element: Element,
    },

    Create {
        /// The entity the new subtree is created inside.
        target: EntityId,
        id: EntityId,
        slot: &'static str,

        /// Position within a collection slot, `None` for single-child slots.
        index: Option<usize>,
        element: Element,
    },

    Change {
        id: EntityId,

        /// Names of the changed fields, in registry order.
        fields: Vec<&'static str>,
        element: Element,
    },
}

impl Instruction {
    pub fn id(&self) -> EntityId {
        match self {
            Instruction::Delete { id, .. }
            | Instruction::Create { id, .. }
            | Instruction::Change { id, .. } => *id,
        }
    }

    /// The payload placed inside the `<Delete>`, `<Create>` or `<Change>`
    /// block.
    pub fn element(&self) -> &Element {
        match self {
            Instruction::Delete { element, .. }
            | Instruction::Create { element, .. }
            | Instruction::Change { element, .. } => element,
        }
    }

    fn block(&self) -> &'static str {
        match self {
            Instruction::Delete { .. } => "Delete",
            Instruction::Create { .. } => "Create",
            Instruction::Change { .. } => "Change",
        }
    }
}

/// An incremental update: deletes, then creates, then changes.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDocument {
    pub instructions: Vec<Instruction>,
    pub report: SyncReport,
}

impl UpdateDocument {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Builds the `NetworkLinkControl` element for this update.
    pub fn to_element(&self, settings: &SyncSettings) -> Element {
        let mut control = control_element(&settings.control);

        let target_href = Element::new("targetHref").with_text(&settings.target_href);
        let mut update = Element::new("Update").with_child(target_href);

        for block in ["Delete", "Create", "Change"] {
            let payloads: Vec<Element> = self
                .instructions
                .iter()
                .filter(|instruction| instruction.block() == block)
                .map(|instruction| instruction.element().clone())
                .collect();

            if !payloads.is_empty() {
                let mut element = Element::new(block);
                element.children = payloads;
                update.push(element);
            }
        }

        control.push(update);
        control
    }

    pub fn to_markup(&self, settings: &SyncSettings) -> Result<String> {
        write_document(&self.to_element(settings), settings.pretty)
    }
}

/// The complete document produced by a first cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FullDocument {
    pub root: Element,
    pub report: SyncReport,
}

impl FullDocument {
    pub fn to_markup(&self, settings: &SyncSettings) -> Result<String> {
        write_document(&self.root, settings.pretty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutput {
    Full(FullDocument),
    Update(UpdateDocument),
}

impl SyncOutput {
    pub fn report(&self) -> &SyncReport {
        match self {
            SyncOutput::Full(document) => &document.report,
            SyncOutput::Update(document) => &document.report,
        }
    }

    /// Whether there is nothing to send. A full document is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            SyncOutput::Full(_) => false,
            SyncOutput::Update(document) => document.is_empty(),
        }
    }

    pub fn to_markup(&self, settings: &SyncSettings) -> Result<String> {
        match self {
            SyncOutput::Full(document) => document.to_markup(settings),
            SyncOutput::Update(document) => document.to_markup(settings),
        }
    }
}

fn control_element(control: &ControlSettings) -> Element {
    let mut element = Element::new("NetworkLinkControl");

    let mut optional = |tag: &str, value: Option<String>| {
        if let Some(value) = value {
            element.push(Element::new(tag).with_text(value));
        }
    };

    optional(
        "minRefreshPeriod",
        control.min_refresh_period.map(|value| value.to_string()),
    );
    optional(
        "maxSessionLength",
        control.max_session_length.map(|value| value.to_string()),
    );
    optional("cookie", control.cookie.clone());
    optional("message", control.message.clone());
    optional("linkName", control.link_name.clone());
    optional("linkDescription", control.link_description.clone());

    if let Some(snippet) = &control.link_snippet {
        let mut snippet = Element::new("linkSnippet").with_text(snippet);
        if let Some(max_lines) = control.link_snippet_max_lines {
            snippet = snippet.with_attribute("maxLines", max_lines.to_string());
        }
        element.push(snippet);
    }

    if let Some(expires) = &control.expires {
        element.push(Element::new("expires").with_text(expires));
    }

    element
}
