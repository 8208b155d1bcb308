//! Renders synchronization output as short lines with entity ids replaced by
//! readable labels, so tests can snapshot whole documents with
//! `assert_yaml_snapshot` even though ids differ from run to run.

use std::collections::HashMap;

use crate::{
    scene::EntityId,
    sync::{Instruction, UpdateDocument},
};

#[derive(Debug, Default)]
pub struct Labels {
    labels: HashMap<EntityId, String>,
}

impl Labels {
    pub fn new() -> Self {
        Labels::default()
    }

    pub fn name(&mut self, id: EntityId, label: &str) {
        self.labels.insert(id, label.to_owned());
    }

    pub fn get(&self, id: EntityId) -> String {
        match self.labels.get(&id) {
            Some(label) => label.clone(),
            None => id.to_string(),
        }
    }
}

/// One line per instruction, in emission order.
pub fn view_update(document: &UpdateDocument, labels: &Labels) -> Vec<String> {
    document
        .instructions
        .iter()
        .map(|instruction| view_instruction(instruction, labels))
        .collect()
}

fn view_instruction(instruction: &Instruction, labels: &Labels) -> String {
    match instruction {
        Instruction::Delete { id, .. } => format!("delete {}", labels.get(*id)),
        Instruction::Create {
            target,
            id,
            slot,
            index,
            ..
        } => match index {
            Some(index) => format!(
                "create {} in {}.{}@{}",
                labels.get(*id),
                labels.get(*target),
                slot,
                index
            ),
            None => format!(
                "create {} in {}.{}",
                labels.get(*id),
                labels.get(*target),
                slot
            ),
        },
        Instruction::Change { id, fields, .. } => {
            format!("change {}: {}", labels.get(*id), fields.join(", "))
        }
    }
}
