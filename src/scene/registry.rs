//! The kind registry: which fields and child slots each entity kind has.
//!
//! Kinds compose by extension. A derived kind's field and slot lists are built
//! at registration time by concatenating its base kind's lists with its own
//! declarations, so declaration order (and therefore serialization order) is
//! base-first.

use std::{collections::HashMap, fmt};

use crate::error::RegistryError;

use super::{ChildDescriptor, FieldDescriptor, FieldRule};

/// Index of a kind within a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(u16);

/// The declaration of a single kind, before it is resolved against its base.
#[derive(Debug, Clone)]
pub struct KindSpec {
    name: &'static str,
    tag: &'static str,
    base: Option<&'static str>,
    is_abstract: bool,
    suppress_id: bool,
    fields: Vec<FieldDescriptor>,
    slots: Vec<ChildDescriptor>,
}

impl KindSpec {
    pub fn new(name: &'static str) -> Self {
        KindSpec {
            name,
            tag: name,
            base: None,
            is_abstract: false,
            suppress_id: false,
            fields: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn extends(self, base: &'static str) -> Self {
        KindSpec {
            base: Some(base),
            ..self
        }
    }

    pub fn tag(self, tag: &'static str) -> Self {
        KindSpec { tag, ..self }
    }

    pub fn abstract_kind(self) -> Self {
        KindSpec {
            is_abstract: true,
            ..self
        }
    }

    /// Entities of this kind are rendered without an `id` attribute.
    pub fn suppress_id(self) -> Self {
        KindSpec {
            suppress_id: true,
            ..self
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn slot(mut self, slot: ChildDescriptor) -> Self {
        self.slots.push(slot);
        self
    }
}

/// A registered kind with its fully composed field and slot lists.
#[derive(Debug)]
pub struct KindInfo {
    id: KindId,
    name: &'static str,
    tag: &'static str,
    is_abstract: bool,
    suppress_id: bool,

    /// This kind followed by its bases, nearest first.
    lineage: Vec<KindId>,

    fields: Vec<FieldDescriptor>,
    slots: Vec<ChildDescriptor>,

    /// Resolved `accepts` kind for each entry of `slots`.
    slot_accepts: Vec<KindId>,
}

impl KindInfo {
    pub fn id(&self) -> KindId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn suppress_id(&self) -> bool {
        self.suppress_id
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn slots(&self) -> &[ChildDescriptor] {
        &self.slots
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Whether this kind is `other` or derives from it.
    pub fn is_a(&self, other: KindId) -> bool {
        self.lineage.contains(&other)
    }

    pub(crate) fn slot_accepts(&self, slot: usize) -> KindId {
        self.slot_accepts[slot]
    }
}

impl fmt::Display for KindInfo {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: Vec<KindSpec>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Declares a kind. Base kinds must be declared before the kinds that
    /// extend them.
    pub fn kind(mut self, spec: KindSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut kinds: Vec<KindInfo> = Vec::with_capacity(self.specs.len());
        let mut by_name: HashMap<&'static str, KindId> = HashMap::new();
        let mut pending_accepts: Vec<Vec<&'static str>> = Vec::with_capacity(self.specs.len());

        for spec in self.specs {
            if by_name.contains_key(spec.name) {
                return Err(RegistryError::DuplicateKind { name: spec.name });
            }

            let id = KindId(kinds.len() as u16);

            let (mut lineage, mut fields, mut slots, mut accepts) = match spec.base {
                Some(base_name) => {
                    let base_id =
                        by_name
                            .get(base_name)
                            .copied()
                            .ok_or(RegistryError::UnknownBase {
                                name: spec.name,
                                base: base_name,
                            })?;
                    let base = &kinds[base_id.0 as usize];

                    (
                        base.lineage.clone(),
                        base.fields.clone(),
                        base.slots.clone(),
                        pending_accepts[base_id.0 as usize].clone(),
                    )
                }
                None => (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            };
            lineage.insert(0, id);

            for field in spec.fields {
                if fields.iter().any(|existing| existing.name == field.name) {
                    return Err(RegistryError::DuplicateField {
                        kind: spec.name,
                        field: field.name,
                    });
                }

                if let FieldRule::Symbol(symbols) = field.rule {
                    if symbols.is_empty() {
                        return Err(RegistryError::EmptySymbolSet {
                            kind: spec.name,
                            field: field.name,
                        });
                    }
                }

                fields.push(field);
            }

            for slot in spec.slots {
                let collides = slots.iter().any(|existing| existing.name == slot.name)
                    || fields.iter().any(|field| field.name == slot.name);

                if collides {
                    return Err(RegistryError::DuplicateSlot {
                        kind: spec.name,
                        slot: slot.name,
                    });
                }

                accepts.push(slot.accepts);
                slots.push(slot);
            }

            by_name.insert(spec.name, id);
            pending_accepts.push(accepts);
            kinds.push(KindInfo {
                id,
                name: spec.name,
                tag: spec.tag,
                is_abstract: spec.is_abstract,
                suppress_id: spec.suppress_id,
                lineage,
                fields,
                slots,
                slot_accepts: Vec::new(),
            });
        }

        // Slots may accept kinds declared later, so they are resolved once
        // every kind is known.
        for (kind, accepts) in kinds.iter_mut().zip(pending_accepts) {
            let mut resolved = Vec::with_capacity(accepts.len());

            for (slot, accepts_name) in kind.slots.iter().zip(accepts) {
                let accepted = by_name.get(accepts_name).copied().ok_or(
                    RegistryError::UnknownAcceptedKind {
                        kind: kind.name,
                        slot: slot.name,
                        accepts: accepts_name,
                    },
                )?;
                resolved.push(accepted);
            }

            kind.slot_accepts = resolved;
        }

        log::trace!("Built kind registry with {} kinds", kinds.len());

        Ok(Registry { kinds, by_name })
    }
}

/// The set of entity kinds a scene tree can contain.
#[derive(Debug)]
pub struct Registry {
    kinds: Vec<KindInfo>,
    by_name: HashMap<&'static str, KindId>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Option<&KindInfo> {
        self.kind_id(name).map(|id| self.get(id))
    }

    pub fn get(&self, id: KindId) -> &KindInfo {
        &self.kinds[id.0 as usize]
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindInfo> {
        self.kinds.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(name: &'static str) -> FieldDescriptor {
        FieldDescriptor::new(name, name)
    }

    #[test]
    fn derived_kinds_append_to_base_lists() {
        let registry = Registry::builder()
            .kind(KindSpec::new("Base").abstract_kind().field(field("a")).field(field("b")))
            .kind(
                KindSpec::new("Derived")
                    .extends("Base")
                    .field(field("c"))
                    .slot(ChildDescriptor::many("items", "Base")),
            )
            .build()
            .unwrap();

        let derived = registry.lookup("Derived").unwrap();
        let names: Vec<_> = derived.fields().iter().map(|field| field.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let base = registry.kind_id("Base").unwrap();
        assert!(derived.is_a(base));
        assert!(!registry.get(base).is_a(derived.id()));
        assert_eq!(derived.slot_accepts(0), base);
    }

    #[test]
    fn base_must_be_declared_first() {
        let result = Registry::builder()
            .kind(KindSpec::new("Derived").extends("Base"))
            .kind(KindSpec::new("Base"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::UnknownBase {
                name: "Derived",
                base: "Base",
            }
        );
    }

    #[test]
    fn slots_referencing_missing_kinds_fail_fast() {
        let result = Registry::builder()
            .kind(KindSpec::new("Folder").slot(ChildDescriptor::many("features", "Feature")))
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::UnknownAcceptedKind {
                kind: "Folder",
                slot: "features",
                accepts: "Feature",
            }
        );
    }

    #[test]
    fn redeclaring_a_base_field_is_rejected() {
        let result = Registry::builder()
            .kind(KindSpec::new("Base").field(field("name")))
            .kind(KindSpec::new("Derived").extends("Base").field(field("name")))
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateField {
                kind: "Derived",
                field: "name",
            }
        );
    }

    #[test]
    fn slot_may_not_shadow_a_field() {
        let result = Registry::builder()
            .kind(
                KindSpec::new("Thing")
                    .field(field("geometry"))
                    .slot(ChildDescriptor::single("geometry", "Thing")),
            )
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateSlot {
                kind: "Thing",
                slot: "geometry",
            }
        );
    }

    #[test]
    fn empty_symbol_sets_are_rejected() {
        let result = Registry::builder()
            .kind(KindSpec::new("Thing").field(field("mode").symbol(&[])))
            .build();

        assert!(matches!(
            result,
            Err(RegistryError::EmptySymbolSet { field: "mode", .. })
        ));
    }
}
