//! Declarative descriptions of what an entity kind serializes.

use super::FieldValue;

/// How a field's value maps to markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// `<tag>value</tag>`
    Direct,

    /// Like `Direct`, but the value must be one of the listed symbols.
    Symbol(&'static [&'static str]),

    /// The value is wrapped in further elements inside the field's tag, e.g.
    /// `atom:author` with a path of `["atom:name"]`.
    Nested(&'static [&'static str]),
}

/// A normalization applied to numeric values when they are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    None,
    /// Clamped to −90..=90.
    Angle90,
    /// Clamped to 0..=90.
    AnglePos90,
    /// Wrapped into −180..=180.
    Angle180,
    /// Clamped to 0..=180.
    AnglePos180,
    /// Reduced modulo 360 when outside −360..=360.
    Angle360,
    NonNegative,
}

impl Constraint {
    /// Applies the constraint, returning `None` if the value cannot satisfy it.
    pub fn apply(self, value: FieldValue) -> Option<FieldValue> {
        if self == Constraint::None {
            return Some(value);
        }

        let number = value.as_f64().filter(|number| number.is_finite())?;

        let constrained = match self {
            Constraint::None => number,
            Constraint::Angle90 => number.clamp(-90.0, 90.0),
            Constraint::AnglePos90 => number.clamp(0.0, 90.0),
            Constraint::Angle180 => {
                let mut wrapped = number % 360.0;
                if wrapped > 180.0 {
                    wrapped -= 360.0;
                } else if wrapped < -180.0 {
                    wrapped += 360.0;
                }
                wrapped
            }
            Constraint::AnglePos180 => number.clamp(0.0, 180.0),
            Constraint::Angle360 => {
                if number > 360.0 || number < -360.0 {
                    number % 360.0
                } else {
                    number
                }
            }
            Constraint::NonNegative => number.max(0.0),
        };

        Some(FieldValue::Float(constrained))
    }
}

/// Registry entry for one serializable attribute of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Attribute name used by client code, e.g. `style_url`.
    pub name: &'static str,

    /// Element tag emitted for the attribute, e.g. `styleUrl`.
    pub tag: &'static str,

    pub rule: FieldRule,
    pub constraint: Constraint,

    /// Tracked fields produce change instructions when mutated. Untracked
    /// fields are fixed once the entity has been synchronized.
    pub tracked: bool,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, tag: &'static str) -> Self {
        FieldDescriptor {
            name,
            tag,
            rule: FieldRule::Direct,
            constraint: Constraint::None,
            tracked: true,
        }
    }

    pub fn symbol(self, symbols: &'static [&'static str]) -> Self {
        FieldDescriptor {
            rule: FieldRule::Symbol(symbols),
            ..self
        }
    }

    pub fn nested(self, path: &'static [&'static str]) -> Self {
        FieldDescriptor {
            rule: FieldRule::Nested(path),
            ..self
        }
    }

    pub fn constrained(self, constraint: Constraint) -> Self {
        FieldDescriptor { constraint, ..self }
    }

    pub fn fixed(self) -> Self {
        FieldDescriptor {
            tracked: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Single,

    /// An ordered collection. Structural collections are re-emitted as a whole
    /// whenever their membership or order changes after synchronization.
    Many { structural: bool },
}

/// Registry entry for an attribute holding owned child entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildDescriptor {
    pub name: &'static str,

    /// Name of the kind (usually an abstract base) that children must be.
    pub accepts: &'static str,

    pub multiplicity: Multiplicity,

    /// Element each child is wrapped in, e.g. `outerBoundaryIs`.
    pub wrapper: Option<&'static str>,
}

impl ChildDescriptor {
    pub fn single(name: &'static str, accepts: &'static str) -> Self {
        ChildDescriptor {
            name,
            accepts,
            multiplicity: Multiplicity::Single,
            wrapper: None,
        }
    }

    pub fn many(name: &'static str, accepts: &'static str) -> Self {
        ChildDescriptor {
            name,
            accepts,
            multiplicity: Multiplicity::Many { structural: false },
            wrapper: None,
        }
    }

    pub fn structural(self) -> Self {
        ChildDescriptor {
            multiplicity: Multiplicity::Many { structural: true },
            ..self
        }
    }

    pub fn wrapped(self, wrapper: &'static str) -> Self {
        ChildDescriptor {
            wrapper: Some(wrapper),
            ..self
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.multiplicity, Multiplicity::Many { .. })
    }

    pub fn is_structural(&self) -> bool {
        self.multiplicity == Multiplicity::Many { structural: true }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn constrained(constraint: Constraint, value: f64) -> f64 {
        constraint
            .apply(FieldValue::Float(value))
            .and_then(|value| value.as_f64())
            .unwrap()
    }

    #[test]
    fn latitude_is_clamped() {
        assert_eq!(constrained(Constraint::Angle90, 95.0), 90.0);
        assert_eq!(constrained(Constraint::Angle90, -120.0), -90.0);
        assert_eq!(constrained(Constraint::AnglePos90, -3.0), 0.0);
    }

    #[test]
    fn longitude_wraps() {
        assert_eq!(constrained(Constraint::Angle180, 190.0), -170.0);
        assert_eq!(constrained(Constraint::Angle180, -190.0), 170.0);
        assert_eq!(constrained(Constraint::Angle180, 540.0), 180.0);
        assert_eq!(constrained(Constraint::Angle180, 45.0), 45.0);
    }

    #[test]
    fn heading_is_reduced() {
        assert_eq!(constrained(Constraint::Angle360, 370.0), 10.0);
        assert_eq!(constrained(Constraint::Angle360, -370.0), -10.0);
        assert_eq!(constrained(Constraint::Angle360, 360.0), 360.0);
    }

    #[test]
    fn integers_are_accepted_and_become_floats() {
        let value = Constraint::NonNegative.apply(FieldValue::Int(-4)).unwrap();
        assert_eq!(value, FieldValue::Float(0.0));
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert_eq!(Constraint::Angle90.apply(FieldValue::from("north")), None);
        assert_eq!(Constraint::Angle90.apply(FieldValue::Float(f64::NAN)), None);
    }

    #[test]
    fn unconstrained_values_pass_through() {
        let value = FieldValue::from("anything");
        assert_eq!(Constraint::None.apply(value.clone()), Some(value));
    }
}
