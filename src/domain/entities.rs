//! Domain entities: people, families and the links between them

use std::fmt;

use generational_arena::Index;

use crate::domain::date::DateInfo;

/// Arena id of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersonId(pub(crate) Index);

/// Arena id of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(pub(crate) Index);

/// Any node of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Person(PersonId),
    Family(FamilyId),
}

impl From<PersonId> for NodeId {
    fn from(id: PersonId) -> Self {
        NodeId::Person(id)
    }
}

impl From<FamilyId> for NodeId {
    fn from(id: FamilyId) -> Self {
        NodeId::Family(id)
    }
}

/// Registry slot: referenced-only, or populated from the document.
#[derive(Debug, Clone)]
pub enum Slot<T> {
    Stub(String),
    Complete(T),
}

impl<T: HasHandle> Slot<T> {
    pub fn handle(&self) -> &str {
        match self {
            Slot::Stub(handle) => handle,
            Slot::Complete(node) => node.handle(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Slot::Complete(_))
    }

    pub fn as_complete(&self) -> Option<&T> {
        match self {
            Slot::Complete(node) => Some(node),
            Slot::Stub(_) => None,
        }
    }

    pub fn as_complete_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Complete(node) => Some(node),
            Slot::Stub(_) => None,
        }
    }
}

pub trait HasHandle {
    fn handle(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    #[default]
    Female,
}

impl Gender {
    /// Document gender code; only `M` is male.
    pub fn from_code(code: &str) -> Self {
        if code.trim() == "M" {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Surname with its derivation tag (e.g. `Taken`, `Inherited`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surname {
    pub name: String,
    pub derivation: Option<String>,
}

impl Surname {
    pub fn is_taken(&self) -> bool {
        self.derivation.as_deref() == Some("Taken")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub handle: String,
    pub gender: Gender,
    /// Family in which this person is a child
    pub child_of: Option<FamilyId>,
    /// Family in which this person is a parent
    pub parent_in: Option<FamilyId>,
    /// Position in the diagram, degrees
    pub angle: f64,
    pub level: Option<i32>,
    /// Left (0) or right (1) slot among the parents of `parent_in`
    pub parent_order: Option<usize>,
    pub first_name: String,
    pub surnames: Vec<Surname>,
    pub birth: Option<DateInfo>,
    pub death: Option<DateInfo>,
}

impl Person {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> String {
        let surname = self.surnames.first().map(|s| s.name.as_str()).unwrap_or("");
        format!("{} {}", self.first_name, surname).trim().to_string()
    }
}

impl HasHandle for Person {
    fn handle(&self) -> &str {
        &self.handle
    }
}

#[derive(Debug, Clone, Default)]
pub struct Family {
    pub handle: String,
    /// Father slot first, mother second
    pub parents: Vec<PersonId>,
    pub children: Vec<PersonId>,
    pub marriage: Option<DateInfo>,
    pub name: String,
    /// Sector centre, degrees
    pub angle: f64,
    /// Sector width, degrees
    pub width: f64,
    pub level: Option<i32>,
}

impl Family {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            name: UNKNOWN_FAMILY_NAME.to_string(),
            ..Default::default()
        }
    }

    pub fn parent_index(&self, person: PersonId) -> Option<usize> {
        self.parents.iter().position(|p| *p == person)
    }

    pub fn child_index(&self, person: PersonId) -> Option<usize> {
        self.children.iter().position(|c| *c == person)
    }

    pub fn has_member(&self, person: PersonId) -> bool {
        self.parent_index(person).is_some() || self.child_index(person).is_some()
    }
}

impl HasHandle for Family {
    fn handle(&self) -> &str {
        &self.handle
    }
}

pub const UNKNOWN_FAMILY_NAME: &str = "Unknown";

/// Direction of a rendered link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// person → family in which they are a parent
    Parent,
    /// family → one of its children
    Child,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Parent => write!(f, "parent"),
            RelationKind::Child => write!(f, "child"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: RelationKind,
}
