//! Narrow query boundary over the genealogy document.
//!
//! Records are raw: dates stay as document text and are interpreted by the
//! domain, so a bad date is a warning rather than a parse failure.

/// Raw surname as found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurnameRecord {
    pub name: String,
    pub derivation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonRecord {
    pub handle: String,
    /// Gender code, e.g. `M`, `F`, `U`
    pub gender: String,
    pub first_name: String,
    pub surnames: Vec<SurnameRecord>,
    /// `childof` references in document order
    pub child_of: Vec<String>,
    /// `parentin` references in document order
    pub parent_in: Vec<String>,
    pub event_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilyRecord {
    pub handle: String,
    pub id: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub children: Vec<String>,
    pub event_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventRecord {
    pub handle: String,
    /// Event type text, e.g. `Birth`
    pub kind: String,
    /// Date value text, if any
    pub date: Option<String>,
}

/// Event types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Birth,
    Death,
    Marriage,
}

impl EventKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim() {
            "Birth" => Some(EventKind::Birth),
            "Death" => Some(EventKind::Death),
            "Marriage" => Some(EventKind::Marriage),
            _ => None,
        }
    }
}

/// How the traversal root is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSelector {
    /// Family `id` attribute, e.g. `F0001`
    Id(String),
    /// Name of a tag applied to the family, e.g. `root`
    Tag(String),
}

impl std::fmt::Display for RootSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RootSelector::Id(id) => write!(f, "family#{}", id),
            RootSelector::Tag(tag) => write!(f, "family tagged '{}'", tag),
        }
    }
}

/// Lookup capability over a loaded genealogy document.
pub trait GenealogySource {
    fn person(&self, handle: &str) -> Option<PersonRecord>;

    fn family(&self, handle: &str) -> Option<FamilyRecord>;

    fn event(&self, handle: &str) -> Option<EventRecord>;

    /// Handle of the family with the given `id` attribute.
    fn family_by_id(&self, id: &str) -> Option<String>;

    /// Handle of the first family carrying a tag with this name.
    fn family_by_tag(&self, tag: &str) -> Option<String>;

    fn root_family(&self, selector: &RootSelector) -> Option<String> {
        match selector {
            RootSelector::Id(id) => self.family_by_id(id),
            RootSelector::Tag(tag) => self.family_by_tag(tag),
        }
    }
}
