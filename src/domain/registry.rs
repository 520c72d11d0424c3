//! The tree registry: single source of truth for every discovered node.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use generational_arena::Arena;
use tracing::{debug, instrument, warn};

use crate::domain::date::mean_date;
use crate::domain::entities::{
    Family, FamilyId, Link, NodeId, Person, PersonId, RelationKind, Slot,
};
use crate::domain::scale::{TimeScale, DEFAULT_UNITS_PER_YEAR};

/// Parameters of the derived time scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub units_per_year: f64,
    /// Year drawn at the centre; the latest date of the range when unset
    pub max_year: Option<i32>,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            units_per_year: DEFAULT_UNITS_PER_YEAR,
            max_year: None,
        }
    }
}

/// All people and families of one loaded document, keyed by handle.
#[derive(Debug, Default)]
pub struct FamilyTree {
    people: Arena<Slot<Person>>,
    families: Arena<Slot<Family>>,
    person_handles: HashMap<String, PersonId>,
    family_handles: HashMap<String, FamilyId>,
    links: Vec<Link>,
    date_range: Option<(NaiveDate, NaiveDate)>,
    scale_params: ScaleParams,
    scale: Option<TimeScale>,
    levels: BTreeMap<i32, Vec<PersonId>>,
    root: Option<FamilyId>,
}

impl FamilyTree {
    pub fn new(scale_params: ScaleParams) -> Self {
        Self {
            scale_params,
            ..Default::default()
        }
    }

    /// Id for `handle`, registering a stub on first reference.
    pub fn ensure_person(&mut self, handle: &str) -> PersonId {
        if let Some(id) = self.person_handles.get(handle) {
            return *id;
        }
        debug!("person ref: {}", handle);
        let id = PersonId(self.people.insert(Slot::Stub(handle.to_string())));
        self.person_handles.insert(handle.to_string(), id);
        id
    }

    /// Id for `handle`, registering a stub on first reference.
    pub fn ensure_family(&mut self, handle: &str) -> FamilyId {
        if let Some(id) = self.family_handles.get(handle) {
            return *id;
        }
        debug!("family ref: {}", handle);
        let id = FamilyId(self.families.insert(Slot::Stub(handle.to_string())));
        self.family_handles.insert(handle.to_string(), id);
        id
    }

    /// Replace a stub with its populated person.
    ///
    /// Returns `false` and leaves the registry untouched when the slot is
    /// already complete or the handle does not match the slot.
    #[instrument(level = "trace", skip(self, person), fields(handle = %person.handle))]
    pub fn complete_person(&mut self, id: PersonId, person: Person) -> bool {
        let Some(slot) = self.people.get_mut(id.0) else {
            warn!("no registry slot for person: {}", person.handle);
            return false;
        };
        if slot.is_complete() || slot.handle() != person.handle {
            warn!(
                "trying to add the same person twice: {} (slot {})",
                person.handle,
                slot.handle()
            );
            return false;
        }
        *slot = Slot::Complete(person);
        true
    }

    /// Replace a stub with its populated family. See [`FamilyTree::complete_person`].
    #[instrument(level = "trace", skip(self, family), fields(handle = %family.handle))]
    pub fn complete_family(&mut self, id: FamilyId, family: Family) -> bool {
        let Some(slot) = self.families.get_mut(id.0) else {
            warn!("no registry slot for family: {}", family.handle);
            return false;
        };
        if slot.is_complete() || slot.handle() != family.handle {
            warn!(
                "trying to add the same family twice: {} (slot {})",
                family.handle,
                slot.handle()
            );
            return false;
        }
        *slot = Slot::Complete(family);
        true
    }

    /// Family the traversal started from.
    pub fn root(&self) -> Option<FamilyId> {
        self.root
    }

    pub fn set_root(&mut self, id: FamilyId) {
        self.root = Some(id);
    }

    pub fn person_id(&self, handle: &str) -> Option<PersonId> {
        self.person_handles.get(handle).copied()
    }

    pub fn family_id(&self, handle: &str) -> Option<FamilyId> {
        self.family_handles.get(handle).copied()
    }

    /// Resolve a handle to a node, people first.
    pub fn node_id(&self, handle: &str) -> Option<NodeId> {
        self.person_id(handle)
            .map(NodeId::Person)
            .or_else(|| self.family_id(handle).map(NodeId::Family))
    }

    pub fn person_slot(&self, id: PersonId) -> Option<&Slot<Person>> {
        self.people.get(id.0)
    }

    pub fn family_slot(&self, id: FamilyId) -> Option<&Slot<Family>> {
        self.families.get(id.0)
    }

    /// A complete person.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(id.0).and_then(Slot::as_complete)
    }

    pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.get_mut(id.0).and_then(Slot::as_complete_mut)
    }

    /// A complete family.
    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(id.0).and_then(Slot::as_complete)
    }

    pub fn family_mut(&mut self, id: FamilyId) -> Option<&mut Family> {
        self.families.get_mut(id.0).and_then(Slot::as_complete_mut)
    }

    pub fn is_person_complete(&self, id: PersonId) -> bool {
        self.person_slot(id).is_some_and(Slot::is_complete)
    }

    pub fn is_family_complete(&self, id: FamilyId) -> bool {
        self.family_slot(id).is_some_and(Slot::is_complete)
    }

    /// Complete people in registration order.
    pub fn people(&self) -> impl Iterator<Item = (PersonId, &Person)> {
        self.people
            .iter()
            .filter_map(|(idx, slot)| slot.as_complete().map(|p| (PersonId(idx), p)))
    }

    /// Complete families in registration order.
    pub fn families(&self) -> impl Iterator<Item = (FamilyId, &Family)> {
        self.families
            .iter()
            .filter_map(|(idx, slot)| slot.as_complete().map(|f| (FamilyId(idx), f)))
    }

    pub fn person_ids(&self) -> Vec<PersonId> {
        self.people().map(|(id, _)| id).collect()
    }

    pub fn family_ids(&self) -> Vec<FamilyId> {
        self.families().map(|(id, _)| id).collect()
    }

    /// Number of registered people, stubs included.
    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    /// Number of registered families, stubs included.
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn stub_count(&self) -> usize {
        self.people.iter().filter(|(_, s)| !s.is_complete()).count()
            + self.families.iter().filter(|(_, s)| !s.is_complete()).count()
    }

    pub fn handle_of(&self, node: NodeId) -> Option<&str> {
        match node {
            NodeId::Person(id) => self.person_slot(id).map(Slot::handle),
            NodeId::Family(id) => self.family_slot(id).map(Slot::handle),
        }
    }

    pub fn add_link(&mut self, source: NodeId, target: NodeId, kind: RelationKind) {
        self.links.push(Link {
            source,
            target,
            kind,
        });
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Earliest and latest non-estimated date seen so far.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    /// Widen the date range and recompute the time scale if it changed.
    pub fn extend_date_range(&mut self, date: NaiveDate) {
        let next = match self.date_range {
            Some((min, max)) => (min.min(date), max.max(date)),
            None => (date, date),
        };
        if self.date_range != Some(next) {
            self.date_range = Some(next);
            self.rescale();
        }
    }

    pub fn scale_params(&self) -> ScaleParams {
        self.scale_params
    }

    pub fn scale(&self) -> Option<&TimeScale> {
        self.scale.as_ref()
    }

    fn rescale(&mut self) {
        self.scale = self.date_range.map(|(min, max)| {
            let center = self
                .scale_params
                .max_year
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
                .unwrap_or(max);
            TimeScale::new(min, center, self.scale_params.units_per_year)
        });
        if let Some(scale) = &self.scale {
            debug!(
                "time scale: {} .. {} (outer radius {:.1})",
                scale.start.year(),
                scale.center.year(),
                scale.outer_radius()
            );
        }
    }

    /// Record the generation of a person, moving them if it changed.
    pub fn set_level(&mut self, id: PersonId, level: i32) {
        let previous = match self.person_mut(id) {
            Some(person) => person.level.replace(level),
            None => return,
        };
        if previous == Some(level) {
            return;
        }
        if let Some(old) = previous {
            if let Some(members) = self.levels.get_mut(&old) {
                members.retain(|p| *p != id);
            }
        }
        self.levels.entry(level).or_default().push(id);
    }

    pub fn levels(&self) -> &BTreeMap<i32, Vec<PersonId>> {
        &self.levels
    }

    pub fn max_level(&self) -> Option<i32> {
        self.levels.keys().next_back().copied()
    }

    pub fn min_level(&self) -> Option<i32> {
        self.levels.keys().next().copied()
    }

    /// Mean birth date of the people on a level, a default for undated people.
    pub fn level_average_birth(&self, level: i32) -> Option<NaiveDate> {
        let births: Vec<NaiveDate> = self
            .levels
            .get(&level)?
            .iter()
            .filter_map(|id| self.person(*id))
            .filter_map(|p| p.birth.map(|b| b.date))
            .collect();
        mean_date(&births)
    }
}
