//! Tree builder: breadth-first discovery of the family graph from a root
//! family, assigning sectors, angles and levels as families are visited.

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::domain::date::{parse_date_text, DateInfo};
use crate::domain::entities::{
    Family, FamilyId, Gender, Person, PersonId, RelationKind, Surname, UNKNOWN_FAMILY_NAME,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::queue::{FamilyQueue, FamilyVisit};
use crate::domain::registry::{FamilyTree, ScaleParams};
use crate::domain::source::{EventKind, GenealogySource, RootSelector};

/// Layout constraints applied while placing families.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutParams {
    /// Minimum arc length of a family sector, in scale units
    pub min_family_width: Option<f64>,
}

/// Builds a [`FamilyTree`] by visiting families outward from the root.
pub struct TreeBuilder<'a, S: GenealogySource + ?Sized> {
    source: &'a S,
    queue: FamilyQueue,
    layout: LayoutParams,
    scale: ScaleParams,
}

impl<'a, S: GenealogySource + ?Sized> TreeBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            queue: FamilyQueue::new(),
            layout: LayoutParams::default(),
            scale: ScaleParams::default(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutParams) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_scale(mut self, scale: ScaleParams) -> Self {
        self.scale = scale;
        self
    }

    /// Discover every family reachable from the root and place it.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&mut self, root: &RootSelector) -> DomainResult<FamilyTree> {
        let mut tree = FamilyTree::new(self.scale);

        let root_handle = self
            .source
            .root_family(root)
            .ok_or_else(|| DomainError::RootFamilyNotFound(root.to_string()))?;
        debug!("root family: {}", root_handle);
        let root_id = tree.ensure_family(&root_handle);
        tree.set_root(root_id);

        self.queue = FamilyQueue::new();
        self.queue.push(
            &root_handle,
            FamilyVisit {
                level: 1,
                origin: None,
            },
        );

        while let Some(handle) = self.queue.next_handle() {
            let visit = self
                .queue
                .take(&handle)
                .ok_or_else(|| DomainError::MissingQueuedFamily(handle.clone()))?;
            self.visit_family(&mut tree, &handle, visit)?;
            debug!("families left: {}", self.queue.len());
        }

        Ok(tree)
    }

    fn visit_family(
        &mut self,
        tree: &mut FamilyTree,
        handle: &str,
        visit: FamilyVisit,
    ) -> DomainResult<()> {
        let family_id = tree.ensure_family(handle);
        if tree.is_family_complete(family_id) {
            debug!("family {} already processed", handle);
            return Ok(());
        }
        self.complete_family(tree, family_id, handle)?;

        let family = tree
            .family(family_id)
            .ok_or_else(|| DomainError::FamilyNotInDocument(handle.to_string()))?;
        let parents = family.parents.clone();
        let children = family.children.clone();

        let width = self.sector_width(tree, family, visit.level);
        let center = match visit.origin {
            None => 180.0,
            Some(origin) => {
                let origin_angle = tree.person(origin).map(|p| p.angle).unwrap_or_default();
                sector_center(tree, family, origin, origin_angle, width)?
            }
        };
        debug!(
            "family {}: width {:.2}, center {:.2}, level {}",
            handle, width, center, visit.level
        );

        if let Some(family) = tree.family_mut(family_id) {
            family.level = Some(visit.level);
            family.angle = center;
            family.width = width;
        }

        for (k, &parent) in parents.iter().enumerate() {
            tree.add_link(parent.into(), family_id.into(), RelationKind::Parent);
            if visit.origin == Some(parent) {
                continue;
            }
            if let Some(person) = tree.person_mut(parent) {
                person.angle = center + (k as f64 - 0.5) * width;
                person.parent_order = Some(k);
            }
            self.place_level(tree, parent, visit.level);
            self.enqueue_relative(tree, parent, Relative::ChildOf);
        }

        let slots = children.len() as f64 + 1.0;
        for (k, &child) in children.iter().enumerate() {
            tree.add_link(family_id.into(), child.into(), RelationKind::Child);
            if visit.origin == Some(child) {
                continue;
            }
            if let Some(person) = tree.person_mut(child) {
                person.angle = center - width / 2.0 + width / slots * (k as f64 + 1.0);
            }
            self.place_level(tree, child, visit.level - 1);
            self.enqueue_relative(tree, child, Relative::ParentIn);
        }

        Ok(())
    }

    /// `360 / 2^level`, widened to honour the minimum arc length at the
    /// radius of a documented marriage.
    fn sector_width(&self, tree: &FamilyTree, family: &Family, level: i32) -> f64 {
        let width = 360.0 / 2f64.powi(level);
        let (Some(min_arc), Some(marriage), Some(scale)) =
            (self.layout.min_family_width, family.marriage, tree.scale())
        else {
            return width;
        };
        if marriage.is_estimate {
            return width;
        }
        let radius = scale.radius(marriage.date);
        if radius <= 0.0 {
            return width;
        }
        width.max((min_arc / radius).to_degrees())
    }

    fn place_level(&self, tree: &mut FamilyTree, id: PersonId, level: i32) {
        if tree.person(id).is_some_and(|p| p.level.is_none()) {
            tree.set_level(id, level);
        }
    }

    fn enqueue_relative(&mut self, tree: &FamilyTree, id: PersonId, relative: Relative) {
        let Some(person) = tree.person(id) else {
            return;
        };
        // a child's own family shares the child's generation
        let (next, offset) = match relative {
            Relative::ChildOf => (person.child_of, 1),
            Relative::ParentIn => (person.parent_in, 0),
        };
        let Some(next) = next else {
            return;
        };
        if tree.is_family_complete(next) {
            return;
        }
        let (Some(handle), Some(level)) = (tree.family_slot(next).map(|s| s.handle()), person.level)
        else {
            return;
        };
        self.queue.push(
            handle,
            FamilyVisit {
                level: level + offset,
                origin: Some(id),
            },
        );
    }

    fn complete_family(
        &self,
        tree: &mut FamilyTree,
        id: FamilyId,
        handle: &str,
    ) -> DomainResult<()> {
        let record = self
            .source
            .family(handle)
            .ok_or_else(|| DomainError::FamilyNotInDocument(handle.to_string()))?;
        debug!("family: {}", handle);

        let mut family = Family::new(handle);
        for parent in record.father.iter().chain(record.mother.iter()) {
            let pid = tree.ensure_person(parent);
            self.complete_person(tree, pid);
            family.parents.push(pid);
        }

        for event_ref in &record.event_refs {
            match self.read_event(event_ref) {
                Some((EventKind::Marriage, date)) => {
                    family.marriage = Some(DateInfo::known(date));
                    tree.extend_date_range(date);
                }
                Some((kind, _)) => debug!("unhandled family event {:?} on {}", kind, handle),
                None => {}
            }
        }

        for child in &record.children {
            let pid = tree.ensure_person(child);
            self.complete_person(tree, pid);
            family.children.push(pid);
        }

        family.name = family
            .parents
            .iter()
            .filter_map(|p| tree.person(*p))
            .find_map(|p| p.surnames.iter().find(|s| s.is_taken()).map(|s| s.name.clone()))
            .unwrap_or_else(|| UNKNOWN_FAMILY_NAME.to_string());

        tree.complete_family(id, family);
        Ok(())
    }

    fn complete_person(&self, tree: &mut FamilyTree, id: PersonId) {
        let Some(slot) = tree.person_slot(id) else {
            return;
        };
        if slot.is_complete() {
            return;
        }
        let handle = slot.handle().to_string();

        let Some(record) = self.source.person(&handle) else {
            warn!("empty person handle: {}", handle);
            tree.complete_person(id, Person::new(&handle));
            return;
        };

        let mut person = Person::new(&handle);
        person.gender = Gender::from_code(&record.gender);
        person.first_name = record.first_name.clone();
        person.surnames = record
            .surnames
            .iter()
            .map(|s| Surname {
                name: s.name.clone(),
                derivation: s.derivation.clone(),
            })
            .collect();

        if record.child_of.len() > 1 {
            debug!("{} is a child in {} families, using the first", handle, record.child_of.len());
        }
        if record.parent_in.len() > 1 {
            debug!("{} is a parent in {} families, using the first", handle, record.parent_in.len());
        }
        person.child_of = record.child_of.first().map(|f| tree.ensure_family(f));
        person.parent_in = record.parent_in.first().map(|f| tree.ensure_family(f));

        for event_ref in &record.event_refs {
            match self.read_event(event_ref) {
                Some((EventKind::Birth, date)) => {
                    person.birth = Some(DateInfo::known(date));
                    tree.extend_date_range(date);
                }
                Some((EventKind::Death, date)) => {
                    person.death = Some(DateInfo::known(date));
                    tree.extend_date_range(date);
                }
                Some((kind, _)) => debug!("unhandled person event {:?} on {}", kind, handle),
                None => {}
            }
        }

        debug!("person: {} {}", handle, person.display_name());
        tree.complete_person(id, person);
    }

    /// A recognised, dated event. Everything else is logged and skipped.
    fn read_event(&self, handle: &str) -> Option<(EventKind, NaiveDate)> {
        let Some(event) = self.source.event(handle) else {
            warn!("missing event: {}", handle);
            return None;
        };
        let Some(kind) = EventKind::parse(&event.kind) else {
            debug!("unhandled event type '{}' ({})", event.kind, handle);
            return None;
        };
        let Some(text) = event.date.as_deref() else {
            warn!("{:?} event {} has no date", kind, handle);
            return None;
        };
        match parse_date_text(text) {
            Some(date) => Some((kind, date)),
            None => {
                warn!("unparseable date '{}' on {:?} event {}", text, kind, handle);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Relative {
    ChildOf,
    ParentIn,
}

/// Centre of a sector reached through an already placed person.
fn sector_center(
    tree: &FamilyTree,
    family: &Family,
    origin: PersonId,
    origin_angle: f64,
    width: f64,
) -> DomainResult<f64> {
    if let Some(k) = family.parent_index(origin) {
        let side = if k == 1 { -1.0 } else { 1.0 };
        return Ok(origin_angle + side * width / 2.0);
    }
    if let Some(k) = family.child_index(origin) {
        let slots = family.children.len() as f64 + 1.0;
        return Ok(origin_angle - (k as f64 + 1.0) / slots * width + width / 2.0);
    }
    Err(DomainError::SourcePersonNotInFamily {
        family: family.handle.clone(),
        person: tree.handle_of(origin.into()).unwrap_or_default().to_string(),
    })
}
