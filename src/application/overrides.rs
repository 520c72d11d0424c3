//! User corrections: applying them to a tree and recording new ones.

use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::OverrideSettings;
use crate::domain::date::{parse_date_text, DateInfo};
use crate::domain::{FamilyTree, NodeId};

/// A date slot that can be corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Birth,
    Death,
    Marriage,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Birth => write!(f, "birth"),
            DateField::Death => write!(f, "death"),
            DateField::Marriage => write!(f, "marriage"),
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn override_date(handle: &str, field: DateField, text: Option<&str>) -> Option<NaiveDate> {
    let text = text?;
    let date = parse_date_text(text);
    if date.is_none() {
        warn!("ignoring {} override '{}' for {}", field, text, handle);
    }
    date
}

/// Apply overrides to complete nodes; unknown handles are skipped.
///
/// Returns the number of nodes touched.
pub fn apply_overrides(tree: &mut FamilyTree, overrides: &OverrideSettings) -> usize {
    let mut applied = 0;
    let mut dates = Vec::new();

    for (handle, entry) in &overrides.people {
        let Some(person) = tree.person_id(handle).and_then(|id| tree.person_mut(id)) else {
            warn!("override for unknown person: {}", handle);
            continue;
        };
        if let Some(angle) = entry.angle {
            person.angle = angle;
        }
        if let Some(date) = override_date(handle, DateField::Birth, entry.birth.as_deref()) {
            person.birth = Some(DateInfo::overridden(date));
            dates.push(date);
        }
        if let Some(date) = override_date(handle, DateField::Death, entry.death.as_deref()) {
            person.death = Some(DateInfo::overridden(date));
            dates.push(date);
        }
        applied += 1;
    }

    for (handle, entry) in &overrides.families {
        let Some(family) = tree.family_id(handle).and_then(|id| tree.family_mut(id)) else {
            warn!("override for unknown family: {}", handle);
            continue;
        };
        if let Some(angle) = entry.angle {
            family.angle = angle;
        }
        if let Some(date) = override_date(handle, DateField::Marriage, entry.marriage.as_deref()) {
            family.marriage = Some(DateInfo::overridden(date));
            dates.push(date);
        }
        applied += 1;
    }

    for date in dates {
        tree.extend_date_range(date);
    }
    debug!("applied overrides to {} nodes", applied);
    applied
}

/// Record a date correction for `node`.
pub fn record_date(
    overrides: &mut OverrideSettings,
    tree: &FamilyTree,
    node: NodeId,
    field: DateField,
    date: NaiveDate,
) -> ApplicationResult<()> {
    let handle = tree.handle_of(node).unwrap_or_default().to_string();
    let text = Some(format_date(date));
    match (node, field) {
        (NodeId::Person(_), DateField::Birth) => {
            overrides.people.entry(handle).or_default().birth = text;
        }
        (NodeId::Person(_), DateField::Death) => {
            overrides.people.entry(handle).or_default().death = text;
        }
        (NodeId::Family(_), DateField::Marriage) => {
            overrides.families.entry(handle).or_default().marriage = text;
        }
        _ => {
            return Err(ApplicationError::InvalidField {
                handle,
                field: field.to_string(),
            })
        }
    }
    Ok(())
}

/// Record the current angle of `node`.
pub fn record_angle(overrides: &mut OverrideSettings, tree: &FamilyTree, node: NodeId) {
    match node {
        NodeId::Person(id) => {
            if let Some(person) = tree.person(id) {
                overrides.people.entry(person.handle.clone()).or_default().angle = Some(person.angle);
            }
        }
        NodeId::Family(id) => {
            if let Some(family) = tree.family(id) {
                overrides.families.entry(family.handle.clone()).or_default().angle =
                    Some(family.angle);
            }
        }
    }
}
