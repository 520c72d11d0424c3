//! Date inference over the whole tree.
//!
//! A pass always starts by stripping previous estimates, so running it twice
//! gives the same result as running it once. Document dates and user
//! overrides are never replaced.

use chrono::{Local, NaiveDate};
use tracing::{debug, instrument};

use crate::domain::date::{
    add_years, is_estimable, known_date, mean_date, years_between, DateInfo, LifespanAnchor,
    LifespanModel,
};
use crate::domain::entities::{FamilyId, PersonId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::registry::FamilyTree;

/// Offsets (in years) used when inferring dates.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationParams {
    pub parent_age_at_marriage: f64,
    pub child_after_marriage: f64,
    pub sibling_spacing: f64,
    /// Multiple of the expected lifespan after which a person counts as dead
    pub living_factor: f64,
    pub lifespan: LifespanModel,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            parent_age_at_marriage: 25.0,
            child_after_marriage: 5.0,
            sibling_spacing: 2.0,
            living_factor: 1.5,
            lifespan: LifespanModel::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Estimator {
    params: EstimationParams,
    today: NaiveDate,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EstimationParams::default())
    }
}

impl Estimator {
    pub fn new(params: EstimationParams) -> Self {
        Self {
            params,
            today: Local::now().date_naive(),
        }
    }

    /// Fix the reference date used for the living check.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn params(&self) -> &EstimationParams {
        &self.params
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Full inference pass: persons, families to a fixpoint, persons again.
    #[instrument(level = "debug", skip_all)]
    pub fn estimate(&self, tree: &mut FamilyTree) -> DomainResult<()> {
        clear_estimates(tree);

        for id in tree.person_ids() {
            self.estimate_person(tree, id);
        }
        self.estimate_families(tree)?;
        for id in tree.person_ids() {
            self.estimate_person(tree, id);
        }

        match tree.people().find(|(_, p)| p.birth.is_none()) {
            Some((_, person)) => Err(DomainError::MissingBirth(person.handle.clone())),
            None => Ok(()),
        }
    }

    /// Person rules in priority order. Never fails; gaps are left for the
    /// family sweep.
    pub fn estimate_person(&self, tree: &mut FamilyTree, id: PersonId) {
        let Some(person) = tree.person(id) else {
            return;
        };
        let own_marriage = person
            .parent_in
            .and_then(|f| tree.family(f))
            .and_then(|f| known_date(&f.marriage));
        let parents_marriage = person
            .child_of
            .and_then(|f| tree.family(f))
            .and_then(|f| known_date(&f.marriage));
        let mut birth = person.birth;
        let mut death = person.death;
        let p = &self.params;

        if birth.is_none() {
            if let Some(marriage) = own_marriage {
                birth = Some(DateInfo::estimate(add_years(
                    marriage,
                    -p.parent_age_at_marriage,
                )));
            }
        }

        if is_estimable(&birth) {
            if let Some(marriage) = parents_marriage {
                let candidate = add_years(marriage, p.child_after_marriage);
                if birth.map_or(true, |b| candidate > b.date) {
                    birth = Some(DateInfo::estimate(candidate));
                }
            }
        }

        if birth.is_none() {
            if let Some(d) = death {
                let years = p.lifespan.estimate(LifespanAnchor::Death(d.date));
                birth = Some(DateInfo::estimate(add_years(d.date, -years)));
            }
        }

        let mut living = false;
        if is_estimable(&death) {
            if let Some(b) = birth {
                let limit = p.lifespan.estimate(LifespanAnchor::Death(self.today)) * p.living_factor;
                if years_between(b.date, self.today) > limit {
                    let years = p.lifespan.estimate(LifespanAnchor::Birth(b.date));
                    death = Some(DateInfo::estimate(add_years(b.date, years)));
                } else {
                    death = None;
                    living = true;
                }
            }
        }

        if let Some(person) = tree.person_mut(id) {
            person.birth = birth;
            person.death = death;
        }
        if living {
            tree.extend_date_range(self.today);
        }
    }

    /// Sweep families in registry order until nothing changes.
    fn estimate_families(&self, tree: &mut FamilyTree) -> DomainResult<()> {
        let mut pending = tree.family_ids();
        let mut round = 0;
        while !pending.is_empty() {
            round += 1;
            let before = pending.len();
            let mut unresolved = Vec::new();
            for id in pending {
                if self.settle_marriage(tree, id) {
                    self.propagate_marriage(tree, id);
                } else {
                    unresolved.push(id);
                }
            }
            debug!("family sweep {}: {} -> {} pending", round, before, unresolved.len());
            if unresolved.len() == before {
                let handle = tree
                    .family(unresolved[0])
                    .map(|f| f.handle.clone())
                    .unwrap_or_default();
                return Err(DomainError::NoMarriageEvidence(handle));
            }
            pending = unresolved;
        }
        Ok(())
    }

    /// True once the family holds a marriage date.
    fn settle_marriage(&self, tree: &mut FamilyTree, id: FamilyId) -> bool {
        let Some(family) = tree.family(id) else {
            return true;
        };
        if !is_estimable(&family.marriage) {
            return true;
        }
        match self.infer_marriage(tree, id) {
            Some(date) => {
                if let Some(family) = tree.family_mut(id) {
                    debug!("marriage of {} estimated at {}", family.handle, date);
                    family.marriage = Some(DateInfo::estimate(date));
                }
                true
            }
            None => false,
        }
    }

    fn infer_marriage(&self, tree: &FamilyTree, id: FamilyId) -> Option<NaiveDate> {
        let family = tree.family(id)?;
        let p = &self.params;
        let births = |members: &[PersonId]| -> Vec<DateInfo> {
            members
                .iter()
                .filter_map(|m| tree.person(*m))
                .filter_map(|m| m.birth)
                .collect()
        };
        let documented = |dates: &[DateInfo]| -> Vec<NaiveDate> {
            dates.iter().filter(|d| !d.is_estimate).map(|d| d.date).collect()
        };
        let children = births(&family.children);
        let parents = births(&family.parents);

        if let Some(earliest) = documented(&children).into_iter().min() {
            return Some(add_years(earliest, -p.child_after_marriage));
        }
        if let Some(mean) = mean_date(&documented(&parents)) {
            return Some(add_years(mean, p.parent_age_at_marriage));
        }

        let all = |dates: &[DateInfo]| -> Vec<NaiveDate> { dates.iter().map(|d| d.date).collect() };
        let mut candidates = Vec::new();
        if let Some(mean) = mean_date(&all(&parents)) {
            candidates.push(add_years(mean, p.parent_age_at_marriage));
        }
        if let Some(earliest) = all(&children).into_iter().min() {
            candidates.push(add_years(earliest, -p.child_after_marriage));
        }
        mean_date(&candidates)
    }

    /// Give undated parents and children a birth derived from the marriage.
    fn propagate_marriage(&self, tree: &mut FamilyTree, id: FamilyId) {
        let Some(family) = tree.family(id) else {
            return;
        };
        let Some(marriage) = family.marriage.map(|m| m.date) else {
            return;
        };
        let parents = family.parents.clone();
        let children = family.children.clone();
        let p = &self.params;

        for parent in parents {
            if let Some(person) = tree.person_mut(parent) {
                if person.birth.is_none() {
                    person.birth = Some(DateInfo::estimate(add_years(
                        marriage,
                        -p.parent_age_at_marriage,
                    )));
                }
            }
        }

        let mut undated = 0;
        for child in children {
            if let Some(person) = tree.person_mut(child) {
                if person.birth.is_none() {
                    let offset = p.child_after_marriage + undated as f64 * p.sibling_spacing;
                    person.birth = Some(DateInfo::estimate(add_years(marriage, offset)));
                    undated += 1;
                }
            }
        }
    }
}

/// Remove every estimate that was not overridden.
pub fn clear_estimates(tree: &mut FamilyTree) {
    let strip = |info: &mut Option<DateInfo>| {
        if info.is_some_and(|d| d.is_replaceable()) {
            *info = None;
        }
    };
    for id in tree.person_ids() {
        if let Some(person) = tree.person_mut(id) {
            strip(&mut person.birth);
            strip(&mut person.death);
        }
    }
    for id in tree.family_ids() {
        if let Some(family) = tree.family_mut(id) {
            strip(&mut family.marriage);
        }
    }
}
