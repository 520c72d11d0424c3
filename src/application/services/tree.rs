//! Tree service
//!
//! Builds a laid-out, dated tree from a genealogy source and applies
//! interactive edits (rotation, rescaling) on top of it.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument};

use crate::application::export::TreeExport;
use crate::application::overrides::{apply_overrides, record_angle, record_date, DateField};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{OverrideSettings, Settings};
use crate::domain::{
    apply_rotation, rotation_set, DomainError, Estimator, FamilyTree, GenealogySource, NodeId,
    RotationSet, TreeBuilder,
};

/// A loaded tree together with the overrides accumulated for it.
pub struct TreeService {
    tree: FamilyTree,
    estimator: Estimator,
    overrides: OverrideSettings,
}

impl TreeService {
    /// Traverse from the configured root, apply overrides and estimate dates.
    pub fn build(source: &dyn GenealogySource, settings: &Settings) -> ApplicationResult<Self> {
        Self::build_with(source, settings, Estimator::new(settings.estimation_params()))
    }

    /// Like [`TreeService::build`] with an explicit estimator (e.g. a fixed `today`).
    #[instrument(level = "debug", skip_all)]
    pub fn build_with(
        source: &dyn GenealogySource,
        settings: &Settings,
        estimator: Estimator,
    ) -> ApplicationResult<Self> {
        // without a configured year the centre is Jan 1 of the current year
        let mut scale = settings.scale_params();
        scale.max_year.get_or_insert(estimator.today().year());
        let tree = TreeBuilder::new(source)
            .with_layout(settings.layout_params())
            .with_scale(scale)
            .build(&settings.root.selector())?;
        info!(
            "built tree: {} people, {} families",
            tree.people().count(),
            tree.families().count()
        );

        let mut service = Self {
            tree,
            estimator,
            overrides: settings.overrides.clone(),
        };
        service.refresh()?;
        Ok(service)
    }

    /// Re-apply overrides and re-run the full estimation pass.
    fn refresh(&mut self) -> ApplicationResult<()> {
        apply_overrides(&mut self.tree, &self.overrides);
        self.estimator.estimate(&mut self.tree)?;
        Ok(())
    }

    pub fn tree(&self) -> &FamilyTree {
        &self.tree
    }

    /// Overrides accumulated so far, ready to be persisted.
    pub fn overrides(&self) -> &OverrideSettings {
        &self.overrides
    }

    pub fn node(&self, handle: &str) -> ApplicationResult<NodeId> {
        self.tree
            .node_id(handle)
            .ok_or_else(|| DomainError::UnknownNode(handle.to_string()).into())
    }

    pub fn rotation_set(&self, handle: &str) -> ApplicationResult<RotationSet> {
        let node = self.node(handle)?;
        Ok(rotation_set(&self.tree, node)?)
    }

    /// Rotate `handle` and everything that moves with it by `delta` degrees.
    #[instrument(level = "debug", skip(self))]
    pub fn rotate(&mut self, handle: &str, delta: f64) -> ApplicationResult<RotationSet> {
        let set = self.rotation_set(handle)?;
        apply_rotation(&mut self.tree, &set, delta);
        for node in set.iter() {
            record_angle(&mut self.overrides, &self.tree, *node);
        }
        debug!("rotated {} nodes by {}", set.len(), delta);
        Ok(set)
    }

    /// Move a date of `handle` to the one drawn at `radius` and re-estimate.
    #[instrument(level = "debug", skip(self))]
    pub fn rescale(
        &mut self,
        handle: &str,
        field: DateField,
        radius: f64,
    ) -> ApplicationResult<NaiveDate> {
        let node = self.node(handle)?;
        let scale = self.tree.scale().ok_or(ApplicationError::NoTimeScale)?;
        let date = scale.date_at(radius);
        record_date(&mut self.overrides, &self.tree, node, field, date)?;
        self.refresh()?;
        info!("{} of {} set to {}", field, handle, date);
        Ok(date)
    }

    pub fn export(&self) -> TreeExport {
        TreeExport::from_tree(&self.tree)
    }
}
