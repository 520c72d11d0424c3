//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rsfam/rsfam.toml`
//! 3. Local config: `./rsfam.toml` or an explicit `--config` file
//! 4. Environment variables: `RSFAM_*` prefix

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::date::{CalibrationPoint, DEFAULT_CALIBRATION, DEFAULT_MIN_LIFESPAN};
use crate::domain::scale::DEFAULT_UNITS_PER_YEAR;
use crate::domain::{EstimationParams, LayoutParams, LifespanModel, RootSelector, ScaleParams};

pub const DEFAULT_ROOT_TAG: &str = "root";

/// How the root family is located in the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RootSettings {
    /// Family `id` attribute; takes precedence over `tag`
    pub family_id: Option<String>,
    /// Name of the tag marking the root family
    pub tag: String,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            family_id: None,
            tag: DEFAULT_ROOT_TAG.into(),
        }
    }
}

impl RootSettings {
    pub fn selector(&self) -> RootSelector {
        match &self.family_id {
            Some(id) => RootSelector::Id(id.clone()),
            None => RootSelector::Tag(self.tag.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Radial units per year of the time scale
    pub units_per_year: f64,
    /// Year drawn at the centre (default: the current year)
    pub max_year: Option<i32>,
    /// Minimum arc length of a family sector
    pub min_family_width: Option<f64>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            units_per_year: DEFAULT_UNITS_PER_YEAR,
            max_year: None,
            min_family_width: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimationSettings {
    pub parent_age_at_marriage: f64,
    pub child_after_marriage: f64,
    pub sibling_spacing: f64,
    pub min_lifespan: f64,
    pub living_factor: f64,
    /// `(year, lifespan)` anchors of the lifespan model
    pub calibration: Vec<CalibrationPoint>,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        let params = EstimationParams::default();
        Self {
            parent_age_at_marriage: params.parent_age_at_marriage,
            child_after_marriage: params.child_after_marriage,
            sibling_spacing: params.sibling_spacing,
            min_lifespan: DEFAULT_MIN_LIFESPAN,
            living_factor: params.living_factor,
            calibration: DEFAULT_CALIBRATION.to_vec(),
        }
    }
}

/// User corrections for one person. Dates are `YYYY[-MM[-DD]]` text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PersonOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<String>,
}

impl PersonOverride {
    /// Fields set in `overlay` win.
    pub fn merge(&self, overlay: &PersonOverride) -> Self {
        Self {
            angle: overlay.angle.or(self.angle),
            birth: overlay.birth.clone().or_else(|| self.birth.clone()),
            death: overlay.death.clone().or_else(|| self.death.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FamilyOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marriage: Option<String>,
}

impl FamilyOverride {
    /// Fields set in `overlay` win.
    pub fn merge(&self, overlay: &FamilyOverride) -> Self {
        Self {
            angle: overlay.angle.or(self.angle),
            marriage: overlay.marriage.clone().or_else(|| self.marriage.clone()),
        }
    }
}

/// Overrides keyed by document handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OverrideSettings {
    pub people: BTreeMap<String, PersonOverride>,
    pub families: BTreeMap<String, FamilyOverride>,
}

impl OverrideSettings {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.families.is_empty()
    }

    /// The table as an `[overrides]` section, ready to paste into a config file.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        #[derive(Serialize)]
        struct Section<'a> {
            overrides: &'a OverrideSettings,
        }
        toml::to_string_pretty(&Section { overrides: self }).map_err(|e| ApplicationError::Config {
            message: format!("serialize overrides: {e}"),
        })
    }

    /// Per-handle merge; fields set in `overlay` win.
    pub fn merge(&self, overlay: &OverrideSettings) -> Self {
        let mut merged = self.clone();
        for (handle, entry) in &overlay.people {
            let base = merged.people.remove(handle).unwrap_or_default();
            merged.people.insert(handle.clone(), base.merge(entry));
        }
        for (handle, entry) in &overlay.families {
            let base = merged.families.remove(handle).unwrap_or_default();
            merged.families.insert(handle.clone(), base.merge(entry));
        }
        merged
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRootSettings {
    pub family_id: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutSettings {
    pub units_per_year: Option<f64>,
    pub max_year: Option<i32>,
    pub min_family_width: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawEstimationSettings {
    pub parent_age_at_marriage: Option<f64>,
    pub child_after_marriage: Option<f64>,
    pub sibling_spacing: Option<f64>,
    pub min_lifespan: Option<f64>,
    pub living_factor: Option<f64>,
    pub calibration: Option<Vec<CalibrationPoint>>,
}

/// Raw settings for intermediate parsing: `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_path: Option<PathBuf>,
    pub root: RawRootSettings,
    pub layout: RawLayoutSettings,
    pub estimation: RawEstimationSettings,
    pub overrides: OverrideSettings,
}

/// Unified configuration for rsfam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Gramps XML document used when no file is given on the command line
    pub data_path: Option<PathBuf>,
    pub root: RootSettings,
    pub layout: LayoutSettings,
    pub estimation: EstimationSettings,
    pub overrides: OverrideSettings,
}

/// Get the XDG config directory for rsfam.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rsfam").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rsfam.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join("rsfam.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn scale_params(&self) -> ScaleParams {
        ScaleParams {
            units_per_year: self.layout.units_per_year,
            max_year: self.layout.max_year,
        }
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            min_family_width: self.layout.min_family_width,
        }
    }

    pub fn estimation_params(&self) -> EstimationParams {
        let e = &self.estimation;
        EstimationParams {
            parent_age_at_marriage: e.parent_age_at_marriage,
            child_after_marriage: e.child_after_marriage,
            sibling_spacing: e.sibling_spacing,
            living_factor: e.living_factor,
            lifespan: LifespanModel::new(e.calibration.clone(), e.min_lifespan),
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.data_path {
            let raw = path.to_string_lossy().to_string();
            let expanded = shellexpand::full(&raw)
                .map(|s| s.into_owned())
                .unwrap_or(raw);
            self.data_path = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins for every field it specifies.
    ///
    /// `merge_overrides` selects per-handle merging of overrides; otherwise a
    /// non-empty overlay table replaces the base table.
    fn overlay(&self, raw: &RawSettings, merge_overrides: bool) -> Self {
        let e = &raw.estimation;
        Self {
            data_path: raw.data_path.clone().or_else(|| self.data_path.clone()),
            root: RootSettings {
                family_id: raw
                    .root
                    .family_id
                    .clone()
                    .or_else(|| self.root.family_id.clone()),
                tag: raw.root.tag.clone().unwrap_or_else(|| self.root.tag.clone()),
            },
            layout: LayoutSettings {
                units_per_year: raw.layout.units_per_year.unwrap_or(self.layout.units_per_year),
                max_year: raw.layout.max_year.or(self.layout.max_year),
                min_family_width: raw.layout.min_family_width.or(self.layout.min_family_width),
            },
            estimation: EstimationSettings {
                parent_age_at_marriage: e
                    .parent_age_at_marriage
                    .unwrap_or(self.estimation.parent_age_at_marriage),
                child_after_marriage: e
                    .child_after_marriage
                    .unwrap_or(self.estimation.child_after_marriage),
                sibling_spacing: e.sibling_spacing.unwrap_or(self.estimation.sibling_spacing),
                min_lifespan: e.min_lifespan.unwrap_or(self.estimation.min_lifespan),
                living_factor: e.living_factor.unwrap_or(self.estimation.living_factor),
                calibration: e
                    .calibration
                    .clone()
                    .unwrap_or_else(|| self.estimation.calibration.clone()),
            },
            overrides: if merge_overrides {
                self.overrides.merge(&raw.overrides)
            } else if raw.overrides.is_empty() {
                self.overrides.clone()
            } else {
                raw.overrides.clone()
            },
        }
    }

    /// Merge a local config onto self; overrides merge per handle.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        self.overlay(overlay, true)
    }

    /// Apply global config onto defaults; a global override table replaces.
    fn apply_global(&self, global: &RawSettings) -> Self {
        self.overlay(global, false)
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit config file; `./rsfam.toml` is used when `None`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/rsfam/rsfam.toml`
    /// 3. Local config (overrides merge per handle with global)
    /// 4. Environment variables: `RSFAM_*` prefix
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        match local {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let local_path = local_config_path(Path::new("."));
                if local_path.exists() {
                    current = current.merge_with(&load_raw_settings(&local_path)?);
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load a single config file on top of the defaults, skipping the
    /// global file and the environment.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let mut settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply RSFAM_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("RSFAM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_path") {
            settings.data_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("root.family_id") {
            settings.root.family_id = Some(val);
        }
        if let Ok(val) = config.get_string("root.tag") {
            settings.root.tag = val;
        }
        if let Ok(val) = config.get_float("layout.units_per_year") {
            settings.layout.units_per_year = val;
        }
        if let Ok(val) = config.get_int("layout.max_year") {
            settings.layout.max_year = i32::try_from(val).ok();
        }
        if let Ok(val) = config.get_float("layout.min_family_width") {
            settings.layout.min_family_width = Some(val);
        }
        if let Ok(val) = config.get_float("estimation.parent_age_at_marriage") {
            settings.estimation.parent_age_at_marriage = val;
        }
        if let Ok(val) = config.get_float("estimation.child_after_marriage") {
            settings.estimation.child_after_marriage = val;
        }
        if let Ok(val) = config.get_float("estimation.sibling_spacing") {
            settings.estimation.sibling_spacing = val;
        }
        if let Ok(val) = config.get_float("estimation.min_lifespan") {
            settings.estimation.min_lifespan = val;
        }
        if let Ok(val) = config.get_float("estimation.living_factor") {
            settings.estimation.living_factor = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rsfam configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rsfam/rsfam.toml
#   Local:  ./rsfam.toml (or --config FILE)
#   Env:    RSFAM_* environment variables, sections joined by "__"
#           e.g. RSFAM_LAYOUT__UNITS_PER_YEAR=2.5
#
# Local overrides merge per handle with the global ones.

# Gramps XML document used when no file is given
# data_path = "~/genealogy/family.gramps.xml"

[root]
# Family id attribute of the root family (takes precedence over tag)
# family_id = "F0001"
# Tag marking the root family
# tag = "root"

[layout]
# Radial units per year
# units_per_year = 3.0
# Year drawn at the centre (default: the current year)
# max_year = 2020
# Minimum arc length of a family sector
# min_family_width = 20.0

[estimation]
# parent_age_at_marriage = 25.0
# child_after_marriage = 5.0
# sibling_spacing = 2.0
# min_lifespan = 35.0
# living_factor = 1.5
# calibration = [{ year = 1775, lifespan = 38 }, { year = 2019, lifespan = 82 }]

# Per-person corrections, keyed by handle
# [overrides.people._I0001]
# angle = 135.0
# birth = "1850"
# death = "1921-04-02"

# Per-family corrections, keyed by handle
# [overrides.families._F0001]
# angle = 90.0
# marriage = "1874-06"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.root.tag, "root");
        assert_eq!(settings.layout.units_per_year, 3.0);
        assert_eq!(settings.estimation.parent_age_at_marriage, 25.0);
        assert_eq!(settings.estimation.calibration.len(), 2);
        assert!(settings.overrides.is_empty());
    }

    #[test]
    fn given_family_id_when_selecting_root_then_id_wins_over_tag() {
        let mut root = RootSettings::default();
        assert_eq!(root.selector(), RootSelector::Tag("root".into()));
        root.family_id = Some("F0001".into());
        assert_eq!(root.selector(), RootSelector::Id("F0001".into()));
    }

    #[test]
    fn given_tilde_in_data_path_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_path: Some(PathBuf::from("~/family.xml")),
            ..Default::default()
        };
        settings.expand_paths();
        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.data_path.unwrap();
        assert!(path.to_string_lossy().starts_with(&home));
        assert!(!path.to_string_lossy().contains('~'));
    }

    #[test]
    fn given_overlapping_overrides_when_merging_then_fields_merge_per_handle() {
        let mut base = OverrideSettings::default();
        base.people.insert(
            "_I1".into(),
            PersonOverride {
                angle: Some(10.0),
                birth: Some("1850".into()),
                death: None,
            },
        );
        let mut overlay = OverrideSettings::default();
        overlay.people.insert(
            "_I1".into(),
            PersonOverride {
                angle: Some(20.0),
                ..Default::default()
            },
        );

        let merged = base.merge(&overlay);
        let entry = &merged.people["_I1"];
        assert_eq!(entry.angle, Some(20.0));
        assert_eq!(entry.birth.as_deref(), Some("1850"));
    }

    #[test]
    fn given_global_overrides_when_applying_then_table_is_replaced() {
        let mut base = Settings::default();
        base.overrides
            .families
            .insert("_F1".into(), FamilyOverride {
                marriage: Some("1900".into()),
                ..Default::default()
            });
        let mut raw = RawSettings::default();
        raw.overrides
            .families
            .insert("_F2".into(), FamilyOverride {
                marriage: Some("1910".into()),
                ..Default::default()
            });

        let applied = base.apply_global(&raw);
        assert!(!applied.overrides.families.contains_key("_F1"));
        assert!(applied.overrides.families.contains_key("_F2"));

        let merged = base.merge_with(&raw);
        assert!(merged.overrides.families.contains_key("_F1"));
        assert!(merged.overrides.families.contains_key("_F2"));
    }

    #[test]
    fn given_settings_when_serialized_then_toml_round_trips() {
        let mut settings = Settings::default();
        settings.layout.max_year = Some(2020);
        let text = settings.to_toml().unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_path.is_none());
        assert!(raw.overrides.is_empty());
    }
}
