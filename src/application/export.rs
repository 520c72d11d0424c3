//! Serializable snapshot of a laid-out tree.

use serde::Serialize;

use crate::application::overrides::format_date;
use crate::domain::date::DateInfo;
use crate::domain::{FamilyTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    Family,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateExport {
    pub date: String,
    pub estimate: bool,
    pub overridden: bool,
}

impl From<DateInfo> for DateExport {
    fn from(info: DateInfo) -> Self {
        Self {
            date: format_date(info.date),
            estimate: info.is_estimate,
            overridden: info.is_overridden,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeExport {
    pub handle: String,
    pub kind: NodeKind,
    pub name: String,
    pub angle: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Radius of the birth (people) or marriage (families)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<DateExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death: Option<DateExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marriage: Option<DateExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkExport {
    pub source: String,
    pub target: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRangeExport {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleExport {
    pub center: String,
    pub units_per_year: f64,
    pub outer_radius: f64,
}

/// Everything a renderer needs: nodes, links and the time scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeExport {
    pub nodes: Vec<NodeExport>,
    pub links: Vec<LinkExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRangeExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleExport>,
}

impl TreeExport {
    pub fn from_tree(tree: &FamilyTree) -> Self {
        let scale = tree.scale();
        let radius = |info: Option<DateInfo>| -> Option<f64> {
            Some(scale?.radius(info?.date))
        };

        let people = tree.people().map(|(_, p)| NodeExport {
            handle: p.handle.clone(),
            kind: NodeKind::Person,
            name: p.display_name(),
            angle: p.angle,
            level: p.level,
            radius: radius(p.birth),
            gender: Some(p.gender.to_string()),
            birth: p.birth.map(DateExport::from),
            death: p.death.map(DateExport::from),
            marriage: None,
            parent_order: p.parent_order,
            width: None,
        });
        let families = tree.families().map(|(_, f)| NodeExport {
            handle: f.handle.clone(),
            kind: NodeKind::Family,
            name: f.name.clone(),
            angle: f.angle,
            level: f.level,
            radius: radius(f.marriage),
            gender: None,
            birth: None,
            death: None,
            marriage: f.marriage.map(DateExport::from),
            parent_order: None,
            width: Some(f.width),
        });

        let handle = |node: NodeId| tree.handle_of(node).unwrap_or_default().to_string();
        let links = tree
            .links()
            .iter()
            .map(|link| LinkExport {
                source: handle(link.source),
                target: handle(link.target),
                kind: link.kind.to_string(),
            })
            .collect();

        Self {
            nodes: people.chain(families).collect(),
            links,
            date_range: tree.date_range().map(|(start, end)| DateRangeExport {
                start: format_date(start),
                end: format_date(end),
            }),
            min_level: tree.min_level(),
            max_level: tree.max_level(),
            scale: scale.map(|s| ScaleExport {
                center: format_date(s.center),
                units_per_year: s.units_per_year,
                outer_radius: s.outer_radius(),
            }),
        }
    }

    pub fn node(&self, handle: &str) -> Option<&NodeExport> {
        self.nodes.iter().find(|n| n.handle == handle)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
