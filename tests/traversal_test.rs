//! Tests for breadth-first discovery and sector layout

use std::collections::HashSet;

use chrono::NaiveDate;

use rsfam::application::services::TreeService;
use rsfam::config::Settings;
use rsfam::domain::{
    DateInfo, DomainError, Estimator, FamilyTree, LayoutParams, NodeId, RelationKind,
    RootSelector, ScaleParams, TreeBuilder,
};
use rsfam::infrastructure::GrampsXml;
use rsfam::util::testing;

const FIXTURE: &str = "tests/resources/family.gramps";

fn document() -> GrampsXml {
    testing::init_test_setup();
    let text = std::fs::read_to_string(FIXTURE).expect("read fixture");
    GrampsXml::parse(&text).expect("parse fixture")
}

fn build(doc: &GrampsXml) -> FamilyTree {
    TreeBuilder::new(doc)
        .build(&RootSelector::Tag("root".into()))
        .expect("build tree")
}

fn person_angle(tree: &FamilyTree, handle: &str) -> f64 {
    tree.person(tree.person_id(handle).unwrap()).unwrap().angle
}

fn person_level(tree: &FamilyTree, handle: &str) -> Option<i32> {
    tree.person(tree.person_id(handle).unwrap()).unwrap().level
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn given_root_tag_when_building_then_discovers_every_reachable_node() {
    let doc = document();

    let tree = build(&doc);

    let people: HashSet<&str> = tree.people().map(|(_, p)| p.handle.as_str()).collect();
    let families: HashSet<&str> = tree.families().map(|(_, f)| f.handle.as_str()).collect();
    assert_eq!(
        people,
        HashSet::from(["_P1", "_P2", "_P3", "_P4", "_P5", "_P6", "_P7", "_P8", "_P9", "_P11"])
    );
    assert_eq!(families, HashSet::from(["_F1", "_F2", "_F3", "_F4"]));
    assert_eq!(tree.stub_count(), 0);
    assert_eq!(tree.root(), tree.family_id("_F1"));
}

#[test]
fn given_root_id_when_building_then_starts_from_that_family() {
    let doc = document();

    let tree = TreeBuilder::new(&doc)
        .build(&RootSelector::Id("F0002".into()))
        .unwrap();

    let root = tree.family(tree.root().unwrap()).unwrap();
    assert_eq!(root.handle, "_F2");
    assert_eq!(root.level, Some(1));
    assert_close(root.angle, 180.0);
}

#[test]
fn given_unknown_root_when_building_then_fails_with_root_not_found() {
    let doc = document();

    let err = TreeBuilder::new(&doc)
        .build(&RootSelector::Tag("nobody".into()))
        .unwrap_err();

    assert!(matches!(err, DomainError::RootFamilyNotFound(_)));
}

#[test]
fn given_root_family_when_building_then_centres_it_on_the_full_half_circle() {
    let doc = document();

    let tree = build(&doc);

    let f1 = tree.family(tree.family_id("_F1").unwrap()).unwrap();
    assert_eq!(f1.level, Some(1));
    assert_close(f1.angle, 180.0);
    assert_close(f1.width, 180.0);
    assert_eq!(f1.name, "Smith");

    assert_close(person_angle(&tree, "_P1"), 90.0);
    assert_close(person_angle(&tree, "_P2"), 270.0);
    assert_close(person_angle(&tree, "_P3"), 150.0);
    assert_close(person_angle(&tree, "_P4"), 210.0);
}

#[test]
fn given_family_reached_through_child_when_building_then_centres_on_that_child() {
    let doc = document();

    let tree = build(&doc);

    // _P1 is the first of two children of _F2 and was placed at 90 degrees
    let f2 = tree.family(tree.family_id("_F2").unwrap()).unwrap();
    assert_eq!(f2.level, Some(2));
    assert_close(f2.width, 90.0);
    assert_close(f2.angle, 105.0);
    assert_eq!(f2.name, "Unknown");

    assert_close(person_angle(&tree, "_P5"), 60.0);
    assert_close(person_angle(&tree, "_P6"), 150.0);
    assert_close(person_angle(&tree, "_P1"), 90.0);
    assert_close(person_angle(&tree, "_P7"), 120.0);

    let f3 = tree.family(tree.family_id("_F3").unwrap()).unwrap();
    assert_close(f3.angle, 270.0);
    assert_close(person_angle(&tree, "_P8"), 225.0);
    assert_close(person_angle(&tree, "_P9"), 315.0);
}

#[test]
fn given_visited_families_when_building_then_members_lie_within_their_sector() {
    let doc = document();

    let tree = build(&doc);

    for (_, family) in tree.families() {
        let level = family.level.unwrap();
        assert_close(family.width, 360.0 / 2f64.powi(level));
        let (lo, hi) = (
            family.angle - family.width / 2.0 - 1e-9,
            family.angle + family.width / 2.0 + 1e-9,
        );
        for member in family.parents.iter().chain(family.children.iter()) {
            let angle = tree.person(*member).unwrap().angle;
            assert!(
                (lo..=hi).contains(&angle),
                "{} at {} outside sector of {}",
                tree.handle_of((*member).into()).unwrap(),
                angle,
                family.handle
            );
        }
        let children: Vec<f64> = family
            .children
            .iter()
            .map(|c| tree.person(*c).unwrap().angle)
            .collect();
        assert!(children.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn given_generations_when_building_then_assigns_levels_by_generation() {
    let doc = document();

    let tree = build(&doc);

    assert_eq!(person_level(&tree, "_P1"), Some(1));
    assert_eq!(person_level(&tree, "_P2"), Some(1));
    assert_eq!(person_level(&tree, "_P3"), Some(0));
    assert_eq!(person_level(&tree, "_P4"), Some(0));
    assert_eq!(person_level(&tree, "_P5"), Some(2));
    assert_eq!(person_level(&tree, "_P7"), Some(1));
    assert_eq!(person_level(&tree, "_P9"), Some(2));
    // spouses of a descendant family share a generation
    assert_eq!(person_level(&tree, "_P11"), person_level(&tree, "_P3"));
    assert_eq!(person_level(&tree, "_P11"), Some(0));

    let f4 = tree.family(tree.family_id("_F4").unwrap()).unwrap();
    assert_eq!(f4.level, Some(0));
    assert_close(f4.width, 360.0);
    assert_eq!(tree.max_level(), Some(2));
    assert_eq!(tree.min_level(), Some(0));
    assert_eq!(tree.levels()[&0].len(), 3);
    assert_eq!(tree.levels()[&2].len(), 4);
}

#[test]
fn given_parents_when_building_then_records_left_and_right_slot() {
    let doc = document();

    let tree = build(&doc);

    let order = |h: &str| tree.person(tree.person_id(h).unwrap()).unwrap().parent_order;
    assert_eq!(order("_P1"), Some(0));
    assert_eq!(order("_P2"), Some(1));
    assert_eq!(order("_P5"), Some(0));
    assert_eq!(order("_P6"), Some(1));
    // placed as a child first, so never given a parent slot
    assert_eq!(order("_P3"), None);
}

#[test]
fn given_visited_families_when_building_then_links_every_member_once() {
    let doc = document();

    let tree = build(&doc);

    let links: HashSet<(String, String, RelationKind)> = tree
        .links()
        .iter()
        .map(|l| {
            (
                tree.handle_of(l.source).unwrap().to_string(),
                tree.handle_of(l.target).unwrap().to_string(),
                l.kind,
            )
        })
        .collect();
    assert_eq!(links.len(), tree.links().len());
    assert_eq!(links.len(), 13);

    let link = |s: &str, t: &str, k| (s.to_string(), t.to_string(), k);
    assert!(links.contains(&link("_P1", "_F1", RelationKind::Parent)));
    assert!(links.contains(&link("_F1", "_P4", RelationKind::Child)));
    // the person a family was reached through is linked too
    assert!(links.contains(&link("_F2", "_P1", RelationKind::Child)));
    assert!(links.contains(&link("_P3", "_F4", RelationKind::Parent)));
}

#[test]
fn given_handle_referenced_many_times_when_building_then_registers_one_node() {
    let doc = document();

    let tree = build(&doc);

    // _P1 is referenced from _F1, _F2 and its own record
    let ids: Vec<NodeId> = tree
        .people()
        .filter(|(_, p)| p.handle == "_P1")
        .map(|(id, _)| id.into())
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(tree.node_id("_P1"), Some(ids[0]));
    assert_eq!(tree.person_count(), 10);
    assert_eq!(tree.family_count(), 4);
}

#[test]
fn given_person_missing_from_document_when_building_then_keeps_empty_person() {
    let doc = document();

    let tree = build(&doc);

    let p8 = tree.person(tree.person_id("_P8").unwrap()).unwrap();
    assert_eq!(p8.display_name(), "");
    assert!(p8.birth.is_none());
    assert_eq!(p8.level, Some(2));
}

#[test]
fn given_document_events_when_building_then_reads_dates_and_skips_bad_ones() {
    let doc = document();

    let tree = build(&doc);

    let person = |h: &str| tree.person(tree.person_id(h).unwrap()).unwrap();
    let p1_birth = person("_P1").birth.unwrap();
    assert_eq!(p1_birth.date.to_string(), "1900-01-01");
    assert!(!p1_birth.is_estimate);
    // "sometime before the war" is not a date
    assert!(person("_P7").birth.is_none());
    assert_eq!(person("_P5").birth.unwrap().date.to_string(), "1870-01-01");

    let f4 = tree.family(tree.family_id("_F4").unwrap()).unwrap();
    assert_eq!(f4.marriage.unwrap().date.to_string(), "1950-01-01");

    let (start, end) = tree.date_range().unwrap();
    assert_eq!(start.to_string(), "1870-01-01");
    assert_eq!(end.to_string(), "1950-01-01");
}

#[test]
fn given_family_missing_from_document_when_building_then_fails() {
    let text = r#"<database xmlns="http://gramps-project.org/xml/1.7.1/">
  <people>
    <person handle="_P1"><childof hlink="_FX"/><parentin hlink="_F1"/></person>
  </people>
  <families>
    <family handle="_F1" id="F0001"><father hlink="_P1"/></family>
  </families>
</database>"#;
    let doc = GrampsXml::parse(text).unwrap();

    let err = TreeBuilder::new(&doc)
        .build(&RootSelector::Id("F0001".into()))
        .unwrap_err();

    assert_eq!(err, DomainError::FamilyNotInDocument("_FX".into()));
}

#[test]
fn given_min_family_width_when_building_then_widens_sector_at_marriage_radius() {
    let doc = document();

    let tree = TreeBuilder::new(&doc)
        .with_scale(ScaleParams {
            units_per_year: 1.0,
            max_year: None,
        })
        .with_layout(LayoutParams {
            min_family_width: Some(500.0),
        })
        .build(&RootSelector::Tag("root".into()))
        .unwrap();

    // _F1 married in 1925: default width 180 is too narrow for 500 units
    let f1 = tree.family(tree.family_id("_F1").unwrap()).unwrap();
    assert!(f1.width > 180.0, "width {}", f1.width);
    // _F2 has no documented marriage and keeps its default width
    let f2 = tree.family(tree.family_id("_F2").unwrap()).unwrap();
    assert_close(f2.width, 90.0);
}

#[test]
fn given_root_family_without_parents_when_building_then_places_children_and_dates_marriage() {
    testing::init_test_setup();
    let doc = GrampsXml::parse(
        r#"<database xmlns="http://gramps-project.org/xml/1.7.1/">
  <events>
    <event handle="_E1"><type>Birth</type><dateval val="1900-01-01"/></event>
  </events>
  <people>
    <person handle="_P1"><eventref hlink="_E1"/><childof hlink="_F1"/></person>
    <person handle="_P2"><childof hlink="_F1"/></person>
  </people>
  <families>
    <family handle="_F1" id="F0001"><childref hlink="_P1"/><childref hlink="_P2"/></family>
  </families>
</database>"#,
    )
    .unwrap();
    let mut settings = Settings::default();
    settings.root.family_id = Some("F0001".into());
    let estimator = Estimator::new(settings.estimation_params())
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

    let service = TreeService::build_with(&doc, &settings, estimator).unwrap();

    let tree = service.tree();
    let f1 = tree.family(tree.family_id("_F1").unwrap()).unwrap();
    assert!(f1.parents.is_empty());
    assert_eq!(f1.name, "Unknown");
    assert_close(person_angle(tree, "_P1"), 150.0);
    assert_close(person_angle(tree, "_P2"), 210.0);
    assert_eq!(
        f1.marriage,
        Some(DateInfo::estimate(NaiveDate::from_ymd_opt(1895, 1, 1).unwrap()))
    );
    assert!(tree
        .person(tree.person_id("_P2").unwrap())
        .unwrap()
        .birth
        .is_some_and(|b| b.is_estimate));

    let rotated: HashSet<&str> = service
        .rotation_set("_P1")
        .unwrap()
        .iter()
        .map(|n| tree.handle_of(*n).unwrap())
        .collect();
    assert_eq!(rotated, HashSet::from(["_P1", "_F1", "_P2"]));
}
