//! Tests for date inference over a traversed tree

use chrono::NaiveDate;

use rsfam::application::services::TreeService;
use rsfam::application::ApplicationError;
use rsfam::config::{PersonOverride, Settings};
use rsfam::domain::{DateInfo, DomainError, Estimator, FamilyTree, RootSelector, TreeBuilder};
use rsfam::infrastructure::GrampsXml;
use rsfam::util::testing;

const FIXTURE: &str = "tests/resources/family.gramps";

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    ymd(2024, 6, 1)
}

fn document() -> GrampsXml {
    testing::init_test_setup();
    let text = std::fs::read_to_string(FIXTURE).expect("read fixture");
    GrampsXml::parse(&text).expect("parse fixture")
}

fn service(doc: &GrampsXml, settings: &Settings) -> TreeService {
    let estimator = Estimator::new(settings.estimation_params()).with_today(today());
    TreeService::build_with(doc, settings, estimator).expect("build service")
}

fn birth(tree: &FamilyTree, handle: &str) -> DateInfo {
    tree.person(tree.person_id(handle).unwrap())
        .unwrap()
        .birth
        .unwrap_or_else(|| panic!("{handle} has no birth"))
}

fn death(tree: &FamilyTree, handle: &str) -> Option<DateInfo> {
    tree.person(tree.person_id(handle).unwrap()).unwrap().death
}

fn marriage(tree: &FamilyTree, handle: &str) -> DateInfo {
    tree.family(tree.family_id(handle).unwrap())
        .unwrap()
        .marriage
        .unwrap()
}

/// Every date of the tree, for before/after comparisons.
fn snapshot(tree: &FamilyTree) -> Vec<(String, Option<DateInfo>, Option<DateInfo>)> {
    let mut dates: Vec<_> = tree
        .people()
        .map(|(_, p)| (p.handle.clone(), p.birth, p.death))
        .chain(tree.families().map(|(_, f)| (f.handle.clone(), f.marriage, None)))
        .collect();
    dates.sort_by(|a, b| a.0.cmp(&b.0));
    dates
}

#[test]
fn given_fixture_when_estimating_then_every_person_has_a_birth() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let tree = service.tree();
    assert!(tree.people().all(|(_, p)| p.birth.is_some()));
    assert!(tree.families().all(|(_, f)| f.marriage.is_some()));
}

#[test]
fn given_known_own_marriage_when_estimating_then_birth_is_marriage_minus_parent_age() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let tree = service.tree();
    assert_eq!(birth(tree, "_P2"), DateInfo::estimate(ymd(1900, 6, 1)));
    assert_eq!(birth(tree, "_P11"), DateInfo::estimate(ymd(1925, 1, 1)));
}

#[test]
fn given_known_parents_marriage_when_estimating_then_child_born_five_years_later() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    assert_eq!(birth(service.tree(), "_P4"), DateInfo::estimate(ymd(1930, 6, 1)));
    // a documented birth is never moved
    assert_eq!(birth(service.tree(), "_P3"), DateInfo::known(ymd(1926, 3, 1)));
}

#[test]
fn given_one_documented_child_when_estimating_then_marriage_and_parents_follow() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let tree = service.tree();
    assert_eq!(marriage(tree, "_F2"), DateInfo::estimate(ymd(1895, 1, 1)));
    assert_eq!(birth(tree, "_P6"), DateInfo::estimate(ymd(1870, 1, 1)));
    assert_eq!(birth(tree, "_P5"), DateInfo::known(ymd(1870, 1, 1)));
    // undated sibling whose birth text could not be parsed
    assert_eq!(birth(tree, "_P7"), DateInfo::estimate(ymd(1900, 1, 1)));
}

#[test]
fn given_only_documented_parent_when_estimating_then_marriage_from_parent_birth() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let tree = service.tree();
    assert_eq!(marriage(tree, "_F3"), DateInfo::estimate(ymd(1900, 5, 5)));
    // _P8 has no record at all
    assert_eq!(birth(tree, "_P8"), DateInfo::estimate(ymd(1875, 5, 5)));
}

#[test]
fn given_old_people_when_estimating_then_death_is_estimated() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let d = death(service.tree(), "_P1").unwrap();
    assert!(d.is_estimate);
    assert_eq!(d.date.format("%Y").to_string(), "1960");
    assert!(death(service.tree(), "_P5").unwrap().is_estimate);
}

#[test]
fn given_plausibly_living_people_when_estimating_then_death_unset_and_range_reaches_today() {
    let doc = document();

    let service = service(&doc, &Settings::default());

    let tree = service.tree();
    assert_eq!(death(tree, "_P3"), None);
    assert_eq!(death(tree, "_P4"), None);
    let (start, end) = tree.date_range().unwrap();
    assert_eq!(start, ymd(1870, 1, 1));
    assert_eq!(end, today());
}

#[test]
fn given_birth_override_when_estimating_then_override_survives() {
    let doc = document();
    let mut settings = Settings::default();
    settings.overrides.people.insert(
        "_P6".into(),
        PersonOverride {
            birth: Some("1850".into()),
            ..Default::default()
        },
    );

    let service = service(&doc, &settings);

    let b = birth(service.tree(), "_P6");
    assert_eq!(b.date, ymd(1850, 1, 1));
    assert!(b.is_overridden);
    assert!(!b.is_estimate);
    assert_eq!(service.tree().date_range().unwrap().0, ymd(1850, 1, 1));
}

#[test]
fn given_estimated_tree_when_estimating_again_then_dates_do_not_drift() {
    let doc = document();
    let mut tree = TreeBuilder::new(&doc)
        .build(&RootSelector::Tag("root".into()))
        .unwrap();
    let estimator = Estimator::default().with_today(today());

    estimator.estimate(&mut tree).unwrap();
    let once = snapshot(&tree);
    estimator.estimate(&mut tree).unwrap();
    estimator.estimate(&mut tree).unwrap();

    assert_eq!(snapshot(&tree), once);
}

#[test]
fn given_person_born_2000_when_estimating_then_treated_as_living() {
    testing::init_test_setup();
    let doc = GrampsXml::parse(
        r#"<database xmlns="http://gramps-project.org/xml/1.7.1/">
  <events>
    <event handle="_E1"><type>Birth</type><dateval val="2000-01-01"/></event>
  </events>
  <people>
    <person handle="_P1"><gender>F</gender><eventref hlink="_E1"/><parentin hlink="_F1"/></person>
  </people>
  <families>
    <family handle="_F1" id="F0001"><mother hlink="_P1"/></family>
  </families>
</database>"#,
    )
    .unwrap();
    let mut settings = Settings::default();
    settings.root.family_id = Some("F0001".into());

    let service = service(&doc, &settings);

    let tree = service.tree();
    assert_eq!(death(tree, "_P1"), None);
    assert_eq!(tree.date_range(), Some((ymd(2000, 1, 1), today())));
}

#[test]
fn given_family_without_any_date_when_estimating_then_fails_with_no_marriage_evidence() {
    testing::init_test_setup();
    let doc = GrampsXml::parse(
        r#"<database xmlns="http://gramps-project.org/xml/1.7.1/">
  <people>
    <person handle="_P1"><parentin hlink="_F1"/></person>
    <person handle="_P2"><childof hlink="_F1"/></person>
  </people>
  <families>
    <family handle="_F1" id="F0001"><father hlink="_P1"/><childref hlink="_P2"/></family>
  </families>
</database>"#,
    )
    .unwrap();
    let mut settings = Settings::default();
    settings.root.family_id = Some("F0001".into());

    let result = TreeService::build(&doc, &settings);

    match result {
        Err(ApplicationError::Domain(err)) => {
            assert_eq!(err, DomainError::NoMarriageEvidence("_F1".into()))
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("estimation should fail"),
    }
}
