//! Text rendering of the family graph as a `termtree`.

use std::collections::HashSet;

use termtree::Tree;

use crate::domain::date::DateInfo;
use crate::domain::{FamilyId, FamilyTree, Person, PersonId};

/// `1870-01-01`, with `~` for estimates and `!` for overrides.
pub fn date_label(info: &DateInfo) -> String {
    let marker = if info.is_overridden {
        "!"
    } else if info.is_estimate {
        "~"
    } else {
        ""
    };
    format!("{}{}", info.date.format("%Y-%m-%d"), marker)
}

pub fn person_label(person: &Person) -> String {
    let mut label = format!("{} [{}]", person.display_name(), person.handle);
    if let Some(birth) = &person.birth {
        label.push_str(&format!(" *{}", date_label(birth)));
    }
    if let Some(death) = &person.death {
        label.push_str(&format!(" +{}", date_label(death)));
    }
    label
}

/// The graph below the root family: each family lists its parents (with
/// their birth family) and its children (with the family they founded).
pub fn family_tree_view(tree: &FamilyTree) -> Tree<String> {
    let Some(root) = tree.root() else {
        return Tree::new("Empty tree".to_string());
    };
    let mut seen = HashSet::new();
    family_node(tree, root, &mut seen)
}

fn family_node(tree: &FamilyTree, id: FamilyId, seen: &mut HashSet<FamilyId>) -> Tree<String> {
    let Some(family) = tree.family(id) else {
        let handle = tree.handle_of(id.into()).unwrap_or_default();
        return Tree::new(format!("[{}] (not loaded)", handle));
    };
    let mut label = format!("{} family [{}]", family.name, family.handle);
    if let Some(marriage) = &family.marriage {
        label.push_str(&format!(" m.{}", date_label(marriage)));
    }
    if !seen.insert(id) {
        return Tree::new(format!("{} (see above)", label));
    }

    let mut node = Tree::new(label);
    for &parent in &family.parents {
        node.push(person_node(tree, parent, Branch::Ancestors, seen));
    }
    for &child in &family.children {
        node.push(person_node(tree, child, Branch::Descendants, seen));
    }
    node
}

#[derive(Debug, Clone, Copy)]
enum Branch {
    Ancestors,
    Descendants,
}

fn person_node(
    tree: &FamilyTree,
    id: PersonId,
    branch: Branch,
    seen: &mut HashSet<FamilyId>,
) -> Tree<String> {
    let Some(person) = tree.person(id) else {
        let handle = tree.handle_of(id.into()).unwrap_or_default();
        return Tree::new(format!("[{}] (not loaded)", handle));
    };
    let mut node = Tree::new(person_label(person));
    let next = match branch {
        Branch::Ancestors => person.child_of,
        Branch::Descendants => person.parent_in,
    };
    if let Some(family) = next.filter(|f| tree.is_family_complete(*f)) {
        node.push(family_node(tree, family, seen));
    }
    node
}
