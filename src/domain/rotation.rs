//! Rotation propagation: the set of nodes that turn together when one node
//! is rotated.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::domain::entities::{FamilyId, NodeId, PersonId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::registry::FamilyTree;

/// Ordered, de-duplicated set of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationSet {
    nodes: Vec<NodeId>,
    members: HashSet<NodeId>,
}

impl RotationSet {
    fn insert(&mut self, node: NodeId) -> bool {
        if self.members.insert(node) {
            self.nodes.push(node);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }
}

/// Collect `start` and everything reachable from it away from its origin.
///
/// A person carries their ancestors and the rest of their birth family. A
/// family carries its members except the first child, and everything beyond
/// them.
pub fn rotation_set(tree: &FamilyTree, start: NodeId) -> DomainResult<RotationSet> {
    let unknown = || DomainError::UnknownNode(tree.handle_of(start).unwrap_or_default().to_string());

    let mut set = RotationSet::default();
    let mut queue: VecDeque<(FamilyId, Option<PersonId>)> = VecDeque::new();
    let mut enqueued: HashSet<FamilyId> = HashSet::new();

    match start {
        NodeId::Person(id) => {
            let person = tree.person(id).ok_or_else(unknown)?;
            set.insert(start);
            if let Some(family) = person.child_of {
                enqueued.insert(family);
                queue.push_back((family, Some(id)));
            }
        }
        NodeId::Family(id) => {
            let family = tree.family(id).ok_or_else(unknown)?;
            set.insert(start);
            enqueued.insert(id);
            queue.push_back((id, family.children.first().copied()));
        }
    }

    while let Some((family_id, origin)) = queue.pop_front() {
        let Some(family) = tree.family(family_id) else {
            debug!("rotation stops at unvisited family {:?}", tree.handle_of(family_id.into()));
            continue;
        };
        if let Some(origin) = origin {
            if !family.has_member(origin) {
                return Err(DomainError::SourcePersonNotInFamily {
                    family: family.handle.clone(),
                    person: tree.handle_of(origin.into()).unwrap_or_default().to_string(),
                });
            }
        }
        set.insert(family_id.into());

        for &parent in family.parents.iter().filter(|p| Some(**p) != origin) {
            set.insert(parent.into());
            if let Some(next) = tree.person(parent).and_then(|p| p.child_of) {
                if enqueued.insert(next) {
                    queue.push_back((next, Some(parent)));
                }
            }
        }
        for &child in family.children.iter().filter(|c| Some(**c) != origin) {
            set.insert(child.into());
            if let Some(next) = tree.person(child).and_then(|c| c.parent_in) {
                if enqueued.insert(next) {
                    queue.push_back((next, Some(child)));
                }
            }
        }
    }

    Ok(set)
}

/// Add `delta` degrees to every node of the set.
pub fn apply_rotation(tree: &mut FamilyTree, set: &RotationSet, delta: f64) {
    for node in set.iter() {
        match *node {
            NodeId::Person(id) => {
                if let Some(person) = tree.person_mut(id) {
                    person.angle += delta;
                }
            }
            NodeId::Family(id) => {
                if let Some(family) = tree.family_mut(id) {
                    family.angle += delta;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Family, Person};

    /// `_GF`(grandparents `_G1`,`_G2`) -> `_P1` who is a parent in `_F1`
    /// with `_P2`; `_F1` has children `_C1`, `_C2`.
    fn three_generations() -> FamilyTree {
        let mut tree = FamilyTree::default();
        let gf = tree.ensure_family("_GF");
        let f1 = tree.ensure_family("_F1");

        let add = |tree: &mut FamilyTree, handle: &str, child_of, parent_in| {
            let id = tree.ensure_person(handle);
            let mut person = Person::new(handle);
            person.child_of = child_of;
            person.parent_in = parent_in;
            tree.complete_person(id, person);
            id
        };
        let g1 = add(&mut tree, "_G1", None, Some(gf));
        let g2 = add(&mut tree, "_G2", None, Some(gf));
        let p1 = add(&mut tree, "_P1", Some(gf), Some(f1));
        let p2 = add(&mut tree, "_P2", None, Some(f1));
        let c1 = add(&mut tree, "_C1", Some(f1), None);
        let c2 = add(&mut tree, "_C2", Some(f1), None);

        let mut grand = Family::new("_GF");
        grand.parents = vec![g1, g2];
        grand.children = vec![p1];
        tree.complete_family(gf, grand);

        let mut family = Family::new("_F1");
        family.parents = vec![p1, p2];
        family.children = vec![c1, c2];
        tree.complete_family(f1, family);
        tree
    }

    fn node(tree: &FamilyTree, handle: &str) -> NodeId {
        tree.node_id(handle).unwrap()
    }

    #[test]
    fn test_person_rotation_carries_ancestors_and_siblings() {
        let tree = three_generations();
        let set = rotation_set(&tree, node(&tree, "_C1")).unwrap();

        for handle in ["_C1", "_F1", "_P1", "_P2", "_C2", "_GF", "_G1", "_G2"] {
            assert!(set.contains(node(&tree, handle)), "missing {handle}");
        }
        assert_eq!(set.nodes()[0], node(&tree, "_C1"));
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn test_family_rotation_excludes_first_child() {
        let tree = three_generations();
        let set = rotation_set(&tree, node(&tree, "_F1")).unwrap();

        assert!(!set.contains(node(&tree, "_C1")));
        assert!(set.contains(node(&tree, "_C2")));
        assert!(set.contains(node(&tree, "_G1")));
    }

    #[test]
    fn test_apply_rotation_shifts_angles() {
        let mut tree = three_generations();
        let set = rotation_set(&tree, node(&tree, "_P1")).unwrap();
        apply_rotation(&mut tree, &set, 15.0);

        let g1 = tree.person_id("_G1").unwrap();
        let c1 = tree.person_id("_C1").unwrap();
        assert_eq!(tree.person(g1).unwrap().angle, 15.0);
        assert_eq!(tree.person(c1).unwrap().angle, 0.0);
    }

    #[test]
    fn test_stub_start_is_unknown() {
        let mut tree = three_generations();
        let stub = tree.ensure_person("_X");
        let err = rotation_set(&tree, stub.into()).unwrap_err();
        assert_eq!(err, DomainError::UnknownNode("_X".into()));
    }
}
