use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::error::Violation;
use super::model::{Assignment, Page, PageOrderEntry, PageTreeNode};
use crate::types::{PageId, RoleId};

/// Build the nested page tree for one role from its flat assignment rows.
///
/// Rows are indexed once (arena of rows + index by parent) and the tree is
/// materialized from the root partition down. Read-side drift is self-healed
/// rather than reported:
/// - a row whose page is missing from `pages` is dropped
/// - a row whose parent is not another surviving row is demoted to root
/// - a row caught in a parent cycle is dropped
/// - a row hanging off such a cycle is demoted to root, keeping its subtree
///
/// Every row is visited at most once, so even cyclic input terminates.
pub fn build_tree(assignments: &[Assignment], pages: &[Page]) -> Vec<PageTreeNode> {
    let pages_by_id: HashMap<PageId, &Page> = pages.iter().map(|p| (p.id, p)).collect();

    // First occurrence of a page wins; dangling pages are treated as already deleted
    let mut seen = HashSet::new();
    let rows: Vec<&Assignment> = assignments
        .iter()
        .filter(|a| {
            if !seen.insert(a.page_id) {
                debug!("Dropping duplicate assignment for page {}", a.page_id);
                return false;
            }
            if !pages_by_id.contains_key(&a.page_id) {
                debug!("Dropping assignment for missing page {}", a.page_id);
                return false;
            }
            true
        })
        .collect();

    let present: HashSet<PageId> = rows.iter().map(|a| a.page_id).collect();

    let mut groups: HashMap<Option<PageId>, Vec<&Assignment>> = HashMap::new();
    for row in &rows {
        let parent = match row.parent_page_id {
            Some(parent) if parent != row.page_id && present.contains(&parent) => Some(parent),
            Some(parent) => {
                debug!("Demoting page {} to root, parent {} is not assigned", row.page_id, parent);
                None
            }
            None => None,
        };
        groups.entry(parent).or_default().push(row);
    }
    // Stable: equal display orders keep their input position
    for group in groups.values_mut() {
        group.sort_by_key(|a| a.display_order);
    }

    let mut visited = HashSet::new();
    let mut roots = attach(None, &groups, &pages_by_id, &mut visited);

    if visited.len() < rows.len() {
        let parent_of: HashMap<PageId, PageId> = groups
            .iter()
            .filter_map(|(parent, group)| parent.map(|p| (p, group)))
            .flat_map(|(parent, group)| group.iter().map(move |a| (a.page_id, parent)))
            .collect();

        let mut demoted = Vec::new();
        for row in &rows {
            if visited.contains(&row.page_id) || on_cycle(row.page_id, &parent_of) {
                continue;
            }
            let Some(parent) = parent_of.get(&row.page_id) else {
                continue;
            };
            if !on_cycle(*parent, &parent_of) {
                continue;
            }
            let Some(page) = pages_by_id.get(&row.page_id) else {
                continue;
            };
            debug!("Demoting page {} to root, parent {} is in a cycle", row.page_id, parent);
            visited.insert(row.page_id);
            let children = attach(Some(row.page_id), &groups, &pages_by_id, &mut visited);
            demoted.push(PageTreeNode {
                page: (*page).clone(),
                parent_page_id: None,
                display_order: row.display_order,
                children,
            });
        }
        if !demoted.is_empty() {
            roots.extend(demoted);
            roots.sort_by_key(|n| n.display_order);
        }
    }

    if visited.len() < rows.len() {
        warn!(
            "Dropped {} assignment(s) caught in a parent cycle",
            rows.len() - visited.len()
        );
    }

    roots
}

/// Whether following parents from `start` comes back to `start`
fn on_cycle(start: PageId, parent_of: &HashMap<PageId, PageId>) -> bool {
    let mut current = parent_of.get(&start).copied();
    let mut steps = 0;
    while let Some(id) = current {
        if id == start {
            return true;
        }
        steps += 1;
        if steps > parent_of.len() {
            return false;
        }
        current = parent_of.get(&id).copied();
    }
    false
}

fn attach(
    parent: Option<PageId>,
    groups: &HashMap<Option<PageId>, Vec<&Assignment>>,
    pages: &HashMap<PageId, &Page>,
    visited: &mut HashSet<PageId>,
) -> Vec<PageTreeNode> {
    let Some(group) = groups.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(group.len());
    for row in group {
        if !visited.insert(row.page_id) {
            continue;
        }
        let Some(page) = pages.get(&row.page_id) else {
            continue;
        };
        let children = attach(Some(row.page_id), groups, pages, visited);
        nodes.push(PageTreeNode {
            page: (*page).clone(),
            parent_page_id: parent,
            display_order: row.display_order,
            children,
        });
    }
    nodes
}

/// Flatten a tree back into assignment rows for `role_id`.
///
/// Display orders are recomputed from sibling positions (0-based, contiguous),
/// which is the single point where order contiguity is re-established.
pub fn flatten(tree: &[PageTreeNode], role_id: RoleId) -> Vec<Assignment> {
    let mut out = Vec::new();
    flatten_into(tree, None, role_id, &mut out);
    out
}

fn flatten_into(
    siblings: &[PageTreeNode],
    parent: Option<PageId>,
    role_id: RoleId,
    out: &mut Vec<Assignment>,
) {
    for (position, node) in siblings.iter().enumerate() {
        out.push(Assignment {
            role_id,
            page_id: node.page.id,
            parent_page_id: parent,
            display_order: position as i32,
        });
        flatten_into(&node.children, Some(node.page.id), role_id, out);
    }
}

/// Rebuild and flatten: the normalized, self-healed form of a role's rows
pub fn normalize(role_id: RoleId, assignments: &[Assignment], pages: &[Page]) -> Vec<Assignment> {
    flatten(&build_tree(assignments, pages), role_id)
}

/// Strict validation of a submitted page-order list.
///
/// Unlike `build_tree`, nothing is healed here: the caller gets every problem
/// so a save request can be rejected before anything is persisted. Gaps in
/// display order are not violations; they are normalized away on save.
pub fn validate(entries: &[PageOrderEntry], catalog: &HashSet<PageId>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut parents: HashMap<PageId, Option<PageId>> = HashMap::new();

    for entry in entries {
        if parents.insert(entry.page_id, entry.parent_page_id).is_some() {
            violations.push(Violation::DuplicatePage(entry.page_id));
        }
        if !catalog.contains(&entry.page_id) {
            violations.push(Violation::UnknownPage(entry.page_id));
        }
        if entry.display_order < 0 {
            violations.push(Violation::NegativeOrder(entry.page_id));
        }
    }

    for entry in entries {
        match entry.parent_page_id {
            Some(parent) if parent == entry.page_id => {
                violations.push(Violation::SelfParent(entry.page_id));
            }
            Some(parent) if !parents.contains_key(&parent) => {
                violations.push(Violation::ParentNotAssigned(entry.page_id));
            }
            _ => {}
        }
    }

    // Walk each parent chain; a chain longer than the row count must revisit
    let mut reported = HashSet::new();
    for entry in entries {
        if entry.parent_page_id == Some(entry.page_id) {
            continue;
        }
        let mut current = entry.parent_page_id;
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == entry.page_id {
                if reported.insert(entry.page_id) {
                    violations.push(Violation::Cycle(entry.page_id));
                }
                break;
            }
            steps += 1;
            if steps > parents.len() {
                break;
            }
            current = parents.get(&parent).copied().flatten();
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn page(name: &str) -> Page {
        Page::new(Uuid::new_v4(), name, format!("/{}", name.to_lowercase()))
    }

    fn groups_are_contiguous(rows: &[Assignment]) -> bool {
        let mut groups: HashMap<Option<PageId>, Vec<i32>> = HashMap::new();
        for row in rows {
            groups.entry(row.parent_page_id).or_default().push(row.display_order);
        }
        groups.values_mut().all(|orders| {
            orders.sort();
            orders.iter().enumerate().all(|(i, o)| *o == i as i32)
        })
    }

    #[test]
    fn test_build_tree_sorts_roots_and_children() {
        let role = Uuid::new_v4();
        let (p1, p2, p3, p4) = (page("Home"), page("Users"), page("Roles"), page("Audit"));
        let rows = vec![
            Assignment::root(role, p2.id, 1),
            Assignment::child(role, p3.id, p1.id, 5),
            Assignment::root(role, p1.id, 0),
            Assignment::child(role, p4.id, p1.id, 2),
        ];
        let pages = vec![p1.clone(), p2.clone(), p3.clone(), p4.clone()];

        let tree = build_tree(&rows, &pages);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].page.id, p1.id);
        assert_eq!(tree[1].page.id, p2.id);
        let children: Vec<_> = tree[0].children.iter().map(|n| n.page.id).collect();
        assert_eq!(children, vec![p4.id, p3.id]);
        assert_eq!(tree[0].children[0].parent_page_id, Some(p1.id));
    }

    #[test]
    fn test_round_trip_preserves_pairs_and_normalizes_order() {
        let role = Uuid::new_v4();
        let pages: Vec<Page> = (0..6).map(|i| page(&format!("P{}", i))).collect();
        let rows = vec![
            Assignment::root(role, pages[0].id, 3),
            Assignment::root(role, pages[1].id, 10),
            Assignment::child(role, pages[2].id, pages[0].id, 7),
            Assignment::child(role, pages[3].id, pages[0].id, 2),
            Assignment::child(role, pages[4].id, pages[3].id, 0),
            Assignment::root(role, pages[5].id, 4),
        ];

        let flat = normalize(role, &rows, &pages);

        let mut before: Vec<_> = rows.iter().map(|a| (a.page_id, a.parent_page_id)).collect();
        let mut after: Vec<_> = flat.iter().map(|a| (a.page_id, a.parent_page_id)).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
        assert!(groups_are_contiguous(&flat));
        assert!(flat.iter().all(|a| a.role_id == role));
    }

    #[test]
    fn test_orphaned_child_is_demoted_to_root() {
        let role = Uuid::new_v4();
        let (p1, p2) = (page("Reports"), page("Exports"));
        let missing_parent = Uuid::new_v4();
        let rows = vec![
            Assignment::root(role, p1.id, 0),
            Assignment::child(role, p2.id, missing_parent, 0),
        ];

        let tree = build_tree(&rows, &[p1.clone(), p2.clone()]);
        assert_eq!(tree.len(), 2);
        let orphan = tree.iter().find(|n| n.page.id == p2.id).unwrap();
        assert_eq!(orphan.parent_page_id, None);
    }

    #[test]
    fn test_dangling_page_is_dropped_and_children_demoted() {
        let role = Uuid::new_v4();
        let (p1, p2) = (page("Settings"), page("Profile"));
        let deleted = Uuid::new_v4();
        let rows = vec![
            Assignment::root(role, deleted, 0),
            Assignment::child(role, p2.id, deleted, 0),
            Assignment::root(role, p1.id, 1),
        ];

        let tree = build_tree(&rows, &[p1.clone(), p2.clone()]);
        let ids: Vec<_> = tree.iter().map(|n| n.page.id).collect();
        assert_eq!(ids, vec![p2.id, p1.id]);
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_self_parent_row_becomes_root() {
        let role = Uuid::new_v4();
        let p1 = page("Loop");
        let rows = vec![Assignment::child(role, p1.id, p1.id, 0)];

        let tree = build_tree(&rows, &[p1.clone()]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].parent_page_id, None);
    }

    #[test]
    fn test_cycle_terminates_and_drops_unreachable_rows() {
        let role = Uuid::new_v4();
        let (a, b, c) = (page("A"), page("B"), page("C"));
        let rows = vec![
            Assignment::child(role, a.id, b.id, 0),
            Assignment::child(role, b.id, a.id, 0),
            Assignment::root(role, c.id, 0),
        ];

        let tree = build_tree(&rows, &[a, b, c.clone()]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].page.id, c.id);
    }

    #[test]
    fn test_rows_hanging_off_a_cycle_are_demoted() {
        let role = Uuid::new_v4();
        let (a, b, c, d, e) = (page("A"), page("B"), page("C"), page("D"), page("E"));
        let rows = vec![
            Assignment::root(role, e.id, 0),
            Assignment::child(role, a.id, b.id, 0),
            Assignment::child(role, b.id, a.id, 0),
            Assignment::child(role, c.id, a.id, 1),
            Assignment::child(role, d.id, c.id, 0),
        ];

        let tree = build_tree(&rows, &[a, b, c.clone(), d.clone(), e.clone()]);
        let ids: Vec<_> = tree.iter().map(|n| n.page.id).collect();
        assert_eq!(ids, vec![e.id, c.id]);
        assert_eq!(tree[1].parent_page_id, None);
        assert_eq!(tree[1].children[0].page.id, d.id);
        assert!(groups_are_contiguous(&flatten(&tree, role)));
    }

    #[test]
    fn test_duplicate_rows_keep_first_occurrence() {
        let role = Uuid::new_v4();
        let (p1, p2) = (page("One"), page("Two"));
        let rows = vec![
            Assignment::root(role, p1.id, 0),
            Assignment::root(role, p2.id, 1),
            Assignment::child(role, p1.id, p2.id, 0),
        ];

        let tree = build_tree(&rows, &[p1.clone(), p2.clone()]);
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_build_tree_handles_arbitrary_depth() {
        let role = Uuid::new_v4();
        let pages: Vec<Page> = (0..5).map(|i| page(&format!("L{}", i))).collect();
        let mut rows = vec![Assignment::root(role, pages[0].id, 0)];
        for i in 1..pages.len() {
            rows.push(Assignment::child(role, pages[i].id, pages[i - 1].id, 0));
        }

        let tree = build_tree(&rows, &pages);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].children[0].children[0].children[0].page.id, pages[4].id);
        assert_eq!(tree[0].subtree_size(), 5);
        assert_eq!(flatten(&tree, role).len(), 5);
    }

    #[test]
    fn test_validate_reports_strict_violations() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let catalog: HashSet<PageId> = [a, b, c].into_iter().collect();
        let entries = vec![
            PageOrderEntry { page_id: a, parent_page_id: Some(a), display_order: 0 },
            PageOrderEntry { page_id: b, parent_page_id: Some(d), display_order: -1 },
            PageOrderEntry { page_id: d, parent_page_id: None, display_order: 0 },
            PageOrderEntry { page_id: c, parent_page_id: None, display_order: 1 },
            PageOrderEntry { page_id: c, parent_page_id: None, display_order: 2 },
        ];

        let violations = validate(&entries, &catalog);
        assert!(violations.contains(&Violation::SelfParent(a)));
        assert!(violations.contains(&Violation::NegativeOrder(b)));
        assert!(violations.contains(&Violation::UnknownPage(d)));
        assert!(violations.contains(&Violation::DuplicatePage(c)));
        assert!(!violations.contains(&Violation::ParentNotAssigned(b)));
    }

    #[test]
    fn test_validate_detects_cycles() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let catalog: HashSet<PageId> = [a, b, c].into_iter().collect();
        let entries = vec![
            PageOrderEntry { page_id: a, parent_page_id: Some(c), display_order: 0 },
            PageOrderEntry { page_id: b, parent_page_id: Some(a), display_order: 0 },
            PageOrderEntry { page_id: c, parent_page_id: Some(b), display_order: 0 },
        ];

        let violations = validate(&entries, &catalog);
        assert_eq!(
            violations.iter().filter(|v| matches!(v, Violation::Cycle(_))).count(),
            3
        );
    }

    #[test]
    fn test_validate_accepts_gapped_but_valid_list() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let catalog: HashSet<PageId> = [a, b].into_iter().collect();
        let entries = vec![
            PageOrderEntry { page_id: a, parent_page_id: None, display_order: 4 },
            PageOrderEntry { page_id: b, parent_page_id: Some(a), display_order: 9 },
        ];
        assert!(validate(&entries, &catalog).is_empty());
    }
}
