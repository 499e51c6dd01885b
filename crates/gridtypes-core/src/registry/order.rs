//! Dependency ordering for saving declarations.
//!
//! The declaration grammar has no forward references, so a type must be
//! written after every type its tag bodies mention. This is a depth-first
//! post-order walk; meeting a node that is still on the walk's path means the
//! references form a cycle, which is reported with the path that closed it.

use std::collections::HashSet;
use std::hash::Hash;

/// Order `roots` (and anything reachable from them) so that each node comes
/// after its dependencies. Ties keep the order of `roots`.
/// Returns `Err(cycle)` if the dependencies are not acyclic.
pub(crate) fn dependency_order<K, F>(roots: &[K], deps: F) -> Result<Vec<K>, Vec<K>>
where
    K: Clone + Eq + Hash,
    F: Fn(&K) -> Vec<K>,
{
    let mut done = HashSet::new();
    let mut visiting = HashSet::new();
    let mut path = Vec::new();
    let mut order = Vec::new();

    for root in roots {
        visit(root, &deps, &mut done, &mut visiting, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit<K, F>(
    current: &K,
    deps: &F,
    done: &mut HashSet<K>,
    visiting: &mut HashSet<K>,
    path: &mut Vec<K>,
    order: &mut Vec<K>,
) -> Result<(), Vec<K>>
where
    K: Clone + Eq + Hash,
    F: Fn(&K) -> Vec<K>,
{
    if done.contains(current) {
        return Ok(());
    }
    if visiting.contains(current) {
        let start = path.iter().position(|k| k == current).unwrap_or(0);
        let mut cycle = path[start..].to_vec();
        cycle.push(current.clone());
        return Err(cycle);
    }

    visiting.insert(current.clone());
    path.push(current.clone());

    for dep in deps(current) {
        visit(&dep, deps, done, visiting, path, order)?;
    }

    path.pop();
    visiting.remove(current);
    done.insert(current.clone());
    order.push(current.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn graph(edges: &[(&'static str, &'static str)]) -> HashMap<&'static str, Vec<&'static str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
        for (from, to) in edges {
            map.entry(*from).or_default().push(*to);
        }
        map
    }

    #[test]
    fn test_dependencies_come_first() {
        let g = graph(&[("A", "B"), ("B", "C"), ("D", "C")]);
        let order = dependency_order(&["A", "D", "C", "B"], |k| g.get(k).cloned().unwrap_or_default()).unwrap();
        assert_eq!(order, vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn test_independent_roots_keep_their_order() {
        let order = dependency_order(&["Z", "Y", "X"], |_| Vec::new()).unwrap();
        assert_eq!(order, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let g = graph(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let cycle = dependency_order(&["A"], |k| g.get(k).cloned().unwrap_or_default()).unwrap_err();
        assert_eq!(cycle, vec!["A", "B", "C", "A"]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let g = graph(&[("A", "A")]);
        let cycle = dependency_order(&["A"], |k| g.get(k).cloned().unwrap_or_default()).unwrap_err();
        assert_eq!(cycle, vec!["A", "A"]);
    }
}
