use std::{collections::VecDeque, hash::Hash};

use crate::HashSet;

/// Lazily generate breadth-first distances on a graph according to a
/// neighbors function.
///
/// Nodes are yielded in nondecreasing distance order, each exactly once.
/// Callers can cap the search with `take`, the remaining graph is never
/// visited.
pub fn dijkstra_map<'a, T, I>(
    mut neighbors: impl FnMut(&T) -> I + 'a,
    starts: impl IntoIterator<Item = T>,
) -> impl Iterator<Item = (T, usize)> + 'a
where
    T: Clone + Eq + Hash + 'a,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::default();
    let mut edge: VecDeque<(T, usize)> = VecDeque::new();
    for s in starts {
        if seen.insert(s.clone()) {
            edge.push_back((s, 0));
        }
    }

    std::iter::from_fn(move || {
        // First-in, first-out, so the first time a node is popped it has
        // the shortest path length from the starts.
        let (node, len) = edge.pop_front()?;
        for n in neighbors(&node) {
            if seen.insert(n.clone()) {
                edge.push_back((n, len + 1));
            }
        }
        Some((node, len))
    })
}
