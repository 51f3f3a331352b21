use std::{collections::VecDeque, hash::Hash};

use crate::HashSet;

/// Expand a breadth-first fill over a graph given by a neighbors function.
///
/// Yields nodes in nondecreasing step-count order along with the number of
/// steps from the nearest start node. Every node is yielded at most once.
pub fn breadth_first<'a, T, I>(
    mut neighbors: impl FnMut(&T) -> I + 'a,
    starts: impl IntoIterator<Item = T>,
) -> impl Iterator<Item = (T, usize)> + 'a
where
    T: Clone + Eq + Hash + 'a,
    I: IntoIterator<Item = T>,
{
    let mut open: VecDeque<(T, usize)> =
        starts.into_iter().map(|s| (s, 0)).collect();
    let mut seen: HashSet<T> = HashSet::default();

    std::iter::from_fn(move || {
        while let Some((node, steps)) = open.pop_front() {
            if seen.insert(node.clone()) {
                for n in neighbors(&node) {
                    open.push_back((n, steps + 1));
                }
                return Some((node, steps));
            }
        }
        None
    })
}

/// Combinator for cutting a fill off at a given distance.
pub fn within_range<T>(n: usize) -> impl FnMut(&(T, usize)) -> bool {
    move |&(_, k)| k <= n
}
