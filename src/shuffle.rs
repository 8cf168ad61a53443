//! Shuffles for matching exercises.
//!
//! - [`derange`]: permutation where no position keeps its original value, so a
//!   definition never lands in its own term's slot.
//! - [`shuffled`]: plain uniform shuffle (Fisher–Yates), fixed points allowed.
//!
//! Equality is by value: two slots holding equal items are interchangeable.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

/// Random draws before switching to the deterministic construction.
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

/// How a derangement result was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DerangeMethod {
    /// Fewer than two items; returned as given.
    Unchanged,
    /// Uniform random permutation accepted after `attempts` draws.
    Sampled { attempts: usize },
    /// Random draws exhausted; built by shifting equal-value groups.
    Constructed,
    /// No derangement exists (one value fills more than half the slots);
    /// rotated by one position instead.
    Rotated,
}

#[derive(Clone, Debug, Serialize)]
pub struct Derangement<T> {
    pub items: Vec<T>,
    pub method: DerangeMethod,
}

/// True when no index of `candidate` holds the value found there in `original`.
pub fn has_no_fixed_points<T: PartialEq>(original: &[T], candidate: &[T]) -> bool {
    original.iter().zip(candidate).all(|(a, b)| a != b)
}

/// Permute `items` so that `out[i] != items[i]` for every `i`, whenever such a
/// permutation exists. Always terminates.
pub fn derange<T, R>(items: &[T], max_attempts: usize, rng: &mut R) -> Derangement<T>
where
    T: Clone + PartialEq,
    R: Rng + ?Sized,
{
    if items.len() < 2 {
        return Derangement { items: items.to_vec(), method: DerangeMethod::Unchanged };
    }

    let mut candidate = items.to_vec();
    for attempt in 1..=max_attempts {
        candidate.shuffle(rng);
        if has_no_fixed_points(items, &candidate) {
            return Derangement { items: candidate, method: DerangeMethod::Sampled { attempts: attempt } };
        }
    }

    match shift_groups(items) {
        Some(out) => {
            warn!(target: "activity", len = items.len(), max_attempts, "Derangement sampling exhausted; using group shift");
            Derangement { items: out, method: DerangeMethod::Constructed }
        }
        None => {
            warn!(target: "activity", len = items.len(), "No derangement exists; rotating by one");
            Derangement { items: rotate_by_one(items), method: DerangeMethod::Rotated }
        }
    }
}

/// Uniform random permutation; fixed points allowed.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Deterministic derangement: line slots up grouped by value, then move every
/// value forward by the size of the largest group. Exists iff no value occupies
/// more than half of the slots.
fn shift_groups<T: Clone + PartialEq>(items: &[T]) -> Option<Vec<T>> {
    let mut groups: Vec<Vec<usize>> = vec![];
    for (i, item) in items.iter().enumerate() {
        match groups.iter_mut().find(|g| items[g[0]] == *item) {
            Some(g) => g.push(i),
            None => groups.push(vec![i]),
        }
    }

    let n = items.len();
    let largest = groups.iter().map(Vec::len).max().unwrap_or(0);
    if largest * 2 > n {
        return None;
    }

    let order: Vec<usize> = groups.into_iter().flatten().collect();
    let mut out = items.to_vec();
    for k in 0..n {
        out[order[k]] = items[order[(k + largest) % n]].clone();
    }
    Some(out)
}

fn rotate_by_one<T: Clone>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    out.rotate_left(1);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sorted<T: Clone + Ord>(v: &[T]) -> Vec<T> {
        let mut v = v.to_vec();
        v.sort();
        v
    }

    #[test]
    fn sampled_output_is_a_derangement_and_a_permutation() {
        let input: Vec<String> = ["sol", "luna", "agua", "fuego", "tierra", "aire"].iter().map(|s| s.to_string()).collect();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let d = derange(&input, DEFAULT_MAX_ATTEMPTS, &mut rng);
            assert!(has_no_fixed_points(&input, &d.items), "seed {seed}: {:?}", d.items);
            assert_eq!(sorted(&d.items), sorted(&input));
            assert!(matches!(d.method, DerangeMethod::Sampled { .. } | DerangeMethod::Constructed));
        }
    }

    #[test]
    fn two_distinct_items_are_swapped() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = derange(&["a", "b"], DEFAULT_MAX_ATTEMPTS, &mut rng);
        assert_eq!(d.items, vec!["b", "a"]);
    }

    #[test]
    fn short_inputs_are_returned_unchanged() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: Vec<u8> = vec![];
        assert_eq!(derange(&empty, DEFAULT_MAX_ATTEMPTS, &mut rng).items, empty);
        let one = derange(&["solo"], DEFAULT_MAX_ATTEMPTS, &mut rng);
        assert_eq!(one.items, vec!["solo"]);
        assert_eq!(one.method, DerangeMethod::Unchanged);
    }

    #[test]
    fn equal_pair_terminates_by_rotation() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = derange(&["x", "x"], DEFAULT_MAX_ATTEMPTS, &mut rng);
        assert_eq!(d.items, vec!["x", "x"]);
        assert_eq!(d.method, DerangeMethod::Rotated);
    }

    #[test]
    fn majority_value_has_no_derangement() {
        let mut rng = StdRng::seed_from_u64(3);
        let input = [1, 1, 1, 2];
        let d = derange(&input, DEFAULT_MAX_ATTEMPTS, &mut rng);
        assert_eq!(d.method, DerangeMethod::Rotated);
        assert_eq!(d.items, vec![1, 1, 2, 1]);
    }

    #[test]
    fn construction_handles_heavy_duplicates() {
        // No random draws: goes straight to the group shift.
        let mut rng = StdRng::seed_from_u64(0);
        for input in [vec![1, 1, 2, 2], vec![1, 2, 1, 3, 1, 4], vec![5, 5, 5, 6, 6, 6], vec![1, 2, 3]] {
            let d = derange(&input, 0, &mut rng);
            assert_eq!(d.method, DerangeMethod::Constructed);
            assert!(has_no_fixed_points(&input, &d.items), "{input:?} -> {:?}", d.items);
            assert_eq!(sorted(&d.items), sorted(&input));
        }
    }

    #[test]
    fn sampling_succeeds_with_duplicates_when_feasible() {
        let input = ["a", "a", "b", "b", "c"];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let d = derange(&input, DEFAULT_MAX_ATTEMPTS, &mut rng);
            assert!(has_no_fixed_points(&input, &d.items));
        }
    }

    #[test]
    fn plain_shuffle_keeps_the_multiset() {
        let mut rng = StdRng::seed_from_u64(11);
        let input: Vec<u32> = (0..20).collect();
        let out = shuffled(&input, &mut rng);
        assert_eq!(out.len(), input.len());
        assert_eq!(sorted(&out), input);
    }
}
