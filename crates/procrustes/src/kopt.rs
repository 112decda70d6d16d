//! Greedy k-opt local search over permutations.
//!
//! Permutations are represented by assignment vectors (`perm[i]` is the image
//! of `i`). Every reordering of up to `k` positions of the current permutation
//! is tried; the first strict improvement is accepted and the scan continues
//! from the improved permutation until a full pass finds nothing better.

/// Objective value at or below which the search stops early.
const PERFECT_MATCH: f64 = 1e-8;

/// Locally optimize a permutation with the k-opt heuristic.
///
/// # Arguments
///
/// * `objective` - Function to minimize, evaluated on assignment vectors.
/// * `perm` - The initial permutation.
/// * `k` - Number of positions reordered at once; clamped to `perm.len()`.
///
/// # Returns
///
/// The locally optimal permutation and its objective value. The returned
/// value is never larger than the objective of `perm`.
pub fn kopt_heuristic<F>(objective: F, perm: Vec<usize>, k: usize) -> (Vec<usize>, f64)
where
    F: Fn(&[usize]) -> f64,
{
    let n = perm.len();
    let k = k.min(n);
    let mut best = perm;
    let mut best_error = objective(&best);
    if k < 2 {
        return (best, best_error);
    }

    let mut improved = true;
    while improved && best_error > PERFECT_MATCH {
        improved = false;
        for comb in Combinations::new(n, k) {
            // every ordering of the subset except the identity
            let mut order = (0..k).collect::<Vec<_>>();
            while next_permutation(&mut order) {
                let mut candidate = best.clone();
                for (t, &pos) in comb.iter().enumerate() {
                    candidate[pos] = best[comb[order[t]]];
                }
                let error = objective(&candidate);
                if error < best_error {
                    log::debug!("k-opt improvement: {} -> {}", best_error, error);
                    best = candidate;
                    best_error = error;
                    improved = true;
                    if best_error <= PERFECT_MATCH {
                        return (best, best_error);
                    }
                }
            }
        }
    }

    (best, best_error)
}

/// Lazy iterator over the `k`-subsets of `0..n`, as increasing index vectors
/// in lexicographic order.
struct Combinations {
    n: usize,
    k: usize,
    next: Option<Vec<usize>>,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        let next = (k <= n).then(|| (0..k).collect());
        Self { n, k, next }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let (n, k) = (self.n, self.k);

        // find the rightmost index that can still be incremented
        let mut comb = current.clone();
        let mut i = k;
        while i > 0 && comb[i - 1] == n - k + i - 1 {
            i -= 1;
        }
        if i > 0 {
            comb[i - 1] += 1;
            for j in i..k {
                comb[j] = comb[j - 1] + 1;
            }
            self.next = Some(comb);
        }

        Some(current)
    }
}

fn next_permutation(perm: &mut [usize]) -> bool {
    let n = perm.len();
    if n < 2 {
        return false;
    }
    let mut i = n - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = n - 1;
    while perm[j] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j);
    perm[i..].reverse();
    true
}
