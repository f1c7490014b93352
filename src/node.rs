//! Extraction of harmonic nodes, the locally most consonant chord shapes of
//! a [`DissonanceLattice`].

use crate::field::DissonanceLattice;
use serde::{Deserialize, Serialize};

/// A locally minimal, prominent point of a dissonance field.
///
/// Extracted on the grid first, then usually replaced by a continuous-valued
/// version from [`refine_node`](crate::refine::refine_node).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicNode {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub dissonance: f64,
    /// Depth of the well relative to its surroundings.
    pub prominence: f64,
    /// Prominence weighted by local steepness. Ranking criterion.
    pub curvature: f64,
}

/// Scans the lattice for up to `count` harmonic nodes, ranked by descending
/// curvature. `filter_size` is the half-width of the cubic window a candidate
/// must strictly undercut.
///
/// Deterministic: equal inputs always yield the same nodes in the same order.
pub fn extract_nodes(
    lattice: &DissonanceLattice,
    count: usize,
    filter_size: usize,
) -> Vec<HarmonicNode> {
    let n = lattice.num_points();
    let margin = boundary_margin(n);
    if count == 0 || 2 * margin >= n {
        return Vec::new();
    }
    let step = lattice.step_size();
    let prominence_reach = 6.max(2 * filter_size);

    let mut candidates = Vec::new();
    for i in margin..n - margin {
        for j in margin..n - margin {
            for k in margin..n - margin {
                let value = match lattice.get(i, j, k) {
                    Some(value) => f64::from(value),
                    None => continue,
                };
                let alpha = lattice.alpha_axis()[i];
                let beta = lattice.beta_axis()[j];
                let gamma = lattice.gamma_axis()[k];
                // Near-degenerate shapes with two nearly coinciding voices
                // are unison-like artifacts, not chords.
                if (beta - alpha).abs() < 2.0 * step || (gamma - beta).abs() < 2.0 * step {
                    continue;
                }
                if !is_strict_local_min(lattice, (i, j, k), value, filter_size) {
                    continue;
                }
                let prominence = match prominence(lattice, (i, j, k), value, prominence_reach) {
                    Some(prominence) => prominence,
                    None => continue,
                };
                let curvature = prominence * (1.0 + 10.0 * avg_gradient(lattice, (i, j, k), value));
                candidates.push(HarmonicNode {
                    alpha,
                    beta,
                    gamma,
                    dissonance: value,
                    prominence,
                    curvature,
                });
            }
        }
    }

    candidates.sort_by(|a, b| b.curvature.total_cmp(&a.curvature));
    candidates.truncate(count);
    candidates
}

/// At least 3 cells, or 10% of the axis, whichever is larger.
fn boundary_margin(n: usize) -> usize {
    3.max(n / 10)
}

fn is_strict_local_min(
    lattice: &DissonanceLattice,
    center: (usize, usize, usize),
    value: f64,
    half_width: usize,
) -> bool {
    let mut is_min = true;
    for_each_in_window(lattice, center, half_width, |neighbor| {
        if neighbor <= value {
            is_min = false;
        }
    });
    is_min
}

/// Height of the highest defined value within `reach` above the candidate.
/// [`None`] for flat plateaus whose wells are too shallow to matter.
fn prominence(
    lattice: &DissonanceLattice,
    center: (usize, usize, usize),
    value: f64,
    reach: usize,
) -> Option<f64> {
    let mut ceiling = value;
    for_each_in_window(lattice, center, reach, |neighbor| {
        ceiling = ceiling.max(neighbor);
    });
    let prominence = ceiling - value;
    if prominence < 0.001 {
        None
    } else {
        Some(prominence)
    }
}

/// Average absolute difference to the (defined) 26 immediate neighbors.
fn avg_gradient(lattice: &DissonanceLattice, center: (usize, usize, usize), value: f64) -> f64 {
    let mut total = 0.0;
    let mut neighbors = 0;
    for_each_in_window(lattice, center, 1, |neighbor| {
        total += (neighbor - value).abs();
        neighbors += 1;
    });
    if neighbors == 0 {
        0.0
    } else {
        total / f64::from(neighbors)
    }
}

/// Visits every defined cell in the cubic window of the given half-width,
/// excluding the center itself. Window bounds are clamped to the grid.
fn for_each_in_window(
    lattice: &DissonanceLattice,
    (i, j, k): (usize, usize, usize),
    half_width: usize,
    mut visit: impl FnMut(f64),
) {
    let n = lattice.num_points();
    let bounds = |center: usize| (center.saturating_sub(half_width), (center + half_width).min(n - 1));
    let (i_lo, i_hi) = bounds(i);
    let (j_lo, j_hi) = bounds(j);
    let (k_lo, k_hi) = bounds(k);
    for wi in i_lo..=i_hi {
        for wj in j_lo..=j_hi {
            for wk in k_lo..=k_hi {
                if (wi, wj, wk) == (i, j, k) {
                    continue;
                }
                if let Some(neighbor) = lattice.get(wi, wj, wk) {
                    visit(f64::from(neighbor));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CancellationToken, DissonanceLattice, FieldParams};

    fn lattice(n_points: usize) -> DissonanceLattice {
        let params = FieldParams::new(220.0, n_points, 6);
        DissonanceLattice::compute(params, &CancellationToken::new(), |_, _| ()).unwrap()
    }

    #[test]
    fn tiny_lattices_yield_no_nodes() {
        assert!(extract_nodes(&lattice(6), 10, 1).is_empty());
    }

    #[test]
    fn zero_count_yields_no_nodes() {
        assert!(extract_nodes(&lattice(30), 0, 1).is_empty());
    }

    #[test]
    fn nodes_are_sorted_by_descending_curvature() {
        let nodes = extract_nodes(&lattice(40), 10, 1);
        assert!(!nodes.is_empty());
        assert!(nodes
            .windows(2)
            .all(|pair| pair[0].curvature >= pair[1].curvature));
    }

    #[test]
    fn nodes_respect_margin_and_spacing() {
        let lattice = lattice(40);
        let margin = 4; // max(3, 40 / 10)
        let low = lattice.alpha_axis()[margin];
        let high = lattice.alpha_axis()[40 - margin - 1];
        let step = lattice.step_size();
        for node in extract_nodes(&lattice, 20, 1) {
            for coordinate in [node.alpha, node.beta, node.gamma] {
                assert!((low..=high).contains(&coordinate));
            }
            assert!(node.beta - node.alpha >= 2.0 * step);
            assert!(node.gamma - node.beta >= 2.0 * step);
            assert!(node.prominence >= 0.001);
            assert!(node.curvature >= node.prominence);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let lattice = lattice(30);
        let first = extract_nodes(&lattice, 8, 1);
        let second = extract_nodes(&lattice, 8, 1);
        assert_eq!(first, second);
    }
}
