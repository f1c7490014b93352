//! End-to-end coverage of the sweep, extraction, refinement and
//! classification pipeline on a small but real dissonance field.

use assert_approx_eq::assert_approx_eq;
use consonance::cache::{CacheKey, NodeCache};
use consonance::catalog::{self, TuningSystem};
use consonance::classify::{self, Note};
use consonance::dissonance::{self, AmplitudeMode};
use consonance::field::{CancellationToken, DissonanceLattice, FieldParams};
use consonance::node;
use consonance::refine::{self, RefineOptions};

const BASE_FREQ_HZ: f64 = 220.0;
const N_POINTS: usize = 24;
const HARMONICS: u16 = 6;

fn small_field() -> DissonanceLattice {
    let params = FieldParams::new(BASE_FREQ_HZ, N_POINTS, HARMONICS);
    DissonanceLattice::compute(params, &CancellationToken::new(), |_, _| {}).unwrap()
}

#[test]
fn sweep_agrees_with_direct_evaluation() {
    let lattice = small_field();
    for (i, j, k) in [(0, 0, 0), (3, 7, 11), (5, 5, 23)] {
        let shape = (
            lattice.alpha_axis()[i],
            lattice.beta_axis()[j],
            lattice.gamma_axis()[k],
        );
        let direct =
            dissonance::tetrad_dissonance(BASE_FREQ_HZ, shape, HARMONICS, AmplitudeMode::Min);
        assert_approx_eq!(f64::from(lattice.get(i, j, k).unwrap()), direct, 1e-4);
    }
}

#[test]
fn extraction_is_deterministic_and_ranked() {
    let lattice = small_field();
    let nodes = node::extract_nodes(&lattice, 10, 2);
    let again = node::extract_nodes(&lattice, 10, 2);
    assert_eq!(nodes, again);

    for pair in nodes.windows(2) {
        assert!(pair[0].curvature >= pair[1].curvature);
    }
    for node in &nodes {
        assert!(1.0 <= node.alpha && node.alpha <= node.beta && node.beta <= node.gamma);
        assert!(node.gamma <= 2.0);
        assert!(node.prominence >= 0.001);
    }
}

#[test]
fn refinement_never_worsens_extracted_nodes() {
    let lattice = small_field();
    for node in node::extract_nodes(&lattice, 5, 2) {
        let refined = refine::refine_node(
            node,
            BASE_FREQ_HZ,
            HARMONICS,
            RefineOptions::default(),
        );
        assert!(refined.dissonance <= node.dissonance);
        assert!(1.0 <= refined.alpha && refined.alpha <= refined.beta);
        assert!(refined.beta <= refined.gamma && refined.gamma <= 2.0);
        assert_approx_eq!(refined.prominence, node.prominence);
    }
}

#[test]
fn cache_shares_extraction_across_equal_keys() {
    let lattice = small_field();
    let cache = NodeCache::new();
    let key = CacheKey::new(BASE_FREQ_HZ, N_POINTS, HARMONICS);

    let first = cache.get_or_compute(key, || node::extract_nodes(&lattice, 5, 2));
    let second = cache.get_or_compute(key, || panic!("extraction must run at most once"));
    assert_eq!(first, second);
}

#[test]
fn exchange_layout_round_trips_through_bytes() {
    let lattice = small_field();
    let mut bytes = Vec::new();
    lattice.write_to(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 4 * (3 * N_POINTS + N_POINTS * N_POINTS * N_POINTS));

    let restored = DissonanceLattice::read_from(bytes.as_slice(), N_POINTS).unwrap();
    for (i, j, k) in [(0, 0, 0), (2, 9, 17), (23, 23, 23)] {
        assert_eq!(restored.get(i, j, k), lattice.get(i, j, k));
    }
    assert!(restored.get(5, 2, 0).is_none());
    assert_approx_eq!(restored.alpha_axis()[23], 2.0, 1e-6);
}

#[test]
fn catalog_voicings_classify_back_to_their_interval_qualities() {
    for template in catalog::chord_templates(TuningSystem::Tet53) {
        let root = Note::from_step(0);
        let mut notes = vec![root.clone()];
        notes.extend(template.third_steps.map(|s| Note::from_step(i32::from(s))));
        notes.extend(template.fifth_steps.map(|s| Note::from_step(i32::from(s))));
        notes.extend(template.seventh_steps.map(|s| Note::from_step(i32::from(s))));
        if notes.len() < 3 {
            continue;
        }

        // The voicing front end must recover the same interval qualities
        // the template was built from.
        let expected = classify::quality_name(
            template
                .third_steps
                .and_then(|s| classify::third_quality(i32::from(s))),
            template
                .fifth_steps
                .and_then(|s| classify::fifth_quality(i32::from(s))),
            template
                .seventh_steps
                .and_then(|s| classify::seventh_quality(i32::from(s))),
        );
        let quality = classify::classify_voicing(&notes, &root, 1);
        assert_eq!(
            quality.quality, expected,
            "voicing of template {} classified differently",
            template.name
        );
    }
}

#[test]
fn voicing_and_expanded_front_ends_agree_on_closed_chords() {
    let root = Note::from_step(0);
    let expanded = [0, 4, 18, 26, 31, 39, 49].map(Note::from_step);
    let voicing = [0, 18, 31, 49].map(Note::from_step);

    let from_expanded = classify::classify_expanded(&expanded, &root, 1);
    let from_voicing = classify::classify_voicing(&voicing, &root, 1);
    assert_eq!(from_expanded.quality, "maj7");
    assert_eq!(from_expanded.quality, from_voicing.quality);
    assert_eq!(from_expanded.family, from_voicing.family);
}
