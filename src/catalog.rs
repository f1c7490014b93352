//! Named canonical chord shapes per tuning system.
//!
//! Each template pins a chord symbol to an `(alpha, beta, gamma)` ratio
//! triple so it can be placed, and annotated, inside a dissonance field.
//! The tables are static data; a lattice is only consulted for display.

use crate::classify::{self, IntervalQuality};
use crate::field::DissonanceLattice;
use crate::math;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TuningSystem {
    #[serde(rename = "12tet")]
    Tet12,
    #[serde(rename = "31tet")]
    Tet31,
    #[serde(rename = "53tet")]
    Tet53,
}

impl FromStr for TuningSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12" | "12tet" => Ok(TuningSystem::Tet12),
            "31" | "31tet" => Ok(TuningSystem::Tet31),
            "53" | "53tet" => Ok(TuningSystem::Tet53),
            other => Err(format!(
                "Invalid tuning system '{}'. Should be 12tet, 31tet or 53tet",
                other
            )),
        }
    }
}

impl TuningSystem {
    pub fn divisions(self) -> u16 {
        match self {
            TuningSystem::Tet12 => 12,
            TuningSystem::Tet31 => 31,
            TuningSystem::Tet53 => 53,
        }
    }
}

/// A named chord shape. `alpha`, `beta` and `gamma` are the frequency
/// ratios of the third, fifth and seventh slots; absent slots keep the
/// unison or octave defaults so every template stays inside the ordered
/// `[1, 2]` domain.
#[derive(Clone, Debug, Serialize)]
pub struct ChordTemplate {
    pub name: String,
    pub third_steps: Option<u16>,
    pub fifth_steps: Option<u16>,
    pub seventh_steps: Option<u16>,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl ChordTemplate {
    fn new(
        name: impl Into<String>,
        divisions: u16,
        third: Option<u16>,
        fifth: Option<u16>,
        seventh: Option<u16>,
    ) -> Self {
        let ratio = |steps: Option<u16>, default| match steps {
            Some(steps) => math::step_ratio(i32::from(steps), divisions),
            None => default,
        };
        Self {
            name: name.into(),
            third_steps: third,
            fifth_steps: fifth,
            seventh_steps: seventh,
            alpha: ratio(third, 1.0),
            beta: ratio(fifth, 1.0),
            gamma: ratio(seventh, 2.0),
        }
    }

    /// Nearest-grid-point dissonance of this shape, for annotation only.
    pub fn dissonance_in(&self, lattice: &DissonanceLattice) -> Option<f32> {
        lattice.dissonance_at(self.alpha, self.beta, self.gamma)
    }
}

/// The static chord table of a tuning system, built on first use.
pub fn chord_templates(tuning: TuningSystem) -> &'static [ChordTemplate] {
    static TET12: OnceLock<Vec<ChordTemplate>> = OnceLock::new();
    static TET31: OnceLock<Vec<ChordTemplate>> = OnceLock::new();
    static TET53: OnceLock<Vec<ChordTemplate>> = OnceLock::new();
    match tuning {
        TuningSystem::Tet12 => TET12.get_or_init(build_12tet),
        TuningSystem::Tet31 => TET31.get_or_init(build_31tet),
        TuningSystem::Tet53 => TET53.get_or_init(build_53tet),
    }
}

fn build_12tet() -> Vec<ChordTemplate> {
    let entry = |name: &str, third, fifth, seventh| {
        ChordTemplate::new(name, 12, Some(third), Some(fifth), seventh)
    };
    vec![
        entry("maj", 4, 7, None),
        entry("m", 3, 7, None),
        entry("dim", 3, 6, None),
        entry("aug", 4, 8, None),
        entry("sus2", 2, 7, None),
        entry("sus4", 5, 7, None),
        entry("maj7", 4, 7, Some(11)),
        entry("m7", 3, 7, Some(10)),
        entry("7", 4, 7, Some(10)),
        entry("dim7", 3, 6, Some(9)),
        entry("m7b5", 3, 6, Some(10)),
        entry("6", 4, 7, Some(9)),
    ]
}

/// 31-TET interval sizes. The perfect fifth is 18 steps; thirds and
/// sevenths come in five qualities each.
const THIRDS_31: [(IntervalQuality, u16); 5] = [
    (IntervalQuality::Subminor, 7),
    (IntervalQuality::Minor, 8),
    (IntervalQuality::Neutral, 9),
    (IntervalQuality::Major, 10),
    (IntervalQuality::Supermajor, 11),
];

const SEVENTHS_31: [(IntervalQuality, u16); 5] = [
    (IntervalQuality::Subminor, 25),
    (IntervalQuality::Minor, 26),
    (IntervalQuality::Neutral, 27),
    (IntervalQuality::Major, 28),
    (IntervalQuality::Supermajor, 29),
];

fn build_31tet() -> Vec<ChordTemplate> {
    const FIFTH: u16 = 18;
    const DIM_FIFTH: u16 = 17;
    const AUG_FIFTH: u16 = 19;
    const SIXTH: u16 = 23;

    let mut templates = Vec::new();
    let named = |third_q, fifth_q, seventh_q, third, fifth, seventh| {
        let mut name = classify::quality_name(Some(third_q), Some(fifth_q), seventh_q);
        if name.is_empty() {
            // A plain major triad has no suffix at all.
            name = "maj".to_string();
        }
        ChordTemplate::new(name, 31, Some(third), Some(fifth), seventh)
    };

    for (third_q, third) in THIRDS_31 {
        for (seventh_q, seventh) in SEVENTHS_31 {
            templates.push(named(
                third_q,
                IntervalQuality::Perfect,
                Some(seventh_q),
                third,
                FIFTH,
                Some(seventh),
            ));
        }
    }
    for (third_q, third) in THIRDS_31 {
        templates.push(named(third_q, IntervalQuality::Perfect, None, third, FIFTH, None));
    }
    // Half-diminished: minor third over the narrowed fifth.
    for (seventh_q, seventh) in SEVENTHS_31 {
        templates.push(named(
            IntervalQuality::Minor,
            IntervalQuality::Diminished,
            Some(seventh_q),
            8,
            DIM_FIFTH,
            Some(seventh),
        ));
    }
    // Augmented: major third over the widened fifth.
    for (seventh_q, seventh) in SEVENTHS_31 {
        templates.push(named(
            IntervalQuality::Major,
            IntervalQuality::Augmented,
            Some(seventh_q),
            10,
            AUG_FIFTH,
            Some(seventh),
        ));
    }
    // Sixth chords across all five thirds.
    for (third_q, third) in THIRDS_31 {
        templates.push(named(
            third_q,
            IntervalQuality::Perfect,
            Some(IntervalQuality::MajorSixth),
            third,
            FIFTH,
            Some(SIXTH),
        ));
    }
    templates.push(ChordTemplate::new("dim", 31, Some(8), Some(DIM_FIFTH), None));
    templates.push(ChordTemplate::new("dim7", 31, Some(8), Some(DIM_FIFTH), Some(23)));
    templates.push(ChordTemplate::new("aug", 31, Some(10), Some(AUG_FIFTH), None));
    templates.push(ChordTemplate::new("sus2", 31, Some(5), Some(FIFTH), None));
    templates.push(ChordTemplate::new("sus4", 31, Some(13), Some(FIFTH), None));
    templates.push(ChordTemplate::new("7sus4", 31, Some(13), Some(FIFTH), Some(26)));
    templates.push(ChordTemplate::new("5", 31, None, Some(FIFTH), None));
    templates.push(ChordTemplate::new("smdim", 31, Some(7), Some(DIM_FIFTH), None));
    templates
}

fn build_53tet() -> Vec<ChordTemplate> {
    const FIFTH: u16 = 31;
    const SIXTH: u16 = 39;
    const THIRDS: [u16; 10] = [11, 12, 13, 14, 15, 16, 17, 18, 19, 20];
    const SEVENTHS: [u16; 10] = [42, 43, 44, 45, 46, 47, 48, 49, 50, 51];
    const DIM_FIFTHS: [u16; 4] = [26, 28, 29, 30];
    const DIM_SEVENTHS: [u16; 5] = [42, 44, 46, 49, 51];

    let mut templates = Vec::new();
    let named = |third: u16, fifth: u16, seventh: Option<u16>| {
        let mut name = classify::quality_name(
            classify::third_quality(i32::from(third)),
            classify::fifth_quality(i32::from(fifth)),
            seventh.and_then(|s| classify::seventh_quality(i32::from(s))),
        );
        if name.is_empty() {
            name = "maj".to_string();
        }
        ChordTemplate::new(name, 53, Some(third), Some(fifth), seventh)
    };

    for third in THIRDS {
        for seventh in SEVENTHS {
            templates.push(named(third, FIFTH, Some(seventh)));
        }
    }
    for third in THIRDS {
        templates.push(named(third, FIFTH, None));
    }
    for third in THIRDS {
        templates.push(named(third, FIFTH, Some(SIXTH)));
    }
    // Four flat-five families over the minor third, from the standard
    // tritone up to the comma-narrowed fifth.
    for fifth in DIM_FIFTHS {
        for seventh in DIM_SEVENTHS {
            templates.push(named(13, fifth, Some(seventh)));
        }
    }
    // One augmented family over the major third.
    for seventh in DIM_SEVENTHS {
        templates.push(named(18, 32, Some(seventh)));
    }
    templates.push(ChordTemplate::new("sus2", 53, Some(9), Some(FIFTH), None));
    templates.push(ChordTemplate::new("sus4", 53, Some(22), Some(FIFTH), None));
    templates.push(ChordTemplate::new("dim", 53, Some(13), Some(30), None));
    templates.push(ChordTemplate::new("aug", 53, Some(18), Some(32), None));
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CancellationToken, DissonanceLattice, FieldParams};

    #[test]
    fn table_sizes_match_the_tuning_systems() {
        assert_eq!(chord_templates(TuningSystem::Tet12).len(), 12);
        assert_eq!(chord_templates(TuningSystem::Tet31).len(), 53);
        assert_eq!(chord_templates(TuningSystem::Tet53).len(), 149);
    }

    #[test]
    fn every_template_lies_in_the_ordered_domain() {
        for tuning in [TuningSystem::Tet12, TuningSystem::Tet31, TuningSystem::Tet53] {
            for template in chord_templates(tuning) {
                assert!(
                    1.0 <= template.alpha
                        && template.alpha <= template.beta
                        && template.beta <= template.gamma
                        && template.gamma <= 2.0,
                    "{} is out of domain",
                    template.name
                );
            }
        }
    }

    #[test]
    fn twelve_tet_ratios_follow_the_semitone_formula() {
        let major = &chord_templates(TuningSystem::Tet12)[0];
        assert_eq!(major.name, "maj");
        assert_eq!(major.alpha, f64::powf(2.0, 4.0 / 12.0));
        assert_eq!(major.beta, f64::powf(2.0, 7.0 / 12.0));
        assert_eq!(major.gamma, 2.0);
    }

    #[test]
    fn the_53tet_table_contains_the_canonical_seventh_chords() {
        let templates = chord_templates(TuningSystem::Tet53);
        let find = |name: &str| {
            templates
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing {}", name))
        };
        let maj7 = find("maj7");
        assert_eq!(
            (maj7.third_steps, maj7.fifth_steps, maj7.seventh_steps),
            (Some(18), Some(31), Some(49))
        );
        let dominant = find("7");
        assert_eq!(dominant.seventh_steps, Some(44));
        let half_dim = find("ø7");
        assert_eq!(half_dim.third_steps, Some(13));
        find("m7");
        find("S^S^7");
        find("sus4");
    }

    #[test]
    fn lattice_annotation_uses_the_nearest_grid_point() {
        let params = FieldParams::new(220.0, 24, 4);
        let lattice =
            DissonanceLattice::compute(params, &CancellationToken::new(), |_, _| ()).unwrap();
        let maj7 = chord_templates(TuningSystem::Tet53)
            .iter()
            .find(|t| t.name == "maj7")
            .unwrap();
        let annotated = maj7.dissonance_in(&lattice).unwrap();
        assert_eq!(
            Some(annotated),
            lattice.dissonance_at(maj7.alpha, maj7.beta, maj7.gamma)
        );
        assert!(annotated.is_finite());
    }
}
