//! Register placement of classified chords.
//!
//! Built-in templates keyed by diatonic function spread a chord's tones
//! across octaves. A small pure helper patches oversized register jumps
//! between consecutive voicings.

use crate::classify::TET_53;

/// One octave plus a major second, the default extension tone.
const NINTH_STEPS: i32 = TET_53 as i32 + 9;

/// Register jumps wider than this (a perfect fourth) ask for a filler tone.
const GAP_THRESHOLD: i32 = 22;

/// Tones a classified chord makes available for voicing, as steps above
/// the root.
#[derive(Copy, Clone, Debug)]
pub struct ChordTones {
    pub third: Option<i32>,
    pub fifth: Option<i32>,
    pub seventh: Option<i32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VoiceSlot {
    Root,
    Third,
    Fifth,
    Seventh,
    Ninth,
}

/// A voicing shape: which chord tone goes where, with per-voice octave
/// displacement.
pub struct VoicingTemplate {
    slots: &'static [(VoiceSlot, i32)],
}

impl VoicingTemplate {
    /// Places `tones` over an absolute `root_step`. Slots the chord cannot
    /// supply are skipped; the result is sorted and deduplicated.
    pub fn realize(&self, root_step: i32, tones: ChordTones) -> Vec<i32> {
        let octave = i32::from(TET_53);
        let mut steps: Vec<i32> = self
            .slots
            .iter()
            .filter_map(|&(slot, octaves)| {
                let offset = match slot {
                    VoiceSlot::Root => Some(0),
                    VoiceSlot::Third => tones.third,
                    VoiceSlot::Fifth => tones.fifth,
                    VoiceSlot::Seventh => tones.seventh,
                    VoiceSlot::Ninth => Some(NINTH_STEPS),
                };
                offset.map(|offset| root_step + offset + octaves * octave)
            })
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }
}

/// Template for a diatonic function, 1 through 7. Out-of-range degrees
/// fall back to the tonic shape.
pub fn template_for_function(degree: u8) -> &'static VoicingTemplate {
    use VoiceSlot::*;
    static CLOSED: VoicingTemplate = VoicingTemplate {
        slots: &[(Root, 0), (Third, 0), (Fifth, 0), (Seventh, 0)],
    };
    static SHELL_HIGH: VoicingTemplate = VoicingTemplate {
        slots: &[(Root, 0), (Seventh, 0), (Ninth, 0), (Third, 1)],
    };
    static CLOSED_NINTH: VoicingTemplate = VoicingTemplate {
        slots: &[(Root, 0), (Third, 0), (Fifth, 0), (Seventh, 0), (Ninth, 0)],
    };
    static SHELL: VoicingTemplate = VoicingTemplate {
        slots: &[(Root, 0), (Third, 0), (Seventh, 0), (Ninth, 0)],
    };
    static OPEN: VoicingTemplate = VoicingTemplate {
        slots: &[(Root, 0), (Fifth, 0), (Seventh, 0), (Third, 1)],
    };
    match degree {
        2 => &SHELL_HIGH,
        3 | 6 => &CLOSED_NINTH,
        4 => &SHELL,
        5 => &OPEN,
        _ => &CLOSED,
    }
}

/// Fills an oversized register jump between two consecutive voicings.
///
/// When the top voices of the previous and current chords are more than
/// [`GAP_THRESHOLD`] steps apart, the first `candidate` tone that falls
/// strictly inside the gap and keeps clear of the existing voices is added.
/// Otherwise the voicing is returned unchanged. Pure: previous state is an
/// explicit argument, never read from anywhere else.
pub fn fill_register_gap(
    current: &[i32],
    previous_top: Option<i32>,
    candidates: &[i32],
) -> Vec<i32> {
    let mut voicing = current.to_vec();
    let (previous_top, &current_top) = match (previous_top, current.iter().max()) {
        (Some(previous_top), Some(current_top)) => (previous_top, current_top),
        _ => return voicing,
    };
    if (previous_top - current_top).abs() <= GAP_THRESHOLD {
        return voicing;
    }
    let low = previous_top.min(current_top);
    let high = previous_top.max(current_top);
    for &candidate in candidates {
        let clashes = voicing.iter().any(|&step| (candidate - step).abs() <= 8);
        if low < candidate && candidate < high && !clashes {
            voicing.push(candidate);
            voicing.sort_unstable();
            break;
        }
    }
    voicing
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAJ7: ChordTones = ChordTones {
        third: Some(18),
        fifth: Some(31),
        seventh: Some(49),
    };

    #[test]
    fn tonic_template_is_the_closed_seventh_chord() {
        let voicing = template_for_function(1).realize(106, MAJ7);
        assert_eq!(voicing, vec![106, 124, 137, 155]);
    }

    #[test]
    fn absent_tones_drop_out_of_the_shape() {
        let triad = ChordTones {
            third: Some(13),
            fifth: Some(31),
            seventh: None,
        };
        let voicing = template_for_function(5).realize(0, triad);
        // Open shape keeps root, fifth and the raised third.
        assert_eq!(voicing, vec![0, 31, 13 + 53]);
    }

    #[test]
    fn each_function_gets_a_template() {
        for degree in 1..=7 {
            let voicing = template_for_function(degree).realize(0, MAJ7);
            assert!(voicing.len() >= 3);
            assert_eq!(voicing[0], 0);
        }
        // Unknown degrees fall back to the tonic shape.
        assert_eq!(
            template_for_function(0).realize(0, MAJ7),
            template_for_function(1).realize(0, MAJ7)
        );
    }

    #[test]
    fn submediant_and_leading_tone_reuse_the_closed_shapes() {
        // Degree 6 repeats the closed ninth shape, degree 7 the plain
        // closed seventh chord.
        assert_eq!(
            template_for_function(6).realize(0, MAJ7),
            vec![0, 18, 31, 49, 62]
        );
        assert_eq!(template_for_function(7).realize(0, MAJ7), vec![0, 18, 31, 49]);
    }

    #[test]
    fn small_jumps_stay_untouched() {
        let current = [0, 18, 31, 49];
        let patched = fill_register_gap(&current, Some(49 + 10), &[62]);
        assert_eq!(patched, current.to_vec());
    }

    #[test]
    fn wide_jumps_pull_in_a_filler_tone() {
        let current = [0, 18, 31, 49];
        // Previous chord topped out far above the current voicing.
        let patched = fill_register_gap(&current, Some(49 + 40), &[62, 75]);
        assert_eq!(patched, vec![0, 18, 31, 49, 62]);
    }

    #[test]
    fn fillers_too_close_to_a_voice_are_skipped() {
        let current = [0, 18, 31, 49];
        let patched = fill_register_gap(&current, Some(49 + 40), &[55, 62]);
        // 55 sits within 8 steps of the seventh, so the ninth is used.
        assert_eq!(patched, vec![0, 18, 31, 49, 62]);
    }

    #[test]
    fn no_previous_chord_means_no_change() {
        let current = [0, 18, 31];
        assert_eq!(fill_register_gap(&current, None, &[62]), current.to_vec());
    }
}
