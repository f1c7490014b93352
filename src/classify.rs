//! Chord classification in 53-step equal temperament.
//!
//! A voicing's absolute tuning steps are reduced to third/fifth/seventh
//! interval qualities, which resolve to a canonical chord symbol through a
//! rule table with a strict-abbreviation fallback. Classification is
//! independent of the dissonance field; it only sees note data.

use crate::math;
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Steps per octave of the classification space.
pub const TET_53: u16 = 53;

/// Display names for the 53 pitch classes, index 0 = C.
pub const NOTE_NAMES_53TET: [&str; 53] = [
    "C", "^C", "^^C", "vvC#", "vC#", "C#", "^C#", "^^C#", "vD", "D", "^D", "^^D", "vvD#", "vD#",
    "D#", "^^Eb", "vvE", "vE", "E", "^E", "^^E", "vF", "F", "^F", "^^F", "vvF#", "vF#", "F#",
    "^F#", "^^F#", "vG", "G", "^G", "^^G", "vvG#", "vG#", "G#", "^G#", "vvA", "vA", "A", "^A",
    "^^A", "vBb", "Bb", "^Bb", "^^Bb", "vvB", "vB", "B", "^B", "^^B", "vC",
];

/// A sounding note: an absolute 53-TET step count and its display name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Note {
    pub step: i32,
    pub name: String,
}

impl Note {
    /// ```
    /// # use consonance::classify::Note;
    /// assert_eq!(Note::from_step(53 + 18).name, "E");
    /// assert_eq!(Note::from_step(-53).name, "C");
    /// ```
    pub fn from_step(step: i32) -> Self {
        let pitch_class = math::rem_positive(step, TET_53) as usize;
        Self {
            step,
            name: NOTE_NAMES_53TET[pitch_class].to_string(),
        }
    }

    fn pitch_class(&self) -> i32 {
        math::rem_positive(self.step, TET_53)
    }
}

/// Semantic quality of a single interval above the root.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalQuality {
    MajorSecond,
    Subminor,
    Downminor,
    Minor,
    NeutralMinor,
    Neutral,
    NeutralMajor,
    Downmajor,
    Major,
    Upmajor,
    Supermajor,
    Ultramajor,
    Fourth,
    DiminishedFifth,
    Subdiminished,
    Downdiminished,
    Diminished,
    Perfect,
    Augmented,
    Upaugmented,
    AugmentedFifth,
    MajorSixth,
    DiminishedSeventh,
}

use IntervalQuality::*;

/// Quality of the third slot, from its raw step count above the root.
pub fn third_quality(steps: i32) -> Option<IntervalQuality> {
    Some(match steps {
        9 => MajorSecond,
        10 | 11 => Subminor,
        12 => Downminor,
        13 => Minor,
        14 => NeutralMinor,
        15 => Neutral,
        16 => NeutralMajor,
        17 => Downmajor,
        18 => Major,
        19 => Upmajor,
        20 => Supermajor,
        21 => Ultramajor,
        22 => Fourth,
        _ => return None,
    })
}

pub fn fifth_quality(steps: i32) -> Option<IntervalQuality> {
    Some(match steps {
        26 | 27 => DiminishedFifth,
        28 => Subdiminished,
        29 => Downdiminished,
        30 => Diminished,
        31 => Perfect,
        32 => Augmented,
        33 | 34 => Upaugmented,
        35 | 36 => AugmentedFifth,
        _ => return None,
    })
}

pub fn seventh_quality(steps: i32) -> Option<IntervalQuality> {
    Some(match steps {
        39 => MajorSixth,
        40 | 41 => DiminishedSeventh,
        42 => Subminor,
        43 => Downminor,
        44 => Minor,
        45 => NeutralMinor,
        46 => Neutral,
        47 => NeutralMajor,
        48 => Downmajor,
        49 => Major,
        50 => Upmajor,
        51 | 52 => Supermajor,
        _ => return None,
    })
}

/// Canonical names for third/fifth/seventh quality combinations. Resolved
/// before the abbreviation fallback kicks in.
const CHORD_RULES: &[(IntervalQuality, IntervalQuality, IntervalQuality, &str)] = &[
    (Supermajor, Perfect, Supermajor, "S^S^7"),
    (Supermajor, Perfect, Upmajor, "S^^7"),
    (Supermajor, Perfect, Major, "S^M7"),
    (Supermajor, Perfect, Downmajor, "S^^7"),
    (Supermajor, Perfect, NeutralMajor, "S^NM7"),
    (Supermajor, Perfect, Neutral, "S^N7"),
    (Supermajor, Perfect, NeutralMinor, "S^Nm7"),
    (Supermajor, Perfect, Minor, "S^m7"),
    (Supermajor, Perfect, Downminor, "S^vm7"),
    (Supermajor, Perfect, Subminor, "S^sm7"),
    (Upmajor, Perfect, Supermajor, "^S^7"),
    (Upmajor, Perfect, Upmajor, "^^7"),
    (Upmajor, Perfect, Major, "^M7"),
    (Upmajor, Perfect, Downmajor, "^v7"),
    (Upmajor, Perfect, NeutralMajor, "^NM7"),
    (Upmajor, Perfect, Neutral, "^N7"),
    (Upmajor, Perfect, NeutralMinor, "^Nm7"),
    (Upmajor, Perfect, Minor, "^m7"),
    (Upmajor, Perfect, Downminor, "^vm7"),
    (Upmajor, Perfect, Subminor, "^sm7"),
    (Major, Perfect, Supermajor, "S^7"),
    (Major, Perfect, Upmajor, "^M7"),
    (Major, Perfect, Major, "maj7"),
    (Major, Perfect, Downmajor, "vM7"),
    (Major, Perfect, NeutralMajor, "NM7"),
    (Major, Perfect, Neutral, "N7"),
    (Major, Perfect, NeutralMinor, "Nm7"),
    (Major, Perfect, Minor, "7"),
    (Major, Perfect, Downminor, "vm7"),
    (Major, Perfect, Subminor, "sm7"),
    (Downmajor, Perfect, Supermajor, "vMS^7"),
    (Downmajor, Perfect, Upmajor, "vM^M7"),
    (Downmajor, Perfect, Major, "vMM7"),
    (Downmajor, Perfect, Downmajor, "vMvM7"),
    (Downmajor, Perfect, NeutralMajor, "vMNM7"),
    (Downmajor, Perfect, Neutral, "vMN7"),
    (Downmajor, Perfect, NeutralMinor, "vMNm7"),
    (Downmajor, Perfect, Minor, "vMm7"),
    (Downmajor, Perfect, Downminor, "vMvm7"),
    (Downmajor, Perfect, Subminor, "vMsm7"),
    (NeutralMajor, Perfect, Supermajor, "NMS^7"),
    (NeutralMajor, Perfect, Upmajor, "NM^7"),
    (NeutralMajor, Perfect, Major, "NMM7"),
    (NeutralMajor, Perfect, Downmajor, "NMvM7"),
    (NeutralMajor, Perfect, NeutralMajor, "NMNM7"),
    (NeutralMajor, Perfect, Neutral, "NMN7"),
    (NeutralMajor, Perfect, NeutralMinor, "NMNm7"),
    (NeutralMajor, Perfect, Minor, "NMm7"),
    (NeutralMajor, Perfect, Downminor, "NMvm7"),
    (NeutralMajor, Perfect, Subminor, "NMsm7"),
    (Neutral, Perfect, Supermajor, "NS^7"),
    (Neutral, Perfect, Upmajor, "N^7"),
    (Neutral, Perfect, Major, "NM7"),
    (Neutral, Perfect, Downmajor, "NvM7"),
    (Neutral, Perfect, NeutralMajor, "NNM7"),
    (Neutral, Perfect, Neutral, "NN7"),
    (Neutral, Perfect, NeutralMinor, "NNm7"),
    (Neutral, Perfect, Minor, "Nm7"),
    (Neutral, Perfect, Downminor, "Nvm7"),
    (Neutral, Perfect, Subminor, "Nsm7"),
    (NeutralMinor, Perfect, Supermajor, "NmS^7"),
    (NeutralMinor, Perfect, Upmajor, "Nm^7"),
    (NeutralMinor, Perfect, Major, "NmM7"),
    (NeutralMinor, Perfect, Downmajor, "NmvM7"),
    (NeutralMinor, Perfect, NeutralMajor, "NmNM7"),
    (NeutralMinor, Perfect, Neutral, "NmN7"),
    (NeutralMinor, Perfect, NeutralMinor, "NmNm7"),
    (NeutralMinor, Perfect, Minor, "Nmm7"),
    (NeutralMinor, Perfect, Downminor, "Nmvm7"),
    (NeutralMinor, Perfect, Subminor, "Nmsm7"),
    (Minor, Perfect, Supermajor, "mS^7"),
    (Minor, Perfect, Upmajor, "m^7"),
    (Minor, Perfect, Major, "mM7"),
    (Minor, Perfect, Downmajor, "mvM7"),
    (Minor, Perfect, NeutralMajor, "mNM7"),
    (Minor, Perfect, Neutral, "mN7"),
    (Minor, Perfect, NeutralMinor, "mNm7"),
    (Minor, Perfect, Minor, "m7"),
    (Minor, Perfect, Downminor, "mvm7"),
    (Minor, Perfect, Subminor, "msm7"),
    (Downminor, Perfect, Supermajor, "vmS^7"),
    (Downminor, Perfect, Upmajor, "vm^7"),
    (Downminor, Perfect, Major, "vmM7"),
    (Downminor, Perfect, Downmajor, "vmvM7"),
    (Downminor, Perfect, NeutralMajor, "vmNM7"),
    (Downminor, Perfect, Neutral, "vmN7"),
    (Downminor, Perfect, NeutralMinor, "vmNm7"),
    (Downminor, Perfect, Minor, "vmm7"),
    (Downminor, Perfect, Downminor, "vmvm7"),
    (Downminor, Perfect, Subminor, "vmsm7"),
    (Subminor, Perfect, Supermajor, "smS^7"),
    (Subminor, Perfect, Subminor, "smsm7"),
    (Subminor, Perfect, Minor, "smm7"),
    (Subminor, Perfect, Neutral, "smN7"),
    (Subminor, Perfect, Major, "smM7"),
    (Minor, Diminished, Subminor, "smø7"),
    (Minor, Diminished, Minor, "ø7"),
    (Minor, Diminished, Neutral, "øN7"),
    (Minor, Diminished, Major, "øM7"),
    (Minor, Diminished, Supermajor, "øS^7"),
    (Major, Augmented, Subminor, "M+sm7"),
    (Major, Augmented, Minor, "M+m7"),
    (Major, Augmented, Neutral, "M+N7"),
    (Major, Augmented, Major, "M+7"),
    (Major, Augmented, Supermajor, "M+S^7"),
];

const TRIAD_RULES: &[(IntervalQuality, IntervalQuality, &str)] =
    &[(Major, Perfect, ""), (Minor, Perfect, "m")];

fn triad_prefix(third: IntervalQuality) -> Option<&'static str> {
    Some(match third {
        Supermajor => "S^",
        Ultramajor => "S^^",
        Upmajor => "^",
        Major => "",
        Downmajor => "vM",
        NeutralMajor => "NM",
        Neutral => "N",
        NeutralMinor => "Nm",
        Minor => "m",
        Downminor => "vm",
        Subminor => "sm",
        _ => return None,
    })
}

fn fifth_suffix(fifth: IntervalQuality) -> Option<&'static str> {
    Some(match fifth {
        Perfect => "",
        Diminished => "dim",
        Augmented => "+",
        DiminishedFifth => "(b5)",
        AugmentedFifth => "(#5)",
        MajorSecond => "(sus2)",
        Fourth => "(sus4)",
        Downdiminished => "vdim",
        Subdiminished => "sdim",
        Upaugmented => "^+",
        _ => return None,
    })
}

fn seventh_suffix(seventh: IntervalQuality) -> Option<&'static str> {
    Some(match seventh {
        Supermajor => "S^7",
        Upmajor => "^7",
        Major => "M7",
        Downmajor => "vM7",
        NeutralMajor => "NM7",
        Neutral => "N7",
        NeutralMinor => "Nm7",
        Minor => "7",
        Downminor => "vm7",
        Subminor => "sm7",
        DiminishedSeventh => "dim7",
        MajorSixth => "6",
        _ => return None,
    })
}

/// Resolves a quality combination to its canonical chord symbol.
///
/// Exact rule-table matches win; everything else is composed from the strict
/// abbreviations. An empty string is a valid outcome (a plain major triad).
///
/// ```
/// # use consonance::classify::{quality_name, IntervalQuality::*};
/// assert_eq!(quality_name(Some(Major), Some(Perfect), Some(Major)), "maj7");
/// assert_eq!(quality_name(Some(Minor), Some(Perfect), None), "m");
/// assert_eq!(quality_name(Some(Major), Some(Perfect), None), "");
/// ```
pub fn quality_name(
    third: Option<IntervalQuality>,
    fifth: Option<IntervalQuality>,
    seventh: Option<IntervalQuality>,
) -> String {
    // The comma-narrowed and the standard diminished fifth share their rules.
    let table_fifth = match fifth {
        Some(DiminishedFifth) => Some(Diminished),
        other => other,
    };

    if let (Some(third), Some(table_fifth), Some(seventh)) = (third, table_fifth, seventh) {
        for &(r3, r5, r7, name) in CHORD_RULES {
            if r3 == third && r5 == table_fifth && r7 == seventh {
                return name.to_string();
            }
        }
    }
    if let (Some(third), Some(table_fifth), None) = (third, table_fifth, seventh) {
        for &(r3, r5, name) in TRIAD_RULES {
            if r3 == third && r5 == table_fifth {
                return name.to_string();
            }
        }
    }

    // Thirds without a strict abbreviation keep a parenthesized marker so
    // the suspension survives into the composed symbol.
    let base = match third {
        Some(MajorSecond) => "(sus2)".to_string(),
        Some(Fourth) => "(sus4)".to_string(),
        Some(third) => triad_prefix(third).map(str::to_string).unwrap_or_default(),
        None => String::new(),
    };
    let fifth_part = match fifth {
        Some(fifth) => fifth_suffix(fifth).map(str::to_string).unwrap_or_default(),
        None => String::new(),
    };
    let seventh_part = match seventh {
        None => String::new(),
        Some(Minor) => {
            // The bare dominant interval reads as "7" over major and minor
            // triads; elsewhere it keeps the explicit "m7".
            if third == Some(Major) || base.ends_with('m') {
                "7".to_string()
            } else {
                "m7".to_string()
            }
        }
        Some(DiminishedSeventh) => {
            if fifth_part.contains("dim") || fifth_part == "(b5)" {
                if base == "m" && matches!(fifth, Some(Diminished) | Some(DiminishedFifth)) {
                    return "dim7".to_string();
                }
                "7".to_string()
            } else if fifth_part.is_empty() {
                "dim7".to_string()
            } else {
                String::new()
            }
        }
        Some(seventh) => seventh_suffix(seventh)
            .map(str::to_string)
            .unwrap_or_default(),
    };

    format!("{}{}{}", base, fifth_part, seventh_part)
}

/// Broad family a chord quality belongs to, used for display coloring.
///
/// Assigned once at classification time; order of the checks is part of the
/// contract (a dominant seventh colors as dominant even though its third is
/// major).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityFamily {
    DominantSeventh,
    MajorSeventh,
    Major,
    UpMajor,
    NeutralMinor,
    NeutralMajor,
    DownMinor,
    Minor,
    Augmented,
    Other,
}

impl QualityFamily {
    fn derive(
        third: Option<IntervalQuality>,
        fifth: Option<IntervalQuality>,
        seventh: Option<IntervalQuality>,
    ) -> Self {
        if third == Some(Major) && fifth == Some(Perfect) && seventh == Some(Minor) {
            QualityFamily::DominantSeventh
        } else if third == Some(Major) && seventh == Some(Major) {
            QualityFamily::MajorSeventh
        } else if third == Some(Major) {
            QualityFamily::Major
        } else if third == Some(Upmajor) || third == Some(Supermajor) {
            QualityFamily::UpMajor
        } else if third == Some(NeutralMinor) {
            QualityFamily::NeutralMinor
        } else if third == Some(NeutralMajor) || third == Some(Neutral) {
            QualityFamily::NeutralMajor
        } else if third == Some(Downminor) || third == Some(Subminor) {
            QualityFamily::DownMinor
        } else if third == Some(Minor) {
            QualityFamily::Minor
        } else if matches!(fifth, Some(Augmented) | Some(Upaugmented) | Some(AugmentedFifth)) {
            QualityFamily::Augmented
        } else {
            QualityFamily::Other
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            QualityFamily::DominantSeventh => "#e6773e",
            QualityFamily::MajorSeventh => "#f2c14e",
            QualityFamily::Major => "#e8d44d",
            QualityFamily::UpMajor => "#c7e04c",
            QualityFamily::NeutralMinor => "#5e9ec7",
            QualityFamily::NeutralMajor => "#7fc7a6",
            QualityFamily::DownMinor => "#6a5acd",
            QualityFamily::Minor => "#4a7ab5",
            QualityFamily::Augmented => "#d95d6a",
            QualityFamily::Other => "#9a9a9a",
        }
    }
}

/// Result of classifying one voicing. Recomputed whenever the note set
/// changes; never persisted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChordQuality {
    pub root_name: String,
    pub quality: String,
    /// Diatonic function, "I" through "VII".
    pub function: &'static str,
    pub family: QualityFamily,
    /// Bass note name when the lowest sounding note is not the root.
    pub bass_name: Option<String>,
}

impl ChordQuality {
    /// Degenerate classification for fewer than three sounding notes.
    pub fn empty() -> Self {
        Self {
            root_name: String::new(),
            quality: String::new(),
            function: "I",
            family: QualityFamily::Other,
            bass_name: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root_name.is_empty()
    }

    /// Chord symbol without the function annotation.
    pub fn symbol(&self) -> String {
        match &self.bass_name {
            Some(bass) => format!("{}{}/{}", self.root_name, self.quality, bass),
            None => format!("{}{}", self.root_name, self.quality),
        }
    }
}

impl Display for ChordQuality {
    /// Full display form, slash bass under inversion, function in brackets.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "N.C.");
        }
        write!(f, "{} [{}]", self.symbol(), self.function)
    }
}

fn roman_numeral(degree: u8) -> &'static str {
    match degree {
        2 => "II",
        3 => "III",
        4 => "IV",
        5 => "V",
        6 => "VI",
        7 => "VII",
        _ => "I",
    }
}

/// Classifies a pre-expanded, diatonically interleaved note array.
///
/// Position 0 is the root, position 2 the third, position 4 the fifth and
/// position 6 the seventh. Slots beyond the array's length are treated as
/// absent, so a 5-note array still gets a (partial) triad classification.
/// Fewer than three notes degenerate to the empty classification.
pub fn classify_expanded(notes: &[Note], root: &Note, degree: u8) -> ChordQuality {
    if notes.len() < 3 {
        return ChordQuality::empty();
    }
    let interval = |position: usize| {
        notes
            .get(position)
            .map(|note: &Note| note.step - root.step)
    };
    let third = interval(2).and_then(third_quality);
    let fifth = interval(4).and_then(fifth_quality);
    let seventh = interval(6).and_then(seventh_quality);
    finish(notes, root, degree, third, fifth, seventh)
}

/// Classifies an arbitrary voicing by reducing every step modulo 53
/// relative to the root.
///
/// The first interval landing in each slot's range claims that slot; the
/// fifth slot is checked before the seventh, so the 33 to 36 overlap region
/// reads as an altered fifth rather than a low seventh.
pub fn classify_voicing(notes: &[Note], root: &Note, degree: u8) -> ChordQuality {
    if notes.len() < 3 {
        return ChordQuality::empty();
    }
    let mut intervals: Vec<i32> = notes
        .iter()
        .map(|note| math::rem_positive(note.step - root.step, TET_53))
        .filter(|&interval| interval > 0)
        .collect();
    intervals.sort_unstable();
    intervals.dedup();

    let mut third = None;
    let mut fifth = None;
    let mut seventh = None;
    for &interval in &intervals {
        if third.is_none() && (9..=22).contains(&interval) {
            third = third_quality(interval);
        } else if fifth.is_none() && (26..=36).contains(&interval) {
            fifth = fifth_quality(interval);
        } else if seventh.is_none() && (39..=52).contains(&interval) {
            seventh = seventh_quality(interval);
        }
    }
    finish(notes, root, degree, third, fifth, seventh)
}

fn finish(
    notes: &[Note],
    root: &Note,
    degree: u8,
    third: Option<IntervalQuality>,
    fifth: Option<IntervalQuality>,
    seventh: Option<IntervalQuality>,
) -> ChordQuality {
    let bass = notes.iter().min_by_key(|note| note.step);
    let bass_name = bass
        .filter(|bass| bass.pitch_class() != root.pitch_class())
        .map(|bass| bass.name.clone());
    ChordQuality {
        root_name: root.name.clone(),
        quality: quality_name(third, fifth, seventh),
        function: roman_numeral(degree),
        family: QualityFamily::derive(third, fifth, seventh),
        bass_name,
    }
}
