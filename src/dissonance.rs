//! Plomp-Levelt sensory dissonance of a set of pure-tone partials.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Critical-bandwidth parametrization after Sethares' fit of the
// Plomp-Levelt curves.
const D_STAR: f64 = 0.24;
const S1: f64 = 0.0207;
const S2: f64 = 18.96;
const C1: f64 = 5.0;
const C2: f64 = -5.0;
const A1: f64 = -3.51;
const A2: f64 = -5.75;

/// A single pure-tone component of a compound sound.
///
/// Instances are ephemeral: they are assembled per evaluation and carry no
/// ownership semantics beyond the call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Partial {
    pub frequency_hz: f64,
    pub amplitude: f64,
}

impl Partial {
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
        }
    }
}

/// Selects how the amplitudes of two interfering partials are combined into
/// a pairwise roughness weight.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmplitudeMode {
    /// Weight each pair by the softer partial.
    Min,
    /// Weight each pair by the product of both amplitudes.
    Product,
}

impl Default for AmplitudeMode {
    fn default() -> Self {
        AmplitudeMode::Min
    }
}

impl FromStr for AmplitudeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(AmplitudeMode::Min),
            "product" => Ok(AmplitudeMode::Product),
            other => Err(format!(
                "Invalid amplitude mode '{}'. Should be min or product",
                other
            )),
        }
    }
}

/// Scores the sensory dissonance of the given partials.
///
/// The partials are sorted by frequency and every unordered pair contributes
/// a roughness term scaled by the critical bandwidth around the lower
/// frequency. Zero or one partials are a defined degenerate case scoring 0.
///
/// The function is pure and invariant under reordering of its input.
///
/// # Examples
///
/// Two partials at the same frequency cancel exactly:
///
/// ```
/// # use assert_approx_eq::assert_approx_eq;
/// # use consonance::dissonance::{dissonance, AmplitudeMode, Partial};
/// let unison = [Partial::new(440.0, 1.0), Partial::new(440.0, 1.0)];
/// assert_approx_eq!(dissonance(&unison, AmplitudeMode::Min), 0.0);
/// ```
///
/// A slightly detuned pair is rough:
///
/// ```
/// # use consonance::dissonance::{dissonance, AmplitudeMode, Partial};
/// let beating = [Partial::new(440.0, 1.0), Partial::new(460.0, 1.0)];
/// assert!(dissonance(&beating, AmplitudeMode::Min) > 0.1);
/// ```
pub fn dissonance(partials: &[Partial], mode: AmplitudeMode) -> f64 {
    if partials.len() < 2 {
        return 0.0;
    }

    let mut sorted = partials.to_vec();
    sorted.sort_by(|a, b| a.frequency_hz.total_cmp(&b.frequency_hz));

    let mut total = 0.0;
    for i in 0..sorted.len() - 1 {
        let lower = sorted[i];
        let bandwidth_scale = D_STAR / (S1 * lower.frequency_hz + S2);
        for upper in &sorted[i + 1..] {
            let weight = match mode {
                AmplitudeMode::Min => lower.amplitude.min(upper.amplitude),
                AmplitudeMode::Product => lower.amplitude * upper.amplitude,
            };
            let x = bandwidth_scale * (upper.frequency_hz - lower.frequency_hz);
            total += weight * (C1 * (A1 * x).exp() + C2 * (A2 * x).exp());
        }
    }

    total
}

/// Appends the harmonic series of `fundamental_hz` with `num_harmonics`
/// unit-amplitude partials to `target`.
pub fn push_harmonics(target: &mut Vec<Partial>, fundamental_hz: f64, num_harmonics: u16) {
    for harmonic in 1..=num_harmonics {
        target.push(Partial::new(fundamental_hz * f64::from(harmonic), 1.0));
    }
}

/// Scores a root-plus-three-tones tetrad where each tone is the root
/// transposed by one of the given frequency ratios.
///
/// All four tones carry the same `num_harmonics`-partial unit-amplitude
/// timbre, so the model sees `4 * num_harmonics` partials per call.
pub fn tetrad_dissonance(
    base_freq_hz: f64,
    (alpha, beta, gamma): (f64, f64, f64),
    num_harmonics: u16,
    mode: AmplitudeMode,
) -> f64 {
    let mut partials = Vec::with_capacity(4 * usize::from(num_harmonics));
    push_harmonics(&mut partials, base_freq_hz, num_harmonics);
    push_harmonics(&mut partials, base_freq_hz * alpha, num_harmonics);
    push_harmonics(&mut partials, base_freq_hz * beta, num_harmonics);
    push_harmonics(&mut partials, base_freq_hz * gamma, num_harmonics);
    dissonance(&partials, mode)
}
