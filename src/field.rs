//! Dissonance fields over a three-parameter ratio lattice.
//!
//! A field assigns every valid chord shape `(alpha, beta, gamma)` with
//! `alpha <= beta <= gamma` a [Plomp-Levelt dissonance](crate::dissonance)
//! score. Shapes violating the ordering are not part of the domain: their
//! cells are absent, not zero.

use crate::dissonance::{self, AmplitudeMode};
use crate::math;
use log::{info, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Parameters of a field sweep.
///
/// ```
/// # use consonance::field::FieldParams;
/// let params = FieldParams::new(220.0, 150, 8);
/// assert_eq!((params.r_low, params.r_high), (1.0, 2.0));
/// assert!(params.validate().is_ok());
/// ```
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct FieldParams {
    pub base_freq_hz: f64,
    #[serde(default = "default_r_low")]
    pub r_low: f64,
    #[serde(default = "default_r_high")]
    pub r_high: f64,
    pub n_points: usize,
    pub harmonics: u16,
    #[serde(default)]
    pub mode: AmplitudeMode,
}

fn default_r_low() -> f64 {
    1.0
}

fn default_r_high() -> f64 {
    2.0
}

impl FieldParams {
    pub fn new(base_freq_hz: f64, n_points: usize, harmonics: u16) -> Self {
        Self {
            base_freq_hz,
            r_low: default_r_low(),
            r_high: default_r_high(),
            n_points,
            harmonics,
            mode: AmplitudeMode::default(),
        }
    }

    pub fn with_bounds(mut self, r_low: f64, r_high: f64) -> Self {
        self.r_low = r_low;
        self.r_high = r_high;
        self
    }

    pub fn with_mode(mut self, mode: AmplitudeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Rejects unusable parameters before any sweep work starts.
    pub fn validate(&self) -> Result<(), FieldBuildError> {
        if self.n_points < 2 {
            return Err(FieldBuildError::NotEnoughPoints);
        }
        if !(self.base_freq_hz.is_finite() && self.base_freq_hz > 0.0) {
            return Err(FieldBuildError::BaseFreqNotPositive);
        }
        if self.harmonics == 0 {
            return Err(FieldBuildError::NoHarmonics);
        }
        if !(self.r_low.is_finite() && self.r_high.is_finite() && 0.0 < self.r_low)
            || self.r_low >= self.r_high
        {
            return Err(FieldBuildError::InvalidRatioBounds);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldBuildError {
    /// `n_points` must be at least 2 to span the ratio bounds.
    NotEnoughPoints,
    BaseFreqNotPositive,
    NoHarmonics,
    InvalidRatioBounds,
}

impl Display for FieldBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            FieldBuildError::NotEnoughPoints => "resolution must be at least 2 points per axis",
            FieldBuildError::BaseFreqNotPositive => "base frequency must be finite and positive",
            FieldBuildError::NoHarmonics => "harmonic count must be at least 1",
            FieldBuildError::InvalidRatioBounds => "ratio bounds must satisfy 0 < low < high",
        };
        write!(f, "{}", message)
    }
}

impl Error for FieldBuildError {}

#[derive(Debug)]
pub enum SweepError {
    InvalidParams(FieldBuildError),
    /// The sweep was cancelled cooperatively. No partial lattice is published.
    Cancelled,
}

impl Display for SweepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::InvalidParams(err) => write!(f, "invalid field parameters: {}", err),
            SweepError::Cancelled => write!(f, "field sweep cancelled"),
        }
    }
}

impl Error for SweepError {}

impl From<FieldBuildError> for SweepError {
    fn from(v: FieldBuildError) -> Self {
        SweepError::InvalidParams(v)
    }
}

/// Shared flag for cooperative cancellation of a running sweep.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Forwards progress to a host observer, guaranteeing monotonically
/// increasing percentages even when rows complete out of order.
struct ProgressSink<'a> {
    observer: &'a (dyn Fn(u8, &str) + Sync),
    last_percent: Mutex<u8>,
}

impl ProgressSink<'_> {
    fn report(&self, percent: u8, label: &str) {
        let mut last = self.last_percent.lock().unwrap();
        if percent >= *last {
            *last = percent;
            (self.observer)(percent, label);
        }
    }
}

/// An immutable 3D lattice of dissonance values over linearly spaced
/// alpha/beta/gamma axes.
///
/// Cells with `gamma < beta` or `beta < alpha` are outside the domain and
/// read back as [`None`].
pub struct DissonanceLattice {
    alpha_axis: Vec<f64>,
    beta_axis: Vec<f64>,
    gamma_axis: Vec<f64>,
    cells: Vec<f32>,
}

/// Stored in place of cells outside the ordered domain.
const PLACEHOLDER: f32 = f32::NAN;

impl DissonanceLattice {
    /// Runs the full sweep. This is the engine's only long-running
    /// operation; progress is reported through `observer` as
    /// `(percent 0..=100, label)` and the sweep stops early when `token` is
    /// cancelled, in which case no lattice is returned.
    pub fn compute(
        params: FieldParams,
        token: &CancellationToken,
        observer: impl Fn(u8, &str) + Sync,
    ) -> Result<Self, SweepError> {
        params.validate()?;

        let n = params.n_points;
        let progress = ProgressSink {
            observer: &observer,
            last_percent: Mutex::new(0),
        };
        progress.report(0, "sweeping dissonance field");
        info!(
            "sweeping {}x{}x{} dissonance field at {} Hz with {} harmonics",
            n, n, n, params.base_freq_hz, params.harmonics
        );

        let alpha_axis = math::linspace(params.r_low, params.r_high, n);
        let rows_done = AtomicUsize::new(0);

        let planes = (0..n)
            .into_par_iter()
            .map(|i| {
                if token.is_cancelled() {
                    return Err(SweepError::Cancelled);
                }
                let plane = sweep_plane(&params, &alpha_axis, i);
                trace!("swept alpha plane {} of {}", i + 1, n);
                let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                let percent = (done * 100 / n) as u8;
                progress.report(percent, "sweeping dissonance field");
                Ok(plane)
            })
            .collect::<Result<Vec<_>, _>>();

        let planes = match planes {
            Ok(planes) => planes,
            Err(err) => {
                info!(
                    "field sweep cancelled after {} rows",
                    rows_done.load(Ordering::Relaxed)
                );
                return Err(err);
            }
        };

        info!("field sweep complete");
        Ok(Self {
            beta_axis: alpha_axis.clone(),
            gamma_axis: alpha_axis.clone(),
            alpha_axis,
            cells: planes.concat(),
        })
    }

    /// Number of points per axis.
    pub fn num_points(&self) -> usize {
        self.alpha_axis.len()
    }

    /// Distance between two neighboring axis values.
    pub fn step_size(&self) -> f64 {
        (self.alpha_axis[self.num_points() - 1] - self.alpha_axis[0])
            / (self.num_points() - 1) as f64
    }

    pub fn alpha_axis(&self) -> &[f64] {
        &self.alpha_axis
    }

    pub fn beta_axis(&self) -> &[f64] {
        &self.beta_axis
    }

    pub fn gamma_axis(&self) -> &[f64] {
        &self.gamma_axis
    }

    /// Reads the cell at the given grid indices. [`None`] for cells outside
    /// the ordered domain or outside the grid.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f32> {
        let n = self.num_points();
        if i >= n || j >= n || k >= n {
            return None;
        }
        let value = self.cells[(i * n + j) * n + k];
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// Nearest-grid-point dissonance lookup for annotation purposes.
    ///
    /// No interpolation is performed; the optimizer never goes through this.
    pub fn dissonance_at(&self, alpha: f64, beta: f64, gamma: f64) -> Option<f32> {
        let i = self.nearest_index(alpha)?;
        let j = self.nearest_index(beta)?;
        let k = self.nearest_index(gamma)?;
        self.get(i, j, k)
    }

    fn nearest_index(&self, value: f64) -> Option<usize> {
        let low = self.alpha_axis[0];
        let high = self.alpha_axis[self.num_points() - 1];
        if !(low..=high).contains(&value) {
            return None;
        }
        let index = ((value - low) / self.step_size()).round() as usize;
        Some(index.min(self.num_points() - 1))
    }

    /// Writes the lattice in the exchange layout: alpha axis, beta axis,
    /// gamma axis, then the row-major cell block, all little-endian `f32`.
    /// Cells outside the domain keep their placeholder value. The reader
    /// must know `n_points` to reshape the stream.
    pub fn write_to(&self, mut target: impl Write) -> io::Result<()> {
        for axis in [&self.alpha_axis, &self.beta_axis, &self.gamma_axis] {
            for &value in axis.iter() {
                target.write_all(&(value as f32).to_le_bytes())?;
            }
        }
        for &cell in &self.cells {
            target.write_all(&cell.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads a lattice back from the exchange layout.
    pub fn read_from(mut source: impl Read, n_points: usize) -> Result<Self, LatticeReadError> {
        if n_points < 2 {
            return Err(LatticeReadError::NotEnoughPoints);
        }
        let mut read_f32s = |count: usize| -> io::Result<Vec<f32>> {
            let mut buf = vec![0; 4 * count];
            source.read_exact(&mut buf)?;
            Ok(buf
                .chunks_exact(4)
                .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                .collect())
        };
        let alpha_axis: Vec<f64> = read_f32s(n_points)?.iter().map(|&v| f64::from(v)).collect();
        let beta_axis: Vec<f64> = read_f32s(n_points)?.iter().map(|&v| f64::from(v)).collect();
        let gamma_axis: Vec<f64> = read_f32s(n_points)?.iter().map(|&v| f64::from(v)).collect();
        let cells = read_f32s(n_points * n_points * n_points)?;
        Ok(Self {
            alpha_axis,
            beta_axis,
            gamma_axis,
            cells,
        })
    }
}

#[derive(Debug)]
pub enum LatticeReadError {
    NotEnoughPoints,
    Io(io::Error),
}

impl Display for LatticeReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LatticeReadError::NotEnoughPoints => {
                write!(f, "resolution must be at least 2 points per axis")
            }
            LatticeReadError::Io(err) => write!(f, "could not read lattice data: {}", err),
        }
    }
}

impl Error for LatticeReadError {}

impl From<io::Error> for LatticeReadError {
    fn from(v: io::Error) -> Self {
        LatticeReadError::Io(v)
    }
}

/// Sweeps the plane of cells with a fixed alpha index. Only the triangular
/// half with `k >= j >= i` lies in the domain; `alpha <= beta` holds by
/// construction since the three axes are identical.
fn sweep_plane(params: &FieldParams, axis: &[f64], i: usize) -> Vec<f32> {
    let n = axis.len();
    let mut plane = vec![PLACEHOLDER; n * n];
    let alpha = axis[i];
    for j in i..n {
        let beta = axis[j];
        for k in j..n {
            let gamma = axis[k];
            plane[j * n + k] = dissonance::tetrad_dissonance(
                params.base_freq_hz,
                (alpha, beta, gamma),
                params.harmonics,
                params.mode,
            ) as f32;
        }
    }
    plane
}
