use clap::Parser;
use consonance::dissonance::AmplitudeMode;
use consonance::field::{CancellationToken, DissonanceLattice, FieldParams};
use log::info;

use crate::{App, CliResult};

#[derive(Parser)]
pub struct SweepOptions {
    /// Base frequency of the chord root in Hz
    #[arg(long = "bf", default_value = "220.0")]
    pub base_freq_hz: f64,

    /// Points per axis
    #[arg(long = "np", default_value = "150")]
    pub n_points: usize,

    /// Number of harmonics per voice
    #[arg(long = "harm", default_value = "8")]
    pub harmonics: u16,

    /// Amplitude combination mode: min or product
    #[arg(long = "mode", default_value = "min")]
    pub mode: AmplitudeMode,

    /// Lower ratio bound of each axis
    #[arg(long = "low", default_value = "1.0")]
    pub r_low: f64,

    /// Upper ratio bound of each axis
    #[arg(long = "high", default_value = "2.0")]
    pub r_high: f64,
}

impl SweepOptions {
    pub fn to_params(&self) -> FieldParams {
        FieldParams::new(self.base_freq_hz, self.n_points, self.harmonics)
            .with_bounds(self.r_low, self.r_high)
            .with_mode(self.mode)
    }

    pub fn sweep(&self) -> CliResult<DissonanceLattice> {
        let lattice = DissonanceLattice::compute(
            self.to_params(),
            &CancellationToken::new(),
            |percent, label| info!("{:>3}% {}", percent, label),
        )?;
        Ok(lattice)
    }
}

#[derive(Parser)]
pub struct FieldOptions {
    #[command(flatten)]
    sweep: SweepOptions,
}

impl FieldOptions {
    pub fn run(&self, app: &mut App) -> CliResult<()> {
        let lattice = self.sweep.sweep()?;
        app.write_binary(|target| lattice.write_to(target))?;
        app.errln(format!(
            "Wrote {0}x{0}x{0} dissonance field",
            self.sweep.n_points
        ))?;
        Ok(())
    }
}
