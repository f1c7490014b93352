use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use consonance::field::DissonanceLattice;
use consonance::node;
use consonance::refine::{self, RefineOptions};

use crate::field::SweepOptions;
use crate::{App, CliResult};

#[derive(Parser)]
pub struct NodesOptions {
    /// Maximum number of nodes to report
    #[arg(long = "count", default_value = "10")]
    count: usize,

    /// Half-width of the local-minimum window
    #[arg(long = "filter", default_value = "2")]
    filter_size: usize,

    /// Refinement iterations per node
    #[arg(long = "iter", default_value = "100")]
    iterations: u32,

    /// Seed of the refinement random walk
    #[arg(long = "seed", default_value = "0")]
    seed: u64,

    /// Load a previously written field file instead of sweeping
    #[arg(long = "map")]
    map_file: Option<PathBuf>,

    #[command(flatten)]
    sweep: SweepOptions,
}

impl NodesOptions {
    pub fn run(&self, app: &mut App) -> CliResult<()> {
        let lattice = match &self.map_file {
            Some(map_file) => {
                let file = File::open(map_file)?;
                DissonanceLattice::read_from(file, self.sweep.n_points)?
            }
            None => self.sweep.sweep()?,
        };

        let options = RefineOptions {
            iterations: self.iterations,
            seed: self.seed,
            mode: self.sweep.mode,
        };
        let nodes: Vec<_> = node::extract_nodes(&lattice, self.count, self.filter_size)
            .into_iter()
            .map(|node| {
                refine::refine_node(node, self.sweep.base_freq_hz, self.sweep.harmonics, options)
            })
            .collect();

        app.write(serde_yaml::to_string(&nodes)?)?;
        Ok(())
    }
}
