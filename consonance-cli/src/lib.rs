mod dto;
mod field;
mod nodes;

use std::{
    fmt::{self, Debug, Display},
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use consonance::catalog::{self, TuningSystem};
use consonance::classify::{self, Note};
use consonance::field::{FieldBuildError, LatticeReadError, SweepError};
use dto::CatalogEntryDto;
use field::FieldOptions;
use nodes::NodesOptions;

#[derive(Parser)]
#[command(name = "consonance", version, about)]
struct MainOptions {
    /// Write output to a file instead of stdout
    #[arg(long = "of")]
    output_file: Option<PathBuf>,

    #[command(subcommand)]
    command: MainCommand,
}

#[derive(Parser)]
enum MainCommand {
    /// Sweep a dissonance field and write it in the binary exchange layout
    Field(FieldOptions),

    /// Locate and refine the harmonic nodes of a dissonance field
    Nodes(NodesOptions),

    /// Classify a chord voicing given as absolute 53-TET steps
    Classify(ClassifyOptions),

    /// List the named chord templates of a tuning system
    Catalog(CatalogOptions),
}

#[derive(Parser)]
struct ClassifyOptions {
    /// Absolute 53-TET steps of the sounding notes
    #[arg(required = true)]
    steps: Vec<i32>,

    /// Root step if different from the lowest sounding note
    #[arg(long = "root")]
    root: Option<i32>,

    /// Diatonic degree for the Roman numeral, 1 through 7
    #[arg(long = "deg", default_value = "1")]
    degree: u8,

    /// Treat the input as a pre-expanded array with fixed third/fifth/seventh
    /// positions instead of an arbitrary voicing
    #[arg(long = "expanded")]
    expanded: bool,
}

#[derive(Parser)]
struct CatalogOptions {
    /// Tuning system: 12tet, 31tet or 53tet
    tuning: TuningSystem,

    /// Annotate each template with its dissonance from this field file
    #[arg(long = "map")]
    map_file: Option<PathBuf>,

    /// Points per axis of the field file
    #[arg(long = "np", default_value = "150")]
    n_points: usize,
}

impl MainOptions {
    fn run(self) -> CliResult<()> {
        let stdout = io::stdout();
        let (output, output_is_file): (Box<dyn Write>, _) = match self.output_file {
            Some(output_file) => (Box::new(File::create(output_file)?), true),
            None => (Box::new(stdout.lock()), false),
        };

        let stderr = io::stderr();
        let error = Box::new(stderr.lock());

        let mut app = App {
            output,
            error,
            output_is_file,
        };

        self.command.run(&mut app)
    }
}

impl MainCommand {
    fn run(self, app: &mut App) -> CliResult<()> {
        match self {
            MainCommand::Field(options) => options.run(app)?,
            MainCommand::Nodes(options) => options.run(app)?,
            MainCommand::Classify(options) => options.run(app)?,
            MainCommand::Catalog(options) => options.run(app)?,
        }
        Ok(())
    }
}

impl ClassifyOptions {
    fn run(&self, app: &mut App) -> CliResult<()> {
        let notes: Vec<Note> = self.steps.iter().copied().map(Note::from_step).collect();
        let root_step = match self.root {
            Some(root) => root,
            None => self
                .steps
                .iter()
                .copied()
                .min()
                .ok_or_else(|| CliError::CommandError("No notes provided".to_owned()))?,
        };
        let root = Note::from_step(root_step);

        let quality = if self.expanded {
            classify::classify_expanded(&notes, &root, self.degree)
        } else {
            classify::classify_voicing(&notes, &root, self.degree)
        };

        app.writeln(&quality)?;
        app.write(serde_yaml::to_string(&quality)?)?;
        Ok(())
    }
}

impl CatalogOptions {
    fn run(&self, app: &mut App) -> CliResult<()> {
        let lattice = self
            .map_file
            .as_ref()
            .map(|map_file| {
                let file = File::open(map_file)?;
                consonance::field::DissonanceLattice::read_from(file, self.n_points)
            })
            .transpose()?;

        let entries: Vec<CatalogEntryDto> = catalog::chord_templates(self.tuning)
            .iter()
            .map(|template| CatalogEntryDto {
                name: template.name.clone(),
                third_steps: template.third_steps,
                fifth_steps: template.fifth_steps,
                seventh_steps: template.seventh_steps,
                alpha: template.alpha,
                beta: template.beta,
                gamma: template.gamma,
                dissonance: lattice
                    .as_ref()
                    .and_then(|lattice| template.dissonance_in(lattice)),
            })
            .collect();

        app.write(serde_yaml::to_string(&entries)?)?;
        Ok(())
    }
}

pub fn run_in_shell_env(args: impl IntoIterator<Item = String>) -> CliResult<()> {
    let options = match MainOptions::try_parse_from(args) {
        Err(err) => {
            return if err.use_stderr() {
                Err(CliError::CommandError(err.to_string()))
            } else {
                print!("{}", err);
                Ok(())
            };
        }
        Ok(options) => options,
    };

    options.run()
}

pub(crate) struct App<'a> {
    output: Box<dyn 'a + Write>,
    error: Box<dyn 'a + Write>,
    output_is_file: bool,
}

impl App<'_> {
    pub fn write(&mut self, message: impl Display) -> io::Result<()> {
        write!(&mut self.output, "{}", message)
    }

    pub fn writeln(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(&mut self.output, "{}", message)
    }

    pub fn errln(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(&mut self.error, "{}", message)
    }

    /// Binary data never goes to an interactive stdout.
    pub fn write_binary(&mut self, write: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> CliResult<()> {
        if self.output_is_file {
            write(&mut self.output)?;
            Ok(())
        } else {
            Err(CliError::CommandError(
                "Binary output requires an explicit output file (--of)".to_owned(),
            ))
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub enum CliError {
    IoError(io::Error),
    CommandError(String),
}

impl Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::IoError(err) => write!(f, "IO error / {}", err),
            CliError::CommandError(err) => write!(f, "The command failed / {}", err),
        }
    }
}

impl From<String> for CliError {
    fn from(v: String) -> Self {
        CliError::CommandError(v)
    }
}

impl From<io::Error> for CliError {
    fn from(v: io::Error) -> Self {
        CliError::IoError(v)
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(v: serde_yaml::Error) -> Self {
        CliError::CommandError(format!("Could not serialize the output ({})", v))
    }
}

impl From<FieldBuildError> for CliError {
    fn from(v: FieldBuildError) -> Self {
        CliError::CommandError(format!("Invalid field parameters ({})", v))
    }
}

impl From<SweepError> for CliError {
    fn from(v: SweepError) -> Self {
        CliError::CommandError(format!("Could not compute the field ({})", v))
    }
}

impl From<LatticeReadError> for CliError {
    fn from(v: LatticeReadError) -> Self {
        CliError::CommandError(format!("Could not load the field file ({})", v))
    }
}
