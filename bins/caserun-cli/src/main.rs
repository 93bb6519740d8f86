mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::DataArg;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "caserun-cli")]
#[command(about = "caserun CLI - Manage the test cases stored next to a solution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input text fed to the program
    #[arg(short, long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Read the input text from a file
    #[arg(long)]
    input_file: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Expected output text
    #[arg(short, long, conflicts_with = "output_file")]
    output: Option<String>,

    /// Read the expected output from a file
    #[arg(long)]
    output_file: Option<String>,
}

impl From<InputArgs> for DataArg {
    fn from(args: InputArgs) -> Self {
        DataArg {
            text: args.input,
            file: args.input_file,
        }
    }
}

impl From<OutputArgs> for DataArg {
    fn from(args: OutputArgs) -> Self {
        DataArg {
            text: args.output,
            file: args.output_file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty solution document for a source file
    Init {
        /// Solution source file
        source: PathBuf,
    },

    /// Append a test case
    Add {
        source: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change the input or expected output of a test case
    Set {
        source: PathBuf,

        /// Test case number, starting at 1
        number: usize,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove a test case
    Remove {
        source: PathBuf,

        /// Test case number, starting at 1
        number: usize,

        /// Skip confirmation
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// List the test cases of a solution
    List { source: PathBuf },

    /// Print the cell view of a solution as JSON
    Cells { source: PathBuf },

    /// List supported solution languages
    Languages,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { source } => commands::init_solution(&source)?,
        Commands::Add {
            source,
            input,
            output,
        } => {
            commands::add_test(&source, &input.into(), &output.into())?;
        }
        Commands::Set {
            source,
            number,
            input,
            output,
        } => commands::set_test(&source, number, &input.into(), &output.into())?,
        Commands::Remove {
            source,
            number,
            yes,
        } => commands::remove_test(&source, number, yes)?,
        Commands::List { source } => commands::list_tests(&source)?,
        Commands::Cells { source } => commands::show_cells(&source)?,
        Commands::Languages => commands::list_languages()?,
    }

    Ok(())
}
