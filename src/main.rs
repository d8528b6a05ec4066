use clap::{Parser, Subcommand};
use filekeeper::category::Selection;
use filekeeper::cli::{self, Command};
use filekeeper::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "filekeeper",
    version,
    about = "Organize a storage tree into category folders, with undo and integrity checks"
)]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Organize files into category folders.
    Organize {
        /// Folder to organize.
        directory: PathBuf,
        /// Comma-separated category names; omit to organize everything.
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Organize every configured category.
        #[arg(long, conflicts_with = "categories")]
        all: bool,
        /// Show the plan without moving anything.
        #[arg(long)]
        dry_run: bool,
        /// Path to a configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Preview the organize plan without touching any file.
    Preview {
        directory: PathBuf,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[arg(long, conflicts_with = "categories")]
        all: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Delete junk files and orphaned thumbnails.
    Clean {
        directory: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Revert the previous organize or clean run.
    Undo { directory: PathBuf },
    /// Report files added, modified, or deleted since the last check.
    Check {
        directory: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn selection_from(categories: Vec<String>, all: bool) -> Selection {
    if all || categories.is_empty() {
        Selection::All
    } else {
        Selection::Categories(categories)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (command, directory, config) = match args.command {
        CliCommand::Organize {
            directory,
            categories,
            all,
            dry_run,
            config,
        } => (
            Command::Organize {
                selection: selection_from(categories, all),
                dry_run,
            },
            directory,
            config,
        ),
        CliCommand::Preview {
            directory,
            categories,
            all,
            config,
        } => (
            Command::Organize {
                selection: selection_from(categories, all),
                dry_run: true,
            },
            directory,
            config,
        ),
        CliCommand::Clean { directory, config } => (Command::Clean, directory, config),
        CliCommand::Undo { directory } => (Command::Undo, directory, None),
        CliCommand::Check { directory, config } => (Command::Check, directory, config),
    };

    match cli::run(command, &directory, config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            OutputFormatter::error(&message);
            ExitCode::FAILURE
        }
    }
}
