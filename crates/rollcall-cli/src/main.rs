mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{group::GroupSubcommand, roll::RollSubcommand, student::StudentSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rollcall",
    about = "Attendance rolls, rule-based student groups and the filter job that fills them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .rollcall/)
    #[arg(long, global = true, env = "ROLLCALL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize rollcall in the current directory
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Start the HTTP API
    Serve {
        /// Port to listen on (defaults to server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Recompute the membership of every group
    Filter {
        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,

        /// Commit group by group instead of in one transaction
        #[arg(long)]
        sequential: bool,
    },

    /// Manage students
    Student {
        #[command(subcommand)]
        subcommand: StudentSubcommand,
    },

    /// Manage rolls and the states recorded on them
    Roll {
        #[command(subcommand)]
        subcommand: RollSubcommand,
    },

    /// Manage groups
    Group {
        #[command(subcommand)]
        subcommand: GroupSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&root, name.as_deref()),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Filter { at, sequential } => {
            cmd::filter::run(&root, at.as_deref(), sequential, cli.json)
        }
        Commands::Student { subcommand } => cmd::student::run(&root, subcommand, cli.json),
        Commands::Roll { subcommand } => cmd::roll::run(&root, subcommand, cli.json),
        Commands::Group { subcommand } => cmd::group::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
