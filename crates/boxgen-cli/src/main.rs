mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_VALIDATION_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "boxgen",
    version,
    about = "Validate partition manifests and generate box configuration code"
)]
struct Cli {
    /// Generator config file (defaults to <workspace>/boxgen.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate all manifests of a workspace and generate partition code.
    Generate {
        /// Workspace root directory that is searched for partition manifests.
        workspace: PathBuf,
        /// Output directory for the generated source files (created if absent).
        output_dir: PathBuf,
        /// Directory holding common_configuration.tpl, main_box_configuration.tpl
        /// and box_configuration.tpl; the built-in fragments are used otherwise.
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,
    },
    /// Parse and validate the manifests of a workspace without generating code.
    Check {
        /// Workspace root directory that is searched for partition manifests.
        workspace: PathBuf,
    },
    /// Print the emission plan (region pairs and partition records) as JSON.
    Inspect {
        /// Workspace root directory that is searched for partition manifests.
        workspace: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BOXGEN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Generate {
            workspace,
            output_dir,
            templates,
        } => commands::generate::run(
            config,
            &workspace,
            &output_dir,
            templates.as_deref(),
            json_output,
        ),
        Commands::Check { workspace } => commands::check::run(config, &workspace, json_output),
        Commands::Inspect { workspace } => commands::inspect::run(config, &workspace),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("validation error:") {
                EXIT_VALIDATION_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
