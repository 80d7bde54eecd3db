use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mkprof_check::ProfileChecker;
use mkprof_cli::config::{Config, LOG_ENV, PROFILE_ENV, TEMPLATE_DIR_ENV};
use mkprof_cli::output::{format_profile, Format, ProfileSummary};
use mkprof_cli::registry::fingerprint;
use mkprof_parse::parse_file;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mkprof")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve mkmf toolchain profiles for MPI + NetCDF Fortran builds")]
struct Cli {
    /// Extra directories of mkmf.template.<name> files (later ones win)
    #[arg(
        long = "template-dir",
        global = true,
        env = TEMPLATE_DIR_ENV,
        value_delimiter = ':',
        value_name = "DIR"
    )]
    template_dirs: Vec<PathBuf>,

    /// Do not load the built-in profiles
    #[arg(long, global = true)]
    no_builtin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available profile names
    List {
        /// Print name, fingerprint and open variables as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a resolved profile
    Resolve {
        /// Profile name, e.g. ia64
        #[arg(env = PROFILE_ENV)]
        name: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Template)]
        format: Format,

        /// Print only the profile fingerprint
        #[arg(long)]
        fingerprint: bool,
    },

    /// Parse a template file and check its consistency
    Check {
        /// Path to an mkmf template
        file: PathBuf,

        /// Print the check report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a template file without checking it
    Parse {
        /// Path to an mkmf template
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Template)]
        format: Format,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config {
        template_dirs: cli.template_dirs,
        builtins: !cli.no_builtin,
    };

    match cli.command {
        Commands::List { json } => cmd_list(&config, json),
        Commands::Resolve {
            name,
            format,
            fingerprint,
        } => cmd_resolve(&config, name.as_deref(), format, fingerprint),
        Commands::Check { file, json } => cmd_check(&file, json),
        Commands::Parse { file, format } => cmd_parse(&file, format),
    }
}

fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let registry = config.registry()?;
    if json {
        let summaries: Vec<ProfileSummary> = registry.iter().map(ProfileSummary::of).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_resolve(
    config: &Config,
    name: Option<&str>,
    format: Format,
    print_fingerprint: bool,
) -> Result<()> {
    let Some(name) = name else {
        bail!("no profile given; pass a name or set {}", PROFILE_ENV);
    };
    let registry = config.registry()?;
    let profile = registry.resolve(name)?;

    if print_fingerprint {
        println!("{}", fingerprint(profile));
    } else {
        print!("{}", with_newline(format_profile(profile, format)?));
    }
    Ok(())
}

fn cmd_check(file: &Path, json: bool) -> Result<()> {
    let profile = parse_file(file)?;

    match ProfileChecker::new().check(&profile) {
        Ok(report) if json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Ok(report) => {
            println!("profile: {}", report.profile);
            println!("kinds: {}", report.kinds);
            println!("wrappers: {}", report.family);
            if !report.open_variables.is_empty() {
                println!("open: {}", report.open_variables.join(" "));
            }
            println!("ok");
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("  - {}", e);
            }
            bail!(
                "{} consistency error(s) in '{}'",
                errors.len(),
                file.display()
            )
        }
    }
}

fn cmd_parse(file: &Path, format: Format) -> Result<()> {
    let profile =
        parse_file(file).with_context(|| format!("while parsing '{}'", file.display()))?;
    print!("{}", with_newline(format_profile(&profile, format)?));
    Ok(())
}

fn with_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
