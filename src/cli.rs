use std::path::{Path, PathBuf};

mod check;
mod form;
mod list;
mod session;
mod terminal;

use anyhow::Context;
use check::Check;
use chrono::Local;
use clap::ArgAction;
use dialoguer::Confirm;
use form::FieldArgs;
use iar::{
    storage::{self, RegisterFile},
    Config, ImportMode, RowRejected, ValidationError,
};
use list::List;
use session::Session;
use terminal::Colorize;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The configuration file
    #[arg(short, long, default_value = "iar.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = load_config(&self.config)?;
        self.command.run(config, &self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Loads the configuration, falling back to defaults if the file is absent.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(path).map_err(|e| anyhow::anyhow!(e))
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Add an asset to a register file
    Add(Add),

    /// Import a CSV file into a register file
    ///
    /// Rows that are not valid assets are skipped and reported.
    Import(Import),

    /// Write a dated copy of a register file
    Export(Export),

    /// Show the assets in a register file
    List(List),

    /// Check that a CSV file would import cleanly
    Check(Check),

    /// Remove every asset from a register file
    Reset(Reset),

    /// Compile a register interactively
    Session(Session),

    /// Show or change the configuration
    Config(Configure),
}

impl Command {
    fn run(self, config: Config, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Add(command) => command.run()?,
            Self::Import(command) => command.run(&config)?,
            Self::Export(command) => command.run(&config)?,
            Self::List(command) => command.run()?,
            Self::Check(command) => command.run()?,
            Self::Reset(command) => command.run()?,
            Self::Session(command) => command.run(&config)?,
            Self::Config(command) => command.run(config, config_path)?,
        }
        Ok(())
    }
}

fn open(path: &Path) -> anyhow::Result<RegisterFile> {
    RegisterFile::open(path.to_path_buf())
        .with_context(|| format!("failed to open register {}", path.display()))
}

/// Prints each failing field on its own line.
fn print_failures(error: &ValidationError) {
    for failure in error.failures() {
        eprintln!(
            "  • {}: {}",
            failure.field.header(),
            failure.reason.to_string().error()
        );
    }
}

/// Prints each skipped row with its failing fields.
fn print_rejected(rejected: &[RowRejected]) {
    for rejection in rejected {
        eprintln!("{}", format!("Row {} skipped:", rejection.row).warning());
        print_failures(&rejection.error);
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// The register file. Created if it does not exist.
    register: PathBuf,

    #[command(flatten)]
    fields: FieldArgs,
}

impl Add {
    #[instrument(level = "debug", skip(self), fields(register = %self.register.display()))]
    fn run(self) -> anyhow::Result<()> {
        let mut file = open(&self.register)?;
        let candidate = self.fields.into_candidate(Local::now().date_naive());

        match file.register_mut().append(&candidate) {
            Ok(index) => {
                file.save()
                    .with_context(|| format!("failed to write {}", self.register.display()))?;
                let name = candidate.get(iar::Field::AssetName).unwrap_or_default();
                println!(
                    "{}",
                    format!("✓ Added '{}' as row {}", name.trim(), index + 1).success()
                );
                Ok(())
            }
            Err(error) => {
                eprintln!("Missing or invalid fields:");
                print_failures(&error);
                anyhow::bail!("asset not added to {}", self.register.display())
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Import {
    /// The CSV file to import
    source: PathBuf,

    /// The register file to import into. Created if it does not exist.
    register: PathBuf,

    /// Replace the register instead of adding to it
    #[arg(long)]
    replace: bool,

    /// Add to the register, even if the configuration says to replace it
    #[arg(long, conflicts_with = "replace")]
    append: bool,
}

impl Import {
    #[instrument(level = "debug", skip(self, config))]
    fn run(self, config: &Config) -> anyhow::Result<()> {
        let mode = if self.replace {
            ImportMode::Replace
        } else if self.append {
            ImportMode::Append
        } else {
            config.import_mode()
        };

        let mut file = open(&self.register)?;
        let report = file
            .import_from(&self.source, mode)
            .with_context(|| format!("failed to import {}", self.source.display()))?;
        file.save()
            .with_context(|| format!("failed to write {}", self.register.display()))?;

        print_rejected(&report.rejected);
        let verb = match mode {
            ImportMode::Append => "Added",
            ImportMode::Replace => "Replaced register with",
        };
        println!(
            "{}",
            format!(
                "✓ {verb} {} assets from {} ({} total)",
                report.loaded,
                self.source.display(),
                file.register().len()
            )
            .success()
        );
        if !report.is_clean() {
            println!("{} rows skipped", report.rejected.len());
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Export {
    /// The register file
    register: PathBuf,

    /// Directory to write the export to
    ///
    /// Defaults to the configured export directory, then the register's own
    /// directory.
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl Export {
    #[instrument(level = "debug", skip(self, config))]
    fn run(self, config: &Config) -> anyhow::Result<()> {
        let file = open(&self.register)?;

        let dir = self
            .dir
            .or_else(|| config.export_dir().map(Path::to_path_buf))
            .or_else(|| self.register.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        let path = storage::export(
            file.register(),
            &dir,
            config.export_prefix(),
            Local::now().date_naive(),
        )
        .with_context(|| format!("failed to export to {}", dir.display()))?;

        println!(
            "{}",
            format!(
                "✓ Exported {} assets to {}",
                file.register().len(),
                path.display()
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Reset {
    /// The register file
    register: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Reset {
    #[instrument(level = "debug", skip(self))]
    fn run(self) -> anyhow::Result<()> {
        let mut file = open(&self.register)?;
        let count = file.register().len();
        if count == 0 {
            println!("The register is already empty.");
            return Ok(());
        }

        // Confirm before clearing
        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Remove all {count} assets from {}?",
                    self.register.display()
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        file.register_mut().reset();
        file.save()
            .with_context(|| format!("failed to write {}", self.register.display()))?;
        println!("Removed {count} assets");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Configure {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    ///
    /// Keys are `import_mode` (append or replace), `export_prefix` and
    /// `export_dir`. An empty `export_dir` unsets it.
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Configure {
    #[instrument(level = "debug", skip(self, config))]
    fn run(self, mut config: Config, path: &Path) -> anyhow::Result<()> {
        match self.command {
            ConfigCommand::Show => {
                println!("Configuration ({}):", path.display().to_string().dim());
                println!("  import_mode: {}", config.import_mode());
                println!("  export_prefix: {}", config.export_prefix());
                match config.export_dir() {
                    Some(dir) => println!("  export_dir: {}", dir.display()),
                    None => println!("  export_dir: {}", "(next to the register)".dim()),
                }
            }
            ConfigCommand::Set { key, value } => {
                match key.as_str() {
                    "import_mode" => config.set_import_mode(value.parse()?),
                    "export_prefix" => {
                        let prefix = value.trim();
                        if prefix.is_empty() {
                            anyhow::bail!("export_prefix cannot be empty");
                        }
                        config.set_export_prefix(prefix.to_string());
                    }
                    "export_dir" => {
                        let dir = value.trim();
                        config.set_export_dir((!dir.is_empty()).then(|| PathBuf::from(dir)));
                    }
                    _ => anyhow::bail!(
                        "unknown configuration key '{key}': \
                         expected import_mode, export_prefix or export_dir"
                    ),
                }

                config.save(path).map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("✓ Set {key} in {}", path.display()).success());
            }
        }
        Ok(())
    }
}
