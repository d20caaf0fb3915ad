use std::{
    io::{self, IsTerminal},
    path::{Path, PathBuf},
};

use chrono::Local;
use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use iar::{storage, Config, Register};
use tracing::instrument;

use super::{form, list, print_failures, print_rejected, terminal::Colorize};

/// Command arguments for `iar session`.
#[derive(Debug, Parser)]
#[command(about = "Compile a register interactively")]
pub struct Session {
    /// A previous export to resume from
    #[arg(long)]
    resume: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Show,
    Import,
    Export,
    Reset,
    Quit,
}

impl Action {
    const ALL: [Self; 6] = [
        Self::Add,
        Self::Show,
        Self::Import,
        Self::Export,
        Self::Reset,
        Self::Quit,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add an asset",
            Self::Show => "Show the register",
            Self::Import => "Import a CSV file",
            Self::Export => "Export the register",
            Self::Reset => "Clear all rows",
            Self::Quit => "Quit",
        }
    }
}

/// The state of one interactive session.
///
/// The register lives exactly as long as the session.
struct State<'a> {
    config: &'a Config,
    theme: ColorfulTheme,
    register: Register,
    unsaved: bool,
}

impl Session {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        if !io::stdin().is_terminal() {
            anyhow::bail!("'iar session' needs an interactive terminal; use 'iar add' in scripts");
        }

        let mut state = State {
            config,
            theme: ColorfulTheme::default(),
            register: Register::new(),
            unsaved: false,
        };

        if let Some(path) = &self.resume {
            state.import(path);
            state.unsaved = false;
        }

        loop {
            let labels: Vec<&str> = Action::ALL.iter().map(|action| action.label()).collect();
            let choice = Select::with_theme(&state.theme)
                .with_prompt(format!("Register: {} assets", state.register.len()))
                .items(&labels)
                .default(0)
                .interact()?;

            match Action::ALL[choice] {
                Action::Add => state.add()?,
                Action::Show => state.show(),
                Action::Import => {
                    let path = Input::<String>::with_theme(&state.theme)
                        .with_prompt("CSV file to import")
                        .interact_text()?;
                    state.import(Path::new(path.trim()));
                }
                Action::Export => state.export(),
                Action::Reset => state.reset()?,
                Action::Quit => {
                    if state.confirm_quit()? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl State<'_> {
    fn add(&mut self) -> anyhow::Result<()> {
        let candidate = form::prompt(Local::now().date_naive())?;
        match self.register.append(&candidate) {
            Ok(index) => {
                self.unsaved = true;
                let name = self
                    .register
                    .get(index)
                    .map(|record| record.asset_name().to_string())
                    .unwrap_or_default();
                println!("{}", format!("✓ Added '{name}' to the register").success());
            }
            Err(error) => {
                println!("{}", "Asset not added:".error());
                print_failures(&error);
            }
        }
        Ok(())
    }

    fn show(&self) {
        if self.register.is_empty() {
            println!("{}", "The register is empty.".dim());
            return;
        }
        list::render_table(self.register.snapshot(), &list::summary_columns(false), false);
    }

    /// Failures are reported and leave the register untouched.
    fn import(&mut self, path: &Path) {
        let rows = match storage::read_rows(path) {
            Ok(rows) => rows,
            Err(error) => {
                let error = anyhow::Error::from(error);
                println!("{}", format!("Error loading file: {error:#}").error());
                return;
            }
        };
        let report = self.register.import(rows, self.config.import_mode());
        if report.loaded > 0 {
            self.unsaved = true;
        }
        println!(
            "{}",
            format!("✓ Loaded {} assets from {}", report.loaded, path.display()).success()
        );
        print_rejected(&report.rejected);
    }

    fn export(&mut self) {
        let dir = self.config.export_dir().unwrap_or_else(|| Path::new("."));
        let today = Local::now().date_naive();
        match storage::export(&self.register, dir, self.config.export_prefix(), today) {
            Ok(path) => {
                self.unsaved = false;
                println!(
                    "{}",
                    format!("✓ Exported {} assets to {}", self.register.len(), path.display())
                        .success()
                );
            }
            Err(error) => println!("{}", format!("Export failed: {error}").error()),
        }
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        if self.register.is_empty() {
            return Ok(());
        }
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!(
                "Remove all {} assets from the register?",
                self.register.len()
            ))
            .default(false)
            .interact()?;
        if confirmed {
            self.register.reset();
            self.unsaved = false;
            println!("{}", "Register cleared.".dim());
        }
        Ok(())
    }

    fn confirm_quit(&self) -> anyhow::Result<bool> {
        if !self.unsaved {
            return Ok(true);
        }
        println!(
            "{}",
            "⚠ Assets added since the last export will be lost.".warning()
        );
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("Quit without exporting?")
            .default(false)
            .interact()?)
    }
}
