//! KMZ Cleaner.
//!
//! Entfernt doppelte Placemarks und GroundOverlays aus KMZ-Archiven und
//! schreibt bereinigte KMZ, bereinigte KML und einen Bericht.

use anyhow::Context;
use clap::Parser;
use kmz_cleaner::{app, CleanOutcome, CleanerOptions, DryRunSummary};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit-Code: Lauf abgebrochen, nichts geschrieben
const EXIT_ABORTED: u8 = 1;
/// Exit-Code: bereinigt, aber mindestens ein Artefakt fehlt
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "kmz-cleaner", version)]
#[command(about = "Remove duplicate placemarks and ground overlays from KMZ archives")]
struct Cli {
    /// Path to the KMZ archive
    #[arg(required_unless_present = "pick")]
    input: Option<PathBuf>,
    /// Choose the archive with a file dialog and show the result in a message box
    #[arg(long)]
    pick: bool,
    /// Directory for the cleaned KMZ, KML and report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Options file (default: kmz_cleaner.toml next to the binary)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Keep ground overlays and their images
    #[arg(long)]
    keep_overlays: bool,
    /// Only report what would be removed
    #[arg(long)]
    dry_run: bool,
    /// Debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match CliRunner::new(cli) {
        Ok(runner) => runner.run(),
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Fehler: {:#}", e);
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

struct CliRunner {
    cli: Cli,
    options: CleanerOptions,
}

impl CliRunner {
    fn new(cli: Cli) -> anyhow::Result<Self> {
        // Logger initialisieren
        let level = if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();

        log::info!("KMZ Cleaner v{} startet...", env!("CARGO_PKG_VERSION"));

        // Optionen aus TOML laden (oder Standardwerte, außer bei --config)
        let mut options = match &cli.config {
            Some(path) => CleanerOptions::load_required(path)?,
            None => CleanerOptions::load_from_file(&CleanerOptions::config_path()),
        };
        if let Some(dir) = &cli.output_dir {
            options.output_dir = Some(dir.clone());
        }
        if cli.keep_overlays {
            options.strip_ground_overlays = false;
        }

        Ok(Self { cli, options })
    }

    fn run(self) -> ExitCode {
        let Some(input) = self.resolve_input() else {
            log::info!("Keine Datei ausgewählt");
            return ExitCode::SUCCESS;
        };

        if self.cli.dry_run {
            return match app::dry_run(&input) {
                Ok(summary) => {
                    print_dry_run(&summary);
                    ExitCode::SUCCESS
                }
                Err(e) => self.fail(anyhow::Error::new(e).context("Probelauf fehlgeschlagen")),
            };
        }

        let result = app::clean_archive(&input, &self.options)
            .with_context(|| format!("Bereinigung von '{}' fehlgeschlagen", input.display()));

        match result {
            Ok(outcome) => {
                let summary = summarize(&outcome);
                println!("{}", summary);
                if self.cli.pick {
                    show_message(&summary, outcome.is_complete());
                }
                if outcome.is_complete() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(EXIT_PARTIAL)
                }
            }
            Err(e) => self.fail(e),
        }
    }

    fn resolve_input(&self) -> Option<PathBuf> {
        if let Some(input) = &self.cli.input {
            return Some(input.clone());
        }
        rfd::FileDialog::new()
            .add_filter("KMZ", &["kmz"])
            .set_title("KMZ-Datei wählen")
            .pick_file()
    }

    fn fail(&self, error: anyhow::Error) -> ExitCode {
        log::error!("{:#}", error);
        eprintln!("Fehler: {:#}", error);
        if self.cli.pick {
            show_message(&format!("{:#}", error), false);
        }
        ExitCode::from(EXIT_ABORTED)
    }
}

fn summarize(outcome: &CleanOutcome) -> String {
    let mut lines = vec![format!(
        "{} Duplikate entfernt, {} GroundOverlays und {} Bilder entfernt",
        outcome.dedup.removed,
        outcome.overlays.removed_overlays,
        outcome.overlays.deleted_images.len()
    )];
    lines.extend(
        outcome
            .artifacts()
            .map(|path| format!("  {}", path.display())),
    );
    for failure in &outcome.write_failures {
        lines.push(format!("Nicht geschrieben: {}", failure));
    }
    lines.join("\n")
}

fn print_dry_run(summary: &DryRunSummary) {
    println!(
        "{}: {} Placemarks mit Geometrie, {} ohne, {} eindeutig, {} Duplikate",
        summary.document.display(),
        summary.scanned,
        summary.skipped,
        summary.unique,
        summary.duplicate_count()
    );
    for record in &summary.records {
        println!(
            "  {} ({}) in {}",
            record.name.as_deref().unwrap_or("None"),
            record.kind,
            record.folder.as_deref().unwrap_or("None")
        );
    }
}

fn show_message(text: &str, success: bool) {
    let (level, title) = if success {
        (rfd::MessageLevel::Info, "KMZ Cleaner")
    } else {
        (rfd::MessageLevel::Error, "KMZ Cleaner - Fehler")
    };
    rfd::MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(text)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
