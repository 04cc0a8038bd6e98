use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared_logging::LogLevel;
use sleep_journal::{
    AnalysisError, AnswerSource, CaptureError, ConsoleSource, JournalConfig, JournalRuntime,
    Observation, RegressionResult,
};

#[derive(Parser, Debug)]
#[command(name = "sleep", version, about = "Sleep journal with quality factor analysis")]
struct Cli {
    /// Journal configuration file.
    #[arg(long, default_value = "journal.toml")]
    config: PathBuf,
    /// Overrides the configured data table.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Overrides the configured telemetry log file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Overrides the configured telemetry level.
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive menu (default).
    Menu,
    /// Records one night and saves the table.
    Log,
    /// Lists every recorded night.
    View,
    /// Ranks the factors that move sleep quality.
    Analyze {
        /// Prints the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Replaces the journal table with the contents of another table.
    Import { path: PathBuf },
    /// Writes the journal table to another file.
    Export { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    LogSleep,
    ViewData,
    Analyze,
    LoadData,
    SaveData,
    Exit,
}

struct MenuEntry {
    key: &'static str,
    label: &'static str,
    action: MenuAction,
}

const MENU: [MenuEntry; 6] = [
    MenuEntry {
        key: "1",
        label: "Log Sleep",
        action: MenuAction::LogSleep,
    },
    MenuEntry {
        key: "2",
        label: "View Data",
        action: MenuAction::ViewData,
    },
    MenuEntry {
        key: "3",
        label: "Analyze Sleep Quality",
        action: MenuAction::Analyze,
    },
    MenuEntry {
        key: "4",
        label: "Load Data",
        action: MenuAction::LoadData,
    },
    MenuEntry {
        key: "5",
        label: "Save Data",
        action: MenuAction::SaveData,
    },
    MenuEntry {
        key: "6",
        label: "Exit",
        action: MenuAction::Exit,
    },
];

fn lookup(choice: &str) -> Option<MenuAction> {
    let choice = choice.trim();
    MENU.iter()
        .find(|entry| entry.key == choice)
        .map(|entry| entry.action)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = JournalConfig::load_or_default(&cli.config)?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(log_file) = cli.log_file {
        config.log_path = Some(log_file);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    let mut runtime = JournalRuntime::from_config(config)?;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let stdin = io::stdin();
            run_menu(&mut runtime, stdin.lock(), io::stdout())
        }
        Commands::Log => {
            load_existing(&mut runtime)?;
            let stdin = io::stdin();
            let mut source = ConsoleSource::new(stdin.lock(), io::stdout());
            let (observation, path) = log_and_save(&mut runtime, &mut source)?;
            println!("Sleep data logged!\n{observation}");
            println!("Saved {} nights to {}", runtime.log().len(), path.display());
            Ok(())
        }
        Commands::View => {
            load_existing(&mut runtime)?;
            println!("{}", runtime.view());
            Ok(())
        }
        Commands::Analyze { json } => {
            load_existing(&mut runtime)?;
            match runtime.analyze() {
                Ok(result) if json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    Ok(())
                }
                Ok(result) => {
                    println!("{}", render_analysis(&result));
                    Ok(())
                }
                Err(err @ AnalysisError::InsufficientData { .. }) => {
                    println!("{}", insufficient_message(&err));
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }
        Commands::Import { path } => {
            let count = runtime.load(Some(path.as_path()))?;
            let saved = runtime.save(None)?;
            println!("Imported {count} nights into {}", saved.display());
            Ok(())
        }
        Commands::Export { path } => {
            load_existing(&mut runtime)?;
            let saved = runtime.save(Some(path.as_path()))?;
            println!(
                "Exported {} nights to {}",
                runtime.log().len(),
                saved.display()
            );
            Ok(())
        }
    }
}

/// Loads the configured table when one has been saved before.
fn load_existing(runtime: &mut JournalRuntime) -> Result<()> {
    if runtime.config().data_path.exists() {
        runtime.load(None)?;
    }
    Ok(())
}

/// Captures one night and writes the table exactly once. With autosave on,
/// the capture has already written it.
fn log_and_save(
    runtime: &mut JournalRuntime,
    source: &mut dyn AnswerSource,
) -> Result<(Observation, PathBuf)> {
    let observation = runtime.log_sleep(source)?;
    let path = if runtime.config().autosave {
        runtime.config().data_path.clone()
    } else {
        runtime.save(None)?
    };
    Ok((observation, path))
}

fn render_analysis(result: &RegressionResult) -> String {
    format!("{}\n{}", result.table(), result.summary())
}

fn insufficient_message(err: &AnalysisError) -> String {
    format!("Not enough data for analysis: {err}.")
}

fn run_menu<R: BufRead, W: Write>(
    runtime: &mut JournalRuntime,
    mut input: R,
    mut output: W,
) -> Result<()> {
    loop {
        writeln!(output, "\nSleep Tracker")?;
        for entry in &MENU {
            writeln!(output, "{}. {}", entry.key, entry.label)?;
        }
        write!(output, "Choose an option: ")?;
        output.flush()?;

        let mut choice = String::new();
        if input.read_line(&mut choice).context("reading menu choice")? == 0 {
            writeln!(output, "\nGoodbye!")?;
            return Ok(());
        }
        let Some(action) = lookup(&choice) else {
            writeln!(output, "Invalid Selection.")?;
            continue;
        };
        if !dispatch(action, runtime, &mut input, &mut output)? {
            return Ok(());
        }
    }
}

/// Runs one menu action. Returns `false` when the menu should stop.
/// Action failures are printed and the menu keeps going.
fn dispatch<R: BufRead, W: Write>(
    action: MenuAction,
    runtime: &mut JournalRuntime,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    match action {
        MenuAction::LogSleep => {
            let outcome = {
                let mut source = ConsoleSource::new(&mut *input, &mut *output);
                runtime.log_sleep(&mut source)
            };
            match outcome {
                Ok(_) => writeln!(output, "Sleep data logged!")?,
                Err(err) => {
                    if matches!(
                        err.downcast_ref::<CaptureError>(),
                        Some(CaptureError::SourceClosed { .. })
                    ) {
                        writeln!(output, "\nGoodbye!")?;
                        return Ok(false);
                    }
                    writeln!(output, "Could not log sleep: {err:#}")?;
                }
            }
        }
        MenuAction::ViewData => writeln!(output, "{}", runtime.view())?,
        MenuAction::Analyze => match runtime.analyze() {
            Ok(result) => writeln!(output, "{}", render_analysis(&result))?,
            Err(err @ AnalysisError::InsufficientData { .. }) => {
                writeln!(output, "{}", insufficient_message(&err))?;
            }
            Err(err) => writeln!(output, "Analysis failed: {err}")?,
        },
        MenuAction::LoadData => match runtime.load(None) {
            Ok(count) => writeln!(output, "Loaded {count} nights.")?,
            Err(err) => writeln!(output, "Could not load data: {err:#}")?,
        },
        MenuAction::SaveData => match runtime.save(None) {
            Ok(path) => writeln!(output, "Saved to {}.", path.display())?,
            Err(err) => writeln!(output, "Could not save data: {err:#}")?,
        },
        MenuAction::Exit => {
            writeln!(output, "Goodbye!")?;
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleep_journal::ScriptedAnswers;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run(script: &str, config: JournalConfig) -> (JournalRuntime, String) {
        let mut runtime = JournalRuntime::new(config);
        let mut output = Vec::new();
        run_menu(&mut runtime, Cursor::new(script.to_owned()), &mut output).unwrap();
        (runtime, String::from_utf8(output).unwrap())
    }

    #[test]
    fn dispatch_table_maps_every_key() {
        assert_eq!(lookup("1"), Some(MenuAction::LogSleep));
        assert_eq!(lookup(" 3\n"), Some(MenuAction::Analyze));
        assert_eq!(lookup("6"), Some(MenuAction::Exit));
        assert_eq!(lookup("7"), None);
        assert_eq!(lookup("log"), None);
    }

    #[test]
    fn menu_rejects_unknown_choice_and_exits() {
        let (_, printed) = run("9\n2\n6\n", JournalConfig::default());
        assert!(printed.contains("Invalid Selection."));
        assert!(printed.contains("There is no sleep data to view."));
        assert!(printed.trim_end().ends_with("Goodbye!"));
    }

    #[test]
    fn menu_logs_with_retries_then_analyzes() {
        let script = "1\n01-01-2024\n4\n2\nn\ny\n1\n2\n1\n\
                      1\n02-01-2024\n6\n7\n4\ny\nn\n2\n3\n0\n2\n3\n1\n\
                      3\n\
                      1\n03-01-2024\n8\n5\ny\ny\n2\n4\n2\n\
                      3\n6\n";
        let (runtime, printed) = run(script, JournalConfig::default());
        assert_eq!(runtime.log().len(), 3);
        assert!(printed.contains("Invalid input"));
        assert!(printed.contains("Not enough data for analysis"));
        assert!(printed.contains("Most positive influence on sleep quality"));
    }

    fn saved_events(log_path: &std::path::Path) -> usize {
        std::fs::read_to_string(log_path)
            .unwrap()
            .matches("journal.table.saved")
            .count()
    }

    #[test]
    fn log_command_writes_table_once() {
        let dir = tempdir().unwrap();
        for autosave in [true, false] {
            let log_path = dir.path().join(format!("journal-{autosave}.log"));
            let config = JournalConfig {
                data_path: dir.path().join(format!("sleep-{autosave}.csv")),
                log_path: Some(log_path.clone()),
                autosave,
                ..JournalConfig::default()
            };
            let mut runtime = JournalRuntime::from_config(config.clone()).unwrap();
            let mut answers =
                ScriptedAnswers::new(["01-01-2024", "8", "4", "y", "n", "3", "3", "2"]);
            let (_, path) = log_and_save(&mut runtime, &mut answers).unwrap();
            assert_eq!(path, config.data_path);
            assert!(path.exists());
            assert_eq!(saved_events(&log_path), 1, "autosave = {autosave}");
        }
    }

    #[test]
    fn closed_input_mid_record_ends_menu() {
        let (runtime, printed) = run("1\n01-01-2024\n8\n", JournalConfig::default());
        assert!(runtime.log().is_empty());
        assert!(printed.trim_end().ends_with("Goodbye!"));
    }
}
