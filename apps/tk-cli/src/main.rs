use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use tk_app::{AppError, AppResult, CommandSender, EngineRunner, open_engine, open_history};
use tk_results::LoadOutcome;
use tk_core::units::{in_bar, in_degc, in_lps, in_percent};
use tk_sim::{Command, Severity, Snapshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tk-cli")]
#[command(about = "TankSim CLI - tank process simulator for operator training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Path of the config file to create (.yaml or .json)
        config_path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to the config file
        config_path: PathBuf,
    },
    /// Run the engine on its wall clock, reading operator commands from stdin
    Run {
        /// Path to the config file
        config_path: PathBuf,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
        /// Override the fault seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print each snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run ticks back-to-back without waiting for the clock
    Simulate {
        /// Path to the config file
        config_path: PathBuf,
        /// Number of ticks to run
        #[arg(long)]
        ticks: u64,
        /// Override the fault seed
        #[arg(long)]
        seed: Option<u64>,
        /// Commands applied before the first tick, e.g. --command "inflow 8"
        #[arg(long = "command", short = 'c')]
        commands: Vec<String>,
        /// Print each snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or clear the persisted history
    #[command(subcommand)]
    History(HistoryCommands),
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Print recorded readings
    Show {
        /// Path to the config file
        config_path: PathBuf,
        /// Only show the most recent N records
        #[arg(long)]
        last: Option<usize>,
    },
    /// Delete the persisted history
    Reset {
        /// Path to the config file
        config_path: PathBuf,
    },
    /// Export the history as CSV
    Export {
        /// Path to the config file
        config_path: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { config_path, force } => cmd_init(&config_path, force),
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Run {
            config_path,
            ticks,
            seed,
            json,
        } => cmd_run(&config_path, ticks, seed, json),
        Commands::Simulate {
            config_path,
            ticks,
            seed,
            commands,
            json,
        } => cmd_simulate(&config_path, ticks, seed, &commands, json),
        Commands::History(history_cmd) => match history_cmd {
            HistoryCommands::Show { config_path, last } => cmd_history_show(&config_path, last),
            HistoryCommands::Reset { config_path } => cmd_history_reset(&config_path),
            HistoryCommands::Export {
                config_path,
                output,
            } => cmd_history_export(&config_path, output.as_deref()),
        },
    }
}

fn cmd_init(config_path: &Path, force: bool) -> AppResult<()> {
    if config_path.exists() && !force {
        return Err(AppError::Config(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }
    tk_project::save(config_path, &tk_project::EngineConfig::default())?;
    println!("✓ Wrote default config: {}", config_path.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = tk_project::load(config_path)?;
    println!("✓ Config is valid: {}", config.name);
    println!(
        "  tick {} ms, fault probability {}, history '{}' in {}",
        config.tick_period_ms,
        config.fault.probability,
        config.history.key,
        config.history.resolve_dir(config_path).display()
    );
    Ok(())
}

fn report_load(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Missing => {}
        LoadOutcome::Loaded { count } => println!("Restored {} history records", count),
        LoadOutcome::Unreadable { reason } | LoadOutcome::Corrupt { reason } => {
            eprintln!("⚠ Persisted history discarded, starting empty: {}", reason)
        }
    }
}

fn cmd_run(config_path: &Path, ticks: Option<u64>, seed: Option<u64>, json: bool) -> AppResult<()> {
    let setup = open_engine(config_path, seed)?;
    report_load(&setup.load_outcome);
    let period = setup.period;

    let handle = EngineRunner::start(setup.engine, period)?;
    let snapshots = handle.subscribe()?;

    let quit = Arc::new(AtomicBool::new(false));
    spawn_console(handle.commander(), Arc::clone(&quit));
    println!(
        "Running every {} ms. Commands: inflow <v>, outflow <v>, heater on|off, pump on|off, \
         reset-sensor, reset-history, fault, quit",
        period.as_millis()
    );

    let mut seen = 0u64;
    while !quit.load(Ordering::Relaxed) {
        match snapshots.recv_timeout(period * 2) {
            Ok(snapshot) => {
                print_snapshot(&snapshot, json)?;
                seen += 1;
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let engine = handle.stop()?;
    println!(
        "✓ Stopped after {} ticks, {} history records",
        engine.ticks(),
        engine.history().len()
    );
    if engine.history().write_failures() > 0 {
        eprintln!(
            "⚠ {} history writes failed during the run",
            engine.history().write_failures()
        );
    }
    Ok(())
}

/// Read operator commands from stdin until EOF or `quit`.
fn spawn_console(commander: CommandSender, quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "quit" | "exit" | "q") {
                quit.store(true, Ordering::Relaxed);
                break;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    info!(%command, "operator command");
                    if commander.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "ignored console input"),
            }
        }
    });
}

fn cmd_simulate(
    config_path: &Path,
    ticks: u64,
    seed: Option<u64>,
    commands: &[String],
    json: bool,
) -> AppResult<()> {
    let mut setup = open_engine(config_path, seed)?;
    report_load(&setup.load_outcome);

    for line in commands {
        let command: Command = line.parse()?;
        setup.engine.apply(command)?;
    }

    for _ in 0..ticks {
        let snapshot = setup.engine.tick();
        print_snapshot(&snapshot, json)?;
    }
    println!(
        "✓ Simulated {} ticks, {} history records",
        ticks,
        setup.engine.history().len()
    );
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> AppResult<()> {
    let mut out = io::stdout().lock();
    if json {
        let line = serde_json::to_string(snapshot).map_err(|e| AppError::Engine(e.to_string()))?;
        writeln!(out, "{}", line)?;
    } else {
        writeln!(out, "{}", format_status(snapshot))?;
    }
    Ok(())
}

fn format_level(level: Option<f64>) -> String {
    match level {
        Some(v) => format!("{:5.1} %", v),
        None => "  --- %".to_string(),
    }
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "⚠",
        Severity::Error => "✖",
    }
}

fn format_status(s: &Snapshot) -> String {
    let on_off = |b: bool| if b { "on " } else { "off" };
    let level = s.level_reading().map(|_| in_percent(s.state.level_ratio()));
    let mut line = format!(
        "#{:<5} level {}  temp {:5.1} °C  pressure {:4.2} bar  | in {:4.1} out {:4.1} L/s heater {} pump {}",
        s.tick,
        format_level(level),
        in_degc(s.state.temperature_si()),
        in_bar(s.state.pressure_si()),
        in_lps(s.inputs.inflow_si()),
        in_lps(s.inputs.outflow_si()),
        on_off(s.inputs.heater_on),
        on_off(s.inputs.pump_on),
    );
    for alarm in s.alarms.active() {
        line.push_str(&format!("  {} {}", severity_marker(alarm.severity()), alarm));
    }
    line
}

fn cmd_history_show(config_path: &Path, last: Option<usize>) -> AppResult<()> {
    let (recorder, outcome) = open_history(config_path)?;
    report_load(&outcome);

    let records = recorder.records();
    if records.is_empty() {
        println!("No history recorded");
        return Ok(());
    }

    let skip = last.map_or(0, |n| records.len().saturating_sub(n));
    println!("{:<12} {:>8} {:>8} {:>8}", "time", "level", "temp", "pressure");
    for r in &records[skip..] {
        let level = r
            .level
            .map(|v| format!("{:8.1}", v))
            .unwrap_or_else(|| format!("{:>8}", "---"));
        println!(
            "{:<12} {} {:8.1} {:8.2}",
            r.timestamp, level, r.temperature, r.pressure
        );
    }
    println!("{} of {} records", records.len() - skip, records.len());
    Ok(())
}

fn cmd_history_reset(config_path: &Path) -> AppResult<()> {
    let (mut recorder, _) = open_history(config_path)?;
    let count = recorder.len();
    recorder.reset()?;
    println!("✓ Cleared {} history records", count);
    Ok(())
}

fn cmd_history_export(config_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let (recorder, outcome) = open_history(config_path)?;
    report_load(&outcome);
    let csv = recorder.to_csv();

    match output {
        Some(path) => {
            std::fs::write(path, csv)?;
            println!(
                "✓ Exported {} records to {}",
                recorder.len(),
                path.display()
            );
        }
        None => print!("{}", csv),
    }
    Ok(())
}
