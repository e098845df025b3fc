//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use lcdcontrol::core::config::{Config, TickErrorPolicy};
use lcdcontrol::core::errors::LcdError;
use lcdcontrol::daemon::loop_main::{MonitorLoop, MonitorOptions, MonitorReport};
use lcdcontrol::daemon::signals::StopToken;
use lcdcontrol::device::{CharDevice, DisplayConfig, DisplayDevice};
use lcdcontrol::logger::{ActivityLog, ActivityLogConfig};
use lcdcontrol::telemetry::{TelemetryCollector, TelemetryField};

/// Control a two-row character LCD through its kernel driver.
#[derive(Debug, Parser)]
#[command(
    name = "lcdctl",
    author,
    version,
    about = "LCD control panel utility",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Character device of the display driver.
    #[arg(short = 'd', long, global = true, value_name = "PATH")]
    device: Option<PathBuf>,
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Blank both rows.
    Clear,
    /// Set display power, cursor and blink in one call.
    #[command(allow_negative_numbers = true)]
    Config(ConfigArgs),
    /// Write a line of text.
    Print(PrintArgs),
    /// Dump the 32 bytes of display memory.
    Read,
    /// Show two live telemetry rows until interrupted.
    Monitor(MonitorArgs),
    /// Inspect the configuration file.
    Settings(SettingsArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Display power (1/0, on/off, true/false, yes/no).
    #[arg(required = true, action = ArgAction::Set, value_parser = parse_flag)]
    display: bool,
    /// Underline cursor.
    #[arg(required = true, action = ArgAction::Set, value_parser = parse_flag)]
    cursor: bool,
    /// Blinking block cursor.
    #[arg(required = true, action = ArgAction::Set, value_parser = parse_flag)]
    blink: bool,
}

#[derive(Debug, Clone, Args)]
struct PrintArgs {
    /// Text to send; a line terminator is appended when missing.
    #[arg(allow_hyphen_values = true)]
    text: String,
}

#[derive(Debug, Clone, Args)]
struct MonitorArgs {
    /// Top row: uptime, temp, hostname, ip, or literal text.
    top: String,
    /// Bottom row: uptime, temp, hostname, ip, or literal text.
    bottom: String,
    /// Milliseconds between refreshes (overrides config).
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=60_000))]
    interval_ms: Option<u64>,
    /// Stop after this many refreshes.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    ticks: Option<u64>,
    /// Override the device error policy for this session.
    #[arg(long, value_name = "POLICY")]
    on_device_error: Option<TickErrorPolicy>,
}

#[derive(Debug, Clone, Args)]
struct SettingsArgs {
    #[command(subcommand)]
    command: Option<SettingsCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum SettingsCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad invocation caught before touching the device.
    #[error("{0}")]
    Usage(String),
    /// Configuration or device failure.
    #[error("{0}")]
    Lcd(#[from] LcdError),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Lcd(_) | Self::Json(_) | Self::Io(_) => 1,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Clear => run_clear(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Print(args) => run_print(cli, args),
        Command::Read => run_read(cli),
        Command::Monitor(args) => run_monitor(cli, args),
        Command::Settings(args) => run_settings(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_clear(cli: &Cli) -> Result<(), CliError> {
    let (_, path) = resolve_device(cli)?;
    let mut device = CharDevice::open(&path)?;
    device.clear()?;

    match output_mode(cli) {
        OutputMode::Human => print_success("Display cleared."),
        OutputMode::Json => write_json_line(&json!({
            "command": "clear",
            "device": path.to_string_lossy(),
        }))?,
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    let (_, path) = resolve_device(cli)?;
    let cfg = DisplayConfig::new(args.display, args.cursor, args.blink);
    let mut device = CharDevice::open(&path)?;
    device.configure(cfg)?;

    match output_mode(cli) {
        OutputMode::Human => print_success("Config applied."),
        OutputMode::Json => write_json_line(&json!({
            "command": "config",
            "device": path.to_string_lossy(),
            "config": cfg,
        }))?,
    }
    Ok(())
}

fn run_print(cli: &Cli, args: &PrintArgs) -> Result<(), CliError> {
    let (_, path) = resolve_device(cli)?;
    let mut device = CharDevice::open(&path)?;
    device.write_text(&args.text)?;

    match output_mode(cli) {
        OutputMode::Human => print_success(&format!("Sent \"{}\"", args.text)),
        OutputMode::Json => write_json_line(&json!({
            "command": "print",
            "device": path.to_string_lossy(),
            "text": args.text,
        }))?,
    }
    Ok(())
}

fn run_read(cli: &Cli) -> Result<(), CliError> {
    let (_, path) = resolve_device(cli)?;
    let mut device = CharDevice::open(&path)?;
    let snapshot = device.read_snapshot()?;
    let top = snapshot.row_text(0);
    let bottom = snapshot.row_text(1);

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "LCD Memory Dump:")?;
            writeln!(stdout, "|{top}|")?;
            writeln!(stdout, "|{bottom}|")?;
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "read",
            "device": path.to_string_lossy(),
            "top": top,
            "bottom": bottom,
        }))?,
    }
    Ok(())
}

fn run_monitor(cli: &Cli, args: &MonitorArgs) -> Result<(), CliError> {
    let (config, path) = resolve_device(cli)?;
    let rows = [
        TelemetryField::parse(&args.top),
        TelemetryField::parse(&args.bottom),
    ];

    let mut options = MonitorOptions::from_config(&config.monitor);
    if let Some(ms) = args.interval_ms {
        options.interval = std::time::Duration::from_millis(ms);
    }
    if let Some(policy) = args.on_device_error {
        options.on_device_error = policy;
    }
    options.max_ticks = args.ticks;

    let mut device = CharDevice::open(&path)?;
    let log = ActivityLog::open(ActivityLogConfig::new(&config.paths.activity_log));
    let config_hash = config.stable_hash().ok();

    let report = MonitorLoop::new(
        &mut device,
        TelemetryCollector::new(&config.telemetry),
        rows.clone(),
        options,
        StopToken::with_interrupts(),
    )
    .with_activity_log(log)
    .with_session_labels(path.to_string_lossy(), config_hash)
    .run()?;

    match output_mode(cli) {
        OutputMode::Human => print_monitor_summary(&report),
        OutputMode::Json => write_json_line(&json!({
            "command": "monitor",
            "device": path.to_string_lossy(),
            "fields": rows,
            "report": report,
        }))?,
    }
    Ok(())
}

fn print_monitor_summary(report: &MonitorReport) {
    println!(
        "Monitor stopped: {} ({} ticks, {} frames, {} device errors)",
        report.stop_reason.as_str(),
        report.ticks,
        report.frames_written,
        report.device_errors
    );
}

fn run_settings(cli: &Cli, args: &SettingsArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(SettingsCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "settings path",
                    "path": path.to_string_lossy(),
                    "exists": exists,
                }))?,
            }
            Ok(())
        }
        Some(SettingsCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| LcdError::Runtime {
                            details: format!("serialize config: {e}"),
                        })?;
                    println!("{toml_str}");
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "settings show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        Some(SettingsCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "settings validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                if output_mode(cli) == OutputMode::Json {
                    write_json_line(&json!({
                        "command": "settings validate",
                        "valid": false,
                        "code": e.code(),
                        "error": e.to_string(),
                    }))?;
                }
                Err(e.into())
            }
        },
    }
}

/// Effective config plus the device path, with `-d` taking precedence.
fn resolve_device(cli: &Cli) -> Result<(Config, PathBuf), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let path = cli
        .device
        .clone()
        .unwrap_or_else(|| config.device.path.clone());
    if path.as_os_str().is_empty() {
        return Err(CliError::Usage("device path must not be empty".to_string()));
    }
    Ok((config, path))
}

fn print_success(message: &str) {
    println!("{} {message}", "Success:".green().bold());
}

/// Accepts `on/off`, `true/false`, `yes/no`, or any integer (nonzero is on).
fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| {
                format!("expected an integer, on/off, true/false or yes/no, got {raw:?}")
            }),
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("LCDCTL_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn device_flag_is_global() {
        let cli = parse(&["lcdctl", "clear", "-d", "/dev/lcd1"]);
        assert_eq!(cli.device, Some(PathBuf::from("/dev/lcd1")));
        let cli = parse(&["lcdctl", "--device", "/dev/lcd2", "read"]);
        assert_eq!(cli.device, Some(PathBuf::from("/dev/lcd2")));
        assert!(matches!(cli.command, Command::Read));
    }

    #[test]
    fn config_accepts_every_flag_spelling() {
        let cli = parse(&["lcdctl", "config", "1", "off", "TRUE"]);
        let Command::Config(args) = cli.command else {
            panic!("expected config command");
        };
        assert!(args.display);
        assert!(!args.cursor);
        assert!(args.blink);

        let cli = parse(&["lcdctl", "config", "-1", "0", "7"]);
        let Command::Config(args) = cli.command else {
            panic!("expected config command");
        };
        assert!(args.display);
        assert!(!args.cursor);
        assert!(args.blink);
    }

    #[test]
    fn config_positionals_take_one_value_each() {
        let config = Cli::command();
        let sub = config
            .find_subcommand("config")
            .expect("config subcommand is defined");
        for name in ["display", "cursor", "blink"] {
            let arg = sub
                .get_arguments()
                .find(|a| a.get_id() == name)
                .expect("positional is defined");
            assert!(arg.is_positional());
            assert!(matches!(arg.get_action(), ArgAction::Set));
            assert!(arg.is_required_set());
        }
    }

    #[test]
    fn config_rejects_garbage_and_missing_values() {
        assert!(Cli::try_parse_from(["lcdctl", "config", "1", "1", "maybe"]).is_err());
        assert!(Cli::try_parse_from(["lcdctl", "config", "1", "1"]).is_err());
    }

    #[test]
    fn print_keeps_text_verbatim() {
        let cli = parse(&["lcdctl", "print", "-- hello --"]);
        let Command::Print(args) = cli.command else {
            panic!("expected print command");
        };
        assert_eq!(args.text, "-- hello --");
        assert!(Cli::try_parse_from(["lcdctl", "print"]).is_err());
    }

    #[test]
    fn monitor_parses_fields_and_overrides() {
        let cli = parse(&[
            "lcdctl",
            "monitor",
            "ip",
            "temp",
            "--interval-ms",
            "250",
            "--ticks",
            "3",
            "--on-device-error",
            "abort",
        ]);
        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor command");
        };
        assert_eq!(args.top, "ip");
        assert_eq!(args.bottom, "temp");
        assert_eq!(args.interval_ms, Some(250));
        assert_eq!(args.ticks, Some(3));
        assert_eq!(args.on_device_error, Some(TickErrorPolicy::Abort));
    }

    #[test]
    fn monitor_rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["lcdctl", "monitor", "ip"]).is_err());
        assert!(
            Cli::try_parse_from(["lcdctl", "monitor", "ip", "temp", "--interval-ms", "0"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["lcdctl", "monitor", "ip", "temp", "--ticks", "0"]).is_err());
    }

    #[test]
    fn settings_defaults_to_path() {
        let cli = parse(&["lcdctl", "settings"]);
        let Command::Settings(args) = cli.command else {
            panic!("expected settings command");
        };
        assert!(args.command.is_none());
    }

    #[test]
    fn parse_flag_spellings() {
        assert_eq!(parse_flag("1"), Ok(true));
        assert_eq!(parse_flag("0"), Ok(false));
        assert_eq!(parse_flag(" On "), Ok(true));
        assert_eq!(parse_flag("false"), Ok(false));
        assert_eq!(parse_flag("42"), Ok(true));
        assert!(parse_flag("").is_err());
        assert!(parse_flag("enable").is_err());
        assert!(parse_flag("no").is_ok_and(|on| !on));
        let message = parse_flag("enable").unwrap_err();
        assert!(message.contains("yes/no"));
        assert!(message.contains("integer"));
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("json")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some(" JSON ")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("human")), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None), OutputMode::Human);
    }

    #[test]
    fn every_error_exits_one() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 1);
        assert_eq!(
            CliError::Lcd(LcdError::Runtime {
                details: "x".into()
            })
            .exit_code(),
            1
        );
        assert_eq!(CliError::Io(io::Error::other("x")).exit_code(), 1);
    }
}
