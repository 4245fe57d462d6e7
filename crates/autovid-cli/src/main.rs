//! Command-line director for humanized walkthrough recordings.
//!
//! Sends single humanized actions to a running accessibility agent, plays
//! production scripts, and validates scripts offline.
//!
//! # Usage
//!
//! ```bash
//! # Tap an element by accessibility ID
//! autovid tap login-button
//!
//! # Tap a Button by label
//! autovid tap "Sign In" --label -T Button
//!
//! # Type slowly into a field
//! autovid type email-field "ada@example.com" --speed 0.2
//!
//! # Slow swipe up over the first scrollable area
//! autovid scroll up
//!
//! # Rotate the device
//! autovid orientation landscape-left
//!
//! # Validate, then play a production and keep its timeline
//! autovid check demo.json
//! autovid run demo.json --timeline demo.timeline.jsonl
//!
//! # Talk to an agent on another machine
//! autovid --host 192.168.1.20 --port 8080 scroll down
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use autovid_core::agent_driver::AgentDriver;
use autovid_core::config::AutovidConfig;
use autovid_core::device::{DeviceContext, Orientation};
use autovid_core::director::Director;
use autovid_core::driver::{AutomationDriver, DriverConfig};
use autovid_core::gesture::{Direction, GestureVelocity};
use autovid_core::humanize::Humanizer;
use autovid_core::locator::Locator;
use autovid_core::script::{perform, play, Production, ScriptError, Step};

/// Humanized iOS automation for screen-recorded walkthroughs.
#[derive(Parser)]
#[command(name = "autovid")]
#[command(about = "Drive an app like a presenter while the screen records")]
#[command(version)]
struct Cli {
    /// Agent host (defaults to the configured host)
    #[arg(long, env = "AUTOVID_HOST", global = true)]
    host: Option<String>,

    /// Agent port (defaults to the configured port)
    #[arg(long, env = "AUTOVID_PORT", global = true)]
    port: Option<u16>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Tap an element by ID or label
    Tap {
        /// The selector (accessibility ID or label, `*` and `?` wildcards allowed)
        selector: String,
        /// Match by accessibility label instead of ID
        #[arg(short, long)]
        label: bool,
        /// Filter by element type (e.g., Button, Cell)
        #[arg(short = 'T', long = "type")]
        element_type: Option<String>,
    },

    /// Tap a field, then type into it one character at a time
    Type {
        /// The field selector
        selector: String,
        /// Text to type
        text: String,
        #[arg(short, long)]
        label: bool,
        #[arg(short = 'T', long = "type")]
        element_type: Option<String>,
        /// Seconds between characters
        #[arg(long, value_parser = parse_seconds)]
        speed: Option<f64>,
    },

    /// Drag from one element's centre to another's
    Drag {
        /// Source selector
        from: String,
        /// Destination selector
        to: String,
        /// Match both selectors by label
        #[arg(short, long)]
        label: bool,
        /// slow, default, fast, or points per second
        #[arg(long, default_value = "default")]
        velocity: GestureVelocity,
        #[arg(long, value_parser = parse_seconds)]
        duration: Option<f64>,
    },

    /// Move a slider to a position between 0.0 and 1.0
    Slider {
        selector: String,
        /// Target position; values outside 0.0..=1.0 are clamped
        #[arg(allow_negative_numbers = true)]
        value: f64,
        #[arg(short, long)]
        label: bool,
        #[arg(short = 'T', long = "type")]
        element_type: Option<String>,
        /// Seconds to hold after adjusting
        #[arg(long, value_parser = parse_seconds)]
        duration: Option<f64>,
    },

    /// Press and hold an element
    LongPress {
        selector: String,
        #[arg(short, long)]
        label: bool,
        #[arg(short = 'T', long = "type")]
        element_type: Option<String>,
        /// Seconds to hold
        #[arg(long, value_parser = parse_seconds)]
        duration: Option<f64>,
    },

    /// Rotate the device (portrait, landscape-left, landscape-right, ...)
    Orientation {
        orientation: Orientation,
    },

    /// Slow swipe over the first scrollable area
    Scroll {
        /// up, down, left, right
        direction: Direction,
        /// Element to search for a scrollable area (default: the app)
        #[arg(long)]
        root: Option<String>,
        /// Match the root by label
        #[arg(short, long)]
        label: bool,
        #[arg(long, value_parser = parse_seconds)]
        duration: Option<f64>,
    },

    /// Log an announcement for captions
    Announce {
        text: String,
    },

    /// Play a production script
    Run {
        /// Path to the script (JSON)
        script: PathBuf,
        /// Write the scene timeline (JSON Lines) here
        #[arg(long)]
        timeline: Option<PathBuf>,
    },

    /// Validate a production script without connecting
    Check {
        /// Path to the script (JSON)
        script: PathBuf,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{s}' must be zero or more seconds"))
    }
}

#[derive(Debug)]
enum CliError {
    Connection(String),
    Script(ScriptError),
    Logging(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Connection(_) => ExitCode::from(2),
            CliError::Script(_) => ExitCode::from(3),
            CliError::Logging(_) => ExitCode::from(4),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CliError::Script(e) => write!(f, "Script error: {}", e),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl From<ScriptError> for CliError {
    fn from(e: ScriptError) -> Self {
        CliError::Script(e)
    }
}

fn init_logging(log_file: Option<&Path>, json: bool) -> Result<(), CliError> {
    let writer = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| CliError::Logging(format!("{} is not a file path", path.display())))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir).map_err(|e| CliError::Logging(e.to_string()))?;
            BoxMakeWriter::new(tracing_appender::rolling::never(dir, file_name))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(log_file.is_none());

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref(), cli.json_logs) {
        eprintln!("Error: {}", e);
        return e.exit_code();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn locator(selector: String, label: bool, element_type: Option<String>) -> Locator {
    Locator::from_parts(selector, label, element_type)
}

/// The script step equivalent to a single-action command.
fn step_for(command: Command) -> Option<Step> {
    let step = match command {
        Command::Tap { selector, label, element_type } => Step::Tap {
            target: locator(selector, label, element_type),
        },
        Command::Type { selector, text, label, element_type, speed } => Step::Type {
            target: locator(selector, label, element_type),
            text,
            speed,
        },
        Command::Drag { from, to, label, velocity, duration } => Step::Drag {
            from: locator(from, label, None),
            to: locator(to, label, None),
            duration,
            velocity,
        },
        Command::Slider { selector, value, label, element_type, duration } => Step::Slider {
            target: locator(selector, label, element_type),
            value,
            duration,
        },
        Command::LongPress { selector, label, element_type, duration } => Step::LongPress {
            target: locator(selector, label, element_type),
            duration,
        },
        Command::Orientation { orientation } => Step::Orientation { orientation },
        Command::Scroll { direction, root, label, duration } => Step::Scroll {
            direction,
            target: root.map_or(Locator::App, |r| locator(r, label, None)),
            duration,
        },
        Command::Announce { text } => Step::Announce { text },
        Command::Run { .. } | Command::Check { .. } => return None,
    };
    Some(step)
}

async fn connect(config: DriverConfig) -> Result<AgentDriver, CliError> {
    let mut driver = AgentDriver::from_config(config);
    if let Err(e) = driver.connect().await {
        return Err(CliError::Connection(format!("{}:{}: {e}", driver.host(), driver.port())));
    }
    info!(host = driver.host(), port = driver.port(), "connected to agent");
    Ok(driver)
}

fn check(script: &Path, format: OutputFormat) -> Result<(), CliError> {
    let production = Production::load(script)?;
    match format {
        OutputFormat::Json => {
            let scenes: Vec<_> = production
                .scenes
                .iter()
                .map(|s| serde_json::json!({ "name": s.name, "steps": s.steps.len() }))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "app": production.app,
                    "scenes": scenes,
                    "steps": production.step_count(),
                })
            );
        }
        OutputFormat::Text => {
            println!(
                "OK: {} scene(s), {} step(s)",
                production.scenes.len(),
                production.step_count()
            );
            for (i, scene) in production.scenes.iter().enumerate() {
                println!("  {}. {} ({} step(s))", i + 1, scene.name, scene.steps.len());
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Check { script, format } = &cli.command {
        return check(script, *format);
    }

    let config = AutovidConfig::load();
    let driver_config = DriverConfig::Agent {
        host: cli.host.unwrap_or(config.agent_host),
        port: cli.port.unwrap_or(config.agent_port),
    };
    let pacing = config.pacing;
    let mut device = DeviceContext::default();

    match cli.command {
        Command::Run { script, timeline } => {
            let production = Production::load(&script)?;
            let driver = connect(driver_config).await?;
            let mut director = Director::new(Humanizer::new(Arc::new(driver), pacing));
            if let Some(path) = timeline {
                director = director.with_timeline(path);
            }
            play(&production, &director, &mut device).await;
        }
        Command::Announce { text } => {
            // Narration only; no agent needed.
            let driver = AgentDriver::from_config(driver_config);
            let director = Director::new(Humanizer::new(Arc::new(driver), pacing));
            director.announce(&text).await;
        }
        command => {
            let Some(step) = step_for(command) else {
                return Ok(());
            };
            let driver = connect(driver_config).await?;
            let director = Director::new(Humanizer::new(Arc::new(driver), pacing));
            perform(&step, &director, &mut device).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn seconds_must_be_non_negative() {
        assert_eq!(parse_seconds("1.5"), Ok(1.5));
        assert_eq!(parse_seconds("0"), Ok(0.0));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn scroll_defaults_to_app_root() {
        let cli = Cli::try_parse_from(["autovid", "scroll", "up"]).unwrap();
        assert_eq!(
            step_for(cli.command),
            Some(Step::Scroll { direction: Direction::Up, target: Locator::App, duration: None })
        );
    }

    #[test]
    fn typed_tap_builds_typed_locator() {
        let cli = Cli::try_parse_from(["autovid", "tap", "Sign In", "-l", "-T", "Button"]).unwrap();
        assert_eq!(
            step_for(cli.command),
            Some(Step::Tap {
                target: Locator::Typed {
                    selector: "Sign In".into(),
                    by_label: true,
                    element_type: "Button".into(),
                },
            })
        );
    }

    #[test]
    fn drag_velocity_accepts_points_per_second() {
        let cli = Cli::try_parse_from(["autovid", "drag", "a", "b", "--velocity", "800"]).unwrap();
        match step_for(cli.command) {
            Some(Step::Drag { velocity, .. }) => {
                assert_eq!(velocity, GestureVelocity::PointsPerSecond(800.0))
            }
            other => panic!("expected drag, got {other:?}"),
        }
    }

    #[test]
    fn orientation_parses_kebab_case() {
        let cli = Cli::try_parse_from(["autovid", "orientation", "landscape-left"]).unwrap();
        assert_eq!(
            step_for(cli.command),
            Some(Step::Orientation { orientation: Orientation::LandscapeLeft })
        );
    }

    #[test]
    fn slider_accepts_negative_value() {
        let cli = Cli::try_parse_from(["autovid", "slider", "volume", "-0.5"]).unwrap();
        assert_eq!(
            step_for(cli.command),
            Some(Step::Slider {
                target: Locator::Id("volume".into()),
                value: -0.5,
                duration: None,
            })
        );
    }

    #[test]
    fn global_agent_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["autovid", "scroll", "down", "--host", "10.0.0.2", "--port", "9000"])
                .unwrap();
        assert_eq!(cli.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(cli.port, Some(9000));
    }
}
