//! Command dispatch

use std::io::{self, BufRead, Write};

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{
    build_engine, resolve_definition, PropagationEngine, PulseHost, SimulatedHost,
};
use crate::cli::args::{Cli, Commands, ConfigCommands, Step};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::ThreadedHost;
use crate::tree_traits::{pulsing_edges, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    match &cli.command {
        Some(Commands::Tree) => _tree(cli),
        Some(Commands::Simulate { steps }) => _simulate(cli, steps),
        Some(Commands::Run) => _run(cli),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => _completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see `pulsetree --help`".to_string(),
        )),
    }
}

/// Config layers first, then command line flags on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    if cli.delay_ms == Some(0) {
        return Err(CliError::InvalidArgs(
            "--delay-ms must be greater than 0".to_string(),
        ));
    }
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(hierarchy) = &cli.hierarchy {
        settings.hierarchy = Some(hierarchy.clone());
    }
    if let Some(ms) = cli.delay_ms {
        settings.pulse_delay_ms = ms;
    }
    if !settings.color {
        colored::control::set_override(false);
    }
    debug!(?settings, "effective settings");
    Ok(settings)
}

fn load_engine(settings: &Settings) -> CliResult<PropagationEngine> {
    let definition = resolve_definition(settings.hierarchy.as_deref())?;
    Ok(build_engine(&definition)?)
}

/// Writes the hierarchy with current values and pulses.
pub fn render_state(out: &mut impl Write, host: &impl PulseHost) -> io::Result<()> {
    let snapshot = host.snapshot();
    write!(out, "{}", host.hierarchy().to_tree_string(&snapshot))?;
    let edges = pulsing_edges(&snapshot);
    if !edges.is_empty() {
        output::detail(out, &format!("pulsing: {}", edges.iter().join(", ")))?;
    }
    Ok(())
}

/// Applies `steps` in order, rendering the state after each one.
#[instrument(level = "debug", skip(host, out))]
pub fn run_script(host: &mut SimulatedHost, steps: &[Step], out: &mut impl Write) -> CliResult<()> {
    for step in steps {
        match step {
            Step::Click(id) => {
                if host.activate(id).is_none() {
                    output::warning(&format!("unknown node: {id}"));
                }
            }
            Step::Wait(duration) => {
                host.advance(*duration);
            }
        }
        output::header(out, &format!("t={}ms {}", host.now().as_millis(), step))?;
        render_state(out, &*host)?;
    }
    Ok(())
}

/// Reads node ids line by line and activates them until `quit` or EOF.
///
/// Pulses cleared by a timer since the last render are redrawn before the
/// next input is handled, so an empty line refreshes the view.
pub fn run_session<H: PulseHost>(
    host: &mut H,
    input: impl BufRead,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut shown = host.snapshot();
    render_state(out, &*host)?;
    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        if matches!(command, "quit" | "exit") {
            break;
        }
        if command != "show" && host.snapshot() != shown {
            output::header(out, "pulses cleared")?;
            render_state(out, &*host)?;
        }
        match command {
            "" => {}
            "show" => render_state(out, &*host)?,
            id => match host.activate(id) {
                Some(activation) => {
                    output::header(
                        out,
                        &format!("click {id} (generation {})", activation.generation),
                    )?;
                    render_state(out, &*host)?;
                }
                None => output::warning(&format!("unknown node: {id}")),
            },
        }
        shown = host.snapshot();
        out.flush()?;
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let engine = load_engine(&settings)?;
    let host = SimulatedHost::new(engine, settings.pulse_delay());
    render_state(&mut io::stdout().lock(), &host)?;
    Ok(())
}

#[instrument(skip(cli))]
fn _simulate(cli: &Cli, steps: &[Step]) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let engine = load_engine(&settings)?;
    let mut host = SimulatedHost::new(engine, settings.pulse_delay());
    run_script(&mut host, steps, &mut io::stdout().lock())
}

#[instrument(skip(cli))]
fn _run(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let engine = load_engine(&settings)?;
    let mut host = ThreadedHost::new(engine, settings.pulse_delay());

    let mut stdout = io::stdout().lock();
    output::header(
        &mut stdout,
        &format!(
            "pulse {}ms; type a node id to click it, enter or `show` to redraw, `quit` to exit",
            settings.pulse_delay_ms
        ),
    )?;
    run_session(&mut host, io::stdin().lock(), &mut stdout)?;

    let snapshot = host.shutdown();
    debug!(generation = %snapshot.generation, "session finished");
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string());
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| local_config_path(std::path::Path::new(".")));
            output::info(&format!("global: {global}"));
            output::info(&format!("local:  {}", local.display()));
        }
    }
    Ok(())
}

fn _completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    use crate::application::DEFAULT_PULSE_DELAY;
    use crate::domain::HierarchyDefinition;
    use clap::Parser;

    fn host() -> SimulatedHost {
        let engine = build_engine(&HierarchyDefinition::builtin()).unwrap();
        SimulatedHost::new(engine, DEFAULT_PULSE_DELAY)
    }

    #[test]
    fn given_script_when_running_then_renders_each_step() {
        colored::control::set_override(false);
        let mut host = host();
        let steps = vec![
            Step::Click("counter2".into()),
            Step::Wait(Duration::from_millis(700)),
        ];
        let mut out = Vec::new();

        run_script(&mut host, &steps, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("t=0ms click counter2"));
        assert!(!text.contains("app -> counter2"));
        assert!(text.contains("pulsing: counter2 -> display2, counter2 -> logger"));
        assert!(text.contains("t=700ms wait 700ms"));
        assert!(host.snapshot().pulses.is_empty());
    }

    /// Hands out one line per read, sleeping before each.
    struct SlowLines {
        lines: Vec<&'static str>,
        pause: Duration,
    }

    impl io::Read for SlowLines {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.lines.is_empty() {
                return Ok(0);
            }
            std::thread::sleep(self.pause);
            let line = self.lines.remove(0).as_bytes();
            let n = line.len().min(buf.len());
            buf[..n].copy_from_slice(&line[..n]);
            Ok(n)
        }
    }

    #[test]
    fn given_timer_cleared_pulses_when_next_input_then_redrawn() {
        colored::control::set_override(false);
        let engine = build_engine(&HierarchyDefinition::builtin()).unwrap();
        let mut host = ThreadedHost::new(engine, Duration::from_millis(10));
        let input = io::BufReader::new(SlowLines {
            lines: vec!["counter1\n", "\n"],
            pause: Duration::from_millis(200),
        });
        let mut out = Vec::new();

        run_session(&mut host, input, &mut out).unwrap();
        host.shutdown();

        let text = String::from_utf8(out).unwrap();
        let click = text.find("click counter1").expect("click rendered");
        let cleared = text.find("pulses cleared").expect("clear rendered");
        assert!(click < cleared);
        assert!(!text[cleared..].contains("pulsing:"));
    }

    #[test]
    fn given_zero_delay_flag_when_loading_settings_then_invalid_args() {
        let cli = Cli::try_parse_from(["pulsetree", "--delay-ms", "0", "tree"]).unwrap();
        let err = load_settings(&cli).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgs(_)));
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_session_input_when_running_then_clicks_until_quit() {
        colored::control::set_override(false);
        let mut host = host();
        let input = Cursor::new("app\n\nghost\nshow\nquit\nlogger\n");
        let mut out = Vec::new();

        run_session(&mut host, input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("click app (generation #1)"));
        assert!(!text.contains("click logger"));
        let logger = host.snapshot().values.get("logger").and_then(|v| v.counter());
        assert_eq!(logger, Some(1));
    }
}
