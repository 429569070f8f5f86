//! CLI argument definitions using clap

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueHint};

/// Click nodes of a fixed hierarchy and watch the activation pulse through it
#[derive(Parser, Debug)]
#[command(name = "pulsetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Hierarchy definition file (default: built-in diagram)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub hierarchy: Option<PathBuf>,

    /// Config file (default: ./.pulsetree.toml if present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Pulse duration in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy with initial values
    Tree,

    /// Replay clicks and waits on a simulated clock
    Simulate {
        /// Steps: `click:<id>` (or just `<id>`) and `wait:<ms>`
        #[arg(required = true)]
        steps: Vec<Step>,
    },

    /// Click nodes interactively (one id per line; `show`, `quit`)
    Run,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}

/// One step of a simulation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Click(String),
    Wait(Duration),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some(("click", id)) if !id.is_empty() => Ok(Step::Click(id.to_string())),
            Some(("wait", ms)) => ms
                .parse::<u64>()
                .map(|ms| Step::Wait(Duration::from_millis(ms)))
                .map_err(|_| format!("invalid wait duration: {ms}")),
            Some(_) => Err(format!("unknown step: {s}")),
            None if !s.is_empty() => Ok(Step::Click(s.to_string())),
            None => Err("empty step".to_string()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Click(id) => write!(f, "click {id}"),
            Step::Wait(d) => write!(f, "wait {}ms", d.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("click:app", Step::Click("app".into()))]
    #[case("logger", Step::Click("logger".into()))]
    #[case("wait:600", Step::Wait(Duration::from_millis(600)))]
    #[case(" wait:0 ", Step::Wait(Duration::ZERO))]
    fn given_valid_step_when_parsing_then_ok(#[case] input: &str, #[case] expected: Step) {
        assert_eq!(input.parse::<Step>().unwrap(), expected);
    }

    #[rstest]
    #[case("wait:soon")]
    #[case("jump:app")]
    #[case("click:")]
    #[case("")]
    fn given_invalid_step_when_parsing_then_err(#[case] input: &str) {
        assert!(input.parse::<Step>().is_err());
    }

    #[test]
    fn given_simulate_args_when_parsing_then_steps_collected() {
        let cli = Cli::try_parse_from(["pulsetree", "simulate", "app", "wait:700"]).unwrap();
        match cli.command {
            Some(Commands::Simulate { steps }) => assert_eq!(
                steps,
                vec![
                    Step::Click("app".into()),
                    Step::Wait(Duration::from_millis(700))
                ]
            ),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
