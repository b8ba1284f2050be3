//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Run whitelisted stream filters over chat text
#[derive(Parser, Debug)]
#[command(name = "filterbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "FILTERBOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "warn",
        env = "FILTERBOT_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "FILTERBOT_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to run)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read chat lines from stdin and print replies (default)
    Run {
        /// Reload the config file when it changes
        #[arg(short, long)]
        watch: bool,

        /// Channel the console lines are said in
        #[arg(long, default_value = "#console")]
        channel: String,

        /// Nickname the console lines come from
        #[arg(long, default_value = "console")]
        nick: String,
    },

    /// List the filters the whitelist allows
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run one filter over the given text
    Apply {
        /// Filter name, e.g. `string.rot13`
        #[arg(required = true)]
        filter: String,

        /// Text to transform
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        text: Vec<String>,
    },
}

/// Output format for `list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One name per line
    Text,
    /// JSON object of name to dot count
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["filterbot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, None);
    }

    #[test]
    fn apply_collects_text_words() {
        let cli =
            Cli::try_parse_from(["filterbot", "apply", "string.rot13", "hello", "world"]).unwrap();
        match cli.command {
            Some(Command::Apply { filter, text }) => {
                assert_eq!(filter, "string.rot13");
                assert_eq!(text, vec!["hello", "world"]);
            }
            other => panic!("expected apply, got {other:?}"),
        }
    }

    #[test]
    fn apply_requires_text() {
        assert!(Cli::try_parse_from(["filterbot", "apply", "string.rot13"]).is_err());
    }

    #[test]
    fn list_accepts_json_format_and_global_config() {
        let cli =
            Cli::try_parse_from(["filterbot", "list", "--format", "json", "-c", "bot.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bot.yaml")));
        assert!(matches!(
            cli.command,
            Some(Command::List {
                format: OutputFormat::Json
            })
        ));
    }
}
