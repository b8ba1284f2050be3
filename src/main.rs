//! Filterbot - whitelisted stream filters as a chat command
//!
//! `filterbot run` reads chat lines from stdin and prints replies;
//! `list` and `apply` expose the whitelist directly.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use filterbot::{
    FilterResult,
    cli::{Cli, Command, OutputFormat},
    config::Config,
    plugin::{FilterPlugin, TextMessage},
    reload::ConfigWatcher,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let plugin = match FilterPlugin::with_standard_registry(&config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to initialize filter plugin: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match cli.command {
        Some(Command::List { format }) => run_list(&plugin, format),
        Some(Command::Apply { filter, text }) => run_apply(&plugin, &filter, &text.join(" ")),
        Some(Command::Run {
            watch,
            channel,
            nick,
        }) => run_console(plugin, cli.config, watch, &channel, &nick).await,
        None => run_console(plugin, cli.config, false, "#console", "console").await,
    }
}

/// Print the allowed filters
fn run_list(plugin: &FilterPlugin, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Text => {
            for name in plugin.available_filters() {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&*plugin.whitelist().allowed()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Failed to serialize to JSON: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Run a single filter; exit status reflects the outcome
fn run_apply(plugin: &FilterPlugin, filter: &str, text: &str) -> ExitCode {
    match plugin.whitelist().apply(filter, text.as_bytes()) {
        FilterResult::Applied { output, .. } => {
            println!("{}", String::from_utf8_lossy(&output));
            ExitCode::SUCCESS
        }
        FilterResult::Denied { filter } => {
            eprintln!("❌ No such filter \"{filter}\" or filter blocked.");
            ExitCode::FAILURE
        }
        FilterResult::ApplyFailed { filter, reason } => {
            eprintln!("❌ Filter \"{filter}\" failed: {reason}");
            ExitCode::FAILURE
        }
    }
}

/// Treat stdin lines as channel text until EOF or Ctrl-C
async fn run_console(
    plugin: Arc<FilterPlugin>,
    config_path: Option<PathBuf>,
    watch: bool,
    channel: &str,
    nick: &str,
) -> ExitCode {
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let _watcher = match (watch, config_path) {
        (true, Some(path)) => {
            match ConfigWatcher::start(path, Arc::clone(&plugin), shutdown_tx.subscribe()) {
                Ok(w) => Some(w),
                Err(e) => {
                    error!("Failed to start config watcher: {e}");
                    return ExitCode::from(e.exit_code());
                }
            }
        }
        (true, None) => {
            warn!("--watch ignored: no config file given");
            None
        }
        (false, _) => None,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        filters = plugin.available_filters().len(),
        "Filterbot ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let code = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let msg = TextMessage::channel(channel, nick, line);
                    if let Some(reply) = dispatch(&plugin, &msg) {
                        println!("[{}] {}", reply.target, reply.text);
                    }
                }
                Ok(None) => break ExitCode::SUCCESS,
                Err(e) => {
                    error!("Failed to read stdin: {e}");
                    break ExitCode::from(filterbot::Error::Io(e).exit_code());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break ExitCode::SUCCESS;
            }
        }
    };

    let _ = shutdown_tx.send(());
    code
}

/// Route `<prefix>help <words...>` to the help handler, everything else to
/// the command handler
fn dispatch(plugin: &FilterPlugin, msg: &TextMessage) -> Option<filterbot::plugin::Reply> {
    let help = format!("{}help", plugin.commands_prefix());
    let mut words = msg.text().split_whitespace();
    if words.next().is_some_and(|w| w.eq_ignore_ascii_case(&help)) {
        let words: Vec<&str> = words.collect();
        return plugin.help(msg, &words);
    }
    plugin.handle(msg)
}
