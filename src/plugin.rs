//! Chat command dispatcher for the filter command.
//!
//! Recognizes `<prefix><trigger> <filter> <text>` in channel or private
//! text, runs the request through a [`FilterWhitelist`] and formats the
//! reply. Bold spans use the IRC `\x02` control code.

use std::sync::Arc;

use filterbot_core::{FilterRequest, FilterResult};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use crate::transform::{StandardRegistry, TransformRegistry};
use crate::whitelist::FilterWhitelist;

/// Name under which the plugin answers module-level help requests.
pub const MODULE_NAME: &str = "filterbot";

const BOLD: char = '\x02';

/// Inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMessage {
    /// Text said in a channel.
    Channel {
        /// Channel name, e.g. `#rust`.
        chan: String,
        /// Nickname of the sender.
        source: String,
        /// Message text.
        text: String,
    },
    /// Text sent directly to the bot.
    Private {
        /// Nickname of the sender.
        source: String,
        /// Message text.
        text: String,
    },
}

impl TextMessage {
    /// Shorthand for a channel message.
    pub fn channel(
        chan: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::Channel {
            chan: chan.into(),
            source: source.into(),
            text: text.into(),
        }
    }

    /// Shorthand for a private message.
    pub fn private(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Private {
            source: source.into(),
            text: text.into(),
        }
    }

    /// Message text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Channel { text, .. } | Self::Private { text, .. } => text,
        }
    }

    /// Where a reply goes: the channel, or the sender for private text.
    #[must_use]
    pub fn reply_target(&self) -> &str {
        match self {
            Self::Channel { chan, .. } => chan,
            Self::Private { source, .. } => source,
        }
    }
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Channel or nickname to send to.
    pub target: String,
    /// Message text.
    pub text: String,
}

impl Reply {
    fn to(msg: &TextMessage, text: String) -> Self {
        Self {
            target: msg.reply_target().to_string(),
            text,
        }
    }
}

/// Settings derived from [`Config`] on each reload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    prefix: String,
    trigger: String,
}

impl Settings {
    fn command(&self) -> String {
        format!("{}{}", self.prefix, self.trigger)
    }
}

/// The filter command.
pub struct FilterPlugin {
    whitelist: FilterWhitelist,
    /// Held for reading while a message is handled and for writing across a
    /// reload, so a handler sees the trigger and whitelist of one config.
    settings: RwLock<Settings>,
}

impl FilterPlugin {
    /// Create a plugin over `registry` configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid trigger and `Error::Registry`
    /// if the registry cannot list its filters.
    pub fn new(registry: Arc<dyn TransformRegistry>, config: &Config) -> Result<Self> {
        config.validate()?;
        let whitelist = FilterWhitelist::with_whitelist(registry, &config.filter.whitelist)?;
        Ok(Self {
            whitelist,
            settings: RwLock::new(Self::settings_from(config)),
        })
    }

    /// Create a plugin over the built-in filters.
    ///
    /// # Errors
    ///
    /// Same as [`FilterPlugin::new`].
    pub fn with_standard_registry(config: &Config) -> Result<Self> {
        Self::new(Arc::new(StandardRegistry::new()), config)
    }

    fn settings_from(config: &Config) -> Settings {
        Settings {
            prefix: config.commands_prefix.clone(),
            trigger: config.filter.trigger.clone(),
        }
    }

    /// Apply a new configuration.
    ///
    /// The whitelist and the trigger change together, and nothing changes if
    /// either step fails. Reloads run one at a time.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid trigger and `Error::Registry`
    /// if the registry cannot list its filters.
    pub fn reload(&self, config: &Config) -> Result<()> {
        config.validate()?;

        let mut settings = self.settings.write();
        self.whitelist.rebuild(&config.filter.whitelist)?;
        *settings = Self::settings_from(config);

        info!(command = %settings.command(), "Filter plugin reloaded");
        Ok(())
    }

    /// Allowed filter names, sorted.
    #[must_use]
    pub fn available_filters(&self) -> Vec<String> {
        self.whitelist.list_allowed()
    }

    /// Current commands prefix, e.g. `!`.
    #[must_use]
    pub fn commands_prefix(&self) -> String {
        self.settings.read().prefix.clone()
    }

    /// The underlying whitelist engine.
    #[must_use]
    pub fn whitelist(&self) -> &FilterWhitelist {
        &self.whitelist
    }

    /// React to a text message. Returns `None` when the message is not
    /// addressed to this command.
    pub fn handle(&self, msg: &TextMessage) -> Option<Reply> {
        let settings = self.settings.read();
        let text = msg.text().trim();
        let (head, args) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));

        if !head.eq_ignore_ascii_case(&settings.command()) {
            return None;
        }

        let Some(request) = FilterRequest::parse(args) else {
            debug!(reply_to = %msg.reply_target(), "Filter usage requested");
            return Some(Reply::to(msg, self.usage(&settings)));
        };

        let result = self
            .whitelist
            .apply(request.filter, request.payload.as_bytes());
        Some(Reply::to(msg, Self::render(&result)))
    }

    /// Answer a help request. `words[0]` names the module, `words[1]`
    /// (if present) the command.
    pub fn help(&self, msg: &TextMessage, words: &[&str]) -> Option<Reply> {
        let settings = self.settings.read();
        match words {
            [module] if module.eq_ignore_ascii_case(MODULE_NAME) => Some(Reply::to(
                msg,
                format!(
                    "Provides the {BOLD}{}{BOLD} command which transforms the given input \
                     using some stream filter.",
                    settings.trigger
                ),
            )),
            [_, command, ..] if *command == settings.trigger => {
                let filters = self
                    .available_filters()
                    .iter()
                    .map(|f| format!("{BOLD}{f}{BOLD}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(Reply::to(
                    msg,
                    format!(
                        "{BOLD}Usage:{BOLD} {} <filter> <input>. Transforms the given \
                         <input> using the given <filter>. The following filters are \
                         available: {filters}.",
                        settings.command()
                    ),
                ))
            }
            _ => None,
        }
    }

    fn usage(&self, settings: &Settings) -> String {
        format!(
            "Usage: {BOLD}{} <filter> <text>{BOLD}. Available filters: {}.",
            settings.command(),
            self.available_filters().join(", ")
        )
    }

    fn render(result: &FilterResult) -> String {
        match result {
            FilterResult::Applied { filter, output } => {
                format!("{BOLD}{filter}{BOLD}: {}", String::from_utf8_lossy(output))
            }
            FilterResult::Denied { filter } => {
                format!("No such filter \"{filter}\" or filter blocked.")
            }
            FilterResult::ApplyFailed { filter, reason } => {
                format!("Filter \"{filter}\" failed: {reason}")
            }
        }
    }
}

impl std::fmt::Debug for FilterPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPlugin")
            .field("settings", &*self.settings.read())
            .field("whitelist", &self.whitelist)
            .finish()
    }
}
