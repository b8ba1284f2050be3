//! Filter command tests
//!
//! Drives the chat command end to end:
//! - Default whitelist contents
//! - base64 and rot13 through the command
//! - Unknown and blocked filters
//! - Compression filters behind an explicit whitelist
//! - Custom registries plugged in behind the whitelist

use std::sync::Arc;

use filterbot::config::{Config, FilterConfig};
use filterbot::plugin::{FilterPlugin, Reply, TextMessage};
use filterbot::transform::{StandardRegistry, TransformError};
use pretty_assertions::assert_eq;

fn plugin() -> FilterPlugin {
    FilterPlugin::with_standard_registry(&Config::default()).unwrap()
}

fn say(plugin: &FilterPlugin, text: &str) -> Reply {
    plugin
        .handle(&TextMessage::channel("#test", "Tester", text))
        .unwrap()
}

fn reply(text: &str) -> Reply {
    Reply {
        target: "#test".to_string(),
        text: text.to_string(),
    }
}

/// The default whitelist admits exactly the one-dot string and convert filters
#[test]
fn test_default_whitelist() {
    assert_eq!(
        plugin().available_filters(),
        vec![
            "convert.*",
            "string.rot13",
            "string.strip_tags",
            "string.tolower",
            "string.toupper",
        ]
    );
}

/// base64 encoding and decoding are reachable through the `convert.*` family
#[test]
fn test_base64_filter() {
    let plugin = plugin();
    assert_eq!(
        say(&plugin, "!filter convert.base64-encode PHP"),
        reply("\x02convert.base64-encode\x02: UEhQ")
    );
    assert_eq!(
        say(&plugin, "!filter convert.base64-decode UEhQ"),
        reply("\x02convert.base64-decode\x02: PHP")
    );
}

#[test]
fn test_rot13_filter() {
    assert_eq!(
        say(&plugin(), "!filter string.rot13 PHP"),
        reply("\x02string.rot13\x02: CUC")
    );
}

#[test]
fn test_unknown_filter() {
    assert_eq!(
        say(&plugin(), "!filter surely.this.does.not.exist !!"),
        reply("No such filter \"surely.this.does.not.exist\" or filter blocked.")
    );
}

/// Dot counts must match: `convert.*` does not admit `convert.iconv.*`
#[test]
fn test_nested_family_blocked_by_default() {
    assert_eq!(
        say(&plugin(), "!filter convert.iconv.utf-8/ascii hello"),
        reply("No such filter \"convert.iconv.utf-8/ascii\" or filter blocked.")
    );
}

#[test]
fn test_nested_family_allowed_when_whitelisted() {
    let config = Config {
        filter: FilterConfig {
            whitelist: "convert.iconv.*".into(),
            ..FilterConfig::default()
        },
        ..Config::default()
    };
    let plugin = FilterPlugin::with_standard_registry(&config).unwrap();
    assert_eq!(plugin.available_filters(), vec!["convert.iconv.*"]);
    assert_eq!(
        say(&plugin, "!filter convert.iconv.utf-8/ascii//TRANSLIT café"),
        reply("\x02convert.iconv.utf-8/ascii//TRANSLIT\x02: caf?")
    );
}

#[test]
fn test_strip_tags_and_case_filters() {
    let plugin = plugin();
    assert_eq!(
        say(&plugin, "!filter string.strip_tags <b>bold</b> move"),
        reply("\x02string.strip_tags\x02: bold move")
    );
    assert_eq!(
        say(&plugin, "!filter string.tolower MiXeD"),
        reply("\x02string.tolower\x02: mixed")
    );
}

/// Compression filters stay blocked until a whitelist names them
#[test]
fn test_compression_filters_need_whitelisting() {
    assert_eq!(
        say(&plugin(), "!filter consumed as is"),
        reply("No such filter \"consumed\" or filter blocked.")
    );

    let config = Config {
        filter: FilterConfig {
            whitelist: "consumed, zlib.*".into(),
            ..FilterConfig::default()
        },
        ..Config::default()
    };
    let plugin = FilterPlugin::with_standard_registry(&config).unwrap();
    assert_eq!(plugin.available_filters(), vec!["consumed", "zlib.*"]);
    assert_eq!(
        say(&plugin, "!filter consumed as is"),
        reply("\x02consumed\x02: as is")
    );
}

/// A registry with extra filters only exposes the ones the whitelist admits
#[test]
fn test_custom_registry_behind_whitelist() {
    let mut registry = StandardRegistry::empty();
    registry
        .register(
            "text.reverse",
            |_: &str, input: &[u8]| -> Result<Vec<u8>, TransformError> {
                Ok(input.iter().rev().copied().collect())
            },
        )
        .register(
            "text.shout",
            |_: &str, input: &[u8]| -> Result<Vec<u8>, TransformError> {
                Ok(input.to_ascii_uppercase())
            },
        );

    let config = Config {
        filter: FilterConfig {
            whitelist: "text.rev*".into(),
            ..FilterConfig::default()
        },
        ..Config::default()
    };
    let plugin = FilterPlugin::new(Arc::new(registry), &config).unwrap();

    assert_eq!(plugin.available_filters(), vec!["text.reverse"]);
    assert_eq!(
        say(&plugin, "!filter text.reverse abc"),
        reply("\x02text.reverse\x02: cba")
    );
    assert_eq!(
        say(&plugin, "!filter text.shout abc"),
        reply("No such filter \"text.shout\" or filter blocked.")
    );
}

#[test]
fn test_usage_lists_available_filters() {
    assert_eq!(
        say(&plugin(), "!filter"),
        reply(
            "Usage: \x02!filter <filter> <text>\x02. Available filters: convert.*, \
             string.rot13, string.strip_tags, string.tolower, string.toupper."
        )
    );
}
