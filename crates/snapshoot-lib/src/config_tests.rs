use std::collections::HashMap;

use crate::Error;
use crate::config::{Config, DEFAULT_MATCHER, UpdateMode};
use crate::serialize::DEFAULT_RECURSION_LIMIT;

fn from_vars(vars: &[(&str, &str)]) -> crate::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_vars(|name| vars.get(name).cloned())
}

#[test]
fn defaults() {
    let config = Config::default();

    assert_eq!(config.get_matcher(), DEFAULT_MATCHER);
    assert_eq!(config.get_update_mode(), UpdateMode::Write);
    assert_eq!(config.recursion_limit, DEFAULT_RECURSION_LIMIT);
    insta::assert_snapshot!(format!("{config:?}"), @r#"Config { matcher: "match_snapshot", lang: "ruby", indent: "  ", update_mode: Write, recursion_limit: 1024 }"#);
}

#[test]
fn builder_overrides() {
    let config = Config::new()
        .matcher("assert_inline")
        .indent("\t")
        .update_mode(UpdateMode::Preview)
        .recursion_limit(8);

    assert_eq!(config.get_matcher(), "assert_inline");
    assert_eq!(config.indent, "\t");
    assert_eq!(config.get_update_mode(), UpdateMode::Preview);
    assert_eq!(config.recursion_limit, 8);
}

#[test]
fn update_mode_aliases() {
    for (text, mode) in [
        ("1", UpdateMode::Write),
        ("yes", UpdateMode::Write),
        ("TRUE", UpdateMode::Write),
        ("dry-run", UpdateMode::Preview),
        (" preview ", UpdateMode::Preview),
        ("0", UpdateMode::Never),
        ("no", UpdateMode::Never),
        ("false", UpdateMode::Never),
    ] {
        assert_eq!(text.parse::<UpdateMode>().unwrap(), mode, "{text:?}");
    }
}

#[test]
fn update_mode_rejects_garbage() {
    let err = "sometimes".parse::<UpdateMode>().unwrap_err();

    insta::assert_snapshot!(err, @"invalid configuration: SNAPSHOOT_UPDATE must be write, preview or no, got `sometimes`");
}

#[test]
fn environment_overrides() {
    let config = from_vars(&[
        ("SNAPSHOOT_UPDATE", "no"),
        ("SNAPSHOOT_MATCHER", " assert_inline "),
    ])
    .unwrap();

    assert_eq!(config.get_update_mode(), UpdateMode::Never);
    assert_eq!(config.get_matcher(), "assert_inline");
}

#[test]
fn empty_environment_keeps_defaults() {
    let config = from_vars(&[("SNAPSHOOT_MATCHER", "")]).unwrap();

    assert_eq!(config.get_matcher(), DEFAULT_MATCHER);
    assert_eq!(config.get_update_mode(), UpdateMode::Write);
}

#[test]
fn invalid_environment() {
    let err = from_vars(&[("SNAPSHOOT_UPDATE", "maybe")]).unwrap_err();

    assert!(matches!(err, Error::InvalidConfig(_)));
}
