//! Environment variable interpolation.
//!
//! Runs over the parsed YAML tree before typed deserialization. Scalars
//! tagged `!ENV`, and plain strings that contain a reference, have every
//! `${NAME}` replaced with the value of `NAME`.
//!
//! ```yaml
//! tabs:
//!   api:
//!     root: !ENV ${HOME}/src/api
//!     panes:
//!       - position: 1/1
//!         commands: ["ssh ${DEPLOY_HOST}"]
//! ```
//!
//! # Example
//!
//! ```
//! use termis::interpolate::interpolate;
//!
//! let lookup = |name: &str| (name == "USER").then(|| "ada".to_string());
//! assert_eq!(interpolate("/home/${USER}/src", &lookup).unwrap(), "/home/ada/src");
//! assert!(interpolate("${NOPE}", &lookup).is_err());
//! ```

use crate::error::{Result, TermisError};
use regex::{Captures, Regex};
use serde_yaml_ng::Value;
use serde_yaml_ng::value::{Tag, TaggedValue};
use std::sync::LazyLock;

/// Tag marking a scalar for substitution.
pub const ENV_TAG: &str = "ENV";

static ENV_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").expect("env reference pattern is valid"));

/// Check a YAML tag against a bare name (`!ENV` matches `"ENV"`).
pub fn tag_is(tag: &Tag, name: &str) -> bool {
    tag.to_string().trim_start_matches('!') == name
}

/// Look a variable up in the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Replace every `${NAME}` in `text` using `lookup`.
///
/// # Errors
///
/// Returns [`TermisError::MissingEnvironmentVariable`] naming the first
/// variable `lookup` cannot resolve.
pub fn interpolate<F>(text: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing: Option<String> = None;
    let replaced = ENV_REF.replace_all(text, |caps: &Captures| match lookup(&caps[1]) {
        Some(value) => value,
        None => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });

    match missing {
        Some(name) => Err(TermisError::MissingEnvironmentVariable(name)),
        None => Ok(replaced.into_owned()),
    }
}

/// Interpolate environment references throughout a YAML tree.
///
/// `!ENV` tags are consumed; other tags are kept and their contents visited.
/// Mapping keys are left untouched.
pub fn interpolate_value<F>(value: Value, lookup: &F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) if ENV_REF.is_match(&s) => Ok(Value::String(interpolate(&s, lookup)?)),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| interpolate_value(item, lookup))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = serde_yaml_ng::Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k, interpolate_value(v, lookup)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            if tag_is(&tag, ENV_TAG) {
                return match value {
                    Value::String(s) => Ok(Value::String(interpolate(&s, lookup)?)),
                    other => Ok(other),
                };
            }
            let value = interpolate_value(value, lookup)?;
            Ok(Value::Tagged(Box::new(TaggedValue { tag, value })))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/Users/ada".into()),
            "HOST" => Some("db.internal".into()),
            _ => None,
        }
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate("${HOME}/src", &env).unwrap(), "/Users/ada/src");
        assert_eq!(
            interpolate("ssh ${HOST} -l ${HOST}", &env).unwrap(),
            "ssh db.internal -l db.internal"
        );
        assert_eq!(interpolate("no refs $HOME", &env).unwrap(), "no refs $HOME");
    }

    #[test]
    fn test_missing_variable() {
        match interpolate("${HOME}/${MISSING}/${ALSO_MISSING}", &env) {
            Err(TermisError::MissingEnvironmentVariable(name)) => assert_eq!(name, "MISSING"),
            other => panic!("expected MissingEnvironmentVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_interpolate_tree() {
        let doc: Value = serde_yaml_ng::from_str(
            r#"
tabs:
  api:
    root: !ENV ${HOME}/api
    panes:
      - position: 1/1
        commands: ["psql -h ${HOST}", "ls"]
        badge: !ENV plain
"#,
        )
        .unwrap();

        let out = interpolate_value(doc, &env).unwrap();
        let tab = &out["tabs"]["api"];
        assert_eq!(tab["root"].as_str(), Some("/Users/ada/api"));
        assert_eq!(tab["panes"][0]["commands"][0].as_str(), Some("psql -h db.internal"));
        assert_eq!(tab["panes"][0]["commands"][1].as_str(), Some("ls"));
        assert_eq!(tab["panes"][0]["badge"].as_str(), Some("plain"));
    }

    #[test]
    fn test_tree_fails_on_missing_variable() {
        let doc: Value = serde_yaml_ng::from_str("root: !ENV ${NOT_SET}/x").unwrap();
        assert!(matches!(
            interpolate_value(doc, &env),
            Err(TermisError::MissingEnvironmentVariable(name)) if name == "NOT_SET"
        ));
    }
}
