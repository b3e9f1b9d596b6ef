use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{FileFields, get_path, set_path};

/// Snapshot of the variables this crate reads.
pub type EnvVars = HashMap<String, String>;

/// Variables consulted for fallbacks.
const KNOWN_VARS: [&str; 9] = [
    "FIREDRILL_MODEL_PROVIDER",
    "FIREDRILL_MODEL",
    "FIREDRILL_MODEL_API_KEY",
    "FIREDRILL_MODEL_API_URL",
    "CLOUDFLARE_ACCOUNT_ID",
    "CLOUDFLARE_API_TOKEN",
    "OPENAI_API_KEY",
    "FIREDRILL_LOG_LEVEL",
    "FIREDRILL_PORT",
];

/// Read the known variables from the process environment, dropping empty
/// ones.
#[must_use]
pub fn collect_env_vars() -> EnvVars {
    KNOWN_VARS
        .iter()
        .filter_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| ((*name).to_owned(), v))
        })
        .collect()
}

/// Fill fields no file set from the environment. Returns how many were
/// applied.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if `FIREDRILL_PORT` is not a
/// port number.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    file_fields: &FileFields,
    env: &EnvVars,
) -> ConfigResult<usize> {
    let mut applied = 0usize;
    let mut apply = |merged: &mut toml::Value, path: &str, var: &str, value: toml::Value| {
        if file_fields.contains(path) {
            return;
        }
        debug!(field = path, var, "config field set from environment");
        set_path(merged, path, value);
        applied = applied.saturating_add(1);
    };

    let string_vars = [
        ("model.provider", "FIREDRILL_MODEL_PROVIDER"),
        ("model.model", "FIREDRILL_MODEL"),
        ("model.api_url", "FIREDRILL_MODEL_API_URL"),
        ("model.account_id", "CLOUDFLARE_ACCOUNT_ID"),
        ("logging.level", "FIREDRILL_LOG_LEVEL"),
    ];
    for (path, var) in string_vars {
        if let Some(value) = env.get(var) {
            apply(merged, path, var, toml::Value::String(value.clone()));
        }
    }

    // The provider is settled by now, so pick the matching credential.
    let provider = get_path(merged, "model.provider")
        .and_then(toml::Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let key_var = ["FIREDRILL_MODEL_API_KEY"]
        .into_iter()
        .chain(match provider.as_str() {
            "workers-ai" => Some("CLOUDFLARE_API_TOKEN"),
            "openai-compat" => Some("OPENAI_API_KEY"),
            _ => None,
        })
        .find(|var| env.contains_key(*var));
    if let Some(var) = key_var
        && let Some(value) = env.get(var)
    {
        apply(merged, "model.api_key", var, toml::Value::String(value.clone()));
    }

    if let Some(raw) = env.get("FIREDRILL_PORT") {
        let port: u16 = raw.trim().parse().map_err(|_| ConfigError::ValidationError {
            field: "gateway.port".to_owned(),
            message: format!("FIREDRILL_PORT '{raw}' is not a port number"),
        })?;
        apply(merged, "gateway.port", "FIREDRILL_PORT", toml::Value::Integer(i64::from(port)));
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> toml::Value {
        toml::from_str(include_str!("defaults.toml")).unwrap()
    }

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn env_fills_unset_fields() {
        let mut merged = defaults();
        let vars = env(&[
            ("CLOUDFLARE_ACCOUNT_ID", "acct-1"),
            ("CLOUDFLARE_API_TOKEN", "cf-token"),
            ("FIREDRILL_PORT", "9999"),
        ]);

        let applied = apply_env_fallbacks(&mut merged, &FileFields::new(), &vars).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(get_path(&merged, "model.account_id").unwrap().as_str(), Some("acct-1"));
        assert_eq!(get_path(&merged, "model.api_key").unwrap().as_str(), Some("cf-token"));
        assert_eq!(get_path(&merged, "gateway.port").unwrap().as_integer(), Some(9999));
    }

    #[test]
    fn file_values_win() {
        let mut merged = defaults();
        let mut fields = FileFields::new();
        fields.insert("logging.level".to_owned());

        apply_env_fallbacks(&mut merged, &fields, &env(&[("FIREDRILL_LOG_LEVEL", "trace")]))
            .unwrap();

        assert_eq!(get_path(&merged, "logging.level").unwrap().as_str(), Some("info"));
    }

    #[test]
    fn credential_follows_provider() {
        let mut merged = defaults();
        let vars = env(&[
            ("FIREDRILL_MODEL_PROVIDER", "openai-compat"),
            ("CLOUDFLARE_API_TOKEN", "cf-token"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]);
        apply_env_fallbacks(&mut merged, &FileFields::new(), &vars).unwrap();
        assert_eq!(get_path(&merged, "model.api_key").unwrap().as_str(), Some("sk-openai"));
    }

    #[test]
    fn explicit_key_beats_provider_key() {
        let mut merged = defaults();
        let vars = env(&[
            ("FIREDRILL_MODEL_API_KEY", "explicit"),
            ("CLOUDFLARE_API_TOKEN", "cf-token"),
        ]);
        apply_env_fallbacks(&mut merged, &FileFields::new(), &vars).unwrap();
        assert_eq!(get_path(&merged, "model.api_key").unwrap().as_str(), Some("explicit"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut merged = defaults();
        let err = apply_env_fallbacks(
            &mut merged,
            &FileFields::new(),
            &env(&[("FIREDRILL_PORT", "eighty")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { field, .. } if field == "gateway.port"));
    }
}
