use std::str::FromStr;

use crate::error::ConfigError;

/// Read an environment variable, treating unset and empty as `None`.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "not valid UTF-8".to_string(),
        }),
    }
}

/// Parse an environment variable, falling back to `default` when unset.
pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|v| v.unwrap_or(default))
}

/// Parse a boolean environment variable.
pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    optional_env(key)?
        .map(|s| s.parse())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be 'true' or 'false': {e}"),
        })
        .map(|v| v.unwrap_or(default))
}

/// Serializes env-mutating tests across config modules.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_blank_is_none() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        // SAFETY: Under ENV_MUTEX.
        unsafe {
            std::env::set_var("DOCKWAIT_TEST_BLANK", "   ");
        }
        assert_eq!(optional_env("DOCKWAIT_TEST_BLANK").unwrap(), None);
        // SAFETY: Under ENV_MUTEX.
        unsafe {
            std::env::remove_var("DOCKWAIT_TEST_BLANK");
        }
        assert_eq!(optional_env("DOCKWAIT_TEST_BLANK").unwrap(), None);
    }

    #[test]
    fn test_parse_optional_env_reports_key() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        // SAFETY: Under ENV_MUTEX.
        unsafe {
            std::env::set_var("DOCKWAIT_TEST_NUM", "ten");
        }
        let err = parse_optional_env::<u64>("DOCKWAIT_TEST_NUM", 1).unwrap_err();
        assert!(err.to_string().contains("DOCKWAIT_TEST_NUM"));
        // SAFETY: Under ENV_MUTEX.
        unsafe {
            std::env::remove_var("DOCKWAIT_TEST_NUM");
        }
        assert_eq!(parse_optional_env::<u64>("DOCKWAIT_TEST_NUM", 1).unwrap(), 1);
    }
}
