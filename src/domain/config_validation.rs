//! Configuration validation.
//!
//! Every key is optional; the checks below apply only to keys that are present.

use crate::domain::error::VolError;
use crate::domain::estimator::ewma::{Lambda, DEFAULT_LAMBDA};
use crate::domain::window::{WindowSpec, MIN_OBSERVATIONS};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), VolError> {
    validate_delimiter(config)?;
    validate_column_names(config)?;
    validate_lambda(config)?;
    validate_garch(config)?;
    validate_min_observations(config)?;
    validate_windows(config)?;
    Ok(())
}

/// Accepts a single ASCII character or one of `comma`, `semicolon`, `tab`,
/// `pipe`, or the escape `\t`.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "comma" => Some(b','),
        "semicolon" => Some(b';'),
        "tab" | "\\t" => Some(b'\t'),
        "pipe" => Some(b'|'),
        _ => {
            let raw = if value.trim().is_empty() { value } else { value.trim() };
            match raw.as_bytes() {
                [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Some(*b),
                _ => None,
            }
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> VolError {
    VolError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_delimiter(config: &dyn ConfigPort) -> Result<(), VolError> {
    match config.get_string("input", "delimiter") {
        Some(value) if parse_delimiter(&value).is_none() => Err(invalid(
            "input",
            "delimiter",
            format!(
                "'{}' is not a single character or one of comma, semicolon, tab, pipe",
                value
            ),
        )),
        _ => Ok(()),
    }
}

fn validate_column_names(config: &dyn ConfigPort) -> Result<(), VolError> {
    for key in ["date_column", "price_column"] {
        if config
            .get_string("input", key)
            .is_some_and(|value| value.trim().is_empty())
        {
            return Err(invalid("input", key, "column name must not be empty"));
        }
    }
    Ok(())
}

fn validate_lambda(config: &dyn ConfigPort) -> Result<(), VolError> {
    let value = config.get_double("estimator", "lambda", DEFAULT_LAMBDA)?;
    Lambda::new(value).map_err(|e| invalid("estimator", "lambda", e.to_string()))?;
    Ok(())
}

fn validate_garch(config: &dyn ConfigPort) -> Result<(), VolError> {
    config.get_bool("estimator", "garch", true).map(|_| ())
}

fn validate_min_observations(config: &dyn ConfigPort) -> Result<(), VolError> {
    let n = config.get_int("estimator", "min_observations", MIN_OBSERVATIONS as i64)?;
    if n < 2 {
        return Err(invalid(
            "estimator",
            "min_observations",
            "min_observations must be at least 2",
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), VolError> {
    match config.get_string("estimator", "windows") {
        Some(list) => WindowSpec::parse(&list)
            .map(|_| ())
            .map_err(|e| invalid("estimator", "windows", e.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid_key(result: Result<(), VolError>, expected_key: &str) {
        match result {
            Err(VolError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(validate_config(&FileConfigAdapter::empty()).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let c = config(
            "[input]\npath = p.csv\ndelimiter = tab\nprice_column = Adj Close\n\
             [estimator]\nlambda = 0.97\ngarch = no\nmin_observations = 20\nwindows = 0.5:126, 1:252\n",
        );
        assert!(validate_config(&c).is_ok());
    }

    #[test]
    fn lambda_out_of_range() {
        assert_invalid_key(validate_config(&config("[estimator]\nlambda = 0.5\n")), "lambda");
        assert_invalid_key(validate_config(&config("[estimator]\nlambda = 1.0\n")), "lambda");
    }

    #[test]
    fn lambda_not_a_number() {
        assert_invalid_key(validate_config(&config("[estimator]\nlambda = high\n")), "lambda");
    }

    #[test]
    fn lambda_bounds_are_inclusive() {
        assert!(validate_config(&config("[estimator]\nlambda = 0.80\n")).is_ok());
        assert!(validate_config(&config("[estimator]\nlambda = 0.99\n")).is_ok());
    }

    #[test]
    fn garch_must_be_boolean() {
        assert_invalid_key(validate_config(&config("[estimator]\ngarch = maybe\n")), "garch");
    }

    #[test]
    fn min_observations_floor() {
        assert_invalid_key(
            validate_config(&config("[estimator]\nmin_observations = 1\n")),
            "min_observations",
        );
        assert_invalid_key(
            validate_config(&config("[estimator]\nmin_observations = many\n")),
            "min_observations",
        );
    }

    #[test]
    fn windows_must_parse_and_ascend() {
        assert_invalid_key(
            validate_config(&config("[estimator]\nwindows = 2:504, 1:252\n")),
            "windows",
        );
        assert_invalid_key(
            validate_config(&config("[estimator]\nwindows = one year\n")),
            "windows",
        );
    }

    #[test]
    fn delimiter_must_be_one_character() {
        assert_invalid_key(validate_config(&config("[input]\ndelimiter = ,,\n")), "delimiter");
    }

    #[test]
    fn blank_column_name_rejected() {
        assert_invalid_key(
            validate_config(&config("[input]\nprice_column =\n")),
            "price_column",
        );
    }

    #[test]
    fn delimiter_names_and_characters() {
        assert_eq!(parse_delimiter(","), Some(b','));
        assert_eq!(parse_delimiter("|"), Some(b'|'));
        assert_eq!(parse_delimiter("semicolon"), Some(b';'));
        assert_eq!(parse_delimiter("TAB"), Some(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Some(b'\t'));
        assert_eq!(parse_delimiter("\t"), Some(b'\t'));
        assert_eq!(parse_delimiter("ab"), None);
        assert_eq!(parse_delimiter("\""), None);
        assert_eq!(parse_delimiter(""), None);
    }
}
