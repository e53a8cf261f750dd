//! Process-level settings.
//!
//! Built once in `app::run()` and passed down explicitly; nothing below the app
//! layer reads the environment.

use std::path::PathBuf;

use crate::error::{AppError, EXIT_INPUT};

/// Environment-derived defaults (an optional `.env` file is honored).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// `LAPFIT_CSV`: lap table used by `fit` when `--csv` is omitted.
    pub default_csv: Option<PathBuf>,
    /// `LAPFIT_FEATURES`: comma-separated feature list used when `--features` is omitted.
    pub default_features: Option<Vec<String>>,
    /// `LAPFIT_DRIVER`: driver filter used when `--driver` is omitted.
    pub default_driver: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            default_csv: non_empty("LAPFIT_CSV").map(PathBuf::from),
            default_features: non_empty("LAPFIT_FEATURES").map(|v| split_list(&v)),
            default_driver: non_empty("LAPFIT_DRIVER"),
        }
    }

    /// Resolve the CSV path for `fit`: CLI flag first, then `LAPFIT_CSV`.
    pub fn resolve_csv(&self, cli: Option<PathBuf>) -> Result<PathBuf, AppError> {
        cli.or_else(|| self.default_csv.clone()).ok_or_else(|| {
            AppError::new(
                EXIT_INPUT,
                "No lap table given: pass `--csv <PATH>` or set LAPFIT_CSV.",
            )
        })
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_defaults_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("LAPFIT_CSV", "laps/monza.csv"),
            ("LAPFIT_FEATURES", "TyreLife, LapNumber,,"),
            ("LAPFIT_DRIVER", "  "),
        ]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.default_csv, Some(PathBuf::from("laps/monza.csv")));
        assert_eq!(
            settings.default_features,
            Some(vec!["TyreLife".to_string(), "LapNumber".to_string()])
        );
        assert_eq!(settings.default_driver, None);
    }

    #[test]
    fn cli_path_wins_over_default() {
        let settings = Settings {
            default_csv: Some(PathBuf::from("env.csv")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_csv(Some(PathBuf::from("cli.csv"))).unwrap(),
            PathBuf::from("cli.csv")
        );
        assert_eq!(settings.resolve_csv(None).unwrap(), PathBuf::from("env.csv"));
        assert_eq!(Settings::default().resolve_csv(None).unwrap_err().exit_code(), EXIT_INPUT);
    }
}
