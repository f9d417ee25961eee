//! Optional INI defaults for the CLI.
//!
//! ```ini
//! [scheduler]
//! opt_in = true
//! action = stop
//! region = eu-west-1
//! role_arn = arn:aws:iam::123456789012:role/instance-scheduler
//! session_name = nightly-stop
//! dry_run = false
//! schedule_tag = Schedule
//! max_attempts = 3
//! ```

use configparser::ini::Ini;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::scheduler::RunOptions;

const SECTION: &str = "scheduler";

/// Values read from the config file. Unset keys stay `None` so CLI flags and
/// built-in defaults can fill them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub opt_in: Option<bool>,
    pub action: Option<String>,
    pub region: Option<String>,
    pub role_arn: Option<String>,
    pub session_name: Option<String>,
    pub dry_run: Option<bool>,
    pub schedule_tag: Option<String>,
    pub max_attempts: Option<u32>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("ec2-scheduler").join("config.ini"))
}

impl FileConfig {
    /// Load `explicit` if given (it must exist), otherwise the default path
    /// if it exists, otherwise an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| SchedulerError::config(&display, e))?;
        debug!(path = %display, "Loaded config file");

        let get_bool = |key: &str| {
            ini.getbool(SECTION, key)
                .map_err(|e| SchedulerError::config(&display, format!("{key}: {e}")))
        };
        let get_string = |key: &str| ini.get(SECTION, key).filter(|v| !v.is_empty());

        let max_attempts = get_string("max_attempts")
            .map(|raw| {
                raw.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        SchedulerError::config(
                            &display,
                            format!("max_attempts: expected a positive integer, got {raw:?}"),
                        )
                    })
            })
            .transpose()?;

        Ok(Self {
            opt_in: get_bool("opt_in")?,
            action: get_string("action"),
            region: get_string("region"),
            role_arn: get_string("role_arn"),
            session_name: get_string("session_name"),
            dry_run: get_bool("dry_run")?,
            schedule_tag: get_string("schedule_tag"),
            max_attempts,
        })
    }

    /// File values layered over the built-in defaults.
    pub fn into_run_options(self) -> RunOptions {
        let defaults = RunOptions::default();
        RunOptions {
            opt_in: self.opt_in.unwrap_or(defaults.opt_in),
            action: self.action.unwrap_or(defaults.action),
            region: self.region.unwrap_or(defaults.region),
            role_arn: self.role_arn,
            session_name: self.session_name,
            dry_run: self.dry_run.unwrap_or(defaults.dry_run),
            schedule_tag: self.schedule_tag.unwrap_or(defaults.schedule_tag),
            max_attempts: self.max_attempts,
        }
    }
}
