#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Branch,
    Branches,
    ChatHead,
    ConfigFile,
    NotificationTimeout,
    RateLimiting,
    RequestsRemainingInterval,
    SessionID,
    Url,
}

impl ConfigKey {
    /// Keys only ever set for a single run, never persisted to the config file.
    pub fn is_runtime(&self) -> bool {
        return matches!(
            self,
            ConfigKey::Branch | ConfigKey::SessionID | ConfigKey::ConfigFile
        );
    }

    pub fn env_var(&self) -> String {
        return format!("MAESER_{}", self.to_string().replace('-', "_").to_uppercase());
    }
}

fn default_config_path() -> path::PathBuf {
    #[cfg(not(target_os = "macos"))]
    let config_dir = dirs::config_dir();
    #[cfg(target_os = "macos")]
    let config_dir = dirs::home_dir().map(|home| return home.join(".config"));

    return config_dir
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("maeser/config.toml");
}

fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
    let arg = cmd.get_arguments().find(|arg| {
        return arg.get_long() == Some(key.to_string().as_str());
    });

    if let Some(arg) = arg {
        return arg
            .get_possible_values()
            .iter()
            .map(|value| return value.get_name().to_string())
            .collect();
    }

    return vec![];
}

fn toml_value(key: ConfigKey, val: &toml_edit::Item) -> Option<String> {
    if let Some(val_int) = val.as_integer() {
        return Some(val_int.to_string());
    }
    if let Some(val_bool) = val.as_bool() {
        return Some(val_bool.to_string());
    }
    if let Some(val_str) = val.as_str() {
        return Some(val_str.to_string());
    }
    if let Some(val_arr) = val.as_array() {
        let entries = val_arr
            .iter()
            .filter_map(|entry| return entry.as_str())
            .collect::<Vec<&str>>();
        return Some(entries.join(","));
    }

    tracing::warn!(key = %key, "Ignoring config value of unsupported type");
    return None;
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return Config::get(key) == "true";
    }

    pub fn get_millis(key: ConfigKey) -> Result<Duration> {
        let val = Config::get(key);
        let millis = val
            .parse::<u64>()
            .with_context(|| return format!("'{key}' must be a number of milliseconds, got '{val}'"))?;

        return Ok(Duration::from_millis(millis));
    }

    /// Topics offered for selection, in configured order.
    pub fn branches() -> Vec<String> {
        return Config::get(ConfigKey::Branches)
            .split(',')
            .map(|branch| return branch.trim().to_string())
            .filter(|branch| return !branch.is_empty())
            .collect();
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = default_config_path();

        let res = match key {
            ConfigKey::Branches => "homework,labs",
            ConfigKey::ChatHead => "Maeser",
            ConfigKey::NotificationTimeout => "5000",
            ConfigKey::RateLimiting => "false",
            ConfigKey::RequestsRemainingInterval => "5000",
            ConfigKey::Url => "http://localhost:3002",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
            ConfigKey::Branch => "",
            ConfigKey::SessionID => "",
        };

        return res.to_string();
    }

    /// Merges defaults, the config file and command line arguments, in that
    /// order of precedence.
    pub async fn resolve(
        cmd: &Command,
        clap_arg_matches: &[&ArgMatches],
    ) -> Result<HashMap<ConfigKey, String>> {
        let mut values = ConfigKey::iter()
            .map(|key| return (key, Config::default(key)))
            .collect::<HashMap<ConfigKey, String>>();

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            let doc = toml_str
                .parse::<toml_edit::Document>()
                .with_context(|| return format!("Failed to parse {config_file}"))?;

            for key in ConfigKey::iter().filter(|key| return !key.is_runtime()) {
                let val = match doc.get(&key.to_string()).and_then(|val| return toml_value(key, val)) {
                    Some(val) => val,
                    None => continue,
                };
                if val.is_empty() {
                    continue;
                }

                // Use clap value parsers to do validation.
                let possible_values = possible_values(cmd, key);
                if !possible_values.is_empty() && !possible_values.contains(&val) {
                    bail!(format!(
                        "config.toml has an invalid value for key '{key}': {val}\nPossible values are: {}",
                        possible_values.join(", ")
                    ));
                }

                values.insert(key, val);
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    values.insert(key, val.to_string());
                }
            }
        }

        return Ok(values);
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        let values = Config::resolve(&cmd, &clap_arg_matches).await?;
        for (key, val) in values.iter() {
            Config::set(*key, val);
        }

        tracing::debug!(
            url = Config::get(ConfigKey::Url),
            branches = Config::get(ConfigKey::Branches),
            rate_limiting = Config::get(ConfigKey::RateLimiting),
            session_id = Config::get(ConfigKey::SessionID),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter(|key| return !key.is_runtime())
            .map(|key| {
                let description = cmd
                    .get_arguments()
                    .find(|arg| return arg.get_long() == Some(key.to_string().as_str()))
                    .and_then(|arg| return arg.get_help())
                    .map(|help| {
                        return help
                            .to_string()
                            .split("[default:")
                            .next()
                            .unwrap_or_default()
                            .trim()
                            .to_string();
                    })
                    .unwrap_or_default();

                let mut description = description;
                let possible_values = possible_values(&cmd, key);
                if !possible_values.is_empty() {
                    description =
                        format!("{description} [possible values: {}]", possible_values.join(", "));
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<bool>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return format!("# {description}\n{val}");
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
