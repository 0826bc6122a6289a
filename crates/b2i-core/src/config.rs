use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use b2i_shared::postgrest::ClientConfig;
use tracing::{
  debug,
  info,
  trace
};

pub const CONFIG_ENV_VAR: &str =
  "B2I_CONFIG";
pub const URL_ENV_VAR: &str =
  "B2I_SUPABASE_URL";
pub const ANON_KEY_ENV_VAR: &str =
  "B2I_SUPABASE_ANON_KEY";

pub const DEFAULT_CHECKIN_RECENT: usize =
  4;
pub const DEFAULT_METRICS_WEEKS: usize =
  12;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub enum StorageMode {
  Remote,
  Local
}

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("data.location", "~/.b2i"),
      ("storage.mode", "remote"),
      ("color", "on"),
      ("checkin.recent", "4"),
      ("metrics.weeks", "12")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let path = resolve_config_path(
      config_override
    )?;
    if let Some(path) = path {
      info!(config = %path.display(), "loading config");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no config file found; using \
         defaults"
      );
    }

    cfg.fill_from_env(
      "remote.url",
      std::env::var(URL_ENV_VAR).ok()
    );
    cfg.fill_from_env(
      "remote.anon_key",
      std::env::var(ANON_KEY_ENV_VAR).ok()
    );

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn set(
    &mut self,
    key: &str,
    value: impl Into<String>
  ) {
    self
      .map
      .insert(key.to_string(), value.into());
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self
      .map
      .get(key)
      .filter(|v| !v.trim().is_empty())
      .cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_usize(
    &self,
    key: &str
  ) -> anyhow::Result<Option<usize>> {
    self
      .get(key)
      .map(|raw| {
        raw.trim().parse::<usize>().map_err(
          |_| {
            anyhow!(
              "config key {key} must be a \
               non-negative integer, got \
               {raw:?}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  pub fn storage_mode(
    &self
  ) -> anyhow::Result<StorageMode> {
    match self
      .get("storage.mode")
      .unwrap_or_else(|| {
        "remote".to_string()
      })
      .to_ascii_lowercase()
      .as_str()
    {
      | "remote" | "supabase" => {
        Ok(StorageMode::Remote)
      }
      | "local" | "offline" => {
        Ok(StorageMode::Local)
      }
      | other => {
        Err(anyhow!(
          "invalid storage.mode: {other} \
           (expected remote or local)"
        ))
      }
    }
  }

  /// Connection settings for the hosted
  /// store, or an error naming what is
  /// missing.
  pub fn client_config(
    &self
  ) -> anyhow::Result<ClientConfig> {
    let url =
      self.get("remote.url").ok_or_else(
        || {
          anyhow!(
            "remote.url is not set (config \
             file, --rc remote.url=... or \
             ${URL_ENV_VAR})"
          )
        }
      )?;
    let anon_key = self
      .get("remote.anon_key")
      .ok_or_else(|| {
        anyhow!(
          "remote.anon_key is not set \
           (config file, --rc \
           remote.anon_key=... or \
           ${ANON_KEY_ENV_VAR})"
        )
      })?;
    Ok(ClientConfig::new(url, anon_key))
  }

  pub fn checkin_recent(
    &self
  ) -> anyhow::Result<usize> {
    Ok(
      self
        .get_usize("checkin.recent")?
        .unwrap_or(DEFAULT_CHECKIN_RECENT)
    )
  }

  pub fn metrics_weeks(
    &self
  ) -> anyhow::Result<usize> {
    Ok(
      self
        .get_usize("metrics.weeks")?
        .unwrap_or(DEFAULT_METRICS_WEEKS)
    )
  }

  fn fill_from_env(
    &mut self,
    key: &str,
    value: Option<String>
  ) {
    if self.get(key).is_some() {
      return;
    }
    if let Some(value) = value
      .filter(|v| !v.trim().is_empty())
    {
      debug!(key, "filled from environment");
      self.map.insert(key.to_string(), value);
    }
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self.load_toml(&text).with_context(
      || {
        format!(
          "failed to parse {}",
          path.display()
        )
      }
    )?;
    self.loaded_files.push(path);
    Ok(())
  }

  /// Flattens a TOML document into dotted
  /// keys: `[remote] url = ".."` becomes
  /// `remote.url`.
  pub fn load_toml(
    &mut self,
    text: &str
  ) -> anyhow::Result<()> {
    let table: toml::Table =
      toml::from_str(text)?;
    let mut flat = Vec::new();
    flatten_table("", &table, &mut flat);
    for (key, value) in flat {
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }
    Ok(())
  }
}

fn flatten_table(
  prefix: &str,
  table: &toml::Table,
  out: &mut Vec<(String, String)>
) {
  for (key, value) in table {
    let full = if prefix.is_empty() {
      key.clone()
    } else {
      format!("{prefix}.{key}")
    };
    match value {
      | toml::Value::Table(inner) => {
        flatten_table(&full, inner, out)
      }
      | toml::Value::String(text) => {
        out.push((full, text.clone()))
      }
      | toml::Value::Array(items) => {
        let joined = items
          .iter()
          .map(|item| match item {
            | toml::Value::String(text) => {
              text.clone()
            }
            | other => other.to_string()
          })
          .collect::<Vec<_>>()
          .join(",");
        out.push((full, joined))
      }
      | other => {
        out.push((full, other.to_string()))
      }
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    if path == Path::new("/dev/null") {
      return Ok(None);
    }
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if env_path == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      env_path
    )));
  }

  if let Some(dir) = dirs::config_dir() {
    let candidate =
      dir.join("b2i").join("config.toml");
    if candidate.exists() {
      return Ok(Some(candidate));
    }
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".b2i"))
}

pub fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn toml_flattens_into_dotted_keys() {
    let mut cfg = Config::default();
    cfg
      .load_toml(
        r#"
color = false

[remote]
url = "https://demo.supabase.co"
anon_key = "anon"

[checkin]
recent = 6
"#
      )
      .expect("valid toml");

    assert_eq!(
      cfg.get("remote.url").as_deref(),
      Some("https://demo.supabase.co")
    );
    assert_eq!(cfg.get_bool("color"), Some(false));
    assert_eq!(
      cfg.checkin_recent().expect("usize"),
      6
    );
    assert_eq!(
      cfg.metrics_weeks().expect("usize"),
      12
    );
    let client =
      cfg.client_config().expect("client config");
    assert_eq!(client.anon_key, "anon");
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "rc.storage.mode".to_string(),
        "local".to_string()
      ),
      (
        "metrics.weeks".to_string(),
        "8".to_string()
      )
    ]);
    assert_eq!(
      cfg.storage_mode().expect("mode"),
      StorageMode::Local
    );
    assert_eq!(
      cfg.metrics_weeks().expect("usize"),
      8
    );
  }

  #[test]
  fn bad_values_are_reported() {
    let mut cfg = Config::default();
    cfg.set("storage.mode", "cloud");
    cfg.set("checkin.recent", "many");
    assert!(cfg.storage_mode().is_err());
    assert!(cfg.checkin_recent().is_err());
    assert!(cfg.client_config().is_err());
  }

  #[test]
  fn env_fills_only_missing_keys() {
    let mut cfg = Config::default();
    cfg.set("remote.url", "https://file");
    cfg.fill_from_env(
      "remote.url",
      Some("https://env".to_string())
    );
    cfg.fill_from_env(
      "remote.anon_key",
      Some("env-key".to_string())
    );
    assert_eq!(
      cfg.get("remote.url").as_deref(),
      Some("https://file")
    );
    assert_eq!(
      cfg.get("remote.anon_key").as_deref(),
      Some("env-key")
    );
  }
}
