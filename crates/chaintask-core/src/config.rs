use std::fs;
use std::path::Path;

use anyhow::{
  Context,
  anyhow,
  bail
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::identity::ContractAddress;

const ENV_PREFIX: &str = "CHAINTASK_";

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
  pub contract: ContractConfig,
  pub session:  SessionConfig,
  pub log:      LogConfig
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct ContractConfig {
  pub address: ContractAddress
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
  /// Adopt an already-authorized
  /// account at start-up.
  pub restore: bool
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self { restore: true }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
  /// `EnvFilter` directive used when
  /// neither `RUST_LOG` nor verbosity
  /// flags say otherwise.
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub filter: Option<String>
}

impl ClientConfig {
  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    toml::from_str(text).context(
      "failed to parse client config"
    )
  }

  #[tracing::instrument]
  pub fn load(
    path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = path else {
      debug!(
        "no config file given; using \
         defaults"
      );
      return Ok(Self::default());
    };

    if !path.exists() {
      warn!(config = %path.display(), "config file not found; using defaults");
      return Ok(Self::default());
    }

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    Self::from_toml_str(&text)
      .with_context(|| {
        format!(
          "invalid config in {}",
          path.display()
        )
      })
  }

  /// Applies `key=value` overrides on
  /// top of the loaded file.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("chaintask.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      match key.as_str() {
        | "contract.address" => {
          self.contract.address =
            ContractAddress::parse(&v)?;
        }
        | "session.restore" => {
          self.session.restore =
            parse_bool(&v).ok_or_else(
              || {
                anyhow!(
                  "expected a boolean \
                   for {key}, got {v:?}"
                )
              }
            )?;
        }
        | "log.filter" => {
          self.log.filter =
            (!v.trim().is_empty())
              .then(|| {
                v.trim().to_string()
              });
        }
        | _ => {
          bail!(
            "unknown config key: {key}"
          )
        }
      }
    }
    Ok(())
  }

  pub fn to_toml_string(
    &self
  ) -> anyhow::Result<String> {
    toml::to_string(self).context(
      "failed to render client config"
    )
  }
}

/// Maps `CHAINTASK_CONTRACT_ADDRESS`
/// style variables to override keys.
pub fn env_overrides<I>(
  vars: I
) -> Vec<(String, String)>
where
  I: IntoIterator<
    Item = (String, String)
  >
{
  vars
    .into_iter()
    .filter_map(|(name, value)| {
      let rest =
        name.strip_prefix(ENV_PREFIX)?;
      let key = match rest {
        | "CONTRACT_ADDRESS" => {
          "contract.address"
        }
        | "SESSION_RESTORE" => {
          "session.restore"
        }
        | "LOG_FILTER" => "log.filter",
        | _ => return None
      };
      Some((key.to_string(), value))
    })
    .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "true" | "yes" | "on" => {
      Some(true)
    }
    | "0" | "false" | "no" | "off" => {
      Some(false)
    }
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  const OTHER: &str =
    "0x00000000000000000000000000000000000000aa";

  #[test]
  fn defaults_point_at_deployed_contract()
  {
    let cfg = ClientConfig::default();
    assert_eq!(
      cfg.contract.address.as_str(),
      chaintask_shared::DEFAULT_CONTRACT_ADDRESS
    );
    assert!(cfg.session.restore);
    assert_eq!(cfg.log.filter, None);
  }

  #[test]
  fn partial_file_keeps_other_defaults()
  {
    let cfg = ClientConfig::from_toml_str(
      "[session]\nrestore = false\n"
    )
    .expect("parse");
    assert!(!cfg.session.restore);
    assert_eq!(
      cfg.contract.address,
      ContractAddress::default()
    );
  }

  #[test]
  fn bad_address_is_rejected() {
    let err = ClientConfig::from_toml_str(
      "[contract]\naddress = \"0x12\"\n"
    )
    .expect_err("invalid address");
    assert!(
      format!("{err:#}")
        .contains("invalid contract")
    );
  }

  #[test]
  fn unknown_sections_are_rejected() {
    assert!(
      ClientConfig::from_toml_str(
        "[gas]\nlimit = 1\n"
      )
      .is_err()
    );
  }

  #[test]
  fn load_reads_file_and_overrides_win()
  {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      "[contract]\naddress = \
       \"{OTHER}\"\n[log]\nfilter = \
       \"debug\""
    )
    .expect("write config");

    let mut cfg = ClientConfig::load(
      Some(file.path())
    )
    .expect("load");
    assert_eq!(
      cfg.contract.address.as_str(),
      OTHER
    );
    assert_eq!(
      cfg.log.filter.as_deref(),
      Some("debug")
    );

    cfg
      .apply_overrides(vec![
        (
          "chaintask.session.restore"
            .to_string(),
          "off".to_string()
        ),
        (
          "log.filter".to_string(),
          " ".to_string()
        ),
      ])
      .expect("overrides");
    assert!(!cfg.session.restore);
    assert_eq!(cfg.log.filter, None);
  }

  #[test]
  fn missing_file_falls_back_to_defaults()
  {
    let dir =
      tempfile::tempdir().expect("dir");
    let cfg = ClientConfig::load(Some(
      &dir.path().join("absent.toml")
    ))
    .expect("load");
    assert_eq!(
      cfg,
      ClientConfig::default()
    );
  }

  #[test]
  fn invalid_overrides_fail() {
    let mut cfg = ClientConfig::default();
    assert!(
      cfg
        .apply_overrides(vec![(
          "session.restore".to_string(),
          "maybe".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "gas.limit".to_string(),
          "1".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn env_overrides_map_known_variables()
  {
    let vars = vec![
      (
        "CHAINTASK_CONTRACT_ADDRESS"
          .to_string(),
        OTHER.to_string()
      ),
      (
        "CHAINTASK_UNKNOWN".to_string(),
        "x".to_string()
      ),
      (
        "HOME".to_string(),
        "/root".to_string()
      ),
    ];
    assert_eq!(
      env_overrides(vars),
      vec![(
        "contract.address".to_string(),
        OTHER.to_string()
      )]
    );
  }

  #[test]
  fn config_renders_back_to_toml() {
    let text = ClientConfig::default()
      .to_toml_string()
      .expect("render");
    let parsed =
      ClientConfig::from_toml_str(&text)
        .expect("reparse");
    assert_eq!(
      parsed,
      ClientConfig::default()
    );
  }
}
