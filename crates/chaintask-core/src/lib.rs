pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod provider;
pub mod session;
pub mod sim;
pub mod sync;
pub mod task;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
#[cfg(not(target_arch = "wasm32"))]
pub mod preview;

pub use config::ClientConfig;
pub use controller::{ClientSnapshot, TaskController};
pub use error::{Diagnostic, ErrorKind, SyncError, WalletError};
pub use identity::{ContractAddress, Identity};
pub use session::SessionState;
pub use task::{Task, TaskDraft, TaskList};

#[cfg(not(target_arch = "wasm32"))]
pub use native::run;

#[cfg(not(target_arch = "wasm32"))]
mod native {
  use std::ffi::OsString;

  use anyhow::Context;
  use clap::Parser;
  use tracing::{
    debug,
    info
  };

  use crate::cli::{
    Command,
    GlobalCli
  };
  use crate::config::{
    self,
    ClientConfig
  };
  use crate::{
    logging,
    preview
  };

  #[tracing::instrument(skip_all)]
  pub fn run(
    raw_args: Vec<OsString>
  ) -> anyhow::Result<()> {
    let cli =
      GlobalCli::parse_from(raw_args);

    let mut cfg = ClientConfig::load(
      cli.config.as_deref()
    )?;
    cfg
      .apply_overrides(
        config::env_overrides(
          std::env::vars()
        )
      )
      .context(
        "invalid CHAINTASK_* \
         environment override"
      )?;
    cfg
      .apply_overrides(
        cli
          .overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .context(
        "invalid --set override"
      )?;

    logging::init_tracing(
      cli.verbose,
      cli.quiet,
      cfg.log.filter.as_deref()
    )?;

    info!(
      verbose = cli.verbose,
      quiet = cli.quiet,
      contract = %cfg.contract.address,
      "starting chaintask CLI"
    );

    match cli.command {
      | Command::Config => {
        print!(
          "{}",
          cfg.to_toml_string()?
        );
      }
      | Command::Simulate(args) => {
        debug!(?args, "simulate arguments");
        let runtime =
          tokio::runtime::Builder::new_current_thread()
            .build()
            .context(
              "failed to start async \
               runtime"
            )?;
        let report = runtime.block_on(
          preview::run_preview(
            &cfg, &args
          )
        );
        if args.json {
          println!(
            "{}",
            serde_json::to_string_pretty(
              &report
            )?
          );
        } else {
          print!(
            "{}",
            preview::render_text(
              &report
            )?
          );
        }
      }
    }

    info!("done");
    Ok(())
  }
}
