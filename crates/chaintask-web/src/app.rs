use std::rc::Rc;

use chaintask_core::{
  ClientConfig,
  TaskController
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  function_component,
  html,
  use_effect_with,
  use_memo,
  use_state
};

use crate::bridge::{
  InjectedWallet,
  subscribe_provider_events
};
use crate::components::{
  ConnectPanel,
  NoticeBanner,
  TaskForm,
  TaskList
};

const EMBEDDED_CONFIG: &str =
  include_str!("../chaintask.toml");

fn load_config() -> ClientConfig {
  match ClientConfig::from_toml_str(
    EMBEDDED_CONFIG
  ) {
    | Ok(cfg) => cfg,
    | Err(err) => {
      tracing::error!(
        error = %err,
        "embedded config is invalid; \
         using defaults"
      );
      ClientConfig::default()
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let config = use_memo((), |_| {
    load_config()
  });
  let controller = {
    let config = config.clone();
    use_memo((), move |_| {
      tracing::info!(
        contract = %config.contract.address,
        restore = config.session.restore,
        "creating task controller"
      );
      TaskController::new(
        Rc::new(InjectedWallet),
        &config
      )
    })
  };
  let snapshot = {
    let controller =
      controller.clone();
    use_state(move || {
      controller.snapshot()
    })
  };

  {
    let controller =
      controller.clone();
    let snapshot = snapshot.clone();
    let restore =
      config.session.restore;
    use_effect_with((), move |_| {
      let observed =
        Rc::downgrade(&controller);
      controller.set_observer(Some(
        Rc::new(move || {
          if let Some(controller) =
            observed.upgrade()
          {
            snapshot
              .set(controller.snapshot());
          }
        })
      ));

      let on_accounts = {
        let observed =
          Rc::downgrade(&controller);
        move |accounts| {
          if let Some(controller) =
            observed.upgrade()
          {
            controller
              .handle_accounts_changed(
                accounts
              );
          }
        }
      };
      let on_chain = {
        let observed =
          Rc::downgrade(&controller);
        move || {
          if let Some(controller) =
            observed.upgrade()
          {
            controller
              .handle_chain_changed();
          }
        }
      };
      subscribe_provider_events(
        on_accounts,
        on_chain
      );

      if restore {
        let controller =
          controller.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            controller
              .restore_session()
              .await;
          }
        );
      }

      move || controller.set_observer(None)
    });
  }

  let on_connect = {
    let controller =
      controller.clone();
    Callback::from(
      move |_: MouseEvent| {
        let controller =
          controller.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            controller.connect().await;
          }
        );
      }
    )
  };

  let on_disconnect = {
    let controller =
      controller.clone();
    Callback::from(
      move |_: MouseEvent| {
        controller.disconnect()
      }
    )
  };

  let on_refresh = {
    let controller =
      controller.clone();
    Callback::from(
      move |_: MouseEvent| {
        let controller =
          controller.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            controller.refresh().await;
          }
        );
      }
    )
  };

  let on_title = {
    let controller =
      controller.clone();
    Callback::from(
      move |title: String| {
        controller
          .set_draft_title(title)
      }
    )
  };

  let on_body = {
    let controller =
      controller.clone();
    Callback::from(
      move |body: String| {
        controller.set_draft_body(body)
      }
    )
  };

  let on_submit = {
    let controller =
      controller.clone();
    Callback::from(move |()| {
      let controller =
        controller.clone();
      wasm_bindgen_futures::spawn_local(
        async move {
          controller
            .submit_draft()
            .await;
        }
      );
    })
  };

  let on_delete = {
    let controller =
      controller.clone();
    Callback::from(
      move |task_id: u64| {
        let controller =
          controller.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            controller
              .delete_task(task_id)
              .await;
          }
        );
      }
    )
  };

  let on_dismiss = {
    let controller =
      controller.clone();
    Callback::from(
      move |_: MouseEvent| {
        controller.dismiss_diagnostic()
      }
    )
  };

  let view = (*snapshot).clone();
  let connected =
    view.connection.is_connected();

  html! {
      <div class="shell">
          <header class="topbar">
              <h1>{ "Task Manager" }</h1>
              <ConnectPanel
                  connection={view.connection.clone()}
                  on_connect={on_connect}
                  on_disconnect={on_disconnect}
              />
          </header>
          <NoticeBanner diagnostic={view.diagnostic.clone()} on_dismiss={on_dismiss} />
          if connected {
              <>
                  <TaskForm
                      draft={view.draft.clone()}
                      pending={view.pending_mutations}
                      on_title={on_title}
                      on_body={on_body}
                      on_submit={on_submit}
                  />
                  <div class="actions">
                      <button class="btn" onclick={on_refresh}>{ "Refresh" }</button>
                  </div>
                  <TaskList tasks={view.tasks.clone()} on_delete={on_delete} />
              </>
          }
      </div>
  }
}
