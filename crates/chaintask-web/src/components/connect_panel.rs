use chaintask_core::SessionState;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ConnectPanelProps {
  pub connection:    SessionState,
  pub on_connect:    Callback<MouseEvent>,
  pub on_disconnect: Callback<MouseEvent>
}

#[function_component(ConnectPanel)]
pub fn connect_panel(
  props: &ConnectPanelProps
) -> Html {
  match &props.connection {
    | SessionState::Disconnected => {
      html! {
          <div class="connect">
              <button class="btn primary" onclick={props.on_connect.clone()}>{ "Connect Wallet" }</button>
          </div>
      }
    }
    | SessionState::Connecting => {
      html! {
          <div class="connect">
              <button class="btn primary" disabled=true>{ "Waiting for wallet..." }</button>
          </div>
      }
    }
    | SessionState::Connected(identity) => {
      html! {
          <div class="connect connected">
              <span class="account" title={identity.to_string()}>{ identity.short() }</span>
              <button class="btn" onclick={props.on_disconnect.clone()}>{ "Disconnect" }</button>
          </div>
      }
    }
  }
}
