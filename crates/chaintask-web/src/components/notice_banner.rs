use chaintask_core::Diagnostic;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
  pub diagnostic: Option<Diagnostic>,
  pub on_dismiss: Callback<MouseEvent>
}

#[function_component(NoticeBanner)]
pub fn notice_banner(
  props: &NoticeBannerProps
) -> Html {
  let Some(diagnostic) =
    props.diagnostic.as_ref()
  else {
    return html! {};
  };

  let hint =
    if diagnostic.kind.is_retryable() {
      "You can try again."
    } else {
      ""
    };

  html! {
      <div class="notice" role="alert">
          <strong>{ diagnostic.kind.label() }</strong>
          <span class="message">{ format!(" {} ", diagnostic.message) }</span>
          <span class="hint">{ hint }</span>
          <button class="btn ghost" onclick={props.on_dismiss.clone()}>{ "Dismiss" }</button>
      </div>
  }
}
