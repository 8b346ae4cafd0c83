use chaintask_core::TaskDraft;
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskFormProps {
  pub draft:     TaskDraft,
  pub pending:   usize,
  pub on_title:  Callback<String>,
  pub on_body:   Callback<String>,
  pub on_submit: Callback<()>
}

#[function_component(TaskForm)]
pub fn task_form(
  props: &TaskFormProps
) -> Html {
  let on_title = {
    let on_title =
      props.on_title.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_title.emit(input.value());
      }
    )
  };
  let on_body = {
    let on_body =
      props.on_body.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        on_body.emit(input.value());
      }
    )
  };
  let on_submit = {
    let on_submit =
      props.on_submit.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        on_submit.emit(());
      }
    )
  };

  let status = match props.pending {
    | 0 => String::new(),
    | 1 => {
      "Waiting for 1 transaction..."
        .to_string()
    }
    | n => {
      format!(
        "Waiting for {n} transactions..."
      )
    }
  };

  html! {
      <form class="panel task-form" onsubmit={on_submit}>
          <input
              type="text"
              placeholder="Task Title"
              value={props.draft.title.clone()}
              oninput={on_title}
          />
          <input
              type="text"
              placeholder="Task Text"
              value={props.draft.body.clone()}
              oninput={on_body}
          />
          <button type="submit" class="btn ok" disabled={!props.draft.is_submittable()}>{ "Add Task" }</button>
          <span class="status">{ status }</span>
      </form>
  }
}
