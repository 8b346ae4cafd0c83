use chaintask_core::Task;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TaskListRowProps {
  pub task:      Task,
  pub on_delete: Callback<u64>
}

#[function_component(TaskListRow)]
pub fn task_list_row(
  props: &TaskListRowProps
) -> Html {
  let id = props.task.id;
  let class =
    if props.task.is_deleted {
      "row deleted"
    } else {
      "row"
    };

  // Tombstones stay listed but cannot be deleted twice.
  let action = if props.task.is_live() {
    let on_delete =
      props.on_delete.clone();
    html! {
        <button class="btn danger" onclick={move |_| on_delete.emit(id)}>{ "Delete" }</button>
    }
  } else {
    html! {}
  };

  html! {
      <li class={class}>
          <span class="text">
              <strong>{ props.task.title.clone() }</strong>
              { format!(": {}", props.task.body) }
          </span>
          { action }
      </li>
  }
}
