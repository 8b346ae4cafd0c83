use chaintask_core::Task;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

use super::TaskListRow;

#[derive(Properties, PartialEq)]
pub struct TaskListProps {
  pub tasks:     Vec<Task>,
  pub on_delete: Callback<u64>
}

#[function_component(TaskList)]
pub fn task_list(
  props: &TaskListProps
) -> Html {
  if props.tasks.is_empty() {
    return html! {
        <div class="panel list">
            <div class="header">{ "My Tasks" }</div>
            <div class="empty">{ "No tasks yet." }</div>
        </div>
    };
  }

  html! {
      <div class="panel list">
          <div class="header">{ "My Tasks" }</div>
          <ul>
              {
                  for props.tasks.iter().cloned().map(|task| html! {
                      <TaskListRow
                          key={task.id}
                          task={task.clone()}
                          on_delete={props.on_delete.clone()}
                      />
                  })
              }
          </ul>
      </div>
  }
}
