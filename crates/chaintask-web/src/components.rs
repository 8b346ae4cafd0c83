mod connect_panel;
mod notice_banner;
mod task_form;
mod task_list;
mod task_list_row;

pub use connect_panel::ConnectPanel;
pub use notice_banner::NoticeBanner;
pub use task_form::TaskForm;
pub use task_list::TaskList;
pub use task_list_row::TaskListRow;
