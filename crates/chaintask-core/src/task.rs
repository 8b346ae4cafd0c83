use chaintask_shared::LedgerTaskRecord;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub is_deleted: bool,
}

impl Task {
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }
}

impl From<LedgerTaskRecord> for Task {
    fn from(record: LedgerTaskRecord) -> Self {
        Self {
            id: record.id,
            title: record.task_title,
            body: record.task_text,
            is_deleted: record.is_deleted,
        }
    }
}

/// Local mirror of the ledger's task list, tagged with the identity it was read for.
///
/// Only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    owner: Option<Identity>,
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(owner: Identity, tasks: Vec<Task>) -> Self {
        Self {
            owner: Some(owner),
            tasks,
        }
    }

    pub fn owner(&self) -> Option<&Identity> {
        self.owner.as_ref()
    }

    /// Tasks as seen by `identity`; empty unless the mirror was read for it.
    pub fn visible_to(&self, identity: Option<&Identity>) -> &[Task] {
        match (self.owner.as_ref(), identity) {
            (Some(owner), Some(identity)) if owner == identity => &self.tasks,
            _ => &[],
        }
    }
}

/// Contents of the add-task input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub body: String,
}

impl TaskDraft {
    pub fn clear(&mut self) {
        self.title.clear();
        self.body.clear();
    }

    pub fn is_submittable(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, deleted: bool) -> Task {
        Task {
            id,
            title: format!("t{id}"),
            body: format!("b{id}"),
            is_deleted: deleted,
        }
    }

    #[test]
    fn ledger_record_maps_title_and_text() {
        let record = LedgerTaskRecord {
            id: 7,
            task_title: "title".into(),
            task_text: "text".into(),
            is_deleted: false,
        };
        let task = Task::from(record);
        assert_eq!(task.id, 7);
        assert_eq!(task.title, "title");
        assert_eq!(task.body, "text");
        assert!(task.is_live());
    }

    #[test]
    fn mirror_is_hidden_from_other_identities() {
        let alice = Identity::new("0xA11CE");
        let bob = Identity::new("0xB0B");
        let list = TaskList::new(alice.clone(), vec![task(0, false), task(1, true)]);

        assert_eq!(list.visible_to(Some(&alice)).len(), 2);
        assert_eq!(list.visible_to(Some(&Identity::new("0xa11ce"))).len(), 2);
        assert!(list.visible_to(Some(&bob)).is_empty());
        assert!(list.visible_to(None).is_empty());
        assert!(TaskList::default().visible_to(Some(&alice)).is_empty());
    }

    #[test]
    fn draft_requires_both_fields() {
        let mut draft = TaskDraft {
            title: "  ".into(),
            body: "body".into(),
        };
        assert!(!draft.is_submittable());
        draft.title = "title".into();
        assert!(draft.is_submittable());
        draft.clear();
        assert_eq!(draft, TaskDraft::default());
    }
}
