use std::cell::RefCell;
use std::rc::Rc;

use chaintask_shared::AddTaskArgs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::SyncError;
use crate::identity::{ContractAddress, Identity};
use crate::session::{SessionManager, SessionTicket};
use crate::task::{Task, TaskList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced { count: usize },
    /// No active identity; the mirror was left alone.
    NoSession,
    /// The identity changed while the read was in flight; the result was dropped.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The ledger confirmed the submission, then the mirror was re-read. A failed
    /// re-read does not undo the confirmation.
    Confirmed {
        refresh: Result<RefreshOutcome, SyncError>,
    },
    /// An identical mutation was already queued or in flight; nothing was sent.
    Coalesced,
    /// No session, or the session ended before this mutation's turn; nothing was sent.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add(AddTaskArgs),
    Delete { task_id: u64 },
}

struct QueuedMutation {
    ticket: SessionTicket,
    mutation: Mutation,
}

/// Mirror of the ledger's task list for the active identity, plus the two ledger
/// mutations.
///
/// Mutations run one at a time in arrival order; each holds its turn until the
/// mirror has been re-read after confirmation.
pub struct TaskSynchronizer {
    session: Rc<SessionManager>,
    contract: ContractAddress,
    mirror: RefCell<TaskList>,
    turn: Mutex<()>,
    queued: RefCell<Vec<QueuedMutation>>,
    queue_hook: RefCell<Option<QueueHook>>,
}

/// Called whenever a mutation enters or leaves the pending list.
pub type QueueHook = Rc<dyn Fn()>;

impl TaskSynchronizer {
    pub fn new(session: Rc<SessionManager>, contract: ContractAddress) -> Self {
        Self {
            session,
            contract,
            mirror: RefCell::new(TaskList::default()),
            turn: Mutex::new(()),
            queued: RefCell::new(Vec::new()),
            queue_hook: RefCell::new(None),
        }
    }

    pub fn set_queue_hook(&self, hook: Option<QueueHook>) {
        *self.queue_hook.borrow_mut() = hook;
    }

    pub fn mirror(&self) -> TaskList {
        self.mirror.borrow().clone()
    }

    /// Tasks for the active identity only.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let identity = self.session.identity();
        self.mirror
            .borrow()
            .visible_to(identity.as_ref())
            .to_vec()
    }

    pub fn clear(&self) {
        *self.mirror.borrow_mut() = TaskList::default();
    }

    /// Mutations queued or in flight.
    pub fn pending_mutations(&self) -> usize {
        self.queued.borrow().len()
    }

    /// Replaces the mirror with the ledger's current list. On failure the previous
    /// mirror is kept as is.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, SyncError> {
        let Some(ticket) = self.session.ticket() else {
            debug!("no active identity; refresh skipped");
            return Ok(RefreshOutcome::NoSession);
        };
        self.refresh_for(&ticket).await
    }

    #[instrument(skip(self, ticket), fields(identity = %ticket.identity))]
    async fn refresh_for(&self, ticket: &SessionTicket) -> Result<RefreshOutcome, SyncError> {
        let ledger = self
            .session
            .wallet()
            .ledger(&self.contract, &ticket.identity)
            .await
            .map_err(SyncError::from_read)?;

        let records = match ledger.get_my_task().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "getMyTask failed; keeping previous mirror");
                return Err(SyncError::from_read(err));
            }
        };

        if !self.session.is_current(ticket) {
            warn!("session changed during refresh; discarding result");
            return Ok(RefreshOutcome::Discarded);
        }

        let tasks: Vec<Task> = records.into_iter().map(Task::from).collect();
        let count = tasks.len();
        *self.mirror.borrow_mut() = TaskList::new(ticket.identity.clone(), tasks);
        info!(count, "mirror rebuilt");
        Ok(RefreshOutcome::Replaced { count })
    }

    /// Appends a task to the ledger. Both fields must be non-blank; the trimmed
    /// values are submitted.
    #[instrument(skip(self, title, body), fields(title_len = title.len(), body_len = body.len()))]
    pub async fn add_task(&self, title: &str, body: &str) -> Result<MutationOutcome, SyncError> {
        let (title, body) = validate_fields(title, body)?;
        self.submit(Mutation::Add(AddTaskArgs::new(title, body)))
            .await
    }

    /// Marks a task deleted on the ledger. The id is not checked against the mirror;
    /// the ledger rejects unknown ids.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: u64) -> Result<MutationOutcome, SyncError> {
        self.submit(Mutation::Delete { task_id }).await
    }

    async fn submit(&self, mutation: Mutation) -> Result<MutationOutcome, SyncError> {
        let Some(ticket) = self.session.ticket() else {
            debug!("no active identity; mutation skipped");
            return Ok(MutationOutcome::Skipped);
        };

        let duplicate = self
            .queued
            .borrow()
            .iter()
            .any(|queued| queued.ticket == ticket && queued.mutation == mutation);
        if duplicate {
            info!(?mutation, "identical mutation already pending; coalesced");
            return Ok(MutationOutcome::Coalesced);
        }

        let _queued = QueueSlot::enter(self, ticket.clone(), mutation.clone());
        let _turn = self.turn.lock().await;

        if !self.session.is_current(&ticket) {
            info!(?mutation, "session ended while queued; mutation dropped");
            return Ok(MutationOutcome::Skipped);
        }

        self.send_and_confirm(&ticket.identity, &mutation).await?;
        let refresh = self.refresh_for(&ticket).await;
        Ok(MutationOutcome::Confirmed { refresh })
    }

    #[instrument(skip(self, identity), fields(identity = %identity))]
    async fn send_and_confirm(
        &self,
        identity: &Identity,
        mutation: &Mutation,
    ) -> Result<(), SyncError> {
        let ledger = self
            .session
            .wallet()
            .ledger(&self.contract, identity)
            .await
            .map_err(SyncError::from_submission)?;

        let sent = match mutation {
            Mutation::Add(args) => ledger.add_task(args.clone()).await,
            Mutation::Delete { task_id } => ledger.delete_task(*task_id).await,
        };
        let submission = sent.map_err(|err| {
            warn!(error = %err, "submission was not sent");
            SyncError::from_submission(err)
        })?;

        info!(tx = submission.hash(), "submission sent; awaiting confirmation");
        submission.wait().await.map_err(|err| {
            warn!(tx = submission.hash(), error = %err, "submission failed");
            SyncError::from_submission(err)
        })?;
        info!(tx = submission.hash(), "submission confirmed");
        Ok(())
    }

    fn queue_changed(&self) {
        let hook = self.queue_hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// Registration in the pending list, removed when the mutation finishes or its
/// future is dropped.
struct QueueSlot<'a> {
    sync: &'a TaskSynchronizer,
    ticket: SessionTicket,
    mutation: Mutation,
}

impl<'a> QueueSlot<'a> {
    fn enter(sync: &'a TaskSynchronizer, ticket: SessionTicket, mutation: Mutation) -> Self {
        sync.queued.borrow_mut().push(QueuedMutation {
            ticket: ticket.clone(),
            mutation: mutation.clone(),
        });
        sync.queue_changed();
        Self {
            sync,
            ticket,
            mutation,
        }
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        {
            let mut queued = self.sync.queued.borrow_mut();
            if let Some(idx) = queued
                .iter()
                .position(|q| q.ticket == self.ticket && q.mutation == self.mutation)
            {
                queued.remove(idx);
            }
        }
        self.sync.queue_changed();
    }
}

fn validate_fields(title: &str, body: &str) -> Result<(String, String), SyncError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SyncError::EmptyField { field: "title" });
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(SyncError::EmptyField { field: "body" });
    }
    Ok((title.to_string(), body.to_string()))
}
