use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Diagnostic, SyncError};
use crate::identity::Identity;
use crate::provider::WalletProvider;
use crate::session::{ConnectOutcome, SessionManager, SessionState};
use crate::sync::{MutationOutcome, RefreshOutcome, TaskSynchronizer};
use crate::task::{Task, TaskDraft};

pub type Observer = Rc<dyn Fn()>;

/// Everything the front end renders, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub connection: SessionState,
    pub tasks: Vec<Task>,
    pub draft: TaskDraft,
    pub diagnostic: Option<Diagnostic>,
    pub pending_mutations: usize,
}

/// Owns the session and the task mirror for one browser tab and turns every failure
/// into the single diagnostic slot.
pub struct TaskController {
    session: Rc<SessionManager>,
    sync: TaskSynchronizer,
    draft: RefCell<TaskDraft>,
    diagnostic: RefCell<Option<Diagnostic>>,
    observer: Rc<RefCell<Option<Observer>>>,
}

impl TaskController {
    pub fn new(wallet: Rc<dyn WalletProvider>, config: &ClientConfig) -> Self {
        let session = Rc::new(SessionManager::new(wallet));
        let sync = TaskSynchronizer::new(session.clone(), config.contract.address.clone());

        let observer: Rc<RefCell<Option<Observer>>> = Rc::new(RefCell::new(None));
        let relay = {
            let observer = observer.clone();
            move || {
                let observer = observer.borrow().clone();
                if let Some(observer) = observer {
                    observer();
                }
            }
        };
        let on_transition = relay.clone();
        session.set_transition_hook(Some(Rc::new(move |_state: &SessionState| on_transition())));
        sync.set_queue_hook(Some(Rc::new(relay)));

        Self {
            session,
            sync,
            draft: RefCell::new(TaskDraft::default()),
            diagnostic: RefCell::new(None),
            observer,
        }
    }

    /// Called after every visible change. The callback may read `snapshot()`.
    pub fn set_observer(&self, observer: Option<Observer>) {
        *self.observer.borrow_mut() = observer;
    }

    pub fn connection_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    pub fn task_list(&self) -> Vec<Task> {
        self.sync.visible_tasks()
    }

    pub fn draft(&self) -> TaskDraft {
        self.draft.borrow().clone()
    }

    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.diagnostic.borrow().clone()
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            connection: self.connection_state(),
            tasks: self.task_list(),
            draft: self.draft(),
            diagnostic: self.diagnostic(),
            pending_mutations: self.sync.pending_mutations(),
        }
    }

    pub fn set_draft_title(&self, title: impl Into<String>) {
        self.draft.borrow_mut().title = title.into();
        self.notify();
    }

    pub fn set_draft_body(&self, body: impl Into<String>) {
        self.draft.borrow_mut().body = body.into();
        self.notify();
    }

    pub fn dismiss_diagnostic(&self) {
        *self.diagnostic.borrow_mut() = None;
        self.notify();
    }

    /// Start-up path: adopt an already-authorized account silently, then load its
    /// tasks.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) {
        if self.session.restore_session().await.is_some() {
            self.refresh().await;
        }
    }

    #[instrument(skip(self))]
    pub async fn connect(&self) {
        match self.session.connect().await {
            Ok(ConnectOutcome::Connected(identity)) => {
                debug!(identity = %identity, "connected; loading tasks");
                self.clear_diagnostic();
                self.refresh().await;
            }
            Ok(ConnectOutcome::AlreadyConnected(_))
            | Ok(ConnectOutcome::AlreadyConnecting)
            | Ok(ConnectOutcome::Abandoned) => {}
            Err(err) => self.report(err),
        }
    }

    #[instrument(skip(self))]
    pub fn disconnect(&self) {
        if self.session.disconnect().is_some() {
            self.end_session();
        }
    }

    /// Forwarded from the wallet's `accountsChanged` event.
    #[instrument(skip(self, accounts))]
    pub fn handle_accounts_changed(&self, accounts: Vec<Identity>) {
        if self.session.handle_accounts_changed(&accounts).is_some() {
            self.end_session();
        }
    }

    /// Forwarded from the wallet's `chainChanged` event.
    #[instrument(skip(self))]
    pub fn handle_chain_changed(&self) {
        if self.session.handle_chain_changed().is_some() {
            self.end_session();
        }
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let result = self.sync.refresh().await;
        self.record_refresh(result);
    }

    /// Submits `title`/`body`. Blank fields are ignored without a ledger call or a
    /// diagnostic. The draft is left alone.
    #[instrument(skip(self, title, body))]
    pub async fn add_task(&self, title: &str, body: &str) {
        let result = self.sync.add_task(title, body).await;
        self.record_mutation(result);
    }

    /// Submits the draft. Once the ledger confirms, the draft is cleared unless it
    /// was edited in the meantime.
    #[instrument(skip(self))]
    pub async fn submit_draft(&self) {
        let submitted = self.draft();
        let result = self.sync.add_task(&submitted.title, &submitted.body).await;
        if matches!(result, Ok(MutationOutcome::Confirmed { .. })) {
            let mut draft = self.draft.borrow_mut();
            if *draft == submitted {
                draft.clear();
            } else {
                debug!("draft edited while submitting; keeping it");
            }
        }
        self.record_mutation(result);
    }

    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: u64) {
        let result = self.sync.delete_task(task_id).await;
        self.record_mutation(result);
    }

    fn end_session(&self) {
        self.sync.clear();
        self.notify();
    }

    fn record_refresh(&self, result: Result<RefreshOutcome, SyncError>) {
        match result {
            Ok(RefreshOutcome::Replaced { .. }) => self.clear_diagnostic(),
            Ok(RefreshOutcome::NoSession) | Ok(RefreshOutcome::Discarded) => self.notify(),
            Err(err) => self.report(err),
        }
    }

    fn record_mutation(&self, result: Result<MutationOutcome, SyncError>) {
        match result {
            Ok(MutationOutcome::Confirmed { refresh }) => {
                self.clear_diagnostic();
                self.record_refresh(refresh);
            }
            Ok(MutationOutcome::Coalesced) | Ok(MutationOutcome::Skipped) => self.notify(),
            Err(err @ SyncError::EmptyField { .. }) => {
                debug!(error = %err, "draft incomplete; nothing submitted");
            }
            Err(err) => self.report(err),
        }
    }

    fn clear_diagnostic(&self) {
        *self.diagnostic.borrow_mut() = None;
        self.notify();
    }

    fn report(&self, err: SyncError) {
        warn!(kind = %err.kind(), error = %err, "operation failed");
        *self.diagnostic.borrow_mut() = Some(Diagnostic::from(&err));
        self.notify();
    }

    fn notify(&self) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            observer();
        }
    }
}
