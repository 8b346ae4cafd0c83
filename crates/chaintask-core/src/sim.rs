//! In-process wallet and ledger.
//!
//! Behaves like the deployed contract (per-sender task arrays, ids are array indexes,
//! deletion is a tombstone) and lets callers script the user's side: approving or
//! declining prompts, failing reads, holding prompts and confirmations open.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use chaintask_shared::{AddTaskArgs, LedgerTaskRecord};
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{WalletError, WalletResult};
use crate::identity::{ContractAddress, Identity};
use crate::provider::{Submission, TaskLedger, WalletProvider};

#[derive(Default)]
struct LedgerState {
    books: HashMap<Identity, Vec<LedgerTaskRecord>>,
    fail_reads: bool,
    revert_submissions: bool,
    reads: usize,
    submissions: usize,
    in_flight: usize,
    max_in_flight: usize,
    confirmation_gate: Option<Rc<Notify>>,
}

/// Shared handle to the simulated contract storage.
#[derive(Clone, Default)]
pub struct SimLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl SimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record directly, as if confirmed earlier. Returns its id.
    pub fn seed(&self, owner: &Identity, title: &str, body: &str) -> u64 {
        let mut state = self.state.borrow_mut();
        let book = state.books.entry(owner.clone()).or_default();
        let id = book.len() as u64;
        book.push(LedgerTaskRecord {
            id,
            task_title: title.to_string(),
            task_text: body.to_string(),
            is_deleted: false,
        });
        id
    }

    pub fn records(&self, owner: &Identity) -> Vec<LedgerTaskRecord> {
        self.state
            .borrow()
            .books
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_read_failure(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn set_revert_submissions(&self, revert: bool) {
        self.state.borrow_mut().revert_submissions = revert;
    }

    pub fn read_count(&self) -> usize {
        self.state.borrow().reads
    }

    /// Transactions sent, confirmed or not.
    pub fn submission_count(&self) -> usize {
        self.state.borrow().submissions
    }

    /// Highest number of sent-but-unconfirmed transactions seen at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.borrow().max_in_flight
    }

    /// Confirmations wait for a `notify_one` on the returned handle.
    pub fn hold_confirmations(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.state.borrow_mut().confirmation_gate = Some(gate.clone());
        gate
    }

    fn send(&self) -> String {
        let mut state = self.state.borrow_mut();
        state.submissions += 1;
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        format!("0xsim{:060x}", state.submissions)
    }

    fn apply(&self, sender: &Identity, op: &PendingOp) -> WalletResult<()> {
        let mut state = self.state.borrow_mut();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.revert_submissions {
            return Err(WalletError::Reverted("execution reverted".into()));
        }

        let book = state.books.entry(sender.clone()).or_default();
        match op {
            PendingOp::Add(args) => {
                let id = book.len() as u64;
                book.push(LedgerTaskRecord {
                    id,
                    task_title: args.task_title.clone(),
                    task_text: args.task_text.clone(),
                    is_deleted: args.is_deleted,
                });
                debug!(sender = %sender, id, "simulated addTask confirmed");
            }
            PendingOp::Delete(task_id) => {
                let record = book
                    .iter_mut()
                    .find(|record| record.id == *task_id)
                    .ok_or_else(|| WalletError::Reverted(format!("task {task_id} does not exist")))?;
                record.is_deleted = true;
                debug!(sender = %sender, id = task_id, "simulated deleteTask confirmed");
            }
        }
        Ok(())
    }
}

struct WalletState {
    installed: bool,
    accounts: Vec<Identity>,
    authorized: bool,
    approve_prompts: bool,
    reject_signatures: bool,
    accounts_rpc_failure: bool,
    prompts: usize,
    prompt_gate: Option<Rc<Notify>>,
}

/// Scriptable stand-in for an injected browser wallet.
pub struct SimWallet {
    ledger: SimLedger,
    state: RefCell<WalletState>,
}

impl SimWallet {
    /// An installed wallet holding `accounts`, not yet authorized for the site, that
    /// approves prompts.
    pub fn new(ledger: SimLedger, accounts: Vec<Identity>) -> Self {
        Self {
            ledger,
            state: RefCell::new(WalletState {
                installed: true,
                accounts,
                authorized: false,
                approve_prompts: true,
                reject_signatures: false,
                accounts_rpc_failure: false,
                prompts: 0,
                prompt_gate: None,
            }),
        }
    }

    /// No wallet installed in the browser.
    pub fn absent() -> Self {
        let wallet = Self::new(SimLedger::new(), vec![]);
        wallet.state.borrow_mut().installed = false;
        wallet
    }

    pub fn sim_ledger(&self) -> &SimLedger {
        &self.ledger
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.state.borrow_mut().authorized = authorized;
    }

    pub fn set_prompt_approval(&self, approve: bool) {
        self.state.borrow_mut().approve_prompts = approve;
    }

    pub fn set_reject_signatures(&self, reject: bool) {
        self.state.borrow_mut().reject_signatures = reject;
    }

    /// Account RPCs (`eth_accounts`, `eth_requestAccounts`) fail as if the wallet
    /// could not be reached.
    pub fn set_accounts_rpc_failure(&self, fail: bool) {
        self.state.borrow_mut().accounts_rpc_failure = fail;
    }

    /// Makes `identity` the wallet's selected account.
    pub fn select_account(&self, identity: Identity) {
        let mut state = self.state.borrow_mut();
        state.accounts.retain(|account| account != &identity);
        state.accounts.insert(0, identity);
    }

    pub fn accounts(&self) -> Vec<Identity> {
        self.state.borrow().accounts.clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.state.borrow().prompts
    }

    /// Authorization prompts stay open until `notify_one` is called on the returned
    /// handle.
    pub fn hold_prompts(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        self.state.borrow_mut().prompt_gate = Some(gate.clone());
        gate
    }
}

#[async_trait(?Send)]
impl WalletProvider for SimWallet {
    async fn request_accounts(&self) -> WalletResult<Vec<Identity>> {
        let gate = {
            let mut state = self.state.borrow_mut();
            if !state.installed {
                return Err(WalletError::Unavailable);
            }
            if state.accounts_rpc_failure {
                return Err(WalletError::Rpc("simulated accounts failure".into()));
            }
            state.prompts += 1;
            state.prompt_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.borrow_mut();
        if !state.approve_prompts {
            return Err(WalletError::Rejected);
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn authorized_accounts(&self) -> WalletResult<Vec<Identity>> {
        let state = self.state.borrow();
        if !state.installed {
            return Err(WalletError::Unavailable);
        }
        if state.accounts_rpc_failure {
            return Err(WalletError::Rpc("simulated accounts failure".into()));
        }
        if state.authorized {
            Ok(state.accounts.clone())
        } else {
            Ok(vec![])
        }
    }

    async fn ledger(
        &self,
        _contract: &ContractAddress,
        identity: &Identity,
    ) -> WalletResult<Box<dyn TaskLedger>> {
        let state = self.state.borrow();
        if !state.installed {
            return Err(WalletError::Unavailable);
        }
        Ok(Box::new(SimContract {
            ledger: self.ledger.clone(),
            sender: identity.clone(),
            reject_signatures: state.reject_signatures,
        }))
    }
}

struct SimContract {
    ledger: SimLedger,
    sender: Identity,
    reject_signatures: bool,
}

impl SimContract {
    fn sign(&self, op: PendingOp) -> WalletResult<Box<dyn Submission>> {
        if self.reject_signatures {
            return Err(WalletError::Rejected);
        }
        let hash = self.ledger.send();
        Ok(Box::new(SimSubmission {
            ledger: self.ledger.clone(),
            sender: self.sender.clone(),
            hash,
            op: RefCell::new(Some(op)),
        }))
    }
}

#[async_trait(?Send)]
impl TaskLedger for SimContract {
    async fn get_my_task(&self) -> WalletResult<Vec<LedgerTaskRecord>> {
        // one round trip
        tokio::task::yield_now().await;

        let mut state = self.ledger.state.borrow_mut();
        state.reads += 1;
        if state.fail_reads {
            return Err(WalletError::Rpc("simulated read failure".into()));
        }
        Ok(state.books.get(&self.sender).cloned().unwrap_or_default())
    }

    async fn add_task(&self, args: AddTaskArgs) -> WalletResult<Box<dyn Submission>> {
        self.sign(PendingOp::Add(args))
    }

    async fn delete_task(&self, task_id: u64) -> WalletResult<Box<dyn Submission>> {
        self.sign(PendingOp::Delete(task_id))
    }
}

enum PendingOp {
    Add(AddTaskArgs),
    Delete(u64),
}

struct SimSubmission {
    ledger: SimLedger,
    sender: Identity,
    hash: String,
    op: RefCell<Option<PendingOp>>,
}

#[async_trait(?Send)]
impl Submission for SimSubmission {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn wait(&self) -> WalletResult<()> {
        let gate = self.ledger.state.borrow().confirmation_gate.clone();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }

        let op = self
            .op
            .borrow_mut()
            .take()
            .ok_or_else(|| WalletError::Rpc("transaction already awaited".into()))?;
        self.ledger.apply(&self.sender, &op)
    }
}
