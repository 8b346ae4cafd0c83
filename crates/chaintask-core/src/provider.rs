//! Capabilities consumed from the outside world: the injected wallet and the task
//! ledger contract it signs for.
//!
//! Futures here are `!Send`: in the browser every provider call resolves on the single
//! JS event loop.

use async_trait::async_trait;
use chaintask_shared::{AddTaskArgs, LedgerTaskRecord};

use crate::error::WalletResult;
use crate::identity::{ContractAddress, Identity};

#[async_trait(?Send)]
pub trait WalletProvider {
    /// Prompts the user to authorize accounts. May suspend indefinitely.
    async fn request_accounts(&self) -> WalletResult<Vec<Identity>>;

    /// Accounts already authorized for this site, without prompting.
    async fn authorized_accounts(&self) -> WalletResult<Vec<Identity>>;

    /// Binds a fresh contract handle to the signer for `identity`. Callers drop the
    /// handle at the end of the operation that requested it.
    async fn ledger(
        &self,
        contract: &ContractAddress,
        identity: &Identity,
    ) -> WalletResult<Box<dyn TaskLedger>>;
}

#[async_trait(?Send)]
pub trait TaskLedger {
    /// `getMyTask()`: every record owned by the signer, in ledger order.
    async fn get_my_task(&self) -> WalletResult<Vec<LedgerTaskRecord>>;

    /// `addTask(taskText, taskTitle, isDeleted)`. Resolves once the transaction is
    /// signed and sent, not when it is confirmed.
    async fn add_task(&self, args: AddTaskArgs) -> WalletResult<Box<dyn Submission>>;

    /// `deleteTask(taskId)`.
    async fn delete_task(&self, task_id: u64) -> WalletResult<Box<dyn Submission>>;
}

/// A sent transaction.
#[async_trait(?Send)]
pub trait Submission {
    fn hash(&self) -> &str;

    /// Resolves when the ledger confirms the transaction. No timeout.
    async fn wait(&self) -> WalletResult<()>;
}
