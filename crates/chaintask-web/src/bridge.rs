use async_trait::async_trait;
use chaintask_core::error::WalletResult;
use chaintask_core::provider::{
    Submission,
    TaskLedger,
    WalletProvider,
};
use chaintask_core::{
    ContractAddress,
    Identity,
    WalletError,
};
use chaintask_shared::{
    AddTaskArgs,
    EVENT_ACCOUNTS_CHANGED,
    EVENT_CHAIN_CHANGED,
    FN_ADD_TASK,
    FN_DELETE_TASK,
    FN_GET_MY_TASK,
    LedgerTaskRecord,
    RPC_ACCOUNTS,
    RPC_REQUEST_ACCOUNTS,
    ledger_abi,
};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/ledger_bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = hasProvider)]
    fn has_provider() -> bool;

    #[wasm_bindgen(js_name = walletRequest, catch)]
    async fn wallet_request(method: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = connectContract, catch)]
    async fn connect_contract(
        address: &str,
        account: &str,
        abi: &js_sys::Array,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = readTasks, catch)]
    async fn read_tasks(contract: &JsValue, method: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = sendTx, catch)]
    async fn send_tx(
        contract: &JsValue,
        method: &str,
        args: &js_sys::Array,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = txHash)]
    fn tx_hash(tx: &JsValue) -> String;

    #[wasm_bindgen(js_name = waitTx, catch)]
    async fn wait_tx(tx: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = onProviderEvent)]
    fn on_provider_event(name: &str, callback: &js_sys::Function);

    #[wasm_bindgen(js_name = errorCode)]
    fn error_code(err: &JsValue) -> Option<String>;

    #[wasm_bindgen(js_name = errorMessage)]
    fn error_message(err: &JsValue) -> String;
}

/// Wallet injected into the page as `window.ethereum`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InjectedWallet;

#[async_trait(?Send)]
impl WalletProvider for InjectedWallet {
    async fn request_accounts(&self) -> WalletResult<Vec<Identity>> {
        request_identities(RPC_REQUEST_ACCOUNTS).await
    }

    async fn authorized_accounts(&self) -> WalletResult<Vec<Identity>> {
        request_identities(RPC_ACCOUNTS).await
    }

    async fn ledger(
        &self,
        contract: &ContractAddress,
        identity: &Identity,
    ) -> WalletResult<Box<dyn TaskLedger>> {
        ensure_provider()?;
        let abi: js_sys::Array = ledger_abi().into_iter().map(JsValue::from).collect();
        let handle = connect_contract(contract.as_str(), identity.as_str(), &abi)
            .await
            .map_err(classify)?;
        Ok(Box::new(InjectedLedger { handle }))
    }
}

struct InjectedLedger {
    handle: JsValue,
}

#[async_trait(?Send)]
impl TaskLedger for InjectedLedger {
    async fn get_my_task(&self) -> WalletResult<Vec<LedgerTaskRecord>> {
        let rows = read_tasks(&self.handle, FN_GET_MY_TASK)
            .await
            .map_err(classify)?;
        decode(rows)
    }

    async fn add_task(&self, args: AddTaskArgs) -> WalletResult<Box<dyn Submission>> {
        // addTask(taskText, taskTitle, isDeleted)
        let call_args = js_sys::Array::of3(
            &JsValue::from(args.task_text.as_str()),
            &JsValue::from(args.task_title.as_str()),
            &JsValue::from_bool(args.is_deleted),
        );
        let tx = send_tx(&self.handle, FN_ADD_TASK, &call_args)
            .await
            .map_err(classify)?;
        Ok(Box::new(InjectedSubmission::new(tx)))
    }

    async fn delete_task(&self, task_id: u64) -> WalletResult<Box<dyn Submission>> {
        let call_args = js_sys::Array::of1(&js_sys::BigInt::from(task_id).into());
        let tx = send_tx(&self.handle, FN_DELETE_TASK, &call_args)
            .await
            .map_err(classify)?;
        Ok(Box::new(InjectedSubmission::new(tx)))
    }
}

struct InjectedSubmission {
    tx: JsValue,
    hash: String,
}

impl InjectedSubmission {
    fn new(tx: JsValue) -> Self {
        let hash = tx_hash(&tx);
        Self { tx, hash }
    }
}

#[async_trait(?Send)]
impl Submission for InjectedSubmission {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn wait(&self) -> WalletResult<()> {
        wait_tx(&self.tx).await.map_err(classify)?;
        Ok(())
    }
}

/// Forwards the wallet's account and network change events for the lifetime of the
/// page. A page without a wallet never fires them.
pub fn subscribe_provider_events(
    on_accounts: impl Fn(Vec<Identity>) + 'static,
    on_chain: impl Fn() + 'static,
) {
    if !has_provider() {
        tracing::debug!("no injected wallet; not subscribing to provider events");
        return;
    }

    let accounts = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
        match decode::<Vec<String>>(value) {
            Ok(list) => on_accounts(list.into_iter().map(Identity::new).collect()),
            Err(err) => tracing::warn!(error = %err, "unreadable accountsChanged payload"),
        }
    });
    let chain = Closure::<dyn Fn(JsValue)>::new(move |_value: JsValue| on_chain());

    on_provider_event(EVENT_ACCOUNTS_CHANGED, accounts.as_ref().unchecked_ref());
    on_provider_event(EVENT_CHAIN_CHANGED, chain.as_ref().unchecked_ref());
    accounts.forget();
    chain.forget();
}

async fn request_identities(method: &str) -> WalletResult<Vec<Identity>> {
    ensure_provider()?;
    let value = wallet_request(method).await.map_err(classify)?;
    let accounts: Vec<String> = decode(value)?;
    Ok(accounts.into_iter().map(Identity::new).collect())
}

fn ensure_provider() -> WalletResult<()> {
    if has_provider() {
        Ok(())
    } else {
        Err(WalletError::Unavailable)
    }
}

fn decode<T: DeserializeOwned>(value: JsValue) -> WalletResult<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| WalletError::Rpc(format!("decode error: {e}")))
}

fn classify(err: JsValue) -> WalletError {
    classify_code(error_code(&err).as_deref(), error_message(&err))
}

/// 4001 is the EIP-1193 user-rejection code; ethers reports the same thing as
/// `ACTION_REJECTED`.
fn classify_code(code: Option<&str>, message: String) -> WalletError {
    match code {
        Some("4001" | "ACTION_REJECTED") => WalletError::Rejected,
        Some("NO_PROVIDER") => WalletError::Unavailable,
        Some("CALL_EXCEPTION") => WalletError::Reverted(message),
        _ => WalletError::Rpc(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_map_to_rejected() {
        assert_eq!(classify_code(Some("4001"), "x".into()), WalletError::Rejected);
        assert_eq!(
            classify_code(Some("ACTION_REJECTED"), "x".into()),
            WalletError::Rejected
        );
    }

    #[test]
    fn reverts_keep_their_message() {
        assert_eq!(
            classify_code(Some("CALL_EXCEPTION"), "task 9 does not exist".into()),
            WalletError::Reverted("task 9 does not exist".into())
        );
        assert_eq!(
            classify_code(None, "network down".into()),
            WalletError::Rpc("network down".into())
        );
        assert_eq!(
            classify_code(Some("NO_PROVIDER"), String::new()),
            WalletError::Unavailable
        );
    }
}
