use serde::{
  Deserialize,
  Serialize
};

/// Wallet RPC that prompts the user to
/// authorize accounts for this site.
pub const RPC_REQUEST_ACCOUNTS: &str =
  "eth_requestAccounts";

/// Wallet RPC that lists already
/// authorized accounts without a
/// prompt.
pub const RPC_ACCOUNTS: &str =
  "eth_accounts";

pub const EVENT_ACCOUNTS_CHANGED: &str =
  "accountsChanged";
pub const EVENT_CHAIN_CHANGED: &str =
  "chainChanged";

/// Contract functions. The names are
/// part of the deployed ABI.
pub const FN_GET_MY_TASK: &str =
  "getMyTask";
pub const FN_ADD_TASK: &str = "addTask";
pub const FN_DELETE_TASK: &str =
  "deleteTask";

/// Human-readable ABI fragments for the
/// contract functions, in the form
/// ethers accepts.
pub fn ledger_abi() -> Vec<String> {
  vec![
    format!(
      "function {FN_GET_MY_TASK}() view \
       returns (tuple(uint256 id, string \
       taskTitle, string taskText, bool \
       isDeleted)[])"
    ),
    format!(
      "function {FN_ADD_TASK}(string \
       taskText, string taskTitle, bool \
       isDeleted)"
    ),
    format!(
      "function {FN_DELETE_TASK}(uint256 \
       taskId)"
    ),
  ]
}

pub const DEFAULT_CONTRACT_ADDRESS: &str =
  "0x9a3faF3fd0764C6d3Ec5A40b2a302220494582dc";

/// One element of the array returned by
/// `getMyTask()`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTaskRecord {
  pub id:         u64,
  #[serde(default)]
  pub task_title: String,
  #[serde(default)]
  pub task_text:  String,
  #[serde(default)]
  pub is_deleted: bool
}

/// Argument tuple of `addTask`. Field
/// order matches the contract: text
/// first, then title.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskArgs {
  pub task_text:  String,
  pub task_title: String,
  pub is_deleted: bool
}

impl AddTaskArgs {
  pub fn new(
    title: impl Into<String>,
    body: impl Into<String>
  ) -> Self {
    Self {
      task_text:  body.into(),
      task_title: title.into(),
      is_deleted: false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ledger_record_uses_contract_field_names()
   {
    let raw = r#"{"id":3,"taskTitle":"T","taskText":"B","isDeleted":true}"#;
    let record: LedgerTaskRecord =
      serde_json::from_str(raw)
        .expect("decode record");
    assert_eq!(record.id, 3);
    assert_eq!(record.task_title, "T");
    assert_eq!(record.task_text, "B");
    assert!(record.is_deleted);
  }

  #[test]
  fn add_task_args_serialize_body_before_title()
   {
    let args =
      AddTaskArgs::new("title", "body");
    let json = serde_json::to_string(&args)
      .expect("encode args");
    assert_eq!(
      json,
      r#"{"taskText":"body","taskTitle":"title","isDeleted":false}"#
    );
  }

  #[test]
  fn abi_fragments_use_contract_names() {
    let abi = ledger_abi();
    assert_eq!(abi.len(), 3);
    assert_eq!(
      abi[0],
      "function getMyTask() view returns \
       (tuple(uint256 id, string taskTitle, \
       string taskText, bool isDeleted)[])"
    );
    assert_eq!(
      abi[1],
      "function addTask(string taskText, \
       string taskTitle, bool isDeleted)"
    );
    assert_eq!(
      abi[2],
      "function deleteTask(uint256 taskId)"
    );
  }

  #[test]
  fn missing_optional_fields_default() {
    let record: LedgerTaskRecord =
      serde_json::from_str(r#"{"id":0}"#)
        .expect("decode record");
    assert_eq!(record.task_title, "");
    assert!(!record.is_deleted);
  }
}
