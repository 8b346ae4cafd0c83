//! `chaintask simulate`: drives a [`TaskController`] against the in-process ledger the
//! same way the browser front end drives it against the injected wallet.

use std::fmt::{self, Write as _};
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::cli::SimulateArgs;
use crate::config::ClientConfig;
use crate::controller::TaskController;
use crate::error::Diagnostic;
use crate::identity::Identity;
use crate::sim::{SimLedger, SimWallet};
use crate::task::Task;

#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub account: String,
    pub connection: String,
    pub tasks: Vec<Task>,
    pub notices: Vec<Diagnostic>,
    pub submissions: usize,
    pub reads: usize,
}

#[instrument(skip_all, fields(account = %args.account))]
pub async fn run_preview(cfg: &ClientConfig, args: &SimulateArgs) -> PreviewReport {
    let account = Identity::new(args.account.clone());
    let ledger = SimLedger::new();
    for pair in &args.seed {
        ledger.seed(&account, &pair.title, &pair.body);
    }

    let wallet = Rc::new(SimWallet::new(ledger.clone(), vec![account.clone()]));
    wallet.set_authorized(args.authorized);
    wallet.set_prompt_approval(!args.decline_connect);
    wallet.set_reject_signatures(args.reject_signatures);
    ledger.set_revert_submissions(args.revert);
    ledger.set_read_failure(args.fail_reads);

    let controller = TaskController::new(wallet.clone(), cfg);
    let mut notices = Vec::new();

    if cfg.session.restore {
        controller.restore_session().await;
        collect(&controller, &mut notices);
    }
    if !controller.connection_state().is_connected() {
        controller.connect().await;
        collect(&controller, &mut notices);
    }

    for pair in &args.add {
        controller.set_draft_title(pair.title.clone());
        controller.set_draft_body(pair.body.clone());
        controller.submit_draft().await;
        collect(&controller, &mut notices);
    }
    for id in &args.delete {
        controller.delete_task(*id).await;
        collect(&controller, &mut notices);
    }

    let snapshot = controller.snapshot();
    info!(
        tasks = snapshot.tasks.len(),
        notices = notices.len(),
        "simulation finished"
    );
    PreviewReport {
        account: account.to_string(),
        connection: snapshot.connection.label().to_string(),
        tasks: snapshot.tasks,
        notices,
        submissions: ledger.submission_count(),
        reads: ledger.read_count(),
    }
}

fn collect(controller: &TaskController, notices: &mut Vec<Diagnostic>) {
    if let Some(diagnostic) = controller.diagnostic() {
        notices.push(diagnostic);
        controller.dismiss_diagnostic();
    }
}

pub fn render_text(report: &PreviewReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "account {} ({})", report.account, report.connection)?;

    if report.tasks.is_empty() {
        writeln!(out, "no tasks")?;
    } else {
        let title_width = report
            .tasks
            .iter()
            .map(|task| task.title.chars().count())
            .max()
            .unwrap_or(0)
            .max("TITLE".len());
        writeln!(out, "{:<4} {:<8} {:<title_width$} BODY", "ID", "STATE", "TITLE")?;
        for task in &report.tasks {
            let state = if task.is_deleted { "deleted" } else { "open" };
            writeln!(
                out,
                "{:<4} {:<8} {:<title_width$} {}",
                task.id, state, task.title, task.body
            )?;
        }
    }

    for notice in &report.notices {
        writeln!(out, "! {}: {}", notice.kind, notice.message)?;
    }
    writeln!(
        out,
        "{} submission(s), {} read(s)",
        report.submissions, report.reads
    )?;
    Ok(out)
}
