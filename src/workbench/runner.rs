//! Command loop driving the [`Workbench`] from the UI thread.
//!
//! The UI applies local commands itself through [`Workbench::apply_local`]
//! and sends what remains over a bounded `tokio::sync::mpsc` channel with
//! `try_send`.  A save is planned at that point, so whatever the operator
//! does next cannot change what gets stored.  Each remote command runs as
//! its own task, so a slow synthesis call never delays a save and
//! completions arrive in any order.

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::corpus::SentenceField;
use crate::store::RecordId;
use crate::synthesis::Backend;

use super::{PendingSave, Workbench};

/// Everything the UI can ask of the workbench.
#[derive(Debug)]
pub enum WorkbenchCommand {
    Draw,
    SelectHistory(RecordId),
    EditDraft { field: SentenceField, text: String },
    Play { field: SentenceField, backend: Backend },
    /// Save the drafts as they are now.
    Save,
    /// A save already planned by [`Workbench::apply_local`].
    CommitSave(PendingSave),
    Delete(RecordId),
    RefreshHistory,
}

impl WorkbenchCommand {
    /// `true` for commands that make a remote call.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            WorkbenchCommand::Play { .. }
                | WorkbenchCommand::CommitSave(_)
                | WorkbenchCommand::Delete(_)
                | WorkbenchCommand::RefreshHistory
        )
    }
}

impl Workbench {
    /// Run one command to completion.  Failures are already reported as
    /// notices, so the result is dropped here.
    pub async fn execute(&self, command: WorkbenchCommand) {
        let _ = match command {
            WorkbenchCommand::Draw => self.draw().map(|_| ()),
            WorkbenchCommand::SelectHistory(id) => self.select_history(&id),
            WorkbenchCommand::EditDraft { field, text } => {
                self.edit_draft(field, text);
                Ok(())
            }
            WorkbenchCommand::Play { field, backend } => self.play(field, backend).await,
            WorkbenchCommand::Save => self.save().await,
            WorkbenchCommand::CommitSave(pending) => self.commit_save(pending).await,
            WorkbenchCommand::Delete(id) => self.delete(&id).await,
            WorkbenchCommand::RefreshHistory => self.refresh_history().await,
        };
    }

    /// Apply a local command immediately.  Returns the command that still
    /// needs the runtime: remote commands as given, and a planned
    /// [`WorkbenchCommand::CommitSave`] for `Save`.
    pub fn apply_local(&self, command: WorkbenchCommand) -> Option<WorkbenchCommand> {
        match command {
            WorkbenchCommand::Draw => {
                let _ = self.draw();
            }
            WorkbenchCommand::SelectHistory(id) => {
                let _ = self.select_history(&id);
            }
            WorkbenchCommand::EditDraft { field, text } => self.edit_draft(field, text),
            WorkbenchCommand::Save => {
                return self.begin_save().ok().flatten().map(WorkbenchCommand::CommitSave);
            }
            remote => return Some(remote),
        }
        None
    }

    /// Process commands until `command_rx` is closed, then wait for the
    /// remote tasks still in flight.
    pub async fn run(self, mut command_rx: mpsc::Receiver<WorkbenchCommand>) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => {
                        log::debug!("workbench: {command:?}");
                        if let Some(remote) = self.apply_local(command) {
                            let workbench = self.clone();
                            tasks.spawn(async move { workbench.execute(remote).await });
                        }
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        log::error!("workbench: action task failed: {e}");
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log::error!("workbench: action task failed: {e}");
            }
        }
        log::info!("workbench: command channel closed, shutting down");
    }
}
