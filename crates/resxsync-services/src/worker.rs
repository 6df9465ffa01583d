//! Runs a sync on a background thread. Questions travel to the interactive
//! side as [`WorkerEvent::Ask`] and the worker blocks until they are answered.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use color_eyre::eyre::eyre;
use resxsync_core::{OverwriteAnswer, Result, TranslatedItem, UseForAllAnswer, UseForKeyAnswer};
use resxsync_resx::ResourceEntry;
use resxsync_translate::TranslationProvider;

use crate::decisions::DecisionPort;
use crate::sync::{sync_from_table, sync_online, RunSummary, SyncOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    Overwrite {
        key: String,
        existing: String,
        proposed: String,
    },
    UseForAll {
        english: String,
        candidates: Vec<ResourceEntry>,
        proposed: String,
    },
    UseForKey {
        key: String,
        proposed: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Overwrite(OverwriteAnswer),
    UseForAll(UseForAllAnswer),
    UseForKey(UseForKeyAnswer),
}

/// A pending question. Dropping it without replying aborts the run.
#[derive(Debug)]
pub struct Prompt {
    pub question: Question,
    reply: Sender<Answer>,
}

impl Prompt {
    pub fn reply(self, answer: Answer) {
        // a closed channel means the worker already gave up
        let _ = self.reply.send(answer);
    }
}

#[derive(Debug)]
pub enum WorkerEvent {
    Ask(Prompt),
    Item(TranslatedItem),
    Finished(RunSummary),
}

/// Decision port of the worker thread: every question is forwarded to the
/// interactive side and the call blocks for the reply.
pub struct ChannelDecisions {
    events: Sender<WorkerEvent>,
}

impl ChannelDecisions {
    pub fn new(events: Sender<WorkerEvent>) -> Self {
        Self { events }
    }

    fn ask(&self, question: Question) -> Result<Answer> {
        let (tx, rx) = mpsc::channel();
        self.events
            .send(WorkerEvent::Ask(Prompt { question, reply: tx }))
            .map_err(|_| eyre!("interactive side is gone"))?;
        rx.recv().map_err(|_| eyre!("prompt was dismissed without an answer"))
    }
}

impl DecisionPort for ChannelDecisions {
    fn ask_overwrite(&mut self, key: &str, existing: &str, proposed: &str) -> Result<OverwriteAnswer> {
        match self.ask(Question::Overwrite {
            key: key.to_string(),
            existing: existing.to_string(),
            proposed: proposed.to_string(),
        })? {
            Answer::Overwrite(a) => Ok(a),
            other => Err(eyre!("expected an overwrite answer, got {other:?}")),
        }
    }

    fn ask_use_for_all(
        &mut self,
        english: &str,
        candidates: &[ResourceEntry],
        proposed: &str,
    ) -> Result<UseForAllAnswer> {
        match self.ask(Question::UseForAll {
            english: english.to_string(),
            candidates: candidates.to_vec(),
            proposed: proposed.to_string(),
        })? {
            Answer::UseForAll(a) => Ok(a),
            other => Err(eyre!("expected a use-for-all answer, got {other:?}")),
        }
    }

    fn ask_use_for_key(&mut self, key: &str, proposed: &str) -> Result<UseForKeyAnswer> {
        match self.ask(Question::UseForKey {
            key: key.to_string(),
            proposed: proposed.to_string(),
        })? {
            Answer::UseForKey(a) => Ok(a),
            other => Err(eyre!("expected a use-for-key answer, got {other:?}")),
        }
    }
}

pub enum JobKind {
    Table { table: PathBuf, sheet: usize },
    Online { provider: Box<dyn TranslationProvider> },
}

pub struct RunJob {
    pub source: PathBuf,
    pub target: PathBuf,
    pub kind: JobKind,
    pub options: SyncOptions,
}

/// Interactive side of a running job. Iterating yields events in commit
/// order and ends after [`WorkerEvent::Finished`].
pub struct RunHandle {
    events: Receiver<WorkerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl Iterator for RunHandle {
    type Item = WorkerEvent;

    fn next(&mut self) -> Option<WorkerEvent> {
        match self.events.recv() {
            Ok(ev) => Some(ev),
            Err(_) => {
                if let Some(t) = self.thread.take() {
                    if t.join().is_err() {
                        tracing::error!(event = "worker_panicked");
                    }
                }
                None
            }
        }
    }
}

pub fn spawn_run(job: RunJob) -> RunHandle {
    let (tx, rx) = mpsc::channel();
    let thread = std::thread::spawn(move || {
        let mut decisions = ChannelDecisions::new(tx.clone());
        let items = tx.clone();
        let mut sink = move |item: TranslatedItem| {
            let _ = items.send(WorkerEvent::Item(item));
        };
        let summary = match &job.kind {
            JobKind::Table { table, sheet } => sync_from_table(
                &job.source,
                &job.target,
                table,
                *sheet,
                job.options,
                &mut decisions,
                &mut sink,
            ),
            JobKind::Online { provider } => sync_online(
                &job.source,
                &job.target,
                provider.as_ref(),
                job.options,
                &mut decisions,
                &mut sink,
            ),
        };
        let _ = tx.send(WorkerEvent::Finished(summary));
    });
    RunHandle {
        events: rx,
        thread: Some(thread),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EN: &str = r#"<root>
  <data name="Save" xml:space="preserve"><value>Save</value></data>
  <data name="SaveAs" xml:space="preserve"><value>Save</value></data>
  <data name="Open" xml:space="preserve"><value>Open</value></data>
</root>"#;

    fn job(dir: &std::path::Path, table: &str) -> RunJob {
        let source = dir.join("en.resx");
        let target = dir.join("es.resx");
        let csv = dir.join("t.csv");
        fs::write(&source, EN).unwrap();
        fs::write(&target, "<root>\n</root>\n").unwrap();
        fs::write(&csv, table).unwrap();
        RunJob {
            source,
            target,
            kind: JobKind::Table { table: csv, sheet: 1 },
            options: SyncOptions::default(),
        }
    }

    #[test]
    fn questions_are_answered_from_the_interactive_side() {
        let dir = tempfile::tempdir().unwrap();
        let handle = spawn_run(job(dir.path(), "a\nb\nc\n,Save,Guardar\n,Open,Abrir\n"));

        let mut asked = Vec::new();
        let mut items = Vec::new();
        let mut summary = None;
        for ev in handle {
            match ev {
                WorkerEvent::Ask(p) => {
                    let answer = match &p.question {
                        Question::UseForAll { .. } => Answer::UseForAll(UseForAllAnswer::No),
                        Question::UseForKey { key, .. } if key == "Save" => Answer::UseForKey(UseForKeyAnswer::Yes),
                        _ => Answer::UseForKey(UseForKeyAnswer::No),
                    };
                    asked.push(p.question.clone());
                    p.reply(answer);
                }
                WorkerEvent::Item(i) => items.push(i.key),
                WorkerEvent::Finished(s) => summary = Some(s),
            }
        }

        assert_eq!(asked.len(), 3);
        assert_eq!(items, ["Save", "Open"]);
        let summary = summary.unwrap();
        assert_eq!(summary.written, 2);
        assert!(summary.failure.is_none());
        assert!(fs::read_to_string(dir.path().join("es.resx")).unwrap().contains("Abrir"));
    }

    #[test]
    fn dismissed_prompt_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let handle = spawn_run(job(dir.path(), "a\nb\nc\n,Open,Abrir\n,Save,Guardar\n"));
        let mut failure = None;
        for ev in handle {
            match ev {
                WorkerEvent::Ask(p) => drop(p),
                WorkerEvent::Item(_) => {}
                WorkerEvent::Finished(s) => failure = s.failure,
            }
        }
        assert_eq!(failure.as_deref(), Some("prompt was dismissed without an answer"));
        assert!(fs::read_to_string(dir.path().join("es.resx")).unwrap().contains("Abrir"));
    }
}
