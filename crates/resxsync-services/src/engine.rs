//! The merge loop. One translation unit at a time: resolve the target keys,
//! decide whether to write, write, notify.

use resxsync_core::{
    Resolution, Result, TranslatedItem, TranslationEntry, UseForAllAnswer, UseForKeyAnswer,
};
use resxsync_resx::{Doc, ResourceEntry, ResourceStore};
use resxsync_translate::TranslationProvider;

use crate::decisions::DecisionPort;
use crate::validate::placeholder_mismatch;

/// What happened to one incoming unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Number of keys written.
    Written(usize),
    Skipped,
    Warning,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub written: usize,
    pub skipped: usize,
    pub warnings: usize,
}

/// State of one merge run. `overwrite_all` and `cancelled` live as long as
/// the run, not the row.
pub struct MergeRun<'a> {
    store: &'a mut ResourceStore,
    decisions: &'a mut dyn DecisionPort,
    sink: &'a mut dyn FnMut(TranslatedItem),
    overwrite_all: bool,
    cancelled: bool,
    counters: RunCounters,
}

impl<'a> MergeRun<'a> {
    pub fn new(
        store: &'a mut ResourceStore,
        decisions: &'a mut dyn DecisionPort,
        sink: &'a mut dyn FnMut(TranslatedItem),
    ) -> Self {
        Self {
            store,
            decisions,
            sink,
            overwrite_all: false,
            cancelled: false,
            counters: RunCounters::default(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn overwrite_all(&self) -> bool {
        self.overwrite_all
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Spreadsheet-driven processing of one row.
    pub fn apply_entry(&mut self, entry: &TranslationEntry) -> Result<UnitOutcome> {
        if self.cancelled {
            return Ok(UnitOutcome::Cancelled);
        }
        let translated = entry.translated_value.as_str();
        if translated.trim().is_empty() {
            self.counters.skipped += 1;
            return Ok(UnitOutcome::Skipped);
        }

        if let Some(key) = entry.key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(self.commit_one(key, &entry.english_value, translated));
        }

        let candidates = self.store.lookup_by_value(Doc::Source, &entry.english_value);
        match candidates.len() {
            0 => {
                tracing::warn!(event = "no_source_key", english = %entry.english_value);
                self.counters.warnings += 1;
                (self.sink)(TranslatedItem::missing_source(&entry.english_value));
                Ok(UnitOutcome::Warning)
            }
            1 => Ok(self.commit_one(&candidates[0].key, &candidates[0].value, translated)),
            _ => self.resolve_ambiguous(&entry.english_value, &candidates, translated),
        }
    }

    fn resolve_ambiguous(
        &mut self,
        english: &str,
        candidates: &[ResourceEntry],
        translated: &str,
    ) -> Result<UnitOutcome> {
        let answer = if self.overwrite_all {
            UseForAllAnswer::Yes
        } else {
            self.decisions.ask_use_for_all(english, candidates, translated)?
        };
        tracing::debug!(event = "ambiguous_value", english = english, candidates = candidates.len(), answer = ?answer);

        match answer {
            UseForAllAnswer::YesToAll => {
                self.overwrite_all = true;
                Ok(self.commit_all(candidates, translated))
            }
            UseForAllAnswer::Yes => Ok(self.commit_all(candidates, translated)),
            UseForAllAnswer::No => {
                let mut written = 0;
                for c in candidates {
                    match self.decisions.ask_use_for_key(&c.key, translated)? {
                        UseForKeyAnswer::Yes => {
                            if self.commit(&c.key, &c.value, translated) {
                                written += 1;
                            }
                        }
                        UseForKeyAnswer::No => self.counters.skipped += 1,
                    }
                }
                Ok(if written == 0 {
                    UnitOutcome::Skipped
                } else {
                    UnitOutcome::Written(written)
                })
            }
            UseForAllAnswer::Cancel => {
                self.cancelled = true;
                Ok(UnitOutcome::Cancelled)
            }
        }
    }

    pub fn run_table(&mut self, entries: &[TranslationEntry]) -> Result<()> {
        for entry in entries {
            if self.apply_entry(entry)? == UnitOutcome::Cancelled {
                break;
            }
        }
        Ok(())
    }

    /// Online-translation-driven processing: every source entry is sent
    /// through `provider` and written to the same key in the target.
    pub fn run_online(&mut self, provider: &dyn TranslationProvider) -> Result<()> {
        for source in self.store.all_entries(Doc::Source) {
            if self.cancelled {
                break;
            }
            let translated = provider.translate(&source.value);
            if translated.trim().is_empty() {
                self.counters.skipped += 1;
                continue;
            }
            let existing = self.store.get_by_key(Doc::Target, &source.key);

            let resolution = if self.overwrite_all {
                Resolution::OverwriteAll
            } else {
                self.resolve_overwrite(&source.key, &existing, &translated)?
            };
            match resolution {
                Resolution::Cancel => {
                    self.cancelled = true;
                    break;
                }
                Resolution::Skip => {
                    self.counters.skipped += 1;
                    continue;
                }
                Resolution::OverwriteAll => self.overwrite_all = true,
                Resolution::Overwrite => {}
            }
            self.commit(&source.key, &source.value, &translated);
        }
        Ok(())
    }

    fn resolve_overwrite(&mut self, key: &str, existing: &str, proposed: &str) -> Result<Resolution> {
        if existing.trim().is_empty() {
            return Ok(Resolution::Overwrite);
        }
        if existing.to_lowercase() == proposed.to_lowercase() {
            return Ok(Resolution::Skip);
        }
        Ok(self.decisions.ask_overwrite(key, existing, proposed)?.into())
    }

    fn commit_one(&mut self, key: &str, english: &str, translated: &str) -> UnitOutcome {
        if self.commit(key, english, translated) {
            UnitOutcome::Written(1)
        } else {
            UnitOutcome::Warning
        }
    }

    fn commit_all(&mut self, candidates: &[ResourceEntry], translated: &str) -> UnitOutcome {
        let mut written = 0;
        for c in candidates {
            if self.commit(&c.key, &c.value, translated) {
                written += 1;
            }
        }
        if written == 0 {
            UnitOutcome::Warning
        } else {
            UnitOutcome::Written(written)
        }
    }

    /// Write one key and notify. Keys held by typed payloads in the target
    /// are reported as warnings instead. Returns whether the write happened.
    fn commit(&mut self, key: &str, english: &str, translated: &str) -> bool {
        if self.store.document(Doc::Target).is_typed_key(key) {
            tracing::warn!(event = "typed_target_key", key = key);
            self.counters.warnings += 1;
            (self.sink)(TranslatedItem::typed_target(key, english));
            return false;
        }
        self.store.write(key, translated, true);
        self.counters.written += 1;

        // placeholders are checked against the source text of the key
        let reference = self
            .store
            .document(Doc::Source)
            .value_of(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| english.to_string());
        let mut item = TranslatedItem::written(key, english, translated);
        if !reference.trim().is_empty() {
            if let Some(note) = placeholder_mismatch(&reference, translated) {
                item = item.with_comment(note);
            }
        }
        tracing::debug!(event = "translated", key = key);
        (self.sink)(item);
        true
    }
}
