use resxsync_core::{OverwriteAnswer, Result, UseForAllAnswer, UseForKeyAnswer};
use resxsync_resx::ResourceEntry;

/// Where the engine sends its questions. Implementations may block for as
/// long as the user needs; an error aborts the run.
pub trait DecisionPort {
    /// `key` already holds `existing`; replace it with `proposed`?
    fn ask_overwrite(&mut self, key: &str, existing: &str, proposed: &str) -> Result<OverwriteAnswer>;

    /// `english` matches every key in `candidates`; use `proposed` for all of them?
    fn ask_use_for_all(
        &mut self,
        english: &str,
        candidates: &[ResourceEntry],
        proposed: &str,
    ) -> Result<UseForAllAnswer>;

    fn ask_use_for_key(&mut self, key: &str, proposed: &str) -> Result<UseForKeyAnswer>;
}

/// Answer given to every prompt of an unattended run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assume {
    Yes,
    YesToAll,
    #[default]
    No,
    Cancel,
}

impl std::str::FromStr for Assume {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Self::Yes),
            "yes-to-all" | "all" | "a" => Ok(Self::YesToAll),
            "no" | "n" => Ok(Self::No),
            "cancel" | "c" => Ok(Self::Cancel),
            other => Err(format!("unknown answer `{other}` (expected yes, yes-to-all, no or cancel)")),
        }
    }
}

/// Batch decision port: the same answer for every question.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAnswer {
    pub answer: Assume,
}

impl AutoAnswer {
    pub fn new(answer: Assume) -> Self {
        Self { answer }
    }
}

impl DecisionPort for AutoAnswer {
    fn ask_overwrite(&mut self, key: &str, _existing: &str, _proposed: &str) -> Result<OverwriteAnswer> {
        tracing::debug!(event = "auto_answer", question = "overwrite", key = key, answer = ?self.answer);
        Ok(match self.answer {
            Assume::Yes => OverwriteAnswer::Yes,
            Assume::YesToAll => OverwriteAnswer::YesToAll,
            Assume::No => OverwriteAnswer::No,
            Assume::Cancel => OverwriteAnswer::Cancel,
        })
    }

    fn ask_use_for_all(
        &mut self,
        english: &str,
        candidates: &[ResourceEntry],
        _proposed: &str,
    ) -> Result<UseForAllAnswer> {
        tracing::debug!(
            event = "auto_answer",
            question = "use_for_all",
            english = english,
            candidates = candidates.len(),
            answer = ?self.answer,
        );
        Ok(match self.answer {
            Assume::Yes => UseForAllAnswer::Yes,
            Assume::YesToAll => UseForAllAnswer::YesToAll,
            Assume::No => UseForAllAnswer::No,
            Assume::Cancel => UseForAllAnswer::Cancel,
        })
    }

    fn ask_use_for_key(&mut self, _key: &str, _proposed: &str) -> Result<UseForKeyAnswer> {
        Ok(match self.answer {
            Assume::Yes | Assume::YesToAll => UseForKeyAnswer::Yes,
            Assume::No | Assume::Cancel => UseForKeyAnswer::No,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_parses_long_and_short_forms() {
        assert_eq!("yes-to-all".parse::<Assume>().unwrap(), Assume::YesToAll);
        assert_eq!("N".parse::<Assume>().unwrap(), Assume::No);
        assert_eq!(" cancel ".parse::<Assume>().unwrap(), Assume::Cancel);
        assert!("maybe".parse::<Assume>().is_err());
    }

    #[test]
    fn auto_no_never_approves_a_single_key() {
        let mut port = AutoAnswer::default();
        assert_eq!(port.ask_use_for_key("A", "x").unwrap(), UseForKeyAnswer::No);
        assert_eq!(port.ask_overwrite("A", "old", "new").unwrap(), OverwriteAnswer::No);
        let mut port = AutoAnswer::new(Assume::YesToAll);
        assert_eq!(port.ask_use_for_key("A", "x").unwrap(), UseForKeyAnswer::Yes);
    }
}
