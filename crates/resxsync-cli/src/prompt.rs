use std::io::{BufRead, Write};

use color_eyre::eyre::eyre;
use resxsync_core::{OverwriteAnswer, Result, UseForAllAnswer, UseForKeyAnswer};
use resxsync_services::{Answer, DecisionPort, Question, ResourceEntry};

/// Asks on a terminal: question to `output`, one-letter answer from `input`.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Answer a question relayed from the background worker.
    pub fn answer(&mut self, question: &Question) -> Result<Answer> {
        Ok(match question {
            Question::Overwrite {
                key,
                existing,
                proposed,
            } => Answer::Overwrite(self.ask_overwrite(key, existing, proposed)?),
            Question::UseForAll {
                english,
                candidates,
                proposed,
            } => Answer::UseForAll(self.ask_use_for_all(english, candidates, proposed)?),
            Question::UseForKey { key, proposed } => Answer::UseForKey(self.ask_use_for_key(key, proposed)?),
        })
    }

    /// Loop until one of `choices` is typed. The first choice is the default on empty input.
    fn choose(&mut self, prompt: &str, choices: &[(char, &str)]) -> Result<char> {
        let menu: Vec<String> = choices.iter().map(|(c, label)| format!("[{c}] {label}")).collect();
        loop {
            write!(self.output, "{prompt} {} ", menu.join(" "))?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(eyre!("input closed while waiting for an answer"));
            }
            let typed = line.trim().to_lowercase();
            if typed.is_empty() {
                return Ok(choices[0].0);
            }
            if let Some((c, _)) = choices
                .iter()
                .find(|(c, label)| typed.starts_with(*c) && (typed.len() == 1 || label.to_lowercase() == typed))
            {
                return Ok(*c);
            }
            writeln!(self.output, "Please answer one of: {}", menu.join(", "))?;
        }
    }
}

impl<R: BufRead, W: Write> DecisionPort for ConsolePrompt<R, W> {
    fn ask_overwrite(&mut self, key: &str, existing: &str, proposed: &str) -> Result<OverwriteAnswer> {
        writeln!(self.output, "A value already exists in the targeted resource file.")?;
        writeln!(self.output, "  key:         {key}")?;
        writeln!(self.output, "  existing:    {existing}")?;
        writeln!(self.output, "  translation: {proposed}")?;
        let c = self.choose(
            "Do you wish to overwrite the existing value with the newly translated one?",
            &[('n', "no"), ('y', "yes"), ('a', "all"), ('c', "cancel")],
        )?;
        Ok(match c {
            'y' => OverwriteAnswer::Yes,
            'a' => OverwriteAnswer::YesToAll,
            'c' => OverwriteAnswer::Cancel,
            _ => OverwriteAnswer::No,
        })
    }

    fn ask_use_for_all(
        &mut self,
        english: &str,
        candidates: &[ResourceEntry],
        proposed: &str,
    ) -> Result<UseForAllAnswer> {
        writeln!(self.output, "The value \"{english}\" exists for multiple keys.")?;
        for c in candidates {
            writeln!(self.output, "\tKey:{} => Value:{}", c.key, c.value)?;
        }
        let c = self.choose(
            &format!("Use translation \"{proposed}\" for all keys?"),
            &[('y', "yes"), ('a', "all"), ('n', "no"), ('c', "cancel")],
        )?;
        Ok(match c {
            'a' => UseForAllAnswer::YesToAll,
            'n' => UseForAllAnswer::No,
            'c' => UseForAllAnswer::Cancel,
            _ => UseForAllAnswer::Yes,
        })
    }

    fn ask_use_for_key(&mut self, key: &str, proposed: &str) -> Result<UseForKeyAnswer> {
        let c = self.choose(
            &format!("Use translation \"{proposed}\" for key \"{key}\"?"),
            &[('y', "yes"), ('n', "no")],
        )?;
        Ok(if c == 'y' {
            UseForKeyAnswer::Yes
        } else {
            UseForKeyAnswer::No
        })
    }
}
