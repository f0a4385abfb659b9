//! Yes/no confirmations.
//!
//! Library code never reads the terminal. Anything that needs a decision
//! asks an [`Interaction`], which either answers from an injected decider or,
//! in unattended mode, answers yes and logs that it did.

use crate::bundler::error::{Error, Result};
use std::{
    fmt,
    io::{self, BufRead, Write},
    sync::Arc,
};

/// A function deciding a yes/no question.
pub type Decider = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Source of confirmation answers for one run.
#[derive(Clone)]
pub struct Interaction {
    unattended: bool,
    decider: Decider,
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("unattended", &self.unattended)
            .finish_non_exhaustive()
    }
}

impl Interaction {
    /// Uses `decider` unless `unattended` is set.
    pub fn new(unattended: bool, decider: Decider) -> Self {
        Self {
            unattended,
            decider,
        }
    }

    /// Answers yes to everything.
    pub fn unattended() -> Self {
        Self::new(true, Arc::new(|_| true))
    }

    /// Answers no to everything without prompting.
    ///
    /// For read-only runs that must not create anything.
    pub fn declining() -> Self {
        Self::new(false, Arc::new(|_| false))
    }

    /// Prompts on stdin/stdout unless `unattended` is set.
    pub fn terminal(unattended: bool) -> Self {
        Self::new(unattended, Arc::new(prompt_terminal))
    }

    /// Whether confirmations are answered automatically.
    pub fn is_unattended(&self) -> bool {
        self.unattended
    }

    /// Asks a question.
    pub fn confirm(&self, question: &str) -> bool {
        if self.unattended {
            log::info!("{question} [yes: unattended]");
            return true;
        }
        (self.decider)(question)
    }

    /// Asks a question and turns a "no" into [`Error::UserCancelled`].
    pub fn require(&self, question: &str) -> Result<()> {
        if self.confirm(question) {
            Ok(())
        } else {
            Err(Error::UserCancelled(question.to_string()))
        }
    }
}

fn prompt_terminal(question: &str) -> bool {
    let mut stdout = io::stdout();
    if write!(stdout, "{question} [y/N] ").and_then(|_| stdout.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unattended_never_calls_decider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let interaction = Interaction::new(
            true,
            Arc::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                false
            }),
        );
        assert!(interaction.confirm("delete?"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn declining_answers_no() {
        let interaction = Interaction::declining();
        assert!(!interaction.is_unattended());
        assert!(!interaction.confirm("create?"));
    }

    #[test]
    fn declined_requirement_is_cancellation() {
        let interaction = Interaction::new(false, Arc::new(|_| false));
        let err = interaction.require("continue?").unwrap_err();
        assert!(err.is_cancelled());
    }
}
