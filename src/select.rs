//! Choosing one of several candidates.
//!
//! Interactive front-ends implement [`Selector`] with a prompt; tests and
//! unattended runs use [`FirstMatch`].

use crate::error::SelectError;

/// Picks one candidate by index.
pub trait Selector {
    /// Return the chosen index, or `None` if there are no candidates.
    ///
    /// Implementations must return `Some(0)` for a single candidate without
    /// asking anyone.
    fn select_one(&self, prompt: &str, candidates: &[String]) -> Result<Option<usize>, SelectError>;
}

/// Always picks the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl Selector for FirstMatch {
    fn select_one(&self, _prompt: &str, candidates: &[String]) -> Result<Option<usize>, SelectError> {
        Ok(if candidates.is_empty() { None } else { Some(0) })
    }
}

impl<S: Selector + ?Sized> Selector for Box<S> {
    fn select_one(&self, prompt: &str, candidates: &[String]) -> Result<Option<usize>, SelectError> {
        (**self).select_one(prompt, candidates)
    }
}
