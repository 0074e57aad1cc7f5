//! Terminal prompts.

use dialoguer::Select;
use fundpie::{SelectError, Selector};

/// Asks on the terminal when there is more than one candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSelector;

impl Selector for PromptSelector {
    fn select_one(&self, prompt: &str, candidates: &[String]) -> Result<Option<usize>, SelectError> {
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(Some(0)),
            _ => Select::new()
                .with_prompt(prompt)
                .items(candidates)
                .default(0)
                .interact_opt()
                .map_err(|e| SelectError::Prompt(e.to_string()))?
                .map(Some)
                .ok_or(SelectError::Cancelled),
        }
    }
}
