//! Content generation: one branch per output category.
//!
//! Each branch tries the LLM first and degrades to the template library on any
//! gateway failure or unusable output. A branch never returns an error.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generation::prompts::{
    BEHAVIORAL_PROMPT_TEMPLATE, CHECKLIST_PROMPT_TEMPLATE, COACHING_PROMPT_TEMPLATE,
    TECHNICAL_PROMPT_TEMPLATE,
};
use crate::generation::templates;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, LIST_ONLY_INSTRUCTION};
use crate::llm_client::{GatewayError, TextGenerator};
use crate::models::interview::{Category, GenerationResult, JobPosting, RequirementSet};

/// Why a branch abandoned the LLM path. Always absorbed into a fallback.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("parsed {got} items from LLM output, need at least {min}")]
    ParseShortfall { min: usize, got: usize },

    #[error("LLM output has {got} characters, need at least {min}")]
    TooShort { min: usize, got: usize },
}

/// Generates one section of the bundle.
#[derive(Clone)]
pub struct ContentGenerator {
    category: Category,
    /// `None` runs the branch in template-only mode.
    llm: Option<Arc<dyn TextGenerator>>,
    llm_timeout: Duration,
}

impl ContentGenerator {
    pub fn new(
        category: Category,
        llm: Option<Arc<dyn TextGenerator>>,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            category,
            llm,
            llm_timeout,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub async fn generate(
        &self,
        requirements: &RequirementSet,
        posting: &JobPosting,
    ) -> GenerationResult {
        let Some(llm) = self.llm.as_deref() else {
            debug!(category = ?self.category, "No text generator configured, using templates");
            return fallback_result(self.category, requirements, posting);
        };

        match self.generate_with_llm(llm, requirements, posting).await {
            Ok(items) => {
                info!(category = ?self.category, items = items.len(), "Branch completed from LLM");
                GenerationResult::from_llm(self.category, items)
            }
            Err(e) => {
                warn!(category = ?self.category, error = %e, "Branch falling back to templates");
                fallback_result(self.category, requirements, posting)
            }
        }
    }

    async fn generate_with_llm(
        &self,
        llm: &dyn TextGenerator,
        requirements: &RequirementSet,
        posting: &JobPosting,
    ) -> Result<Vec<String>, BranchError> {
        let prompt = build_prompt(self.category, requirements, posting);
        let completion = llm
            .complete(&prompt, self.category.max_tokens(), self.llm_timeout)
            .await?;

        let mut items = parse_items(&completion.text);

        // The company-aware opener leads the behavioral section on both paths.
        if self.category == Category::Behavioral {
            let opener = templates::behavioral_opener(&posting.company, &posting.title);
            items.retain(|q| !q.eq_ignore_ascii_case(&opener));
            check_minimum(self.category, items.len())?;
            items.insert(0, opener);
        } else {
            check_minimum(self.category, items.len())?;
        }

        items.truncate(self.category.expected_items());
        Ok(items)
    }
}

fn check_minimum(category: Category, got: usize) -> Result<(), BranchError> {
    let min = category.min_items();
    if got < min {
        return Err(BranchError::ParseShortfall { min, got });
    }
    Ok(())
}

/// Template-sourced items for a category. Pure, never blocks.
pub fn template_items(
    category: Category,
    requirements: &RequirementSet,
    posting: &JobPosting,
) -> Vec<String> {
    match category {
        Category::Technical => templates::technical_questions(requirements.specialization),
        Category::Behavioral => templates::behavioral_questions(&posting.company, &posting.title),
        Category::Coaching => templates::coaching_tips(requirements),
        Category::Checklist => templates::preparation_checklist(&posting.company, &posting.title),
    }
}

pub fn fallback_result(
    category: Category,
    requirements: &RequirementSet,
    posting: &JobPosting,
) -> GenerationResult {
    GenerationResult::fallback(category, template_items(category, requirements, posting))
}

/// Builds the category prompt by filling the template from the requirement set.
pub fn build_prompt(
    category: Category,
    requirements: &RequirementSet,
    posting: &JobPosting,
) -> String {
    let (template, count) = match category {
        Category::Technical => (TECHNICAL_PROMPT_TEMPLATE, category.expected_items()),
        // The opener is added locally, so ask for one fewer.
        Category::Behavioral => (BEHAVIORAL_PROMPT_TEMPLATE, category.expected_items() - 1),
        Category::Coaching => (COACHING_PROMPT_TEMPLATE, category.expected_items()),
        Category::Checklist => (CHECKLIST_PROMPT_TEMPLATE, category.expected_items()),
    };

    let technologies = if requirements.technologies.is_empty() {
        "none specified".to_string()
    } else {
        requirements.technologies.join(", ")
    };
    let company = match posting.company.trim() {
        "" => "an undisclosed company",
        c => c,
    };

    template
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{list_instruction}", LIST_ONLY_INSTRUCTION)
        .replace("{count}", &count.to_string())
        .replace("{seniority}", requirements.seniority.as_str())
        .replace("{specialization}", requirements.specialization.as_str())
        .replace("{technologies}", &technologies)
        .replace("{requirements}", &requirements.requirements.join("; "))
        .replace("{company}", company)
        .replace("{title}", posting.title.trim())
}

/// Splits LLM output into list items.
///
/// Accepts a JSON array of strings (optionally fenced) or free text split on
/// newlines and `•` bullets. List markers and heading lines are dropped, and
/// duplicates are removed case-insensitively.
pub fn parse_items(text: &str) -> Vec<String> {
    let text = strip_code_fences(text);

    let candidates: Vec<String> = match serde_json::from_str::<Vec<String>>(text) {
        Ok(items) => items,
        Err(_) => text
            .lines()
            .flat_map(|line| line.split('•'))
            .map(|piece| strip_list_marker(piece).to_string())
            .collect(),
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && !item.ends_with(':'))
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Removes a leading bullet or numbering marker: `-`, `*`, `1.`, `2)`, `Q3:`.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim().trim_start_matches(&['-', '*', '+'][..]).trim_start();

    let numbered = line
        .strip_prefix(&['Q', 'q'][..])
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(line);
    let digits = numbered.len()
        - numbered
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .len();
    if digits == 0 {
        return line;
    }

    match numbered[digits..].strip_prefix(&['.', ')', ':'][..]) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}
