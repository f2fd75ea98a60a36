//! Application documents: cover letters and rejection analyses.
//!
//! Same contract as the interview-prep branches: one LLM attempt, then the
//! template library on any gateway failure or unusable output.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::errors::ExtractionError;
use crate::generation::content::BranchError;
use crate::generation::prompts::{COVER_LETTER_PROMPT_TEMPLATE, REJECTION_PROMPT_TEMPLATE};
use crate::generation::requirements::extract_requirements;
use crate::generation::templates::{self, or_default};
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::{GatewayError, TextGenerator};
use crate::models::application::{
    CandidateProfile, CoverLetter, CoverLetterRequest, RejectionAnalysis, RejectionRequest,
};
use crate::models::interview::{BranchStatus, ContentSource, JobPosting};

const COVER_LETTER_MAX_TOKENS: u32 = 500;
const REJECTION_MAX_TOKENS: u32 = 300;
const MIN_COVER_LETTER_CHARS: usize = 200;
const MIN_ANALYSIS_CHARS: usize = 60;
const DESCRIPTION_EXCERPT_CHARS: usize = 300;
const MAX_PROMPT_SKILLS: usize = 10;
const MAX_FOCUS_AREAS: usize = 3;

pub struct DocumentWriter {
    /// `None` writes every document from templates.
    llm: Option<Arc<dyn TextGenerator>>,
    llm_timeout: Duration,
}

impl DocumentWriter {
    pub fn new(llm: Option<Arc<dyn TextGenerator>>, llm_timeout: Duration) -> Self {
        Self { llm, llm_timeout }
    }

    pub async fn cover_letter(
        &self,
        request: &CoverLetterRequest,
    ) -> Result<CoverLetter, ExtractionError> {
        request.posting.validate()?;

        let prompt = cover_letter_prompt(&request.profile, &request.posting);
        let span = info_span!("cover_letter", role = %request.posting.title);
        let generated = self
            .generate_text(&prompt, COVER_LETTER_MAX_TOKENS, MIN_COVER_LETTER_CHARS)
            .instrument(span)
            .await;

        Ok(match generated {
            Some(text) => CoverLetter {
                text,
                source: ContentSource::Llm,
                status: BranchStatus::Completed,
            },
            None => CoverLetter {
                text: templates::cover_letter(&request.profile, &request.posting),
                source: ContentSource::Template,
                status: BranchStatus::Fallback,
            },
        })
    }

    pub async fn analyze_rejection(
        &self,
        request: &RejectionRequest,
    ) -> Result<RejectionAnalysis, ExtractionError> {
        request.posting.validate()?;

        let focus_areas = skill_focus_areas(&request.profile, &request.posting);
        let prompt = rejection_prompt(request);
        let span = info_span!("rejection_analysis", role = %request.posting.title);
        let generated = self
            .generate_text(&prompt, REJECTION_MAX_TOKENS, MIN_ANALYSIS_CHARS)
            .instrument(span)
            .await;

        let (analysis, source, status) = match generated {
            Some(text) => (text, ContentSource::Llm, BranchStatus::Completed),
            None => (
                templates::rejection_analysis(&request.posting, &focus_areas),
                ContentSource::Template,
                BranchStatus::Fallback,
            ),
        };

        Ok(RejectionAnalysis {
            analysis,
            recommendations: templates::rejection_recommendations(),
            skill_focus_areas: focus_areas,
            source,
            status,
        })
    }

    /// LLM text, or `None` when the caller should use its template.
    async fn generate_text(&self, prompt: &str, max_tokens: u32, min_chars: usize) -> Option<String> {
        let Some(llm) = self.llm.as_deref() else {
            debug!("No text generator configured, using template");
            return None;
        };

        match self.try_generate(llm, prompt, max_tokens, min_chars).await {
            Ok(text) => {
                info!(chars = text.len(), "Document generated from LLM");
                Some(text)
            }
            Err(e) => {
                warn!(error = %e, "Document falling back to template");
                None
            }
        }
    }

    async fn try_generate(
        &self,
        llm: &dyn TextGenerator,
        prompt: &str,
        max_tokens: u32,
        min_chars: usize,
    ) -> Result<String, BranchError> {
        // No branch timeout wraps document calls, so bound the call here.
        let completion = tokio::time::timeout(
            self.llm_timeout,
            llm.complete(prompt, max_tokens, self.llm_timeout),
        )
        .await
        .unwrap_or(Err(GatewayError::Timeout))?;

        let text = completion.text.trim().to_string();
        let got = text.chars().count();
        if got < min_chars {
            return Err(BranchError::TooShort { min: min_chars, got });
        }
        Ok(text)
    }
}

/// Posting technologies the candidate did not list, in order of appearance.
pub fn skill_focus_areas(profile: &CandidateProfile, posting: &JobPosting) -> Vec<String> {
    let known: HashSet<String> = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect();

    extract_requirements(posting)
        .technologies
        .into_iter()
        .filter(|t| !known.contains(&t.to_lowercase()))
        .take(MAX_FOCUS_AREAS)
        .collect()
}

fn cover_letter_prompt(profile: &CandidateProfile, posting: &JobPosting) -> String {
    let description: String = posting
        .description
        .trim()
        .chars()
        .take(DESCRIPTION_EXCERPT_CHARS)
        .collect();

    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{description}", or_none(&description))
        .replace("{name}", or_default(&profile.name, "The Applicant"))
        .replace("{experience_years}", &profile.experience_years.to_string())
        .replace("{skills}", &skills_line(profile))
        .replace("{company}", or_default(&posting.company, "an undisclosed company"))
        .replace("{title}", posting.title.trim())
}

fn rejection_prompt(request: &RejectionRequest) -> String {
    REJECTION_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{skills}", &skills_line(&request.profile))
        .replace(
            "{experience_years}",
            &request.profile.experience_years.to_string(),
        )
        .replace("{notes}", or_none(&request.notes))
        .replace(
            "{company}",
            or_default(&request.posting.company, "an undisclosed company"),
        )
        .replace("{title}", request.posting.title.trim())
}

fn skills_line(profile: &CandidateProfile) -> String {
    let skills = templates::listed_skills(profile, MAX_PROMPT_SKILLS);
    if skills.is_empty() {
        "none listed".to_string()
    } else {
        skills.join(", ")
    }
}

fn or_none(value: &str) -> &str {
    or_default(value, "none")
}
