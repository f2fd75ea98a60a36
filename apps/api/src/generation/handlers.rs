//! Axum route handlers for the Interview Prep API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::requirements::extract_requirements;
use crate::generation::templates::next_actions;
use crate::models::application::{
    CoverLetter, CoverLetterRequest, RejectionAnalysis, RejectionRequest,
};
use crate::models::interview::{InterviewPrepBundle, JobPosting, RequirementSet};
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 300;
const MAX_COMPANY_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 50_000;
const MAX_NOTES_CHARS: usize = 5_000;
const MAX_SKILLS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NextActionsQuery {
    pub status: String,
    #[serde(default)]
    pub days_since_applied: u32,
}

#[derive(Debug, Serialize)]
pub struct NextActionsResponse {
    pub status: String,
    pub next_actions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interview-prep
///
/// Runs the full pipeline. Always answers with a complete bundle unless the
/// posting itself is unusable.
pub async fn handle_interview_prep(
    State(state): State<AppState>,
    Json(posting): Json<JobPosting>,
) -> Result<Json<InterviewPrepBundle>, AppError> {
    check_sizes(&posting)?;

    let bundle = state.orchestrator.generate_interview_prep(posting).await?;

    Ok(Json(bundle))
}

/// POST /api/v1/interview-prep/requirements
///
/// Previews extraction without generating any content.
pub async fn handle_extract_requirements(
    Json(posting): Json<JobPosting>,
) -> Result<Json<RequirementSet>, AppError> {
    check_sizes(&posting)?;
    posting.validate()?;

    Ok(Json(extract_requirements(&posting)))
}

/// POST /api/v1/cover-letter
///
/// Always returns a letter; `status` says whether the LLM or a template wrote it.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetter>, AppError> {
    check_sizes(&request.posting)?;
    check_skills(request.profile.skills.len())?;

    let letter = state.documents.cover_letter(&request).await?;

    Ok(Json(letter))
}

/// POST /api/v1/rejection-analysis
pub async fn handle_rejection_analysis(
    State(state): State<AppState>,
    Json(request): Json<RejectionRequest>,
) -> Result<Json<RejectionAnalysis>, AppError> {
    check_sizes(&request.posting)?;
    check_skills(request.profile.skills.len())?;
    if request.notes.chars().count() > MAX_NOTES_CHARS {
        return Err(AppError::Validation(format!(
            "notes exceeds {MAX_NOTES_CHARS} characters"
        )));
    }

    let analysis = state.documents.analyze_rejection(&request).await?;

    Ok(Json(analysis))
}

/// GET /api/v1/next-actions?status=applied&days_since_applied=10
pub async fn handle_next_actions(
    Query(query): Query<NextActionsQuery>,
) -> Result<Json<NextActionsResponse>, AppError> {
    let status = query.status.trim().to_lowercase();
    if status.is_empty() {
        return Err(AppError::Validation("status cannot be empty".to_string()));
    }

    let next_actions = next_actions(&status, query.days_since_applied);
    Ok(Json(NextActionsResponse {
        status,
        next_actions,
    }))
}

fn check_skills(count: usize) -> Result<(), AppError> {
    if count > MAX_SKILLS {
        return Err(AppError::Validation(format!(
            "profile lists more than {MAX_SKILLS} skills"
        )));
    }
    Ok(())
}

fn check_sizes(posting: &JobPosting) -> Result<(), AppError> {
    let fields = [
        ("title", &posting.title, MAX_TITLE_CHARS),
        ("company", &posting.company, MAX_COMPANY_CHARS),
        ("description", &posting.description, MAX_DESCRIPTION_CHARS),
    ];
    for (name, value, max) in fields {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{name} exceeds {max} characters"
            )));
        }
    }
    Ok(())
}
