use serde::{Deserialize, Serialize};

use crate::models::interview::{BranchStatus, ContentSource, JobPosting};

/// What the candidate tells us about themselves. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverLetterRequest {
    pub posting: JobPosting,
    #[serde(default)]
    pub profile: CandidateProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverLetter {
    pub text: String,
    pub source: ContentSource,
    pub status: BranchStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectionRequest {
    pub posting: JobPosting,
    #[serde(default)]
    pub profile: CandidateProfile,
    /// Free-text notes the candidate kept about the application.
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionAnalysis {
    pub analysis: String,
    pub recommendations: Vec<String>,
    /// Up to three posting technologies the candidate did not list.
    pub skill_focus_areas: Vec<String>,
    pub source: ContentSource,
    pub status: BranchStatus,
}
