use serde::{Deserialize, Serialize};

use crate::errors::ExtractionError;

/// A job posting as handed to the pipeline by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
}

impl JobPosting {
    /// Rejects postings with nothing to extract from. A blank company is fine.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err(ExtractionError::EmptyPosting);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Lead,
    #[default]
    Unknown,
}

impl Seniority {
    pub fn as_str(self) -> &'static str {
        match self {
            Seniority::Junior => "junior",
            Seniority::Mid => "mid",
            Seniority::Senior => "senior",
            Seniority::Lead => "lead",
            Seniority::Unknown => "unknown",
        }
    }

    pub fn is_leadership(self) -> bool {
        matches!(self, Seniority::Senior | Seniority::Lead)
    }

    /// Rank used to break ties when several seniority keywords appear together.
    pub fn rank(self) -> u8 {
        match self {
            Seniority::Unknown => 0,
            Seniority::Junior => 1,
            Seniority::Mid => 2,
            Seniority::Senior => 3,
            Seniority::Lead => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Data,
    #[default]
    Unknown,
}

impl Specialization {
    pub fn as_str(self) -> &'static str {
        match self {
            Specialization::Frontend => "frontend",
            Specialization::Backend => "backend",
            Specialization::Fullstack => "fullstack",
            Specialization::Devops => "devops",
            Specialization::Data => "data",
            Specialization::Unknown => "unknown",
        }
    }
}

/// Normalized tags and derived requirement strings for one posting.
///
/// Built once per request and shared read-only with every branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub seniority: Seniority,
    pub specialization: Specialization,
    pub technologies: Vec<String>,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Behavioral,
    Coaching,
    Checklist,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Behavioral,
        Category::Coaching,
        Category::Checklist,
    ];

    /// Name reported in `agents_used`.
    pub fn agent_name(self) -> &'static str {
        match self {
            Category::Technical => "technical_agent",
            Category::Behavioral => "behavioral_agent",
            Category::Coaching => "coaching_agent",
            Category::Checklist => "checklist_agent",
        }
    }

    /// Number of items a complete section carries.
    pub fn expected_items(self) -> usize {
        match self {
            Category::Technical | Category::Behavioral => 5,
            Category::Coaching => 7,
            Category::Checklist => 12,
        }
    }

    /// Fewest parsed LLM items accepted before the branch falls back.
    pub fn min_items(self) -> usize {
        match self {
            Category::Technical | Category::Behavioral => 3,
            Category::Coaching => 4,
            Category::Checklist => 8,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Category::Technical => 600,
            Category::Behavioral | Category::Coaching => 500,
            Category::Checklist => 700,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Llm,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Completed,
    Fallback,
    Failed,
}

/// Output of one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub category: Category,
    pub items: Vec<String>,
    pub source: ContentSource,
    pub status: BranchStatus,
}

impl GenerationResult {
    pub fn from_llm(category: Category, items: Vec<String>) -> Self {
        Self {
            category,
            items,
            source: ContentSource::Llm,
            status: BranchStatus::Completed,
        }
    }

    pub fn fallback(category: Category, items: Vec<String>) -> Self {
        Self {
            category,
            items,
            source: ContentSource::Template,
            status: BranchStatus::Fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub status: BranchStatus,
}

/// The aggregated response handed back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewPrepBundle {
    pub role: String,
    pub company: String,
    pub key_requirements: Vec<String>,
    pub technical_questions: Vec<String>,
    pub behavioral_questions: Vec<String>,
    pub tips: Vec<String>,
    pub preparation_checklist: Vec<String>,
    pub agents_used: Vec<AgentStatus>,
}
