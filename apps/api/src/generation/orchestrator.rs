//! Interview-prep orchestration: extraction once, then four concurrent branches.
//!
//! Flow: validate → extract_requirements → spawn 4 branches (each under its own
//!       timeout) → await under the request deadline → aggregate → bundle.
//!
//! Only `ExtractionError` reaches the caller. Every branch failure, timeout or
//! panic is force-resolved from the template library, so no section is ever empty.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::ExtractionError;
use crate::generation::content::{fallback_result, ContentGenerator};
use crate::generation::requirements::extract_requirements;
use crate::llm_client::TextGenerator;
use crate::models::interview::{
    AgentStatus, BranchStatus, Category, ContentSource, GenerationResult, InterviewPrepBundle,
    JobPosting, RequirementSet,
};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Budget for each branch, independent of the others.
    pub branch_timeout: Duration,
    /// Budget for the whole request; unresolved branches are cut off at this point.
    pub request_timeout: Duration,
    /// Timeout handed to each gateway call.
    pub llm_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            branch_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            llm_timeout: Duration::from_millis(2500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extracting,
    Dispatching,
    Awaiting,
    Aggregating,
    Done,
}

fn enter(stage: Stage) {
    debug!(?stage, "Pipeline stage");
}

/// A spawned branch. Its task yields `None` when the branch timeout elapsed.
///
/// Dropping the guard aborts the task, so a caller that abandons the request
/// also cancels every branch and the gateway call inside it.
struct BranchTask {
    category: Category,
    handle: JoinHandle<Option<GenerationResult>>,
}

impl Drop for BranchTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct InterviewPrepOrchestrator {
    generators: Vec<ContentGenerator>,
    settings: PipelineSettings,
}

impl InterviewPrepOrchestrator {
    /// One generator per category, all sharing the same text generator.
    /// `None` runs every branch in template-only mode.
    pub fn new(llm: Option<Arc<dyn TextGenerator>>, settings: PipelineSettings) -> Self {
        let generators = Category::ALL
            .iter()
            .map(|&category| ContentGenerator::new(category, llm.clone(), settings.llm_timeout))
            .collect();
        Self {
            generators,
            settings,
        }
    }

    #[cfg(test)]
    fn with_generators(generators: Vec<ContentGenerator>, settings: PipelineSettings) -> Self {
        Self {
            generators,
            settings,
        }
    }

    /// Produces a fully populated bundle, or `ExtractionError` for an empty posting.
    pub async fn generate_interview_prep(
        &self,
        posting: JobPosting,
    ) -> Result<InterviewPrepBundle, ExtractionError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "interview_prep",
            %request_id,
            role = %posting.title,
            company = %posting.company
        );
        self.run(posting).instrument(span).await
    }

    async fn run(&self, posting: JobPosting) -> Result<InterviewPrepBundle, ExtractionError> {
        let started = Instant::now();
        let deadline = started + self.settings.request_timeout;

        enter(Stage::Extracting);
        posting.validate()?;
        let requirements = Arc::new(extract_requirements(&posting));
        let posting = Arc::new(posting);
        debug!(
            seniority = ?requirements.seniority,
            specialization = ?requirements.specialization,
            technologies = ?requirements.technologies,
            "Requirements extracted"
        );

        enter(Stage::Dispatching);
        let mut branches: Vec<BranchTask> = self
            .generators
            .iter()
            .map(|generator| self.spawn_branch(generator.clone(), &requirements, &posting))
            .collect();

        enter(Stage::Awaiting);
        // Branches run concurrently; awaiting them in turn only collects results.
        let mut results = Vec::with_capacity(branches.len());
        for branch in &mut branches {
            let result = resolve_branch(branch, deadline, &requirements, &posting).await;
            results.push(result);
        }
        drop(branches);

        enter(Stage::Aggregating);
        let bundle = aggregate(&posting, &requirements, results);

        enter(Stage::Done);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            agents = ?bundle.agents_used.iter().map(|a| (a.name.as_str(), a.status)).collect::<Vec<_>>(),
            "Interview prep generated"
        );
        Ok(bundle)
    }

    fn spawn_branch(
        &self,
        generator: ContentGenerator,
        requirements: &Arc<RequirementSet>,
        posting: &Arc<JobPosting>,
    ) -> BranchTask {
        let category = generator.category();
        let requirements = Arc::clone(requirements);
        let posting = Arc::clone(posting);
        let branch_timeout = self.settings.branch_timeout;

        let handle = tokio::spawn(
            async move {
                tokio::time::timeout(branch_timeout, generator.generate(&requirements, &posting))
                    .await
                    .ok()
            }
            .in_current_span(),
        );
        BranchTask { category, handle }
    }
}

/// Waits for one branch until the request deadline and force-resolves anything
/// that did not produce a result.
async fn resolve_branch(
    branch: &mut BranchTask,
    deadline: Instant,
    requirements: &RequirementSet,
    posting: &JobPosting,
) -> GenerationResult {
    let category = branch.category;
    match tokio::time::timeout_at(deadline, &mut branch.handle).await {
        Ok(Ok(Some(result))) => result,
        Ok(Ok(None)) => {
            warn!(?category, "Branch timed out, resolving from templates");
            fallback_result(category, requirements, posting)
        }
        Ok(Err(join_error)) => {
            error!(?category, error = %join_error, "Branch failed, resolving from templates");
            GenerationResult {
                status: BranchStatus::Failed,
                ..fallback_result(category, requirements, posting)
            }
        }
        Err(_) => {
            branch.handle.abort();
            warn!(?category, "Request deadline reached, resolving branch from templates");
            fallback_result(category, requirements, posting)
        }
    }
}

/// Assembles the bundle in fixed category order.
///
/// A failed branch is reported as `fallback`. A category with no result or no
/// items is filled from templates so every section has at least one entry.
fn aggregate(
    posting: &JobPosting,
    requirements: &RequirementSet,
    results: Vec<GenerationResult>,
) -> InterviewPrepBundle {
    let mut by_category: HashMap<Category, GenerationResult> = results
        .into_iter()
        .map(|result| (result.category, result))
        .collect();

    let mut bundle = InterviewPrepBundle {
        role: posting.title.clone(),
        company: posting.company.clone(),
        key_requirements: requirements.requirements.clone(),
        technical_questions: Vec::new(),
        behavioral_questions: Vec::new(),
        tips: Vec::new(),
        preparation_checklist: Vec::new(),
        agents_used: Vec::with_capacity(Category::ALL.len()),
    };

    for category in Category::ALL {
        let result = by_category
            .remove(&category)
            .filter(|r| !r.items.is_empty())
            .unwrap_or_else(|| fallback_result(category, requirements, posting));

        let status = match result.status {
            BranchStatus::Failed => BranchStatus::Fallback,
            status => status,
        };
        debug_assert!(status == BranchStatus::Completed || result.source == ContentSource::Template);

        bundle.agents_used.push(AgentStatus {
            name: category.agent_name().to_string(),
            status,
        });

        let section = match category {
            Category::Technical => &mut bundle.technical_questions,
            Category::Behavioral => &mut bundle.behavioral_questions,
            Category::Coaching => &mut bundle.tips,
            Category::Checklist => &mut bundle.preparation_checklist,
        };
        *section = result.items;
    }

    bundle
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
