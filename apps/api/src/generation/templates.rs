//! Template library: deterministic content used whenever a branch cannot use the LLM.
//!
//! Every function here is pure: identical inputs always produce identical items.

use crate::models::application::CandidateProfile;
use crate::models::interview::{JobPosting, RequirementSet, Specialization};

const MAX_COACHING_TIPS: usize = 7;

/// Five fixed technical questions per specialization. Seniority does not change them.
pub fn technical_questions(specialization: Specialization) -> Vec<String> {
    let rows: [&str; 5] = match specialization {
        Specialization::Frontend => [
            "How does React decide what to re-render, and how do you avoid unnecessary renders in a React component tree?",
            "Explain the difference between controlled and uncontrolled form inputs and when you would use each.",
            "How would you manage shared state in a large single-page application?",
            "Which techniques do you use to improve load time and runtime performance in the browser?",
            "How do you make a web interface usable with a keyboard and a screen reader?",
        ],
        Specialization::Backend => [
            "How would you design a REST API for a resource that is updated concurrently by many clients?",
            "How do you decide which database indexes to add, and what do they cost on writes?",
            "Where would you introduce caching in a read-heavy service, and how do you keep it consistent?",
            "How do you make a message handler idempotent when deliveries can be retried?",
            "Walk me through how you would find the cause of a slow endpoint in production.",
        ],
        Specialization::Fullstack => [
            "Walk me through building a feature end to end, from the database schema to the UI.",
            "How do you keep the API contract between frontend and backend from drifting?",
            "When would you render React components on the server instead of the client, and how does that change your API?",
            "How do you implement authentication across a browser client and an API?",
            "How would you debug a bug that only appears when the frontend and backend are deployed together?",
        ],
        Specialization::Devops => [
            "Describe a CI/CD pipeline you would build for a service deployed many times a day.",
            "How does a rolling deployment work in Kubernetes, and how do you roll back safely?",
            "What are the benefits and pitfalls of managing infrastructure as code?",
            "Which signals would you monitor for a new service, and what would you alert on?",
            "How do you manage secrets for applications across environments?",
        ],
        Specialization::Data => [
            "When would you choose batch processing over stream processing for a pipeline?",
            "How do you detect and handle bad records in an ingestion pipeline?",
            "How do you evolve a table schema without breaking downstream consumers?",
            "Explain SQL window functions and give an example where they beat a self-join.",
            "How do you prevent data leakage when building and evaluating a model?",
        ],
        Specialization::Unknown => [
            "Describe your experience with the technologies most relevant to this role.",
            "How do you choose a data structure for a problem you have not seen before?",
            "Walk me through how you would debug an issue reported in production.",
            "What does a good testing strategy look like for a project you worked on?",
            "Design a simplified version of a system you use every day and explain the trade-offs.",
        ],
    };
    rows.iter().map(|q| q.to_string()).collect()
}

/// Company-aware opener followed by four generic behavioral questions.
pub fn behavioral_questions(company: &str, title: &str) -> Vec<String> {
    let mut questions = vec![behavioral_opener(company, title)];
    questions.extend(
        [
            "Tell me about a challenging project you worked on and how you handled it.",
            "Describe a time you worked in a team to resolve a disagreement.",
            "How do you handle tight deadlines and pressure?",
            "Tell me about a time you solved a difficult problem with limited information.",
        ]
        .iter()
        .map(|q| q.to_string()),
    );
    questions
}

/// The first behavioral question, with company and title substituted literally.
pub fn behavioral_opener(company: &str, title: &str) -> String {
    format!(
        "Why do you want to join {} as a {}?",
        or_default(company, "this company"),
        or_default(title, "member of the team")
    )
}

const UNIVERSAL_TIPS: &[&str] = &[
    "Research the company's products, culture and recent news before the interview.",
    "Prepare specific examples using the STAR method (Situation, Task, Action, Result).",
    "Ask thoughtful questions about the role, the team and how success is measured.",
    "Think out loud during technical questions so the interviewer can follow your reasoning.",
];

const LEADERSHIP_TIPS: &[&str] = &[
    "Frame your stories around leadership: mentoring, unblocking others and raising the team's bar.",
    "Be ready to walk through architecture decisions you owned, including trade-offs and what you would change.",
];

fn specialization_tip(specialization: Specialization) -> Option<&'static str> {
    match specialization {
        Specialization::Frontend => Some(
            "Bring a portfolio piece and be ready to discuss the UI performance and accessibility choices behind it.",
        ),
        Specialization::Backend => Some(
            "Be ready to sketch an API and data model on a whiteboard and reason about scaling it.",
        ),
        Specialization::Fullstack => Some(
            "Show how you connect user-facing features to the services behind them, end to end.",
        ),
        Specialization::Devops => Some(
            "Prepare an incident story: how you detected it, mitigated it and prevented it from recurring.",
        ),
        Specialization::Data => Some(
            "Be ready to explain how you validate data quality and measure the impact of your analyses.",
        ),
        Specialization::Unknown => None,
    }
}

/// Four universal tips plus leadership and specialization tips where they apply.
pub fn coaching_tips(requirements: &RequirementSet) -> Vec<String> {
    let mut tips: Vec<&str> = UNIVERSAL_TIPS.to_vec();

    if requirements.seniority.is_leadership() {
        tips.extend_from_slice(LEADERSHIP_TIPS);
    }
    if let Some(tip) = specialization_tip(requirements.specialization) {
        tips.push(tip);
    }

    let mut out: Vec<String> = Vec::with_capacity(MAX_COACHING_TIPS);
    for tip in tips {
        if out.len() == MAX_COACHING_TIPS {
            break;
        }
        if !out.iter().any(|t| t == tip) {
            out.push(tip.to_string());
        }
    }
    out
}

/// Twelve-item checklist with the company and title substituted in.
pub fn preparation_checklist(company: &str, title: &str) -> Vec<String> {
    let company = or_default(company, "the company");
    let title = or_default(title, "role");

    vec![
        "Review your resume and be ready to discuss each point.".to_string(),
        format!("Re-read the {title} job description and map your experience to each requirement."),
        format!("Research {company}'s products, culture and recent news."),
        "Prepare STAR stories for your three strongest achievements.".to_string(),
        "Prepare questions to ask the interviewer.".to_string(),
        "Practise technical problems in the format the interview will use.".to_string(),
        "Test your tech setup if it's a virtual interview.".to_string(),
        "Plan your outfit and arrival time.".to_string(),
        "Bring copies of your resume and a notepad.".to_string(),
        "Confirm the interview time, format and interviewer names.".to_string(),
        "Get a good night's sleep and plan a light meal beforehand.".to_string(),
        "Draft a short thank-you note to send after the interview.".to_string(),
    ]
}

/// Three next-step suggestions for an application in `status`.
pub fn next_actions(status: &str, days_since_applied: u32) -> Vec<String> {
    let actions: [&str; 3] = match status {
        "saved" => [
            "Review the job description thoroughly and tailor your resume",
            "Research the company culture and recent news",
            "Prepare a customized cover letter highlighting relevant experience",
        ],
        "applied" if days_since_applied < 7 => [
            "Wait for an initial response (typically 7-10 days)",
            "Prepare for potential technical screening questions",
            "Continue applying to similar roles",
        ],
        "applied" if days_since_applied < 14 => [
            "Consider sending a polite follow-up email to the recruiter",
            "Connect with current employees for insights into the team",
            "Review and strengthen your interview preparation",
        ],
        "applied" => [
            "Send a professional follow-up email expressing continued interest",
            "Reach out to the hiring manager if contact information is available",
            "Consider this application inactive and focus on new opportunities",
        ],
        "interview_scheduled" => [
            "Research common interview questions for this role and company",
            "Prepare STAR method examples showcasing relevant achievements",
            "Review the job description and prepare questions for the interviewer",
        ],
        "offer_received" => [
            "Evaluate the offer against your requirements and market rates",
            "Negotiate salary and benefits if appropriate",
            "Request time to make a decision if needed (typically 3-7 days)",
        ],
        "rejected" => [
            "Request feedback on your application or interview performance",
            "Analyze what could be improved for future applications",
            "Stay positive and continue applying to other opportunities",
        ],
        _ => [
            "Review your application",
            "Continue your job search",
            "Network with professionals in your field",
        ],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

/// Skills worth naming in a letter or prompt: trimmed, non-blank, at most `limit`.
pub fn listed_skills(profile: &CandidateProfile, limit: usize) -> Vec<&str> {
    profile
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(limit)
        .collect()
}

/// Four-paragraph cover letter built from the posting and profile.
pub fn cover_letter(profile: &CandidateProfile, posting: &JobPosting) -> String {
    let name = or_default(&profile.name, "The Applicant");
    let title = or_default(&posting.title, "advertised");
    let company = or_default(&posting.company, "your company");
    let skills = listed_skills(profile, 10);

    let experience = match (profile.experience_years, skills.is_empty()) {
        (0, true) => "a strong foundation in software development".to_string(),
        (0, false) => format!("hands-on expertise in {}", skills.join(", ")),
        (years, true) => format!("{years} years of professional experience"),
        (years, false) => format!(
            "{years} years of professional experience and expertise in {}",
            skills.join(", ")
        ),
    };
    let strongest = skills.first().copied().unwrap_or("software development");

    format!(
        "Dear Hiring Manager,\n\n\
         I am writing to express my strong interest in the {title} position at {company}. \
         With {experience}, I am confident in my ability to contribute effectively to your team.\n\n\
         My background in {strongest} has prepared me well for this role. I am particularly drawn \
         to this opportunity because of {company}'s reputation and the challenges this position offers.\n\n\
         I would welcome the opportunity to discuss how my skills and experience align with your needs. \
         Thank you for considering my application, and I look forward to hearing from you.\n\n\
         Best regards,\n{name}"
    )
}

/// Short rejection analysis naming the skills to strengthen.
pub fn rejection_analysis(posting: &JobPosting, focus_areas: &[String]) -> String {
    let title = or_default(&posting.title, "this position");
    let strengthen = match focus_areas {
        [] => "the core technologies named in the posting".to_string(),
        areas => areas.join(", "),
    };

    format!(
        "Based on the application for {title}, here are some possible factors:\n\
         1. The role may have required more specialized experience in certain technical areas.\n\
         2. Competition was likely strong, with candidates who had more direct experience with the required technologies.\n\
         3. Consider strengthening your skills in {strengthen} and gaining hands-on project experience.\n\
         4. Tailor your application materials more specifically to highlight relevant achievements."
    )
}

/// Fixed follow-up recommendations attached to every rejection analysis.
pub fn rejection_recommendations() -> Vec<String> {
    [
        "Review the job requirements and identify skill gaps",
        "Build projects showcasing relevant skills",
        "Consider certifications in key technology areas",
        "Network with professionals in similar roles",
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

pub(crate) fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}
