//! Requirement extraction: turns a job title + description into a `RequirementSet`.
//!
//! Pure keyword scan, no LLM call and no I/O. Unrecognised postings yield
//! `unknown` tags and a generic requirement list rather than an error.

use std::collections::HashSet;

use crate::models::interview::Specialization::{Backend, Data, Devops, Frontend, Fullstack};
use crate::models::interview::{JobPosting, RequirementSet, Seniority, Specialization};

const MIN_REQUIREMENTS: usize = 3;
const MAX_REQUIREMENTS: usize = 5;
const MAX_TECH_REQUIREMENTS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Keyword tables
// ────────────────────────────────────────────────────────────────────────────

/// Seniority keywords. When several match in the same field the highest level wins.
///
/// The third column marks words that also read as ordinary prose ("lead the
/// migration", "our staff", "graduate degree"). Those only count in the title.
const SENIORITY_KEYWORDS: &[(&str, Seniority, bool)] = &[
    ("lead", Seniority::Lead, true),
    ("staff", Seniority::Lead, true),
    ("architect", Seniority::Lead, true),
    ("principal", Seniority::Lead, false),
    ("head of", Seniority::Lead, false),
    ("tech lead", Seniority::Lead, false),
    ("team lead", Seniority::Lead, false),
    ("lead engineer", Seniority::Lead, false),
    ("lead developer", Seniority::Lead, false),
    ("staff engineer", Seniority::Lead, false),
    ("senior", Seniority::Senior, false),
    ("sr", Seniority::Senior, false),
    ("mid", Seniority::Mid, true),
    ("mid-level", Seniority::Mid, false),
    ("mid level", Seniority::Mid, false),
    ("intermediate", Seniority::Mid, false),
    ("junior", Seniority::Junior, false),
    ("jr", Seniority::Junior, false),
    ("entry level", Seniority::Junior, false),
    ("entry-level", Seniority::Junior, false),
    ("graduate", Seniority::Junior, true),
    ("intern", Seniority::Junior, true),
];

/// A technology keyword. Variants of the same technology share `canonical`.
struct TechKeyword {
    keyword: &'static str,
    canonical: &'static str,
    display: &'static str,
    specialization: Specialization,
}

const fn tech(
    keyword: &'static str,
    canonical: &'static str,
    display: &'static str,
    specialization: Specialization,
) -> TechKeyword {
    TechKeyword {
        keyword,
        canonical,
        display,
        specialization,
    }
}

const TECH_KEYWORDS: &[TechKeyword] = &[
    // Frontend
    tech("react", "react", "React", Frontend),
    tech("reactjs", "react", "React", Frontend),
    tech("react.js", "react", "React", Frontend),
    tech("vue", "vue", "Vue", Frontend),
    tech("vue.js", "vue", "Vue", Frontend),
    tech("angular", "angular", "Angular", Frontend),
    tech("svelte", "svelte", "Svelte", Frontend),
    tech("javascript", "javascript", "JavaScript", Frontend),
    tech("typescript", "typescript", "TypeScript", Frontend),
    tech("html", "html", "HTML", Frontend),
    tech("css", "css", "CSS", Frontend),
    tech("tailwind", "tailwind", "Tailwind CSS", Frontend),
    tech("redux", "redux", "Redux", Frontend),
    tech("next.js", "next.js", "Next.js", Frontend),
    tech("nextjs", "next.js", "Next.js", Frontend),
    // Backend
    tech("python", "python", "Python", Backend),
    tech("java", "java", "Java", Backend),
    tech("node.js", "node.js", "Node.js", Backend),
    tech("nodejs", "node.js", "Node.js", Backend),
    tech("django", "django", "Django", Backend),
    tech("flask", "flask", "Flask", Backend),
    tech("fastapi", "fastapi", "FastAPI", Backend),
    tech("spring", "spring", "Spring", Backend),
    tech("golang", "go", "Go", Backend),
    tech("rust", "rust", "Rust", Backend),
    tech("ruby", "ruby", "Ruby", Backend),
    tech("rails", "rails", "Ruby on Rails", Backend),
    tech("php", "php", "PHP", Backend),
    tech("c#", "dotnet", ".NET", Backend),
    tech(".net", "dotnet", ".NET", Backend),
    tech("sql", "sql", "SQL", Backend),
    tech("postgresql", "sql", "SQL", Backend),
    tech("postgres", "sql", "SQL", Backend),
    tech("mysql", "sql", "SQL", Backend),
    tech("mongodb", "mongodb", "MongoDB", Backend),
    tech("redis", "redis", "Redis", Backend),
    tech("graphql", "graphql", "GraphQL", Backend),
    tech("rest api", "rest", "REST APIs", Backend),
    tech("microservices", "microservices", "microservices", Backend),
    // DevOps
    tech("docker", "docker", "Docker", Devops),
    tech("kubernetes", "kubernetes", "Kubernetes", Devops),
    tech("k8s", "kubernetes", "Kubernetes", Devops),
    tech("terraform", "terraform", "Terraform", Devops),
    tech("ansible", "ansible", "Ansible", Devops),
    tech("aws", "aws", "AWS", Devops),
    tech("azure", "azure", "Azure", Devops),
    tech("gcp", "gcp", "Google Cloud", Devops),
    tech("ci/cd", "ci/cd", "CI/CD", Devops),
    tech("jenkins", "jenkins", "Jenkins", Devops),
    tech("prometheus", "prometheus", "Prometheus", Devops),
    tech("linux", "linux", "Linux", Devops),
    // Data
    tech("spark", "spark", "Apache Spark", Data),
    tech("hadoop", "hadoop", "Hadoop", Data),
    tech("kafka", "kafka", "Kafka", Data),
    tech("airflow", "airflow", "Airflow", Data),
    tech("pandas", "pandas", "pandas", Data),
    tech("tensorflow", "tensorflow", "TensorFlow", Data),
    tech("pytorch", "pytorch", "PyTorch", Data),
    tech("machine learning", "machine learning", "machine learning", Data),
    tech("snowflake", "snowflake", "Snowflake", Data),
    tech("dbt", "dbt", "dbt", Data),
    tech("tableau", "tableau", "Tableau", Data),
    tech("etl", "etl", "ETL pipelines", Data),
];

/// Role words that count toward a specialization but are not technologies.
const ROLE_KEYWORDS: &[(&str, Specialization)] = &[
    ("frontend", Frontend),
    ("front-end", Frontend),
    ("front end", Frontend),
    ("ui engineer", Frontend),
    ("backend", Backend),
    ("back-end", Backend),
    ("back end", Backend),
    ("server-side", Backend),
    ("fullstack", Fullstack),
    ("full-stack", Fullstack),
    ("full stack", Fullstack),
    ("mern", Fullstack),
    ("devops", Devops),
    ("sre", Devops),
    ("site reliability", Devops),
    ("platform engineer", Devops),
    ("infrastructure", Devops),
    ("data engineer", Data),
    ("data scientist", Data),
    ("data science", Data),
    ("data analyst", Data),
    ("analytics", Data),
];

const SENIORITY_REQUIREMENTS: &[(Seniority, &str)] = &[
    (
        Seniority::Junior,
        "Solid programming fundamentals and eagerness to learn from code review",
    ),
    (
        Seniority::Mid,
        "2+ years of professional experience shipping production features independently",
    ),
    (
        Seniority::Senior,
        "5+ years of experience owning complex systems end-to-end",
    ),
    (
        Seniority::Lead,
        "Proven technical leadership: setting direction and mentoring engineers",
    ),
];

const SPECIALIZATION_REQUIREMENTS: &[(Specialization, &str)] = &[
    (
        Specialization::Frontend,
        "Frontend development: building responsive, accessible user interfaces",
    ),
    (
        Specialization::Backend,
        "Backend development: designing APIs, services and data models",
    ),
    (
        Specialization::Fullstack,
        "Full-stack development across frontend interfaces and backend services",
    ),
    (
        Specialization::Devops,
        "DevOps practice: CI/CD, infrastructure as code and production observability",
    ),
    (
        Specialization::Data,
        "Data engineering and analysis: pipelines, modelling and data quality",
    ),
    (
        Specialization::Unknown,
        "Strong software engineering fundamentals and problem-solving skills",
    ),
];

/// Padding used when a posting yields fewer than three requirements.
const GENERIC_REQUIREMENTS: &[(&str, &str)] = &[
    (
        "communication",
        "Clear communication and collaboration with cross-functional teams",
    ),
    (
        "quality",
        "Commitment to code quality, testing and maintainability",
    ),
    (
        "learning",
        "Ability to learn new tools and domains quickly",
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the normalized requirement set for a posting. Never fails.
pub fn extract_requirements(posting: &JobPosting) -> RequirementSet {
    let title = posting.title.to_lowercase();
    let description = posting.description.to_lowercase();

    let seniority = detect_seniority(&title, true)
        .or_else(|| detect_seniority(&description, false))
        .unwrap_or_default();

    // Title first so technologies named there come first in order of appearance.
    let text = format!("{title}\n{description}");
    let matched = match_technologies(&text);
    let specialization = detect_specialization(&title, &description);
    let technologies: Vec<String> = matched.iter().map(|t| t.display.to_string()).collect();
    let requirements = build_requirements(seniority, specialization, &matched);

    RequirementSet {
        seniority,
        specialization,
        technologies,
        requirements,
    }
}

/// Highest seniority level named in `text`, if any.
fn detect_seniority(text: &str, is_title: bool) -> Option<Seniority> {
    SENIORITY_KEYWORDS
        .iter()
        .filter(|(_, _, title_only)| is_title || !title_only)
        .filter(|(keyword, _, _)| find_keyword(text, keyword).is_some())
        .map(|(_, level, _)| *level)
        .max_by_key(|level| level.rank())
}

/// Matched technologies, deduplicated by canonical name, in order of first appearance.
fn match_technologies(text: &str) -> Vec<&'static TechKeyword> {
    let mut hits: Vec<(usize, &'static TechKeyword)> = TECH_KEYWORDS
        .iter()
        .filter_map(|t| find_keyword(text, t.keyword).map(|pos| (pos, t)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|(_, t)| seen.insert(t.canonical))
        .map(|(_, t)| t)
        .collect()
}

/// Picks the specialization from the title, falling back to the description
/// only when the title names none.
///
/// A frontend technology or role named in the title keeps the posting on the UI
/// side: it resolves to frontend or fullstack, never to a backend-only track.
fn detect_specialization(title: &str, description: &str) -> Specialization {
    let title_counts = specialization_counts(title);
    match leader(&title_counts) {
        Some(spec @ (Frontend | Fullstack)) => spec,
        Some(_) if count_for(&title_counts, Frontend) > 0 => Fullstack,
        Some(spec) => spec,
        None => leader(&specialization_counts(description)).unwrap_or_default(),
    }
}

/// Distinct technology and role-keyword hits per specialization.
fn specialization_counts(text: &str) -> [(Specialization, usize); 5] {
    let matched = match_technologies(text);
    [Frontend, Backend, Fullstack, Devops, Data].map(|spec| {
        let tech_count = matched.iter().filter(|t| t.specialization == spec).count();
        let role_count = ROLE_KEYWORDS
            .iter()
            .filter(|(keyword, s)| *s == spec && find_keyword(text, keyword).is_some())
            .count();
        (spec, tech_count + role_count)
    })
}

fn count_for(counts: &[(Specialization, usize)], spec: Specialization) -> usize {
    counts
        .iter()
        .find(|(s, _)| *s == spec)
        .map(|(_, c)| *c)
        .unwrap_or(0)
}

/// The specialization with the most hits. Any tie at the top is fullstack;
/// no hits at all is `None`.
fn leader(counts: &[(Specialization, usize)]) -> Option<Specialization> {
    let best = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    if best == 0 {
        return None;
    }

    let mut leaders = counts.iter().filter(|(_, c)| *c == best).map(|(s, _)| *s);
    match (leaders.next(), leaders.next()) {
        (Some(single), None) => Some(single),
        _ => Some(Fullstack),
    }
}

/// Builds the 3–5 requirement strings, deduplicated by semantic key.
fn build_requirements(
    seniority: Seniority,
    specialization: Specialization,
    matched: &[&TechKeyword],
) -> Vec<String> {
    let mut keyed: Vec<(String, String)> = Vec::with_capacity(MAX_REQUIREMENTS);

    if let Some((_, text)) = SENIORITY_REQUIREMENTS.iter().find(|(s, _)| *s == seniority) {
        keyed.push(("seniority".to_string(), text.to_string()));
    }

    if let Some((_, text)) = SPECIALIZATION_REQUIREMENTS
        .iter()
        .find(|(s, _)| *s == specialization)
    {
        keyed.push(("specialization".to_string(), text.to_string()));
    }

    for t in matched.iter().take(MAX_TECH_REQUIREMENTS) {
        keyed.push((
            format!("tech:{}", t.canonical),
            format!("Hands-on experience with {}", t.display),
        ));
    }

    for (key, text) in GENERIC_REQUIREMENTS {
        if keyed.len() >= MIN_REQUIREMENTS {
            break;
        }
        keyed.push((key.to_string(), text.to_string()));
    }

    let mut seen = HashSet::new();
    keyed
        .into_iter()
        .filter(|(key, _)| seen.insert(key.clone()))
        .map(|(_, text)| text)
        .take(MAX_REQUIREMENTS)
        .collect()
}

/// Position of the first whole-word occurrence of `keyword` in `haystack`.
///
/// Both inputs are expected lowercase. A match must not be flanked by
/// alphanumerics, so "java" does not hit "javascript".
fn find_keyword(haystack: &str, keyword: &str) -> Option<usize> {
    haystack.match_indices(keyword).find_map(|(pos, _)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + keyword.len()..].chars().next();
        let is_word = |c: Option<char>| c.map(|c| c.is_alphanumeric()).unwrap_or(false);
        (!is_word(before) && !is_word(after)).then_some(pos)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
