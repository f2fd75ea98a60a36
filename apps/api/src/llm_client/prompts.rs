// Shared prompt fragments for every text-generation call.
// Category-specific prompts live in generation/prompts.rs.

/// Output-format instruction appended to every generation prompt.
pub const LIST_ONLY_INSTRUCTION: &str = "\
    Respond with a numbered list only, one item per line. \
    Do NOT add headings, introductions, explanations or closing remarks. \
    Do NOT use markdown formatting beyond the numbering.";

/// Keeps the model anchored to the posting instead of inventing details.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every item on the role details given below. \
    Do NOT invent facts about the company beyond its name.";
