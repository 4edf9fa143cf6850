//! Prompt construction for the classification service

use serde_json::json;
use shared::VideoRecord;

use crate::types::{CurationPass, QueryContext, Rubric};

/// System message sent with every request
pub const SYSTEM_PROMPT: &str =
    "You are an expert educational content curator. You always answer with a single JSON object.";

/// Standards text beyond this many characters is cut off
const STANDARDS_LIMIT: usize = 1000;

/// Feed titles used as interest themes
const THEME_LIMIT: usize = 50;

fn pass_instructions(pass: CurationPass) -> &'static str {
    match pass {
        CurationPass::Feed => {
            "These items come from the viewer's current recommendation feed. Most of it is \
             not chosen with learning in mind, so judge each item on its own merits.\n\
             Mark \"like\": true only for items that are genuinely educational or \
             thought-provoking for the audience. Mark \"like\": false for clickbait, pranks, \
             drama, low-effort entertainment and content meant for a much younger or older \
             audience."
        }
        CurationPass::Search => {
            "These items were returned by educational searches, so most of them should be \
             suitable. Appearing in an educational search is not enough: be selective.\n\
             Mark \"like\": true only if the item is clearly educational, accurate and at the \
             right level for the audience. Mark \"like\": false if it is clickbait or \
             misleading, too childish, entertainment presented as education, low quality, or \
             off topic for its search."
        }
    }
}

fn push_rubric(prompt: &mut String, rubric: &Rubric) {
    prompt.push_str("Audience:\n");
    prompt.push_str(&rubric.audience);
    prompt.push_str("\n\n");

    if let Some(standards) = &rubric.standards {
        let excerpt: String = standards.chars().take(STANDARDS_LIMIT).collect();
        prompt.push_str("Subject standards for the audience's grade (math content should align with these):\n");
        prompt.push_str(&excerpt);
        if standards.chars().count() > STANDARDS_LIMIT {
            prompt.push_str("...");
        }
        prompt.push_str("\n\n");
    }
}

/// Prompt asking for one verdict per record of `batch`
pub fn evaluation_prompt(batch: &[VideoRecord], rubric: &Rubric) -> String {
    let mut prompt = String::new();
    push_rubric(&mut prompt, rubric);
    prompt.push_str(pass_instructions(rubric.pass));
    prompt.push_str("\n\n");
    prompt.push_str(
        "Return a JSON object of the form \
         {\"verdicts\": [{\"id\": \"<item id>\", \"like\": true, \"rationale\": \"<one sentence>\"}]} \
         with exactly one verdict for every item below, using the item ids unchanged.\n\n",
    );

    let items: Vec<_> = batch
        .iter()
        .map(|record| {
            json!({
                "id": record.id,
                "title": record.title,
                "kind": record.kind,
                "query": record.query,
            })
        })
        .collect();
    prompt.push_str("Items:\n");
    prompt.push_str(&serde_json::to_string_pretty(&items).unwrap_or_default());
    prompt
}

/// Prompt asking for new search queries
pub fn query_prompt(context: &QueryContext) -> String {
    let mut prompt = String::new();
    push_rubric(&mut prompt, &context.rubric);
    prompt.push_str(
        "Propose YouTube search queries that will surface better content for this audience. \
         \"math\" queries target skills at the audience's level. \"curiosity\" queries build on \
         the interests visible in the current feed and steer them toward science, history, \
         nature and how things work.\n\n",
    );
    prompt.push_str(&context.policy.describe());
    prompt.push_str("\n\n");
    prompt.push_str(
        "Return a JSON object of the form \
         {\"queries\": [{\"text\": \"<search text>\", \"category\": \"math\"}]} \
         where category is \"math\" or \"curiosity\".\n\n",
    );

    if !context.feed_titles.is_empty() {
        prompt.push_str("Current feed titles:\n");
        for title in context.feed_titles.iter().take(THEME_LIMIT) {
            prompt.push_str("- ");
            prompt.push_str(title);
            prompt.push('\n');
        }
    }
    prompt
}
