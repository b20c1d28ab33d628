//! Prompt construction for the three pipelines.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the slide structure the model
//!    is asked for (e.g. adding speaker notes) requires editing exactly
//!    one place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without
//!    calling a real model, so a prompt regression is caught as a string
//!    diff, not as mysteriously broken JSON downstream.
//!
//! Every prompt instructs the model to return bare JSON. Models still
//! wrap output in markdown fences often enough that
//! [`crate::normalize`] strips them anyway.

/// Build the prompt asking for a structured slide deck on `topic`.
///
/// The response contract is a JSON array of slide objects matching
/// [`crate::output::Slide`].
pub fn presentation_prompt(topic: &str) -> String {
    format!(
        r#"Create a well-structured presentation on the topic: "{topic}".
Respond in JSON format with a list of slides. Each slide should contain:
- "title": the slide title
- "bullet_points": a list of 3-6 concise bullet points
- "image_prompt": a short phrase describing an image relevant to the slide

Example:
[
  {{
    "title": "Introduction",
    "bullet_points": ["Definition", "Importance", "Brief history"],
    "image_prompt": "A timeline showing key historical events"
  }}
]
Only return the JSON. No extra explanations or ```json."#
    )
}

/// Build the prompt asking for a graded evaluation of exam content.
///
/// The response contract is a single JSON object matching
/// [`crate::output::EvaluationResult`].
pub fn evaluation_prompt(exam_content: &str) -> String {
    format!(
        r#"Evaluate the exam answers provided below. Provide a summary evaluation and a score out of 100.

Exam Content:
{exam_content}

Return the evaluation in JSON format with the keys:
- "evaluation": a string summary of the exam performance.
- "score": an integer score between 0 and 100.
Only return the JSON."#
    )
}

/// Build the prompt asking for ten concise bullet-point notes on `topic`.
///
/// The response contract is a JSON array of strings.
pub fn notes_prompt(topic: &str) -> String {
    format!(
        r#"Create a list of 10 concise bullet points about the topic: "{topic}".
Respond in JSON format as a simple array of strings.
Example:
[
  "Bullet point 1",
  "Bullet point 2",
  ...
  "Bullet point 10"
]
Only return the JSON array. No extra explanations or markdown."#
    )
}
