use serde::Serialize;

use crate::domain::Task;

/// Output budget for one evaluation.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1200;

/// Request body for the model's responses endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EvaluationPrompt {
    pub model: String,
    pub input: String,
    pub max_output_tokens: u32,
}

impl EvaluationPrompt {
    pub fn for_task(task: &Task, model: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            model: model.into(),
            input: build_prompt(task),
            max_output_tokens,
        }
    }
}

/// Reviewer instructions followed by the task itself.
pub fn build_prompt(task: &Task) -> String {
    format!(
        r#"You are an expert code reviewer. Return STRICT JSON only with keys:
{{
  "score": <integer 0-100>,
  "short_feedback": "<one-line>",
  "strengths": ["..."],
  "improvements": ["..."],
  "full_report": "<detailed feedback>"
}}
Language: {language}
Title: {title}
Description: {description}
Code:
{code}
"#,
        language = task.language,
        title = task.title,
        description = task.description,
        code = task.code,
    )
}
