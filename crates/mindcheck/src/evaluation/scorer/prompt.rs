use std::fmt::Write;

use crate::completion::CompletionRequest;
use crate::evaluation::domain::{Answer, Question};

const UNKNOWN_QUESTION: &str = "Question not found";

pub(crate) const SYSTEM_PROMPT: &str = "You are an experienced clinical psychologist who \
analyses mental-health questionnaires and gives precise, professional and empathetic \
assessments. Reply with exactly one JSON object with the fields \"state\", \"score\", \
\"observations\" and \"recommendations\" (an array of exactly 3 strings). Do not add any \
text outside the JSON object.";

/// Answer joined to its question: the `(text, weight, value)` triple the scorer works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WeightedAnswer<'a> {
    pub text: &'a str,
    pub weight: u32,
    pub value: u8,
}

impl WeightedAnswer<'_> {
    /// Saturates at `u32::MAX` for oversized weights.
    pub fn weighted_score(&self) -> u32 {
        u32::from(self.value).saturating_mul(self.weight)
    }
}

/// Unknown question ids keep their answer with weight 1.
pub(crate) fn join_answers<'a>(
    questions: &'a [Question],
    answers: &[Answer],
) -> Vec<WeightedAnswer<'a>> {
    answers
        .iter()
        .map(|answer| {
            match questions
                .iter()
                .find(|question| question.id == answer.question_id)
            {
                Some(question) => WeightedAnswer {
                    text: &question.text,
                    weight: question.weight.max(1),
                    value: answer.value,
                },
                None => WeightedAnswer {
                    text: UNKNOWN_QUESTION,
                    weight: 1,
                    value: answer.value,
                },
            }
        })
        .collect()
}

pub(crate) fn evaluation_request(items: &[WeightedAnswer<'_>]) -> CompletionRequest {
    CompletionRequest::json(SYSTEM_PROMPT, user_prompt(items))
}

fn user_prompt(items: &[WeightedAnswer<'_>]) -> String {
    let mut prompt = String::from(
        "Analyse the following answers to a mental-health questionnaire \
         (scale 1-5, where 5 means greater severity):\n\n",
    );

    for item in items {
        let _ = writeln!(
            prompt,
            "- Question: \"{}\" (weight: {})\n  - Answer: {}/5\n",
            item.text, item.weight, item.value
        );
    }

    prompt.push_str(
        "ASSESSMENT CRITERIA:\n\
         - green: score 0-30. Stable emotional state, general well-being, no significant warning signs.\n\
         - yellow: score 31-60. Moderate alert, some symptoms of emotional distress, needs attention and follow-up.\n\
         - red: score 61-100. Serious alert, multiple symptoms of emotional distress, needs immediate professional intervention.\n\n\
         IMPORTANT: be conservative. Only assign red when there is clear evidence of several serious symptoms. \
         Prefer the less severe tier when the evidence is ambiguous.\n\n\
         Determine:\n\
         1. A semaphore state based on the criteria above\n\
         2. A numeric score (0-100) representing overall severity\n\
         3. A professional, empathetic clinical observation about the respondent's mental state\n\
         4. Three practical, specific recommendations for emotional well-being\n\n\
         Reply ONLY with this JSON format:\n\
         {\n\
         \x20 \"state\": \"green|yellow|red\",\n\
         \x20 \"score\": 0-100,\n\
         \x20 \"observations\": \"professional and empathetic clinical analysis\",\n\
         \x20 \"recommendations\": [\"recommendation 1\", \"recommendation 2\", \"recommendation 3\"]\n\
         }",
    );

    prompt
}
