use serde_json::{Map, Value};

use crate::evaluation::domain::{EvaluationResult, SemaphoreState};

/// Why a model reply could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyDefect {
    #[error("reply is not a JSON object: {0}")]
    NotJson(String),
    #[error("reply is missing field `{0}`")]
    MissingField(&'static str),
    #[error("reply field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Parse and validate a model reply into a typed result.
pub fn parse_reply(raw: &str) -> Result<EvaluationResult, ReplyDefect> {
    let cleaned = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|err| ReplyDefect::NotJson(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ReplyDefect::NotJson("top-level value is not an object".to_string()))?;

    let state = field(object, "state")?
        .as_str()
        .and_then(SemaphoreState::from_label)
        .ok_or_else(|| invalid("state", "expected one of green, yellow, red"))?;

    let score = parse_score(field(object, "score")?)?;

    let observations = field(object, "observations")?
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| invalid("observations", "expected a non-empty string"))?
        .to_string();

    let recommendations = parse_recommendations(field(object, "recommendations")?)?;

    Ok(EvaluationResult {
        state,
        score,
        observations,
        recommendations,
    })
}

/// Drop markdown code-fence markers the model may wrap around its JSON.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn field<'a>(
    object: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, ReplyDefect> {
    match object.get(name) {
        None | Some(Value::Null) => Err(ReplyDefect::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn invalid(field: &'static str, reason: &str) -> ReplyDefect {
    ReplyDefect::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

fn parse_score(value: &Value) -> Result<u8, ReplyDefect> {
    let score = value
        .as_f64()
        .filter(|score| score.is_finite())
        .ok_or_else(|| invalid("score", "expected a number"))?;
    if !(0.0..=100.0).contains(&score) {
        return Err(invalid("score", &format!("{score} is outside 0-100")));
    }
    Ok(score.round() as u8)
}

fn parse_recommendations(value: &Value) -> Result<[String; 3], ReplyDefect> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid("recommendations", "expected an array"))?;

    let texts = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .ok_or_else(|| invalid("recommendations", "entries must be non-empty strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    <[String; 3]>::try_from(texts).map_err(|texts| {
        invalid(
            "recommendations",
            &format!("expected exactly 3 entries, got {}", texts.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "state": "yellow",
        "score": 45,
        "observations": "Moderate distress with sleep disruption.",
        "recommendations": ["Keep a sleep schedule", "Talk to someone you trust", "Book a check-in"]
    }"#;

    #[test]
    fn accepts_well_formed_reply() {
        let result = parse_reply(VALID).expect("valid reply");
        assert_eq!(result.state, SemaphoreState::Yellow);
        assert_eq!(result.score, 45);
        assert_eq!(result.recommendations[2], "Book a check-in");
    }

    #[test]
    fn strips_code_fences_before_parsing() {
        let fenced = format!("```json\n{VALID}\n```");
        let result = parse_reply(&fenced).expect("fenced reply parses");
        assert_eq!(result.state, SemaphoreState::Yellow);
    }

    #[test]
    fn rejects_non_json_text() {
        assert!(matches!(parse_reply("not json"), Err(ReplyDefect::NotJson(_))));
        assert!(matches!(parse_reply("[1, 2, 3]"), Err(ReplyDefect::NotJson(_))));
    }

    #[test]
    fn reports_missing_fields() {
        let reply = r#"{"state": "green", "score": 10, "observations": "fine"}"#;
        assert_eq!(
            parse_reply(reply),
            Err(ReplyDefect::MissingField("recommendations"))
        );
    }

    #[test]
    fn rejects_unknown_state_and_out_of_range_score() {
        let reply = VALID.replace("\"yellow\"", "\"purple\"");
        assert!(matches!(
            parse_reply(&reply),
            Err(ReplyDefect::InvalidField { field: "state", .. })
        ));

        let reply = VALID.replace("45", "140");
        assert!(matches!(
            parse_reply(&reply),
            Err(ReplyDefect::InvalidField { field: "score", .. })
        ));

        let reply = VALID.replace("45", "\"45\"");
        assert!(matches!(
            parse_reply(&reply),
            Err(ReplyDefect::InvalidField { field: "score", .. })
        ));
    }

    #[test]
    fn requires_exactly_three_recommendations() {
        let reply = r#"{"state": "red", "score": 80, "observations": "Severe.",
            "recommendations": ["Call a crisis line", "Reach out to a psychologist"]}"#;
        match parse_reply(reply) {
            Err(ReplyDefect::InvalidField { field, reason }) => {
                assert_eq!(field, "recommendations");
                assert!(reason.contains("got 2"));
            }
            other => panic!("expected recommendations defect, got {other:?}"),
        }
    }

    #[test]
    fn accepts_zero_score() {
        let reply = VALID.replace("45", "0").replace("\"yellow\"", "\"green\"");
        let result = parse_reply(&reply).expect("zero score is valid");
        assert_eq!(result.score, 0);
        assert_eq!(result.state, SemaphoreState::Green);
    }
}
