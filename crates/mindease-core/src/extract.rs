use serde_json::Value;

use crate::ai::GenerationResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("response had no body")]
    NoBody,
    #[error("response contained no usable text")]
    NoText,
    #[error("response contained no non-blank tips")]
    NoValidTips,
}

/// Text of the first part of the first candidate.
///
/// Blank text counts as missing.
pub fn first_text(response: &GenerationResponse) -> Result<String, ExtractionError> {
    response
        .candidates
        .as_deref()
        .and_then(|items| items.first())
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.as_deref())
        .and_then(|items| items.first())
        .and_then(|part| part.text.as_deref())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(ExtractionError::NoText)
}

/// Same as [`first_text`], for a body the client may not have received.
pub fn extract(body: Option<&GenerationResponse>) -> Result<String, ExtractionError> {
    body.ok_or(ExtractionError::NoBody).and_then(first_text)
}

/// Split a batch answer into individual tips.
///
/// The text is read as a JSON array first. When it isn't one, the whole
/// trimmed text is a single tip.
pub fn parse_tip_batch(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    match serde_json::from_str::<Vec<Value>>(strip_code_fence(trimmed)) {
        Ok(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .map(|tip| tip.trim().to_string())
            .filter(|tip| !tip.is_empty())
            .collect(),
        Err(_) if trimmed.is_empty() => Vec::new(),
        Err(_) => vec![trimmed.to_string()],
    }
}

/// Models often wrap JSON in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Candidate, CandidateContent, ResponsePart};

    fn response_with_parts(parts: Option<Vec<ResponsePart>>) -> GenerationResponse {
        GenerationResponse {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent { parts }),
            }]),
        }
    }

    #[test]
    fn test_first_text_present() {
        let response = GenerationResponse::with_text("Hello from AI");
        assert_eq!(first_text(&response).unwrap(), "Hello from AI");
    }

    #[test]
    fn test_first_text_short_circuits_at_every_level() {
        let cases = vec![
            GenerationResponse { candidates: None },
            GenerationResponse {
                candidates: Some(vec![]),
            },
            GenerationResponse {
                candidates: Some(vec![Candidate { content: None }]),
            },
            response_with_parts(None),
            response_with_parts(Some(vec![])),
            response_with_parts(Some(vec![ResponsePart { text: None }])),
            GenerationResponse::with_text(""),
            GenerationResponse::with_text(" \n\t "),
        ];
        for response in cases {
            assert_eq!(first_text(&response), Err(ExtractionError::NoText));
        }
    }

    #[test]
    fn test_first_text_only_reads_first_part() {
        let response = response_with_parts(Some(vec![
            ResponsePart { text: None },
            ResponsePart {
                text: Some("second".to_string()),
            },
        ]));
        assert_eq!(first_text(&response), Err(ExtractionError::NoText));
    }

    #[test]
    fn test_extract_missing_body() {
        assert_eq!(extract(None), Err(ExtractionError::NoBody));
    }

    #[test]
    fn test_parse_batch_json_array() {
        assert_eq!(parse_tip_batch(r#"["A","B"]"#), vec!["A", "B"]);
    }

    #[test]
    fn test_parse_batch_falls_back_to_single_tip() {
        assert_eq!(parse_tip_batch("Just one tip"), vec!["Just one tip"]);
        assert_eq!(parse_tip_batch("  [not json  "), vec!["[not json"]);
    }

    #[test]
    fn test_parse_batch_drops_blank_items() {
        assert_eq!(parse_tip_batch(r#"[" A ", "", "  "]"#), vec!["A"]);
        assert!(parse_tip_batch(r#"["", " "]"#).is_empty());
    }

    #[test]
    fn test_parse_batch_fenced_json() {
        let text = "```json\n[\"Breathe\", \"Walk\"]\n```";
        assert_eq!(parse_tip_batch(text), vec!["Breathe", "Walk"]);
    }
}
