use super::{AgentDirective, AgentError};
use serde_json::Value;

pub(super) fn parse_agent_action(content: &str) -> Result<AgentDirective, AgentError> {
    match extract_json(content) {
        Some(Value::Object(map)) => match map.get("action").and_then(Value::as_str) {
            Some("call_tool") => {
                let tool = map
                    .get("tool")
                    .or_else(|| map.get("tool_name"))
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AgentError::InvalidResponse("call_tool action missing tool field".into())
                    })?;
                let input = map
                    .get("input")
                    .or_else(|| map.get("arguments"))
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok(AgentDirective::CallTool {
                    tool: tool.to_string(),
                    input,
                })
            }
            Some("final") => {
                let response = map
                    .get("response")
                    .or_else(|| map.get("answer"))
                    .or_else(|| map.get("content"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AgentError::InvalidResponse("final action missing response field".into())
                    })?;
                Ok(AgentDirective::Final {
                    response: response.to_string(),
                })
            }
            Some(other) => Err(AgentError::InvalidResponse(format!(
                "unknown action value: {other}"
            ))),
            // JSON that ignores the protocol is still an answer.
            None => Ok(AgentDirective::Final {
                response: content.trim().to_string(),
            }),
        },
        _ => Ok(AgentDirective::Final {
            response: content.trim().to_string(),
        }),
    }
}

/// Finds a JSON value in model output: the whole text, a fenced block, or the
/// outermost `{...}` span.
pub(crate) fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced.trim()) {
            return Some(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            let candidate = &trimmed[start..=end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Some(value);
            }
        }
    }

    None
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n').map(|idx| idx + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}
