//! Conversion between the engine's message types and the Anthropic
//! Messages API wire format.

use serde_json::{json, Value};

use contour_core::context::PromptContext;
use contour_core::errors::GatewayError;
use contour_core::gateway::RequestOptions;
use contour_core::ids::ToolCallId;
use contour_core::messages::{
    AssistantContent, AssistantMessage, Message, StopReason, ToolCallBlock,
};

/// Build the request body for a non-streaming messages call.
pub fn build_request_body(context: &PromptContext, options: &RequestOptions, model: &str) -> Value {
    let mut body = json!({
        "model": model,
        "max_tokens": options.max_tokens,
    });

    if let Some(temp) = options.temperature {
        body["temperature"] = json!(temp);
    }

    if !context.system_blocks.is_empty() {
        let system: Vec<Value> = context
            .system_blocks
            .iter()
            .map(|b| json!({"type": "text", "text": b.content}))
            .collect();
        body["system"] = json!(system);
    }

    body["messages"] = json!(convert_messages(&context.messages));

    if !context.tools.is_empty() {
        let tools: Vec<Value> = context
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema,
                })
            })
            .collect();
        body["tools"] = json!(tools);
    }

    body
}

/// Convert conversation history to API message format. Consecutive tool
/// results collapse into a single user message, as the API requires.
fn convert_messages(messages: &[Message]) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    let mut pending_results: Vec<Value> = Vec::new();

    for msg in messages {
        match msg {
            Message::ToolResult(tr) => {
                pending_results.push(json!({
                    "type": "tool_result",
                    "tool_use_id": tr.tool_call_id.as_str(),
                    "content": tr.content,
                }));
            }
            other => {
                flush_tool_results(&mut result, &mut pending_results);
                match other {
                    Message::User(user) => {
                        result.push(json!({
                            "role": "user",
                            "content": [{"type": "text", "text": user.content}],
                        }));
                    }
                    Message::Assistant(asst) => {
                        result.push(convert_assistant_message(asst));
                    }
                    Message::ToolResult(_) => unreachable!(),
                }
            }
        }
    }
    flush_tool_results(&mut result, &mut pending_results);

    result
}

fn flush_tool_results(result: &mut Vec<Value>, pending: &mut Vec<Value>) {
    if !pending.is_empty() {
        result.push(json!({"role": "user", "content": std::mem::take(pending)}));
    }
}

fn convert_assistant_message(msg: &AssistantMessage) -> Value {
    let content: Vec<Value> = msg
        .content
        .iter()
        .map(|c| match c {
            AssistantContent::Text { text } => json!({"type": "text", "text": text}),
            AssistantContent::ToolCall(tc) => json!({
                "type": "tool_use",
                "id": tc.id.as_str(),
                "name": tc.name,
                "input": tc.input,
            }),
        })
        .collect();

    json!({"role": "assistant", "content": content})
}

/// Parse a messages API response into an assistant message.
pub fn parse_response(body: &Value) -> Result<AssistantMessage, GatewayError> {
    let blocks = body["content"]
        .as_array()
        .ok_or_else(|| GatewayError::MalformedResponse("missing content array".into()))?;

    let mut content = Vec::new();
    for block in blocks {
        match block["type"].as_str() {
            Some("text") => {
                let text = block["text"].as_str().unwrap_or_default().to_string();
                content.push(AssistantContent::Text { text });
            }
            Some("tool_use") => {
                let id = block["id"]
                    .as_str()
                    .map(ToolCallId::from_raw)
                    .unwrap_or_default();
                let name = block["name"].as_str().unwrap_or_default().to_string();
                content.push(AssistantContent::ToolCall(ToolCallBlock {
                    id,
                    name,
                    input: block["input"].clone(),
                }));
            }
            // Thinking and other block kinds are not replayed into history.
            _ => {}
        }
    }

    let stop_reason = match body["stop_reason"].as_str() {
        Some("end_turn") => Some(StopReason::EndTurn),
        Some("tool_use") => Some(StopReason::ToolUse),
        Some("max_tokens") => Some(StopReason::MaxTokens),
        _ => None,
    };

    Ok(AssistantMessage { content, stop_reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::context::{BlockLabel, Stability, SystemBlock};
    use contour_core::tools::ToolDefinition;

    fn ctx_with(messages: Vec<Message>) -> PromptContext {
        PromptContext {
            system_blocks: vec![SystemBlock {
                content: "You interview stakeholders.".into(),
                stability: Stability::Stable,
                label: BlockLabel::Identity,
            }],
            messages,
            tools: vec![ToolDefinition {
                name: "park_item".into(),
                description: "park".into(),
                input_schema: json!({"type": "object"}),
            }],
        }
    }

    #[test]
    fn request_body_shape() {
        let ctx = ctx_with(vec![Message::user_text("hello")]);
        let body = build_request_body(&ctx, &RequestOptions::default(), "claude-sonnet-4-5");

        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"][0]["text"], "You interview stakeholders.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert_eq!(body["tools"][0]["name"], "park_item");
        assert!(body.get("temperature").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn temperature_included_when_set() {
        let ctx = ctx_with(vec![Message::user_text("hi")]);
        let opts = RequestOptions { max_tokens: 1024, temperature: Some(0.3) };
        let body = build_request_body(&ctx, &opts, "m");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn tool_results_collapse_into_one_user_message() {
        let id_a = ToolCallId::from_raw("toolu_a");
        let id_b = ToolCallId::from_raw("toolu_b");
        let ctx = ctx_with(vec![
            Message::user_text("hi"),
            Message::Assistant(AssistantMessage {
                content: vec![
                    AssistantContent::ToolCall(ToolCallBlock {
                        id: id_a.clone(),
                        name: "update_contour".into(),
                        input: json!({}),
                    }),
                    AssistantContent::ToolCall(ToolCallBlock {
                        id: id_b.clone(),
                        name: "advance_section".into(),
                        input: json!({}),
                    }),
                ],
                stop_reason: Some(StopReason::ToolUse),
            }),
            Message::tool_result(id_a, r#"{"success":true}"#),
            Message::tool_result(id_b, r#"{"success":true}"#),
        ]);

        let body = build_request_body(&ctx, &RequestOptions::default(), "m");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[2]["role"], "user");
        let results = messages[2]["content"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["type"], "tool_result");
        assert_eq!(results[0]["tool_use_id"], "toolu_a");
        assert_eq!(results[1]["tool_use_id"], "toolu_b");
    }

    #[test]
    fn parse_text_response() {
        let body = json!({
            "content": [{"type": "text", "text": "Let's begin."}],
            "stop_reason": "end_turn",
        });
        let msg = parse_response(&body).unwrap();
        assert_eq!(msg.text_content(), "Let's begin.");
        assert!(!msg.has_tool_calls());
        assert_eq!(msg.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn parse_tool_use_response() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Recording that."},
                {"type": "tool_use", "id": "toolu_01", "name": "update_contour",
                 "input": {"dimension_type": "vocabulary_map", "operation": "add",
                           "node_data": {"term": "BU"}}},
            ],
            "stop_reason": "tool_use",
        });
        let msg = parse_response(&body).unwrap();
        assert_eq!(msg.tool_calls().len(), 1);
        let tc = msg.tool_calls()[0];
        assert_eq!(tc.id.as_str(), "toolu_01");
        assert_eq!(tc.name, "update_contour");
        assert_eq!(tc.input["node_data"]["term"], "BU");
        assert_eq!(msg.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn parse_missing_content_is_error() {
        let body = json!({"stop_reason": "end_turn"});
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }
}
