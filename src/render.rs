use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::fmt;

use crate::backend::ToolCall;
use crate::escape::escape_html;
use crate::markdown::render_markdown;

/// String arguments longer than this are shortened for display.
const MAX_ARG_CHARS: usize = 60;
const KEPT_ARG_CHARS: usize = 57;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Agent",
            Role::System => "System",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message bubble ready for the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub role: Role,
    /// Text as it was submitted or received.
    pub content: String,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallSummary {
    pub name: String,
    /// Display form of the arguments, see [`format_arguments`].
    pub arguments: String,
}

/// One "Action summary" block covering every tool call of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedToolCalls {
    pub calls: Vec<ToolCallSummary>,
    pub markup: String,
}

fn bubble(role: Role, inner: &str) -> String {
    format!(
        r#"<div class="message {role}-message"><div class="message-content">{inner}</div></div>"#
    )
}

/// Build the bubble for a message.
///
/// Assistant and system text is trusted and goes through markdown. User text
/// is always escaped and never interpreted as markup.
pub fn render_message(role: Role, content: &str) -> RenderedMessage {
    let inner = match role {
        Role::Assistant | Role::System => render_markdown(content),
        Role::User => format!("<p>{}</p>", escape_html(content)),
    };

    RenderedMessage {
        role,
        content: content.to_string(),
        markup: bubble(role, &inner),
    }
}

fn truncate_value(value: Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_ARG_CHARS => {
            let mut short: String = s.chars().take(KEPT_ARG_CHARS).collect();
            short.push_str(ELLIPSIS);
            Value::String(short)
        }
        other => other,
    }
}

fn to_compact_pretty(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Format JSON-encoded tool arguments for display.
///
/// Top-level string fields and array elements over 60 characters keep their
/// first 57 characters plus `...`. Text that is not JSON is returned unchanged.
pub fn format_arguments(raw: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(raw) else {
        return raw.to_string();
    };

    let simplified = match parsed {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, truncate_value(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(truncate_value).collect()),
        other => other,
    };

    to_compact_pretty(&simplified).unwrap_or_else(|_| raw.to_string())
}

/// Build the summary block for a response's tool calls, in invocation order.
pub fn render_tool_calls(tool_calls: &[ToolCall]) -> RenderedToolCalls {
    let calls: Vec<ToolCallSummary> = tool_calls
        .iter()
        .map(|call| ToolCallSummary {
            name: call.name.clone(),
            arguments: format_arguments(&call.arguments),
        })
        .collect();

    let mut inner = String::from(r#"<p class="small">Action summary:</p>"#);
    for call in &calls {
        inner.push_str(&format!(
            concat!(
                r#"<div class="tool-call">"#,
                r#"<div class="tool-call-header"><span class="tool-name">{}</span></div>"#,
                r#"<div class="tool-args"><pre>{}</pre></div>"#,
                "</div>"
            ),
            escape_html(&call.name),
            escape_html(&call.arguments)
        ));
    }

    RenderedToolCalls {
        markup: bubble(Role::System, &inner),
        calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_user_message_is_escaped() {
        let msg = render_message(Role::User, "<script>alert('x')</script> **bold**");
        assert!(!msg.markup.contains("<script>"));
        assert!(msg.markup.contains("<p>&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt; **bold**</p>"));
        assert!(msg.markup.starts_with(r#"<div class="message user-message">"#));
        assert_eq!(msg.content, "<script>alert('x')</script> **bold**");
    }

    #[test]
    fn test_assistant_message_renders_markdown() {
        let msg = render_message(Role::Assistant, "You hold **3** tokens");
        assert!(msg.markup.contains("<strong>3</strong>"));
        assert!(msg.markup.contains("assistant-message"));
    }

    #[test]
    fn test_system_message_keeps_trusted_markup() {
        let msg = render_message(Role::System, "<em>notice</em>");
        assert!(msg.markup.contains("<em>notice</em>"));
        assert!(msg.markup.contains("system-message"));
    }

    #[test]
    fn test_long_string_argument_truncated() {
        let raw = format!(r#"{{"a":"{}"}}"#, "x".repeat(100));
        let formatted = format_arguments(&raw);
        let expected_value = format!("{}...", "x".repeat(57));
        assert_eq!(formatted, format!("{{\n \"a\": \"{expected_value}\"\n}}"));
    }

    #[test]
    fn test_sixty_char_argument_kept_whole() {
        let value = "y".repeat(60);
        let formatted = format_arguments(&format!(r#"{{"to":"{value}"}}"#));
        assert!(formatted.contains(&value));
        assert!(!formatted.contains("..."));
    }

    #[test]
    fn test_argument_key_order_and_types_preserved() {
        let formatted = format_arguments(r#"{"to":"0xabc","amount":1.5,"nested":{"k":"v"}}"#);
        assert_eq!(
            formatted,
            "{\n \"to\": \"0xabc\",\n \"amount\": 1.5,\n \"nested\": {\n  \"k\": \"v\"\n }\n}"
        );
    }

    #[test]
    fn test_truncation_counts_characters() {
        let value = "é".repeat(70);
        let formatted = format_arguments(&format!(r#"{{"memo":"{value}"}}"#));
        assert!(formatted.contains(&format!("{}...", "é".repeat(57))));
    }

    #[test]
    fn test_array_arguments_truncated_per_element() {
        let raw = format!(r#"["short","{}",7]"#, "z".repeat(80));
        let formatted = format_arguments(&raw);
        assert_eq!(
            formatted,
            format!("[\n \"short\",\n \"{}...\",\n 7\n]", "z".repeat(57))
        );
    }

    #[test]
    fn test_non_json_arguments_shown_raw() {
        assert_eq!(format_arguments("not json"), "not json");
    }

    #[test]
    fn test_tool_calls_rendered_in_order_and_escaped() {
        let block = render_tool_calls(&[
            call("get_balance", r#"{"address":"0x1"}"#),
            call("<swap>", "not json"),
        ]);

        assert_eq!(block.calls.len(), 2);
        assert_eq!(block.calls[0].name, "get_balance");
        assert_eq!(block.calls[1].arguments, "not json");

        let first = block.markup.find("get_balance").unwrap();
        let second = block.markup.find("&lt;swap&gt;").unwrap();
        assert!(first < second);
        assert!(!block.markup.contains("<swap>"));
        assert!(block.markup.contains("&quot;address&quot;"));
        assert!(block.markup.contains("Action summary:"));
    }
}
