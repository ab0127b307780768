//! Gemini `generateContent` request body.

use compact_str::CompactString;
use serde::Serialize;
use serde_json::{Value, json};
use tcore::{ChatFunction, ChatRequest};

/// Gemini request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Conversation contents: the user prompt, then function results.
    pub contents: Vec<Content>,
    /// System instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Function declarations, as a single group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

/// One content entry. `parts` is always an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    /// `user` or `function`; absent for system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    /// The parts.
    pub parts: Vec<Part>,
}

/// A content part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    /// Plain text.
    Text(String),
    /// Output of a previously requested function.
    FunctionResponse {
        /// Function name.
        name: CompactString,
        /// Function output, always an object.
        response: Value,
    },
}

/// A group of function declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// The declared functions.
    pub function_declarations: Vec<ChatFunction>,
}

impl From<&ChatRequest> for Request {
    fn from(req: &ChatRequest) -> Self {
        let mut contents = vec![Content {
            role: Some("user"),
            parts: vec![Part::Text(req.prompt.clone())],
        }];
        contents.extend(req.function_results.iter().map(|result| Content {
            role: Some("function"),
            parts: vec![Part::FunctionResponse {
                name: result.name.clone(),
                response: match &result.output {
                    Value::Object(_) => result.output.clone(),
                    other => json!({ "content": other }),
                },
            }],
        }));

        let system_instruction = req.instructions().map(|instructions| Content {
            role: None,
            parts: vec![Part::Text(instructions.to_owned())],
        });

        let tools = if req.functions.is_empty() {
            Vec::new()
        } else {
            vec![Tool {
                function_declarations: req.functions.clone(),
            }]
        };

        Self {
            contents,
            system_instruction,
            tools,
        }
    }
}
