//! Prompt assembly
//!
//! Fills the fixed two-role template (system, human) with retrieved
//! context and the user's question.

use crate::retrieval::RetrievedContext;
use serde::Serialize;

/// Placeholder replaced by the rendered context
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// System instruction for the medical assistant
pub const SYSTEM_PROMPT: &str = concat!(
    "You are an assistant for question-answering tasks. ",
    "Respond by providing a patient-friendly explanation, outlining treatment options, ",
    "and answering a frequently asked question about the condition or symptoms. ",
    "Also include guidance on next steps and when to seek medical attention. ",
    "Use the following pieces of retrieved context to answer. ",
    "Give only relevant answer. ",
    "If you don't know the answer, say that you don't know or it is not related to medicine. ",
    "Use two sentences maximum and keep the answer concise.",
    "\n\n",
    "{context}"
);

/// Role of one prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One rendered message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Assembled prompt for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub human: String,
}

impl Prompt {
    /// Chat-style message list
    pub fn to_messages(&self) -> Vec<Message> {
        vec![
            Message {
                role: Role::System,
                content: self.system.clone(),
            },
            Message {
                role: Role::User,
                content: self.human.clone(),
            },
        ]
    }

    /// Single string for completion-style models
    pub fn to_completion_text(&self) -> String {
        format!("System: {}\nHuman: {}", self.system, self.human)
    }
}

/// Fills a system template with context and pairs it with the question
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_template: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(SYSTEM_PROMPT)
    }
}

impl PromptAssembler {
    pub fn new(system_template: impl Into<String>) -> Self {
        Self {
            system_template: system_template.into(),
        }
    }

    /// Build the prompt. Empty context leaves the placeholder blank.
    pub fn assemble(&self, context: &RetrievedContext, question: &str) -> Prompt {
        Prompt {
            system: self.system_template.replace(CONTEXT_PLACEHOLDER, &context.render()),
            human: question.to_string(),
        }
    }
}
