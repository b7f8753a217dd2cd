use chrono::Utc;

use kiln_types::api::{ChatRequest, ChatResponse, CodeBlock};
use kiln_types::models::MessageMetadata;

use crate::templates::{Template, TemplateKind};

pub const FALLBACK_MODEL: &str = "fallback-system";

/// Keyword sets in priority order. First match wins.
const KEYWORDS: &[(TemplateKind, &[&str])] = &[
    (TemplateKind::Login, &["login", "sign in", "auth"]),
    (TemplateKind::Dashboard, &["dashboard", "stats", "analytics"]),
    (TemplateKind::Button, &["button", "btn"]),
];

/// Pick the canned template for a free-text prompt.
pub fn resolve(prompt: &str) -> Template {
    let prompt = prompt.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| prompt.contains(w)))
        .map(|(kind, _)| kind.template())
        .unwrap_or_else(|| TemplateKind::Generic.template())
}

/// Answer a chat request without any upstream service.
pub fn respond(req: &ChatRequest) -> ChatResponse {
    let template = resolve(&req.message);

    let message = match template.kind {
        TemplateKind::Generic => format!(
            "I understand you want to create: \"{}\"\n\n\
             I'm currently using a fallback system. For the best experience, please ensure the \
             generation API integration is properly configured.\n\n\
             Here's a basic React component structure you can customize:",
            req.message
        ),
        kind => format!(
            "I'll create a {} component for you.\n\n\
             This component uses modern React patterns with TypeScript and Tailwind CSS, \
             following best practices for accessibility and responsive design.",
            kind.label()
        ),
    };

    ChatResponse {
        message,
        code: vec![CodeBlock {
            language: Some("tsx".to_string()),
            file_path: template.file_path.to_string(),
            content: template.source.to_string(),
        }],
        metadata: MessageMetadata {
            model: Some(FALLBACK_MODEL.to_string()),
            timestamp: Some(Utc::now()),
            thread_id: req.thread_id,
            ..MessageMetadata::default()
        },
    }
}
