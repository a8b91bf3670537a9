/// Placeholder a user template uses to mark where the input text goes.
pub const TEXT_PLACEHOLDER: &str = "{text_to_summarize}";

/// Prompt templates for summaries
pub struct SummaryPrompts;

impl SummaryPrompts {
    /// The default prompt: a concise, faithful summary with no added opinions.
    pub fn default_summary(text: &str) -> String {
        format!(
            r#"Please provide a concise and comprehensive summary of the following text.
Highlight the key points and main ideas, while maintaining the original context and meaning.
Do not add any information that is not present in the original text.
Avoid personal opinions or interpretations. The summary should be easy to read and understand.

Text to summarize:
{text}

Summary:"#
        )
    }
}

/// A user-supplied prompt template. `{text_to_summarize}` marks the input
/// text; `{{` and `}}` stand for literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn has_placeholder(&self) -> bool {
        let mut found = false;
        self.expand(|piece| found |= matches!(piece, Piece::Text));
        found
    }

    pub fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + text.len());
        self.expand(|piece| match piece {
            Piece::Literal(s) => out.push_str(s),
            Piece::Text => out.push_str(text),
        });
        out
    }

    /// Walk the template once, so braces inside the substituted text are
    /// never treated as escapes.
    fn expand<'a>(&'a self, mut emit: impl FnMut(Piece<'a>)) {
        let mut rest = self.template.as_str();
        while let Some(idx) = rest.find(['{', '}']) {
            emit(Piece::Literal(&rest[..idx]));
            let tail = &rest[idx..];
            if tail.starts_with("{{") {
                emit(Piece::Literal("{"));
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                emit(Piece::Literal("}"));
                rest = &tail[2..];
            } else if tail.starts_with(TEXT_PLACEHOLDER) {
                emit(Piece::Text);
                rest = &tail[TEXT_PLACEHOLDER.len()..];
            } else {
                emit(Piece::Literal(&tail[..1]));
                rest = &tail[1..];
            }
        }
        emit(Piece::Literal(rest));
    }
}

enum Piece<'a> {
    Literal(&'a str),
    Text,
}
