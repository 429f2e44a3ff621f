//! Conversation state shared by the TUI and the one-shot CLI.
//!
//! The session owns the message transcript, the optional uploaded-file
//! context, the active mode, and the single in-flight guard. All state
//! transitions live here so the submission rules are testable without a
//! terminal or a network.

use crate::upload::FileContext;
use anyhow::Result;
use tracing::{info, warn};

/// Assistant message shown when the backend reply field is absent or empty.
pub const NO_RESPONSE_FALLBACK: &str = "No response";

/// Assistant message synthesized when the exchange fails.
pub const BACKEND_ERROR_NOTICE: &str =
    "Backend error. Make sure the CodeAI server is running.";

/// Assistant message confirming a chat reset.
pub const CLEARED_NOTICE: &str = "Chat cleared. Ask a new question or attach another file.";

const GREETING: &str = "Hi! Ask a question about your code, or attach a file to discuss it.";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Active conversation mode. Affects only the input placeholder guidance,
/// never the request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Chat,
    Code,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Code => "code",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chat" => Some(Mode::Chat),
            "code" => Some(Mode::Code),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Mode::Chat => Mode::Code,
            Mode::Code => Mode::Chat,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Mode::Chat => "Ask something...",
            Mode::Code => "Ask about the uploaded code or paste code...",
        }
    }
}

pub struct ChatSession {
    messages: Vec<ChatMessage>,
    file_context: Option<FileContext>,
    mode: Mode,
    sending: bool,
}

impl ChatSession {
    pub fn new(mode: Mode) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ChatRole::Assistant,
                content: GREETING.to_string(),
            }],
            file_context: None,
            mode,
            sending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn file_context(&self) -> Option<&FileContext> {
        self.file_context.as_ref()
    }

    /// Start a submission cycle.
    ///
    /// Returns the composed outbound prompt, or `None` when a request is
    /// already in flight or the input trims to nothing. On success the user
    /// message is appended and the in-flight guard is raised; the caller
    /// must settle it with [`finish_submit`](Self::finish_submit).
    pub fn begin_submit(&mut self, input: &str) -> Option<String> {
        if self.sending {
            return None;
        }
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.to_string(),
        });
        self.sending = true;
        Some(compose_prompt(self.file_context.as_ref(), text))
    }

    /// Settle the in-flight submission. Always releases the guard.
    pub fn finish_submit(&mut self, result: Result<String>) {
        let content = match result {
            Ok(reply) if reply.is_empty() => NO_RESPONSE_FALLBACK.to_string(),
            Ok(reply) => reply,
            Err(err) => {
                warn!("chat request failed: {err:#}");
                BACKEND_ERROR_NOTICE.to_string()
            }
        };
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
        self.sending = false;
    }

    /// Attach an uploaded file: validates, echoes the upload into the
    /// transcript, and replaces any existing context. Rejection leaves all
    /// state untouched.
    pub fn attach_file(&mut self, file_name: &str, content: &str) -> Result<()> {
        let context = FileContext::from_file(file_name, content)?;
        info!(file = file_name, "file context attached");
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: context.upload_notice(content),
        });
        self.file_context = Some(context);
        Ok(())
    }

    /// Clear the transcript, the file context, and the in-flight guard,
    /// leaving a single confirmation message. Callers are expected to have
    /// confirmed with the user first.
    pub fn reset(&mut self) {
        info!("chat reset");
        self.messages.clear();
        self.file_context = None;
        self.sending = false;
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: CLEARED_NOTICE.to_string(),
        });
    }
}

/// Compose the outbound prompt: the file context instructions followed by a
/// labeled question section, or the question verbatim when no file is
/// attached.
pub fn compose_prompt(context: Option<&FileContext>, question: &str) -> String {
    match context {
        Some(ctx) => format!("{}\n\nUser question:\n{}", ctx.instructions, question),
        None => question.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn session() -> ChatSession {
        ChatSession::new(Mode::Chat)
    }

    #[test]
    fn new_session_greets_once() {
        let s = session();
        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].role, ChatRole::Assistant);
        assert!(!s.is_sending());
    }

    #[test]
    fn empty_and_whitespace_input_is_ignored() {
        let mut s = session();
        assert!(s.begin_submit("").is_none());
        assert!(s.begin_submit("   ").is_none());
        assert_eq!(s.messages().len(), 1);
        assert!(!s.is_sending());
    }

    #[test]
    fn submit_without_context_sends_text_verbatim() {
        let mut s = session();
        let prompt = s.begin_submit("hello").unwrap();
        assert_eq!(prompt, "hello");
        assert!(s.is_sending());
        let last = s.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert_eq!(last.content, "hello");
    }

    #[test]
    fn submit_trims_before_recording() {
        let mut s = session();
        let prompt = s.begin_submit("  hello  ").unwrap();
        assert_eq!(prompt, "hello");
        assert_eq!(s.messages().last().unwrap().content, "hello");
    }

    #[test]
    fn submit_with_context_prepends_instructions() {
        let mut s = session();
        s.attach_file("main.py", "print(1)").unwrap();
        let prompt = s.begin_submit("hello").unwrap();
        let instructions = &s.file_context().unwrap().instructions;
        assert_eq!(
            prompt,
            format!("{}\n\nUser question:\nhello", instructions)
        );
    }

    #[test]
    fn second_submit_while_pending_is_dropped() {
        let mut s = session();
        assert!(s.begin_submit("first").is_some());
        assert!(s.begin_submit("second").is_none());
        // Only the first user message was recorded
        let users = s
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count();
        assert_eq!(users, 1);
    }

    #[test]
    fn finish_releases_guard_on_success_and_failure() {
        let mut s = session();
        s.begin_submit("q").unwrap();
        s.finish_submit(Ok("a reply".to_string()));
        assert!(!s.is_sending());
        assert_eq!(s.messages().last().unwrap().content, "a reply");

        s.begin_submit("again").unwrap();
        s.finish_submit(Err(anyhow!("connection refused")));
        assert!(!s.is_sending());
        assert_eq!(s.messages().last().unwrap().content, BACKEND_ERROR_NOTICE);
    }

    #[test]
    fn empty_reply_falls_back() {
        let mut s = session();
        s.begin_submit("q").unwrap();
        s.finish_submit(Ok(String::new()));
        assert_eq!(
            s.messages().last().unwrap().content,
            NO_RESPONSE_FALLBACK
        );
    }

    #[test]
    fn rejected_attach_leaves_state_untouched() {
        let mut s = session();
        assert!(s.attach_file("diagram.png", "bytes").is_err());
        assert_eq!(s.messages().len(), 1);
        assert!(s.file_context().is_none());
    }

    #[test]
    fn attach_echoes_upload_and_replaces_context() {
        let mut s = session();
        s.attach_file("a.txt", "first").unwrap();
        assert_eq!(s.messages().len(), 2);
        let echo = s.messages().last().unwrap();
        assert_eq!(echo.role, ChatRole::User);
        assert!(echo.content.contains("a.txt"));
        assert!(echo.content.contains("first"));

        s.attach_file("b.txt", "second").unwrap();
        assert_eq!(s.file_context().unwrap().file_name, "b.txt");
    }

    #[test]
    fn reset_leaves_single_confirmation() {
        let mut s = session();
        s.attach_file("a.txt", "data").unwrap();
        s.begin_submit("question").unwrap();
        s.reset();

        assert_eq!(s.messages().len(), 1);
        assert_eq!(s.messages()[0].content, CLEARED_NOTICE);
        assert!(s.file_context().is_none());
        assert!(!s.is_sending());
    }

    #[test]
    fn mode_toggles_and_parses() {
        assert_eq!(Mode::Chat.toggled(), Mode::Code);
        assert_eq!(Mode::from_str("CODE"), Some(Mode::Code));
        assert_eq!(Mode::from_str("unknown"), None);
        assert_ne!(Mode::Chat.placeholder(), Mode::Code.placeholder());
    }
}
