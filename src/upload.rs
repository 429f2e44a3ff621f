//! Uploaded-file context handling.
//!
//! An accepted upload becomes a single [`FileContext`]: the file content,
//! capped and framed as instructions that are prepended to every prompt
//! until the chat is cleared.

use anyhow::{anyhow, Result};
use std::path::Path;

/// Extensions accepted for upload, lowercase, without the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "md", "py", "js", "java", "json", "html", "css"];

/// Cap on the file content carried in the persisted context.
pub const CONTEXT_CAP: usize = 12_000;

/// Cap on the content preview echoed into the transcript.
pub const PREVIEW_CAP: usize = 6_000;

#[derive(Debug, Clone)]
pub struct FileContext {
    pub file_name: String,
    pub instructions: String,
}

impl FileContext {
    /// Build the context for an uploaded file, rejecting disallowed extensions.
    pub fn from_file(file_name: &str, content: &str) -> Result<Self> {
        let ext = extension(file_name)
            .ok_or_else(|| anyhow!("Only text or code files are supported"))?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(anyhow!("Only text or code files are supported"));
        }

        let instructions = format!(
            "The user uploaded the following file.\n\n\
             Filename: {}\n\n\
             Content:\n\
             ```\n{}\n```\n\n\
             Use this file to answer all future questions unless told otherwise.",
            file_name,
            truncate_chars(content, CONTEXT_CAP),
        );

        Ok(Self {
            file_name: file_name.to_string(),
            instructions,
        })
    }

    /// The transcript message acknowledging the upload, with a capped preview.
    pub fn upload_notice(&self, content: &str) -> String {
        format!(
            "File uploaded: {}\n\n```\n{}\n```",
            self.file_name,
            truncate_chars(content, PREVIEW_CAP),
        )
    }
}

/// File name portion of a path, for display and context framing.
pub fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallowed_extension_is_rejected() {
        assert!(FileContext::from_file("diagram.png", "binary").is_err());
        assert!(FileContext::from_file("noextension", "text").is_err());
    }

    #[test]
    fn allowed_extensions_are_accepted_case_insensitively() {
        assert!(FileContext::from_file("notes.txt", "hello").is_ok());
        assert!(FileContext::from_file("Main.PY", "print(1)").is_ok());
    }

    #[test]
    fn context_carries_filename_and_content() {
        let ctx = FileContext::from_file("lib.rs.py", "def f(): pass").unwrap();
        assert_eq!(ctx.file_name, "lib.rs.py");
        assert!(ctx.instructions.contains("Filename: lib.rs.py"));
        assert!(ctx.instructions.contains("def f(): pass"));
        assert!(ctx
            .instructions
            .contains("Use this file to answer all future questions"));
    }

    #[test]
    fn context_content_is_capped() {
        let content = "x".repeat(CONTEXT_CAP + 500);
        let ctx = FileContext::from_file("big.txt", &content).unwrap();
        let run = ctx
            .instructions
            .chars()
            .filter(|c| *c == 'x')
            .count();
        assert_eq!(run, CONTEXT_CAP);
    }

    #[test]
    fn preview_is_capped_shorter_than_context() {
        let content = "y".repeat(CONTEXT_CAP);
        let ctx = FileContext::from_file("big.txt", &content).unwrap();
        let notice = ctx.upload_notice(&content);
        let run = notice.chars().filter(|c| *c == 'y').count();
        assert_eq!(run, PREVIEW_CAP);
        assert!(notice.starts_with("File uploaded: big.txt"));
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let content = "é".repeat(10);
        assert_eq!(truncate_chars(&content, 4), "éééé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn file_name_of_strips_directories() {
        assert_eq!(file_name_of("/tmp/src/app.js"), "app.js");
        assert_eq!(file_name_of("app.js"), "app.js");
    }
}
