//! File attach flow: disk read plus session attach, the way the TUI
//! popup drives it.

use codeai::session::{ChatSession, ChatRole, Mode};
use codeai::upload::{file_name_of, CONTEXT_CAP};
use std::io::Write;
use tempfile::Builder;

#[tokio::test]
async fn attach_accepted_from_disk() {
    let mut file = Builder::new().suffix(".py").tempfile().unwrap();
    write!(file, "def main():\n    pass\n").unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let file_name = file_name_of(&path);

    let mut session = ChatSession::new(Mode::Code);
    session.attach_file(&file_name, &content).unwrap();

    let ctx = session.file_context().unwrap();
    assert!(ctx.file_name.ends_with(".py"));
    assert!(ctx.instructions.contains("def main():"));

    let echo = session.messages().last().unwrap();
    assert_eq!(echo.role, ChatRole::User);
    assert!(echo.content.starts_with(&format!("File uploaded: {}", file_name)));
}

#[tokio::test]
async fn attach_rejected_extension_from_disk() {
    let mut file = Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"not really an image").unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let content = tokio::fs::read_to_string(&path).await.unwrap();

    let mut session = ChatSession::new(Mode::Chat);
    assert!(session
        .attach_file(&file_name_of(&path), &content)
        .is_err());
    assert!(session.file_context().is_none());
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test]
async fn oversized_file_is_capped_through_the_flow() {
    let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
    let payload = "z".repeat(CONTEXT_CAP + 1000);
    file.write_all(payload.as_bytes()).unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let content = tokio::fs::read_to_string(&path).await.unwrap();

    let mut session = ChatSession::new(Mode::Chat);
    session
        .attach_file(&file_name_of(&path), &content)
        .unwrap();

    let carried = session
        .file_context()
        .unwrap()
        .instructions
        .chars()
        .filter(|c| *c == 'z')
        .count();
    assert_eq!(carried, CONTEXT_CAP);
}
