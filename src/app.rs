use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use codeai::api::ChatClient;
use codeai::segment::{segment, Segment};
use codeai::session::{ChatSession, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Transcript,
    Input,
}

/// A code segment extracted from the transcript, addressable for
/// selection and clipboard copy.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub body: String,
}

/// How long the "copied" confirmation stays on a code block.
pub const COPY_FLASH_MILLIS: u64 = 1200;

/// Copy confirmation state: `block` shows the confirmed label until
/// `until` passes. Copying again, on any block, replaces the deadline.
#[derive(Debug, Clone, Copy)]
pub struct CopyFlash {
    pub block: usize,
    pub until: Instant,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    pub session: ChatSession,
    pub client: ChatClient,

    // Prompt input
    pub input: String,
    pub cursor: usize,

    // Transcript scroll
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub total_chat_lines: u16,
    pub follow_chat: bool,

    // Pending reply
    pub reply_task: Option<JoinHandle<Result<String>>>,
    pub animation_frame: u8,

    // Code block selection and copy confirmation
    pub selected_block: Option<usize>,
    pub copy_flash: Option<CopyFlash>,

    // Popup state
    pub show_attach_input: bool,
    pub attach_input: String,
    pub attach_cursor: usize,
    pub show_clear_confirm: bool,
    pub notice: Option<String>,
}

impl App {
    pub fn new(client: ChatClient, mode: Mode) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            session: ChatSession::new(mode),
            client,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            total_chat_lines: 0,
            follow_chat: true,

            reply_task: None,
            animation_frame: 0,

            selected_block: None,
            copy_flash: None,

            show_attach_input: false,
            attach_input: String::new(),
            attach_cursor: 0,
            show_clear_confirm: false,
            notice: None,
        }
    }

    /// Advance timed UI state: thinking animation, copy-confirmation
    /// expiry, stale block selection.
    pub fn tick(&mut self) {
        if self.session.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if let Some(flash) = self.copy_flash {
            if Instant::now() >= flash.until {
                self.copy_flash = None;
            }
        }

        let blocks = self.code_blocks().len();
        if self.selected_block.is_some_and(|i| i >= blocks) {
            self.selected_block = None;
        }
    }

    /// Submit the current input. No-op while a request is in flight or
    /// when the input trims to nothing.
    pub fn submit(&mut self) {
        let Some(prompt) = self.session.begin_submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.follow_chat = true;

        let client = self.client.clone();
        self.reply_task = Some(tokio::spawn(async move { client.send(&prompt).await }));
    }

    /// Settle the pending reply once its task has finished.
    pub async fn poll_reply(&mut self) {
        if !self.reply_task.as_ref().is_some_and(|t| t.is_finished()) {
            return;
        }
        if let Some(task) = self.reply_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow!("reply task panicked: {err}")),
            };
            self.session.finish_submit(result);
            self.follow_chat = true;
        }
    }

    // Code block selection

    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        self.session
            .messages()
            .iter()
            .flat_map(|msg| segment(&msg.content))
            .filter_map(|seg| match seg {
                Segment::Code { language, body } => Some(CodeBlock { language, body }),
                Segment::Text { .. } => None,
            })
            .collect()
    }

    pub fn select_next_block(&mut self) {
        let len = self.code_blocks().len();
        if len == 0 {
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        });
    }

    pub fn select_prev_block(&mut self) {
        let len = self.code_blocks().len();
        if len == 0 {
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) => i.saturating_sub(1),
            None => len - 1,
        });
    }

    /// Copy the selected code block to the clipboard and flash the
    /// confirmation label. Re-copying restarts the timer.
    pub fn copy_selected_block(&mut self) {
        let Some(idx) = self.selected_block else {
            return;
        };
        let blocks = self.code_blocks();
        let Some(block) = blocks.get(idx) else {
            return;
        };

        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(block.body.clone())) {
            Ok(()) => {
                debug!(
                    block = idx,
                    language = block.language.as_deref().unwrap_or("plain"),
                    "code block copied"
                );
                self.copy_flash = Some(CopyFlash {
                    block: idx,
                    until: Instant::now() + Duration::from_millis(COPY_FLASH_MILLIS),
                });
            }
            Err(err) => {
                warn!("clipboard copy failed: {err}");
                self.notice = Some(format!("Could not access the clipboard: {}", err));
            }
        }
    }

    // Transcript scrolling

    pub fn scroll_down(&mut self) {
        let max = self.total_chat_lines.saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(1).min(max);
        self.follow_chat = self.chat_scroll >= max;
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
        self.follow_chat = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max = self.total_chat_lines.saturating_sub(self.chat_height);
        self.chat_scroll = (self.chat_scroll + half_page).min(max);
        self.follow_chat = self.chat_scroll >= max;
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.chat_scroll = self.chat_scroll.saturating_sub(half_page);
        self.follow_chat = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_chat = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_chat = true;
    }
}
