use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, FocusPane, InputMode};
use crate::tui::Event;
use codeai::config::Config;
use codeai::upload;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Key(key) => handle_key(app, key).await?,
        Event::Resize => {}
        Event::Tick => {
            app.tick();
            app.poll_reply().await;
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Popups take priority over everything else
    if app.notice.is_some() {
        app.notice = None;
        return Ok(());
    }
    if app.show_attach_input {
        handle_attach_input(app, key).await;
        return Ok(());
    }
    if app.show_clear_confirm {
        handle_clear_confirm(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus the prompt input
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }
        KeyCode::Tab => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        // Code block selection and copy
        KeyCode::Char('n') => app.select_next_block(),
        KeyCode::Char('p') => app.select_prev_block(),
        KeyCode::Char('c') => app.copy_selected_block(),

        // Mode toggle adjusts the placeholder guidance only
        KeyCode::Char('m') => {
            let mode = app.session.mode().toggled();
            app.session.set_mode(mode);
            let _ = Config::save_default_mode(mode.as_str());
        }

        // Attach a file
        KeyCode::Char('f') => {
            app.show_attach_input = true;
            app.attach_input.clear();
            app.attach_cursor = 0;
        }

        // Clear chat, gated by confirmation
        KeyCode::Char('R') => {
            app.show_clear_confirm = true;
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = FocusPane::Transcript;
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

async fn handle_attach_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.show_attach_input = false;
            app.attach_input.clear();
            app.attach_cursor = 0;
        }
        KeyCode::Enter => {
            attach_from_path(app).await;
        }
        KeyCode::Backspace => {
            if app.attach_cursor > 0 {
                app.attach_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.attach_input, app.attach_cursor);
                app.attach_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.attach_cursor = app.attach_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.attach_input.chars().count();
            app.attach_cursor = (app.attach_cursor + 1).min(char_count);
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.attach_input, app.attach_cursor);
            app.attach_input.insert(byte_pos, c);
            app.attach_cursor += 1;
        }
        _ => {}
    }
}

/// Read the file named in the attach popup and hand it to the session.
/// The read is awaited inline, so attach operations never overlap.
async fn attach_from_path(app: &mut App) {
    let path = app.attach_input.trim().to_string();
    app.show_attach_input = false;
    app.attach_input.clear();
    app.attach_cursor = 0;

    if path.is_empty() {
        return;
    }

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let file_name = upload::file_name_of(&path);
            match app.session.attach_file(&file_name, &content) {
                Ok(()) => app.follow_chat = true,
                Err(err) => app.notice = Some(err.to_string()),
            }
        }
        Err(err) => {
            app.notice = Some(format!("Could not read {}: {}", path, err));
        }
    }
}

fn handle_clear_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.show_clear_confirm = false;
            // A reply that lands after the reset would repopulate the
            // cleared transcript; drop it with the rest of the session.
            if let Some(task) = app.reply_task.take() {
                task.abort();
            }
            app.session.reset();
            app.selected_block = None;
            app.copy_flash = None;
            app.follow_chat = true;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.show_clear_confirm = false;
        }
        _ => {}
    }
}
