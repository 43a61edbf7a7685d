//! Canned replies and keyboards for the notes bot

use super::types::{Button, Trigger, View};
use crate::models::Note;
use crate::notes::PageWindow;
use crate::notes::pagination::note_label;

pub const WELCOME_TEXT: &str = "Hi! This is a simple note-taking bot.\n\n\
    • 📝 Create notes\n\
    • 📚 Keep as many as you like\n\
    • 🔍 View, edit and delete them\n\n\
    Press a button below.";

pub const HELP_TEXT: &str = "Help:\n\
    • \"New note\" creates a note\n\
    • \"My notes\" shows a paged list\n\
    • While viewing a note: ✏️ edit, 🗑 delete\n\
    • /cancel stops an unfinished note";

pub const GENERIC_ERROR_TEXT: &str = "⚠️ Something went wrong, please try again.";

fn home_row() -> Vec<Button> {
    vec![Button::new("🏠 Menu", Trigger::Home)]
}

fn cancel_rows() -> Vec<Vec<Button>> {
    vec![vec![Button::new("❌ Cancel", Trigger::Cancel)]]
}

pub fn main_menu_rows() -> Vec<Vec<Button>> {
    vec![
        vec![Button::new("📝 New note", Trigger::New)],
        vec![Button::new("📚 My notes", Trigger::List { page: 0 })],
        vec![Button::new("❓ Help", Trigger::Help)],
    ]
}

fn with_main_menu(text: &str) -> View {
    View::new(text, main_menu_rows())
}

pub fn welcome() -> View {
    with_main_menu(WELCOME_TEXT)
}

pub fn home() -> View {
    with_main_menu("Main menu:")
}

pub fn help() -> View {
    with_main_menu(HELP_TEXT)
}

pub fn empty_list() -> View {
    with_main_menu("You have no notes yet.")
}

pub fn note_not_found() -> View {
    with_main_menu("Note not found.")
}

pub fn update_failed() -> View {
    with_main_menu("Could not update the note.")
}

pub fn delete_failed() -> View {
    with_main_menu("Could not delete the note.")
}

pub fn deleted_last_note() -> View {
    with_main_menu("Note deleted. No more notes.")
}

pub fn cancelled() -> View {
    with_main_menu("❌ Cancelled.")
}

pub fn idle_hint() -> View {
    with_main_menu("To save a note, press \"New note\" first.")
}

pub fn generic_error() -> View {
    with_main_menu(GENERIC_ERROR_TEXT)
}

pub fn new_note_prompt() -> View {
    View::new("Send the note text in a single message:", cancel_rows())
}

pub fn edit_note_prompt() -> View {
    View::new("Send the new text of the note:", cancel_rows())
}

pub fn empty_new_note() -> View {
    View::new("I don't save empty notes. Please send some text.", cancel_rows())
}

pub fn empty_edit() -> View {
    View::new("Didn't get that. Please try again.", cancel_rows())
}

/// Edit / delete / back keyboard for a single note.
pub fn note_actions(note_id: i64, page: u64) -> Vec<Vec<Button>> {
    vec![
        vec![
            Button::new("✏️ Edit", Trigger::Edit { note_id, page }),
            Button::new("🗑 Delete", Trigger::Delete { note_id, page }),
        ],
        vec![Button::new("⬅️ Back to list", Trigger::List { page })],
        home_row(),
    ]
}

pub fn note(note: &Note, page: u64) -> View {
    View::new(note.text.clone(), note_actions(note.id, page))
}

pub fn note_saved(note_id: i64) -> View {
    View::new("✅ Saved!", note_actions(note_id, 0))
}

pub fn note_updated(note_id: i64, page: u64) -> View {
    View::new("✏️ Updated.", note_actions(note_id, page))
}

/// One button per note, then the navigation row and a way home.
pub fn notes_list(header: &str, notes: &[Note], window: &PageWindow) -> View {
    let mut rows: Vec<Vec<Button>> = notes
        .iter()
        .map(|n| {
            vec![Button::new(
                format!("📄 {}", note_label(&n.text)),
                Trigger::View {
                    note_id: n.id,
                    page: window.page,
                },
            )]
        })
        .collect();

    let mut nav = Vec::with_capacity(3);
    if window.has_prev() {
        nav.push(Button::new("◀️", Trigger::List { page: window.page - 1 }));
    }
    nav.push(Button::new(window.indicator(), Trigger::Noop));
    if window.has_next() {
        nav.push(Button::new("▶️", Trigger::List { page: window.page + 1 }));
    }
    rows.push(nav);
    rows.push(home_row());

    View::new(header, rows)
}

pub fn list_header(total: u64) -> String {
    format!("Your notes ({}):", total)
}

pub const DELETED_HEADER: &str = "🗑 Deleted.";
