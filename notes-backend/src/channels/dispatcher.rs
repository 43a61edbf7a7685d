use std::sync::Arc;

use super::dialog::{DialogState, DialogStore};
use super::types::{Sender, Trigger, View};
use super::views;
use crate::errors::BotResult;
use crate::notes::{NoteStore, PageWindow};
use crate::notes::store::validate_text;

/// Routes triggers and free text to the note store and the dialog state machine.
///
/// The dispatcher is transport-neutral: it returns `View`s and leaves sending
/// them to the channel glue.
pub struct NotesDispatcher {
    store: Arc<dyn NoteStore>,
    dialogs: DialogStore,
    page_size: u64,
}

impl NotesDispatcher {
    pub fn new(store: Arc<dyn NoteStore>, page_size: u64) -> Self {
        Self {
            store,
            dialogs: DialogStore::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn dialog_state(&self, owner_id: i64) -> DialogState {
        self.dialogs.get(owner_id)
    }

    pub fn open_dialogs(&self) -> usize {
        self.dialogs.open_count()
    }

    /// `/start`
    pub fn start(&self) -> View {
        views::welcome()
    }

    /// Handle a button press. `None` means there is nothing to render (noop).
    pub fn handle_trigger(&self, sender: &Sender, trigger: Trigger) -> BotResult<Option<View>> {
        log::debug!("[NOTES] Owner {} triggered {}", sender.owner_id, trigger);

        let view = match trigger {
            Trigger::Noop => return Ok(None),
            Trigger::Home => views::home(),
            Trigger::Help => views::help(),
            Trigger::Cancel => self.cancel(sender),
            Trigger::List { page } => self.show_list(sender, page)?,
            Trigger::View { note_id, page } => self.show_note(sender, note_id, page)?,
            Trigger::Delete { note_id, page } => self.delete_note(sender, note_id, page)?,
            Trigger::New => {
                self.dialogs.enter(sender.owner_id, DialogState::AwaitingNewText);
                views::new_note_prompt()
            }
            Trigger::Edit { note_id, page } => {
                self.dialogs
                    .enter(sender.owner_id, DialogState::AwaitingEditText { note_id, page });
                views::edit_note_prompt()
            }
        };

        Ok(Some(view))
    }

    /// Handle a free-text message.
    pub fn handle_text(&self, sender: &Sender, text: &str) -> BotResult<View> {
        let owner_id = sender.owner_id;

        let text = match validate_text(text) {
            Ok(text) => text,
            Err(_) => {
                // Blank input re-prompts without leaving the dialog.
                return Ok(match self.dialogs.get(owner_id) {
                    DialogState::Idle => views::idle_hint(),
                    DialogState::AwaitingNewText => views::empty_new_note(),
                    DialogState::AwaitingEditText { .. } => views::empty_edit(),
                });
            }
        };

        match self.dialogs.take(owner_id) {
            DialogState::Idle => Ok(views::idle_hint()),
            DialogState::AwaitingNewText => {
                let note = self.store.create(owner_id, sender.origin_id, text)?;
                Ok(views::note_saved(note.id))
            }
            DialogState::AwaitingEditText { note_id, page } => {
                if self.store.update(owner_id, note_id, text)? {
                    Ok(views::note_updated(note_id, page))
                } else {
                    Ok(views::update_failed())
                }
            }
        }
    }

    /// `/cancel` or the cancel button.
    pub fn cancel(&self, sender: &Sender) -> View {
        self.dialogs.clear(sender.owner_id);
        views::cancelled()
    }

    fn show_list(&self, sender: &Sender, page: u64) -> BotResult<View> {
        let total = self.store.count(sender.owner_id)?;
        if total == 0 {
            return Ok(views::empty_list());
        }
        self.render_page(sender, &views::list_header(total), page, total)
    }

    fn show_note(&self, sender: &Sender, note_id: i64, page: u64) -> BotResult<View> {
        match self.store.get(sender.owner_id, note_id)? {
            Some(note) => Ok(views::note(&note, page)),
            None => Ok(views::note_not_found()),
        }
    }

    fn delete_note(&self, sender: &Sender, note_id: i64, page: u64) -> BotResult<View> {
        if !self.store.delete(sender.owner_id, note_id)? {
            return Ok(views::delete_failed());
        }

        let total = self.store.count(sender.owner_id)?;
        if total == 0 {
            return Ok(views::deleted_last_note());
        }
        self.render_page(sender, views::DELETED_HEADER, page, total)
    }

    fn render_page(&self, sender: &Sender, header: &str, page: u64, total: u64) -> BotResult<View> {
        let window = PageWindow::new(page, total, self.page_size);
        let notes = self
            .store
            .list(sender.owner_id, window.offset(), window.limit())?;
        Ok(views::notes_list(header, &notes, &window))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;
    use crate::errors::BotError;
    use crate::models::Note;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    const PAGE_SIZE: u64 = 5;

    fn setup() -> (TempDir, Arc<Database>, NotesDispatcher) {
        let dir = tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("notes.db").to_str().unwrap()).unwrap());
        let dispatcher = NotesDispatcher::new(db.clone(), PAGE_SIZE);
        (dir, db, dispatcher)
    }

    fn seed(db: &Database, owner_id: i64, count: usize) -> Vec<Note> {
        (0..count)
            .map(|i| db.create(owner_id, owner_id, &format!("note {}", i)).unwrap())
            .collect()
    }

    fn note_rows(view: &View) -> usize {
        view.triggers()
            .filter(|t| matches!(t, Trigger::View { .. }))
            .count()
    }

    /// Store double that counts calls and fails every one of them.
    #[derive(Default)]
    pub(crate) struct CountingStore {
        pub(crate) calls: AtomicUsize,
    }

    impl CountingStore {
        fn hit<T>(&self) -> BotResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BotError::Config("store should not be called".to_string()))
        }
    }

    impl NoteStore for CountingStore {
        fn create(&self, _: i64, _: i64, _: &str) -> BotResult<Note> {
            self.hit()
        }
        fn get(&self, _: i64, _: i64) -> BotResult<Option<Note>> {
            self.hit()
        }
        fn update(&self, _: i64, _: i64, _: &str) -> BotResult<bool> {
            self.hit()
        }
        fn delete(&self, _: i64, _: i64) -> BotResult<bool> {
            self.hit()
        }
        fn count(&self, _: i64) -> BotResult<u64> {
            self.hit()
        }
        fn list(&self, _: i64, _: u64, _: u64) -> BotResult<Vec<Note>> {
            self.hit()
        }
    }

    #[test]
    fn test_new_note_dialog() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 100);

        let prompt = dispatcher.handle_trigger(&alice, Trigger::New).unwrap().unwrap();
        assert!(prompt.has_trigger(Trigger::Cancel));
        assert_eq!(dispatcher.dialog_state(1), DialogState::AwaitingNewText);

        let reprompt = dispatcher.handle_text(&alice, "").unwrap();
        assert_eq!(reprompt, views::empty_new_note());
        assert_eq!(dispatcher.dialog_state(1), DialogState::AwaitingNewText);
        assert_eq!(db.count(1).unwrap(), 0);

        let saved = dispatcher.handle_text(&alice, "Buy milk").unwrap();
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);

        let notes = db.list(1, 0, 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "Buy milk");
        assert_eq!(notes[0].origin_id, 100);
        assert!(saved.has_trigger(Trigger::Edit { note_id: notes[0].id, page: 0 }));
        assert!(saved.has_trigger(Trigger::Delete { note_id: notes[0].id, page: 0 }));
    }

    #[test]
    fn test_blank_text_never_reaches_store() {
        let store = Arc::new(CountingStore::default());
        let dispatcher = NotesDispatcher::new(store.clone(), PAGE_SIZE);
        let alice = Sender::new(1, 1);

        dispatcher.handle_trigger(&alice, Trigger::New).unwrap();
        for blank in ["", "   ", "\n\t"] {
            dispatcher.handle_text(&alice, blank).unwrap();
        }
        dispatcher
            .handle_trigger(&alice, Trigger::Edit { note_id: 3, page: 0 })
            .unwrap();
        dispatcher.handle_text(&alice, "  ").unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            dispatcher.dialog_state(1),
            DialogState::AwaitingEditText { note_id: 3, page: 0 }
        );
    }

    #[test]
    fn test_store_failure_closes_dialog() {
        let store = Arc::new(CountingStore::default());
        let dispatcher = NotesDispatcher::new(store.clone(), PAGE_SIZE);
        let alice = Sender::new(1, 1);

        dispatcher.handle_trigger(&alice, Trigger::New).unwrap();
        assert!(dispatcher.handle_text(&alice, "text").is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);
    }

    #[test]
    fn test_edit_dialog_updates_note() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let note = db.create(1, 1, "draft").unwrap();

        dispatcher
            .handle_trigger(&alice, Trigger::Edit { note_id: note.id, page: 2 })
            .unwrap();
        assert_eq!(dispatcher.handle_text(&alice, " ").unwrap(), views::empty_edit());

        let view = dispatcher.handle_text(&alice, "final").unwrap();
        assert_eq!(view, views::note_updated(note.id, 2));
        assert_eq!(db.get(1, note.id).unwrap().unwrap().text, "final");
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);
    }

    #[test]
    fn test_edit_of_foreign_note_shows_not_found() {
        let (_dir, db, dispatcher) = setup();
        let note = db.create(1, 1, "alice's").unwrap();
        let mallory = Sender::new(2, 2);

        dispatcher
            .handle_trigger(&mallory, Trigger::Edit { note_id: note.id, page: 1 })
            .unwrap();
        let view = dispatcher.handle_text(&mallory, "overwritten").unwrap();

        assert_eq!(view, views::update_failed());
        assert_eq!(dispatcher.dialog_state(2), DialogState::Idle);
        assert_eq!(db.get(1, note.id).unwrap().unwrap().text, "alice's");
    }

    #[test]
    fn test_cancel_clears_dialog() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);

        dispatcher.handle_trigger(&alice, Trigger::New).unwrap();
        let view = dispatcher.handle_trigger(&alice, Trigger::Cancel).unwrap().unwrap();
        assert_eq!(view, views::cancelled());
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);

        // Text after cancel is not saved
        assert_eq!(dispatcher.handle_text(&alice, "late").unwrap(), views::idle_hint());
        assert_eq!(db.count(1).unwrap(), 0);
    }

    #[test]
    fn test_cancel_from_edit_keeps_note() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let note = db.create(1, 1, "keep me").unwrap();

        dispatcher
            .handle_trigger(&alice, Trigger::Edit { note_id: note.id, page: 0 })
            .unwrap();
        assert_eq!(dispatcher.cancel(&alice), views::cancelled());
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);

        assert_eq!(dispatcher.handle_text(&alice, "replacement").unwrap(), views::idle_hint());
        assert_eq!(db.get(1, note.id).unwrap().unwrap().text, "keep me");
        assert_eq!(db.count(1).unwrap(), 1);
    }

    #[test]
    fn test_cancel_while_idle() {
        let store = Arc::new(CountingStore::default());
        let dispatcher = NotesDispatcher::new(store.clone(), PAGE_SIZE);
        let alice = Sender::new(1, 1);

        let view = dispatcher.handle_trigger(&alice, Trigger::Cancel).unwrap().unwrap();
        assert_eq!(view, views::cancelled());
        assert_eq!(dispatcher.cancel(&alice), views::cancelled());
        assert_eq!(dispatcher.dialog_state(1), DialogState::Idle);
        assert_eq!(dispatcher.open_dialogs(), 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_retrigger_replaces_dialog() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let note = db.create(1, 1, "old").unwrap();

        dispatcher.handle_trigger(&alice, Trigger::New).unwrap();
        dispatcher
            .handle_trigger(&alice, Trigger::Edit { note_id: note.id, page: 0 })
            .unwrap();
        dispatcher.handle_text(&alice, "new text").unwrap();

        assert_eq!(db.count(1).unwrap(), 1);
        assert_eq!(db.get(1, note.id).unwrap().unwrap().text, "new text");
    }

    #[test]
    fn test_list_pages_for_six_notes() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        seed(&db, 1, 6);

        let first = dispatcher
            .handle_trigger(&alice, Trigger::List { page: 0 })
            .unwrap()
            .unwrap();
        assert_eq!(first.text, "Your notes (6):");
        assert_eq!(note_rows(&first), 5);
        assert!(first.has_trigger(Trigger::List { page: 1 }));

        let second = dispatcher
            .handle_trigger(&alice, Trigger::List { page: 1 })
            .unwrap()
            .unwrap();
        assert_eq!(note_rows(&second), 1);
        assert!(!second.has_trigger(Trigger::List { page: 2 }));
        assert!(second.has_trigger(Trigger::List { page: 0 }));
    }

    #[test]
    fn test_list_clamps_pages() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let notes = seed(&db, 1, 12);

        let trigger = Trigger::parse("list|-5").unwrap();
        let view = dispatcher.handle_trigger(&alice, trigger).unwrap().unwrap();
        assert!(view.has_trigger(Trigger::View { note_id: notes[11].id, page: 0 }));

        let view = dispatcher
            .handle_trigger(&alice, Trigger::List { page: 99 })
            .unwrap()
            .unwrap();
        assert_eq!(note_rows(&view), 2);
        assert!(view.has_trigger(Trigger::View { note_id: notes[0].id, page: 2 }));
        assert!(view.rows.iter().flatten().any(|b| b.label == "3/3"));

        let trigger = Trigger::parse("list|18446744073709551616").unwrap();
        let huge = dispatcher.handle_trigger(&alice, trigger).unwrap().unwrap();
        assert_eq!(huge, view);
    }

    #[test]
    fn test_empty_list_view() {
        let (_dir, _db, dispatcher) = setup();
        let view = dispatcher
            .handle_trigger(&Sender::new(1, 1), Trigger::List { page: 0 })
            .unwrap()
            .unwrap();
        assert_eq!(view, views::empty_list());
    }

    #[test]
    fn test_delete_last_item_on_last_page_moves_back() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let notes = seed(&db, 1, 6);
        // Oldest note is alone on page 1
        let oldest = notes[0].id;

        let view = dispatcher
            .handle_trigger(&alice, Trigger::Delete { note_id: oldest, page: 1 })
            .unwrap()
            .unwrap();
        assert_eq!(view.text, views::DELETED_HEADER);
        assert_eq!(note_rows(&view), 5);
        assert!(view.has_trigger(Trigger::View { note_id: notes[5].id, page: 0 }));
        assert!(!view.has_trigger(Trigger::List { page: 1 }));
    }

    #[test]
    fn test_delete_only_note() {
        let (_dir, db, dispatcher) = setup();
        let alice = Sender::new(1, 1);
        let note = db.create(1, 1, "solo").unwrap();

        let view = dispatcher
            .handle_trigger(&alice, Trigger::Delete { note_id: note.id, page: 0 })
            .unwrap()
            .unwrap();
        assert_eq!(view, views::deleted_last_note());
        assert_eq!(db.count(1).unwrap(), 0);
    }

    #[test]
    fn test_foreign_view_and_delete_are_not_found() {
        let (_dir, db, dispatcher) = setup();
        let note = db.create(1, 1, "secret").unwrap();
        let mallory = Sender::new(2, 2);

        let view = dispatcher
            .handle_trigger(&mallory, Trigger::View { note_id: note.id, page: 0 })
            .unwrap()
            .unwrap();
        assert_eq!(view, views::note_not_found());

        let view = dispatcher
            .handle_trigger(&mallory, Trigger::Delete { note_id: note.id, page: 0 })
            .unwrap()
            .unwrap();
        assert_eq!(view, views::delete_failed());
        assert!(db.get(1, note.id).unwrap().is_some());
    }

    #[test]
    fn test_view_shows_note_text() {
        let (_dir, db, dispatcher) = setup();
        let note = db.create(1, 1, "line one\nline two").unwrap();

        let view = dispatcher
            .handle_trigger(&Sender::new(1, 1), Trigger::View { note_id: note.id, page: 3 })
            .unwrap()
            .unwrap();
        assert_eq!(view.text, "line one\nline two");
        assert!(view.has_trigger(Trigger::List { page: 3 }));
    }

    #[test]
    fn test_noop_renders_nothing() {
        let (_dir, _db, dispatcher) = setup();
        assert!(dispatcher
            .handle_trigger(&Sender::new(1, 1), Trigger::Noop)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_idle_text_is_not_saved() {
        let (_dir, db, dispatcher) = setup();
        let view = dispatcher.handle_text(&Sender::new(1, 1), "hello").unwrap();
        assert_eq!(view, views::idle_hint());
        assert_eq!(db.count(1).unwrap(), 0);
    }
}
