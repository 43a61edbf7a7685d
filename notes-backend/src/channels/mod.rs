pub mod dialog;
pub mod dispatcher;
pub mod telegram;
pub mod types;
pub mod views;

pub use dispatcher::NotesDispatcher;
