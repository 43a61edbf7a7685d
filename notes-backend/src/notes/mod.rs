//! Notes system: owner-scoped note storage and list pagination

pub mod pagination;
pub mod store;

pub use pagination::PageWindow;
pub use store::NoteStore;
