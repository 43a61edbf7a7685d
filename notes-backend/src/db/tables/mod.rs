//! Table-specific database operations.
//!
//! Each module contains `impl Database` blocks for a single table.

mod notes;
