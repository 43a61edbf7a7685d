use std::fmt;

use crate::notes::pagination::parse_page;

/// Identity of whoever sent an inbound update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    /// Chat user id. Scopes notes and dialog state.
    pub owner_id: i64,
    /// Chat the update came from.
    pub origin_id: i64,
}

impl Sender {
    pub fn new(owner_id: i64, origin_id: i64) -> Self {
        Self { owner_id, origin_id }
    }
}

/// A button press, encoded in callback data as `name|arg|arg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Home,
    Help,
    New,
    Cancel,
    Noop,
    List { page: u64 },
    View { note_id: i64, page: u64 },
    Edit { note_id: i64, page: u64 },
    Delete { note_id: i64, page: u64 },
}

impl Trigger {
    /// Parse callback data. Malformed pages normalize to 0; a missing or
    /// malformed note id, or an unknown name, yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.trim().split('|');
        let name = parts.next()?;

        let trigger = match name {
            "home" => Trigger::Home,
            "help" => Trigger::Help,
            "new" => Trigger::New,
            "cancel" => Trigger::Cancel,
            "noop" => Trigger::Noop,
            "list" => Trigger::List {
                page: parts.next().map(parse_page).unwrap_or(0),
            },
            "view" | "edit" | "del" => {
                let note_id = parts.next()?.trim().parse::<i64>().ok()?;
                let page = parts.next().map(parse_page).unwrap_or(0);
                match name {
                    "view" => Trigger::View { note_id, page },
                    "edit" => Trigger::Edit { note_id, page },
                    _ => Trigger::Delete { note_id, page },
                }
            }
            _ => return None,
        };

        Some(trigger)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Home => write!(f, "home"),
            Trigger::Help => write!(f, "help"),
            Trigger::New => write!(f, "new"),
            Trigger::Cancel => write!(f, "cancel"),
            Trigger::Noop => write!(f, "noop"),
            Trigger::List { page } => write!(f, "list|{}", page),
            Trigger::View { note_id, page } => write!(f, "view|{}|{}", note_id, page),
            Trigger::Edit { note_id, page } => write!(f, "edit|{}|{}", note_id, page),
            Trigger::Delete { note_id, page } => write!(f, "del|{}|{}", note_id, page),
        }
    }
}

/// A labeled action attached to a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub trigger: Trigger,
}

impl Button {
    pub fn new(label: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            label: label.into(),
            trigger,
        }
    }
}

/// Transport-neutral reply: text plus rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl View {
    pub fn new(text: impl Into<String>, rows: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            rows,
        }
    }

    /// All triggers in the view, row by row.
    pub fn triggers(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.rows.iter().flatten().map(|b| b.trigger)
    }

    pub fn has_trigger(&self, trigger: Trigger) -> bool {
        self.triggers().any(|t| t == trigger)
    }
}
