//! Display targets
//!
//! The board is the stand-in for page elements: each target id (e.g.
//! `#success-count0`) holds one cell. Handlers and degraded callbacks write
//! to disjoint targets, so each lock is held for a single update only.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

/// Fallback flavour shown when a fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degraded {
    /// The value could not be determined: `?`
    Unknown,
    /// The data source is unavailable: `∞`
    Unavailable,
}

impl Degraded {
    /// Placeholder glyph shown in place of the real value
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::Unavailable => "\u{221e}",
        }
    }
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Highlight applied to a value cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
    Info,
    Warning,
}

/// State of one display target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Waiting for data
    Loading,
    /// Real value
    Value { text: String, tone: Option<Tone> },
    /// Fetch failed; shows the placeholder glyph
    Degraded(Degraded),
}

impl Cell {
    /// Text a user would see in this cell
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Loading => "...",
            Self::Value { text, .. } => text,
            Self::Degraded(flavour) => flavour.glyph(),
        }
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Shared map of display targets
#[derive(Debug, Clone, Default)]
pub struct Board {
    cells: Arc<Mutex<BTreeMap<String, Cell>>>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, target: &str, cell: Cell) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.to_string(), cell);
    }

    /// Mark `target` as waiting for data
    pub fn loading(&self, target: &str) {
        self.set(target, Cell::Loading);
    }

    /// Show a plain value in `target`
    pub fn show(&self, target: &str, text: impl Into<String>) {
        self.set(
            target,
            Cell::Value {
                text: text.into(),
                tone: None,
            },
        );
    }

    /// Show a highlighted value in `target`
    pub fn show_toned(&self, target: &str, text: impl Into<String>, tone: Tone) {
        self.set(
            target,
            Cell::Value {
                text: text.into(),
                tone: Some(tone),
            },
        );
    }

    /// Put `target` into the degraded state
    pub fn degrade(&self, target: &str, flavour: Degraded) {
        self.set(target, Cell::Degraded(flavour));
    }

    /// A degraded-display callback writing `flavour` to each id it receives
    #[must_use]
    pub fn degrader(&self, flavour: Degraded) -> impl FnMut(&str) + Send + 'static {
        let board = self.clone();
        move |target: &str| board.degrade(target, flavour)
    }

    /// Current cell of `target`
    #[must_use]
    pub fn get(&self, target: &str) -> Option<Cell> {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .cloned()
    }

    /// Copy of every target, sorted by id
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Cell> {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Plain-text listing, one `target  text` line per cell
    #[must_use]
    pub fn render(&self) -> String {
        let cells = self.snapshot();
        let width = cells.keys().map(String::len).max().unwrap_or(0);

        let mut out = String::new();
        for (target, cell) in &cells {
            let _ = writeln!(out, "{target:<width$}  {}", cell.text());
        }
        out
    }
}
