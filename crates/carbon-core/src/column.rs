//! # Columns and Column Sets
//!
//! Every value a group can produce is identified by a [`ColumnId`], handed out by
//! the memo's [`ColumnRegistry`] when a scan or projection first derives its
//! properties. Ids are dense, start at 0, and are never reused within one memo.
//!
//! Output schemas are [`ColSet`]s: growable bitsets keyed by column id, so the
//! union and subset tests used during property derivation are word-at-a-time.

use crate::expr::{Expr, TableRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Dense identifier of a registered column.
pub type ColumnId = usize;

/// Discriminant of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Table,
    Expr,
}

/// A producible value: a base-table attribute or a computed expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Table {
        table: TableRef,
        rt_index: u32,
        attnum: u32,
        name: String,
    },
    Expr {
        expr: Expr,
        alias: Option<String>,
    },
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Table { .. } => ColumnKind::Table,
            Column::Expr { .. } => ColumnKind::Expr,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Table {
                table,
                rt_index,
                attnum,
                name,
            } => write!(f, "{table}.{name} (rt={rt_index}, attnum={attnum})"),
            Column::Expr { expr, alias } => match alias {
                Some(a) => write!(f, "{expr} AS {a}"),
                None => write!(f, "{expr}"),
            },
        }
    }
}

/// Owns every column registered during one optimization.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column and return its id (the next free index).
    pub fn register(&mut self, column: Column) -> ColumnId {
        self.columns.push(column);
        self.columns.len() - 1
    }

    pub fn lookup(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Column)> {
        self.columns.iter().enumerate()
    }
}

const WORD_BITS: usize = 64;

/// A set of column ids backed by a growable bit vector.
///
/// There is no removal: sets only grow during a derivation pass. Equality and
/// hashing ignore trailing zero words, so `{1}` built with a 1-word vector equals
/// `{1}` left over from a union with a 3-word vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColSet {
    words: Vec<u64>,
}

impl ColSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(id: ColumnId) -> Self {
        let mut s = Self::new();
        s.add(id);
        s
    }

    pub fn add(&mut self, id: ColumnId) {
        let word = id / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (id % WORD_BITS);
    }

    pub fn contains(&self, id: ColumnId) -> bool {
        self.words
            .get(id / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (id % WORD_BITS)) != 0)
    }

    /// In-place union. Never clears a bit.
    pub fn union(&mut self, other: &ColSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    /// True if every member of `self` is a member of `other`.
    pub fn is_subset(&self, other: &ColSet) -> bool {
        self.words.iter().enumerate().all(|(i, &w)| {
            let o = other.words.get(i).copied().unwrap_or(0);
            w & !o == 0
        })
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            (0..WORD_BITS)
                .filter(move |bit| w & (1u64 << bit) != 0)
                .map(move |bit| i * WORD_BITS + bit)
        })
    }

    fn significant_words(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |p| p + 1);
        &self.words[..len]
    }
}

impl PartialEq for ColSet {
    fn eq(&self, other: &Self) -> bool {
        self.significant_words() == other.significant_words()
    }
}

impl Eq for ColSet {}

impl Hash for ColSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_words().hash(state);
    }
}

impl FromIterator<ColumnId> for ColSet {
    fn from_iter<I: IntoIterator<Item = ColumnId>>(iter: I) -> Self {
        let mut s = ColSet::new();
        for id in iter {
            s.add(id);
        }
        s
    }
}

impl fmt::Display for ColSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}
