use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::models::models::{Comment, Post, Theme, User};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "oldest" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "newest" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

pub trait Dated {
    fn created_at(&self) -> Option<NaiveDateTime>;
}

impl Dated for Post {
    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Dated for Comment {
    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Dated for User {
    fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

/// The text a listing view shows for an item and filters on.
pub trait Searchable {
    fn display_text(&self) -> Cow<'_, str>;
}

impl Searchable for Post {
    fn display_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.title)
    }
}

impl Searchable for Theme {
    fn display_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

impl Searchable for Comment {
    fn display_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.content)
    }
}

impl Searchable for User {
    fn display_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.username)
    }
}

/// Stable sort by creation time. Items without a timestamp count as the
/// Unix epoch, so they land at the oldest end.
pub fn sort_by_date<T: Dated>(mut items: Vec<T>, order: SortOrder) -> Vec<T> {
    match order {
        SortOrder::Ascending => items.sort_by_key(|item| item.created_at().unwrap_or_default()),
        SortOrder::Descending => items.sort_by(|a, b| {
            b.created_at()
                .unwrap_or_default()
                .cmp(&a.created_at().unwrap_or_default())
        }),
    }
    items
}

/// Keep items whose display text contains `query`, ignoring case. A blank
/// query keeps everything.
pub fn filter_by_text<T: Searchable>(items: Vec<T>, query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.display_text().to_lowercase().contains(&needle))
        .collect()
}
