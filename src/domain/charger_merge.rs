use std::collections::{HashMap, HashSet};

use crate::domain::models::ChargerRow;

/// Most recent row seen per charger identifier, in first-seen order.
///
/// Entries are never evicted; a charger removed upstream stays until restart.
#[derive(Debug, Clone, Default)]
pub struct LastKnownCache {
    rows: Vec<ChargerRow>,
    index: HashMap<String, usize>,
}

impl LastKnownCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `row` under its charger identifier. Rows without one are ignored.
    pub fn remember(&mut self, row: &ChargerRow) -> bool {
        let Some(key) = row.charger_key() else {
            return false;
        };

        match self.index.get(key) {
            Some(&position) => self.rows[position] = row.clone(),
            None => {
                self.index.insert(key.to_string(), self.rows.len());
                self.rows.push(row.clone());
            }
        }

        true
    }

    pub fn get(&self, charger_id: &str) -> Option<&ChargerRow> {
        self.index
            .get(charger_id.trim())
            .and_then(|&position| self.rows.get(position))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargerRow> {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRows {
    pub rows: Vec<ChargerRow>,
    pub carried_over: Vec<String>,
}

/// Refreshes `cache` from `fresh` and returns the rows to publish: every fresh
/// row in upstream order, then every cached row whose charger is missing from
/// this fetch. Fresh rows take precedence on identifier collisions.
pub fn merge_rows(fresh: Vec<ChargerRow>, cache: &mut LastKnownCache) -> MergedRows {
    let mut seen = HashSet::new();
    for row in &fresh {
        if cache.remember(row)
            && let Some(key) = row.charger_key()
        {
            seen.insert(key.to_string());
        }
    }

    let mut rows = fresh;
    let mut carried_over = Vec::new();
    for cached in cache.iter() {
        let Some(key) = cached.charger_key() else {
            continue;
        };
        if seen.contains(key) {
            continue;
        }
        carried_over.push(key.to_string());
        rows.push(cached.clone());
    }

    MergedRows { rows, carried_over }
}
