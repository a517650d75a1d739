//! Brand pseudonymisation.
//!
//! Each distinct brand gets a label of the form `Brand A`, `Brand B`, ...
//! in order of first appearance. After `Brand Z` the sequence continues
//! spreadsheet-style with `Brand AA`, `Brand AB` and so on. Labels are never
//! reused within a session.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span};

use bls_model::Branded;

use crate::error::{Result, TransformError};

const ALIAS_PREFIX: &str = "Brand ";

/// Spreadsheet-style letters for a zero-based index: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Alias for the brand at a zero-based first-appearance position.
pub fn alias_label(index: usize) -> String {
    format!("{ALIAS_PREFIX}{}", column_letters(index))
}

/// One brand and its alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasEntry {
    pub alias: String,
    pub brand: String,
}

/// Session-scoped bijection between brand names and aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AliasMap {
    entries: Vec<AliasEntry>,
    #[serde(skip)]
    by_brand: HashMap<String, usize>,
    #[serde(skip)]
    by_alias: HashMap<String, usize>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the alias for `brand`, assigning the next one if unseen.
    pub fn assign(&mut self, brand: &str) -> &str {
        let brand = brand.trim();
        let idx = match self.by_brand.get(brand) {
            Some(idx) => *idx,
            None => {
                let idx = self.entries.len();
                let alias = alias_label(idx);
                self.by_brand.insert(brand.to_string(), idx);
                self.by_alias.insert(alias.clone(), idx);
                self.entries.push(AliasEntry {
                    alias,
                    brand: brand.to_string(),
                });
                idx
            }
        };
        &self.entries[idx].alias
    }

    pub fn alias_of(&self, brand: &str) -> Option<&str> {
        self.by_brand
            .get(brand.trim())
            .map(|idx| self.entries[*idx].alias.as_str())
    }

    pub fn brand_of(&self, alias: &str) -> Option<&str> {
        self.by_alias
            .get(alias.trim())
            .map(|idx| self.entries[*idx].brand.as_str())
    }

    /// Resolves either an alias or a real brand name to the alias.
    ///
    /// Exact matches win; otherwise the first entry whose alias or brand
    /// matches ignoring ASCII case is used.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some(idx) = self.by_alias.get(name) {
            return Some(self.entries[*idx].alias.as_str());
        }
        if let Some(alias) = self.alias_of(name) {
            return Some(alias);
        }
        self.entries
            .iter()
            .find(|entry| {
                entry.alias.eq_ignore_ascii_case(name) || entry.brand.eq_ignore_ascii_case(name)
            })
            .map(|entry| entry.alias.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in assignment order.
    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Two-column `Alias,Brand` CSV for the analyst.
    pub fn to_csv(&self) -> Result<String> {
        let export_err = |err: &dyn std::fmt::Display| TransformError::AliasExport {
            message: err.to_string(),
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Alias", "Brand"])
            .map_err(|err| export_err(&err))?;
        for entry in &self.entries {
            writer
                .write_record([entry.alias.as_str(), entry.brand.as_str()])
                .map_err(|err| export_err(&err))?;
        }
        let bytes = writer.into_inner().map_err(|err| export_err(&err))?;
        String::from_utf8(bytes).map_err(|err| export_err(&err))
    }
}

/// Assigns aliases to every record's brand, returning the mapping and an
/// aliased copy of the records. The input is left untouched.
pub fn assign_aliases<T: Branded + Clone>(records: &[T]) -> Result<(AliasMap, Vec<T>)> {
    let span = info_span!("alias", records = records.len());
    let _guard = span.enter();
    let start = Instant::now();

    if records.is_empty() {
        return Err(TransformError::EmptyDataset);
    }

    let mut aliases = AliasMap::new();
    let aliased = records
        .iter()
        .map(|record| {
            let alias = aliases.assign(record.brand()).to_string();
            let mut copy = record.clone();
            copy.set_brand(alias);
            copy
        })
        .collect();

    debug!(brands = aliases.len(), "aliases assigned");
    info!(
        brands = aliases.len(),
        duration_ms = start.elapsed().as_millis(),
        "alias complete"
    );
    Ok((aliases, aliased))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_roll_over_like_spreadsheet_columns() {
        assert_eq!(alias_label(0), "Brand A");
        assert_eq!(alias_label(25), "Brand Z");
        assert_eq!(alias_label(26), "Brand AA");
        assert_eq!(alias_label(27), "Brand AB");
        assert_eq!(alias_label(51), "Brand AZ");
        assert_eq!(alias_label(52), "Brand BA");
        assert_eq!(alias_label(701), "Brand ZZ");
        assert_eq!(alias_label(702), "Brand AAA");
    }

    #[test]
    fn lookups_work_both_ways() {
        let mut map = AliasMap::new();
        map.assign(" Acme ");
        map.assign("Zeta");
        map.assign("Acme");
        assert_eq!(map.len(), 2);
        assert_eq!(map.alias_of("Acme"), Some("Brand A"));
        assert_eq!(map.brand_of("Brand B"), Some("Zeta"));
        assert_eq!(map.resolve("Brand B"), Some("Brand B"));
        assert_eq!(map.resolve("Zeta"), Some("Brand B"));
        assert_eq!(map.alias_of("acme"), None);
        assert_eq!(map.resolve("Nova"), None);
    }

    #[test]
    fn resolve_ignores_case_but_assignment_does_not() {
        let mut map = AliasMap::new();
        map.assign("Acme");
        map.assign("ACME");
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("ACME"), Some("Brand B"));
        assert_eq!(map.resolve("acme"), Some("Brand A"));
        assert_eq!(map.resolve("brand b"), Some("Brand B"));
        assert_eq!(map.resolve(" zeta "), None);
    }

    #[test]
    fn csv_export() {
        let mut map = AliasMap::new();
        map.assign("Acme");
        map.assign("Zeta, Inc.");
        let csv = map.to_csv().unwrap();
        insta::assert_snapshot!(csv.trim_end(), @r#"
        Alias,Brand
        Brand A,Acme
        Brand B,"Zeta, Inc."
        "#);
    }
}
