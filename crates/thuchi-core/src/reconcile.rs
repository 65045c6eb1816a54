//! Turn a fetched row sequence into the canonical transaction collection
//!
//! Rows are keyed by `_RowNumber` (falling back to `id`). When a key repeats
//! the later row replaces the earlier one, but keeps the slot where the key
//! was first seen, so output order is first-occurrence order.
//!
//! Cell coercion never fails: a bad amount becomes zero and a bad or missing
//! date becomes the reference date (today, for live fetches).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::Transaction;
use crate::raw::RawRow;
use crate::time;
use crate::types::TransactionKind;

/// Reconcile rows against today's date
pub fn reconcile(rows: Vec<RawRow>) -> Vec<Transaction> {
    reconcile_at(rows, time::today())
}

/// Reconcile rows, using `today` for rows without a usable date
pub fn reconcile_at(rows: Vec<RawRow>, today: NaiveDate) -> Vec<Transaction> {
    let total = rows.len();
    let unique = dedupe(rows);

    if unique.len() != total {
        log::debug!("Reconciled {} rows into {} unique transactions", total, unique.len());
    }

    unique
        .into_iter()
        .map(|(key, row)| project(key, row, today))
        .collect()
}

/// Last-write-wins by identity, in first-occurrence order
fn dedupe(rows: Vec<RawRow>) -> Vec<(String, RawRow)> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<(String, RawRow)> = Vec::with_capacity(rows.len());

    for row in rows {
        let key = match row.identity() {
            Some(key) => key.to_string(),
            None => {
                log::warn!("Skipping row without _RowNumber or id: {:?}", row);
                continue;
            }
        };

        match slots.get(&key).copied() {
            Some(slot) => unique[slot].1 = row,
            None => {
                slots.insert(key.clone(), unique.len());
                unique.push((key, row));
            }
        }
    }

    unique
}

fn project(key: String, row: RawRow, today: NaiveDate) -> Transaction {
    Transaction {
        id: key,
        app_sheet_id: row.id.filter(|id| !id.is_empty()),
        ngay: time::coerce_date(row.ngay.as_deref(), today),
        nguoi_cap_nhat: row.nguoi_cap_nhat.unwrap_or_default(),
        loai_thu_chi: TransactionKind::from(row.loai_thu_chi.as_deref().unwrap_or("").trim()),
        noi_dung: row.noi_dung.unwrap_or_default(),
        doi_tuong_thu_chi: row.doi_tuong_thu_chi.unwrap_or_default(),
        so_tien: parse_amount(row.so_tien.as_deref()),
        ghi_chu: row.ghi_chu.unwrap_or_default(),
    }
}

/// Parse an amount cell such as `"1,234,567"`
///
/// Thousands separators are stripped first. If the remaining text is not a
/// number, its leading numeric part is used (`"250000 đ"` is 250000); with no
/// leading number at all the result is zero. The sign is dropped.
pub fn parse_amount(value: Option<&str>) -> Decimal {
    let cleaned: String = match value {
        Some(v) => v.chars().filter(|&c| c != ',').collect(),
        None => return Decimal::ZERO,
    };
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()
        .or_else(|| leading_number(cleaned))
        .map(|d| d.abs())
        .unwrap_or(Decimal::ZERO)
}

fn leading_number(s: &str) -> Option<Decimal> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    Decimal::from_str(s[..end].trim_end_matches('.')).ok()
}
