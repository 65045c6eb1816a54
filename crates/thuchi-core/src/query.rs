//! Filtering and aggregation over the in-memory collection
//!
//! Everything here is pure: inputs are borrowed, results are new values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::models::Transaction;
use crate::time;
use crate::types::Field;

/// Active filters; empty values impose no constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSet {
    pub loai_thu_chi: String,
    pub nguoi_cap_nhat: String,
    pub doi_tuong_thu_chi: String,
    #[serde(deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "q")]
    pub search_text: String,
}

impl FilterSet {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.loai_thu_chi.is_empty()
            && self.nguoi_cap_nhat.is_empty()
            && self.doi_tuong_thu_chi.is_empty()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.search_text.is_empty()
    }

    /// Check a single record against every active filter
    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.loai_thu_chi.is_empty() && tx.loai_thu_chi.as_str() != self.loai_thu_chi {
            return false;
        }
        if !self.nguoi_cap_nhat.is_empty() && tx.nguoi_cap_nhat != self.nguoi_cap_nhat {
            return false;
        }
        if !self.doi_tuong_thu_chi.is_empty() && tx.doi_tuong_thu_chi != self.doi_tuong_thu_chi {
            return false;
        }
        if let Some(start) = self.start_date {
            if tx.ngay < start {
                return false;
            }
        }
        // Dates carry no time of day, so `<=` covers the whole end date
        if let Some(end) = self.end_date {
            if tx.ngay > end {
                return false;
            }
        }
        if !self.search_text.is_empty() && !tx.matches_text(&self.search_text.to_lowercase()) {
            return false;
        }
        true
    }
}

/// Empty strings in query parameters mean "unset"
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => time::parse_date(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid date: {}", s))),
    }
}

/// Totals for the current view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Total income
    pub tong_thu: Decimal,
    /// Total expense
    pub tong_chi: Decimal,
    /// Income minus expense
    pub can_doi: Decimal,
    /// Number of transactions
    pub so_giao_dich: usize,
}

/// Selectable values for the three vocabulary filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub loai_thu_chi: BTreeSet<String>,
    pub nguoi_cap_nhat: BTreeSet<String>,
    pub doi_tuong_thu_chi: BTreeSet<String>,
}

/// Non-empty values seen for `field` across the collection
pub fn distinct_values(collection: &[Transaction], field: Field) -> BTreeSet<String> {
    collection
        .iter()
        .map(|tx| tx.field(field))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Vocabularies for all filterable fields
pub fn filter_options(collection: &[Transaction]) -> FilterOptions {
    FilterOptions {
        loai_thu_chi: distinct_values(collection, Field::LoaiThuChi),
        nguoi_cap_nhat: distinct_values(collection, Field::NguoiCapNhat),
        doi_tuong_thu_chi: distinct_values(collection, Field::DoiTuongThuChi),
    }
}

/// Records passing every active filter, in collection order
pub fn apply_filters(collection: &[Transaction], filters: &FilterSet) -> Vec<Transaction> {
    if filters.is_empty() {
        return collection.to_vec();
    }
    collection
        .iter()
        .filter(|tx| filters.matches(tx))
        .cloned()
        .collect()
}

/// Income, expense, balance and count
pub fn compute_stats(filtered: &[Transaction]) -> Stats {
    let (tong_thu, tong_chi) = totals(filtered);
    Stats {
        tong_thu,
        tong_chi,
        can_doi: tong_thu - tong_chi,
        so_giao_dich: filtered.len(),
    }
}

/// Sum of `Thu` and of `Chi` amounts, saturating at `Decimal::MAX`
pub(crate) fn totals(transactions: &[Transaction]) -> (Decimal, Decimal) {
    transactions.iter().fold((Decimal::ZERO, Decimal::ZERO), |(thu, chi), tx| {
        if tx.loai_thu_chi.is_income() {
            (thu.saturating_add(tx.so_tien), chi)
        } else if tx.loai_thu_chi.is_expense() {
            (thu, chi.saturating_add(tx.so_tien))
        } else {
            (thu, chi)
        }
    })
}
