//! Pagination and dashboard groupings for API responses

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Transaction;
use crate::query::{totals, FilterOptions, Stats};

/// Label used when the grouping column is blank
pub const OTHER_LABEL: &str = "Khác";

/// Longest description label shown on the bar chart
const DESCRIPTION_LABEL_LEN: usize = 20;

/// Page numbers shown around the current page
const PAGE_WINDOW: usize = 5;

/// One page of the filtered list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub transactions: Vec<Transaction>,
    /// 1-based page actually returned
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    /// Index (0-based) of the first row in the filtered list
    pub start_index: usize,
    /// Page numbers to offer in the pager
    pub page_numbers: Vec<usize>,
    /// Income on this page only
    pub page_thu: Decimal,
    /// Expense on this page only
    pub page_chi: Decimal,
}

/// Slice `filtered` into the requested page; out-of-range pages are clamped
pub fn paginate(filtered: &[Transaction], page: usize, per_page: usize) -> Page {
    let per_page = per_page.max(1);
    let total_count = filtered.len();
    let total_pages = total_count.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start_index = ((page - 1) * per_page).min(total_count);
    let end_index = (start_index + per_page).min(total_count);
    let transactions = filtered[start_index..end_index].to_vec();
    let (page_thu, page_chi) = totals(&transactions);

    Page {
        transactions,
        page,
        per_page,
        total_pages,
        total_count,
        start_index,
        page_numbers: page_window(page, total_pages),
        page_thu,
        page_chi,
    }
}

/// Up to five page numbers, keeping the current page centred where possible
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages <= PAGE_WINDOW {
        return (1..=total_pages).collect();
    }
    let first = if current <= 3 {
        1
    } else if current >= total_pages - 2 {
        total_pages - (PAGE_WINDOW - 1)
    } else {
        current - 2
    };
    (first..first + PAGE_WINDOW).collect()
}

/// Expense total for one counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: Decimal,
}

/// Income and expense for one description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionBar {
    pub name: String,
    pub thu: Decimal,
    pub chi: Decimal,
}

impl DescriptionBar {
    /// Income plus expense, saturating at `Decimal::MAX`
    pub fn combined(&self) -> Decimal {
        self.thu.saturating_add(self.chi)
    }
}

/// Everything the dashboard needs in one response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: Stats,
    pub expense_by_counterparty: Vec<CategorySlice>,
    pub top_descriptions: Vec<DescriptionBar>,
}

/// Filter vocabulary plus current record count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub options: FilterOptions,
    pub total_count: usize,
}

fn label_or_other(value: &str) -> String {
    if value.is_empty() {
        OTHER_LABEL.to_string()
    } else {
        value.to_string()
    }
}

/// Expense (`Chi`) totals per counterparty, largest first
pub fn expense_by_counterparty(filtered: &[Transaction], top_n: usize) -> Vec<CategorySlice> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, Decimal> = HashMap::new();

    for tx in filtered.iter().filter(|tx| tx.loai_thu_chi.is_expense()) {
        let name = label_or_other(&tx.doi_tuong_thu_chi);
        let entry = sums.entry(name.clone()).or_insert_with(|| {
            order.push(name);
            Decimal::ZERO
        });
        *entry = entry.saturating_add(tx.so_tien);
    }

    let mut slices: Vec<CategorySlice> = order
        .into_iter()
        .map(|name| {
            let value = sums.get(&name).copied().unwrap_or_default();
            CategorySlice { name, value }
        })
        .collect();
    // Stable sort keeps first-seen order among equal totals
    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices.truncate(top_n);
    slices
}

/// Income/expense per description, by combined size, largest first
///
/// Anything that is not `Thu` counts as expense here, matching the chart's
/// two-colour legend.
pub fn totals_by_description(filtered: &[Transaction], top_n: usize) -> Vec<DescriptionBar> {
    let mut bars: Vec<DescriptionBar> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in filtered {
        let key = label_or_other(&tx.noi_dung);
        let slot = match index.get(&key).copied() {
            Some(slot) => slot,
            None => {
                bars.push(DescriptionBar {
                    name: key.chars().take(DESCRIPTION_LABEL_LEN).collect(),
                    thu: Decimal::ZERO,
                    chi: Decimal::ZERO,
                });
                index.insert(key, bars.len() - 1);
                bars.len() - 1
            }
        };
        if tx.loai_thu_chi.is_income() {
            bars[slot].thu = bars[slot].thu.saturating_add(tx.so_tien);
        } else {
            bars[slot].chi = bars[slot].chi.saturating_add(tx.so_tien);
        }
    }

    bars.sort_by(|a, b| b.combined().cmp(&a.combined()));
    bars.truncate(top_n);
    bars
}

/// Stats and both chart groupings over the same view
pub fn dashboard(filtered: &[Transaction], top_counterparties: usize, top_descriptions: usize) -> Dashboard {
    Dashboard {
        stats: crate::query::compute_stats(filtered),
        expense_by_counterparty: expense_by_counterparty(filtered, top_counterparties),
        top_descriptions: totals_by_description(filtered, top_descriptions),
    }
}
