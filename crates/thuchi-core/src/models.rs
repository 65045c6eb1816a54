//! Core data models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Field, TransactionKind};

/// One income/expense row, after coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Local identity, derived from the sheet row number
    pub id: String,
    /// Remote key used by Edit/Delete calls
    #[serde(default)]
    pub app_sheet_id: Option<String>,
    /// Transaction date
    pub ngay: NaiveDate,
    /// Who last updated the row
    #[serde(default)]
    pub nguoi_cap_nhat: String,
    /// Income or expense
    #[serde(default)]
    pub loai_thu_chi: TransactionKind,
    /// Description
    #[serde(default)]
    pub noi_dung: String,
    /// Counterparty / category
    #[serde(default)]
    pub doi_tuong_thu_chi: String,
    /// Amount, never negative
    pub so_tien: Decimal,
    /// Free-text note
    #[serde(default)]
    pub ghi_chu: String,
}

impl Transaction {
    /// Key to send to the remote store for mutations
    pub fn remote_key(&self) -> &str {
        self.app_sheet_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.id)
    }

    /// Value of one of the vocabulary columns
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::LoaiThuChi => self.loai_thu_chi.as_str(),
            Field::NguoiCapNhat => &self.nguoi_cap_nhat,
            Field::DoiTuongThuChi => &self.doi_tuong_thu_chi,
        }
    }

    /// Check if any searchable text field contains `needle_lower`
    ///
    /// `needle_lower` must already be lowercased.
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        [
            &self.noi_dung,
            &self.ghi_chu,
            &self.nguoi_cap_nhat,
            &self.doi_tuong_thu_chi,
        ]
        .iter()
        .any(|text| text.to_lowercase().contains(needle_lower))
    }
}
