//! Basic types for the core module

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Income/expense marker stored in the `loaiThuChi` column
///
/// Values other than `Thu`/`Chi` are kept verbatim so that filtering by
/// whatever the sheet contains still works.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Income
    Thu,
    /// Expense
    Chi,
    /// Anything else, including the empty string for a missing cell
    Other(String),
}

impl Default for TransactionKind {
    fn default() -> Self {
        TransactionKind::Other(String::new())
    }
}

impl TransactionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Thu => "Thu",
            TransactionKind::Chi => "Chi",
            TransactionKind::Other(s) => s.as_str(),
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, TransactionKind::Thu)
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, TransactionKind::Chi)
    }
}

impl From<&str> for TransactionKind {
    fn from(s: &str) -> Self {
        match s {
            "Thu" => TransactionKind::Thu,
            "Chi" => TransactionKind::Chi,
            other => TransactionKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TransactionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TransactionKind::from(s.as_str()))
    }
}

/// Filterable text columns with a selectable vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "loaiThuChi")]
    LoaiThuChi,
    #[serde(rename = "nguoiCapNhat")]
    NguoiCapNhat,
    #[serde(rename = "doiTuongThuChi")]
    DoiTuongThuChi,
}

impl std::str::FromStr for Field {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loaiThuChi" => Ok(Field::LoaiThuChi),
            "nguoiCapNhat" => Ok(Field::NguoiCapNhat),
            "doiTuongThuChi" => Ok(Field::DoiTuongThuChi),
            _ => Err(format!("Invalid filter field: {}", s)),
        }
    }
}
