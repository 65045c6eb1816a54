//! Loosely-typed row shape as returned by the remote table
//!
//! Every column is optional and may arrive as a string, a number or a
//! boolean. Nothing beyond this module trusts the remote shape.

use serde::{Deserialize, Deserializer, Serialize};

/// A row as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "_RowNumber", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub row_number: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub ngay: Option<String>,
    #[serde(rename = "nguoiCapNhat", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub nguoi_cap_nhat: Option<String>,
    #[serde(rename = "loaiThuChi", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub loai_thu_chi: Option<String>,
    #[serde(rename = "noiDung", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub noi_dung: Option<String>,
    #[serde(rename = "doiTuongThuChi", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub doi_tuong_thu_chi: Option<String>,
    #[serde(rename = "soTien", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub so_tien: Option<String>,
    #[serde(rename = "ghiChu", default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub ghi_chu: Option<String>,
}

impl RawRow {
    /// Identity used for deduplication: `_RowNumber`, else `id`
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.row_number.as_deref()).or_else(|| non_empty(self.id.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accept string, number, bool or null and keep it as text
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        // Arrays/objects are not meaningful cell values
        Some(_) => None,
    })
}
