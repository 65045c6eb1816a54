//! Transactions API endpoints
//!
//! Endpoints:
//! - api_transactions: filtered, paginated list
//! - api_transaction_detail: single record
//! - api_transaction_update: edit a record, then re-fetch
//! - api_transaction_delete: delete a record, then re-fetch
//! - api_reload: re-fetch the table

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thuchi_core::{time, FilterSet, Page, Transaction, TransactionKind};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageParam {
    pub page: Option<usize>,
}

/// Fields accepted by an edit; omitted fields keep their current value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub ngay: Option<String>,
    pub nguoi_cap_nhat: Option<String>,
    pub loai_thu_chi: Option<String>,
    pub noi_dung: Option<String>,
    pub doi_tuong_thu_chi: Option<String>,
    pub so_tien: Option<Decimal>,
    pub ghi_chu: Option<String>,
}

impl TransactionUpdate {
    fn apply(self, tx: &mut Transaction) -> ApiResult<()> {
        if let Some(ngay) = self.ngay {
            tx.ngay = time::parse_date(&ngay).ok_or_else(|| ApiError::BadRequest {
                message: format!("ngày không hợp lệ: {}", ngay),
            })?;
        }
        if let Some(v) = self.nguoi_cap_nhat {
            tx.nguoi_cap_nhat = v;
        }
        if let Some(v) = self.loai_thu_chi {
            tx.loai_thu_chi = TransactionKind::from(v.trim());
        }
        if let Some(v) = self.noi_dung {
            tx.noi_dung = v;
        }
        if let Some(v) = self.doi_tuong_thu_chi {
            tx.doi_tuong_thu_chi = v;
        }
        if let Some(v) = self.so_tien {
            tx.so_tien = v.abs();
        }
        if let Some(v) = self.ghi_chu {
            tx.ghi_chu = v;
        }
        Ok(())
    }
}

/// Outcome of a mutation or reload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    pub total_count: usize,
}

pub(crate) fn filters_from(query: Result<Query<FilterSet>, QueryRejection>) -> ApiResult<FilterSet> {
    query
        .map(|Query(filters)| filters)
        .map_err(|e| ApiError::BadRequest { message: e.body_text() })
}

/// Get a page of filtered transactions (JSON API)
pub async fn api_transactions(
    State(state): State<AppState>,
    filters: Result<Query<FilterSet>, QueryRejection>,
    page: Result<Query<PageParam>, QueryRejection>,
) -> ApiResult<Json<Page>> {
    let filters = filters_from(filters)?;
    let Query(page) = page.map_err(|e| ApiError::BadRequest { message: e.body_text() })?;

    Ok(Json(state.tracker.page(&filters, page.page.unwrap_or(1))))
}

/// Get single transaction detail (JSON API)
pub async fn api_transaction_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    state
        .tracker
        .transaction(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound { resource: format!("giao dịch {}", id) })
}

pub async fn api_transaction_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TransactionUpdate>, JsonRejection>,
) -> ApiResult<Json<ActionResponse>> {
    let Json(update) = body.map_err(|e| ApiError::BadRequest { message: e.body_text() })?;
    let mut tx = state
        .tracker
        .transaction(&id)
        .ok_or_else(|| ApiError::NotFound { resource: format!("giao dịch {}", id) })?;

    update.apply(&mut tx)?;
    state.tracker.update_by_id(&id, tx).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: "Cập nhật thành công".to_string(),
        total_count: state.tracker.count(),
    }))
}

pub async fn api_transaction_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionResponse>> {
    state.tracker.remove_by_id(&id).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: "Xóa thành công".to_string(),
        total_count: state.tracker.count(),
    }))
}

/// Re-fetch the whole table
pub async fn api_reload(State(state): State<AppState>) -> ApiResult<Json<ActionResponse>> {
    let total_count = state.tracker.refresh().await?;

    Ok(Json(ActionResponse {
        success: true,
        message: "Đã tải lại dữ liệu".to_string(),
        total_count,
    }))
}
