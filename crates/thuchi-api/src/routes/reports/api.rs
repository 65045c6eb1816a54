//! Reports API endpoints - stats, dashboard groupings and filter vocabularies

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use thuchi_core::reports::{CategorySlice, DescriptionBar, FilterOptionsResponse};
use thuchi_core::{FilterSet, Stats};
use thuchi_utils::{format_short, format_vnd};

use crate::error::ApiResult;
use crate::routes::transactions::api::filters_from;
use crate::AppState;

/// Totals formatted for display
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLabels {
    pub tong_thu: String,
    pub tong_chi: String,
    pub can_doi: String,
}

impl From<&Stats> for StatLabels {
    fn from(stats: &Stats) -> Self {
        Self {
            tong_thu: format_vnd(stats.tong_thu),
            tong_chi: format_vnd(stats.tong_chi),
            can_doi: format_vnd(stats.can_doi),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LabelledSlice {
    #[serde(flatten)]
    pub slice: CategorySlice,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct LabelledBar {
    #[serde(flatten)]
    pub bar: DescriptionBar,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: Stats,
    pub labels: StatLabels,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: Stats,
    pub labels: StatLabels,
    pub expense_by_counterparty: Vec<LabelledSlice>,
    pub top_descriptions: Vec<LabelledBar>,
}

/// Income, expense and balance over the filtered view
pub async fn api_stats(
    State(state): State<AppState>,
    filters: Result<Query<FilterSet>, QueryRejection>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = state.tracker.stats(&filters_from(filters)?);
    let labels = StatLabels::from(&stats);
    Ok(Json(StatsResponse { stats, labels }))
}

/// Stats plus both chart groupings, with short VND labels
pub async fn api_dashboard(
    State(state): State<AppState>,
    filters: Result<Query<FilterSet>, QueryRejection>,
) -> ApiResult<Json<DashboardResponse>> {
    let dashboard = state.tracker.dashboard(&filters_from(filters)?);

    Ok(Json(DashboardResponse {
        labels: StatLabels::from(&dashboard.stats),
        stats: dashboard.stats,
        expense_by_counterparty: dashboard
            .expense_by_counterparty
            .into_iter()
            .map(|slice| LabelledSlice { label: format_short(slice.value), slice })
            .collect(),
        top_descriptions: dashboard
            .top_descriptions
            .into_iter()
            .map(|bar| LabelledBar { label: format_short(bar.combined()), bar })
            .collect(),
    }))
}

/// Distinct values for the filter dropdowns
pub async fn api_filter_options(State(state): State<AppState>) -> Json<FilterOptionsResponse> {
    let collection = state.tracker.snapshot();
    Json(FilterOptionsResponse {
        options: thuchi_core::query::filter_options(&collection),
        total_count: collection.len(),
    })
}
