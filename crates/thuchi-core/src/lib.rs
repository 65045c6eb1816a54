//! Core tracker: remote table access, reconciliation and querying

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod raw;
pub mod reconcile;
pub mod reports;
pub mod session;
pub mod time;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thuchi_config::Config;

pub use client::{HttpTransport, RemoteStoreClient, Transport, TransportRef};
pub use error::{CoreError, CoreResult, ErrorContext, ErrorLogger, ErrorSeverity, RemoteError};
pub use models::Transaction;
pub use query::{FilterOptions, FilterSet, Stats};
pub use reports::{Dashboard, Page};
pub use session::LoginGate;
pub use types::{Field, TransactionKind};

use error::DefaultErrorLogger;

/// Session context: the remote client, the current collection and the login gate
///
/// The collection is replaced wholesale on every successful fetch and is
/// never edited in place. Readers take a cheap `Arc` snapshot.
pub struct Tracker {
    config: Config,
    client: RemoteStoreClient,
    collection: RwLock<Arc<Vec<Transaction>>>,
    /// Bumped on logout; fetches started before the bump are discarded
    epoch: AtomicU64,
    gate: LoginGate,
    logger: Box<dyn ErrorLogger>,
}

impl Tracker {
    /// Create a tracker with an empty collection
    pub fn new(config: Config, transport: TransportRef) -> Self {
        let client = RemoteStoreClient::new(transport, config.remote.locale.clone());
        let gate = LoginGate::new(&config.auth);
        Self {
            config,
            client,
            collection: RwLock::new(Arc::new(Vec::new())),
            epoch: AtomicU64::new(0),
            gate,
            logger: Box::new(DefaultErrorLogger),
        }
    }

    /// Create a tracker and restore a persisted login
    pub async fn open(config: Config, transport: TransportRef) -> Self {
        let tracker = Self::new(config, transport);
        tracker.gate.restore().await;
        tracker
    }

    /// Replace the error logger
    pub fn with_logger(mut self, logger: Box<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Collection ====================

    /// Current collection
    pub fn snapshot(&self) -> Arc<Vec<Transaction>> {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, transactions: Vec<Transaction>) {
        let mut guard = self.collection.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(transactions);
    }

    /// Replace the collection unless a logout happened since `epoch`
    fn replace_if_current(&self, epoch: u64, transactions: Vec<Transaction>) -> bool {
        let mut guard = self.collection.write().unwrap_or_else(PoisonError::into_inner);
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        *guard = Arc::new(transactions);
        true
    }

    /// Number of records in the collection
    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// Fetch the table and replace the collection
    ///
    /// On failure the previous collection is kept. A fetch that completes
    /// after a logout is dropped.
    pub async fn refresh(&self) -> CoreResult<usize> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        match self.client.fetch_all().await {
            Ok(transactions) => {
                let count = transactions.len();
                if !self.replace_if_current(epoch, transactions) {
                    log::debug!("Discarding fetch that finished after logout");
                    return Ok(self.count());
                }
                log::info!("Loaded {} transactions", count);
                Ok(count)
            }
            Err(e) => {
                self.logger.log_error(&e, &ErrorContext::new("refresh"));
                Err(e)
            }
        }
    }

    /// Edit a record remotely, then re-fetch
    pub async fn update(&self, tx: &Transaction) -> CoreResult<()> {
        if let Err(e) = self.client.update(tx).await {
            self.logger
                .log_error(&e, &ErrorContext::new("update").with_transaction(&tx.id));
            return Err(e);
        }
        self.refresh().await?;
        Ok(())
    }

    /// Edit the record with local id `id`, keeping its remote key
    pub async fn update_by_id(&self, id: &str, mut tx: Transaction) -> CoreResult<()> {
        let existing = self
            .transaction(id)
            .ok_or_else(|| CoreError::TransactionNotFound { id: id.to_string() })?;

        tx.id = existing.id;
        if tx.app_sheet_id.as_deref().map_or(true, str::is_empty) {
            tx.app_sheet_id = existing.app_sheet_id;
        }
        self.update(&tx).await
    }

    /// Delete a row remotely, then re-fetch
    pub async fn remove(&self, id: &str, remote_id: Option<&str>) -> CoreResult<()> {
        if let Err(e) = self.client.remove(id, remote_id).await {
            self.logger
                .log_error(&e, &ErrorContext::new("remove").with_transaction(id));
            return Err(e);
        }
        self.refresh().await?;
        Ok(())
    }

    /// Delete the record with local id `id`, looking up its remote key
    pub async fn remove_by_id(&self, id: &str) -> CoreResult<()> {
        let existing = self
            .transaction(id)
            .ok_or_else(|| CoreError::TransactionNotFound { id: id.to_string() })?;
        self.remove(&existing.id, existing.app_sheet_id.as_deref()).await
    }

    // ==================== Login ====================

    pub async fn login(&self, passcode: &str) -> CoreResult<()> {
        if let Err(e) = self.gate.login(passcode).await {
            self.logger.log_error(&e, &ErrorContext::new("login"));
            return Err(e);
        }
        log::info!("Logged in");
        Ok(())
    }

    /// Clear the login flag and drop the loaded collection
    pub async fn logout(&self) -> CoreResult<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.replace(Vec::new());
        self.gate.logout().await?;
        log::info!("Logged out");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.gate.is_logged_in()
    }

    pub fn require_login(&self) -> CoreResult<()> {
        self.gate.require()
    }

    // ==================== Queries ====================

    pub fn transaction(&self, id: &str) -> Option<Transaction> {
        self.snapshot().iter().find(|t| t.id == id).cloned()
    }

    pub fn distinct_values(&self, field: Field) -> BTreeSet<String> {
        query::distinct_values(&self.snapshot(), field)
    }

    pub fn filter_options(&self) -> FilterOptions {
        query::filter_options(&self.snapshot())
    }

    pub fn filtered(&self, filters: &FilterSet) -> Vec<Transaction> {
        query::apply_filters(&self.snapshot(), filters)
    }

    pub fn stats(&self, filters: &FilterSet) -> Stats {
        query::compute_stats(&self.filtered(filters))
    }

    /// One page of the filtered view, sized by `pagination.records_per_page`
    pub fn page(&self, filters: &FilterSet, page: usize) -> Page {
        reports::paginate(
            &self.filtered(filters),
            page,
            self.config.pagination.records_per_page,
        )
    }

    pub fn dashboard(&self, filters: &FilterSet) -> Dashboard {
        reports::dashboard(
            &self.filtered(filters),
            self.config.dashboard.top_counterparties,
            self.config.dashboard.top_descriptions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ActionRequest, TransportResponse};
    use crate::testing::{FakeTable, Failure};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Records the operation of every logged error
    #[derive(Default)]
    struct RecordingLogger {
        operations: Arc<Mutex<Vec<String>>>,
    }

    impl ErrorLogger for RecordingLogger {
        fn log_error(&self, _error: &CoreError, context: &ErrorContext) {
            self.operations.lock().unwrap().push(context.operation.clone());
        }
    }

    /// Holds every Find until released
    struct HeldFind {
        inner: Arc<FakeTable>,
        release: Notify,
    }

    #[async_trait]
    impl Transport for HeldFind {
        async fn post(&self, request: &ActionRequest) -> Result<TransportResponse, RemoteError> {
            self.release.notified().await;
            self.inner.post(request).await
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.auth.passcode = "1234".to_string();
        config.pagination.records_per_page = 2;
        config
    }

    fn table() -> Arc<FakeTable> {
        FakeTable::with_rows(vec![
            json!({ "_RowNumber": 2, "id": "a", "ngay": "2025-01-05", "loaiThuChi": "Thu", "noiDung": "Lương", "nguoiCapNhat": "Lan", "soTien": "10,000,000" }),
            json!({ "_RowNumber": 3, "id": "b", "ngay": "2025-01-06", "loaiThuChi": "Chi", "noiDung": "Gạch", "doiTuongThuChi": "Vật liệu", "nguoiCapNhat": "Minh", "soTien": "2,500,000" }),
            json!({ "_RowNumber": 4, "id": "c", "ngay": "2025-02-01", "loaiThuChi": "Chi", "noiDung": "Thợ", "doiTuongThuChi": "Nhân công", "nguoiCapNhat": "Lan", "soTien": "1,500,000" }),
        ])
    }

    fn tracker(table: &Arc<FakeTable>) -> Tracker {
        Tracker::new(config(), table.clone())
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let table = table();
        let tracker = tracker(&table);
        assert_eq!(tracker.count(), 0);

        assert_eq!(tracker.refresh().await.unwrap(), 3);
        assert_eq!(tracker.count(), 3);
        assert_eq!(tracker.transaction("3").unwrap().noi_dung, "Gạch");
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let table = table();
        let tracker = tracker(&table);

        tracker.refresh().await.unwrap();
        let first = tracker.snapshot();
        tracker.refresh().await.unwrap();
        assert_eq!(*first, *tracker.snapshot());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_collection() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        table.fail_next(Failure::Status(503));
        let err = tracker.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "Lỗi tải dữ liệu: HTTP error! status: 503");
        assert_eq!(tracker.count(), 3);
    }

    #[tokio::test]
    async fn test_update_then_refetch() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        let mut tx = tracker.transaction("3").unwrap();
        tx.so_tien = Decimal::from(2_700_000);
        tracker.update(&tx).await.unwrap();

        assert_eq!(tracker.transaction("3").unwrap().so_tien, Decimal::from(2_700_000));
        let actions: Vec<_> = table.requests().iter().map(|r| r["Action"].clone()).collect();
        assert_eq!(actions, vec![json!("Find"), json!("Edit"), json!("Find")]);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_collection() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();
        let before = tracker.snapshot();

        let mut tx = tracker.transaction("2").unwrap();
        tx.noi_dung = "Thưởng".to_string();
        table.fail_next(Failure::Transport("timed out".to_string()));

        let err = tracker.update(&tx).await.unwrap_err();
        assert_eq!(err.to_string(), "Lỗi cập nhật: timed out");
        assert_eq!(*before, *tracker.snapshot());
        // No re-fetch after a failed verb
        assert_eq!(table.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_update_by_id_keeps_remote_key() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        let mut tx = tracker.transaction("4").unwrap();
        tx.app_sheet_id = None;
        tx.ghi_chu = "đã trả".to_string();
        tracker.update_by_id("4", tx).await.unwrap();

        assert_eq!(table.requests()[1]["Rows"][0]["id"], "c");
        assert_eq!(tracker.transaction("4").unwrap().ghi_chu, "đã trả");
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        tracker.remove_by_id("2").await.unwrap();
        assert_eq!(tracker.count(), 2);
        assert!(tracker.transaction("2").is_none());
        assert_eq!(table.requests()[1]["Rows"][0]["id"], "a");

        let err = tracker.remove_by_id("2").await.unwrap_err();
        assert!(matches!(err, CoreError::TransactionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_remove_leaves_collection() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        table.fail_next(Failure::Status(500));
        let err = tracker.remove("3", Some("b")).await.unwrap_err();
        assert_eq!(err.to_string(), "Lỗi xóa: HTTP error! status: 500");
        assert_eq!(tracker.count(), 3);
        assert_eq!(table.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_login_logout() {
        let table = table();
        let tracker = tracker(&table);

        assert!(matches!(tracker.login("0000").await, Err(CoreError::InvalidPasscode)));
        assert!(!tracker.is_logged_in());

        tracker.login("1234").await.unwrap();
        assert!(tracker.require_login().is_ok());
        tracker.refresh().await.unwrap();

        tracker.logout().await.unwrap();
        assert!(!tracker.is_logged_in());
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_finishing_after_logout_is_dropped() {
        let held = Arc::new(HeldFind {
            inner: table(),
            release: Notify::new(),
        });
        let tracker = Tracker::new(config(), held.clone());
        tracker.login("1234").await.unwrap();

        let (refreshed, _) = tokio::join!(tracker.refresh(), async {
            tracker.logout().await.unwrap();
            held.release.notify_one();
        });

        assert_eq!(refreshed.unwrap(), 0);
        assert_eq!(tracker.count(), 0);
        assert!(!tracker.is_logged_in());
    }

    #[tokio::test]
    async fn test_failures_reach_error_logger() {
        let table = table();
        let logger = RecordingLogger::default();
        let operations = logger.operations.clone();
        let tracker = tracker(&table).with_logger(Box::new(logger));

        table.fail_next(Failure::Status(500));
        assert!(tracker.refresh().await.is_err());
        assert!(tracker.login("bad").await.is_err());

        assert_eq!(*operations.lock().unwrap(), vec!["refresh", "login"]);
    }

    #[tokio::test]
    async fn test_config_is_exposed() {
        let table = table();
        let tracker = tracker(&table);
        assert_eq!(tracker.config().pagination.records_per_page, 2);
    }

    #[tokio::test]
    async fn test_query_helpers() {
        let table = table();
        let tracker = tracker(&table);
        tracker.refresh().await.unwrap();

        let people = tracker.distinct_values(Field::NguoiCapNhat);
        assert_eq!(people.into_iter().collect::<Vec<_>>(), vec!["Lan", "Minh"]);

        let filters = FilterSet { loai_thu_chi: "Chi".to_string(), ..Default::default() };
        let stats = tracker.stats(&filters);
        assert_eq!(stats.tong_chi, Decimal::from(4_000_000));
        assert_eq!(stats.so_giao_dich, 2);

        let page = tracker.page(&FilterSet::default(), 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.transactions.len(), 1);

        let dash = tracker.dashboard(&FilterSet::default());
        assert_eq!(dash.stats.can_doi, Decimal::from(6_000_000));
        assert_eq!(dash.expense_by_counterparty[0].name, "Vật liệu");
        assert_eq!(tracker.filter_options().doi_tuong_thu_chi.len(), 2);
    }
}
