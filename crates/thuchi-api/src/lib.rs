//! JSON API server over the tracker
//!
//! Routes are organized into modules:
//! - routes::session: login, logout, login state
//! - routes::transactions: list, detail, edit, delete, reload
//! - routes::reports: stats, dashboard, filter options

pub mod error;
pub mod routes;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use thuchi_core::Tracker;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::reports::{api_dashboard, api_filter_options, api_stats};
    use routes::session::{api_login, api_logout, api_session, require_login};
    use routes::transactions::{
        api_reload, api_transaction_delete, api_transaction_detail, api_transaction_update,
        api_transactions,
    };

    let protected = Router::new()
        .route("/api/logout", post(api_logout))
        .route("/api/transactions", get(api_transactions))
        .route(
            "/api/transactions/:id",
            get(api_transaction_detail)
                .put(api_transaction_update)
                .delete(api_transaction_delete),
        )
        .route("/api/stats", get(api_stats))
        .route("/api/dashboard", get(api_dashboard))
        .route("/api/filter-options", get(api_filter_options))
        .route("/api/reload", post(api_reload))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/login", post(api_login))
        .route("/api/session", get(api_session))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Start the HTTP server
///
/// Binds `server.host:server.port` and serves until Ctrl-C.
pub async fn start_server(tracker: Arc<Tracker>) -> anyhow::Result<()> {
    let server = &tracker.config().server;
    let addr = format!("{}:{}", server.host, server.port);
    let state = AppState { tracker };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting thuchi server on http://{}", addr);
    log::info!("Available routes: /api/health, /api/login, /api/session, /api/transactions, /api/stats, /api/dashboard, /api/filter-options, /api/reload");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use thuchi_config::Config;
    use thuchi_core::client::{Action, ActionRequest, TransportResponse};
    use thuchi_core::{RemoteError, Transport};
    use tower::ServiceExt;

    /// Answers Find with fixed rows and accepts every mutation
    struct StaticTable {
        rows: Mutex<Vec<Value>>,
        actions: Mutex<Vec<Action>>,
    }

    #[async_trait]
    impl Transport for StaticTable {
        async fn post(&self, request: &ActionRequest) -> Result<TransportResponse, RemoteError> {
            self.actions.lock().unwrap().push(request.action);
            let body = match request.action {
                Action::Find => Value::Array(self.rows.lock().unwrap().clone()),
                Action::Edit | Action::Delete => json!({ "Rows": [] }),
            };
            Ok(TransportResponse {
                status: 200,
                body: serde_json::to_vec(&body).unwrap(),
            })
        }
    }

    fn app() -> (Router, Arc<StaticTable>) {
        let table = Arc::new(StaticTable {
            rows: Mutex::new(vec![
                json!({ "_RowNumber": 2, "id": "a", "ngay": "2025-03-01", "loaiThuChi": "Thu", "noiDung": "Lương", "soTien": "12,000,000" }),
                json!({ "_RowNumber": 3, "id": "b", "ngay": "2025-03-02", "loaiThuChi": "Chi", "noiDung": "Xi măng", "doiTuongThuChi": "Vật liệu", "soTien": "2,500,000" }),
                json!({ "_RowNumber": 4, "id": "c", "ngay": "2025-03-20", "loaiThuChi": "Chi", "noiDung": "Thợ", "doiTuongThuChi": "Nhân công", "soTien": "1,000,000" }),
            ]),
            actions: Mutex::new(vec![]),
        });

        let mut config = Config::default();
        config.auth.passcode = "8888".to_string();
        let tracker = Arc::new(Tracker::new(config, table.clone()));

        (create_router(AppState { tracker }), table)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router) {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/login", json!({ "passcode": "8888" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = app();
        let response = app.oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_routes_require_login() {
        let (app, table) = app();

        let response = app.clone().oneshot(get_request("/api/transactions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Chưa đăng nhập");

        let response = app.oneshot(get_request("/api/session")).await.unwrap();
        assert_eq!(body_json(response).await["loggedIn"], false);
        assert!(table.actions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_passcode() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/api/login", json!({ "passcode": "1" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Mật mã không đúng!");
    }

    #[tokio::test]
    async fn test_login_loads_and_filters() {
        let (app, _) = app();
        login(&app).await;

        let response = app
            .clone()
            .oneshot(get_request("/api/transactions?loaiThuChi=Chi&page=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["totalCount"], 2);
        assert_eq!(page["transactions"][0]["noiDung"], "Xi măng");

        let response = app
            .clone()
            .oneshot(get_request("/api/stats?startDate=2025-03-02&endDate=2025-03-02"))
            .await
            .unwrap();
        let stats = body_json(response).await;
        assert_eq!(stats["stats"]["soGiaoDich"], 1);

        let response = app.oneshot(get_request("/api/filter-options")).await.unwrap();
        let options = body_json(response).await;
        assert_eq!(options["totalCount"], 3);
        assert_eq!(options["options"]["loaiThuChi"], json!(["Chi", "Thu"]));
    }

    #[tokio::test]
    async fn test_bad_filter_date() {
        let (app, _) = app();
        login(&app).await;

        let response = app.oneshot(get_request("/api/stats?startDate=soon")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_dashboard_labels() {
        let (app, _) = app();
        login(&app).await;

        let response = app.oneshot(get_request("/api/dashboard")).await.unwrap();
        let dash = body_json(response).await;
        assert_eq!(dash["expenseByCounterparty"][0]["name"], "Vật liệu");
        assert_eq!(dash["expenseByCounterparty"][0]["label"], "2.5 triệu");
        assert_eq!(dash["topDescriptions"][0]["name"], "Lương");
    }

    #[tokio::test]
    async fn test_update_and_delete_refetch() {
        let (app, table) = app();
        login(&app).await;

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/api/transactions/3", json!({ "ghiChu": "đã thanh toán" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Cập nhật thành công");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/transactions/4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(json_request("PUT", "/api/transactions/99", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let actions = table.actions.lock().unwrap().clone();
        assert_eq!(
            actions,
            vec![Action::Find, Action::Edit, Action::Find, Action::Delete, Action::Find]
        );
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (app, _) = app();
        login(&app).await;

        let response = app.clone().oneshot(json_request("POST", "/api/logout", json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_request("/api/session")).await.unwrap();
        let session = body_json(response).await;
        assert_eq!(session["loggedIn"], false);
        assert_eq!(session["totalCount"], 0);
    }
}
