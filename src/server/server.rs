mod error;
use error::ServerError;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router
};
use clap::Parser;
use log::info;
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use cashbook::{AppConfig, ExpenseRecord, Field, LedgerStore, LedgerTable, NewExpense, Summary,
    config::DEFAULT_CONFIG_FILE,
    table::by_code};

/// One request at a time goes through the store, so every
/// read-modify-write of the ledger file completes before the next starts.
type SharedStore = Arc<Mutex<LedgerStore>>;

#[derive(Parser, Debug)]
#[clap(version, about = "Serve an expense ledger over HTTP")]
struct ServerArgs {
    /// Config file to read settings from
    #[clap(short, long, value_parser, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    field: Field,
    value: String
}

#[derive(Debug, Deserialize)]
struct CodeQuery {
    code: String
}

/// Runs `op` against the store on the blocking pool. The lock is held
/// until the file I/O is done, keeping the ledger single-writer.
async fn with_store<T, F>(store: SharedStore, op: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&LedgerStore) -> cashbook::core::Result<T> + Send + 'static
{
    let guard = store.lock_owned().await;
    let result = tokio::task::spawn_blocking(move || op(&*guard))
        .await
        .map_err(|err| ServerError::InternalError(err.into()))?;
    Ok(result?)
}

async fn list_records(State(store): State<SharedStore>) -> Result<Json<LedgerTable>, ServerError> {
    with_store(store, |store| store.load()).await.map(Json)
}

async fn append_record(
    State(store): State<SharedStore>,
    Json(expense): Json<NewExpense>
) -> Result<Json<LedgerTable>, ServerError> {
    with_store(store, move |store| store.append(expense)).await.map(Json)
}

async fn update_record(
    State(store): State<SharedStore>,
    Path(index): Path<usize>,
    Json(update): Json<FieldUpdate>
) -> Result<Json<LedgerTable>, ServerError> {
    with_store(store, move |store| store.update_field(index, update.field, &update.value)).await.map(Json)
}

async fn delete_record(
    State(store): State<SharedStore>,
    Path(index): Path<usize>
) -> Result<Json<LedgerTable>, ServerError> {
    with_store(store, move |store| store.delete(index)).await.map(Json)
}

async fn search_records(
    State(store): State<SharedStore>,
    Query(query): Query<CodeQuery>
) -> Result<Json<Vec<ExpenseRecord>>, ServerError> {
    with_store(store, move |store| store.search(by_code(query.code))).await.map(Json)
}

async fn summary(State(store): State<SharedStore>) -> Result<Json<Summary>, ServerError> {
    with_store(store, |store| store.summary()).await.map(Json)
}

async fn export_csv(State(store): State<SharedStore>) -> Result<impl IntoResponse, ServerError> {
    let (bytes, file_name) = with_store(store, |store| {
        let bytes = store.export()?;
        let file_name = store.backend().path().file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger.csv".to_owned());
        Ok((bytes, file_name))
    }).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
    ];
    Ok((headers, bytes))
}

fn app(store: SharedStore, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/records", get(list_records).post(append_record))
        .route("/records/search", get(search_records))
        .route("/records/:index", patch(update_record).delete(delete_record))
        .route("/summary", get(summary))
        .route("/export", get(export_csv))
        .with_state(store);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ServerArgs::parse();

    let config = AppConfig::read_or_default(&args.config)?;
    let store = config.open_store();
    store.load()
        .with_context(|| format!("failed to open ledger {}", config.ledger_path.display()))?;

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!("serving {} on {}", config.ledger_path.display(), config.server.bind);

    let router = app(Arc::new(Mutex::new(store)), config.server.static_dir.clone());
    axum::serve(listener, router).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use axum::{
        body::{self, Body},
        http::{header, Method, Request, StatusCode},
        Router
    };
    use rstest::{fixture, rstest};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use cashbook::{CodePolicy, LedgerStore};

    use super::app;

    struct TestApp {
        dir: TempDir,
        router: Router
    }

    #[fixture]
    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("cashbook.csv"), CodePolicy::Numeric);
        let router = app(Arc::new(Mutex::new(store)), None);
        TestApp { dir, router }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            },
            None => Body::empty()
        };
        let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn as_json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn expense(code: &str, quantity: u32, unit_price: u64) -> Value {
        json!({
            "date": "14-02-2024",
            "code": code,
            "description": "bensin",
            "quantity": quantity,
            "unit_price": unit_price
        })
    }

    #[rstest]
    #[tokio::test]
    async fn append_and_list(test_app: TestApp) {
        let (status, body) = send(&test_app.router, Method::POST, "/records", Some(expense("00010", 2, 1500))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body)[0]["total"], 3000);

        let (status, body) = send(&test_app.router, Method::GET, "/records", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body).as_array().unwrap().len(), 1);
        assert_eq!(as_json(&body)[0]["code"], "00010");
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_code_is_unprocessable(test_app: TestApp) {
        let (status, body) = send(&test_app.router, Method::POST, "/records", Some(expense("12AB3", 1, 1))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(as_json(&body)["error"].as_str().unwrap().contains("digits"));
    }

    #[rstest]
    #[tokio::test]
    async fn update_and_delete(test_app: TestApp) {
        send(&test_app.router, Method::POST, "/records", Some(expense("00001", 1, 100))).await;
        send(&test_app.router, Method::POST, "/records", Some(expense("00002", 1, 200))).await;

        let update = json!({"field": "code", "value": "77777"});
        let (status, body) = send(&test_app.router, Method::PATCH, "/records/1", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body)[1]["code"], "77777");

        let (status, body) = send(&test_app.router, Method::DELETE, "/records/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!([{
            "date": "14-02-2024",
            "code": "77777",
            "description": "bensin",
            "quantity": 1,
            "unit_price": 200,
            "total": 200
        }]));

        let (status, _) = send(&test_app.router, Method::DELETE, "/records/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn search_and_summary(test_app: TestApp) {
        send(&test_app.router, Method::POST, "/records", Some(expense("00001", 1, 1000))).await;
        send(&test_app.router, Method::POST, "/records", Some(expense("00002", 5, 500))).await;

        let (status, body) = send(&test_app.router, Method::GET, "/records/search?code=00002", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body).as_array().unwrap().len(), 1);

        let (status, body) = send(&test_app.router, Method::GET, "/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({
            "total": 3500,
            "average": 1750.0,
            "count": 2,
            "monthly_totals": {"2024-02": 3500}
        }));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_all_land(test_app: TestApp) {
        let requests: Vec<_> = (0..16)
            .map(|i| {
                let router = test_app.router.clone();
                let code = format!("{:05}", i);
                tokio::spawn(async move {
                    send(&router, Method::POST, "/records", Some(expense(&code, 1, 100))).await
                })
            })
            .collect();
        for request in requests {
            let (status, _) = request.await.unwrap();
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&test_app.router, Method::GET, "/summary", None).await;
        assert_eq!(as_json(&body)["count"], 16);
        assert_eq!(as_json(&body)["total"], 1600);
    }

    #[rstest]
    #[tokio::test]
    async fn export_matches_file(test_app: TestApp) {
        send(&test_app.router, Method::POST, "/records", Some(expense("00001", 1, 1000))).await;

        let (status, body) = send(&test_app.router, Method::GET, "/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, fs::read(test_app.dir.path().join("cashbook.csv")).unwrap());
    }
}
