use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{Result, SinalizaError};
use super::{
    FetchRequest, FetchedPassage, PassageService, RegisteredSite, SiteRegistry, VideoSubmission,
    wire,
};

/// Passage service reached over HTTP (`/db_queries/...` endpoints)
pub struct HttpPassageService {
    client: Client,
    config: ServiceConfig,
}

impl HttpPassageService {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SinalizaError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/db_queries/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(SinalizaError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SinalizaError::Service {
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response)
    }

    async fn body(response: Response) -> Result<String> {
        response
            .text()
            .await
            .map_err(|e| SinalizaError::MalformedResponse(format!("Failed to read response: {}", e)))
    }
}

/// Query parameters of a fetch; `site_id` is left out when there is no filter.
pub fn fetch_query(request: &FetchRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(2);
    if let Some(site_id) = request.site_id {
        query.push(("site_id", site_id.to_string()));
    }
    query.push(("get_all_trechos_from_site", request.all_from_site.to_string()));
    query
}

pub fn submit_query(submission: &VideoSubmission) -> Vec<(&'static str, String)> {
    vec![
        ("interprete_id", submission.interpreter_id.clone()),
        ("video_url", submission.video_url.clone()),
        ("trecho_id", submission.passage_id.to_string()),
    ]
}

#[async_trait]
impl PassageService for HttpPassageService {
    async fn fetch_passages(&self, request: &FetchRequest) -> Result<Vec<FetchedPassage>> {
        let response = self.get("get_trecho_para_traduzir", &fetch_query(request)).await?;
        let body = Self::body(response).await?;
        wire::parse_fetch_response(&body)
    }

    async fn submit_video(&self, submission: &VideoSubmission) -> Result<()> {
        self.get("registra_video", &submit_query(submission)).await?;
        info!("Registered video for passage {}", submission.passage_id);
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.get("", &[]).await?;
        info!("Passage service at {} is available", self.config.endpoint);
        Ok(())
    }
}

#[async_trait]
impl SiteRegistry for HttpPassageService {
    async fn register_site(&self, site_url: &str) -> Result<RegisteredSite> {
        let response = self
            .get("registra_site", &[("site_url", site_url.to_string())])
            .await?;
        let body = Self::body(response).await?;
        wire::parse_registered_site(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::{PassageId, SiteId};
    use axum::{
        Json, Router,
        extract::{Query, State},
        http::StatusCode,
        routing::get,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn fetch_handler(
        State(captured): State<Captured>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        captured.lock().unwrap().push(params);
        Json(json!({
            "status": "success",
            "response": [
                {"conteudo": "Bem-vindo ao portal", "snapshot_name": "p1.png", "trecho_id": 21, "site_url": "https://portal.example.br", "site_id": 4}
            ]
        }))
    }

    async fn submit_handler(
        State(captured): State<Captured>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        captured.lock().unwrap().push(params);
        Json(json!({"status": 200}))
    }

    async fn register_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({"site_url": params.get("site_url"), "site_id": 9}))
    }

    async fn spawn_service(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn service_for(endpoint: String) -> HttpPassageService {
        let client = Client::builder().no_proxy().build().expect("client");
        HttpPassageService::with_client(
            client,
            ServiceConfig {
                endpoint,
                timeout_secs: None,
            },
        )
    }

    #[test]
    fn test_fetch_query_omits_missing_site() {
        let query = fetch_query(&FetchRequest { site_id: None, all_from_site: false });
        assert_eq!(query, vec![("get_all_trechos_from_site", "false".to_string())]);

        let query = fetch_query(&FetchRequest { site_id: Some(SiteId(42)), all_from_site: true });
        assert_eq!(
            query,
            vec![
                ("site_id", "42".to_string()),
                ("get_all_trechos_from_site", "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_passages_over_http() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route("/db_queries/get_trecho_para_traduzir", get(fetch_handler))
            .with_state(captured.clone());
        let service = service_for(spawn_service(router).await);

        let passages = service
            .fetch_passages(&FetchRequest { site_id: Some(SiteId(4)), all_from_site: true })
            .await
            .unwrap();

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].passage_id, PassageId(21));
        assert_eq!(passages[0].content, "Bem-vindo ao portal");

        let params = captured.lock().unwrap();
        assert_eq!(params[0].get("site_id").map(String::as_str), Some("4"));
        assert_eq!(params[0].get("get_all_trechos_from_site").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_submit_video_sends_all_fields() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route("/db_queries/registra_video", get(submit_handler))
            .with_state(captured.clone());
        let service = service_for(spawn_service(router).await);

        service
            .submit_video(&VideoSubmission {
                interpreter_id: "7".to_string(),
                video_url: "https://videos.example/v?id=1&t=2".to_string(),
                passage_id: PassageId(21),
            })
            .await
            .unwrap();

        let params = captured.lock().unwrap();
        assert_eq!(params[0].get("interprete_id").map(String::as_str), Some("7"));
        assert_eq!(
            params[0].get("video_url").map(String::as_str),
            Some("https://videos.example/v?id=1&t=2")
        );
        assert_eq!(params[0].get("trecho_id").map(String::as_str), Some("21"));
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_service_error() {
        let router = Router::new().route(
            "/db_queries/get_trecho_para_traduzir",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let service = service_for(spawn_service(router).await);

        let err = service
            .fetch_passages(&FetchRequest { site_id: None, all_from_site: false })
            .await
            .unwrap_err();

        match err {
            SinalizaError::Service { status, text } => {
                assert_eq!(status, 500);
                assert_eq!(text, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed() {
        let router = Router::new().route(
            "/db_queries/get_trecho_para_traduzir",
            get(|| async { Json(json!({"status": 200, "response": {"trecho_id": 1}})) }),
        );
        let service = service_for(spawn_service(router).await);

        let err = service
            .fetch_passages(&FetchRequest { site_id: None, all_from_site: false })
            .await
            .unwrap_err();
        assert!(matches!(err, SinalizaError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = service_for(format!("http://{addr}"));
        let err = service.check_availability().await.unwrap_err();
        assert!(matches!(err, SinalizaError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_service_is_timeout_not_network_failure() {
        let router = Router::new().route(
            "/db_queries/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"status": 200}))
            }),
        );
        let endpoint = spawn_service(router).await;
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_millis(200))
            .build()
            .expect("client");
        let service = HttpPassageService::with_client(
            client,
            ServiceConfig {
                endpoint,
                timeout_secs: None,
            },
        );

        let err = service.check_availability().await.unwrap_err();
        assert!(matches!(err, SinalizaError::Timeout(_)));
        assert!(!err.user_message().contains("running"));
    }

    #[tokio::test]
    async fn test_unusable_endpoint_is_config_error() {
        let service = service_for("not an endpoint".to_string());

        let err = service.check_availability().await.unwrap_err();
        assert!(matches!(err, SinalizaError::Config(_)));
    }

    #[tokio::test]
    async fn test_register_site() {
        let router = Router::new().route("/db_queries/registra_site", get(register_handler));
        let service = service_for(spawn_service(router).await);

        let site = service.register_site("https://gov.example.br").await.unwrap();
        assert_eq!(site.site_url.as_deref(), Some("https://gov.example.br"));
        assert_eq!(site.site_id, Some(SiteId(9)));
    }

    #[tokio::test]
    async fn test_check_availability_hits_root() {
        let router = Router::new().route("/db_queries/", get(|| async { Json(json!({"status": 200})) }));
        let service = service_for(spawn_service(router).await);

        service.check_availability().await.unwrap();
    }
}
