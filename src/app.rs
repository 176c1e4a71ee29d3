use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{entries, profile, session, stats};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(profile::router())
                  .merge(session::router())
                  .merge(entries::router())
                  .merge(stats::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod app_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::*;
    use crate::ai::client::fake::ScriptedClient;
    use crate::ai::dto::GenerateRequest;
    use crate::ai::GenerativeClient;
    use crate::ai::services::INSIGHT_FALLBACK;

    const MEAL_REPLY: &str =
        "```json\n{\"name\":\"Chicken bowl\",\"calories\":500,\"protein\":30,\"carbs\":50,\"fat\":10}\n```";
    const RIDE_REPLY: &str = r#"{"activity":"Cycling","durationMinutes":40,"caloriesBurned":200}"#;

    fn app_with(client: ScriptedClient) -> (Router, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        (build_app(AppState::fake(client.clone())), client)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        });
        (status, value)
    }

    async fn onboard(app: &Router) {
        let (status, profile) = call(
            app,
            Method::POST,
            "/api/v1/onboarding",
            Some(json!({"name": "Sam", "weight_kg": 60, "height_cm": 160, "age_years": 25, "goal": "lose"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(profile["calorie_target"], 1535);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app_with(ScriptedClient::new());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn dashboard_requires_profile() {
        let (app, _) = app_with(ScriptedClient::new());
        let (status, _) = call(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = call(&app, Method::POST, "/api/v1/view/food", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, session) = call(&app, Method::GET, "/api/v1/session", None).await;
        assert_eq!(session["view"], "ONBOARDING");
        assert!(session["profile"].is_null());
    }

    #[tokio::test]
    async fn invalid_onboarding_reports_fields() {
        let (app, _) = app_with(ScriptedClient::new());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/onboarding",
            Some(json!({"name": "", "weight_kg": -3, "height_cm": 170})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["name", "weight_kg", "age_years"]);

        let (_, session) = call(&app, Method::GET, "/api/v1/session", None).await;
        assert_eq!(session["view"], "ONBOARDING");
    }

    #[tokio::test]
    async fn full_day_flow() {
        let (app, client) = app_with(
            ScriptedClient::new()
                .reply(MEAL_REPLY)
                .reply(RIDE_REPLY)
                .reply("Nice balance today!"),
        );
        onboard(&app).await;

        let (status, _) = call(&app, Method::POST, "/api/v1/view/food", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, food) = call(
            &app,
            Method::POST,
            "/api/v1/food/base64",
            Some(json!({"image_b64": "data:image/png;base64,aGVsbG8="})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(food["name"], "Chicken bowl");
        let image_ref = food["image_ref"].as_str().unwrap().to_string();

        let (status, session) = call(&app, Method::POST, "/api/v1/view/exercise", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["view"], "EXERCISE_LOG");
        let (status, exercise) = call(
            &app,
            Method::POST,
            "/api/v1/exercise",
            Some(json!({"description": "Rode my bike for 40 minutes"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(exercise["calories_burned"], 200.0);

        let (status, dash) = call(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dash["name"], "Sam");
        assert_eq!(dash["stats"]["calories_consumed"], 500.0);
        assert_eq!(dash["stats"]["calories_burned"], 200.0);
        assert_eq!(dash["stats"]["protein_g"], 30.0);
        assert_eq!(dash["remaining_calories"], 1235.0);
        assert_eq!(dash["insight"], "Nice balance today!");
        assert_eq!(dash["macros"]["has_macro_data"], true);
        let kinds: Vec<&str> = dash["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&"food") && kinds.contains(&"exercise"));

        let sent = client.requests();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].prompt_text().contains("User weight: 60kg"));

        let res = app
            .clone()
            .oneshot(Request::get(image_ref.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn failed_food_analysis_is_retryable() {
        let (app, _) = app_with(
            ScriptedClient::new()
                .reply("sorry, I can't tell what this is")
                .reply(MEAL_REPLY),
        );
        onboard(&app).await;
        call(&app, Method::POST, "/api/v1/view/food", None).await;

        let payload = json!({"image_b64": "aGVsbG8=", "content_type": "image/jpeg"});
        let (status, body) =
            call(&app, Method::POST, "/api/v1/food/base64", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.as_str().unwrap().contains("Could not analyze food"));

        let (_, session) = call(&app, Method::GET, "/api/v1/session", None).await;
        assert_eq!(session["view"], "FOOD_LOG");
        assert_eq!(session["food_log"]["status"], "idle");
        assert_eq!(session["food_log"]["has_input"], true);
        let (_, entries) = call(&app, Method::GET, "/api/v1/entries", None).await;
        assert_eq!(entries.as_array().unwrap().len(), 0);

        let (status, _) = call(&app, Method::POST, "/api/v1/food/base64", Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, session) = call(&app, Method::GET, "/api/v1/session", None).await;
        assert_eq!(session["view"], "DASHBOARD");
    }

    /// Holds every call until released, then fails it.
    struct GatedClient {
        gate: Notify,
    }

    #[async_trait]
    impl GenerativeClient for GatedClient {
        async fn generate(&self, _request: GenerateRequest) -> anyhow::Result<String> {
            self.gate.notified().await;
            anyhow::bail!("connection reset")
        }
    }

    #[tokio::test]
    async fn dropped_food_request_still_settles_the_flow() {
        let client = Arc::new(GatedClient {
            gate: Notify::new(),
        });
        let app = build_app(AppState::fake(client.clone()));
        onboard(&app).await;
        call(&app, Method::POST, "/api/v1/view/food", None).await;

        let payload = json!({"image_b64": "aGVsbG8=", "content_type": "image/png"});
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            call(&app, Method::POST, "/api/v1/food/base64", Some(payload.clone())),
        )
        .await;
        assert!(abandoned.is_err());

        // the analysis keeps running without its caller
        let (status, _) = call(&app, Method::POST, "/api/v1/view/back", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        client.gate.notify_one();
        let mut session = Value::Null;
        for _ in 0..100 {
            session = call(&app, Method::GET, "/api/v1/session", None).await.1;
            if session["food_log"]["status"] == "idle" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(session["food_log"]["status"], "idle");
        assert!(session["food_log"]["error"]
            .as_str()
            .unwrap()
            .contains("Could not analyze food"));

        let (status, _) = call(&app, Method::POST, "/api/v1/view/back", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, session) = call(&app, Method::GET, "/api/v1/session", None).await;
        assert_eq!(session["view"], "DASHBOARD");
    }

    #[tokio::test]
    async fn insight_failure_uses_fallback() {
        let (app, _) = app_with(ScriptedClient::new().fail("upstream down"));
        onboard(&app).await;
        let (status, dash) = call(&app, Method::GET, "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dash["insight"], INSIGHT_FALLBACK);
        assert_eq!(dash["progress"], 0.0);
        assert_eq!(dash["macros"]["has_macro_data"], false);
    }

    #[tokio::test]
    async fn exercise_requires_text_and_view() {
        let (app, client) = app_with(ScriptedClient::new());
        onboard(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/exercise",
            Some(json!({"description": "30 mins yoga"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(&app, Method::POST, "/api/v1/view/exercise", None).await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/exercise",
            Some(json!({"description": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(client.requests().is_empty());

        let (_, examples) = call(&app, Method::GET, "/api/v1/exercise/examples", None).await;
        assert_eq!(examples["examples"][1], "30 mins yoga");
    }

    #[tokio::test]
    async fn multipart_upload_is_analyzed() {
        let (app, client) = app_with(ScriptedClient::new().reply(MEAL_REPLY));
        onboard(&app).await;
        call(&app, Method::POST, "/api/v1/view/food", None).await;

        let boundary = "fitaiboundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"meal.webp\"\r\n\
             Content-Type: image/webp\r\n\r\nRIFFdata\r\n--{boundary}--\r\n"
        );
        let req = Request::post("/api/v1/food")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let sent = client.requests();
        assert!(matches!(
            &sent[0].parts[0],
            crate::ai::dto::Part::InlineImage { mime_type, data }
                if mime_type == "image/webp" && &data[..] == b"RIFFdata"
        ));
    }

    #[tokio::test]
    async fn rejects_non_image_upload() {
        let (app, client) = app_with(ScriptedClient::new());
        onboard(&app).await;
        call(&app, Method::POST, "/api/v1/view/food", None).await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/food/base64",
            Some(json!({"image_b64": "aGVsbG8=", "content_type": "text/plain"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(client.requests().is_empty());
    }
}
