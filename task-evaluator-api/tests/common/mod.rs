#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use task_evaluator_api::{
    clients::{CheckoutGateway, ModelClient, ModelError},
    middleware::Claims,
    routes,
    settings::{AuthSettings, ModelSettings, PaymentSettings, QueueSettings},
    AppState, EvaluationJob, EvaluationQueue, EvaluationService, Integration, ModelBinding,
    Repositories,
};
use task_evaluator_core::domain::{Report, Task, TaskSubmission, UserId};
use task_evaluator_core::evaluation::{EvaluationPrompt, EvaluationResult};
use task_evaluator_core::{ReportRepository, TaskRepository};
use task_evaluator_storage::MemoryStore;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const STRIPE_SECRET: &str = "sk_test_secret";

/// Model double answering every prompt with the same completion.
pub struct StubModel {
    completion: Option<Value>,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn answering(completion: Value) -> Arc<Self> {
        Arc::new(Self {
            completion: Some(completion),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            completion: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn complete(&self, _prompt: &EvaluationPrompt) -> Result<Value, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.completion.clone().ok_or_else(|| ModelError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "model overloaded".to_string(),
        })
    }
}

/// A completion carrying a well-formed evaluation.
pub fn model_completion(score: i64) -> Value {
    let evaluation = json!({
        "score": score,
        "strengths": ["Readable", "Well tested"],
        "improvements": ["Handle empty input"],
        "short_feedback": "Solid submission",
        "full_report": "Detailed review of the submission."
    });
    json!({ "output_text": evaluation.to_string() })
}

pub fn model_binding(model: Arc<dyn ModelClient>) -> Integration<ModelBinding> {
    let settings = ModelSettings::new("sk-model-test", "http://model.invalid/v1");
    Integration::Configured(ModelBinding::new(model, &settings))
}

pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
    pub jobs: mpsc::Receiver<EvaluationJob>,
}

pub struct TestAppBuilder {
    model: Integration<ModelBinding>,
    checkout: Integration<Arc<dyn CheckoutGateway>>,
    payments: PaymentSettings,
    queue: QueueSettings,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            model: Integration::Unconfigured,
            checkout: Integration::Unconfigured,
            payments: PaymentSettings::default(),
            queue: QueueSettings::default(),
        }
    }

    /// Sends one request through the router and decodes the JSON body.
    /// Non-JSON bodies come back as a string value, empty ones as null.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub async fn seed_task(&self, owner: UserId) -> Task {
        let task = TaskSubmission::new("Reverse a list", "Return the list reversed", "fn rev() {}")
            .with_language("Rust")
            .into_task(owner)
            .expect("valid submission");
        TaskRepository::create(&self.store, &task)
            .await
            .expect("task insert")
    }

    pub async fn seed_report(&self, task: &Task) -> Report {
        let report = Report::from_evaluation(task, evaluation());
        ReportRepository::create(&self.store, &report)
            .await
            .expect("report insert")
    }

    pub async fn task(&self, task: &Task) -> Task {
        self.store
            .get_by_id(&task.id)
            .await
            .expect("task lookup")
            .expect("task exists")
    }

    pub async fn report(&self, report: &Report) -> Report {
        self.store
            .get_for_owner(&report.id, &report.user_id)
            .await
            .expect("report lookup")
            .expect("report exists")
    }
}

impl TestAppBuilder {
    pub fn model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = model_binding(model);
        self
    }

    pub fn checkout(mut self, gateway: Arc<dyn CheckoutGateway>) -> Self {
        self.checkout = Integration::Configured(gateway);
        self
    }

    pub fn payments(mut self, payments: PaymentSettings) -> Self {
        self.payments = payments;
        self
    }

    pub fn build(self) -> TestApp {
        let store = MemoryStore::new();
        let repositories = Repositories::memory(store.clone());
        let (queue, jobs) = EvaluationQueue::new(&self.queue);
        let evaluations = EvaluationService::new(
            repositories.tasks.clone(),
            repositories.reports.clone(),
            self.model,
        );
        let auth = AuthSettings {
            jwt_secret: JWT_SECRET.to_string(),
            audience: None,
        };
        let state = AppState::new(
            &repositories,
            evaluations,
            queue,
            self.checkout,
            auth,
            self.payments,
        );

        TestApp {
            store,
            router: routes(state),
            jobs,
        }
    }
}

pub fn evaluation() -> EvaluationResult {
    EvaluationResult {
        score: Some(82),
        strengths: vec!["Readable".to_string()],
        improvements: vec!["Add tests".to_string()],
        short_feedback: "Good work".to_string(),
        full_report: "The complete analysis.".to_string(),
    }
}

pub fn token_for(user: UserId) -> String {
    token_with_email(user, None)
}

pub fn token_with_email(user: UserId, email: Option<&str>) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iat: None,
        email: email.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token encodes")
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub fn form_request(uri: &str, token: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request builds")
}
