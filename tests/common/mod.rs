#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use uuid::Uuid;

use habitrewards_api::auth::jwt::Claims;
use habitrewards_api::config::{AnalyticsConfig, Config};
use habitrewards_api::db::MemorySource;
use habitrewards_api::models::{CompletionEvent, HabitRecord, RewardSnapshot};
use habitrewards_api::{build_router, AppState};

const TEST_SECRET: &str = "integration-test-jwt-secret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub source: MemorySource,
    pub user_id: Uuid,
    pub token: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub etag: Option<String>,
    pub body: serde_json::Value,
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:5173".into(),
        jwt_secret: TEST_SECRET.into(),
        jwt_audience: None,
        analytics: AnalyticsConfig::default(),
    }
}

pub fn sign_token(user_id: Uuid, secret: &str, expires_in: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: Some("someone@example.com".into()),
        exp: (now + expires_in).timestamp(),
        iat: Some(now.timestamp()),
        role: Some("authenticated".into()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("sign token")
}

impl TestApp {
    pub fn spawn() -> Self {
        let source = MemorySource::new();
        let state = AppState::new(Arc::new(source.clone()), Arc::new(test_config()));
        let user_id = Uuid::new_v4();
        let token = sign_token(user_id, TEST_SECRET, Duration::hours(1));

        Self {
            app: build_router(state.clone()),
            state,
            source,
            user_id,
            token,
        }
    }

    pub async fn add_habit(&self, created_at: DateTime<Utc>, points: i32) -> HabitRecord {
        self.add_habit_for_reward(Uuid::new_v4(), created_at, points).await
    }

    pub async fn add_habit_for_reward(
        &self,
        reward_id: Uuid,
        created_at: DateTime<Utc>,
        points: i32,
    ) -> HabitRecord {
        let habit = HabitRecord {
            id: Uuid::new_v4(),
            reward_id,
            user_id: self.user_id,
            name: "Morning run".into(),
            points_per_completion: points,
            created_at,
        };
        self.source.insert_habit(habit.clone()).await;
        habit
    }

    pub async fn complete(&self, habit: &HabitRecord, at: DateTime<Utc>) -> CompletionEvent {
        let event = CompletionEvent {
            id: Uuid::new_v4(),
            habit_id: habit.id,
            user_id: self.user_id,
            completed_at: at,
            points_earned: habit.points_per_completion,
        };
        self.source.record_completion(event.clone()).await;
        event
    }

    pub async fn add_reward(&self, current: i32, target: i32, claimed: bool) -> RewardSnapshot {
        let reward = RewardSnapshot {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            title: "Concert tickets".into(),
            current_points: current,
            target_points: target,
            is_claimed: claimed,
        };
        self.source.upsert_reward(reward.clone()).await;
        reward
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(&self.token), None).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(Method::POST, uri, Some(&self.token), Some(body)).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        self.send(req).await
    }

    pub async fn get_if_none_match(&self, uri: &str, etag: &str) -> TestResponse {
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .expect("request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(req).await.expect("router response");
        let status = response.status();
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };

        TestResponse { status, etag, body }
    }
}
