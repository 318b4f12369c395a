//! Common test utilities and fixtures for integration tests
//!
//! This module provides shared infrastructure for the HTTP tests:
//! - The full router over in-memory (or PostgreSQL) repositories and a mock mailer
//! - JWT minting for members and staff
//! - A cookie-carrying client so the session survives across requests
//! - Project and reward fixtures

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, NaiveDate};
use crowdfund_auth::{AuthBackend, AuthConfig, IdentityClaims};
use crowdfund_campaigns::{
    today, CampaignRepositories, CampaignsState, ContentPipeline, NewProject, Project, Reward,
};
use crowdfund_common::config::{PaymentConfig, SiteConfig};
use crowdfund_common::Currency;
use crowdfund_email::mock::MockEmailService;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionStore};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_key_for_testing_only";

/// Full application over in-memory state
pub struct TestApp {
    pub router: Router,
    pub repos: CampaignRepositories,
    pub email: Arc<MockEmailService>,
    pub site: SiteConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_email(MockEmailService::new())
    }

    pub fn with_email(email: MockEmailService) -> Self {
        Self::build(
            CampaignRepositories::in_memory(),
            email,
            test_site(),
            MemoryStore::default(),
        )
    }

    pub fn with_site(site: SiteConfig) -> Self {
        Self::build(
            CampaignRepositories::in_memory(),
            MockEmailService::new(),
            site,
            MemoryStore::default(),
        )
    }

    /// Full application over the given repositories and session store
    pub fn build<S>(
        repos: CampaignRepositories,
        email: MockEmailService,
        site: SiteConfig,
        sessions: S,
    ) -> Self
    where
        S: SessionStore + Clone,
    {
        let email = Arc::new(email);
        let state = CampaignsState {
            repos: repos.clone(),
            auth: AuthBackend::new(AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                issuer: None,
                audience: None,
            }),
            email: email.clone(),
            site: site.clone(),
            content: ContentPipeline::standard(),
        };

        Self {
            router: crowdfund_app::create_app_with(state, sessions),
            repos,
            email,
            site,
        }
    }

    /// A client with an empty cookie jar
    pub fn browser(&self) -> Browser {
        Browser {
            router: self.router.clone(),
            cookie: None,
            bearer: None,
        }
    }

    /// Running project with the given slug: started 10 days ago, ends in 20 days
    pub async fn project(&self, slug: &str) -> Project {
        self.project_between(slug, days_from_today(-10), days_from_today(20))
            .await
    }

    pub async fn project_between(&self, slug: &str, start: NaiveDate, end: NaiveDate) -> Project {
        let project = Project::new(NewProject {
            title: format!("Project {}", slug),
            slug: Some(slug.to_string()),
            goal: Currency::units(1000),
            start,
            end,
            description: "A project worth backing".to_string(),
            category_id: None,
        })
        .unwrap();
        self.repos.projects.create(&project).await.unwrap()
    }

    pub async fn reward(&self, project: &Project, minimum: i64, quantity: Option<i32>) -> Reward {
        let existing = self
            .repos
            .rewards
            .list_for_project(project.id)
            .await
            .unwrap();
        let reward = Reward::new(
            project.id,
            Currency::units(minimum),
            format!("Reward from {}", minimum),
            quantity,
            existing.len() as i32,
        )
        .unwrap();
        self.repos.rewards.create(&reward).await.unwrap()
    }
}

/// Site settings with absolute provider checkout URLs
pub fn test_site() -> SiteConfig {
    SiteConfig {
        payments: PaymentConfig {
            paypal_url: "https://paypal.test/checkout".to_string(),
            postfinance_url: "https://postfinance.test/checkout".to_string(),
        },
        ..SiteConfig::default()
    }
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

/// A person as the identity provider describes them
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Option<&'static str>,
}

impl TestUser {
    pub fn member() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            email: format!("backer_{}@crowdfund.test", id.simple()),
            name: format!("Backer {}", &id.to_string()[0..8]),
            role: Some("authenticated"),
        }
    }

    pub fn staff() -> Self {
        Self {
            role: Some("staff"),
            ..Self::member()
        }
    }

    pub fn token(&self) -> String {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = IdentityClaims {
            sub: self.id.to_string(),
            email: Some(self.email.clone()),
            name: Some(self.name.clone()),
            iat: now,
            exp: now + 3600,
            aud: None,
            iss: None,
            role: self.role.map(str::to_string),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap()
    }
}

/// Sends requests through the router, keeping the session cookie
pub struct Browser {
    router: Router,
    cookie: Option<String>,
    bearer: Option<String>,
}

impl Browser {
    /// The same cookie jar pointed at another instance of the application
    pub fn switch_to(self, app: &TestApp) -> Self {
        Self {
            router: app.router.clone(),
            ..self
        }
    }

    /// Authenticate every following request with a bearer token
    pub fn with_bearer(mut self, user: &TestUser) -> Self {
        self.bearer = Some(user.token());
        self
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        if let Some(token) = &self.bearer {
            request.headers_mut().insert(
                header::AUTHORIZATION,
                format!("Bearer {}", token).parse().unwrap(),
            );
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            self.cookie = Some(pair);
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, form: &[(&str, &str)]) -> Response {
        let body = form
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode_form_value(value)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&mut self, method: Method, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&mut self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Log in through the session endpoint
    pub async fn login(&mut self, user: &TestUser, next: &str) -> Response {
        let token = user.token();
        self.post_form("/accounts/session/", &[("access_token", &token), ("next", next)])
            .await
    }
}

fn encode_form_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

pub mod assertions {
    use super::*;

    pub fn assert_redirect(response: &Response, location: &str) {
        assert_eq!(response.status(), StatusCode::FOUND, "expected a redirect");
        assert_eq!(
            response.headers()[header::LOCATION].to_str().unwrap(),
            location
        );
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
