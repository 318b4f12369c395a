//! Public project page integration tests
//!
//! - GET /projects/                 - Started projects
//! - GET /projects/category/{slug}/ - Started projects in one category
//! - GET /projects/project/{slug}/  - Detail through the content pipeline

mod common;

use axum::http::{header, StatusCode};
use crowdfund_campaigns::{
    Backer, Category, NewProject, PaymentProvider, Pledge, Project, Reservation,
};
use crowdfund_common::Currency;
use uuid::Uuid;

use common::{body_text, days_from_today, TestApp};

/// Store a paid pledge by a fresh backer
async fn completed_pledge(app: &TestApp, project: &Project, amount: i64) {
    let backer = app
        .repos
        .backers
        .get_or_create(&Backer::new(
            Uuid::new_v4(),
            "someone@crowdfund.test".to_string(),
            None,
        ))
        .await
        .unwrap();

    let pledge = Pledge::new(project.id, None, Currency::units(amount), PaymentProvider::Paypal)
        .unwrap();
    let Reservation::Created(mut pledge) = app.repos.pledges.reserve(&pledge).await.unwrap()
    else {
        panic!("pledge without reward is always reserved");
    };
    pledge.assign_backer(backer.id).unwrap();
    pledge.confirm().unwrap();
    app.repos.pledges.update(&pledge).await.unwrap();
}

async fn pending_pledge(app: &TestApp, project: &Project, amount: i64) {
    let pledge = Pledge::new(project.id, None, Currency::units(amount), PaymentProvider::Paypal)
        .unwrap();
    app.repos.pledges.reserve(&pledge).await.unwrap();
}

mod test_list {
    use super::*;

    #[tokio::test]
    async fn test_list_shows_started_projects_only() {
        let app = TestApp::new();
        app.project("solar-kiosk").await;
        app.project_between("coming-soon", days_from_today(3), days_from_today(30))
            .await;
        let mut browser = app.browser();

        let response = browser.get("/projects/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains(r#"<a class="project" href="/projects/project/solar-kiosk/">"#));
        assert!(!html.contains("coming-soon"));
    }

    #[tokio::test]
    async fn test_category_page_filters_projects() {
        let app = TestApp::new();
        let energy = app
            .repos
            .categories
            .create(&Category::new("Energy".to_string(), None).unwrap())
            .await
            .unwrap();

        let in_category = Project::new(NewProject {
            title: "Wind Farm".to_string(),
            slug: None,
            goal: Currency::units(500),
            start: days_from_today(-1),
            end: days_from_today(10),
            description: String::new(),
            category_id: Some(energy.id),
        })
        .unwrap();
        app.repos.projects.create(&in_category).await.unwrap();
        app.project("bake-sale").await;
        let mut browser = app.browser();

        let response = browser.get("/projects/category/energy/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"href="/projects/project/wind-farm/""#));
        assert!(!html.contains("bake-sale"));

        let everything = body_text(browser.get("/projects/").await).await;
        assert!(everything.contains(r#"href="/projects/category/energy/""#));
        assert!(everything.contains("bake-sale"));
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let app = TestApp::new();
        let response = app.browser().get("/projects/category/nope/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod test_detail {
    use super::*;

    #[tokio::test]
    async fn test_progress_counts_completed_pledges_only() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        completed_pledge(&app, &project, 200).await;
        completed_pledge(&app, &project, 50).await;
        pending_pledge(&app, &project, 500).await;
        let mut browser = app.browser();

        let response = browser.get("/projects/project/solar-kiosk/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

        let html = body_text(response).await;
        assert!(html.contains("250.00 CHF (25%)"));
        assert!(html.contains(r#"<dd class="backers">2</dd>"#));
        assert!(html.contains(r#"id="back_button""#));
        assert!(html.contains(r#"href="/projects/back/solar-kiosk/""#));
    }

    #[tokio::test]
    async fn test_expired_project_has_no_back_button() {
        let app = TestApp::new();
        app.project_between("old-news", days_from_today(-30), days_from_today(-1))
            .await;

        let response = app.browser().get("/projects/project/old-news/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=3600"
        );
        assert!(!body_text(response).await.contains("back_button"));
    }

    #[tokio::test]
    async fn test_detail_lists_rewards_with_availability() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        app.reward(&project, 20, Some(3)).await;
        app.reward(&project, 100, None).await;

        let html = body_text(app.browser().get("/projects/project/solar-kiosk/").await).await;
        assert!(html.contains("20.00 CHF or more"));
        assert!(html.contains("3 left"));
        assert!(html.contains("100.00 CHF or more"));
    }

    #[tokio::test]
    async fn test_unknown_or_unstarted_project_is_not_found() {
        let app = TestApp::new();
        app.project_between("coming-soon", days_from_today(1), days_from_today(30))
            .await;
        let mut browser = app.browser();

        let response = browser.get("/projects/project/coming-soon/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = browser.get("/projects/project/nope/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.browser().get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
