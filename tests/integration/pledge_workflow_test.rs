//! Backing workflow integration tests
//!
//! Walks the session-threaded sequence end to end:
//! - POST /projects/back/{slug}/          - Submit a pledge anonymously
//! - GET  /projects/backer/authenticate/  - Bind it to the user's backer
//! - GET  /projects/pledge/thankyou/      - Confirm and send the email
//! - GET  /projects/project/{slug}/backed/ - Show the confirmation once

mod common;

use axum::http::StatusCode;
use crowdfund_campaigns::{PaymentProvider, Pledge, PledgeStatus, Reservation};
use crowdfund_common::Currency;
use crowdfund_email::mock::MockEmailService;
use uuid::Uuid;

use common::assertions::assert_redirect;
use common::{body_text, days_from_today, TestApp, TestUser};

const AUTHENTICATE: &str = "/projects/backer/authenticate/";
const THANK_YOU: &str = "/projects/pledge/thankyou/";
const LOGIN_REDIRECT: &str = "/accounts/login/?next=/projects/backer/authenticate/";

/// Fill up a reward with anonymous pledges
async fn claim(app: &TestApp, project_id: Uuid, reward_id: Uuid, count: usize) {
    for _ in 0..count {
        let pledge = Pledge::new(
            project_id,
            Some(reward_id),
            Currency::units(100),
            PaymentProvider::Paypal,
        )
        .unwrap();
        let reservation = app.repos.pledges.reserve(&pledge).await.unwrap();
        assert!(matches!(reservation, Reservation::Created(_)));
    }
}

mod test_full_workflow {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_pledge_from_form_to_confirmation_page() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let reward = app.reward(&project, 50, Some(2)).await;
        let user = TestUser::member();
        let mut browser = app.browser();

        // Back form lists the reward
        let response = browser.get("/projects/back/solar-kiosk/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(&reward.id.to_string()));

        // Anonymous submission
        let reward_id = reward.id.to_string();
        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "60.02"), ("reward", &reward_id), ("provider", "paypal")],
            )
            .await;
        assert_redirect(&response, AUTHENTICATE);

        let pledges = app.repos.pledges.list_for_project(project.id).await.unwrap();
        assert_eq!(pledges.len(), 1);
        let pledge_id = pledges[0].id;
        assert_eq!(pledges[0].amount.to_string(), "60.00");
        assert_eq!(pledges[0].backer_id, None);
        assert_eq!(pledges[0].status, PledgeStatus::Pending);

        // Not logged in yet
        let response = browser.get(AUTHENTICATE).await;
        assert_redirect(&response, LOGIN_REDIRECT);

        let response = browser.login(&user, AUTHENTICATE).await;
        assert_redirect(&response, AUTHENTICATE);

        // Logged in: pledge bound to the backer, off to the provider
        let response = browser.get(AUTHENTICATE).await;
        assert_redirect(&response, "https://paypal.test/checkout");

        let backer = app
            .repos
            .backers
            .get_by_user(user.id)
            .await
            .unwrap()
            .expect("backer created on authentication");
        assert_eq!(backer.email, user.email);
        let pledge = app.repos.pledges.get_by_id(pledge_id).await.unwrap().unwrap();
        assert_eq!(pledge.backer_id, Some(backer.id));

        // Provider return
        let response = browser.get(THANK_YOU).await;
        assert_redirect(&response, "/projects/project/solar-kiosk/backed/");

        let pledge = app.repos.pledges.get_by_id(pledge_id).await.unwrap().unwrap();
        assert_eq!(pledge.status, PledgeStatus::Completed);

        let emails = app.email.get_pledge_confirmations(pledge_id);
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].message.to, user.email);
        assert_eq!(
            emails[0].message.subject,
            "Thank you for supporting Project solar-kiosk"
        );

        // Confirmation page renders once
        let response = browser.get("/projects/project/solar-kiosk/backed/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("60.00 CHF"));
        assert!(html.contains("Reward from 50"));

        let response = browser.get("/projects/project/solar-kiosk/backed/").await;
        assert_redirect(&response, "/projects/project/solar-kiosk/");

        // Both session keys are gone
        let response = browser.get(THANK_YOU).await;
        assert_redirect(&response, "/projects/");
        assert_eq!(app.email.email_count(), 1);
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates_the_backer() {
        let app = TestApp::new();
        app.project("wind-farm").await;
        let user = TestUser::member();
        let mut browser = app.browser().with_bearer(&user);

        let response = browser
            .post_form(
                "/projects/back/wind-farm/",
                &[("amount", "25"), ("provider", "postfinance")],
            )
            .await;
        assert_redirect(&response, AUTHENTICATE);

        let response = browser.get(AUTHENTICATE).await;
        assert_redirect(&response, "https://postfinance.test/checkout");
    }
}

mod test_submit_validation {
    use super::*;

    #[tokio::test]
    async fn test_amount_below_reward_minimum_rerenders_form() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let reward = app.reward(&project, 50, None).await;
        let mut browser = app.browser();

        let reward_id = reward.id.to_string();
        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "49.95"), ("reward", &reward_id), ("provider", "paypal")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response)
            .await
            .contains("Amount is too low for this reward."));
        assert!(app
            .repos
            .pledges
            .list_for_project(project.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_reward_is_rejected() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let reward = app.reward(&project, 10, Some(2)).await;
        claim(&app, project.id, reward.id, 2).await;
        let mut browser = app.browser();

        let reward_id = reward.id.to_string();
        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "20"), ("reward", &reward_id), ("provider", "paypal")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response)
            .await
            .contains("Sorry, this reward is not available anymore."));
        assert_eq!(
            app.repos.pledges.list_for_project(project.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_zero_quantity_reward_stays_selectable() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let reward = app.reward(&project, 10, Some(0)).await;
        claim(&app, project.id, reward.id, 5).await;
        let mut browser = app.browser();

        let reward_id = reward.id.to_string();
        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "10"), ("reward", &reward_id), ("provider", "paypal")],
            )
            .await;

        assert_redirect(&response, AUTHENTICATE);
    }

    #[tokio::test]
    async fn test_missing_fields_show_inline_errors() {
        let app = TestApp::new();
        app.project("solar-kiosk").await;
        let mut browser = app.browser();

        let response = browser.post_form("/projects/back/solar-kiosk/", &[]).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("This field is required."));
        assert!(html.contains("Please select a payment provider."));
    }

    #[tokio::test]
    async fn test_huge_amount_is_an_inline_error() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let mut browser = app.browser();

        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[
                    ("amount", "79228162514264337593543950335"),
                    ("provider", "paypal"),
                ],
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Enter a valid amount."));
        assert!(app
            .repos
            .pledges
            .list_for_project(project.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reward_of_another_project_is_invalid() {
        let app = TestApp::new();
        app.project("solar-kiosk").await;
        let other = app.project("wind-farm").await;
        let foreign = app.reward(&other, 5, None).await;
        let mut browser = app.browser();

        let reward_id = foreign.id.to_string();
        let response = browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "20"), ("reward", &reward_id), ("provider", "paypal")],
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Select a valid reward."));
    }
}

mod test_project_schedule {
    use super::*;

    #[tokio::test]
    async fn test_expired_project_redirects_without_creating_a_pledge() {
        let app = TestApp::new();
        let project = app
            .project_between("old-news", days_from_today(-30), days_from_today(0))
            .await;
        let mut browser = app.browser();

        let response = browser.get("/projects/back/old-news/").await;
        assert_redirect(&response, "/projects/project/old-news/");

        let response = browser
            .post_form(
                "/projects/back/old-news/",
                &[("amount", "20"), ("provider", "paypal")],
            )
            .await;
        assert_redirect(&response, "/projects/project/old-news/");

        assert!(app
            .repos
            .pledges
            .list_for_project(project.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unstarted_project_cannot_be_backed() {
        let app = TestApp::new();
        app.project_between("coming-soon", days_from_today(1), days_from_today(30))
            .await;
        let mut browser = app.browser();

        let response = browser.get("/projects/back/coming-soon/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = browser.get("/projects/back/no-such-project/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod test_session_steps {
    use super::*;

    #[tokio::test]
    async fn test_steps_without_a_pledge_go_back_to_the_list() {
        let app = TestApp::new();
        let mut browser = app.browser();

        assert_redirect(&browser.get(AUTHENTICATE).await, "/projects/");
        assert_redirect(&browser.get(THANK_YOU).await, "/projects/");
    }

    #[tokio::test]
    async fn test_thank_you_before_authentication_goes_to_authenticate() {
        let app = TestApp::new();
        app.project("solar-kiosk").await;
        let mut browser = app.browser();

        browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "20"), ("provider", "paypal")],
            )
            .await;

        let response = browser.get(THANK_YOU).await;
        assert_redirect(&response, AUTHENTICATE);
        assert_eq!(app.email.email_count(), 0);
    }

    #[tokio::test]
    async fn test_backed_page_without_completion_redirects() {
        let app = TestApp::new();
        app.project("solar-kiosk").await;
        let mut browser = app.browser();

        let response = browser.get("/projects/project/solar-kiosk/backed/").await;
        assert_redirect(&response, "/projects/project/solar-kiosk/");
    }

    #[tokio::test]
    async fn test_one_backer_per_user_across_pledges() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let user = TestUser::member();
        let mut browser = app.browser();
        browser.login(&user, "/projects/").await;

        for amount in ["20", "30"] {
            browser
                .post_form(
                    "/projects/back/solar-kiosk/",
                    &[("amount", amount), ("provider", "paypal")],
                )
                .await;
            let response = browser.get(AUTHENTICATE).await;
            assert_redirect(&response, "https://paypal.test/checkout");
            browser.get(THANK_YOU).await;
        }

        let backer = app.repos.backers.get_by_user(user.id).await.unwrap().unwrap();
        let pledges = app.repos.pledges.list_for_project(project.id).await.unwrap();
        assert_eq!(pledges.len(), 2);
        assert!(pledges.iter().all(|p| p.backer_id == Some(backer.id)));
        assert!(pledges.iter().all(|p| p.status == PledgeStatus::Completed));
        assert_eq!(app.email.get_emails_for_recipient(&user.email).len(), 2);
    }

    #[tokio::test]
    async fn test_pending_pledge_keeps_its_first_backer() {
        let app = TestApp::new();
        let project = app.project("solar-kiosk").await;
        let owner = TestUser::member();
        let mut browser = app.browser().with_bearer(&owner);

        browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "20"), ("provider", "paypal")],
            )
            .await;
        let response = browser.get(AUTHENTICATE).await;
        assert_redirect(&response, "https://paypal.test/checkout");

        let mut browser = browser.with_bearer(&TestUser::member());
        let response = browser.get(AUTHENTICATE).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let owner_backer = app.repos.backers.get_by_user(owner.id).await.unwrap().unwrap();
        let pledges = app.repos.pledges.list_for_project(project.id).await.unwrap();
        assert_eq!(pledges[0].backer_id, Some(owner_backer.id));

        // The original backer can still carry on.
        let mut browser = browser.with_bearer(&owner);
        let response = browser.get(AUTHENTICATE).await;
        assert_redirect(&response, "https://paypal.test/checkout");
    }

    #[test_log::test(tokio::test)]
    async fn test_email_failure_is_a_server_error() {
        let app = TestApp::with_email(MockEmailService::new_failing());
        app.project("solar-kiosk").await;
        let user = TestUser::member();
        let mut browser = app.browser().with_bearer(&user);

        browser
            .post_form(
                "/projects/back/solar-kiosk/",
                &[("amount", "20"), ("provider", "paypal")],
            )
            .await;
        browser.get(AUTHENTICATE).await;

        let response = browser.get(THANK_YOU).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
