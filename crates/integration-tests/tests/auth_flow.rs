//! Sign-in, sign-up, sign-out, and role gating through the router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use sejuk_core::Role;
use sejuk_integration_tests::{PASSWORD, TestApp, body_text, location};

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn test_login_redirects_to_role_home() {
    let app = TestApp::new();
    app.add_account("boss@sejuk.my", Some(("boss", Role::Admin)))
        .await;
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;

    for (email, home) in [("boss@sejuk.my", "/admin"), ("ali@sejuk.my", "/technician")] {
        let mut client = app.client();
        let response = client
            .post_form("/login", &[("email", email), ("password", PASSWORD)])
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some(home));

        let response = client.get(home).await;
        assert_eq!(response.status(), StatusCode::OK, "{email} should reach {home}");
    }
}

#[tokio::test]
async fn test_wrong_password_shows_error() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;

    let mut client = app.client();
    let response = client
        .post_form("/login", &[("email", "ali@sejuk.my"), ("password", "wrong-pass")])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_malformed_email_shows_error() {
    let app = TestApp::new();

    let mut client = app.client();
    let response = client
        .post_form("/login", &[("email", "not-an-email"), ("password", PASSWORD)])
        .await;

    let body = body_text(response).await;
    assert!(body.contains("Invalid email address format."));
}

#[tokio::test]
async fn test_account_without_profile_is_not_signed_in() {
    let app = TestApp::new();
    app.add_account("ghost@sejuk.my", None).await;

    let mut client = app.client();
    let response = client
        .post_form("/login", &[("email", "ghost@sejuk.my"), ("password", PASSWORD)])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("User data incomplete. Please contact support."));

    let response = client.get("/technician").await;
    assert_eq!(location(&response), Some("/login"));
}

// =============================================================================
// Role gating
// =============================================================================

#[tokio::test]
async fn test_signed_out_visitor_is_sent_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    for path in ["/admin", "/technician"] {
        let response = client.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_wrong_role_is_sent_to_unauthorized() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    app.add_account("boss@sejuk.my", Some(("boss", Role::Admin)))
        .await;

    let mut technician = app.signed_in("ali@sejuk.my").await;
    let response = technician.get("/admin").await;
    assert_eq!(location(&response), Some("/unauthorized"));

    let mut admin = app.signed_in("boss@sejuk.my").await;
    let response = admin.get("/technician").await;
    assert_eq!(location(&response), Some("/unauthorized"));

    let response = admin.get("/unauthorized").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_text(response).await;
    assert!(body.contains("Unauthorized"));
    assert!(body.contains("action=\"/logout\""));
}

#[tokio::test]
async fn test_profile_removed_after_sign_in_loses_access() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    let mut client = app.signed_in("ali@sejuk.my").await;

    app.directory.set_failing(true);
    let response = client.get("/technician").await;

    assert_eq!(location(&response), Some("/unauthorized"));
}

// =============================================================================
// Sign-up and sign-out
// =============================================================================

#[tokio::test]
async fn test_signup_creates_profile_and_signs_in() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .post_form(
            "/signup",
            &[
                ("email", "Siti@Sejuk.my"),
                ("username", "Siti"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
                ("role", "technician"),
            ],
        )
        .await;

    assert_eq!(location(&response), Some("/technician"));
    let response = client.get("/technician").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Jobs for siti"));
}

#[tokio::test]
async fn test_signup_rejects_mismatched_passwords() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .post_form(
            "/signup",
            &[
                ("email", "siti@sejuk.my"),
                ("username", "siti"),
                ("password", PASSWORD),
                ("confirm_password", "different"),
                ("role", "technician"),
            ],
        )
        .await;

    let body = body_text(response).await;
    assert!(body.contains("Passwords do not match."));
    assert!(body.contains("value=\"siti@sejuk.my\""));
}

#[tokio::test]
async fn test_signup_rejects_taken_email() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    let mut client = app.client();

    let response = client
        .post_form(
            "/signup",
            &[
                ("email", "ali@sejuk.my"),
                ("username", "ali2"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
                ("role", "technician"),
            ],
        )
        .await;

    assert!(body_text(response).await.contains("Email address is already in use."));
}

#[tokio::test]
async fn test_signup_rejects_taken_username_without_keeping_account() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    let mut client = app.client();
    let signup = |username: &'static str| {
        [
            ("email", "ali.baru@sejuk.my"),
            ("username", username),
            ("password", PASSWORD),
            ("confirm_password", PASSWORD),
            ("role", "technician"),
        ]
    };

    let response = client.post_form("/signup", &signup("ALI")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Username is already taken."));
    assert!(body.contains("value=\"ali.baru@sejuk.my\""));

    // The email stays free for a retry with another username.
    let response = client.post_form("/signup", &signup("ali.baru")).await;
    assert_eq!(location(&response), Some("/technician"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    app.add_account("ali@sejuk.my", Some(("ali", Role::Technician)))
        .await;
    let mut client = app.signed_in("ali@sejuk.my").await;

    let response = client.post_form("/logout", &[]).await;
    assert_eq!(location(&response), Some("/login"));

    let response = client.get("/technician").await;
    assert_eq!(location(&response), Some("/login"));
}
