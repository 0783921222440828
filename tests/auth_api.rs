use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[macro_use]
mod common;

use common::{PASSWORD, TestContext};
use hris::auth::jwt::verify_token;
use hris::model::UserRole;

#[actix_web::test]
async fn login_issues_a_token_the_api_accepts() {
    let ctx = TestContext::new();
    let employee = ctx.employee(15.0, 10.0);
    let profile = ctx.profile(UserRole::Employee, Some(employee.id));
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": profile.email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    let token = body["access_token"].as_str().unwrap().to_string();
    let claims = verify_token(&token, &ctx.config.jwt_secret).unwrap();
    assert_eq!(claims.user_id, profile.id);
    assert_eq!(claims.employee_id, Some(employee.id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/employee/{}/balance", employee.id))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let ctx = TestContext::new();
    let profile = ctx.profile(UserRole::Admin, None);
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": profile.email, "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_web::test]
async fn protected_routes_need_a_valid_token() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/leave").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/leave")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_web::test]
async fn staff_cannot_read_another_balance() {
    let ctx = TestContext::new();
    let (_, token) = ctx.staff(15.0, 10.0);
    let (other, _) = ctx.staff(15.0, 10.0);
    let manager = ctx.manager();
    let app = app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/employee/{}/balance", other.id))
        .insert_header(("Authorization", token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/employee/{}/balance", other.id))
        .insert_header(("Authorization", manager))
        .to_request();
    let balance: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(balance["employee_id"], other.id);
}
