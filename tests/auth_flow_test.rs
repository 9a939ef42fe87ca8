//! End-to-end provider flows through the HTTP routes
//!
//! A single wiremock server plays both the identity providers and the account
//! API; the service is driven with actix's test harness.

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fedlogin::api::HttpAccountApi;
use fedlogin::handlers::configure_services;
use fedlogin::session::{CorrelationRecord, CorrelationStore, Jar, JAR_COOKIE, SESSION_COOKIE};
use fedlogin::testing::TestFixtures;
use fedlogin::{LoginOrchestrator, LoginSettings, Network, ProviderRegistry, SessionManager};

fn orchestrator(settings: &LoginSettings) -> LoginOrchestrator {
    let client = reqwest::Client::new();
    LoginOrchestrator::new(
        ProviderRegistry::from_settings(settings, &client),
        Arc::new(HttpAccountApi::new(client, &settings.api)),
        SessionManager::from_settings(settings),
        settings,
    )
}

fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn cookies(resp: &ServiceResponse) -> Vec<Cookie<'static>> {
    resp.response().cookies().map(Cookie::into_owned).collect()
}

fn query_of(url: &str) -> HashMap<String, String> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

fn jar_from(cookies: &[Cookie<'static>]) -> Jar {
    TestFixtures::session_manager()
        .context_from_request(&TestFixtures::request_with_cookies(cookies))
        .jar
}

fn jar_cookie(jar: &Jar) -> Cookie<'static> {
    TestFixtures::session_manager()
        .cookie_factory()
        .create_jar_cookie(jar.entries())
        .unwrap()
}

async fn mount_registered_user(server: &MockServer, network: &str, id: &str, ticket: Value) {
    Mock::given(method("POST"))
        .and(path("/oz/login"))
        .and(body_json(json!({ "type": network, "id": id })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "rsvp": "rsvp-1", "ext": {} })),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oz/rsvp"))
        .and(body_json(json!({ "rsvp": "rsvp-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ticket))
        .expect(1)
        .mount(server)
        .await;
}

#[actix_web::test]
async fn facebook_start_redirects_with_fresh_state() {
    let server = MockServer::start().await;
    let mut settings = TestFixtures::settings_for_server(&server.uri());
    settings.providers.facebook.authorization_endpoint = None;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/facebook")
            .insert_header((header::USER_AGENT, "Mozilla/5.0 (Windows NT 10.0)"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("https://graph.facebook.com/oauth/authorize?"));

    let query = query_of(&target);
    assert_eq!(query["client_id"], "facebook-id");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["scope"], "email");
    assert_eq!(query["redirect_uri"], "http://localhost:8000/auth/facebook");
    assert_eq!(query["display"], "page");

    let jar = jar_from(&cookies(&resp));
    assert_eq!(
        jar.get(Network::Facebook),
        Some(CorrelationRecord::OAuth2 {
            state: query["state"].clone()
        })
    );

    let body = test::read_body(resp).await;
    assert_eq!(body, "You are being redirected to Facebook to sign-in...");
}

#[actix_web::test]
async fn facebook_callback_signs_in_and_cannot_be_replayed() {
    let server = MockServer::start().await;
    let settings = TestFixtures::settings_for_server(&server.uri());

    // Form-encoded token body exercises the JSON fallback
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .and(body_string_contains("code=the-code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("access_token=fb-token&expires=5183999"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("oauth_token", "fb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1001",
            "name": "Ann",
            "email": "ann@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_registered_user(
        &server,
        "facebook",
        "1001",
        TestFixtures::ticket_payload(Some("tos")),
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;

    // Start leg, asking to come back to /dashboard
    let start = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/facebook?x_next=%2Fdashboard")
            .to_request(),
    )
    .await;
    let state = query_of(&location(&start))["state"].clone();
    let start_cookies = cookies(&start);

    // Callback leg
    let mut request = test::TestRequest::get().uri(&format!(
        "/auth/facebook?code=the-code&state={state}"
    ));
    for cookie in &start_cookies {
        request = request.cookie(cookie.clone());
    }
    let callback = test::call_service(&app, request.to_request()).await;

    assert_eq!(callback.status(), StatusCode::FOUND);
    assert_eq!(location(&callback), "/tos?next=%2Fdashboard");

    let callback_cookies = cookies(&callback);
    let session = TestFixtures::session_manager()
        .context_from_request(&TestFixtures::request_with_cookies(&callback_cookies));
    assert_eq!(session.user_id(), Some("u-100"));
    assert!(session.jar.is_empty());
    assert!(callback_cookies
        .iter()
        .any(|cookie| cookie.name() == SESSION_COOKIE));

    // Replaying the same callback with the jar the callback returned
    let mut replay = test::TestRequest::get().uri(&format!(
        "/auth/facebook?code=the-code&state={state}"
    ));
    for cookie in callback_cookies.iter().filter(|c| c.name() == JAR_COOKIE) {
        replay = replay.cookie(cookie.clone());
    }
    let replayed = test::call_service(&app, replay.to_request()).await;
    assert_eq!(replayed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(replayed).await;
    assert_eq!(body["message"], "Missing Facebook state cookie");
}

#[actix_web::test]
async fn facebook_unregistered_user_goes_to_signup() {
    let server = MockServer::start().await;
    let settings = TestFixtures::settings_for_server(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1001",
            "name": "Ann",
            "username": "ann",
            "email": "x@proxymail.facebook.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oz/login"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oz/rsvp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut jar = Jar::new();
    jar.put(
        Network::Facebook,
        CorrelationRecord::OAuth2 {
            state: "s1".to_string(),
        },
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/facebook?code=c&state=s1")
            .cookie(jar_cookie(&jar))
            .to_request(),
    )
    .await;

    assert_eq!(location(&resp), "/signup/register");
    let signup = jar_from(&cookies(&resp)).signup().unwrap();
    assert_eq!(signup.network, Network::Facebook);
    assert_eq!(signup.id, "1001");
    assert_eq!(signup.name, "Ann");
    assert_eq!(signup.username, "ann");
    assert_eq!(signup.email, "");
}

#[actix_web::test]
async fn twitter_start_and_mismatched_callback() {
    let server = MockServer::start().await;
    let settings = TestFixtures::settings_for_server(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/request_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;

    let start = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/twitter").to_request(),
    )
    .await;
    assert_eq!(
        location(&start),
        format!("{}/oauth/authenticate?oauth_token=req-token", server.uri())
    );
    let start_cookies = cookies(&start);
    assert_eq!(
        jar_from(&start_cookies).get(Network::Twitter),
        Some(CorrelationRecord::OAuth1 {
            token: "req-token".to_string(),
            secret: "req-secret".to_string()
        })
    );

    let mut callback = test::TestRequest::get()
        .uri("/auth/twitter?oauth_token=forged&oauth_verifier=v1");
    for cookie in &start_cookies {
        callback = callback.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, callback.to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Twitter authorized request token mismatch");
}

#[actix_web::test]
async fn twitter_callback_while_signed_in_links_account() {
    let server = MockServer::start().await;
    let settings = TestFixtures::settings_for_server(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=acc&oauth_token_secret=acc-secret&user_id=12&screen_name=jack",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Jack" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/u-100/link/twitter"))
        .and(body_json(json!({ "id": "12" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut jar = Jar::new();
    jar.put(
        Network::Twitter,
        CorrelationRecord::OAuth1 {
            token: "req-token".to_string(),
            secret: "req-secret".to_string(),
        },
    );
    let session_cookie = TestFixtures::session_manager()
        .cookie_factory()
        .create_session_cookie(&TestFixtures::session_ticket())
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/twitter?oauth_token=req-token&oauth_verifier=v1")
            .cookie(jar_cookie(&jar))
            .cookie(session_cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/account/linked");
    assert!(!cookies(&resp)
        .iter()
        .any(|cookie| cookie.name() == SESSION_COOKIE));
}

#[actix_web::test]
async fn unlink_calls_api_for_signed_in_user() {
    let server = MockServer::start().await;
    let settings = TestFixtures::settings_for_server(&server.uri());

    Mock::given(method("DELETE"))
        .and(path("/user/u-100/link/yahoo"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session_cookie = TestFixtures::session_manager()
        .cookie_factory()
        .create_session_cookie(&TestFixtures::session_ticket())
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(orchestrator(&settings)))
            .configure(configure_services),
    )
    .await;
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/unlink")
            .cookie(session_cookie)
            .set_form([("network", "yahoo")])
            .to_request(),
    )
    .await;

    assert_eq!(location(&resp), "/account/linked");
}
