// app/tests/http_tests.rs

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bookstore::auth::hash_password;
use bookstore::{MemoryStore, Money, NewBook, NewUser, Store};
use bookstore_app::config::AppConfig;
use bookstore_app::state::AppState;
use bookstore_app::web::configure_app_routes;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const PASSWORD: &str = "shelf-password";
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password(PASSWORD).expect("hashing the fixture password"));

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt().with_test_writer().try_init().ok();
});

struct Harness {
  store: Arc<MemoryStore>,
  state: AppState,
}

fn harness() -> Harness {
  Lazy::force(&TRACING_INIT);
  let store = Arc::new(MemoryStore::new());
  let state = AppState::new(store.clone(), AppConfig::default());
  Harness { store, state }
}

impl Harness {
  async fn user(&self, username: &str, is_staff: bool) {
    self
      .store
      .insert_user(NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: PASSWORD_HASH.clone(),
        is_staff,
      })
      .await
      .unwrap();
  }

  async fn book(&self, title: &str, cents: i64) -> Uuid {
    self
      .store
      .insert_book(NewBook {
        title: title.to_string(),
        author: "Author".to_string(),
        genre: "Fiction".to_string(),
        price: Money::from_cents(cents),
        cover_image: None,
      })
      .await
      .unwrap()
      .id
  }
}

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn session_cookie(resp: &ServiceResponse) -> Cookie<'static> {
  resp
    .response()
    .cookies()
    .find(|c| c.name() == "bookstore_session")
    .map(|c| c.into_owned())
    .expect("response sets the session cookie")
}

fn location(resp: &ServiceResponse) -> &str {
  resp
    .headers()
    .get(header::LOCATION)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
}

fn notice_messages(body: &Value) -> Vec<String> {
  body["notices"]
    .as_array()
    .map(|notices| {
      notices
        .iter()
        .filter_map(|n| n["message"].as_str().map(str::to_string))
        .collect()
    })
    .unwrap_or_default()
}

#[actix_web::test]
async fn health_check_answers_ok() {
  let h = harness();
  let app = init_app!(h.state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn sync_cart_rejects_other_methods() {
  let h = harness();
  let app = init_app!(h.state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/sync_cart/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Invalid request method." }));
}

#[actix_web::test]
async fn malformed_sync_payload_is_a_stable_400_and_writes_nothing() {
  let h = harness();
  let app = init_app!(h.state);
  let req = test::TestRequest::post()
    .uri("/sync_cart/")
    .insert_header((header::CONTENT_TYPE, "application/json"))
    .set_payload("{\"cart\": [{\"book_id\": ")
    .to_request();

  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Invalid cart payload." }));
  assert_eq!(h.store.cart_count(), 0);
}

#[actix_web::test]
async fn sync_with_unknown_book_is_rejected_without_writes() {
  let h = harness();
  let known = h.book("Known", 500).await;
  let app = init_app!(h.state);
  let req = test::TestRequest::post()
    .uri("/sync_cart/")
    .set_json(json!({ "cart": [
      { "book_id": known, "quantity": 1 },
      { "book_id": Uuid::new_v4(), "quantity": 2 },
    ]}))
    .to_request();

  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Cart contains an unknown book." }));
  assert_eq!(h.store.cart_count(), 0);
}

#[actix_web::test]
async fn anonymous_sync_then_count_uses_the_session_cookie() {
  let h = harness();
  let book = h.book("Known", 500).await;
  let app = init_app!(h.state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/get_cart_count/").to_request()).await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "count": 0 }));

  let req = test::TestRequest::post()
    .uri("/sync_cart/")
    .set_json(json!({ "cart": [{ "book_id": book, "quantity": 2 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let cookie = session_cookie(&resp);
  assert!(cookie.http_only().unwrap_or(false));
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "success": true }));

  let req = test::TestRequest::get().uri("/get_cart_count/").cookie(cookie).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body, json!({ "count": 2 }));
}

#[actix_web::test]
async fn login_required_pages_redirect_anonymous_callers() {
  let h = harness();
  let book = h.book("Known", 500).await;
  let app = init_app!(h.state);

  for uri in [
    "/book_list/".to_string(),
    "/cart/".to_string(),
    "/get_cart_items/".to_string(),
    "/checkout/".to_string(),
    "/order/".to_string(),
    format!("/add_to_cart/{}/", book),
  ] {
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
    assert_eq!(location(&resp), "/", "{}", uri);
  }
  assert_eq!(h.store.cart_count(), 0);
}

#[actix_web::test]
async fn bad_login_redisplays_the_form_with_a_notice() {
  let h = harness();
  h.user("reader", false).await;
  let app = init_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/")
    .set_form([("username", "reader"), ("password", "wrong")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["page"], "login");
  assert_eq!(notice_messages(&body), vec!["Invalid username or password."]);
}

macro_rules! login {
  ($app:expr, $username:expr) => {{
    let req = test::TestRequest::post()
      .uri("/")
      .set_form([("username", $username), ("password", PASSWORD)])
      .to_request();
    let resp = test::call_service(&$app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/book_list/");
    session_cookie(&resp)
  }};
}

#[actix_web::test]
async fn non_staff_add_book_redirects_without_creating_a_book() {
  let h = harness();
  h.user("reader", false).await;
  let app = init_app!(h.state);
  let cookie = login!(app, "reader");

  let req = test::TestRequest::post()
    .uri("/add_book/")
    .cookie(cookie)
    .set_form([("title", "Sneaky"), ("author", "Nobody"), ("genre", "Fiction"), ("price", "1.00")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/book_list/");
  assert_eq!(h.store.count_books().await.unwrap(), 0);
}

#[actix_web::test]
async fn staff_can_add_and_delete_books() {
  let h = harness();
  h.user("clerk", true).await;
  let app = init_app!(h.state);
  let cookie = login!(app, "clerk");

  let req = test::TestRequest::post()
    .uri("/add_book/")
    .cookie(cookie.clone())
    .set_form([("title", "Emma"), ("author", "Jane Austen"), ("genre", "Classics"), ("price", "6.40")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);

  let req = test::TestRequest::get()
    .uri("/book_list/?genre=classic")
    .cookie(cookie.clone())
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["is_staff"], true);
  assert_eq!(body["books"][0]["title"], "Emma");
  assert_eq!(body["books"][0]["price"], "6.40");
  let book_id = body["books"][0]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri(&format!("/delete-book/{}/", book_id))
    .cookie(cookie.clone())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(h.store.count_books().await.unwrap(), 0);

  let req = test::TestRequest::get().uri("/book_list/").cookie(cookie).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(notice_messages(&body), vec!["\"Emma\" deleted successfully."]);
}

#[actix_web::test]
async fn cart_and_checkout_flow() {
  let h = harness();
  h.user("reader", false).await;
  let book = h.book("Ivanhoe", 850).await;
  let app = init_app!(h.state);
  let cookie = login!(app, "reader");

  for _ in 0..5 {
    let req = test::TestRequest::get()
      .uri(&format!("/add_to_cart/{}/", book))
      .cookie(cookie.clone())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/book_list/");
  }

  let req = test::TestRequest::post()
    .uri(&format!("/update-quantity/{}/", book))
    .cookie(cookie.clone())
    .set_form([("action", "decrease")])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/cart/");
  let req = test::TestRequest::post()
    .uri(&format!("/update-quantity/{}/", book))
    .cookie(cookie.clone())
    .set_form([("action", "increase")])
    .to_request();
  test::call_service(&app, req).await;

  let req = test::TestRequest::get().uri("/get_cart_items/").cookie(cookie.clone()).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(
    body,
    json!({ "cart": [{ "book_id": book, "quantity": 5, "price": "42.50" }] })
  );

  let req = test::TestRequest::post()
    .uri("/checkout/")
    .cookie(cookie.clone())
    .set_form([
      ("full_name", "Ada Reader"),
      ("email", "ada@example.com"),
      ("address", "1 Library Lane"),
      ("payment_method", "COD"),
    ])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/order_success/");

  let req = test::TestRequest::get().uri("/order_success/").cookie(cookie).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["order"]["total_price"], "42.50");
  assert_eq!(body["order"]["lines"][0]["title"], "Ivanhoe");
  assert!(notice_messages(&body).contains(&"Order placed successfully!".to_string()));

  let user = h.store.find_user_by_username("reader").await.unwrap().unwrap();
  assert!(h.store.find_cart_by_owner(user.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn anonymous_cart_is_replayed_after_logout_and_login() {
  let h = harness();
  h.user("reader", false).await;
  let book = h.book("Beowulf", 500).await;
  let app = init_app!(h.state);

  let req = test::TestRequest::post()
    .uri("/sync_cart/")
    .set_json(json!({ "cart": [{ "book_id": book, "quantity": 2 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  let cookie = session_cookie(&resp);

  let req = test::TestRequest::get().uri("/logout/").cookie(cookie.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/");

  let req = test::TestRequest::post()
    .uri("/")
    .cookie(cookie.clone())
    .set_form([("username", "reader"), ("password", PASSWORD)])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp), "/book_list/");
  let signed_in = session_cookie(&resp);
  assert_ne!(signed_in.value(), cookie.value());

  // The pre-login token is retired.
  let req = test::TestRequest::get().uri("/get_cart_items/").cookie(cookie).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);

  let req = test::TestRequest::get().uri("/get_cart_items/").cookie(signed_in).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(
    body,
    json!({ "cart": [{ "book_id": book, "quantity": 2, "price": "10.00" }] })
  );
}

#[actix_web::test]
async fn oversized_sync_quantity_is_a_400_without_writes() {
  let h = harness();
  let book = h.book("Known", 500).await;
  let app = init_app!(h.state);
  let req = test::TestRequest::post()
    .uri("/sync_cart/")
    .set_json(json!({ "cart": [
      { "book_id": book, "quantity": u32::MAX },
      { "book_id": book, "quantity": 1 },
    ]}))
    .to_request();

  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Quantity is too large." }));
  assert_eq!(h.store.cart_count(), 0);
  assert_eq!(h.store.session_count(), 0);
}

#[actix_web::test]
async fn stateless_visits_do_not_store_sessions() {
  let h = harness();
  let app = init_app!(h.state);

  for _ in 0..10 {
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.response().cookies().next().is_none());
  }
  let resp = test::call_service(&app, test::TestRequest::get().uri("/logout/").to_request()).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(h.store.session_count(), 0);
}

#[actix_web::test]
async fn emptied_session_is_deleted_and_its_cookie_removed() {
  let h = harness();
  h.user("reader", false).await;
  let app = init_app!(h.state);
  let cookie = login!(app, "reader");
  assert_eq!(h.store.session_count(), 1);

  let req = test::TestRequest::get().uri("/logout/").cookie(cookie.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  let cookie = session_cookie(&resp);
  assert_eq!(h.store.session_count(), 1);

  // Rendering the login page delivers the logout notice; nothing is left to keep.
  let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
  let resp = test::call_service(&app, req).await;
  let removal = session_cookie(&resp);
  assert!(removal.max_age().is_some_and(|age| age.is_zero()));
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(notice_messages(&body), vec!["Successfully logged out."]);
  assert_eq!(h.store.session_count(), 0);
}

#[actix_web::test]
async fn order_confirmation_failures_come_back_as_notices() {
  let h = harness();
  h.user("reader", false).await;
  let book = h.book("Ivanhoe", 850).await;
  let app = init_app!(h.state);
  let cookie = login!(app, "reader");

  let shipping = [
    ("full_name", "Ada Reader"),
    ("email", "ada@example.com"),
    ("address", "1 Library Lane"),
    ("payment_method", "COD"),
  ];

  // The user's cart exists but is empty.
  let req = test::TestRequest::post()
    .uri("/order/")
    .cookie(cookie.clone())
    .set_form(shipping)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/cart/");

  let req = test::TestRequest::get()
    .uri(&format!("/add_to_cart/{}/", book))
    .cookie(cookie.clone())
    .to_request();
  test::call_service(&app, req).await;

  let req = test::TestRequest::post()
    .uri("/order/")
    .cookie(cookie.clone())
    .set_form([
      ("full_name", "Ada Reader"),
      ("email", "not-an-email"),
      ("address", "1 Library Lane"),
      ("payment_method", "COD"),
    ])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["page"], "order_confirmation");
  assert_eq!(body["cart"]["items"][0]["title"], "Ivanhoe");
  let notices = notice_messages(&body);
  assert!(notices.contains(&"Your cart is empty.".to_string()));
  assert_eq!(body["notices"].as_array().unwrap().last().unwrap()["level"], "error");

  let req = test::TestRequest::post()
    .uri("/order/")
    .cookie(cookie)
    .set_form(shipping)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["total_price"], "8.50");
}
