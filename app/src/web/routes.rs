// app/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{auth_handlers, cart_handlers, catalog_handlers, order_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Routes that need a signed-in user check it in the handler and answer a 303 to `/` otherwise.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    // Accounts
    .service(
      web::resource("/")
        .route(web::get().to(auth_handlers::login_page_handler))
        .route(web::post().to(auth_handlers::login_handler)),
    )
    .service(
      web::resource("/signup/")
        .route(web::get().to(auth_handlers::signup_page_handler))
        .route(web::post().to(auth_handlers::signup_handler)),
    )
    .route("/logout/", web::route().to(auth_handlers::logout_handler))
    // Catalog
    .route("/book_list/", web::get().to(catalog_handlers::book_list_handler))
    .service(
      web::resource("/add_book/")
        .route(web::get().to(catalog_handlers::add_book_page_handler))
        .route(web::post().to(catalog_handlers::add_book_handler)),
    )
    .route(
      "/delete-book/{book_id}/",
      web::route().to(catalog_handlers::delete_book_handler),
    )
    // Cart
    .route("/cart/", web::get().to(cart_handlers::cart_page_handler))
    .route("/get_cart_count/", web::get().to(cart_handlers::cart_count_handler))
    .route("/get_cart_items/", web::get().to(cart_handlers::cart_items_handler))
    .route(
      "/add_to_cart/{book_id}/",
      web::route().to(cart_handlers::add_to_cart_handler),
    )
    .route(
      "/remove_from_cart/{book_id}/",
      web::route().to(cart_handlers::remove_from_cart_handler),
    )
    .service(
      web::resource("/update-quantity/{book_id}/")
        .route(web::post().to(cart_handlers::update_quantity_handler))
        .default_service(web::to(cart_handlers::update_quantity_fallback_handler)),
    )
    .service(
      web::resource("/sync_cart/")
        .route(web::post().to(cart_handlers::sync_cart_handler))
        .default_service(web::to(cart_handlers::sync_cart_method_not_allowed_handler)),
    )
    // Orders
    .service(
      web::resource("/checkout/")
        .route(web::get().to(order_handlers::checkout_page_handler))
        .route(web::post().to(order_handlers::checkout_handler)),
    )
    .service(
      web::resource("/order/")
        .route(web::get().to(order_handlers::order_confirmation_page_handler))
        .route(web::post().to(order_handlers::order_confirmation_handler)),
    )
    .route("/order_success/", web::get().to(order_handlers::order_success_handler));
}
