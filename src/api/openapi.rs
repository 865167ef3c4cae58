use super::handlers::{admin, auth, chatbot, contact, health, posts, users};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::otp::send_email_otp))
        .routes(routes!(auth::otp::send_phone_otp))
        .routes(routes!(auth::otp::verify_email_otp))
        .routes(routes!(auth::otp::verify_phone_otp))
        .routes(routes!(auth::otp::resend_email_otp))
        .routes(routes!(auth::otp::resend_phone_otp))
        .routes(routes!(auth::signup::signup))
        .routes(routes!(auth::signup::auto_signup))
        .routes(routes!(auth::login::user_login))
        .routes(routes!(auth::login::admin_login))
        .routes(routes!(auth::login::logout))
        .routes(routes!(auth::oauth::oauth_exchange))
        .routes(routes!(auth::oauth::oauth_redirect))
        .routes(routes!(auth::oauth::oauth_callback))
        .routes(routes!(posts::create_post))
        .routes(routes!(posts::feed))
        .routes(routes!(posts::toggle_like))
        .routes(routes!(posts::list_comments, posts::add_comment))
        .routes(routes!(users::get_user, users::update_user, users::delete_user))
        .routes(routes!(users::user_posts))
        .routes(routes!(users::user_analytics))
        .routes(routes!(admin::dashboard_overview))
        .routes(routes!(admin::list_users))
        .routes(routes!(admin::delete_user))
        .routes(routes!(admin::list_posts, admin::create_post))
        .routes(routes!(admin::delete_post))
        .routes(routes!(admin::analytics))
        .routes(routes!(admin::contact_queries))
        .routes(routes!(admin::activity_logs))
        .routes(routes!(contact::submit))
        .routes(routes!(chatbot::chatbot))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).tags(Some(api_tags())).build()
}

fn api_tags() -> Vec<Tag> {
    let mut yatra_tag = Tag::new("yatra");
    yatra_tag.description = Some("Travel blogging platform API".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("OTP verification, signup, and logins".to_string());

    let mut posts_tag = Tag::new("posts");
    posts_tag.description = Some("Posts, likes, and comments".to_string());

    let mut users_tag = Tag::new("users");
    users_tag.description = Some("Profiles and per-user analytics".to_string());

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Dashboard, moderation, and platform analytics".to_string());

    vec![yatra_tag, auth_tag, posts_tag, users_tag, admin_tag]
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}
