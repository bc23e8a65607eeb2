use bytes::Bytes;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use expire_route::middleware::{Declaration, Expires};
use expire_route::{Bound, Entity, Error, FixedClock, Method, Request, Response, Route, Router};
use http::StatusCode;
use serde_json::{Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn ok(_req: Request) -> &'static str {
    "ok"
}

async fn get(router: &Router, uri: &str) -> Response {
    init_tracing();
    router.dispatch(http::Request::get(uri).body(Bytes::new()).unwrap()).await
}

fn from_now(delta: TimeDelta) -> Value {
    json!((Utc::now() + delta).to_rfc3339())
}

/// Every `/user/{user}` resolves to user 1 with the given attributes.
fn users(attributes: Value) -> Router {
    Router::new().bind("user", move |id| {
        (id == "1").then(|| Bound::entity(Entity::new("App\\Models\\User", 1), attributes.clone()))
    })
}

fn objects(attributes: Value) -> Router {
    Router::new().bind("object", move |_| Some(Bound::value(attributes.clone())))
}

#[tokio::test]
async fn throws_when_no_fields() {
    let router = Router::new().route(Route::new(Method::Get, "/user/test", ok).middleware("expires"));

    let response = get(&router, "/user/test").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.error().map(ToString::to_string).as_deref(),
        Some("The path [user/test] has no route parameter to find an expiration."),
    );
}

#[tokio::test]
async fn uses_last_route_parameter_with_expired_at_attribute() {
    let route = || Route::new(Method::Get, "/user/{user}", ok).middleware("expires");

    let fresh = users(json!({ "expired_at": from_now(TimeDelta::hours(1)) })).route(route());
    let stale = users(json!({ "expired_at": from_now(TimeDelta::seconds(-1)) })).route(route());

    assert_eq!(get(&fresh, "/user/1").await.status_code(), StatusCode::OK);

    let response = get(&stale, "/user/1").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(matches!(
        response.error(),
        Some(Error::ModelNotFound { model, key }) if model == "App\\Models\\User" && key == "1"
    ));
    assert_eq!(response.body(), b"No query results for model [App\\Models\\User] 1");
}

#[tokio::test]
async fn specifies_parameter() {
    let route = || Route::new(Method::Get, "/user/{user}/number/{number}", ok).middleware("expires:user");

    let fresh = users(json!({ "expired_at": from_now(TimeDelta::hours(1)) })).route(route());
    let stale = users(json!({ "expired_at": from_now(TimeDelta::seconds(-1)) })).route(route());

    assert_eq!(get(&fresh, "/user/1/number/10").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/user/1/number/10").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn specifies_parameter_with_attribute() {
    let route = || {
        Route::new(Method::Get, "/user/{user}/number/{number}", ok).middleware("expires:user.custom_timestamp")
    };

    let fresh = users(json!({ "custom_timestamp": from_now(TimeDelta::hours(1)) })).route(route());
    let stale = users(json!({ "custom_timestamp": from_now(TimeDelta::seconds(-1)) })).route(route());

    assert_eq!(get(&fresh, "/user/1/number/10").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/user/1/number/10").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uses_relative_minutes() {
    let route = || Route::new(Method::Get, "/user/{user}", ok).middleware("expires:user,60");

    let fresh = users(json!({ "created_at": from_now(TimeDelta::minutes(-59)) })).route(route());
    let stale = users(json!({ "created_at": from_now(TimeDelta::hours(-2)) })).route(route());

    assert_eq!(get(&fresh, "/user/1").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/user/1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uses_relative_time() {
    let route = || Route::new(Method::Get, "/user/{user}", ok).middleware("expires:user,1 hour");

    let fresh = users(json!({ "created_at": from_now(TimeDelta::zero()) })).route(route());
    let stale = users(json!({ "created_at": from_now(TimeDelta::days(-1)) })).route(route());

    assert_eq!(get(&fresh, "/user/1").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/user/1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uses_object_data() {
    let route = || Route::new(Method::Get, "/object/{object}", ok).middleware("expires");

    let fresh = objects(json!({ "expired_at": from_now(TimeDelta::hours(1)) })).route(route());
    let stale = objects(json!({ "expired_at": from_now(TimeDelta::seconds(-1)) })).route(route());

    assert_eq!(get(&fresh, "/object/1").await.status_code(), StatusCode::OK);

    let response = get(&stale, "/object/1").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(matches!(response.error(), Some(Error::NotFound)));
}

#[tokio::test]
async fn uses_object_data_with_parameter() {
    let route = || Route::new(Method::Get, "/object/{object}", ok).middleware("expires:object.foo");

    let fresh = objects(json!({ "foo": from_now(TimeDelta::hours(1)) })).route(route());
    let stale = objects(json!({ "foo": from_now(TimeDelta::seconds(-1)) })).route(route());

    assert_eq!(get(&fresh, "/object/1").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/object/1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uses_object_data_with_parameter_relative() {
    let route = || Route::new(Method::Get, "/object/{object}", ok).middleware("expires:object.foo,60");

    let fresh = objects(json!({ "foo": from_now(TimeDelta::zero()) })).route(route());
    let stale = objects(json!({ "foo": from_now(TimeDelta::days(-1)) })).route(route());

    assert_eq!(get(&fresh, "/object/1").await.status_code(), StatusCode::OK);
    assert_eq!(get(&stale, "/object/1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unbound_parameter_never_expires_on_its_own() {
    let router = Router::new().route(Route::new(Method::Get, "/object/{object}", ok).middleware("expires"));

    assert_eq!(get(&router, "/object/1").await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn declarations_register_as_directives() -> Result<(), Error> {
    let route = |declaration: Declaration| Route::new(Method::Get, "/post/{post}", ok).middleware(declaration);
    let posts = |published_at: Value| {
        Router::new().bind("post", move |id| {
            Some(Bound::entity(Entity::new("Post", id), json!({ "published_at": published_at.clone() })))
        })
    };

    let last_week = from_now(TimeDelta::days(-7));
    let published = posts(last_week.clone()).route(route(Expires::by("post.published_at").r#in(8)?.days()));
    let retired = posts(last_week).route(route(Expires::by("post.published_at").after("1 week").r#in(6)?.days()));

    assert_eq!(get(&published, "/post/hello").await.status_code(), StatusCode::OK);

    let response = get(&retired, "/post/hello").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.body(), b"No query results for model [Post] hello");
    Ok(())
}

#[tokio::test]
async fn fixed_clock_decides_at_the_boundary() {
    let noon = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let at = |clock: DateTime<Utc>| {
        objects(json!({ "expired_at": "2024-05-10 12:00:00" }))
            .alias_middleware("expires", Expires::with_clock(FixedClock(clock)))
            .route(Route::new(Method::Get, "/object/{object}", ok).middleware("expires"))
    };

    assert_eq!(get(&at(noon), "/object/1").await.status_code(), StatusCode::OK);
    assert_eq!(get(&at(noon + TimeDelta::seconds(1)), "/object/1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_middleware_is_a_server_error() {
    let router = Router::new().route(Route::new(Method::Get, "/object/{object}", ok).middleware("throttle:60,1"));

    let response = get(&router, "/object/1").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(response.error(), Some(Error::UnknownMiddleware(name)) if name == "throttle"));
}

#[tokio::test]
async fn repeated_requests_get_the_same_answer() {
    let router = users(json!({ "expired_at": from_now(TimeDelta::seconds(-1)) }))
        .route(Route::new(Method::Get, "/user/{user}", ok).middleware("expires"));

    for _ in 0..3 {
        assert_eq!(get(&router, "/user/1").await.status_code(), StatusCode::NOT_FOUND);
    }
    assert_eq!(get(&router, "/user/2").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_parameter_argument_is_a_server_error() {
    let route = |directive: &str| Route::new(Method::Get, "/object/{object}", ok).middleware(directive);
    let fresh = || objects(json!({ "expired_at": from_now(TimeDelta::hours(1)) }));

    for directive in ["expires:", "expires:,60"] {
        let response = get(&fresh().route(route(directive)), "/object/1").await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{directive}");
        assert!(matches!(response.error(), Some(Error::MissingParameter { path }) if path == "object/1"));
    }
}

#[tokio::test]
async fn out_of_range_offset_is_a_server_error() {
    let router = objects(json!({ "foo": from_now(TimeDelta::zero()) }))
        .route(Route::new(Method::Get, "/object/{object}", ok).middleware("expires:object.foo,99999999999999999"));

    let response = get(&router, "/object/1").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(response.error(), Some(Error::InvalidInterval(_))));
}
