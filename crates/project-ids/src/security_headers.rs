//! Browser hardening headers for rendered HTML pages

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

const CSP: &str = "default-src 'self'; object-src 'none'; frame-ancestors 'none'; \
                   sandbox allow-forms allow-same-origin allow-scripts; base-uri 'self';";

fn html_headers() -> [(HeaderName, &'static str); 5] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::CONTENT_SECURITY_POLICY, CSP),
        // For IE
        (HeaderName::from_static("x-content-security-policy"), CSP),
        (header::REFERRER_POLICY, "no-referrer"),
    ]
}

/// Add the hardening headers to HTML responses that don't already carry them
pub async fn layer(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let headers = response.headers_mut();
    for (name, value) in html_headers() {
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::Request as HttpRequest,
        middleware,
        response::{Html, Redirect},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/page", get(|| async { Html("<p>hi</p>") }))
            .route("/away", get(|| async { Redirect::to("/page") }))
            .layer(middleware::from_fn(layer))
    }

    #[tokio::test]
    async fn test_html_responses_get_headers() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], CSP);
        assert_eq!(headers["x-content-security-policy"], CSP);
    }

    #[tokio::test]
    async fn test_redirects_are_left_alone() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/away").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert!(!response.headers().contains_key(header::X_FRAME_OPTIONS));
    }
}
