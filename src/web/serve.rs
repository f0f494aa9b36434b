use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::App;

use super::{midware, routes::routes, Result, REQUEST_ID_HEADER};

/// The core async function returning a future that will serve this application.
///
/// Takes over the listener and state carried by `App` and wraps the routes in
/// the middleware stack: request ids, tracing, the error-to-JSON response
/// mapper, CORS and the proxy HTTPS redirect.
///
/// Current implementation might return an IO error from `axum::serve`
pub async fn serve(app: App) -> Result<()> {
    let App {
        app_state,
        listener,
    } = app;
    let x_request_id: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace_layer = build_trace_layer();

    let app = Router::new().merge(routes(app_state)).layer(
        ServiceBuilder::new()
            // Set UUID per request
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(trace_layer)
            // This has to be in front of the Propagation layer because while the request goes through
            // middleware as listed in the ServiceBuilder, the response goes through the middleware stack from the bottom up.
            // If we want the response mapper to find the Propagated header that middleware has to run first!
            .layer(middleware::map_response(midware::response_mapper))
            // Keep Propagation above the layers that can answer a request themselves
            // (CORS preflight, HTTPS redirect) so their responses carry the UUID too.
            .layer(PropagateRequestIdLayer::new(x_request_id))
            // The signup form is embedded on external landing pages
            .layer(CorsLayer::permissive())
            .layer(middleware::from_fn(midware::https_redirect)),
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// One span per request named by the propagated request id, an event on
/// entry and a status-classified event on exit.
fn build_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let req_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|id| id.to_str().ok())
                .unwrap_or_default()
                .to_string();

            tracing::error_span!(
                "request",
                id = req_id,
                method = req.method().to_string(),
                path = req.uri().path()
            )
        })
        .on_request(|req: &Request<Body>, _span: &Span| {
            tracing::info!("{:<12} - {}", "REQUEST", req.uri())
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
            let status = res.status();

            if status.is_client_error() || status.is_server_error() {
                tracing::error!("{:<12} - {} in {latency:?}", "RESPONSE", status)
            } else {
                tracing::info!("{:<12} - {} in {latency:?}", "RESPONSE", status)
            }
        })
}
