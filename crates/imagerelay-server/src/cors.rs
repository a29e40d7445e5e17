use http::header::HeaderName;
use http::{HeaderValue, Method};
use imagerelay_config::{AnyOrArray, CorsConfig};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build the CORS layer applied to every relay response
///
/// Entries were checked at load time, so unparsable ones are only skipped
/// here for configs built in code.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = match &config.origins {
        AnyOrArray::Any => AllowOrigin::any(),
        AnyOrArray::List(origins) => allow_origin(origins),
    };

    let methods = match &config.methods {
        AnyOrArray::Any => AllowMethods::any(),
        AnyOrArray::List(methods) => methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect::<Vec<Method>>()
            .into(),
    };

    let headers = match &config.headers {
        AnyOrArray::Any => AllowHeaders::any(),
        AnyOrArray::List(headers) => headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect::<Vec<HeaderName>>()
            .into(),
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers);

    if let Some(duration) = config.max_age_duration() {
        layer = layer.max_age(duration);
    }

    layer
}

/// A single origin is sent on every response, whatever the request's
/// `Origin`; several origins are matched against it
fn allow_origin(origins: &[String]) -> AllowOrigin {
    let values: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    match <[HeaderValue; 1]>::try_from(values) {
        Ok([origin]) => AllowOrigin::exact(origin),
        Err(values) => values.into(),
    }
}
