use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::http::Uri;

use crate::client::config::Config;
use crate::client::consts::API_KEY_QUERY_PARAM;
use crate::error::ConnectError;

/// Build the upgrade request: the endpoint with the API key as a query
/// parameter, plus any configured headers.
pub fn build_request(config: &Config) -> Result<Request, ConnectError> {
    let invalid_endpoint = || ConnectError::InvalidEndpoint(config.base_url().to_string());

    let uri: Uri = format!(
        "{}?{}={}",
        config.base_url(),
        API_KEY_QUERY_PARAM,
        config.api_key().expose_secret()
    )
    .parse()
    .map_err(|_| invalid_endpoint())?;

    if !matches!(uri.scheme_str(), Some("ws") | Some("wss")) || uri.host().is_none() {
        return Err(invalid_endpoint());
    }

    let mut request = uri.into_client_request()?;
    for (name, value) in config.headers() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConnectError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ConnectError::InvalidHeader(name.clone()))?;
        request.headers_mut().insert(header_name, header_value);
    }
    Ok(request)
}
