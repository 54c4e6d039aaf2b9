mod error;
mod open_meteo;
mod reading;
mod source;
mod stormglass;

pub use error::*;
pub use open_meteo::*;
pub use reading::*;
pub use source::*;
pub use stormglass::*;

use anyhow::{Context as _, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::Duration;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn new_http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

async fn get_body(request: RequestBuilder) -> Result<String, TideError> {
    let response = request.send().await?;

    read_success_body(response).await
}

async fn read_success_body(response: Response) -> Result<String, TideError> {
    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        return Err(TideError::Status { status, body });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    fn response(status: u16, body: &'static str) -> Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn non_ok_status_is_unavailable() {
        let err = read_success_body(response(429, "quota exceeded"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TideError::Status { status, ref body }
                if status == StatusCode::TOO_MANY_REQUESTS && body == "quota exceeded"
        ));
    }

    #[tokio::test]
    async fn ok_status_passes_body_through() {
        let body = read_success_body(response(200, r#"{"data": []}"#))
            .await
            .unwrap();

        assert_eq!(body, r#"{"data": []}"#);
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = new_http_client().unwrap();

        let err = get_body(client.get(format!("http://127.0.0.1:{port}/v1/marine")))
            .await
            .unwrap_err();

        assert!(matches!(err, TideError::Request(_)));
    }
}
