/// Errors from the external collaborator clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote service refused the supplied credentials.
    #[error("{service} rejected the credentials ({status})")]
    Authentication {
        service: &'static str,
        status: u16,
    },

    /// The remote service returned another non-2xx status code.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Turn a non-success response into a [`ClientError`], passing successes
/// through unchanged.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ClientError::Authentication {
            service,
            status: status.as_u16(),
        });
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ClientError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}
