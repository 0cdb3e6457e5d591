use api_types::mutation::ErrorBody;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ClientError, Result};

/// HTTP client for the billing back-office REST API.
///
/// Paths are relative to `base_url`; a missing trailing slash on the base is
/// added so `https://host/api` and `https://host/api/` behave the same.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self {
            base_url,
            token: token.filter(|token| !token.trim().is_empty()),
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "api request");
        let req = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let res = self.request(Method::GET, path)?.query(params).send().await?;
        decode(res).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.request(method, path)?.json(body).send().await?;
        decode(res).await
    }

    pub(crate) async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T> {
        let res = self.request(method, path)?.send().await?;
        decode(res).await
    }
}

/// JSON body of a 2xx answer, or the classified error otherwise.
pub(crate) async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let res = check(res).await?;
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
}

/// Passes 2xx answers through, turns everything else into a [`ClientError`].
///
/// The server's `message` (or `error`) is kept verbatim; plain text bodies are
/// used as is and an empty body falls back to the status line.
pub(crate) async fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message)
        .or_else(|| {
            let text = text.trim();
            (!text.is_empty() && !text.starts_with('{')).then(|| text.to_string())
        });

    tracing::warn!(status = status.as_u16(), message = ?message, "api request failed");
    Err(ClientError::from_status(
        status.as_u16(),
        message,
        &status.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ApiClient::new("https://billing.test/api", None).unwrap();
        assert_eq!(
            client.url("/billing/adjustments").unwrap().as_str(),
            "https://billing.test/api/billing/adjustments"
        );
    }

    #[test]
    fn blank_token_is_ignored() {
        let client = ApiClient::new("https://billing.test/", Some("  ".to_string())).unwrap();
        assert!(client.token.is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url", None),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
