use url::Url;

use crate::config::FetchConfig;
use crate::net::response::ResponseType;
use crate::net::transport::{
    follow_policy, status_text, AcceleratedTransport, TransportError, TransportOptions,
    TransportResponse,
};

/// Shared, pooled reqwest client. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct ClientHandle(reqwest::Client);

/// Accelerated transport backed by a single pooled `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    config: FetchConfig,
}

impl ReqwestTransport {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

pub(crate) fn client_builder(config: &FetchConfig) -> reqwest::ClientBuilder {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);
    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder
}

impl AcceleratedTransport for ReqwestTransport {
    type Client = ClientHandle;

    fn create_client(&self) -> Result<ClientHandle, TransportError> {
        let client = client_builder(&self.config)
            .redirect(follow_policy(self.config.max_redirects))
            .build()?;
        Ok(ClientHandle(client))
    }

    async fn fetch_via_client(
        &self,
        client: &ClientHandle,
        url: &str,
        options: Option<TransportOptions>,
    ) -> Result<TransportResponse, TransportError> {
        let options = options.unwrap_or_default();
        let method = options.method.unwrap_or(http::Method::GET);

        let mut req = client.0.request(method, url);
        if let Some(headers) = options.headers {
            req = req.headers(headers);
        }
        if let Some(body) = options.body {
            req = req.body(body);
        }

        let resp = req.send().await?;

        // Extract everything that doesn't consume `resp`
        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().clone();
        let redirected = Url::parse(url).map_or(true, |requested| requested != final_url);

        // Fetch body. We don't do streaming yet
        let body = resp.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status_text(status),
            headers,
            body,
            url: final_url,
            redirected,
            response_type: ResponseType::Basic,
        })
    }
}
