//! HTTP feed: GET на сервер симуляции (без body, без auth, без retry)

use super::{CarFeed, FeedResult};
use crate::error::FeedError;
use crate::wire::decode_snapshot;

pub struct HttpCarFeed {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpCarFeed {
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        // Сервер симуляции в локальной сети: системный HTTP(S)_PROXY не применяем
        let client = reqwest::blocking::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CarFeed for HttpCarFeed {
    fn fetch(&self) -> FeedResult {
        let response = self.client.get(&self.url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text()?;
        decode_snapshot(&body)
    }

    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }
}
