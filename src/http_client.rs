use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

const API_KEY_HEADER: &str = "x-apisports-key";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client; the first caller's settings win.
pub fn http_client(api_key: &str, timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("league_desk/0.1"));
        let mut key = HeaderValue::from_str(api_key).context("api key is not a valid header")?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build http client")
    })
}
