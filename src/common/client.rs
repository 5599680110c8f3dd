use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::update::error::{Result, UpdateError};

/// 默认最多跟随的重定向次数
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// 更新服务使用的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct UpdateClient {
    pub inner: Client,
}

impl UpdateClient {
    /// `timeout` 为 `None` 时请求不设超时（用于大文件下载）
    pub fn new(timeout: Option<Duration>, max_redirects: usize) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .redirect(Policy::limited(max_redirects))
            .default_headers(Self::get_default_headers());

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("fabui-update/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    /// 发起 GET 请求，非 2xx 状态码视为失败
    pub async fn get_raw_response(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;
        Self::check_response_status(&resp, url)?;
        Ok(resp)
    }

    /// 获取并解析 JSON 文档
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.get_raw_response(url).await?;
        let body = resp.text().await?;

        serde_json::from_str(&body).map_err(|e| UpdateError::ManifestParse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn check_response_status(response: &Response, url: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        warn!("非成功状态码: {}, URL: {}", status, url);
        Err(UpdateError::HttpStatus {
            status,
            url: url.to_string(),
        })
    }
}

/// 拼接端点根地址与相对路径，保证中间恰好一个 `/`
pub fn join_url(root: &str, suffix: &str) -> String {
    let root = root.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        return root.to_string();
    }
    format!("{}/{}", root, suffix)
}
