use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::common::client::{DEFAULT_MAX_REDIRECTS, UpdateClient};
use crate::update::error::{Result, UpdateError};

/// 下载进度接收方，参数为 `(总字节数, 已下载字节数)`，总大小未知时为 0
pub trait ProgressSink: Send {
    fn report(&mut self, total: u64, done: u64);
}

impl<F> ProgressSink for F
where
    F: FnMut(u64, u64) + Send,
{
    fn report(&mut self, total: u64, done: u64) {
        self(total, done)
    }
}

/// 单文件下载：GET 请求并把响应体流式写入本地文件
///
/// 失败时目标文件可能只写了一部分，调用方需要自行视为无效。
#[derive(Debug, Clone)]
pub struct TransferClient {
    client: UpdateClient,
}

impl TransferClient {
    /// 默认不设超时
    pub fn new() -> Result<Self> {
        Self::with_options(None, DEFAULT_MAX_REDIRECTS)
    }

    pub fn with_options(timeout: Option<Duration>, max_redirects: usize) -> Result<Self> {
        Ok(Self {
            client: UpdateClient::new(timeout, max_redirects)?,
        })
    }

    /// 返回写入的总字节数
    pub async fn download(
        &self,
        url: &str,
        output_path: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<u64> {
        // 暂存目录须事先存在，这里不负责创建
        let mut file = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| UpdateError::filesystem(output_path, e))?;

        let response = self.client.get_raw_response(url).await?;
        let total_size = response.content_length().unwrap_or(0);
        debug!("开始下载: {} ({} 字节) -> {}", url, total_size, output_path.display());

        sink.report(total_size, 0);

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::filesystem(output_path, e))?;

            downloaded += chunk.len() as u64;
            sink.report(total_size, downloaded);
        }

        file.flush()
            .await
            .map_err(|e| UpdateError::filesystem(output_path, e))?;

        debug!("下载完成: {} ({} 字节)", output_path.display(), downloaded);
        Ok(downloaded)
    }
}
