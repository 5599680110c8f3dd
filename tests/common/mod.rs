#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use fabui_update::update::{TaskSnapshot, UpdateCoordinator, UpdateType};
use tempfile::TempDir;

/// 本地测试用文件服务，记录所有请求路径
#[derive(Clone, Default)]
pub struct FileServer {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    redirects: Arc<Mutex<HashMap<String, String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FileServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
        self
    }

    pub fn with_redirect(self, from: &str, to: &str) -> Self {
        self.redirects
            .lock()
            .unwrap()
            .insert(from.to_string(), to.to_string());
        self
    }

    /// 响应前先等待指定时间
    pub fn with_delay(self, path: &str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(path.to_string(), delay);
        self
    }

    /// 启动服务并返回根地址，例如 `http://127.0.0.1:12345`
    pub async fn start(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(serve).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| p.as_str() == path).count()
    }
}

async fn serve(State(server): State<FileServer>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    server.requests.lock().unwrap().push(path.clone());

    let delay = server.delays.lock().unwrap().get(&path).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let redirect = server.redirects.lock().unwrap().get(&path).cloned();
    if let Some(target) = redirect {
        return Redirect::temporary(&target).into_response();
    }

    let body = server.files.lock().unwrap().get(&path).cloned();
    match body {
        Some(body) => body.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 记录每次通知的协调方
pub struct RecordingCoordinator {
    endpoint: String,
    temp_folder: PathBuf,
    updates: Mutex<Vec<TaskSnapshot>>,
}

impl RecordingCoordinator {
    pub fn new(endpoint: impl Into<String>, temp_folder: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            endpoint: endpoint.into(),
            temp_folder: temp_folder.into(),
            updates: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn updates(&self) -> Vec<TaskSnapshot> {
        self.updates.lock().unwrap().clone()
    }
}

impl UpdateCoordinator for RecordingCoordinator {
    fn endpoint(&self, _task_type: UpdateType) -> String {
        self.endpoint.clone()
    }

    fn temp_folder(&self) -> PathBuf {
        self.temp_folder.clone()
    }

    fn update(&self, snapshot: &TaskSnapshot) {
        self.updates.lock().unwrap().push(snapshot.clone());
    }
}

/// 创建带 `fabui/` 子目录的暂存目录
pub fn staging_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("fabui")).unwrap();
    dir
}

/// 生成指定长度的测试数据
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
