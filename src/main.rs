use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fabui_update::common::logger::PrettyLogger;
use fabui_update::config::UpdateConfig;
use fabui_update::update::{
    FactorySnapshot, FileStatus, TaskSnapshot, TransferClient, UpdateFactory, UpdateTask,
    UpdateType,
};
use fabui_update::version::RemoteVersion;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tracing::{debug, info, warn};

mod cli;

/// 配置文件加载后再用命令行参数覆盖
fn load_config(args: &cli::Cli) -> Result<UpdateConfig> {
    let mut config = UpdateConfig::load(args.config.as_deref())?;
    if let Some(dir) = &args.temp_folder {
        config.temp_folder = dir.clone();
    }
    if let Some(arch) = &args.arch {
        config.arch = arch.clone();
    }
    if let Some(mcu) = &args.mcu {
        config.mcu = mcu.clone();
    }
    config.validate()?;
    debug!("当前配置: {:?}", config);
    Ok(config)
}

async fn run_check(config: &UpdateConfig, json: bool) -> Result<()> {
    let version = RemoteVersion::fetch(config)
        .await
        .context("获取远程版本清单失败")?;

    if json {
        let output = serde_json::json!({
            "colibri": version.colibri(),
            "firmware": version.firmware(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    PrettyLogger::step_start(format!("系统清单 ({})", version.arch()));
    PrettyLogger::field("端点", version.colibri_endpoint());
    PrettyLogger::field("软件包", version.bundles().len().to_string());
    PrettyLogger::field("系统镜像", version.images().len().to_string());
    PrettyLogger::field("引导", serde_json::to_string(version.boot())?);

    PrettyLogger::step_start(format!("固件清单 ({})", version.mcu()));
    PrettyLogger::field("端点", version.firmware_endpoint());
    if version.firmware().is_empty() {
        PrettyLogger::warning("清单中没有固件信息");
    } else {
        PrettyLogger::field("固件", serde_json::to_string(version.firmware())?);
    }
    Ok(())
}

struct DownloadArgs {
    task_type: UpdateType,
    files: Vec<(String, String)>,
    main_file: Option<String>,
    name: Option<String>,
    release: String,
    endpoint: Option<String>,
    status_file: Option<PathBuf>,
}

async fn run_download(config: &UpdateConfig, args: DownloadArgs) -> Result<()> {
    let factory = match &args.endpoint {
        Some(endpoint) => {
            info!("使用指定端点: {}", endpoint);
            UpdateFactory::new(endpoint.clone(), endpoint.clone(), config.temp_folder.clone())
        }
        None => {
            let version = RemoteVersion::fetch(config)
                .await
                .context("获取远程版本清单失败")?;
            UpdateFactory::from_version(&version, config.temp_folder.clone())
        }
    };
    let factory = Arc::new(factory);

    let name = args.name.unwrap_or_else(|| args.task_type.to_string());
    let transfer = TransferClient::with_options(config.download_timeout(), config.max_redirects)?;
    let mut task = UpdateTask::new(name, args.task_type, factory.clone())?
        .with_transfer_client(transfer)
        .with_version(args.release);

    for (tag, suffix) in args.files {
        task.add_file(tag, suffix)?;
    }
    if let Some(main_file) = args.main_file {
        task.set_main_file(main_file)?;
    }

    let watcher = tokio::spawn(watch_progress(factory.subscribe(), args.status_file));
    let result = task.download().await;

    let summary: Vec<String> = task
        .files()
        .map(|file| {
            format!(
                "{} -> {}",
                file.tag(),
                file.local_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            )
        })
        .collect();

    // 释放全部发送端后进度监听自然结束
    drop(task);
    drop(factory);
    if let Err(e) = watcher.await {
        warn!("进度监听异常退出: {}", e);
    }

    match result {
        Ok(()) => {
            PrettyLogger::completion_summary(summary);
            Ok(())
        }
        Err(e) => {
            PrettyLogger::error(format!("下载失败: {}", e));
            Err(e.into())
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn render_task(pb: &ProgressBar, task: &TaskSnapshot) {
    match task
        .files
        .entries
        .values()
        .find(|file| file.status == FileStatus::Downloading)
    {
        Some(file) => {
            pb.set_position(file.progress_percent as u64);
            pb.set_message(format!("{} [{}]", task.name, file.tag));
        }
        None => pb.set_message(format!("{} ({})", task.name, task.status)),
    }
}

async fn write_status_file(path: &Path, snapshot: &FactorySnapshot) {
    let data = match serde_json::to_vec_pretty(snapshot) {
        Ok(data) => data,
        Err(e) => {
            warn!("序列化任务状态失败: {}", e);
            return;
        }
    };
    if let Err(e) = tokio::fs::write(path, data).await {
        warn!("写入状态文件失败 {}: {}", path.display(), e);
    }
}

async fn watch_progress(mut rx: watch::Receiver<FactorySnapshot>, status_file: Option<PathBuf>) {
    let bars = MultiProgress::new();
    let mut task_bars: HashMap<String, ProgressBar> = HashMap::new();

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();

        for (name, task) in &snapshot.tasks {
            let pb = task_bars.entry(name.clone()).or_insert_with(|| {
                let pb = bars.add(ProgressBar::new(100));
                pb.set_style(progress_style());
                pb
            });
            render_task(pb, task);
        }

        if let Some(path) = &status_file {
            write_status_file(path, &snapshot).await;
        }
    }

    for pb in task_bars.values() {
        pb.finish();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = load_config(&args)?;

    match args.command {
        cli::Command::Check { json } => run_check(&config, json).await,
        cli::Command::Download {
            task_type,
            files,
            main_file,
            name,
            release,
            endpoint,
            status_file,
        } => {
            PrettyLogger::step_start(format!("下载 {} 更新", task_type));
            run_download(
                &config,
                DownloadArgs {
                    task_type,
                    files,
                    main_file,
                    name,
                    release,
                    endpoint,
                    status_file,
                },
            )
            .await
        }
    }
}
