use clap::{Parser, Subcommand};
use fabui_update::update::UpdateType;
use std::path::PathBuf;

/// FABUI 更新工具
#[derive(Parser, Debug)]
#[command(name = "fabupdate")]
#[command(version)]
#[command(about = "查询远程版本并下载更新文件", long_about = None)]
pub struct Cli {
    /// 配置文件 (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// 下载暂存目录，文件写入 <DIR>/fabui/
    #[arg(long, value_name = "DIR", global = true)]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub temp_folder: Option<PathBuf>,

    /// CPU 架构
    #[arg(long, value_name = "ARCH", global = true)]
    pub arch: Option<String>,

    /// 控制板 MCU 型号
    #[arg(long, value_name = "MCU", global = true)]
    pub mcu: Option<String>,

    /// 输出调试日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 查询远程版本清单
    Check {
        /// 直接输出原始清单
        #[arg(long)]
        json: bool,
    },

    /// 下载一个更新任务的文件
    Download {
        /// 更新类型
        #[arg(long = "type", value_name = "TYPE", value_enum)]
        task_type: UpdateType,

        /// 待下载文件，格式 TAG=远程路径，可重复
        #[arg(long = "file", value_name = "TAG=SUFFIX", required = true)]
        #[arg(value_parser = parse_file_arg)]
        files: Vec<(String, String)>,

        /// 主文件标签
        #[arg(long = "main", value_name = "TAG")]
        main_file: Option<String>,

        /// 任务名称，默认与类型相同
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// 版本号，仅用于展示
        #[arg(long = "release", value_name = "VERSION", default_value = "")]
        release: String,

        /// 指定端点根地址，跳过远程清单查询
        #[arg(long, value_name = "URL")]
        #[arg(value_hint = clap::ValueHint::Url)]
        endpoint: Option<String>,

        /// 每次状态变化时写入汇总快照 (JSON)
        #[arg(long, value_name = "FILE")]
        #[arg(value_hint = clap::ValueHint::FilePath)]
        status_file: Option<PathBuf>,
    },
}

fn parse_file_arg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((tag, suffix)) if !tag.is_empty() && !suffix.is_empty() => {
            Ok((tag.to_string(), suffix.to_string()))
        }
        _ => Err(format!("格式应为 TAG=SUFFIX: {}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_release_flag() {
        let cli = Cli::try_parse_from([
            "fabupdate",
            "download",
            "--type",
            "bundle",
            "--file",
            "rootfs=rootfs.img",
            "--main",
            "rootfs",
            "--release",
            "1.0",
        ])
        .unwrap();

        match cli.command {
            Command::Download {
                task_type,
                files,
                main_file,
                release,
                ..
            } => {
                assert_eq!(task_type, UpdateType::Bundle);
                assert_eq!(files, vec![("rootfs".to_string(), "rootfs.img".to_string())]);
                assert_eq!(main_file.as_deref(), Some("rootfs"));
                assert_eq!(release, "1.0");
            }
            other => panic!("意外的子命令: {:?}", other),
        }
    }

    #[test]
    fn test_file_arg_requires_tag_and_suffix() {
        assert!(parse_file_arg("rootfs").is_err());
        assert!(parse_file_arg("=rootfs.img").is_err());
        assert!(parse_file_arg("rootfs=").is_err());
    }
}
