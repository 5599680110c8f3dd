use colored::*;

/// 更新工具的终端输出
pub struct PrettyLogger;

impl PrettyLogger {
    /// 清单或任务中值得注意、但不影响继续执行的情况
    pub fn warning(message: impl AsRef<str>) {
        println!("{}", notice_line(message.as_ref()));
    }

    /// 更新任务失败
    pub fn error(message: impl AsRef<str>) {
        eprintln!("{}", failure_line(message.as_ref()));
    }

    /// 开始查询一个清单或下载一个任务
    pub fn step_start(step: impl AsRef<str>) {
        println!("\n{}", stage_line(step.as_ref()));
    }

    /// 显示键值信息
    pub fn field(label: impl AsRef<str>, value: impl AsRef<str>) {
        println!("  {}: {}", label.as_ref().bold(), value.as_ref());
    }

    /// 显示完成总结
    pub fn completion_summary(items: Vec<impl AsRef<str>>) {
        println!("\n{}", "更新文件已就绪".green().bold());
        for item in items {
            println!("  {}", item.as_ref());
        }
    }
}

fn notice_line(message: &str) -> String {
    format!("{} {}", "[注意]".yellow().bold(), message)
}

fn failure_line(message: &str) -> String {
    format!("{} {}", "[更新失败]".red().bold(), message)
}

fn stage_line(step: &str) -> String {
    format!("{} {}", "==>".cyan().bold(), step.bold())
}
