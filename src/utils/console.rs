//! 面向操作员的控制台输出。
//!
//! 状态行写入 stdout，带颜色区分成功、警告和错误；结构化日志由 tracing 写入 stderr。

use std::fmt::Write as _;

use crossterm::style::{Stylize, style};

use crate::provision::{BucketOutcome, ProvisionError, ProvisionReport};

pub fn info(message: &str) {
    println!("{} {message}", "▶".cyan());
}

pub fn success(message: &str) {
    println!("{} {message}", "✔".green());
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), style(message).yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✘".red(), style(message).red());
}

/// 打印致命错误，捕获的提供者输出逐行缩进。
pub fn failure(err: &ProvisionError) {
    let rendered = render_failure(err);
    let mut lines = rendered.lines();
    if let Some(headline) = lines.next() {
        error(headline);
    }
    for line in lines {
        eprintln!("{}", style(line).dim());
    }
}

/// 生成错误信息，不含颜色。
pub fn render_failure(err: &ProvisionError) -> String {
    match err {
        ProvisionError::ApiCallFailed { step, detail } => {
            let mut out = format!("{step}失败:");
            for line in detail.lines() {
                let _ = write!(out, "\n    {line}");
            }
            out
        }
        _ => err.to_string(),
    }
}

pub fn print_summary(report: &ProvisionReport) {
    let title = match report.outcome {
        BucketOutcome::LeftUnchanged => "========== 未做修改 ==========",
        _ => "========== 配置完成 ==========",
    };
    println!();
    println!("{}", title.green().bold());
    print!("{}", render_summary(report));
}

/// 生成总结信息，不含颜色。
pub fn render_summary(report: &ProvisionReport) -> String {
    let mut out = String::new();
    let outcome = match report.outcome {
        BucketOutcome::Created => "已新建",
        BucketOutcome::Reconfigured => "已重新配置",
        BucketOutcome::LeftUnchanged => "保持不变",
    };

    let _ = writeln!(out, "存储桶:     {}", report.bucket);
    let _ = writeln!(out, "区域:       {}", report.region);
    let _ = writeln!(out, "状态:       {outcome}");
    let _ = writeln!(out, "调用者:     {}", report.identity);
    let _ = writeln!(out, "网站端点:   {}", report.endpoint);

    if report.has_warnings() {
        let _ = writeln!(out);
        let _ = writeln!(out, "警告:");
        for warning in &report.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "后续步骤:");
    let _ = writeln!(out, "  1. 在 CI 系统中配置以下密钥:");
    let _ = writeln!(out, "     AWS_ACCESS_KEY_ID     部署用户的访问密钥 ID");
    let _ = writeln!(out, "     AWS_SECRET_ACCESS_KEY 部署用户的秘密访问密钥");
    let _ = writeln!(out, "     AWS_REGION            {}", report.region);
    let _ = writeln!(out, "     S3_BUCKET             {}", report.bucket);
    let _ = writeln!(
        out,
        "  2. 上传构建产物: aws s3 sync ./dist s3://{} --delete",
        report.bucket
    );
    let _ = writeln!(out, "  3. 访问 {} 验证部署", report.endpoint);
    let _ = writeln!(out, "步骤日志位于 {}", report.log_dir.display());
    out
}
