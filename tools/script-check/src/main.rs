//! # Script Check
//!
//! 剧本静态检查工具 - 批量扫描剧本 JSON 并输出诊断。
//! 跳转目标缺失、id 重复这类问题在运行时才暴露的话代价很高，
//! 内容组提交前先跑一遍这个工具。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p script-check -- scripts/
//! cargo run -p script-check -- scripts/chapter01.json
//! cargo run -p script-check -- scripts/ --warnings-as-errors
//! ```
//!
//! 发现 Error 级诊断时以非零状态码退出，方便接入 CI。

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use debate_runtime::{DiagnosticResult, Script, analyze_script};

#[derive(Parser)]
#[command(name = "script-check")]
#[command(about = "剧本静态检查工具 - 批量扫描剧本 JSON 并输出诊断")]
#[command(version)]
struct Cli {
    /// 剧本文件或目录（目录时递归扫描全部 .json）
    path: PathBuf,

    /// 警告也视为失败
    #[arg(long)]
    warnings_as_errors: bool,

    /// 只输出汇总，不逐条打印诊断
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let files = collect_script_files(&cli.path)?;
    if files.is_empty() {
        println!("没有找到任何剧本文件: {}", cli.path.display());
        return Ok(());
    }

    let mut total = DiagnosticResult::new();
    let mut broken_files = 0usize;

    for file in &files {
        match check_file(file) {
            Ok(result) => {
                if !cli.quiet {
                    for diag in &result.diagnostics {
                        println!("{diag}");
                    }
                }
                total.merge(result);
            }
            Err(e) => {
                // JSON 本身坏掉，连诊断都做不了
                println!("[ERROR] {}: {:#}", file.display(), e);
                broken_files += 1;
            }
        }
    }

    println!();
    println!(
        "检查了 {} 个剧本：{} 个错误，{} 个警告，{} 个文件无法解析",
        files.len(),
        total.error_count(),
        total.warn_count(),
        broken_files
    );

    let failed = total.has_errors()
        || broken_files > 0
        || (cli.warnings_as_errors && total.warn_count() > 0);
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// 收集待检查的剧本文件
fn collect_script_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("路径不存在: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// 检查单个剧本文件
///
/// 用 `parse_unchecked` 读入，id 类问题由 analyze_script 统一汇报，
/// 一次运行能看到全部问题而不是在第一个错误处停下。
fn check_file(path: &Path) -> Result<DiagnosticResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    let mut script = Script::parse_unchecked(&json).context("JSON 解析失败")?;

    // 诊断输出里用文件路径定位比章节 id 更直观
    if script.chapter_id.is_empty() {
        script.chapter_id = path.display().to_string();
    }

    Ok(analyze_script(&script))
}
