//! # 终端 Host
//!
//! 在命令行中试玩辩论剧本。没有打字机动画和语音播放，
//! 对应的等待状态直接以回车/立即完成代替，用于内容组快速过流程。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- scripts/chapter01.json
//! cargo run -p host-cli -- scripts/chapter01.json --verbose
//! ```
//!
//! ## 操作
//!
//! - 回车：推进对话 / 确认语音播放结束
//! - 言弹播放中输入 `!`：点击弱点
//! - 分支/反驳选项：输入序号（反驳时直接回车 = 取消）

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info};

use debate_runtime::{Command, RuntimeInput, Script, ScriptEngine, WaitingReason};

#[derive(Parser)]
#[command(name = "host-cli")]
#[command(about = "终端 Host - 在命令行中试玩辩论剧本")]
#[command(version)]
struct Cli {
    /// 剧本 JSON 文件路径
    script: PathBuf,

    /// 输出引擎调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let script = load_script(&cli.script)?;
    info!(chapter = %script.chapter_id, "剧本加载完成");

    // 后续 LoadNextScript 按剧本所在目录解析
    let script_dir = cli
        .script
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    run(ScriptEngine::new(script), &script_dir)
}

fn load_script(path: &Path) -> Result<Script> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取剧本文件: {}", path.display()))?;
    let script =
        Script::parse(&json).with_context(|| format!("剧本解析失败: {}", path.display()))?;
    Ok(script)
}

/// 主循环：tick → 呈现指令 → 按等待状态采集输入
fn run(mut engine: ScriptEngine, script_dir: &Path) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = None;

    loop {
        let (commands, waiting) = engine.tick(input.take())?;

        for cmd in &commands {
            present(cmd);
        }

        if engine.is_halted() {
            eprintln!("（剧本数据有误，引擎已停机；请用 script-check 检查后修正）");
            std::process::exit(1);
        }

        input = match waiting {
            WaitingReason::None => break,

            // 终端没有逐字动画，文本已整段打印
            WaitingReason::WaitForTyping => Some(RuntimeInput::TypingFinished),

            WaitingReason::WaitForClick => {
                wait_enter(&stdin)?;
                Some(RuntimeInput::Click)
            }

            WaitingReason::WaitForChoice { choice_count } => {
                let index = prompt_index(&stdin, choice_count, false)?
                    .context("分支选择不允许取消")?;
                Some(RuntimeInput::choice(index))
            }

            // 没有真实语音，用回车模拟播放结束；`!` 表示点中弱点
            WaitingReason::WaitForVoice => {
                if read_line(&stdin)?.trim() == "!" {
                    Some(RuntimeInput::WeakPointClicked)
                } else {
                    Some(RuntimeInput::VoiceFinished)
                }
            }

            WaitingReason::WaitForTime(duration) => {
                debug!(?duration, "等待计时");
                thread::sleep(duration);
                None
            }

            WaitingReason::WaitForOption { option_count } => {
                match prompt_index(&stdin, option_count, true)? {
                    Some(index) => Some(RuntimeInput::option(index)),
                    None => Some(RuntimeInput::OptionCancelled),
                }
            }

            WaitingReason::WaitForScript { filename } => {
                let path = script_dir.join(&filename);
                engine.load_script(load_script(&path)?);
                info!(file = %filename, "切换剧本");
                None
            }
        };
    }

    println!();
    println!("=== 本章结束 ===");
    println!(
        "  对话 {} 条，证物 {} 件",
        engine.history().dialogue_count(),
        engine.evidence().len()
    );
    for record in engine.evidence().records() {
        println!("  - {}：{}", record.title, record.description);
    }
    Ok(())
}

/// 把引擎指令渲染到终端
fn present(cmd: &Command) {
    match cmd {
        Command::EnterDebateMode { time_limit } => {
            println!();
            println!("——— 辩论开始（限时 {time_limit} 秒）———");
        }
        Command::ShowDialogue { speaker, text } => match speaker {
            Some(speaker) => println!("【{speaker}】{text}"),
            None => println!("{text}"),
        },
        Command::ShowDebateSentence { index, text, weak_point } => {
            let marker = if *weak_point { "（含弱点，输入 ! 点击）" } else { "" };
            println!("  #{index} {}{marker}", strip_markup(text));
        }
        Command::ShowOptions { options } => {
            println!("  —— 反驳选项 ——");
            for (i, option) in options.iter().enumerate() {
                println!("  [{i}] {option}");
            }
        }
        Command::PresentChoices { choices } => {
            for (i, choice) in choices.iter().enumerate() {
                println!("  [{i}] {}", choice.text);
            }
        }
        Command::EvidenceAdded { title, .. } => {
            println!("  ★ 获得证物：{title}");
        }
        Command::SetBackground { path } => {
            println!("（背景切换：{path}）");
        }
        Command::RequestScript { filename } => {
            println!("（加载下一章：{filename}）");
        }
        // 立绘、语音、BGM、时间缩放等在终端里没有对应表现
        _ => debug!(?cmd, "忽略的指令"),
    }
}

/// 去掉弱点富文本标记，终端只显示纯文本
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn read_line(stdin: &std::io::Stdin) -> Result<String> {
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("读取输入失败")?;
    Ok(line)
}

fn wait_enter(stdin: &std::io::Stdin) -> Result<()> {
    read_line(stdin)?;
    Ok(())
}

/// 提示用户输入序号；`allow_cancel` 时空输入返回 None
fn prompt_index(stdin: &std::io::Stdin, count: usize, allow_cancel: bool) -> Result<Option<usize>> {
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let line = read_line(stdin)?;
        let trimmed = line.trim();

        if trimmed.is_empty() && allow_cancel {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(index) if index < count => return Ok(Some(index)),
            _ => println!("请输入 0..{count} 之间的序号"),
        }
    }
}
