//! # 诊断模块
//!
//! 剧本的静态检查 API，供内容组在运行前发现坏数据。
//!
//! ## 设计原则
//!
//! - 纯函数 API，不依赖 IO，可嵌入任何工具
//! - 诊断分级：Error（会停机/加载失败）、Warn（执行期会被跳过）、Info
//! - 复用剧本数据模型，不重复解析逻辑

use std::collections::HashSet;

use crate::script::{CommandLine, Script, ScriptLine};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（执行期会被降级跳过）
    Warn,
    /// 错误（会导致加载失败或引擎停机）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 剧本章节 ID / 文件路径
    pub script_id: String,
    /// 相关行 id（如果可定位）
    pub line_id: Option<String>,
    /// 诊断消息
    pub message: String,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            script_id: script_id.into(),
            line_id: None,
            message: message.into(),
        }
    }

    /// 创建警告诊断
    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            script_id: script_id.into(),
            line_id: None,
            message: message.into(),
        }
    }

    /// 设置行 id
    pub fn with_line(mut self, line_id: impl Into<String>) -> Self {
        self.line_id = Some(line_id.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line_id) = &self.line_id {
            write!(f, ":{}", line_id)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warn)
            .count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// 引擎认识的指令名
const KNOWN_COMMANDS: &[&str] = &[
    "SwitchCharacter",
    "AddCharacter",
    "RemoveCharacter",
    "TurnBg",
    "PlayBGM",
    "SwitchBGM",
    "StopBGM",
    "ShowChoice",
    "Jump",
    "EndChapter",
    "LoadNextScript",
    "InitCourtStage",
    "StopCourtStage",
    "AddEvidence",
    "CheckEvidence",
];

/// 分析剧本，返回诊断结果
///
/// 检查项：
/// - 行 id 缺失/重复（Error，加载期会拒绝）
/// - 跳转目标不存在：Jump / CheckEvidence / ShowChoice / 反驳选项（Error，执行期会停机）
/// - 未知指令、未识别的行类型、参数不足（Warn，执行期会被跳过）
/// - 含弱点的辩论回合没有任何正确选项（Warn，玩家会被困在回合里）
/// - CheckEvidence / 弱点要求的证物 id 在全剧本中从未发放（Warn）
///
/// 单文件分析无法看到跨剧本的发放/跳转，证物类检查只在本剧本内做。
pub fn analyze_script(script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    check_line_ids(script, &mut result);

    let defined_ids: HashSet<&str> = script.lines.iter().map(|l| l.id()).collect();
    let granted_evidence = collect_granted_evidence(script);

    for (index, line) in script.lines.iter().enumerate() {
        match line {
            ScriptLine::Command(l) => {
                check_command_line(script, l, &defined_ids, &granted_evidence, &mut result);
            }
            ScriptLine::Debate(l) => {
                let config = &l.debate_config;
                let has_weak = config.sentences.iter().any(|s| s.is_weak_point);
                if has_weak && !config.options.iter().any(|o| o.is_correct) {
                    result.push(
                        Diagnostic::warn(
                            &script.chapter_id,
                            "辩论回合含弱点但没有任何正确选项，玩家无法通过",
                        )
                        .with_line(&l.id),
                    );
                }

                for option in &config.options {
                    if let Some(target) = option.next_target() {
                        if !defined_ids.contains(target) {
                            result.push(
                                Diagnostic::error(
                                    &script.chapter_id,
                                    format!("反驳选项 '{}' 的跳转目标不存在: {}", option.id, target),
                                )
                                .with_line(&l.id),
                            );
                        }
                    }
                }

                for sentence in &config.sentences {
                    if let Some(id) = sentence
                        .correct_evidence_id
                        .as_deref()
                        .filter(|s| !s.is_empty())
                    {
                        if !granted_evidence.contains(id) {
                            result.push(
                                Diagnostic::warn(
                                    &script.chapter_id,
                                    format!("弱点要求的证物 '{}' 在本剧本中从未发放", id),
                                )
                                .with_line(&l.id),
                            );
                        }
                    }
                }
            }
            ScriptLine::Dialogue(_) => {}
            ScriptLine::Unknown => {
                result.push(Diagnostic::warn(
                    &script.chapter_id,
                    format!("第 {} 行的类型无法识别，执行时会被跳过", index),
                ));
            }
        }
    }

    result
}

fn check_line_ids(script: &Script, result: &mut DiagnosticResult) {
    let mut seen = HashSet::new();
    for (index, line) in script.lines.iter().enumerate() {
        if matches!(line, ScriptLine::Unknown) {
            continue;
        }
        let id = line.id();
        if id.is_empty() {
            result.push(Diagnostic::error(
                &script.chapter_id,
                format!("第 {} 行缺少 id", index),
            ));
            continue;
        }
        if !seen.insert(id) {
            result.push(
                Diagnostic::error(&script.chapter_id, format!("行 id '{}' 重复出现", id))
                    .with_line(id),
            );
        }
    }
}

/// 收集本剧本内所有可能发放的证物 id
fn collect_granted_evidence(script: &Script) -> HashSet<String> {
    let mut granted = HashSet::new();
    for line in &script.lines {
        match line {
            ScriptLine::Dialogue(l) => {
                if let Some(grant) = l.evidence_grant() {
                    granted.insert(grant.id);
                }
            }
            ScriptLine::Command(l) if l.command == "AddEvidence" => {
                if let Some(id) = l.parameters.first() {
                    granted.insert(id.clone());
                }
            }
            _ => {}
        }
    }
    granted
}

fn check_command_line(
    script: &Script,
    line: &CommandLine,
    defined_ids: &HashSet<&str>,
    granted_evidence: &HashSet<String>,
    result: &mut DiagnosticResult,
) {
    let command = line.command.as_str();
    if command.is_empty() {
        return;
    }
    if !KNOWN_COMMANDS.contains(&command) {
        result.push(
            Diagnostic::warn(&script.chapter_id, format!("未知指令: {}", command))
                .with_line(&line.id),
        );
        return;
    }

    let min_params = match command {
        "SwitchCharacter" | "AddCharacter" | "CheckEvidence" => 2,
        "RemoveCharacter" | "TurnBg" | "PlayBGM" | "SwitchBGM" | "Jump" | "LoadNextScript"
        | "ShowChoice" => 1,
        "AddEvidence" => 3,
        _ => 0,
    };
    if line.parameters.len() < min_params {
        result.push(
            Diagnostic::warn(
                &script.chapter_id,
                format!(
                    "{} 参数不足（需要至少 {} 个，实际 {} 个）",
                    command,
                    min_params,
                    line.parameters.len()
                ),
            )
            .with_line(&line.id),
        );
        return;
    }

    let mut check_target = |target: &str| {
        if !target.is_empty() && !defined_ids.contains(target) {
            result.push(
                Diagnostic::error(&script.chapter_id, format!("跳转目标不存在: {}", target))
                    .with_line(&line.id),
            );
        }
    };

    match command {
        "Jump" => check_target(&line.parameters[0]),
        "CheckEvidence" => {
            check_target(&line.parameters[1]);
            if let Some(false_target) = line.parameters.get(2) {
                check_target(false_target);
            }
            let id = &line.parameters[0];
            if !granted_evidence.contains(id) {
                result.push(
                    Diagnostic::warn(
                        &script.chapter_id,
                        format!("CheckEvidence 检查的证物 '{}' 在本剧本中从未发放", id),
                    )
                    .with_line(&line.id),
                );
            }
        }
        "ShowChoice" => {
            for param in &line.parameters {
                let choice = crate::runtime::executor::parse_choice_param(param);
                check_target(&choice.target);
            }
        }
        _ => {}
    }
}
