//! # Executor 模块
//!
//! 指令行的执行：把剧本中的 `command` 行翻译成 Host 指令与流程走向。
//!
//! ## 容错约定
//!
//! 剧本是手写内容，参数缺失、指令名拼错都不应让整章停摆：
//! 无法执行的指令一律记录警告并跳过（顺序前进）。
//! 唯一的例外是跳转目标缺失，那是在 [`engine`] 层停机处理的。
//!
//! [`engine`]: crate::runtime::engine

use std::str::FromStr;
use tracing::{debug, warn};

use crate::command::{Choice, Command, Distance, Position, StagePlacement};
use crate::evidence::{EvidenceRecord, EvidenceStore};
use crate::script::{CharacterPlacement, CommandLine, EvidenceGrant, Script, ScriptLine};
use crate::state::{ExecutionState, WaitingReason};

/// 指令执行后的流程走向
#[derive(Debug, Clone, PartialEq)]
pub enum CommandFlow {
    /// 顺序前进到下一行
    Advance,
    /// 跳转到指定行 id
    Jump(String),
    /// 进入等待状态（当前行视为已消费）
    Wait(WaitingReason),
    /// 本章结束
    Finish,
    /// 请求 Host 加载新剧本
    LoadScript(String),
}

/// 指令执行结果
#[derive(Debug)]
pub struct CommandResult {
    /// 发往 Host 的指令
    pub commands: Vec<Command>,
    /// 流程走向
    pub flow: CommandFlow,
}

impl CommandResult {
    fn advance(commands: Vec<Command>) -> Self {
        Self {
            commands,
            flow: CommandFlow::Advance,
        }
    }

    /// 参数不合法时的降级路径：警告已由调用处记录，跳过本行
    fn skip() -> Self {
        Self::advance(Vec::new())
    }
}

/// 执行一条指令行
///
/// `index` 是该行在剧本中的索引（法庭全景的立绘前瞻需要）。
pub fn execute_command(
    line: &CommandLine,
    script: &Script,
    index: usize,
    state: &mut ExecutionState,
    evidence: &mut EvidenceStore,
) -> CommandResult {
    match line.command.as_str() {
        // 空指令行是内容组里常用的注释占位
        "" => CommandResult::skip(),

        "SwitchCharacter" | "AddCharacter" => switch_character(line),
        "RemoveCharacter" => remove_character(line),
        "TurnBg" => turn_bg(line),
        "PlayBGM" => play_bgm(line, false),
        "SwitchBGM" => play_bgm(line, true),
        "StopBGM" => CommandResult::advance(vec![Command::StopBgm]),
        "ShowChoice" => show_choice(line),
        "Jump" => jump(line),
        "EndChapter" => CommandResult {
            commands: Vec::new(),
            flow: CommandFlow::Finish,
        },
        "LoadNextScript" => load_next_script(line),
        "InitCourtStage" => init_court_stage(line, script, index, state),
        "StopCourtStage" => {
            state.court_stage_active = false;
            CommandResult::advance(vec![Command::StopCourtStage])
        }
        "AddEvidence" => add_evidence(line, evidence),
        "CheckEvidence" => check_evidence(line, evidence),

        other => {
            warn!(line = %line.id, command = %other, "未知指令，跳过");
            CommandResult::skip()
        }
    }
}

fn switch_character(line: &CommandLine) -> CommandResult {
    let [position, path, rest @ ..] = line.parameters.as_slice() else {
        warn!(line = %line.id, "SwitchCharacter 参数不足（需要位置和立绘路径）");
        return CommandResult::skip();
    };

    let Ok(position) = Position::from_str(position) else {
        warn!(line = %line.id, position = %position, "无法识别的立绘位置");
        return CommandResult::skip();
    };

    let distance = rest
        .first()
        .and_then(|s| Distance::from_str(s).ok())
        .unwrap_or_default();

    CommandResult::advance(vec![Command::SetPortrait {
        position,
        path: path.clone(),
        distance,
    }])
}

fn remove_character(line: &CommandLine) -> CommandResult {
    let Some(position) = line.parameters.first() else {
        warn!(line = %line.id, "RemoveCharacter 缺少位置参数");
        return CommandResult::skip();
    };
    let Ok(position) = Position::from_str(position) else {
        warn!(line = %line.id, position = %position, "无法识别的立绘位置");
        return CommandResult::skip();
    };

    CommandResult::advance(vec![Command::ClearPortrait { position }])
}

fn turn_bg(line: &CommandLine) -> CommandResult {
    let Some(path) = line.parameters.first() else {
        warn!(line = %line.id, "TurnBg 缺少背景路径参数");
        return CommandResult::skip();
    };

    CommandResult::advance(vec![Command::SetBackground { path: path.clone() }])
}

fn play_bgm(line: &CommandLine, switch: bool) -> CommandResult {
    let Some(raw) = line.parameters.first() else {
        warn!(line = %line.id, "PlayBGM/SwitchBGM 缺少曲目索引参数");
        return CommandResult::skip();
    };
    let Ok(index) = raw.parse::<usize>() else {
        warn!(line = %line.id, index = %raw, "BGM 曲目索引不是数字");
        return CommandResult::skip();
    };

    let cmd = if switch {
        Command::SwitchBgm { index }
    } else {
        Command::PlayBgm { index }
    };
    CommandResult::advance(vec![cmd])
}

/// 解析 `"文本|跳转ID"` 形式的选项参数
///
/// 没有 `|` 时整段视为文本，跳转目标为空（选定后顺序前进）。
pub fn parse_choice_param(param: &str) -> Choice {
    match param.split_once('|') {
        Some((text, target)) => Choice {
            text: text.to_string(),
            target: target.to_string(),
        },
        None => Choice {
            text: param.to_string(),
            target: String::new(),
        },
    }
}

fn show_choice(line: &CommandLine) -> CommandResult {
    if line.parameters.is_empty() {
        warn!(line = %line.id, "ShowChoice 没有任何选项");
        return CommandResult::skip();
    }

    let choices: Vec<Choice> = line.parameters.iter().map(|p| parse_choice_param(p)).collect();
    let count = choices.len();

    CommandResult {
        commands: vec![Command::PresentChoices { choices }],
        flow: CommandFlow::Wait(WaitingReason::choice(count)),
    }
}

fn jump(line: &CommandLine) -> CommandResult {
    let Some(target) = line.parameters.first().filter(|t| !t.is_empty()) else {
        warn!(line = %line.id, "Jump 缺少目标行 id");
        return CommandResult::skip();
    };

    CommandResult {
        commands: Vec::new(),
        flow: CommandFlow::Jump(target.clone()),
    }
}

fn load_next_script(line: &CommandLine) -> CommandResult {
    let Some(filename) = line.parameters.first().filter(|f| !f.is_empty()) else {
        warn!(line = %line.id, "LoadNextScript 缺少剧本文件名");
        return CommandResult::skip();
    };

    CommandResult {
        commands: vec![Command::RequestScript {
            filename: filename.clone(),
        }],
        flow: CommandFlow::LoadScript(filename.clone()),
    }
}

fn init_court_stage(
    line: &CommandLine,
    script: &Script,
    index: usize,
    state: &mut ExecutionState,
) -> CommandResult {
    // 结构化的 courtStageDef 优先；老剧本只在 parameters 里写角色名
    let defs: Vec<CharacterPlacement> = if line.court_stage_def.is_empty() {
        line.parameters
            .iter()
            .map(|name| CharacterPlacement {
                name: name.clone(),
                ..Default::default()
            })
            .collect()
    } else {
        line.court_stage_def.clone()
    };

    if defs.is_empty() {
        warn!(line = %line.id, "InitCourtStage 没有配置任何角色");
        return CommandResult::skip();
    }

    let placements = defs
        .iter()
        .map(|def| StagePlacement {
            portrait: resolve_stage_portrait(script, index, &def.name),
            custom_pos: def.use_custom_pos.then_some((def.x, def.y)),
        })
        .collect();

    state.court_stage_active = true;
    CommandResult::advance(vec![Command::InitCourtStage { placements }])
}

/// 前瞻扫描解析角色在全景动画中的初始立绘
///
/// 从 `index` 之后扫到 StopCourtStage（或剧本末尾），取第一个
/// 立绘路径以 `{name}/` 开头的对话/辩论行。找不到时回退到
/// 默认立绘 `{name}/{name}_Default`。
fn resolve_stage_portrait(script: &Script, index: usize, name: &str) -> String {
    let prefix = format!("{name}/");

    for line in script.lines.iter().skip(index + 1) {
        let portrait = match line {
            ScriptLine::Dialogue(l) => l.portrait.as_str(),
            ScriptLine::Debate(l) => l.portrait.as_str(),
            ScriptLine::Command(l) => {
                if l.command == "StopCourtStage" {
                    break;
                }
                continue;
            }
            ScriptLine::Unknown => continue,
        };
        if portrait.starts_with(&prefix) || portrait == name {
            return portrait.to_string();
        }
    }

    debug!(name, "全景段落内未出现该角色的立绘，使用默认立绘");
    format!("{name}/{name}_Default")
}

fn add_evidence(line: &CommandLine, evidence: &mut EvidenceStore) -> CommandResult {
    let [id, title, description, rest @ ..] = line.parameters.as_slice() else {
        warn!(line = %line.id, "AddEvidence 参数不足（需要 id、标题、描述）");
        return CommandResult::skip();
    };

    let grant = EvidenceGrant {
        id: id.clone(),
        title: title.clone(),
        description: description.clone(),
        icon: rest.first().cloned().unwrap_or_default(),
    };
    let record = EvidenceRecord::from(grant);
    let (id, title) = (record.id.clone(), record.title.clone());

    // 重复入包不报错，但也不重复通知 Host
    let mut commands = Vec::new();
    if evidence.add(record) {
        commands.push(Command::EvidenceAdded { id, title });
    }
    CommandResult::advance(commands)
}

fn check_evidence(line: &CommandLine, evidence: &EvidenceStore) -> CommandResult {
    let [id, true_target, rest @ ..] = line.parameters.as_slice() else {
        warn!(line = %line.id, "CheckEvidence 参数不足（需要 id 和拥有时的跳转目标）");
        return CommandResult::skip();
    };

    if evidence.has(id) {
        // 空目标与缺省 false 分支同义：顺序前进
        if true_target.is_empty() {
            return CommandResult::skip();
        }
        return CommandResult {
            commands: Vec::new(),
            flow: CommandFlow::Jump(true_target.clone()),
        };
    }

    match rest.first().filter(|t| !t.is_empty()) {
        Some(false_target) => CommandResult {
            commands: Vec::new(),
            flow: CommandFlow::Jump(false_target.clone()),
        },
        // 未拥有且无 false 分支：什么都不发生，顺序前进
        None => CommandResult::skip(),
    }
}
