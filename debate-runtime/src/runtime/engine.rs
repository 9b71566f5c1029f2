//! # Engine 模块
//!
//! 剧本执行引擎：驱动整章剧本的核心类型。
//!
//! ## 执行模型
//!
//! ```text
//! tick(input) -> (Vec<Command>, WaitingReason)
//! ```
//!
//! 1. 根据 input 与当前等待状态处理输入（可能解除等待）
//! 2. 若仍在等待/已停机，直接返回
//! 3. 否则继续执行剧本直到下一个阻塞点
//! 4. 返回执行过程中产生的 Command 和新的等待状态
//!
//! ## 行的消费约定
//!
//! `state.index` 始终指向正在呈现的行；等待被解除、该行彻底消费完
//! 之后才前进或跳转。这样打字机补全、分支目标解析都可以从当前行重
//! 新取数据，不需要额外缓存。

use tracing::{error, warn};

use crate::command::{Command, Distance, Position};
use crate::error::RuntimeError;
use crate::evidence::{EvidenceRecord, EvidenceStore};
use crate::history::{History, HistoryEvent};
use crate::input::RuntimeInput;
use crate::runtime::debate::{DebateEngine, DebateStep};
use crate::runtime::executor::{self, CommandFlow};
use crate::script::{DebateLine, DialogueLine, Script, ScriptLine};
use crate::state::{ExecutionState, WaitingReason};

/// 剧本执行引擎
///
/// # 使用示例
///
/// ```ignore
/// let script = Script::parse(&json)?;
/// let mut engine = ScriptEngine::new(script);
///
/// loop {
///     let (commands, waiting) = engine.tick(input)?;
///
///     // Host 执行 commands...
///
///     // 根据 waiting 采集输入...
/// }
/// ```
pub struct ScriptEngine {
    /// 当前剧本
    script: Script,
    /// 执行状态
    state: ExecutionState,
    /// 辩论子引擎
    debate: DebateEngine,
    /// 证物背包（跨章存续）
    evidence: EvidenceStore,
    /// 历史记录（跨章存续）
    history: History,
}

impl ScriptEngine {
    /// 创建新的引擎实例，从剧本第 0 行开始
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: ExecutionState::new(),
            debate: DebateEngine::new(),
            evidence: EvidenceStore::new(),
            history: History::new(),
        }
    }

    /// 切换剧本
    ///
    /// 执行状态整体重建，进行中的辩论回合被取消；
    /// 证物背包和历史记录跨章存续。
    ///
    /// 引擎发出 [`Command::RequestScript`] 后进入 `WaitForScript`，
    /// Host 解析完新剧本后调用本方法交付；也可用于停机后的热修复重载。
    pub fn load_script(&mut self, script: Script) {
        self.script = script;
        self.state = ExecutionState::new();
        self.debate.stop();
    }

    /// 核心驱动函数
    ///
    /// 根据输入推进剧本执行，返回产生的 Command 和新的等待状态。
    /// `input` 为 None 表示无输入驱动（首次启动，或 `WaitForTime` 到时）。
    pub fn tick(
        &mut self,
        input: Option<RuntimeInput>,
    ) -> Result<(Vec<Command>, WaitingReason), RuntimeError> {
        let mut commands = Vec::new();

        if self.state.halted {
            return Ok((commands, WaitingReason::None));
        }

        // 1. 处理输入，尝试解除等待
        match input {
            Some(input) => self.handle_input(input, &mut commands)?,
            None => {
                // WaitForTime 由 Host 计时，到时后用 tick(None) 通知
                if matches!(self.state.waiting, WaitingReason::WaitForTime(_)) {
                    if self.debate.is_active() {
                        let step = self.debate.on_time_elapsed();
                        self.apply_debate_step(step, &mut commands);
                    } else {
                        self.state.clear_wait();
                        self.state.advance();
                    }
                }
            }
        }

        // 输入处理期间可能停机（跳转目标缺失）
        if self.state.halted {
            return Ok((commands, WaitingReason::None));
        }

        // 2. 仍在等待则直接返回
        if self.state.waiting.is_waiting() {
            return Ok((commands, self.state.waiting.clone()));
        }

        // 3. 继续执行剧本直到阻塞或结束
        loop {
            if self.state.finished {
                return Ok((commands, WaitingReason::None));
            }

            let Some(line) = self.script.get(self.state.index) else {
                // 顺序执行越过末行，本章结束
                self.state.finished = true;
                return Ok((commands, WaitingReason::None));
            };
            let line = line.clone();

            match line {
                ScriptLine::Dialogue(l) => {
                    self.dispatch_dialogue(&l, &mut commands);
                    return Ok((commands, self.state.waiting.clone()));
                }
                ScriptLine::Debate(l) => {
                    self.dispatch_debate(&l, &mut commands);
                    return Ok((commands, self.state.waiting.clone()));
                }
                ScriptLine::Unknown => {
                    // 手写剧本里的坏 type 值不应打断演出，跳过该行继续
                    warn!(index = self.state.index, "未识别的行类型，跳过");
                    self.state.advance();
                    continue;
                }
                ScriptLine::Command(l) => {
                    let result = executor::execute_command(
                        &l,
                        &self.script,
                        self.state.index,
                        &mut self.state,
                        &mut self.evidence,
                    );
                    for cmd in &result.commands {
                        self.record_history(cmd);
                    }
                    commands.extend(result.commands);

                    match result.flow {
                        CommandFlow::Advance => {
                            self.state.advance();
                            continue;
                        }
                        CommandFlow::Jump(target) => {
                            self.jump_or_halt(&target);
                            if self.state.halted {
                                return Ok((commands, WaitingReason::None));
                            }
                            continue;
                        }
                        CommandFlow::Wait(reason) => {
                            self.state.wait(reason.clone());
                            return Ok((commands, reason));
                        }
                        CommandFlow::Finish => {
                            self.state.finished = true;
                            return Ok((commands, WaitingReason::None));
                        }
                        CommandFlow::LoadScript(filename) => {
                            let reason = WaitingReason::script(filename);
                            self.state.wait(reason.clone());
                            return Ok((commands, reason));
                        }
                    }
                }
            }
        }
    }

    /// 处理输入，尝试解除等待状态
    ///
    /// 推进类输入（点击、各种播放完毕信号）落在不匹配的状态时静默忽略，
    /// 用户连点不应产生错误；带索引的选择类输入落错状态则说明 Host 的
    /// 界面状态和引擎脱节了，作为错误上报。
    fn handle_input(
        &mut self,
        input: RuntimeInput,
        commands: &mut Vec<Command>,
    ) -> Result<(), RuntimeError> {
        match (&self.state.waiting, input) {
            // 打字中点击 = 跳过动画，补全文本后转入等待点击
            (WaitingReason::WaitForTyping, RuntimeInput::Click) => {
                if let Some(ScriptLine::Dialogue(l)) = self.script.get(self.state.index) {
                    commands.push(Command::CompleteTyping {
                        text: l.text.clone(),
                    });
                }
                self.finish_typing(commands);
                Ok(())
            }

            // 打字机自然结束
            (WaitingReason::WaitForTyping, RuntimeInput::TypingFinished) => {
                self.finish_typing(commands);
                Ok(())
            }

            // 等待点击时点击 = 消费当前行，前进
            (WaitingReason::WaitForClick, RuntimeInput::Click) => {
                self.state.clear_wait();
                self.state.advance();
                Ok(())
            }

            // 分支选择
            (
                WaitingReason::WaitForChoice { choice_count },
                RuntimeInput::ChoiceSelected { index },
            ) => {
                if index >= *choice_count {
                    return Err(RuntimeError::InvalidChoiceIndex {
                        index,
                        max: *choice_count,
                    });
                }
                self.resolve_choice(index);
                Ok(())
            }

            // 言弹语音播放结束
            (WaitingReason::WaitForVoice, RuntimeInput::VoiceFinished) => {
                let step = self.debate.on_voice_finished();
                self.apply_debate_step(step, commands);
                Ok(())
            }

            // 弱点点击：播放中与句间停顿中都有效
            (
                WaitingReason::WaitForVoice | WaitingReason::WaitForTime(_),
                RuntimeInput::WeakPointClicked,
            ) => {
                let step = self.debate.on_weak_point();
                self.apply_debate_step(step, commands);
                Ok(())
            }

            // 反驳选项的选定/取消（越界索引由辩论引擎按取消处理）
            (WaitingReason::WaitForOption { .. }, RuntimeInput::OptionSelected { index }) => {
                let step = self.debate.on_option(Some(index));
                self.apply_debate_step(step, commands);
                Ok(())
            }
            (WaitingReason::WaitForOption { .. }, RuntimeInput::OptionCancelled) => {
                let step = self.debate.on_option(None);
                self.apply_debate_step(step, commands);
                Ok(())
            }

            // 等待剧本交付期间，一切输入无效
            (WaitingReason::WaitForScript { .. }, _) => Ok(()),

            // 带索引的输入落错状态：Host 界面与引擎脱节
            (
                waiting,
                input @ (RuntimeInput::ChoiceSelected { .. }
                | RuntimeInput::OptionSelected { .. }
                | RuntimeInput::OptionCancelled),
            ) => Err(RuntimeError::StateMismatch {
                expected: format!("{waiting:?}"),
                actual: format!("{input:?}"),
            }),

            // 其余推进类输入落错状态：忽略（连点、迟到的播放完毕信号）
            (_, _) => Ok(()),
        }
    }

    /// 打字机结束（自然结束或被跳过），发放附带证物并转入等待点击
    ///
    /// `take_grant` 保证两条路径最多只有一条真正发放。
    fn finish_typing(&mut self, commands: &mut Vec<Command>) {
        if let Some(grant) = self.state.take_grant() {
            let record = EvidenceRecord::from(grant);
            let (id, title) = (record.id.clone(), record.title.clone());
            if self.evidence.add(record) {
                let cmd = Command::EvidenceAdded { id, title };
                self.record_history(&cmd);
                commands.push(cmd);
            }
        }
        self.state.wait(WaitingReason::click());
    }

    /// 按选定的索引解析分支跳转
    ///
    /// 目标从当前 ShowChoice 行的参数重新解析，不额外缓存。
    fn resolve_choice(&mut self, index: usize) {
        let Some(ScriptLine::Command(line)) = self.script.get(self.state.index) else {
            // WaitForChoice 只会在 ShowChoice 行上建立
            warn!(index = self.state.index, "等待分支选择时当前行不是指令行");
            self.state.clear_wait();
            self.state.advance();
            return;
        };

        let choices: Vec<_> = line
            .parameters
            .iter()
            .map(|p| executor::parse_choice_param(p))
            .collect();
        self.history.push(HistoryEvent::choice_made(
            choices.iter().map(|c| c.text.clone()).collect(),
            index,
        ));

        let target = choices
            .get(index)
            .map(|c| c.target.clone())
            .unwrap_or_default();

        self.state.clear_wait();
        if target.is_empty() {
            self.state.advance();
        } else {
            self.jump_or_halt(&target);
        }
    }

    /// 把辩论子引擎的单步结果合并进执行状态
    fn apply_debate_step(&mut self, step: DebateStep, commands: &mut Vec<Command>) {
        for cmd in &step.commands {
            self.record_history(cmd);
        }
        commands.extend(step.commands);

        if let Some(outcome) = step.outcome {
            // 回合已裁决，辩论行消费完毕
            self.state.clear_wait();
            match outcome.next_line_id {
                Some(target) => self.jump_or_halt(&target),
                None => self.state.advance(),
            }
            return;
        }

        if let Some(reason) = step.waiting {
            self.state.wait(reason);
        }
    }

    /// 呈现一条对话行，进入打字机等待
    fn dispatch_dialogue(&mut self, line: &DialogueLine, commands: &mut Vec<Command>) {
        commands.push(Command::EnterDialogueMode);
        self.push_portrait(&line.portrait, &line.position, &line.distance, commands);
        if !line.voice.is_empty() {
            commands.push(Command::PlayVoice {
                path: self.script.voice_path(&line.voice),
            });
        }

        let speaker = (!line.speaker.is_empty()).then(|| line.speaker.clone());
        let cmd = Command::ShowDialogue {
            speaker,
            text: line.text.clone(),
        };
        self.record_history(&cmd);
        commands.push(cmd);

        self.state.pending_grant = line.evidence_grant();
        self.state.wait(WaitingReason::typing());
    }

    /// 呈现一条辩论行，启动辩论回合
    fn dispatch_debate(&mut self, line: &DebateLine, commands: &mut Vec<Command>) {
        commands.push(Command::EnterDebateMode {
            time_limit: line.debate_config.time_limit,
        });
        self.push_portrait(&line.portrait, &line.position, "", commands);
        if !line.voice.is_empty() {
            commands.push(Command::PlayVoice {
                path: self.script.voice_path(&line.voice),
            });
        }

        let step = self.debate.start(line.debate_config.clone());
        self.apply_debate_step(step, commands);
    }

    /// 行内立绘字段的分发
    ///
    /// 全景动画进行中时改走卷轴更新路径；位置/距离是手写字符串，
    /// 坏值降级为默认值而不是丢弃整行。
    fn push_portrait(
        &mut self,
        portrait: &str,
        position: &str,
        distance: &str,
        commands: &mut Vec<Command>,
    ) {
        if portrait.is_empty() {
            return;
        }

        if self.state.court_stage_active {
            commands.push(Command::UpdateStagePortrait {
                path: portrait.to_string(),
            });
            return;
        }

        let position = Position::parse(position).unwrap_or_else(|| {
            if !position.is_empty() {
                warn!(position, "无法识别的立绘位置，使用中央");
            }
            Position::Center
        });
        let distance = distance.parse::<Distance>().unwrap_or_default();
        commands.push(Command::SetPortrait {
            position,
            path: portrait.to_string(),
            distance,
        });
    }

    /// 跳转到指定行 id；目标不存在则停机
    ///
    /// 停机是刻意保守的选择：跳转目标缺失意味着剧本数据坏了，
    /// 继续顺序执行会把玩家带进毫不相干的剧情。
    fn jump_or_halt(&mut self, target: &str) {
        match self.script.find_line(target) {
            Some(index) => {
                self.state.jump_to(index);
                self.state.clear_wait();
            }
            None => {
                error!(target, "跳转目标不存在，引擎停机");
                self.state.halt();
            }
        }
    }

    /// 根据 Command 记录历史事件
    fn record_history(&mut self, cmd: &Command) {
        match cmd {
            Command::ShowDialogue { speaker, text } => {
                self.history
                    .push(HistoryEvent::dialogue(speaker.clone(), text.clone()));
            }
            Command::ShowDebateSentence { text, .. } => {
                self.history.push(HistoryEvent::debate_sentence(text.clone()));
            }
            Command::EvidenceAdded { id, title } => {
                self.history
                    .push(HistoryEvent::evidence_gained(id.clone(), title.clone()));
            }
            // 其他指令不记录历史（立绘、BGM 等临时状态）
            _ => {}
        }
    }

    /// 放弃当前行，强制前进到下一行（调试/跳过控制）
    ///
    /// 进行中的辩论回合会被取消。之后需要 tick 才会执行新行。
    pub fn next_line(&mut self) {
        if self.state.halted || self.state.finished {
            return;
        }
        self.debate.stop();
        self.state.pending_grant = None;
        self.state.clear_wait();
        self.state.advance();
    }

    /// 强制跳转到指定行 id（调试/章节选择）
    ///
    /// 目标不存在时与剧本内跳转一样停机。
    pub fn jump_to_line(&mut self, id: &str) {
        if self.state.halted || self.state.finished {
            return;
        }
        self.debate.stop();
        self.state.pending_grant = None;
        self.jump_or_halt(id);
    }

    /// 获取当前执行状态（只读）
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// 获取当前等待状态
    pub fn waiting(&self) -> &WaitingReason {
        &self.state.waiting
    }

    /// 本章是否执行完毕
    pub fn is_finished(&self) -> bool {
        self.state.finished
            || (self.state.index >= self.script.len() && !self.state.waiting.is_waiting())
    }

    /// 引擎是否已停机
    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// 获取证物背包（只读）
    pub fn evidence(&self) -> &EvidenceStore {
        &self.evidence
    }

    /// 获取历史记录
    pub fn history(&self) -> &History {
        &self.history
    }

    /// 获取当前行（只读）
    pub fn current_line(&self) -> Option<&ScriptLine> {
        self.script.get(self.state.index)
    }

    /// 获取当前剧本（只读）
    pub fn script(&self) -> &Script {
        &self.script
    }
}
