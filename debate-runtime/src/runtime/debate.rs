//! # Debate 模块
//!
//! 辩论回合的子状态机：按语音节拍依次播放言弹、检测弱点命中、
//! 暂停弹出反驳选项并裁决本回合结果。
//!
//! ## 状态转换
//!
//! ```text
//! Presenting(i) ──语音结束──► AwaitingVoiceEnd(i) ──停顿结束──► Presenting(i+1)
//!      │                           │
//!      └────弱点点击（仅弱点句）────┴──► Paused ──选项──► Resolved / 重播第 0 句
//! ```
//!
//! ## 裁决规则
//!
//! - 全部句子播完且未命中弱点 → 回合成功，无跳转目标（顺序前进）
//! - 正确选项 → 回合成功，跳转到选项的 nextLineId
//! - 错误选项但配置了 nextLineId → 同样按"流程上的成功跳转"结束
//!   （用于剧情化的失败分支）
//! - 错误选项且无 nextLineId、取消、索引越界 → 从第 0 句重新开始本回合
//!   （不是从当前句恢复，内容设计依赖此行为）

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::script::DebateRoundConfig;
use crate::state::WaitingReason;

/// 语音结束后推进下一句前的额外停顿
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// 空回合（无句子）的占位停顿
pub const EMPTY_ROUND_DELAY: Duration = Duration::from_secs(1);

/// 弱点词的高亮颜色标签
const WEAK_COLOR: &str = "#FF55AA";

/// 辩论回合所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebatePhase {
    /// 当前句展示中，语音播放中
    Presenting,
    /// 语音已结束，停顿缓冲中
    AwaitingVoiceEnd,
    /// 弱点命中，时间冻结，选项面板打开
    Paused,
}

/// 一个进行中的辩论回合
///
/// 回合存活期间由 [`DebateEngine`] 独占持有，裁决后销毁。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    /// 回合配置
    pub config: DebateRoundConfig,
    /// 当前句索引
    pub sentence_index: usize,
    /// 当前阶段
    pub phase: DebatePhase,
}

/// 回合裁决结果
///
/// 原型接口是 `onFinished(success, nextLineId)` 回调；这里以返回值表达。
/// 重新开始不产生裁决（回合继续），所以所有对外可见的裁决都是 success。
#[derive(Debug, Clone, PartialEq)]
pub struct DebateOutcome {
    /// 流程上是否成功（当前恒为 true，失败一律在回合内部重播）
    pub success: bool,
    /// 跳转目标行 id（None 表示顺序前进）
    pub next_line_id: Option<String>,
}

/// 单步推进的结果
#[derive(Debug, Default)]
pub struct DebateStep {
    /// 产生的指令
    pub commands: Vec<Command>,
    /// 新的等待状态（None 表示维持现状）
    pub waiting: Option<WaitingReason>,
    /// 回合裁决（Some 时回合已销毁）
    pub outcome: Option<DebateOutcome>,
}

impl DebateStep {
    /// 输入被忽略（弱点点击落在非弱点句等），一切维持现状
    fn ignored() -> Self {
        Self::default()
    }
}

/// 辩论引擎
///
/// 驱动方（ScriptEngine 或自定义 Host）在收到对应输入时调用
/// `on_*` 方法，按返回的 [`DebateStep`] 更新等待状态并转发指令。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateEngine {
    /// 进行中的回合（None 表示空闲）
    round: Option<DebateRound>,
}

impl DebateEngine {
    /// 创建空闲的辩论引擎
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否有回合进行中
    pub fn is_active(&self) -> bool {
        self.round.is_some()
    }

    /// 当前回合（只读）
    pub fn round(&self) -> Option<&DebateRound> {
        self.round.as_ref()
    }

    /// 强制终止当前回合（切换剧本等外部取消）
    ///
    /// 取消不产生裁决；半途的回合不会留下任何待发放的副作用。
    pub fn stop(&mut self) {
        if self.round.take().is_some() {
            debug!("辩论回合被外部取消");
        }
    }

    /// 开始一个新的辩论回合
    ///
    /// 已有回合进行中时直接替换（等价于取消旧回合）。
    pub fn start(&mut self, config: DebateRoundConfig) -> DebateStep {
        if config.sentences.is_empty() {
            // 没有句子，仅作为占位符停顿一拍后自动成功
            debug!("辩论回合无句子，按占位符处理");
            self.round = Some(DebateRound {
                config,
                sentence_index: 0,
                phase: DebatePhase::AwaitingVoiceEnd,
            });
            return DebateStep {
                commands: Vec::new(),
                waiting: Some(WaitingReason::time(EMPTY_ROUND_DELAY)),
                outcome: None,
            };
        }

        let round = DebateRound {
            config,
            sentence_index: 0,
            phase: DebatePhase::Presenting,
        };
        let step = Self::present(&round);
        self.round = Some(round);
        step
    }

    /// 当前句的语音播放结束
    ///
    /// 进入句间停顿；停顿结束（Host 等待 [`SETTLE_DELAY`] 后 tick）再推进下一句。
    pub fn on_voice_finished(&mut self) -> DebateStep {
        let Some(round) = self.round.as_mut() else {
            return DebateStep::ignored();
        };
        if round.phase != DebatePhase::Presenting {
            return DebateStep::ignored();
        }

        round.phase = DebatePhase::AwaitingVoiceEnd;
        DebateStep {
            commands: Vec::new(),
            waiting: Some(WaitingReason::time(SETTLE_DELAY)),
            outcome: None,
        }
    }

    /// 句间停顿结束，推进下一句或裁决回合
    pub fn on_time_elapsed(&mut self) -> DebateStep {
        let Some(round) = self.round.as_mut() else {
            return DebateStep::ignored();
        };
        if round.phase != DebatePhase::AwaitingVoiceEnd {
            return DebateStep::ignored();
        }

        round.sentence_index += 1;
        if round.sentence_index >= round.config.sentences.len() {
            // 所有句子播放完毕，且没有被弱点打断，自动成功
            info!("辩论回合播放完毕，未触发弱点");
            self.round = None;
            return DebateStep {
                commands: Vec::new(),
                waiting: None,
                outcome: Some(DebateOutcome {
                    success: true,
                    next_line_id: None,
                }),
            };
        }

        round.phase = DebatePhase::Presenting;
        Self::present(round)
    }

    /// 玩家点中了弱点词
    ///
    /// 仅当当前句标记了弱点且处于播放/停顿阶段时命中；
    /// 其余情况（非弱点句不存在可点击区域）直接忽略。
    pub fn on_weak_point(&mut self) -> DebateStep {
        let Some(round) = self.round.as_mut() else {
            return DebateStep::ignored();
        };
        if !matches!(
            round.phase,
            DebatePhase::Presenting | DebatePhase::AwaitingVoiceEnd
        ) {
            return DebateStep::ignored();
        }

        let Some(sentence) = round.config.sentences.get(round.sentence_index) else {
            return DebateStep::ignored();
        };
        if !sentence.is_weak_point {
            return DebateStep::ignored();
        }

        info!(sentence = %sentence.id, "击中弱点");
        round.phase = DebatePhase::Paused;

        // 冻结全局时间，防止任何并发计时在暂停期间推进
        let options: Vec<String> = round.config.options.iter().map(|o| o.text.clone()).collect();
        let option_count = options.len();
        DebateStep {
            commands: vec![
                Command::SetTimeScale { scale: 0.0 },
                Command::ShowOptions { options },
            ],
            waiting: Some(WaitingReason::option(option_count)),
            outcome: None,
        }
    }

    /// 玩家选定/取消了反驳选项
    ///
    /// - `Some(index)`：选定了第 index 项（越界按取消处理）
    /// - `None`：取消（点击面板外关闭）
    pub fn on_option(&mut self, index: Option<usize>) -> DebateStep {
        let Some(round) = self.round.as_mut() else {
            return DebateStep::ignored();
        };
        if round.phase != DebatePhase::Paused {
            return DebateStep::ignored();
        }

        let mut commands = vec![
            Command::SetTimeScale { scale: 1.0 },
            Command::HideOptions,
        ];

        let picked = index.and_then(|i| {
            if i >= round.config.options.len() {
                warn!(index = i, "反驳选项索引越界，按取消处理");
                return None;
            }
            Some(i)
        });

        match picked {
            Some(i) => {
                let option = &round.config.options[i];
                let target = option.next_target().map(str::to_string);

                if option.is_correct {
                    info!(option = %option.id, "反驳正确");
                    self.round = None;
                    return DebateStep {
                        commands,
                        waiting: None,
                        outcome: Some(DebateOutcome {
                            success: true,
                            next_line_id: target,
                        }),
                    };
                }

                if target.is_some() {
                    // 错误选项配置了跳转：按流程上的成功跳转结束，
                    // 通常用于展示答错后的剧情对话
                    info!(option = %option.id, "反驳错误，走剧情失败分支");
                    self.round = None;
                    return DebateStep {
                        commands,
                        waiting: None,
                        outcome: Some(DebateOutcome {
                            success: true,
                            next_line_id: target,
                        }),
                    };
                }

                info!(option = %option.id, "反驳错误，重新开始本回合");
            }
            None => {
                debug!("未做选择，重新开始本回合");
            }
        }

        // 从第 0 句重播整个回合
        round.sentence_index = 0;
        round.phase = DebatePhase::Presenting;
        let mut step = Self::present(round);
        commands.append(&mut step.commands);
        step.commands = commands;
        step
    }

    /// 发出当前句的展示指令
    fn present(round: &DebateRound) -> DebateStep {
        let index = round.sentence_index;
        let sentence = &round.config.sentences[index];

        DebateStep {
            commands: vec![Command::ShowDebateSentence {
                index,
                text: weak_point_markup(&sentence.text, sentence.is_weak_point),
                weak_point: sentence.is_weak_point,
            }],
            waiting: Some(WaitingReason::voice()),
            outcome: None,
        }
    }
}

/// 为弱点句生成富文本标记
///
/// - 文本中已手写 `<link="weak">` 标记时，只在标记内注入高亮颜色
/// - 否则整句包裹为弱点
/// - 非弱点句原样返回
pub fn weak_point_markup(text: &str, is_weak_point: bool) -> String {
    if !is_weak_point {
        return text.to_string();
    }

    if text.contains("<link=\"weak\">") {
        text.replace(
            "<link=\"weak\">",
            &format!("<link=\"weak\"><color={WEAK_COLOR}>"),
        )
        .replace("</link>", "</color></link>")
    } else {
        format!("<link=\"weak\"><color={WEAK_COLOR}>{text}</color></link>")
    }
}
