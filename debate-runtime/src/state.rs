//! # State 模块
//!
//! 定义执行引擎的运行时状态和等待模型。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**且**可序列化**
//! - `ExecutionState` 由执行引擎独占持有，外部只读
//! - 不允许隐式全局状态

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::script::EvidenceGrant;

/// 等待原因
///
/// Runtime 在执行过程中可能进入等待状态，需要特定输入才能继续。
/// Host 根据此状态决定如何采集输入。
///
/// # 状态转换
///
/// ```text
/// None          -> 继续执行，不等待
/// WaitForTyping -> 打字机动画进行中；Click = 跳过，TypingFinished = 自然结束
/// WaitForClick  -> 等待用户点击推进
/// WaitForChoice -> 等待用户在分支界面做选择
/// WaitForVoice  -> 辩论言弹语音播放中，收到 VoiceFinished 后继续
/// WaitForTime   -> Host 等待指定时长后调用 tick(None)
/// WaitForOption -> 辩论暂停中，等待反驳选项的选定/取消
/// WaitForScript -> 等待 Host 加载并交付下一个剧本
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum WaitingReason {
    /// 不等待，继续执行
    #[default]
    None,

    /// 打字机动画进行中
    WaitForTyping,

    /// 等待用户点击
    WaitForClick,

    /// 等待用户选择分支
    ///
    /// `choice_count` 记录选项数量，用于验证输入合法性
    WaitForChoice { choice_count: usize },

    /// 等待言弹语音播放结束
    WaitForVoice,

    /// 等待指定时长
    ///
    /// Host 获取此状态后，等待指定时长再调用 tick。
    /// Runtime 不需要知道真实时间流逝。
    WaitForTime(Duration),

    /// 等待反驳选项的选定/取消
    WaitForOption { option_count: usize },

    /// 等待 Host 加载下一个剧本
    WaitForScript { filename: String },
}

impl WaitingReason {
    /// 是否处于等待状态
    pub fn is_waiting(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// 创建等待点击状态
    pub fn click() -> Self {
        Self::WaitForClick
    }

    /// 创建等待打字机状态
    pub fn typing() -> Self {
        Self::WaitForTyping
    }

    /// 创建等待分支选择状态
    pub fn choice(count: usize) -> Self {
        Self::WaitForChoice {
            choice_count: count,
        }
    }

    /// 创建等待语音状态
    pub fn voice() -> Self {
        Self::WaitForVoice
    }

    /// 创建等待时间状态
    pub fn time(duration: Duration) -> Self {
        Self::WaitForTime(duration)
    }

    /// 创建等待反驳选项状态
    pub fn option(count: usize) -> Self {
        Self::WaitForOption {
            option_count: count,
        }
    }

    /// 创建等待剧本状态
    pub fn script(filename: impl Into<String>) -> Self {
        Self::WaitForScript {
            filename: filename.into(),
        }
    }
}

/// 执行状态
///
/// 执行引擎的**唯一可变状态**。切章时整体重建（证物背包除外，它跨章存续）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    /// 当前行索引
    pub index: usize,

    /// 当前等待状态
    pub waiting: WaitingReason,

    /// 是否已停机（跳转目标缺失等不可恢复错误）
    ///
    /// 停机后引擎不再推进，tick 成为空操作；修正剧本内容后重新
    /// load_script 才能继续。
    pub halted: bool,

    /// 是否已结束（EndChapter 或顺序执行越过末行）
    pub finished: bool,

    /// 法庭全景动画是否进行中（影响对话行的立绘分发路径）
    pub court_stage_active: bool,

    /// 待发放的证物（对话行附带，打字结束/跳过时发放）
    ///
    /// `Option::take` 保证无论经由自然结束还是跳过路径，发放都恰好一次。
    pub pending_grant: Option<EvidenceGrant>,
}

impl ExecutionState {
    /// 创建新的执行状态（指向第 0 行）
    pub fn new() -> Self {
        Self {
            index: 0,
            waiting: WaitingReason::None,
            halted: false,
            finished: false,
            court_stage_active: false,
            pending_grant: None,
        }
    }

    /// 前进到下一行
    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// 跳转到指定索引
    pub fn jump_to(&mut self, index: usize) {
        self.index = index;
    }

    /// 进入等待状态
    pub fn wait(&mut self, reason: WaitingReason) {
        self.waiting = reason;
    }

    /// 清除等待状态
    pub fn clear_wait(&mut self) {
        self.waiting = WaitingReason::None;
    }

    /// 停机（保持当前行索引不变）
    pub fn halt(&mut self) {
        self.halted = true;
        self.waiting = WaitingReason::None;
    }

    /// 取走待发放的证物（恰好一次语义）
    pub fn take_grant(&mut self) -> Option<EvidenceGrant> {
        self.pending_grant.take()
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::new()
    }
}
