//! # Input 模块
//!
//! 定义 Host 向 Runtime 传递的输入事件。
//!
//! ## 设计说明
//!
//! - `RuntimeInput` 是 Host 采集用户操作/子系统完成信号后，传递给 Runtime 的抽象输入
//! - Runtime 不直接处理鼠标/键盘事件，只处理语义化的输入
//! - `WaitForTime` 由 Host 处理：等待指定时长后直接调用 `tick(None)`

use serde::{Deserialize, Serialize};

/// Host 向 Runtime 传递的输入
///
/// Runtime 通过 `tick(input)` 接收这些输入，并根据当前等待状态决定如何处理。
///
/// # 设计说明
///
/// - `Click`：对话模式下推进剧本；打字中则跳过打字机动画
/// - `TypingFinished`：打字机动画自然播放完毕
/// - `VoiceFinished`：语音片段播放结束（辩论句子按此节拍推进）
/// - `ChoiceSelected`：分支选择界面选定了某项
/// - `WeakPointClicked`：玩家点中了当前言弹中的弱点词
/// - `OptionSelected` / `OptionCancelled`：反驳选项的选定与取消
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuntimeInput {
    /// 用户点击（推进对话，或跳过打字机动画）
    Click,

    /// 打字机动画自然结束
    TypingFinished,

    /// 语音播放结束
    VoiceFinished,

    /// 用户选择了某个分支选项（解除 `WaitForChoice`）
    ///
    /// `index` 是选项的索引（从 0 开始）
    ChoiceSelected { index: usize },

    /// 用户点中了弱点词（仅在当前言弹含弱点时有效）
    WeakPointClicked,

    /// 用户选择了某个反驳选项（解除 `WaitForOption`）
    OptionSelected { index: usize },

    /// 用户关闭了反驳选项面板（未做选择）
    OptionCancelled,
}

impl RuntimeInput {
    /// 创建点击输入
    pub fn click() -> Self {
        Self::Click
    }

    /// 创建分支选择输入
    pub fn choice(index: usize) -> Self {
        Self::ChoiceSelected { index }
    }

    /// 创建反驳选项输入
    pub fn option(index: usize) -> Self {
        Self::OptionSelected { index }
    }
}
