//! # Command 模块
//!
//! 定义 Runtime 向 Host 发出的所有指令。
//! Command 是 Runtime 与 Host 之间的**唯一通信方式**。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：不包含任何渲染/音频引擎的类型

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 立绘显示位置
///
/// 对应剧本中的 `"position": "left|center|right"` 字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// 左侧
    Left,
    /// 中央
    Center,
    /// 右侧
    Right,
}

impl Position {
    /// 从字符串解析位置（便捷方法）
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }
}

impl FromStr for Position {
    type Err = ();

    /// 从字符串解析位置（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "middle" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

/// 立绘远近状态
///
/// `Far` 是默认状态（正常显示）；`Near` 表示靠近屏幕、放大显示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Distance {
    /// 默认状态，正常显示
    #[default]
    Far,
    /// 靠近屏幕，放大显示
    Near,
}

impl FromStr for Distance {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "far" => Ok(Self::Far),
            "near" => Ok(Self::Near),
            _ => Err(()),
        }
    }
}

/// 分支选择项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// 选项显示文本
    pub text: String,
    /// 跳转目标行 id（空字符串表示顺序前进）
    pub target: String,
}

/// 法庭全景动画中单个角色的就位数据
///
/// 立绘路径已由引擎通过前瞻扫描解析完毕，Host 只需按给定数据摆放。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePlacement {
    /// 立绘路径
    pub portrait: String,
    /// 自定义坐标（None 表示使用 Host 的默认排布）
    pub custom_pos: Option<(f32, f32)>,
}

/// Runtime 向 Host 发出的指令
///
/// Host 接收 Command 后，将其转换为实际的渲染、音频等操作。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 切换到普通对话界面（显示对话面板，隐藏辩论面板）
    EnterDialogueMode,

    /// 切换到辩论界面
    EnterDebateMode {
        /// 本回合的时间限制（秒），供 Host 展示倒计时
        time_limit: f32,
    },

    /// 显示对话文本（由 Host 以打字机效果逐字呈现）
    ///
    /// 打字结束后 Host 回传 [`RuntimeInput::TypingFinished`]；
    /// 打字中收到点击则表示跳过，Runtime 会补发 [`Command::CompleteTyping`]。
    ///
    /// [`RuntimeInput::TypingFinished`]: crate::input::RuntimeInput::TypingFinished
    ShowDialogue {
        /// 说话者名称（None 表示旁白）
        speaker: Option<String>,
        /// 对话内容
        text: String,
    },

    /// 立即补全打字机文本（玩家跳过了逐字动画）
    CompleteTyping {
        /// 完整文本
        text: String,
    },

    /// 在指定位置放置/切换立绘
    SetPortrait {
        /// 显示位置
        position: Position,
        /// 立绘路径
        path: String,
        /// 远近状态
        distance: Distance,
    },

    /// 移除指定位置的立绘
    ClearPortrait {
        /// 显示位置
        position: Position,
    },

    /// 法庭全景动画模式下更新卷轴中的角色立绘
    UpdateStagePortrait {
        /// 立绘路径
        path: String,
    },

    /// 切换背景
    SetBackground {
        /// 背景图片路径
        path: String,
    },

    /// 播放语音
    ///
    /// 路径已按章节目录规则补全（见 [`Script::voice_path`]）。
    ///
    /// [`Script::voice_path`]: crate::script::Script::voice_path
    PlayVoice {
        /// 语音文件路径
        path: String,
    },

    /// 播放 BGM（按曲目索引）
    PlayBgm {
        /// BGM 曲目索引
        index: usize,
    },

    /// 切换 BGM（淡出当前曲目后播放新曲目）
    SwitchBgm {
        /// BGM 曲目索引
        index: usize,
    },

    /// 停止 BGM
    StopBgm,

    /// 显示分支选择界面
    PresentChoices {
        /// 选项列表
        choices: Vec<Choice>,
    },

    /// 显示一句辩论言弹
    ///
    /// 弱点词已包裹 `<link="weak">` 与颜色标签，Host 负责富文本渲染和
    /// 点击区域检测，命中后回传 `WeakPointClicked`。
    ShowDebateSentence {
        /// 句子在本回合中的序号（从 0 开始）
        index: usize,
        /// 处理过弱点标记的富文本
        text: String,
        /// 本句是否含弱点（false 时 Host 无需做点击检测）
        weak_point: bool,
    },

    /// 显示反驳选项列表（弱点命中后）
    ShowOptions {
        /// 选项显示文本
        options: Vec<String>,
    },

    /// 关闭反驳选项列表
    HideOptions,

    /// 设置全局时间缩放
    ///
    /// 弱点命中时置 0 冻结一切计时，选项关闭后恢复为 1。
    SetTimeScale {
        /// 缩放系数
        scale: f32,
    },

    /// 初始化法庭全景动画
    InitCourtStage {
        /// 角色就位列表（按剧本顺序）
        placements: Vec<StagePlacement>,
    },

    /// 结束法庭全景动画，恢复常规对话界面
    StopCourtStage,

    /// 证物已入包（仅在真正新增时发出，重复 id 不会触发）
    ///
    /// Host 可借此弹出"获得了线索"提示。
    EvidenceAdded {
        /// 证物 id
        id: String,
        /// 证物标题
        title: String,
    },

    /// 请求 Host 加载下一个剧本文件
    ///
    /// Runtime 随后进入 `WaitForScript` 等待，Host 解析完成后调用
    /// `ScriptEngine::load_script` 交付新剧本。
    RequestScript {
        /// 剧本文件名
        filename: String,
    },
}
