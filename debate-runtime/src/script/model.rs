//! # Script Model 模块
//!
//! 剧本的内存表示，与 JSON 剧本文件的结构一一对应。
//!
//! ## 设计说明
//!
//! - 剧本一经加载即不可变，由执行引擎独占持有，切章时整体替换
//! - 行类型是带 `type` 判别字段的 tagged union：dialogue / debate / command
//! - 位置/距离等外观字段在线格式中保持字符串，由执行层解析并容错
//!   （剧本数据是手写内容，坏值应降级为警告而不是加载失败）

use serde::{Deserialize, Serialize};

/// 一整章的剧本
///
/// 行的顺序即默认执行顺序；跳转通过行 id 定位。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// 章节 ID，用于标识当前剧本（也参与语音路径拼接）
    pub chapter_id: String,

    /// 剧本行列表
    #[serde(default)]
    pub lines: Vec<ScriptLine>,
}

impl Script {
    /// 创建新剧本（测试和工具使用；常规路径走 [`Script::parse`]）
    ///
    /// [`Script::parse`]: Script::parse
    pub fn new(chapter_id: impl Into<String>, lines: Vec<ScriptLine>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            lines,
        }
    }

    /// 按行 id 线性查找行索引
    ///
    /// 行数通常在百这个量级，线性扫描足够；id 唯一性由加载器保证。
    pub fn find_line(&self, id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.id() == id)
    }

    /// 获取指定索引的行
    pub fn get(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }

    /// 行数量
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 根据章节 ID 拼接语音文件的完整路径
    ///
    /// 规则：
    /// - 已含 `/` 的文件名视为完整路径，原样返回
    /// - 章节 ID 形如 `Act01_Chapter01_Trial` 时，末段 `Trial*`/`Adv*`
    ///   归入上级目录 `Act01_Chapter01`
    /// - 结果形如 `Audio/Voice/{上级目录}/{章节ID}/{文件名}`
    pub fn voice_path(&self, filename: &str) -> String {
        if filename.is_empty() {
            return String::new();
        }
        if filename.contains('/') {
            return filename.to_string();
        }

        let chapter_id = self.chapter_id.as_str();
        let mut parent = chapter_id;

        if let Some(last_underscore) = chapter_id.rfind('_') {
            if last_underscore > 0 {
                let suffix = &chapter_id[last_underscore + 1..];
                if suffix.starts_with("Trial") || suffix.starts_with("Adv") {
                    parent = &chapter_id[..last_underscore];
                }
            }
        }

        format!("Audio/Voice/{parent}/{chapter_id}/{filename}")
    }
}

/// 剧本中的单行，按 `type` 字段区分三种变体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScriptLine {
    /// 普通对话
    Dialogue(DialogueLine),
    /// 辩论环节
    Debate(DebateLine),
    /// 指令
    Command(CommandLine),
    /// 未识别的行类型
    ///
    /// `type` 取值不在上述三种之内时落入此变体，加载不报错；
    /// 执行时记一条警告并跳到下一行，与未知指令的降级策略一致。
    #[serde(other)]
    Unknown,
}

impl ScriptLine {
    /// 该行的唯一标识符（跳转目标）
    ///
    /// 未识别的行没有可用的 id，返回空字符串，因此不能作为跳转目标。
    pub fn id(&self) -> &str {
        match self {
            Self::Dialogue(l) => &l.id,
            Self::Debate(l) => &l.id,
            Self::Command(l) => &l.id,
            Self::Unknown => "",
        }
    }
}

/// 普通对话行
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    /// 该行的唯一标识符
    pub id: String,

    /// 发言角色名称（空字符串表示旁白）
    #[serde(default)]
    pub speaker: String,

    /// 对话文本内容
    #[serde(default)]
    pub text: String,

    /// 立绘路径（空字符串表示不更新立绘）
    #[serde(default)]
    pub portrait: String,

    /// 语音文件名（空字符串表示无语音）
    #[serde(default)]
    pub voice: String,

    /// 立绘显示位置："left" / "center" / "right"
    #[serde(default)]
    pub position: String,

    /// 立绘远近状态："far" / "near"
    #[serde(default)]
    pub distance: String,

    /// 本行是否附带证物发放
    #[serde(default)]
    pub give_evidence: bool,

    /// 证物 id
    #[serde(default)]
    pub evidence_id: String,

    /// 证物标题
    #[serde(default)]
    pub evidence_title: String,

    /// 证物描述
    #[serde(default)]
    pub evidence_desc: String,

    /// 证物图标路径
    #[serde(default)]
    pub evidence_icon: String,
}

impl DialogueLine {
    /// 提取本行附带的证物发放数据
    ///
    /// id 是去重主键；剧本未填 id 时退回用标题充当（历史剧本数据的兼容）。
    /// id 和标题都为空则视为无效发放，返回 None。
    pub fn evidence_grant(&self) -> Option<EvidenceGrant> {
        if !self.give_evidence {
            return None;
        }

        let id = if self.evidence_id.is_empty() {
            self.evidence_title.clone()
        } else {
            self.evidence_id.clone()
        };
        if id.is_empty() {
            return None;
        }

        Some(EvidenceGrant {
            id,
            title: self.evidence_title.clone(),
            description: self.evidence_desc.clone(),
            icon: self.evidence_icon.clone(),
        })
    }
}

/// 辩论行
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateLine {
    /// 该行的唯一标识符
    pub id: String,

    /// 发言角色名称
    #[serde(default)]
    pub speaker: String,

    /// 立绘路径
    #[serde(default)]
    pub portrait: String,

    /// 语音文件名
    #[serde(default)]
    pub voice: String,

    /// 立绘显示位置
    #[serde(default)]
    pub position: String,

    /// 辩论环节的详细配置
    #[serde(default)]
    pub debate_config: DebateRoundConfig,
}

/// 指令行
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLine {
    /// 该行的唯一标识符
    pub id: String,

    /// 指令名称（例如 "TurnBg"）
    #[serde(default)]
    pub command: String,

    /// 指令参数列表，约定按位置解释：
    /// - AddEvidence: \[0\]ID, \[1\]标题, \[2\]描述, \[3\]图标路径(可选)
    /// - CheckEvidence: \[0\]ID, \[1\]拥有时跳转ID, \[2\]未拥有时跳转ID(可选)
    /// - SwitchCharacter: \[0\]位置, \[1\]路径, \[2\]距离(可选)
    /// - ShowChoice: \[0\]选项1|跳转ID, \[1\]选项2|跳转ID...
    #[serde(default)]
    pub parameters: Vec<String>,

    /// 法庭全景动画的角色配置（仅 command="InitCourtStage" 时有效）
    #[serde(default)]
    pub court_stage_def: Vec<CharacterPlacement>,
}

/// 法庭全景动画中单个角色的配置定义
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPlacement {
    /// 角色名称（用于查找立绘和排序）
    #[serde(default)]
    pub name: String,

    /// 是否使用自定义坐标覆盖默认排布
    #[serde(default)]
    pub use_custom_pos: bool,

    /// 自定义 X 坐标
    #[serde(default)]
    pub x: f32,

    /// 自定义 Y 坐标
    #[serde(default)]
    pub y: f32,
}

/// 辩论回合的配置数据
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateRoundConfig {
    /// 本回合的时间限制（秒），仅供 Host 展示倒计时
    #[serde(default)]
    pub time_limit: f32,

    /// 依次播放的言弹句子列表
    #[serde(default)]
    pub sentences: Vec<Sentence>,

    /// 点击弱点后弹出的反驳选项列表
    #[serde(default)]
    pub options: Vec<DebateOption>,
}

/// 单句言弹的数据定义
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    /// 句子的唯一 ID
    #[serde(default)]
    pub id: String,

    /// 显示的文本内容
    ///
    /// `is_weak_point` 为 true 且文本中没有手写 `<link="weak">` 标记时，
    /// 整句会被自动标记为弱点；只想让部分词语成为弱点时在 JSON 中手动包裹。
    #[serde(default)]
    pub text: String,

    /// 是否包含弱点（false 时该句不可点击）
    #[serde(default)]
    pub is_weak_point: bool,

    /// 击破该弱点所需的证据 ID（内容校验用，引擎本身不消费）
    #[serde(default)]
    pub correct_evidence_id: Option<String>,
}

/// 反驳选项数据
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateOption {
    /// 选项 id
    #[serde(default)]
    pub id: String,

    /// 选项显示文本
    #[serde(default)]
    pub text: String,

    /// 是否是正确选项
    #[serde(default)]
    pub is_correct: bool,

    /// 选定后跳转到的行 ID
    ///
    /// 错误选项也可以配置跳转（用于剧情化的失败分支）。
    #[serde(default)]
    pub next_line_id: Option<String>,

    /// 选择错误时的惩罚时间（秒）；倒计时逻辑已移除，字段仅保留在线格式中
    #[serde(default)]
    pub penalty: i32,
}

impl DebateOption {
    /// 选定后的跳转目标（空字符串与 None 等价）
    pub fn next_target(&self) -> Option<&str> {
        self.next_line_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// 证物发放数据（对话行附带，或 AddEvidence 指令构造）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGrant {
    /// 证物 id（去重主键）
    pub id: String,
    /// 证物标题
    pub title: String,
    /// 证物描述
    pub description: String,
    /// 证物图标路径（可为空）
    pub icon: String,
}
