//! # Script 模块
//!
//! 剧本的数据模型与加载。
//!
//! ## 模块结构
//!
//! - [`model`]：剧本的内存表示（与 JSON 线格式一一对应）
//! - [`loader`]：JSON 反序列化与加载期校验

pub mod loader;
pub mod model;

pub use model::{
    CharacterPlacement, CommandLine, DebateLine, DebateOption, DebateRoundConfig, DialogueLine,
    EvidenceGrant, Script, ScriptLine, Sentence,
};
