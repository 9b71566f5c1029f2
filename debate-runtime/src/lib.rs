//! # Debate Runtime
//!
//! 法庭辩论剧情系统的核心运行时库。
//!
//! ## 架构概述
//!
//! `debate-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它通过 **命令驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                          Runtime
//!   │                              │
//!   │──── RuntimeInput ──────────►│
//!   │                              │ tick()
//!   │◄─── (Vec<Command>, WaitingReason) ──│
//!   │                              │
//! ```
//!
//! Host 负责渲染、音频、计时和输入采集；Runtime 负责剧本流程、
//! 辩论回合的裁决和证物背包。两者只通过 [`Command`] 与
//! [`RuntimeInput`] 交换信息。
//!
//! ## 核心类型
//!
//! - [`ScriptEngine`]：执行引擎，tick 驱动
//! - [`Command`]：Runtime 向 Host 发出的指令
//! - [`RuntimeInput`]：Host 向 Runtime 传递的输入
//! - [`WaitingReason`]：Runtime 的等待状态
//! - [`EvidenceStore`]：证物背包（跨章存续）
//!
//! ## 使用示例
//!
//! ```ignore
//! use debate_runtime::{RuntimeInput, Script, ScriptEngine, WaitingReason};
//!
//! let script = Script::parse(&json)?;
//! let mut engine = ScriptEngine::new(script);
//!
//! let mut input = None;
//! loop {
//!     let (commands, waiting) = engine.tick(input)?;
//!
//!     // Host 执行 commands
//!     for cmd in commands {
//!         host.execute(cmd);
//!     }
//!
//!     // 根据 waiting 状态采集输入
//!     input = match waiting {
//!         WaitingReason::None => break,
//!         WaitingReason::WaitForClick => wait_for_click(),
//!         WaitingReason::WaitForTime(duration) => {
//!             sleep(duration);
//!             None
//!         }
//!         // ...
//!     };
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`command`]：Command 定义
//! - [`input`]：RuntimeInput 定义
//! - [`state`]：ExecutionState 和 WaitingReason 定义
//! - [`error`]：错误类型定义
//! - [`script`]：剧本数据模型与加载
//! - [`runtime`]：执行引擎（主循环、指令执行、辩论子引擎）
//! - [`evidence`]：证物背包
//! - [`history`]：对话历史
//! - [`diagnostic`]：剧本静态检查

pub mod command;
pub mod diagnostic;
pub mod error;
pub mod evidence;
pub mod history;
pub mod input;
pub mod runtime;
pub mod script;
pub mod state;

// 重导出核心类型
pub use command::{Choice, Command, Distance, Position, StagePlacement};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_script};
pub use error::{CoreError, CoreResult, ParseError, RuntimeError};
pub use evidence::{EvidenceRecord, EvidenceStore};
pub use history::{History, HistoryEvent};
pub use input::RuntimeInput;
pub use runtime::{DebateEngine, DebateOutcome, ScriptEngine};
pub use script::{
    DebateLine, DebateOption, DebateRoundConfig, DialogueLine, Script, ScriptLine, Sentence,
};
pub use state::{ExecutionState, WaitingReason};
