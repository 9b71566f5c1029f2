//! # Runtime 模块
//!
//! 剧本执行的核心逻辑。
//!
//! ## 模块结构
//!
//! - [`engine`]：执行引擎，tick 驱动的主循环
//! - [`executor`]：指令行的执行与流程裁决
//! - [`debate`]：辩论回合的子状态机

pub mod debate;
pub mod engine;
pub mod executor;

pub use debate::{DebateEngine, DebateOutcome, DebatePhase, DebateStep};
pub use engine::ScriptEngine;
pub use executor::{CommandFlow, CommandResult};
