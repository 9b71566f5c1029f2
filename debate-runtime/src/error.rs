//! # Error 模块
//!
//! 定义 debate-runtime 中使用的错误类型。
//!
//! ## 错误策略
//!
//! - 剧本加载失败（JSON 损坏、行 id 重复）是**致命**的：加载中止，已加载的剧本不受影响
//! - 执行期的可恢复问题（未知指令、参数不足）不走错误通道，由引擎记录日志并跳过
//! - 跳转目标缺失会使引擎**停机**（见 engine 模块），同样不作为 Err 向外传播

use thiserror::Error;

/// 剧本加载/解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// JSON 反序列化失败
    #[error("剧本 JSON 解析失败: {message}")]
    Json { message: String },

    /// 行缺少 id
    #[error("第 {index} 行缺少 id（跳转依赖行 id，不允许为空）")]
    MissingLineId { index: usize },

    /// 行 id 重复
    #[error("行 id '{id}' 重复出现，跳转目标必须唯一")]
    DuplicateLineId { id: String },
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 无效的选择索引
    #[error("无效的选择索引 {index}，有效范围是 0..{max}")]
    InvalidChoiceIndex { index: usize, max: usize },

    /// 状态不匹配
    #[error("当前状态不允许此输入：期望 {expected}，实际 {actual}")]
    StateMismatch { expected: String, actual: String },
}

/// debate-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Result 类型别名
pub type CoreResult<T> = Result<T, CoreError>;
