//! # Loader 模块
//!
//! 剧本 JSON 的反序列化与加载期校验。
//!
//! ## 校验策略
//!
//! 跳转按行 id 定位，id 缺失或重复会让"哪一行是目标"变成未定义行为，
//! 所以这两类问题在加载期直接拒绝，而不是留到运行期再停机。
//! 工具链需要对坏剧本做全量诊断时走 [`Script::parse_unchecked`]，
//! 由 diagnostic 模块汇报同样的问题而不中断。

use std::collections::HashSet;

use crate::error::ParseError;
use crate::script::model::{Script, ScriptLine};

impl Script {
    /// 解析并校验剧本 JSON
    ///
    /// # 错误
    ///
    /// - JSON 结构损坏 → [`ParseError::Json`]
    /// - 行缺少 id → [`ParseError::MissingLineId`]
    /// - 行 id 重复 → [`ParseError::DuplicateLineId`]
    ///
    /// 加载失败不影响调用方已持有的剧本。
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let script = Self::parse_unchecked(text)?;
        script.validate_ids()?;
        Ok(script)
    }

    /// 仅反序列化，跳过 id 校验（诊断工具使用）
    pub fn parse_unchecked(text: &str) -> Result<Self, ParseError> {
        serde_json::from_str(text).map_err(|e| ParseError::Json {
            message: e.to_string(),
        })
    }

    /// 校验行 id 非空且唯一
    ///
    /// 未识别的行类型没有 id，也不可能成为跳转目标，不参与校验。
    pub fn validate_ids(&self) -> Result<(), ParseError> {
        let mut seen = HashSet::new();
        for (index, line) in self.lines.iter().enumerate() {
            if matches!(line, ScriptLine::Unknown) {
                continue;
            }
            let id = line.id();
            if id.is_empty() {
                return Err(ParseError::MissingLineId { index });
            }
            if !seen.insert(id) {
                return Err(ParseError::DuplicateLineId { id: id.to_string() });
            }
        }
        Ok(())
    }
}
