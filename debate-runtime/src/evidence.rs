//! # Evidence 模块
//!
//! 证物背包：玩家取得的证物记录，按 id 去重存储。
//!
//! ## 设计说明
//!
//! - id 是**唯一去重主键**，标题只用于显示（历史上两者曾被混用，已纠正）
//! - `add` 对重复 id 直接拒绝而不是覆盖，重复调用是安全的
//! - 背包跨章节存续，切换剧本不清空

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::script::EvidenceGrant;

/// 单条证物记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// 证物 id（去重主键）
    pub id: String,
    /// 证物标题
    pub title: String,
    /// 证物描述
    pub description: String,
    /// 证物图标路径（可为空）
    pub icon: String,
}

impl From<EvidenceGrant> for EvidenceRecord {
    fn from(grant: EvidenceGrant) -> Self {
        // 剧本可以省略标题和描述，入包时补上占位文案
        let title = if grant.title.is_empty() {
            "未知证物".to_string()
        } else {
            grant.title
        };
        let description = if grant.description.is_empty() {
            "（暂无描述）".to_string()
        } else {
            grant.description
        };

        Self {
            id: grant.id,
            title,
            description,
            icon: grant.icon,
        }
    }
}

/// 证物背包
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceStore {
    /// 证物记录（按取得顺序）
    records: Vec<EvidenceRecord>,
    /// 已收录的 id 集合
    ids: HashSet<String>,
}

impl EvidenceStore {
    /// 创建空背包
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条证物记录，自动去重
    ///
    /// 返回是否真正新增。id 为空或已存在时返回 false，不修改背包。
    pub fn add(&mut self, record: EvidenceRecord) -> bool {
        if record.id.is_empty() {
            debug!("证物 id 为空，未添加");
            return false;
        }
        if !self.ids.insert(record.id.clone()) {
            debug!(id = %record.id, "证物已存在，跳过重复添加");
            return false;
        }
        self.records.push(record);
        true
    }

    /// 是否拥有某个证物
    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// 按 id 获取记录
    pub fn get(&self, id: &str) -> Option<&EvidenceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// 全部记录（按取得顺序）
    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
