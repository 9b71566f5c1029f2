//! # History 模块
//!
//! 对话记录数据模型，支持回看已读文本（原型是对话 Log 面板）。
//!
//! ## 设计原则
//!
//! - 记录已呈现的文本事件（对话、言弹、分支选择、证物入包）
//! - 所有数据可序列化
//! - 不记录临时状态（立绘切换、BGM 等）

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// 历史事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// 对话事件
    Dialogue {
        /// 说话者（None 表示旁白）
        speaker: Option<String>,
        /// 对话内容
        content: String,
    },

    /// 辩论言弹事件
    DebateSentence {
        /// 言弹文本（含弱点标记）
        content: String,
    },

    /// 分支选择事件
    ChoiceMade {
        /// 全部选项文本
        options: Vec<String>,
        /// 选定的索引
        selected_index: usize,
    },

    /// 证物入包事件
    EvidenceGained {
        /// 证物 id
        id: String,
        /// 证物标题
        title: String,
    },
}

impl HistoryEvent {
    /// 创建对话事件
    pub fn dialogue(speaker: Option<String>, content: String) -> Self {
        Self::Dialogue { speaker, content }
    }

    /// 创建言弹事件
    pub fn debate_sentence(content: String) -> Self {
        Self::DebateSentence { content }
    }

    /// 创建分支选择事件
    pub fn choice_made(options: Vec<String>, selected_index: usize) -> Self {
        Self::ChoiceMade {
            options,
            selected_index,
        }
    }

    /// 创建证物入包事件
    pub fn evidence_gained(id: String, title: String) -> Self {
        Self::EvidenceGained { id, title }
    }
}

/// 历史记录容器
///
/// 超出容量时从头部淘汰最旧的事件，队列两端操作都是 O(1)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// 事件队列（按发生顺序，头部最旧）
    events: VecDeque<HistoryEvent>,
    /// 最大记录数（防止内存无限增长）
    max_events: usize,
}

impl History {
    /// 创建新的历史记录
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            max_events: 1000,
        }
    }

    /// 设置最大记录数
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// 添加事件
    pub fn push(&mut self, event: HistoryEvent) {
        self.events.push_back(event);

        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    /// 获取所有事件（头部最旧）
    pub fn events(&self) -> &VecDeque<HistoryEvent> {
        &self.events
    }

    /// 获取对话事件数量（含言弹）
    pub fn dialogue_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    HistoryEvent::Dialogue { .. } | HistoryEvent::DebateSentence { .. }
                )
            })
            .count()
    }

    /// 清空历史
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// 获取事件总数
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
