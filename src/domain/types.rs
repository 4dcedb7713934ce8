// ==========================================
// 校务排课系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 补课日状态 (Makeup Session Status)
// ==========================================
// 状态机: PLANNED -> REALIZED | CANCELLED (终态，不可回退)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MakeupStatus {
    Planned,   // 已计划
    Realized,  // 已实施（出勤核销完成）
    Cancelled, // 已取消
}

impl fmt::Display for MakeupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MakeupStatus::Planned => write!(f, "PLANNED"),
            MakeupStatus::Realized => write!(f, "REALIZED"),
            MakeupStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl MakeupStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PLANNED" => MakeupStatus::Planned,
            "REALIZED" => MakeupStatus::Realized,
            "CANCELLED" => MakeupStatus::Cancelled,
            _ => MakeupStatus::Planned, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MakeupStatus::Planned => "PLANNED",
            MakeupStatus::Realized => "REALIZED",
            MakeupStatus::Cancelled => "CANCELLED",
        }
    }

    /// 是否为终态（REALIZED/CANCELLED 后不再接受任何变更）
    pub fn is_terminal(&self) -> bool {
        matches!(self, MakeupStatus::Realized | MakeupStatus::Cancelled)
    }

    /// 判断状态转换是否合法
    ///
    /// 只允许 PLANNED -> REALIZED 与 PLANNED -> CANCELLED
    pub fn can_transition_to(&self, next: MakeupStatus) -> bool {
        matches!(
            (self, next),
            (MakeupStatus::Planned, MakeupStatus::Realized)
                | (MakeupStatus::Planned, MakeupStatus::Cancelled)
        )
    }
}

// ==========================================
// 欠课来源 (Debt Source)
// ==========================================
// 原始欠课来自课堂缺勤；累积欠课来自补课日缺席
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtSource {
    Absence,      // 课堂缺勤（代课/空堂）
    MissedMakeup, // 补课日缺席（累积欠课）
}

impl fmt::Display for DebtSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtSource::Absence => write!(f, "ABSENCE"),
            DebtSource::MissedMakeup => write!(f, "MISSED_MAKEUP"),
        }
    }
}

// ==========================================
// 排课冲突类型 (Conflict Kind)
// ==========================================
// 排课生成的可恢复冲突；致命错误走 EngineError
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    NoAvailableSlots, // 重试耗尽，课时未排满
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::NoAvailableSlots => write!(f, "no_available_slots"),
        }
    }
}
