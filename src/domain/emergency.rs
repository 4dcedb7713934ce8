// ==========================================
// 校务排课系统 - 应急课表领域模型
// ==========================================
// 红线: 应急课表是历史快照，生成后不再改写（软更正除外）
// 冗余: 槽位携带教师/科目/班级展示名，下游展示不回查主数据
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// AbsenceEvent - 缺勤事件
// ==========================================
// 代课引擎的显式入参；event_id 是应急课表的幂等键，
// 同一事件重复触发会在落库时被唯一约束拒绝
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceEvent {
    pub event_id: String,                // 事件ID（幂等键）
    pub date: NaiveDate,                 // 缺勤日期
    pub absent_teacher_ids: Vec<String>, // 缺勤教师
    pub reason: Option<String>,          // 缺勤原因
}

impl AbsenceEvent {
    /// 创建新缺勤事件（自动分配 event_id）
    pub fn new(date: NaiveDate, absent_teacher_ids: Vec<String>, reason: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            date,
            absent_teacher_ids,
            reason,
        }
    }
}

// ==========================================
// EmergencySlot - 应急课表槽位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencySlot {
    pub period: u32,                        // 节次索引
    pub class_id: String,                   // 班级
    pub subject_id: String,                 // 科目
    pub teacher_id: Option<String>,         // 当前授课教师（空堂为 None）
    pub original_teacher_id: Option<String>, // 被代课的原教师
    pub is_affected: bool,                  // 原教师在缺勤名单中
    pub is_modified: bool,                  // 已替换为代课教师
    pub is_vacant: bool,                    // 无人可代，空堂
    pub substitute_origin: Option<String>,  // 代课教师来源班级（展示用）

    // ===== 展示冗余字段 =====
    pub teacher_name: Option<String>, // 当前教师姓名
    pub subject_name: String,         // 科目名称
    pub class_name: String,           // 班级名称
}

// ==========================================
// EmergencySchedule - 应急课表
// ==========================================
// original_slots 与 emergency_slots 并存落库，用于审计与对照展示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencySchedule {
    pub emergency_id: String,              // 应急课表ID
    pub base_schedule_id: String,          // 基础课表ID
    pub absence_event_id: String,          // 缺勤事件ID（唯一）
    pub date: NaiveDate,                   // 日期
    pub weekday: u32,                      // 星期索引 (0 = 周一)
    pub reason: Option<String>,            // 缺勤原因
    pub absent_teacher_ids: Vec<String>,   // 缺勤教师
    pub affected_class_ids: Vec<String>,   // 受影响班级
    pub original_slots: Vec<EmergencySlot>, // 替换前的当日课表（已标注 is_affected）
    pub emergency_slots: Vec<EmergencySlot>, // 替换后的当日课表
    pub created_at: NaiveDateTime,         // 创建时间
}

impl EmergencySchedule {
    /// 创建空的应急课表骨架
    pub fn new(base_schedule_id: &str, event: &AbsenceEvent, weekday: u32) -> Self {
        Self {
            emergency_id: Uuid::new_v4().to_string(),
            base_schedule_id: base_schedule_id.to_string(),
            absence_event_id: event.event_id.clone(),
            date: event.date,
            weekday,
            reason: event.reason.clone(),
            absent_teacher_ids: event.absent_teacher_ids.clone(),
            affected_class_ids: Vec::new(),
            original_slots: Vec::new(),
            emergency_slots: Vec::new(),
            created_at: Utc::now().naive_utc(),
        }
    }

    /// 受影响槽位数（= 本次事件应产生的欠课条数）
    pub fn affected_count(&self) -> usize {
        self.original_slots.iter().filter(|s| s.is_affected).count()
    }

    /// 空堂槽位数
    pub fn vacant_count(&self) -> usize {
        self.emergency_slots.iter().filter(|s| s.is_vacant).count()
    }
}
