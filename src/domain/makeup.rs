// ==========================================
// 校务排课系统 - 补课日领域模型
// ==========================================
// 状态机: PLANNED -> REALIZED | CANCELLED（终态）
// 红线: 出勤核销(核销后状态置 REALIZED)只允许执行一次
// ==========================================

use crate::domain::types::MakeupStatus;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// MakeupSlot - 补课槽位
// ==========================================
// 每个槽位对应一条欠课记录的一次核销意图；
// 同一教师+班级+科目的多条欠课不合并，一课时一槽位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeupSlot {
    pub period: u32,            // 节次索引（取自补课节次模板）
    pub class_id: String,       // 班级
    pub subject_id: String,     // 科目
    pub teacher_id: String,     // 欠课教师
    pub debt_record_id: String, // 拟核销的欠课记录
    pub hours_count: i32,       // 本槽位核销课时（常规为 1）

    // ===== 展示冗余字段 =====
    pub teacher_name: Option<String>, // 教师姓名
    pub subject_name: Option<String>, // 科目名称
}

// ==========================================
// MakeupSession - 补课日（如周六补课）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeupSession {
    pub session_id: String,   // 补课日ID
    pub school_id: String,    // 学校ID
    pub date: NaiveDate,      // 补课日期
    pub status: MakeupStatus, // 状态

    // 按班级组织的补课安排 (class_id -> 有序槽位表)
    // BTreeMap: 保证序列化与遍历顺序稳定
    pub schedule: BTreeMap<String, Vec<MakeupSlot>>,

    pub attended_teacher_ids: Vec<String>, // 实到教师
    pub absent_teacher_ids: Vec<String>,   // 缺席教师（核销时计算）

    pub total_scheduled_hours: i32, // 计划核销课时合计
    pub total_realized_hours: i32,  // 实际核销课时合计

    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl MakeupSession {
    /// 创建新补课日（初始状态 PLANNED）
    pub fn new(school_id: &str, date: NaiveDate) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            session_id: Uuid::new_v4().to_string(),
            school_id: school_id.to_string(),
            date,
            status: MakeupStatus::Planned,
            schedule: BTreeMap::new(),
            attended_teacher_ids: Vec::new(),
            absent_teacher_ids: Vec::new(),
            total_scheduled_hours: 0,
            total_realized_hours: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 全部槽位（跨班级展开）
    pub fn all_slots(&self) -> impl Iterator<Item = &MakeupSlot> {
        self.schedule.values().flatten()
    }

    /// 计划到场的教师集合（去重，保持首次出现顺序）
    pub fn scheduled_teacher_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for slot in self.all_slots() {
            if !ids.iter().any(|id| id == &slot.teacher_id) {
                ids.push(slot.teacher_id.clone());
            }
        }
        ids
    }

    /// 某教师名下的全部槽位
    pub fn slots_of_teacher(&self, teacher_id: &str) -> Vec<&MakeupSlot> {
        self.all_slots()
            .filter(|s| s.teacher_id == teacher_id)
            .collect()
    }

    /// 追加一个槽位并同步计划课时合计
    pub fn push_slot(&mut self, slot: MakeupSlot) {
        self.total_scheduled_hours += slot.hours_count;
        self.schedule
            .entry(slot.class_id.clone())
            .or_default()
            .push(slot);
    }

    /// 登记/撤销出勤
    ///
    /// 出勤在核销前可反复修改；此处只维护名单成员关系，
    /// 状态校验由补课调度引擎负责
    pub fn set_attendance(&mut self, teacher_id: &str, attended: bool) {
        self.attended_teacher_ids.retain(|id| id != teacher_id);
        self.absent_teacher_ids.retain(|id| id != teacher_id);
        if attended {
            self.attended_teacher_ids.push(teacher_id.to_string());
        } else {
            self.absent_teacher_ids.push(teacher_id.to_string());
        }
        self.updated_at = Utc::now().naive_utc();
    }

    /// 教师是否登记为实到
    pub fn is_attended(&self, teacher_id: &str) -> bool {
        self.attended_teacher_ids.iter().any(|id| id == teacher_id)
    }
}
