// ==========================================
// 校务排课系统 - 基础课表领域模型
// ==========================================
// 不变量: 同一 (day, period) 一名教师至多出现一次
// 可选约束: 同班同日相邻节次不排同一科目（防连堂）
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ScheduleSlot - 课表槽位
// ==========================================
// 一节课 = (星期, 节次, 教师, 科目, 班级)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub day: u32,           // 星期索引 (0 = 周一)
    pub period: u32,        // 节次索引 (0 起)
    pub teacher_id: String, // 授课教师
    pub subject_id: String, // 科目
    pub class_id: String,   // 班级
}

// ==========================================
// ScheduleGrid - 基础周课表
// ==========================================
// 生命周期: 由排课引擎生成；只通过重新生成或显式单格编辑变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleGrid {
    pub schedule_id: String,       // 课表ID
    pub days_per_week: u32,        // 每周上课天数
    pub periods_per_day: u32,      // 每日节次数
    pub slots: Vec<ScheduleSlot>,  // 全部槽位
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl ScheduleGrid {
    /// 创建空课表
    pub fn new(days_per_week: u32, periods_per_day: u32) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            schedule_id: Uuid::new_v4().to_string(),
            days_per_week,
            periods_per_day,
            slots: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 某天的全部槽位（按节次升序）
    pub fn slots_on_day(&self, day: u32) -> Vec<&ScheduleSlot> {
        let mut slots: Vec<&ScheduleSlot> =
            self.slots.iter().filter(|s| s.day == day).collect();
        slots.sort_by_key(|s| (s.period, s.class_id.clone()));
        slots
    }

    /// 教师在 (day, period) 是否已有课
    pub fn teacher_busy(&self, teacher_id: &str, day: u32, period: u32) -> bool {
        self.slots
            .iter()
            .any(|s| s.day == day && s.period == period && s.teacher_id == teacher_id)
    }

    /// 班级在 (day, period) 的槽位
    pub fn class_cell(&self, class_id: &str, day: u32, period: u32) -> Option<&ScheduleSlot> {
        self.slots
            .iter()
            .find(|s| s.day == day && s.period == period && s.class_id == class_id)
    }

    /// 班级在 (day, period) 的相邻节次是否已有同一科目（防连堂检查）
    pub fn adjacent_same_subject(
        &self,
        class_id: &str,
        subject_id: &str,
        day: u32,
        period: u32,
    ) -> bool {
        let prev = period
            .checked_sub(1)
            .and_then(|p| self.class_cell(class_id, day, p));
        if prev.map(|s| s.subject_id == subject_id).unwrap_or(false) {
            return true;
        }
        self.class_cell(class_id, day, period + 1)
            .map(|s| s.subject_id == subject_id)
            .unwrap_or(false)
    }

    /// 教师本周已排课时数
    pub fn teacher_load(&self, teacher_id: &str) -> usize {
        self.slots.iter().filter(|s| s.teacher_id == teacher_id).count()
    }
}
