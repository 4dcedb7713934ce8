// ==========================================
// 校务排课系统 - 代课应急引擎
// ==========================================
// 输入: 基础课表 + 缺勤事件（显式入参，幂等键随事件携带）
// 输出: 应急课表（替换前后并存）+ 欠课记录
// 红线: 受影响槽位无论是否有人代课，都对原教师记 1 节欠课
// 降级: 师资上下文缺失的槽位跳过并告警，不阻断其余槽位
// ==========================================

use crate::domain::debt::TeacherDebtRecord;
use crate::domain::emergency::{AbsenceEvent, EmergencySchedule, EmergencySlot};
use crate::domain::roster::{RosterIndex, Teacher};
use crate::domain::schedule::ScheduleGrid;
use crate::engine::error::EngineResult;
use chrono::Datelike;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// 代课结果: 应急课表 + 欠课记录 + 告警
#[derive(Debug, Clone)]
pub struct SubstitutionResult {
    pub emergency: EmergencySchedule,
    pub debts: Vec<TeacherDebtRecord>,
    pub warnings: Vec<String>,
}

// ==========================================
// SubstitutionEngine - 代课应急引擎
// ==========================================
pub struct SubstitutionEngine {
    // 无状态引擎
}

impl SubstitutionEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成应急课表
    ///
    /// 流程:
    /// 1. 取缺勤日期所在星期的当日课表，标注 is_affected
    /// 2. 为每个受影响槽位找代课教师（该节空闲且不在缺勤名单）；
    ///    找不到则标 is_vacant 空堂
    /// 3. 每个受影响槽位对原教师记 1 节欠课
    ///
    /// 落库与幂等由调用方完成: 应急课表表上 absence_event_id 唯一，
    /// 同一事件第二次落库会收到唯一约束错误
    ///
    /// # 参数
    /// - `base`: 基础课表
    /// - `teachers`: 教师主数据（代课候选来源）
    /// - `roster`: 名称索引（展示冗余字段）
    /// - `event`: 缺勤事件
    #[instrument(skip(self, base, teachers, roster), fields(
        event_id = %event.event_id,
        date = %event.date,
        absent_count = event.absent_teacher_ids.len()
    ))]
    pub fn build_emergency_schedule(
        &self,
        base: &ScheduleGrid,
        teachers: &[Teacher],
        roster: &RosterIndex,
        event: &AbsenceEvent,
    ) -> EngineResult<SubstitutionResult> {
        let weekday = event.date.weekday().num_days_from_monday();
        let mut emergency = EmergencySchedule::new(&base.schedule_id, event, weekday);
        let mut warnings = Vec::new();

        if weekday >= base.days_per_week {
            warn!(weekday, "缺勤日期不在上课日范围内，生成空应急课表");
            warnings.push(format!("{} 不是上课日，无槽位需要处理", event.date));
            return Ok(SubstitutionResult {
                emergency,
                debts: Vec::new(),
                warnings,
            });
        }

        let absent: HashSet<&str> = event
            .absent_teacher_ids
            .iter()
            .map(|s| s.as_str())
            .collect();

        // 1. 当日课表快照 + is_affected 标注
        let mut original_slots: Vec<EmergencySlot> = Vec::new();
        for slot in base.slots_on_day(weekday) {
            if !roster.has_context(&slot.teacher_id, &slot.subject_id, &slot.class_id) {
                warn!(
                    teacher_id = %slot.teacher_id,
                    subject_id = %slot.subject_id,
                    class_id = %slot.class_id,
                    period = slot.period,
                    "槽位师资上下文缺失，跳过"
                );
                warnings.push(format!(
                    "节次 {} 槽位 (教师={}, 科目={}, 班级={}) 上下文缺失，已跳过",
                    slot.period, slot.teacher_id, slot.subject_id, slot.class_id
                ));
                continue;
            }

            let is_affected = absent.contains(slot.teacher_id.as_str());
            original_slots.push(EmergencySlot {
                period: slot.period,
                class_id: slot.class_id.clone(),
                subject_id: slot.subject_id.clone(),
                teacher_id: Some(slot.teacher_id.clone()),
                original_teacher_id: None,
                is_affected,
                is_modified: false,
                is_vacant: false,
                substitute_origin: None,
                teacher_name: roster.teacher_name(&slot.teacher_id).map(|s| s.to_string()),
                subject_name: roster
                    .subject_name(&slot.subject_id)
                    .unwrap_or(&slot.subject_id)
                    .to_string(),
                class_name: roster
                    .class_name(&slot.class_id)
                    .unwrap_or(&slot.class_id)
                    .to_string(),
            });
        }

        // 2. 逐槽位替换；同一节次一名代课教师只能顶一个班
        let mut emergency_slots = original_slots.clone();
        let mut substitute_taken: HashSet<(String, u32)> = HashSet::new();
        for slot in emergency_slots.iter_mut().filter(|s| s.is_affected) {
            let original_teacher_id = slot
                .teacher_id
                .take()
                .unwrap_or_default();

            let substitute = teachers.iter().find(|t| {
                t.active
                    && !absent.contains(t.teacher_id.as_str())
                    && t.teacher_id != original_teacher_id
                    && !base.teacher_busy(&t.teacher_id, weekday, slot.period)
                    && !substitute_taken.contains(&(t.teacher_id.clone(), slot.period))
            });

            match substitute {
                Some(teacher) => {
                    substitute_taken.insert((teacher.teacher_id.clone(), slot.period));
                    slot.teacher_id = Some(teacher.teacher_id.clone());
                    slot.is_modified = true;
                    slot.teacher_name = Some(teacher.name.clone());
                    slot.substitute_origin =
                        substitute_origin(base, roster, &teacher.teacher_id, weekday);
                }
                None => {
                    slot.is_vacant = true;
                    slot.teacher_name = None;
                }
            }
            slot.original_teacher_id = Some(original_teacher_id);
        }

        // 3. 每个受影响槽位记 1 节欠课（对原教师，与是否有人代课无关）
        let mut debts = Vec::new();
        let mut affected_classes: Vec<String> = Vec::new();
        for slot in original_slots.iter().filter(|s| s.is_affected) {
            let teacher_id = slot.teacher_id.as_deref().unwrap_or_default();
            debts.push(TeacherDebtRecord::from_absence(
                teacher_id,
                &slot.class_id,
                &slot.subject_id,
                1,
                event.date,
                &emergency.emergency_id,
            ));
            if !affected_classes.iter().any(|c| c == &slot.class_id) {
                affected_classes.push(slot.class_id.clone());
            }
        }

        emergency.affected_class_ids = affected_classes;
        emergency.original_slots = original_slots;
        emergency.emergency_slots = emergency_slots;

        info!(
            emergency_id = %emergency.emergency_id,
            affected = emergency.affected_count(),
            vacant = emergency.vacant_count(),
            debts = debts.len(),
            "应急课表生成完成"
        );

        Ok(SubstitutionResult {
            emergency,
            debts,
            warnings,
        })
    }
}

impl Default for SubstitutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 代课教师来源班级（展示用）
///
/// 取该教师当天在基础课表里任课的第一个班级；当天无课则为 None
fn substitute_origin(
    base: &ScheduleGrid,
    roster: &RosterIndex,
    teacher_id: &str,
    weekday: u32,
) -> Option<String> {
    base.slots
        .iter()
        .find(|s| s.day == weekday && s.teacher_id == teacher_id)
        .map(|s| {
            let name = roster.class_name(&s.class_id).unwrap_or(&s.class_id);
            match roster.class_grade(&s.class_id) {
                Some(grade) => format!("{} ({})", name, grade),
                None => name.to_string(),
            }
        })
}
