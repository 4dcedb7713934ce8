// ==========================================
// 校务排课系统 - 欠课台账领域模型
// ==========================================
// 不变量: 0 <= hours_paid <= hours_owed 恒成立
// 红线: is_paid 只能由 hours 对比推导，不得独立赋值
// 红线: 台账只增不删，还清仅置位，保留审计轨迹
// ==========================================

use crate::domain::types::DebtSource;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// TeacherDebtRecord - 教师欠课记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherDebtRecord {
    pub debt_id: String,    // 记录ID
    pub teacher_id: String, // 欠课教师（原授课教师，与是否有人代课无关）
    pub class_id: String,   // 班级
    pub subject_id: String, // 科目

    pub hours_owed: i32,         // 应补课时
    pub hours_paid: i32,         // 已补课时
    pub absence_date: NaiveDate, // 缺勤日期

    // ===== 来源 =====
    pub emergency_id: Option<String>,                // 来源应急课表（原始欠课）
    pub accumulated_from_session_id: Option<String>, // 来源补课日（累积欠课）
    pub is_accumulated: bool,                        // 是否累积欠课

    // ===== 状态（推导） =====
    pub is_paid: bool, // hours_paid >= hours_owed

    // ===== 核销轨迹 =====
    pub paid_dates: Vec<NaiveDateTime>,  // 每次核销的时间（有序）
    pub makeup_session_ids: Vec<String>, // 参与核销的补课日

    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl TeacherDebtRecord {
    /// 创建原始欠课（来源: 课堂缺勤，经应急课表）
    pub fn from_absence(
        teacher_id: &str,
        class_id: &str,
        subject_id: &str,
        hours_owed: i32,
        absence_date: NaiveDate,
        emergency_id: &str,
    ) -> Self {
        Self::new_record(
            teacher_id,
            class_id,
            subject_id,
            hours_owed,
            absence_date,
            Some(emergency_id.to_string()),
            None,
        )
    }

    /// 创建累积欠课（来源: 补课日缺席）
    pub fn from_missed_makeup(
        teacher_id: &str,
        class_id: &str,
        subject_id: &str,
        hours_owed: i32,
        session_date: NaiveDate,
        session_id: &str,
    ) -> Self {
        Self::new_record(
            teacher_id,
            class_id,
            subject_id,
            hours_owed,
            session_date,
            None,
            Some(session_id.to_string()),
        )
    }

    fn new_record(
        teacher_id: &str,
        class_id: &str,
        subject_id: &str,
        hours_owed: i32,
        absence_date: NaiveDate,
        emergency_id: Option<String>,
        accumulated_from_session_id: Option<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        let is_accumulated = accumulated_from_session_id.is_some();
        Self {
            debt_id: Uuid::new_v4().to_string(),
            teacher_id: teacher_id.to_string(),
            class_id: class_id.to_string(),
            subject_id: subject_id.to_string(),
            hours_owed,
            hours_paid: 0,
            absence_date,
            emergency_id,
            accumulated_from_session_id,
            is_accumulated,
            is_paid: false,
            paid_dates: Vec::new(),
            makeup_session_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 欠课来源
    pub fn source(&self) -> DebtSource {
        if self.is_accumulated {
            DebtSource::MissedMakeup
        } else {
            DebtSource::Absence
        }
    }

    /// 剩余应补课时
    pub fn remaining_hours(&self) -> i32 {
        self.hours_owed - self.hours_paid
    }

    /// 核销课时（带钳制）
    ///
    /// 超出剩余欠课的部分静默截断，不产生负剩余；
    /// 返回实际入账的课时数。is_paid 在此统一重算。
    ///
    /// # 参数
    /// - `hours`: 申请核销的课时数
    /// - `date`: 核销时间（追加到 paid_dates）
    pub fn apply_payment(&mut self, hours: i32, date: NaiveDateTime) -> i32 {
        let applied = hours.min(self.remaining_hours()).max(0);
        if applied > 0 {
            self.hours_paid += applied;
            self.paid_dates.push(date);
            self.updated_at = date;
        }
        self.recompute_paid();
        applied
    }

    /// 重算 is_paid（唯一合法的赋值路径）
    pub fn recompute_paid(&mut self) {
        self.is_paid = self.hours_paid >= self.hours_owed;
    }

    /// 记录参与核销的补课日（去重）
    pub fn link_makeup_session(&mut self, session_id: &str) {
        if !self.makeup_session_ids.iter().any(|id| id == session_id) {
            self.makeup_session_ids.push(session_id.to_string());
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_debt(owed: i32) -> TeacherDebtRecord {
        TeacherDebtRecord::from_absence(
            "t1",
            "c1",
            "s1",
            owed,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            "em1",
        )
    }

    #[test]
    fn test_payment_clamped() {
        let mut debt = sample_debt(2);
        let now = Utc::now().naive_utc();

        // 超额核销被钳制到剩余课时
        let applied = debt.apply_payment(5, now);
        assert_eq!(applied, 2);
        assert_eq!(debt.hours_paid, 2);
        assert!(debt.is_paid);
        assert_eq!(debt.paid_dates.len(), 1);

        // 已还清后再核销不入账
        let applied = debt.apply_payment(1, now);
        assert_eq!(applied, 0);
        assert_eq!(debt.hours_paid, 2);
        assert_eq!(debt.paid_dates.len(), 1);
    }

    #[test]
    fn test_partial_payment() {
        let mut debt = sample_debt(3);
        let now = Utc::now().naive_utc();

        assert_eq!(debt.apply_payment(1, now), 1);
        assert!(!debt.is_paid);
        assert_eq!(debt.remaining_hours(), 2);

        assert_eq!(debt.apply_payment(2, now), 2);
        assert!(debt.is_paid);
        assert_eq!(debt.remaining_hours(), 0);
        assert_eq!(debt.paid_dates.len(), 2);
    }

    #[test]
    fn test_negative_payment_ignored() {
        let mut debt = sample_debt(1);
        assert_eq!(debt.apply_payment(-3, Utc::now().naive_utc()), 0);
        assert_eq!(debt.hours_paid, 0);
        assert!(!debt.is_paid);
    }

    #[test]
    fn test_source_derivation() {
        let debt = sample_debt(1);
        assert_eq!(debt.source(), DebtSource::Absence);
        assert!(!debt.is_accumulated);

        let acc = TeacherDebtRecord::from_missed_makeup(
            "t1",
            "c1",
            "s1",
            1,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            "mk1",
        );
        assert_eq!(acc.source(), DebtSource::MissedMakeup);
        assert!(acc.is_accumulated);
        assert_eq!(acc.accumulated_from_session_id.as_deref(), Some("mk1"));
    }

    #[test]
    fn test_link_makeup_session_dedup() {
        let mut debt = sample_debt(2);
        debt.link_makeup_session("mk1");
        debt.link_makeup_session("mk1");
        debt.link_makeup_session("mk2");
        assert_eq!(debt.makeup_session_ids, vec!["mk1", "mk2"]);
    }
}
