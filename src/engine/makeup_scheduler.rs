// ==========================================
// 校务排课系统 - 补课调度引擎
// ==========================================
// 状态机: PLANNED -> REALIZED | CANCELLED（终态）
// 红线: 出勤核销只允许执行一次；状态检查在引擎内强制，不依赖调用方自觉
// 红线: 缺席教师的槽位不动原欠课，另记累积欠课（债务链允许无限延伸）
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::debt::TeacherDebtRecord;
use crate::domain::makeup::{MakeupSession, MakeupSlot};
use crate::domain::roster::RosterIndex;
use crate::domain::types::MakeupStatus;
use crate::engine::debt_ledger::{DebtLedger, PaymentApplication};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::debt_repo::TeacherDebtRepository;
use crate::repository::makeup_repo::MakeupSessionRepository;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 出勤核销结果
#[derive(Debug, Clone)]
pub struct ReconciliationResult {
    pub session_id: String,
    pub payments: Vec<PaymentApplication>,    // 实到教师的入账明细
    pub new_debts: Vec<TeacherDebtRecord>,    // 缺席教师的累积欠课
    pub absent_teacher_ids: Vec<String>,      // 缺席教师
    pub total_scheduled_hours: i32,           // 计划核销课时
    pub total_realized_hours: i32,            // 实际核销课时（实到教师的计划课时）
}

// ==========================================
// MakeupScheduler - 补课调度引擎
// ==========================================
pub struct MakeupScheduler {
    debt_repo: Arc<TeacherDebtRepository>,
    makeup_repo: Arc<MakeupSessionRepository>,
    ledger: DebtLedger,
}

impl MakeupScheduler {
    pub fn new(
        debt_repo: Arc<TeacherDebtRepository>,
        makeup_repo: Arc<MakeupSessionRepository>,
    ) -> Self {
        let ledger = DebtLedger::new(debt_repo.clone());
        Self {
            debt_repo,
            makeup_repo,
            ledger,
        }
    }

    /// 从待补课台账生成补课日
    ///
    /// 取数顺序: 累积欠课优先于原始欠课，同类按缺勤日期升序。
    /// 每个欠课课时占独立槽位（同教师同班同科目的多笔欠课不合并）。
    /// 全场槽位预算 makeup_max_periods 耗尽即停（预算按场计，不按教师计）。
    /// 节次分配: 班级在节次模板上顺序取空位，且同一节次同一教师只占一个班；
    /// 找不到两者皆空的节次时该课时保持待补，不报错。
    ///
    /// # 返回
    /// 已落库的补课日（状态 PLANNED）
    #[instrument(skip(self, config, roster), fields(school_id = %school_id, date = %date))]
    pub fn generate_from_debts(
        &self,
        school_id: &str,
        date: NaiveDate,
        config: &ScheduleConfig,
        roster: &RosterIndex,
    ) -> EngineResult<MakeupSession> {
        let mut pending = self.debt_repo.list_pending_all()?;
        // 累积欠课优先，其次缺勤日期升序（false < true，取反实现优先）
        pending.sort_by(|a, b| {
            (!a.is_accumulated, a.absence_date, a.created_at).cmp(&(
                !b.is_accumulated,
                b.absence_date,
                b.created_at,
            ))
        });

        let mut session = MakeupSession::new(school_id, date);
        let mut budget = config.makeup_max_periods as i32;
        let template = &config.makeup_period_template;

        // 占用跟踪: 班级已用节次 / (教师, 节次) 已占
        let mut class_used: HashMap<String, HashSet<u32>> = HashMap::new();
        let mut teacher_used: HashSet<(String, u32)> = HashSet::new();

        'outer: for debt in &pending {
            for _ in 0..debt.remaining_hours() {
                if budget <= 0 {
                    break 'outer;
                }

                let used = class_used.entry(debt.class_id.clone()).or_default();
                let period = template.iter().copied().find(|p| {
                    !used.contains(p) && !teacher_used.contains(&(debt.teacher_id.clone(), *p))
                });

                let Some(period) = period else {
                    // 该班级/教师在模板内已无可用节次，这一课时留待下个补课日
                    warn!(
                        debt_id = %debt.debt_id,
                        class_id = %debt.class_id,
                        "节次模板耗尽，课时保持待补"
                    );
                    break;
                };

                used.insert(period);
                teacher_used.insert((debt.teacher_id.clone(), period));

                session.push_slot(MakeupSlot {
                    period,
                    class_id: debt.class_id.clone(),
                    subject_id: debt.subject_id.clone(),
                    teacher_id: debt.teacher_id.clone(),
                    debt_record_id: debt.debt_id.clone(),
                    hours_count: 1,
                    teacher_name: roster.teacher_name(&debt.teacher_id).map(|s| s.to_string()),
                    subject_name: roster.subject_name(&debt.subject_id).map(|s| s.to_string()),
                });
                budget -= 1;
            }
        }

        self.makeup_repo.create(&session)?;

        info!(
            session_id = %session.session_id,
            scheduled_hours = session.total_scheduled_hours,
            classes = session.schedule.len(),
            "补课日生成完成"
        );

        Ok(session)
    }

    /// 登记/撤销出勤
    ///
    /// 核销前可反复修改；终态补课日拒绝变更
    pub fn set_attendance(
        &self,
        session_id: &str,
        teacher_id: &str,
        attended: bool,
    ) -> EngineResult<MakeupSession> {
        let mut session = self.load(session_id)?;

        if session.status.is_terminal() {
            return Err(EngineError::TerminalState {
                session_id: session_id.to_string(),
                status: session.status.to_string(),
            });
        }

        session.set_attendance(teacher_id, attended);
        self.makeup_repo.update(&session)?;
        Ok(session)
    }

    /// 取消补课日（PLANNED -> CANCELLED）
    pub fn cancel(&self, session_id: &str) -> EngineResult<MakeupSession> {
        let mut session = self.load(session_id)?;

        if !session.status.can_transition_to(MakeupStatus::Cancelled) {
            return Err(EngineError::InvalidTransition {
                session_id: session_id.to_string(),
                from: session.status.to_string(),
                to: MakeupStatus::Cancelled.to_string(),
            });
        }

        session.status = MakeupStatus::Cancelled;
        session.updated_at = Utc::now().naive_utc();
        self.makeup_repo.update(&session)?;
        Ok(session)
    }

    /// 出勤核销（PLANNED -> REALIZED，一次性）
    ///
    /// - 实到教师: 其每个槽位向关联欠课入账 1 课时，并登记补课日回链
    /// - 缺席教师: 其每个槽位另记一笔累积欠课；原欠课保持未动（仍然待补）
    /// - 计划/实际课时合计回写补课日，供报表使用
    ///
    /// 状态不是 PLANNED 时拒绝执行（含重复核销），不会重复入账
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn process_after_realization(&self, session_id: &str) -> EngineResult<ReconciliationResult> {
        let mut session = self.load(session_id)?;

        if !session.status.can_transition_to(MakeupStatus::Realized) {
            return Err(EngineError::InvalidTransition {
                session_id: session_id.to_string(),
                from: session.status.to_string(),
                to: MakeupStatus::Realized.to_string(),
            });
        }

        let now = Utc::now().naive_utc();
        let attended: HashSet<&str> = session
            .attended_teacher_ids
            .iter()
            .map(|s| s.as_str())
            .collect();
        let absent_teacher_ids: Vec<String> = session
            .scheduled_teacher_ids()
            .into_iter()
            .filter(|id| !attended.contains(id.as_str()))
            .collect();
        let absent: HashSet<&str> = absent_teacher_ids.iter().map(|s| s.as_str()).collect();

        let mut payments = Vec::new();
        let mut new_debts = Vec::new();
        let mut realized_hours = 0;

        for slot in session.all_slots() {
            if absent.contains(slot.teacher_id.as_str()) {
                // 缺席: 原欠课不动，另记累积欠课
                let debt = TeacherDebtRecord::from_missed_makeup(
                    &slot.teacher_id,
                    &slot.class_id,
                    &slot.subject_id,
                    slot.hours_count,
                    session.date,
                    &session.session_id,
                );
                self.debt_repo.create(&debt)?;
                new_debts.push(debt);
            } else {
                // 实到: 向关联欠课入账
                let payment = self.ledger.pay_from_session(
                    &slot.debt_record_id,
                    slot.hours_count,
                    &session.session_id,
                    now,
                )?;
                realized_hours += slot.hours_count;
                payments.push(payment);
            }
        }

        session.absent_teacher_ids = absent_teacher_ids.clone();
        session.total_realized_hours = realized_hours;
        session.status = MakeupStatus::Realized;
        session.updated_at = now;
        self.makeup_repo.update(&session)?;

        info!(
            session_id = %session.session_id,
            realized_hours,
            scheduled_hours = session.total_scheduled_hours,
            new_debts = new_debts.len(),
            "出勤核销完成"
        );

        Ok(ReconciliationResult {
            session_id: session.session_id.clone(),
            payments,
            new_debts,
            absent_teacher_ids,
            total_scheduled_hours: session.total_scheduled_hours,
            total_realized_hours: realized_hours,
        })
    }

    fn load(&self, session_id: &str) -> EngineResult<MakeupSession> {
        self.makeup_repo
            .find_by_id(session_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "makeup_session".to_string(),
                id: session_id.to_string(),
            })
    }
}
