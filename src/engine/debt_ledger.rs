// ==========================================
// 校务排课系统 - 欠课台账引擎
// ==========================================
// 红线: 核销带钳制，超出剩余欠课静默截断，绝不出现负剩余
// 红线: 多笔核销先还最早缺勤的欠课，还清一笔才进入下一笔
// 红线: 预算有剩余必须如实报回，不得静默丢弃
// ==========================================

use crate::domain::debt::TeacherDebtRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::debt_repo::TeacherDebtRepository;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// 结果类型
// ==========================================

/// 单笔核销入账明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub debt_id: String,
    pub applied_hours: i32,
}

/// 多笔核销汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub payments: Vec<PaymentApplication>, // 入账明细（按核销顺序）
    pub remainder: i32,                    // 未用完的课时预算
}

/// 待补课报表: 原始欠课与累积欠课分列（顺序均保持缺勤日期升序）
#[derive(Debug, Clone)]
pub struct PendingDebtReport {
    pub original: Vec<TeacherDebtRecord>,
    pub accumulated: Vec<TeacherDebtRecord>,
}

// ==========================================
// DebtLedger - 欠课台账引擎
// ==========================================
pub struct DebtLedger {
    debt_repo: Arc<TeacherDebtRepository>,
}

impl DebtLedger {
    pub fn new(debt_repo: Arc<TeacherDebtRepository>) -> Self {
        Self { debt_repo }
    }

    /// 单笔核销
    ///
    /// 超出剩余欠课的部分被钳制（非错误）；is_paid 由 hours 对比重算
    ///
    /// # 返回
    /// 核销后的欠课记录
    #[instrument(skip(self), fields(debt_id = %debt_id, hours))]
    pub fn apply_payment(
        &self,
        debt_id: &str,
        hours: i32,
        date: NaiveDateTime,
    ) -> EngineResult<TeacherDebtRecord> {
        let mut debt = self
            .debt_repo
            .find_by_id(debt_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "teacher_debt".to_string(),
                id: debt_id.to_string(),
            })?;

        let applied = debt.apply_payment(hours, date);
        if applied < hours {
            debug!(debt_id, hours, applied, "核销超出剩余欠课，已钳制");
        }
        self.debt_repo.update(&debt)?;

        Ok(debt)
    }

    /// 补课日核销: 入账并登记补课日回链
    pub fn pay_from_session(
        &self,
        debt_id: &str,
        hours: i32,
        session_id: &str,
        date: NaiveDateTime,
    ) -> EngineResult<PaymentApplication> {
        let mut debt = self
            .debt_repo
            .find_by_id(debt_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "teacher_debt".to_string(),
                id: debt_id.to_string(),
            })?;

        let applied = debt.apply_payment(hours, date);
        debt.link_makeup_session(session_id);
        self.debt_repo.update(&debt)?;

        Ok(PaymentApplication {
            debt_id: debt_id.to_string(),
            applied_hours: applied,
        })
    }

    /// 多笔核销: 最早缺勤优先
    ///
    /// 按缺勤日期升序逐笔核销，一笔还清（或预算耗尽）才进入下一笔；
    /// 剩余预算通过 remainder 报回
    #[instrument(skip(self), fields(teacher_id = %teacher_id, total_hours))]
    pub fn pay_oldest_first(
        &self,
        teacher_id: &str,
        total_hours: i32,
        date: NaiveDateTime,
    ) -> EngineResult<PaymentSummary> {
        let pending = self.debt_repo.list_pending_by_teacher(teacher_id)?;

        let mut budget = total_hours.max(0);
        let mut payments = Vec::new();

        for mut debt in pending {
            if budget <= 0 {
                break;
            }
            let applied = debt.apply_payment(budget, date);
            if applied > 0 {
                self.debt_repo.update(&debt)?;
                budget -= applied;
                payments.push(PaymentApplication {
                    debt_id: debt.debt_id.clone(),
                    applied_hours: applied,
                });
            }
        }

        info!(
            teacher_id,
            total_hours,
            paid = payments.len(),
            remainder = budget,
            "多笔核销完成"
        );

        Ok(PaymentSummary {
            payments,
            remainder: budget,
        })
    }

    /// 某教师待补课列表（缺勤日期升序）
    pub fn list_pending(&self, teacher_id: &str) -> EngineResult<Vec<TeacherDebtRecord>> {
        Ok(self.debt_repo.list_pending_by_teacher(teacher_id)?)
    }

    /// 待补课报表: 原始/累积分列，不改变核销顺序
    pub fn pending_report(&self, teacher_id: &str) -> EngineResult<PendingDebtReport> {
        let pending = self.debt_repo.list_pending_by_teacher(teacher_id)?;
        let (accumulated, original): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|d| d.is_accumulated);
        Ok(PendingDebtReport {
            original,
            accumulated,
        })
    }
}
