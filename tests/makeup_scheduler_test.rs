// ==========================================
// 补课调度引擎测试
// ==========================================
// 测试范围:
// 1. 补课日生成: 取数顺序 / 一课时一槽位 / 全场预算 / 模板耗尽
// 2. 出勤登记的可变性与终态拒绝
// 3. 出勤核销: 实到入账、缺席累积、封闭核算、一次性执行
// ==========================================


use chrono::NaiveDate;
use school_timetable::config::ScheduleConfig;
use school_timetable::domain::debt::TeacherDebtRecord;
use school_timetable::domain::roster::RosterIndex;
use school_timetable::domain::types::MakeupStatus;
use school_timetable::engine::{EngineError, MakeupScheduler};
use school_timetable::repository::{MakeupSessionRepository, TeacherDebtRepository};
use std::sync::Arc;
use test_helpers::{create_absence_debt, create_test_db, date};

struct Ctx {
    _tmp: tempfile::NamedTempFile,
    debt_repo: Arc<TeacherDebtRepository>,
    makeup_repo: Arc<MakeupSessionRepository>,
    scheduler: MakeupScheduler,
    config: ScheduleConfig,
    roster: RosterIndex,
}

fn setup() -> Ctx {
    let (tmp, conn) = create_test_db().expect("创建测试数据库失败");
    let debt_repo = Arc::new(TeacherDebtRepository::new(conn.clone()));
    let makeup_repo = Arc::new(MakeupSessionRepository::new(conn));
    let scheduler = MakeupScheduler::new(debt_repo.clone(), makeup_repo.clone());
    Ctx {
        _tmp: tmp,
        debt_repo,
        makeup_repo,
        scheduler,
        config: ScheduleConfig::default(),
        roster: RosterIndex::default(),
    }
}

/// 周六补课日
fn saturday() -> NaiveDate {
    date(2024, 3, 9)
}

// ==========================================
// 补课日生成
// ==========================================

#[test]
fn test_generate_prioritizes_accumulated_then_oldest() {
    let ctx = setup();
    // 原始欠课日期更早，但累积欠课优先
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 1));
    let acc = TeacherDebtRecord::from_missed_makeup("t2", "c2", "math", 1, date(2024, 3, 5), "mk0");
    ctx.debt_repo.create(&acc).expect("插入累积欠课失败");

    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    assert_eq!(session.status, MakeupStatus::Planned);
    assert_eq!(session.total_scheduled_hours, 2);

    // 累积欠课的槽位排在其班级的首个模板节次
    let acc_slots = &session.schedule["c2"];
    assert_eq!(acc_slots.len(), 1);
    assert_eq!(acc_slots[0].debt_record_id, acc.debt_id);
    assert_eq!(acc_slots[0].period, 0);
}

#[test]
fn test_one_slot_per_debt_hour_no_merging() {
    let ctx = setup();
    // 同教师同班同科目: 一笔 2 节 + 一笔 1 节 -> 3 个独立槽位
    let d1 = create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 2, date(2024, 3, 4));
    let d2 = create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 5));

    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    let slots = &session.schedule["c1"];
    assert_eq!(slots.len(), 3, "一课时一槽位，不得合并");
    assert_eq!(slots.iter().filter(|s| s.debt_record_id == d1.debt_id).count(), 2);
    assert_eq!(slots.iter().filter(|s| s.debt_record_id == d2.debt_id).count(), 1);
    for slot in slots {
        assert_eq!(slot.hours_count, 1);
    }
    // 同班槽位节次互不相同
    let mut periods: Vec<u32> = slots.iter().map(|s| s.period).collect();
    periods.sort();
    periods.dedup();
    assert_eq!(periods.len(), 3);
}

#[test]
fn test_global_period_budget_stops_generation() {
    let mut ctx = setup();
    ctx.config.makeup_max_periods = 2;
    // 三名教师各欠 1 节（不同班级，互不挤占模板）
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    create_absence_debt(&ctx.debt_repo, "t2", "c2", "math", 1, date(2024, 3, 5));
    create_absence_debt(&ctx.debt_repo, "t3", "c3", "math", 1, date(2024, 3, 6));

    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    // 预算按全场计（不按教师计）: 只排 2 个槽位，最新的欠课留待下次
    assert_eq!(session.total_scheduled_hours, 2);
    assert!(session.schedule.contains_key("c1"));
    assert!(session.schedule.contains_key("c2"));
    assert!(!session.schedule.contains_key("c3"));
}

#[test]
fn test_class_template_exhaustion_leaves_hours_pending() {
    let ctx = setup();
    // 单班欠 5 节，模板只有 4 个节次: 第 5 节保持待补，不报错
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 5, date(2024, 3, 4));

    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("模板耗尽不是错误");

    assert_eq!(session.total_scheduled_hours, 4);
    assert_eq!(session.schedule["c1"].len(), 4);
}

// ==========================================
// 出勤登记
// ==========================================

#[test]
fn test_attendance_mutable_until_reconciliation() {
    let ctx = setup();
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    // 先登记缺席，再改为实到
    ctx.scheduler
        .set_attendance(&session.session_id, "t1", false)
        .expect("登记失败");
    let updated = ctx
        .scheduler
        .set_attendance(&session.session_id, "t1", true)
        .expect("改判失败");
    assert!(updated.is_attended("t1"));
    assert!(updated.absent_teacher_ids.is_empty());
}

#[test]
fn test_attendance_rejected_after_terminal() {
    let ctx = setup();
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    ctx.scheduler.cancel(&session.session_id).expect("取消失败");

    let err = ctx
        .scheduler
        .set_attendance(&session.session_id, "t1", true)
        .expect_err("终态补课日必须拒绝出勤变更");
    assert!(matches!(err, EngineError::TerminalState { .. }));
}

// ==========================================
// 出勤核销
// ==========================================

#[test]
fn test_reconcile_attended_teacher_pays_debt() {
    let ctx = setup();
    let debt = create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    ctx.scheduler
        .set_attendance(&session.session_id, "t1", true)
        .expect("登记失败");
    let result = ctx
        .scheduler
        .process_after_realization(&session.session_id)
        .expect("核销失败");

    assert_eq!(result.total_realized_hours, 1);
    assert!(result.new_debts.is_empty(), "实到教师不得产生新欠课");

    let stored = ctx.debt_repo.find_by_id(&debt.debt_id).unwrap().unwrap();
    assert_eq!(stored.hours_paid, 1);
    assert!(stored.is_paid);
    assert_eq!(stored.makeup_session_ids, vec![session.session_id.clone()]);

    let stored_session = ctx
        .makeup_repo
        .find_by_id(&session.session_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored_session.status, MakeupStatus::Realized);
    assert_eq!(stored_session.total_realized_hours, 1);
}

#[test]
fn test_reconcile_absent_teacher_accrues_new_debt() {
    let ctx = setup();
    let debt = create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    // 未登记出勤 = 缺席
    let result = ctx
        .scheduler
        .process_after_realization(&session.session_id)
        .expect("核销失败");

    assert_eq!(result.absent_teacher_ids, vec!["t1"]);
    assert_eq!(result.total_realized_hours, 0);
    assert_eq!(result.new_debts.len(), 1);

    // 原欠课原封不动
    let original = ctx.debt_repo.find_by_id(&debt.debt_id).unwrap().unwrap();
    assert_eq!(original.hours_paid, 0);
    assert!(!original.is_paid);

    // 新欠课: 累积，回链补课日
    let accumulated = &result.new_debts[0];
    assert!(accumulated.is_accumulated);
    assert_eq!(accumulated.hours_owed, 1);
    assert_eq!(accumulated.teacher_id, "t1");
    assert_eq!(accumulated.class_id, "c1");
    assert_eq!(accumulated.subject_id, "math");
    assert_eq!(
        accumulated.accumulated_from_session_id.as_deref(),
        Some(session.session_id.as_str())
    );
    assert_eq!(accumulated.absence_date, saturday());

    // 落库确认: 教师现在欠 2 节（原 1 + 累积 1）
    let pending = ctx.debt_repo.list_pending_by_teacher("t1").unwrap();
    assert_eq!(pending.len(), 2);
}

#[test]
fn test_reconcile_closed_system_totals() {
    let ctx = setup();
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 2, date(2024, 3, 4));
    create_absence_debt(&ctx.debt_repo, "t2", "c2", "chinese", 1, date(2024, 3, 5));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");
    assert_eq!(session.total_scheduled_hours, 3);

    ctx.scheduler
        .set_attendance(&session.session_id, "t1", true)
        .expect("登记失败");
    ctx.scheduler
        .set_attendance(&session.session_id, "t2", false)
        .expect("登记失败");

    let result = ctx
        .scheduler
        .process_after_realization(&session.session_id)
        .expect("核销失败");

    // 封闭核算: 实到课时 + 缺席课时 = 计划课时
    let absent_hours: i32 = result.new_debts.iter().map(|d| d.hours_owed).sum();
    assert_eq!(
        result.total_realized_hours + absent_hours,
        result.total_scheduled_hours
    );
    assert_eq!(result.total_realized_hours, 2);
    assert_eq!(absent_hours, 1);
}

#[test]
fn test_reconcile_runs_exactly_once() {
    let ctx = setup();
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    ctx.scheduler
        .process_after_realization(&session.session_id)
        .expect("首次核销失败");

    // 重复核销必须被拒绝（否则会重复记账）
    let err = ctx
        .scheduler
        .process_after_realization(&session.session_id)
        .expect_err("重复核销必须报错");
    match err {
        EngineError::InvalidTransition { from, to, .. } => {
            assert_eq!(from, "REALIZED");
            assert_eq!(to, "REALIZED");
        }
        other => panic!("错误类型不符: {:?}", other),
    }

    // 欠课台账没有被二次污染
    let pending = ctx.debt_repo.list_pending_by_teacher("t1").unwrap();
    assert_eq!(pending.len(), 2, "原欠课 + 一笔累积，不得再多");
}

#[test]
fn test_reconcile_rejected_on_cancelled_session() {
    let ctx = setup();
    create_absence_debt(&ctx.debt_repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    let session = ctx
        .scheduler
        .generate_from_debts("school1", saturday(), &ctx.config, &ctx.roster)
        .expect("生成补课日失败");

    ctx.scheduler.cancel(&session.session_id).expect("取消失败");

    let err = ctx
        .scheduler
        .process_after_realization(&session.session_id)
        .expect_err("已取消补课日不得核销");
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    // 取消也是终态: 不能再取消一次
    let err = ctx
        .scheduler
        .cancel(&session.session_id)
        .expect_err("终态不得重复取消");
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
}
