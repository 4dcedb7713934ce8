// ==========================================
// 欠课台账引擎测试
// ==========================================
// 测试范围:
// 1. 核销钳制与 is_paid 推导（落库回读验证）
// 2. 多笔核销: 最早缺勤优先，预算剩余如实报回
// 3. 待补课列表排序与原始/累积分列
// ==========================================


use chrono::Utc;
use school_timetable::domain::debt::TeacherDebtRecord;
use school_timetable::engine::{DebtLedger, EngineError};
use school_timetable::repository::TeacherDebtRepository;
use std::sync::Arc;
use test_helpers::{create_absence_debt, create_test_db, date};

fn setup() -> (tempfile::NamedTempFile, Arc<TeacherDebtRepository>, DebtLedger) {
    let (temp_file, conn) = create_test_db().expect("创建测试数据库失败");
    let repo = Arc::new(TeacherDebtRepository::new(conn));
    let ledger = DebtLedger::new(repo.clone());
    (temp_file, repo, ledger)
}

// ==========================================
// 单笔核销
// ==========================================

#[test]
fn test_apply_payment_persists_and_clamps() {
    let (_tmp, repo, ledger) = setup();
    let debt = create_absence_debt(&repo, "t1", "c1", "math", 2, date(2024, 3, 4));

    // 超额核销 5 节，只入账 2 节
    let updated = ledger
        .apply_payment(&debt.debt_id, 5, Utc::now().naive_utc())
        .expect("核销失败");
    assert_eq!(updated.hours_paid, 2);
    assert!(updated.is_paid);
    assert_eq!(updated.paid_dates.len(), 1);

    // 落库回读一致
    let stored = repo
        .find_by_id(&debt.debt_id)
        .expect("查询失败")
        .expect("记录丢失");
    assert_eq!(stored.hours_paid, 2);
    assert!(stored.is_paid);
    assert_eq!(stored.remaining_hours(), 0);
}

#[test]
fn test_apply_payment_partial_keeps_unpaid() {
    let (_tmp, repo, ledger) = setup();
    let debt = create_absence_debt(&repo, "t1", "c1", "math", 3, date(2024, 3, 4));

    let updated = ledger
        .apply_payment(&debt.debt_id, 1, Utc::now().naive_utc())
        .expect("核销失败");
    assert_eq!(updated.hours_paid, 1);
    assert!(!updated.is_paid);
    assert_eq!(updated.remaining_hours(), 2);

    let stored = repo.find_by_id(&debt.debt_id).unwrap().unwrap();
    assert!(!stored.is_paid);
    assert_eq!(stored.paid_dates.len(), 1);
}

#[test]
fn test_apply_payment_unknown_debt() {
    let (_tmp, _repo, ledger) = setup();
    let err = ledger
        .apply_payment("missing", 1, Utc::now().naive_utc())
        .expect_err("未知记录必须报错");
    assert!(matches!(err, EngineError::NotFound { .. }));
}

// ==========================================
// 多笔核销: 最早缺勤优先
// ==========================================

#[test]
fn test_pay_oldest_first_ordering() {
    let (_tmp, repo, ledger) = setup();
    // 故意乱序插入
    let d_mid = create_absence_debt(&repo, "t1", "c1", "math", 2, date(2024, 3, 6));
    let d_old = create_absence_debt(&repo, "t1", "c1", "math", 2, date(2024, 3, 4));
    let d_new = create_absence_debt(&repo, "t1", "c1", "math", 2, date(2024, 3, 8));

    // 预算 3 节: 最早一笔还清 2 节，次早一笔入账 1 节，最新一笔不动
    let summary = ledger
        .pay_oldest_first("t1", 3, Utc::now().naive_utc())
        .expect("多笔核销失败");

    assert_eq!(summary.remainder, 0);
    assert_eq!(summary.payments.len(), 2);
    assert_eq!(summary.payments[0].debt_id, d_old.debt_id);
    assert_eq!(summary.payments[0].applied_hours, 2);
    assert_eq!(summary.payments[1].debt_id, d_mid.debt_id);
    assert_eq!(summary.payments[1].applied_hours, 1);

    let old = repo.find_by_id(&d_old.debt_id).unwrap().unwrap();
    assert!(old.is_paid, "最早欠课必须先被还清");
    let mid = repo.find_by_id(&d_mid.debt_id).unwrap().unwrap();
    assert_eq!(mid.hours_paid, 1);
    assert!(!mid.is_paid);
    let newest = repo.find_by_id(&d_new.debt_id).unwrap().unwrap();
    assert_eq!(newest.hours_paid, 0, "前面未还清时不得触碰后面的欠课");
}

#[test]
fn test_pay_oldest_first_reports_remainder() {
    let (_tmp, repo, ledger) = setup();
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 5));

    // 预算 10 节，只有 2 节欠课: 剩余 8 节必须报回
    let summary = ledger
        .pay_oldest_first("t1", 10, Utc::now().naive_utc())
        .expect("多笔核销失败");

    assert_eq!(summary.payments.len(), 2);
    assert_eq!(summary.remainder, 8);

    // 无欠课的教师: 预算原样报回
    let summary = ledger
        .pay_oldest_first("t2", 5, Utc::now().naive_utc())
        .expect("多笔核销失败");
    assert!(summary.payments.is_empty());
    assert_eq!(summary.remainder, 5);
}

// ==========================================
// 待补课列表
// ==========================================

#[test]
fn test_list_pending_sorted_by_absence_date() {
    let (_tmp, repo, ledger) = setup();
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 8));
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 6));

    // 已还清的不出现在待补课列表
    let paid = create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 1));
    ledger
        .apply_payment(&paid.debt_id, 1, Utc::now().naive_utc())
        .expect("核销失败");

    let pending = ledger.list_pending("t1").expect("查询失败");
    assert_eq!(pending.len(), 3);
    let dates: Vec<_> = pending.iter().map(|d| d.absence_date).collect();
    assert_eq!(dates, vec![date(2024, 3, 4), date(2024, 3, 6), date(2024, 3, 8)]);
}

#[test]
fn test_pending_report_splits_accumulated() {
    let (_tmp, repo, ledger) = setup();
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 4));
    create_absence_debt(&repo, "t1", "c1", "math", 1, date(2024, 3, 8));

    let acc = TeacherDebtRecord::from_missed_makeup("t1", "c1", "math", 1, date(2024, 3, 6), "mk1");
    repo.create(&acc).expect("插入累积欠课失败");

    let report = ledger.pending_report("t1").expect("报表生成失败");
    assert_eq!(report.original.len(), 2);
    assert_eq!(report.accumulated.len(), 1);
    assert_eq!(report.accumulated[0].debt_id, acc.debt_id);

    // 分列不改变各自的日期升序
    assert!(report.original[0].absence_date <= report.original[1].absence_date);
}
