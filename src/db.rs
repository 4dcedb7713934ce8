// ==========================================
// 校务排课系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免部分模块外键开启/部分不开启
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，测试与生产共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要每个连接单独开启
/// - busy_timeout 需要每个连接单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等，全部使用 IF NOT EXISTS）
///
/// 表分两类：
/// - 师资主数据（teacher/subject/school_class）：由外部校务模块维护，本核心只读
/// - 核心数据（课表/应急课表/欠课台账/补课日）：由本核心读写
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ===== 师资主数据（外部维护，核心只读）=====

        CREATE TABLE IF NOT EXISTS teacher (
            teacher_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            weekly_capacity INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS subject (
            subject_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            weekly_hours INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS school_class (
            class_id TEXT PRIMARY KEY,
            grade TEXT NOT NULL,
            subject_hours_json TEXT NOT NULL DEFAULT '{}'
        );

        -- ===== 基础课表 =====

        CREATE TABLE IF NOT EXISTS schedule_grid (
            schedule_id TEXT PRIMARY KEY,
            days_per_week INTEGER NOT NULL,
            periods_per_day INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_slot (
            schedule_id TEXT NOT NULL REFERENCES schedule_grid(schedule_id) ON DELETE CASCADE,
            day INTEGER NOT NULL,
            period INTEGER NOT NULL,
            teacher_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            class_id TEXT NOT NULL,
            PRIMARY KEY (schedule_id, class_id, day, period)
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_slot_day
            ON schedule_slot(schedule_id, day);

        -- ===== 应急课表（代课）=====
        -- absence_event_id 唯一约束: 同一缺勤事件只允许生成一次应急课表

        CREATE TABLE IF NOT EXISTS emergency_schedule (
            emergency_id TEXT PRIMARY KEY,
            base_schedule_id TEXT NOT NULL,
            absence_event_id TEXT NOT NULL UNIQUE,
            date TEXT NOT NULL,
            weekday INTEGER NOT NULL,
            reason TEXT,
            absent_teacher_ids_json TEXT NOT NULL,
            affected_class_ids_json TEXT NOT NULL,
            original_slots_json TEXT NOT NULL,
            emergency_slots_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_emergency_date
            ON emergency_schedule(date);

        -- ===== 欠课台账 =====
        -- 只增不删: 还清只置 is_paid，保留审计轨迹

        CREATE TABLE IF NOT EXISTS teacher_debt (
            debt_id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            class_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            hours_owed INTEGER NOT NULL,
            hours_paid INTEGER NOT NULL DEFAULT 0,
            absence_date TEXT NOT NULL,
            emergency_id TEXT,
            accumulated_from_session_id TEXT,
            is_accumulated INTEGER NOT NULL DEFAULT 0,
            is_paid INTEGER NOT NULL DEFAULT 0,
            paid_dates_json TEXT NOT NULL DEFAULT '[]',
            makeup_session_ids_json TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_teacher_debt_pending
            ON teacher_debt(teacher_id, is_paid, absence_date);

        -- ===== 补课日（周六补课）=====

        CREATE TABLE IF NOT EXISTS makeup_session (
            session_id TEXT PRIMARY KEY,
            school_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            schedule_json TEXT NOT NULL,
            attended_teacher_ids_json TEXT NOT NULL DEFAULT '[]',
            absent_teacher_ids_json TEXT NOT NULL DEFAULT '[]',
            total_scheduled_hours INTEGER NOT NULL DEFAULT 0,
            total_realized_hours INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_makeup_status
            ON makeup_session(school_id, status);
        "#,
    )?;

    Ok(())
}
