// ==========================================
// 校务排课系统 - 补课日仓储
// ==========================================
// 按班级组织的补课安排整体存 schedule_json 列
// ==========================================

use crate::domain::makeup::{MakeupSession, MakeupSlot};
use crate::domain::types::MakeupStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"session_id, school_id, date, status, schedule_json,
       attended_teacher_ids_json, absent_teacher_ids_json,
       total_scheduled_hours, total_realized_hours, created_at, updated_at"#;

// ==========================================
// MakeupSessionRepository - 补课日仓储
// ==========================================
pub struct MakeupSessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MakeupSessionRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 落库补课日
    pub fn create(&self, session: &MakeupSession) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO makeup_session (
                session_id, school_id, date, status, schedule_json,
                attended_teacher_ids_json, absent_teacher_ids_json,
                total_scheduled_hours, total_realized_hours, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &session.session_id,
                &session.school_id,
                &session.date.format(DATE_FMT).to_string(),
                session.status.to_db_str(),
                &serde_json::to_string(&session.schedule)?,
                &serde_json::to_string(&session.attended_teacher_ids)?,
                &serde_json::to_string(&session.absent_teacher_ids)?,
                session.total_scheduled_hours,
                session.total_realized_hours,
                &session.created_at.format(DATETIME_FMT).to_string(),
                &session.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        Ok(session.session_id.clone())
    }

    /// 按 session_id 查询
    pub fn find_by_id(&self, session_id: &str) -> RepositoryResult<Option<MakeupSession>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM makeup_session WHERE session_id = ?",
            SELECT_COLUMNS
        );
        match conn.query_row(&sql, params![session_id], map_raw_row) {
            Ok(raw) => Ok(Some(hydrate_row(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 状态/出勤/实际课时回写
    pub fn update(&self, session: &MakeupSession) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE makeup_session
               SET status = ?, schedule_json = ?,
                   attended_teacher_ids_json = ?, absent_teacher_ids_json = ?,
                   total_scheduled_hours = ?, total_realized_hours = ?, updated_at = ?
               WHERE session_id = ?"#,
            params![
                session.status.to_db_str(),
                &serde_json::to_string(&session.schedule)?,
                &serde_json::to_string(&session.attended_teacher_ids)?,
                &serde_json::to_string(&session.absent_teacher_ids)?,
                session.total_scheduled_hours,
                session.total_realized_hours,
                &session.updated_at.format(DATETIME_FMT).to_string(),
                &session.session_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "makeup_session".to_string(),
                id: session.session_id.clone(),
            });
        }

        Ok(())
    }

    /// 按学校与状态查询（按日期升序）
    pub fn list_by_status(
        &self,
        school_id: &str,
        status: MakeupStatus,
    ) -> RepositoryResult<Vec<MakeupSession>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {} FROM makeup_session
               WHERE school_id = ? AND status = ?
               ORDER BY date ASC"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![school_id, status.to_db_str()], map_raw_row)?
            .collect::<Result<Vec<RawSessionRow>, _>>()?;

        rows.into_iter().map(hydrate_row).collect()
    }
}

// 原始行（JSON 列未展开）
type RawSessionRow = (
    String, // session_id
    String, // school_id
    String, // date
    String, // status
    String, // schedule_json
    String, // attended_teacher_ids_json
    String, // absent_teacher_ids_json
    i32,    // total_scheduled_hours
    i32,    // total_realized_hours
    String, // created_at
    String, // updated_at
);

fn map_raw_row(row: &Row) -> rusqlite::Result<RawSessionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn hydrate_row(raw: RawSessionRow) -> RepositoryResult<MakeupSession> {
    let (
        session_id,
        school_id,
        date,
        status,
        schedule_json,
        attended_json,
        absent_json,
        total_scheduled_hours,
        total_realized_hours,
        created_at,
        updated_at,
    ) = raw;

    let schedule: BTreeMap<String, Vec<MakeupSlot>> = serde_json::from_str(&schedule_json)?;

    Ok(MakeupSession {
        session_id,
        school_id,
        date: NaiveDate::parse_from_str(&date, DATE_FMT)
            .map_err(|e| RepositoryError::ValidationError(format!("日期解析失败: {} ({})", date, e)))?,
        status: MakeupStatus::from_str(&status),
        schedule,
        attended_teacher_ids: serde_json::from_str(&attended_json)?,
        absent_teacher_ids: serde_json::from_str(&absent_json)?,
        total_scheduled_hours,
        total_realized_hours,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn parse_datetime(s: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| RepositoryError::ValidationError(format!("时间字段解析失败: {} ({})", s, e)))
}
