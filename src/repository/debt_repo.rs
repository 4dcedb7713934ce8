// ==========================================
// 校务排课系统 - 欠课台账仓储
// ==========================================
// 红线: 台账只增不删；核销只走 update，不提供 delete
// ==========================================

use crate::domain::debt::TeacherDebtRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"debt_id, teacher_id, class_id, subject_id,
       hours_owed, hours_paid, absence_date,
       emergency_id, accumulated_from_session_id, is_accumulated, is_paid,
       paid_dates_json, makeup_session_ids_json, created_at, updated_at"#;

// ==========================================
// TeacherDebtRepository - 欠课台账仓储
// ==========================================
pub struct TeacherDebtRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherDebtRepository {
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

    /// 新增欠课记录
    pub fn create(&self, debt: &TeacherDebtRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO teacher_debt (
                debt_id, teacher_id, class_id, subject_id,
                hours_owed, hours_paid, absence_date,
                emergency_id, accumulated_from_session_id, is_accumulated, is_paid,
                paid_dates_json, makeup_session_ids_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &debt.debt_id,
                &debt.teacher_id,
                &debt.class_id,
                &debt.subject_id,
                debt.hours_owed,
                debt.hours_paid,
                &debt.absence_date.format(DATE_FMT).to_string(),
                &debt.emergency_id,
                &debt.accumulated_from_session_id,
                debt.is_accumulated as i32,
                debt.is_paid as i32,
                &paid_dates_to_json(&debt.paid_dates)?,
                &serde_json::to_string(&debt.makeup_session_ids)?,
                &debt.created_at.format(DATETIME_FMT).to_string(),
                &debt.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        Ok(debt.debt_id.clone())
    }

    /// 批量新增（同一事件产生的欠课整体落库）
    pub fn create_batch(&self, debts: &[TeacherDebtRecord]) -> RepositoryResult<usize> {
        for debt in debts {
            self.create(debt)?;
        }
        Ok(debts.len())
    }

    /// 按 debt_id 查询
    pub fn find_by_id(&self, debt_id: &str) -> RepositoryResult<Option<TeacherDebtRecord>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM teacher_debt WHERE debt_id = ?",
            SELECT_COLUMNS
        );
        match conn.query_row(&sql, params![debt_id], map_raw_row) {
            Ok(raw) => Ok(Some(hydrate_row(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 核销后的状态回写（hours_paid / is_paid / 轨迹字段）
    pub fn update(&self, debt: &TeacherDebtRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE teacher_debt
               SET hours_paid = ?, is_paid = ?,
                   paid_dates_json = ?, makeup_session_ids_json = ?, updated_at = ?
               WHERE debt_id = ?"#,
            params![
                debt.hours_paid,
                debt.is_paid as i32,
                &paid_dates_to_json(&debt.paid_dates)?,
                &serde_json::to_string(&debt.makeup_session_ids)?,
                &debt.updated_at.format(DATETIME_FMT).to_string(),
                &debt.debt_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "teacher_debt".to_string(),
                id: debt.debt_id.clone(),
            });
        }

        Ok(())
    }

    /// 某教师未还清的欠课（按缺勤日期升序）
    pub fn list_pending_by_teacher(
        &self,
        teacher_id: &str,
    ) -> RepositoryResult<Vec<TeacherDebtRecord>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {} FROM teacher_debt
               WHERE teacher_id = ? AND is_paid = 0
               ORDER BY absence_date ASC, created_at ASC"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![teacher_id], map_raw_row)?
            .collect::<Result<Vec<RawDebtRow>, _>>()?;

        rows.into_iter().map(hydrate_row).collect()
    }

    /// 全部未还清欠课（按缺勤日期升序；补课日生成的输入）
    pub fn list_pending_all(&self) -> RepositoryResult<Vec<TeacherDebtRecord>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {} FROM teacher_debt
               WHERE is_paid = 0
               ORDER BY absence_date ASC, created_at ASC"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], map_raw_row)?
            .collect::<Result<Vec<RawDebtRow>, _>>()?;

        rows.into_iter().map(hydrate_row).collect()
    }

    /// 某教师全部欠课记录（含已还清，审计用）
    pub fn list_by_teacher(&self, teacher_id: &str) -> RepositoryResult<Vec<TeacherDebtRecord>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {} FROM teacher_debt
               WHERE teacher_id = ?
               ORDER BY absence_date ASC, created_at ASC"#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![teacher_id], map_raw_row)?
            .collect::<Result<Vec<RawDebtRow>, _>>()?;

        rows.into_iter().map(hydrate_row).collect()
    }
}

// 原始行（JSON 列未展开）
type RawDebtRow = (
    String,         // debt_id
    String,         // teacher_id
    String,         // class_id
    String,         // subject_id
    i32,            // hours_owed
    i32,            // hours_paid
    String,         // absence_date
    Option<String>, // emergency_id
    Option<String>, // accumulated_from_session_id
    i32,            // is_accumulated
    i32,            // is_paid
    String,         // paid_dates_json
    String,         // makeup_session_ids_json
    String,         // created_at
    String,         // updated_at
);

fn map_raw_row(row: &Row) -> rusqlite::Result<RawDebtRow> {
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
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn hydrate_row(raw: RawDebtRow) -> RepositoryResult<TeacherDebtRecord> {
    let (
        debt_id,
        teacher_id,
        class_id,
        subject_id,
        hours_owed,
        hours_paid,
        absence_date,
        emergency_id,
        accumulated_from_session_id,
        is_accumulated,
        is_paid,
        paid_dates_json,
        makeup_ids_json,
        created_at,
        updated_at,
    ) = raw;

    Ok(TeacherDebtRecord {
        debt_id,
        teacher_id,
        class_id,
        subject_id,
        hours_owed,
        hours_paid,
        absence_date: parse_date(&absence_date)?,
        emergency_id,
        accumulated_from_session_id,
        is_accumulated: is_accumulated != 0,
        is_paid: is_paid != 0,
        paid_dates: paid_dates_from_json(&paid_dates_json)?,
        makeup_session_ids: serde_json::from_str(&makeup_ids_json)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn paid_dates_to_json(dates: &[NaiveDateTime]) -> RepositoryResult<String> {
    let strings: Vec<String> = dates
        .iter()
        .map(|d| d.format(DATETIME_FMT).to_string())
        .collect();
    Ok(serde_json::to_string(&strings)?)
}

fn paid_dates_from_json(json: &str) -> RepositoryResult<Vec<NaiveDateTime>> {
    let strings: Vec<String> = serde_json::from_str(json)?;
    strings.iter().map(|s| parse_datetime(s)).collect()
}

fn parse_date(s: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| RepositoryError::ValidationError(format!("日期解析失败: {} ({})", s, e)))
}

fn parse_datetime(s: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| RepositoryError::ValidationError(format!("时间字段解析失败: {} ({})", s, e)))
}
