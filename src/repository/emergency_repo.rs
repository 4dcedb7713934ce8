// ==========================================
// 校务排课系统 - 应急课表仓储
// ==========================================
// 槽位列表/名单以 JSON 列落库；应急课表是历史快照，不提供更新接口
// absence_event_id 的唯一约束承担幂等防线：同一缺勤事件重复落库直接报错
// ==========================================

use crate::domain::emergency::{EmergencySchedule, EmergencySlot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// EmergencyScheduleRepository - 应急课表仓储
// ==========================================
pub struct EmergencyScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmergencyScheduleRepository {
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

    /// 落库应急课表
    ///
    /// # 返回
    /// - `Ok(emergency_id)`: 成功
    /// - `Err(UniqueConstraintViolation)`: 同一缺勤事件已处理过
    pub fn create(&self, emergency: &EmergencySchedule) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO emergency_schedule (
                emergency_id, base_schedule_id, absence_event_id, date, weekday, reason,
                absent_teacher_ids_json, affected_class_ids_json,
                original_slots_json, emergency_slots_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &emergency.emergency_id,
                &emergency.base_schedule_id,
                &emergency.absence_event_id,
                &emergency.date.format(DATE_FMT).to_string(),
                emergency.weekday,
                &emergency.reason,
                &serde_json::to_string(&emergency.absent_teacher_ids)?,
                &serde_json::to_string(&emergency.affected_class_ids)?,
                &serde_json::to_string(&emergency.original_slots)?,
                &serde_json::to_string(&emergency.emergency_slots)?,
                &emergency.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        Ok(emergency.emergency_id.clone())
    }

    /// 按 emergency_id 查询
    pub fn find_by_id(&self, emergency_id: &str) -> RepositoryResult<Option<EmergencySchedule>> {
        self.query_one(
            r#"SELECT emergency_id, base_schedule_id, absence_event_id, date, weekday, reason,
                      absent_teacher_ids_json, affected_class_ids_json,
                      original_slots_json, emergency_slots_json, created_at
               FROM emergency_schedule
               WHERE emergency_id = ?"#,
            emergency_id,
        )
    }

    /// 按缺勤事件ID查询（幂等检查入口）
    pub fn find_by_event_id(&self, event_id: &str) -> RepositoryResult<Option<EmergencySchedule>> {
        self.query_one(
            r#"SELECT emergency_id, base_schedule_id, absence_event_id, date, weekday, reason,
                      absent_teacher_ids_json, affected_class_ids_json,
                      original_slots_json, emergency_slots_json, created_at
               FROM emergency_schedule
               WHERE absence_event_id = ?"#,
            event_id,
        )
    }

    /// 按日期查询（同日可能有多起缺勤事件）
    pub fn list_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<EmergencySchedule>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT emergency_id, base_schedule_id, absence_event_id, date, weekday, reason,
                      absent_teacher_ids_json, affected_class_ids_json,
                      original_slots_json, emergency_slots_json, created_at
               FROM emergency_schedule
               WHERE date = ?
               ORDER BY created_at"#,
        )?;

        let rows = stmt
            .query_map(params![date.format(DATE_FMT).to_string()], map_raw_row)?
            .collect::<Result<Vec<RawEmergencyRow>, _>>()?;

        rows.into_iter().map(hydrate_row).collect()
    }

    fn query_one(&self, sql: &str, key: &str) -> RepositoryResult<Option<EmergencySchedule>> {
        let conn = self.get_conn()?;

        match conn.query_row(sql, params![key], map_raw_row) {
            Ok(raw) => Ok(Some(hydrate_row(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// 原始行（JSON 列未展开），展开放到锁外做
type RawEmergencyRow = (
    String,         // emergency_id
    String,         // base_schedule_id
    String,         // absence_event_id
    String,         // date
    u32,            // weekday
    Option<String>, // reason
    String,         // absent_teacher_ids_json
    String,         // affected_class_ids_json
    String,         // original_slots_json
    String,         // emergency_slots_json
    String,         // created_at
);

fn map_raw_row(row: &Row) -> rusqlite::Result<RawEmergencyRow> {
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

fn hydrate_row(raw: RawEmergencyRow) -> RepositoryResult<EmergencySchedule> {
    let (
        emergency_id,
        base_schedule_id,
        absence_event_id,
        date,
        weekday,
        reason,
        absent_json,
        affected_json,
        original_json,
        emergency_json,
        created_at,
    ) = raw;

    let original_slots: Vec<EmergencySlot> = serde_json::from_str(&original_json)?;
    let emergency_slots: Vec<EmergencySlot> = serde_json::from_str(&emergency_json)?;

    Ok(EmergencySchedule {
        emergency_id,
        base_schedule_id,
        absence_event_id,
        date: NaiveDate::parse_from_str(&date, DATE_FMT)
            .map_err(|e| RepositoryError::ValidationError(format!("日期解析失败: {} ({})", date, e)))?,
        weekday,
        reason,
        absent_teacher_ids: serde_json::from_str(&absent_json)?,
        affected_class_ids: serde_json::from_str(&affected_json)?,
        original_slots,
        emergency_slots,
        created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FMT).map_err(|e| {
            RepositoryError::ValidationError(format!("时间字段解析失败: {} ({})", created_at, e))
        })?,
    })
}
