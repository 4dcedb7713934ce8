// ==========================================
// 校务排课系统 - 基础课表仓储
// ==========================================
// schedule_grid 表存表头，schedule_slot 表存槽位明细
// ==========================================

use crate::domain::schedule::{ScheduleGrid, ScheduleSlot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ScheduleGridRepository - 基础课表仓储
// ==========================================
pub struct ScheduleGridRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleGridRepository {
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

    /// 落库课表（表头 + 全部槽位，单事务）
    pub fn create(&self, grid: &ScheduleGrid) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO schedule_grid (
                schedule_id, days_per_week, periods_per_day, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?)"#,
            params![
                &grid.schedule_id,
                grid.days_per_week,
                grid.periods_per_day,
                &grid.created_at.format(DATETIME_FMT).to_string(),
                &grid.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        for slot in &grid.slots {
            tx.execute(
                r#"INSERT INTO schedule_slot (
                    schedule_id, day, period, teacher_id, subject_id, class_id
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    &grid.schedule_id,
                    slot.day,
                    slot.period,
                    &slot.teacher_id,
                    &slot.subject_id,
                    &slot.class_id,
                ],
            )?;
        }

        tx.commit()?;
        Ok(grid.schedule_id.clone())
    }

    /// 按 schedule_id 查询课表（含全部槽位）
    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<ScheduleGrid>> {
        let conn = self.get_conn()?;

        let header = match conn.query_row(
            r#"SELECT schedule_id, days_per_week, periods_per_day, created_at, updated_at
               FROM schedule_grid
               WHERE schedule_id = ?"#,
            params![schedule_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        ) {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            r#"SELECT day, period, teacher_id, subject_id, class_id
               FROM schedule_slot
               WHERE schedule_id = ?
               ORDER BY day, period, class_id"#,
        )?;

        let slots = stmt
            .query_map(params![schedule_id], |row| {
                Ok(ScheduleSlot {
                    day: row.get(0)?,
                    period: row.get(1)?,
                    teacher_id: row.get(2)?,
                    subject_id: row.get(3)?,
                    class_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<ScheduleSlot>, _>>()?;

        let (schedule_id, days_per_week, periods_per_day, created_at, updated_at) = header;
        Ok(Some(ScheduleGrid {
            schedule_id,
            days_per_week,
            periods_per_day,
            slots,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }

    /// 查询全部课表ID（按创建时间降序）
    pub fn list_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT schedule_id FROM schedule_grid ORDER BY created_at DESC"#,
        )?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(ids)
    }

    /// 显式单格编辑：改写某班级某 (day, period) 槽位的教师
    ///
    /// 课表的唯二变更途径之一（另一途径是整表重新生成）
    pub fn update_cell(
        &self,
        schedule_id: &str,
        class_id: &str,
        day: u32,
        period: u32,
        teacher_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let changed = conn.execute(
            r#"UPDATE schedule_slot
               SET teacher_id = ?
               WHERE schedule_id = ? AND class_id = ? AND day = ? AND period = ?"#,
            params![teacher_id, schedule_id, class_id, day, period],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "schedule_slot".to_string(),
                id: format!("{}/{}/d{}p{}", schedule_id, class_id, day, period),
            });
        }

        conn.execute(
            r#"UPDATE schedule_grid SET updated_at = datetime('now') WHERE schedule_id = ?"#,
            params![schedule_id],
        )?;

        Ok(())
    }

    /// 删除课表（槽位级联删除）
    pub fn delete(&self, schedule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "DELETE FROM schedule_grid WHERE schedule_id = ?",
            params![schedule_id],
        )?;

        Ok(())
    }
}

/// 解析数据库时间列
fn parse_datetime(s: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| {
        RepositoryError::ValidationError(format!("时间字段解析失败: {} ({})", s, e))
    })
}
