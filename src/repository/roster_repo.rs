// ==========================================
// 校务排课系统 - 师资主数据仓储（只读）
// ==========================================
// 红线: 师资主数据由外部校务模块维护，本仓储不提供写接口
// ==========================================

use crate::domain::roster::{SchoolClass, Subject, Teacher};
use crate::engine::roster::RosterProvider;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteRosterRepository - 师资主数据仓储
// ==========================================
pub struct SqliteRosterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRosterRepository {
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

    /// 查询全部教师（含离职，调用方按 active 过滤）
    pub fn find_all_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT teacher_id, name, weekly_capacity, active
               FROM teacher
               ORDER BY teacher_id"#,
        )?;

        let teachers = stmt
            .query_map([], |row| {
                Ok(Teacher {
                    teacher_id: row.get(0)?,
                    name: row.get(1)?,
                    weekly_capacity: row.get(2)?,
                    active: row.get::<_, i32>(3)? != 0,
                })
            })?
            .collect::<Result<Vec<Teacher>, _>>()?;

        Ok(teachers)
    }

    /// 查询全部科目
    pub fn find_all_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT subject_id, name, weekly_hours
               FROM subject
               ORDER BY subject_id"#,
        )?;

        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    subject_id: row.get(0)?,
                    name: row.get(1)?,
                    weekly_hours: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<Subject>, _>>()?;

        Ok(subjects)
    }

    /// 查询全部班级（周课时覆盖表存 JSON 列）
    pub fn find_all_classes(&self) -> RepositoryResult<Vec<SchoolClass>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT class_id, grade, subject_hours_json
               FROM school_class
               ORDER BY class_id"#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<(String, String, String)>, _>>()?;

        let mut classes = Vec::with_capacity(rows.len());
        for (class_id, grade, hours_json) in rows {
            let subject_hours: HashMap<String, i32> =
                serde_json::from_str(&hours_json).map_err(|e| RepositoryError::JsonError {
                    field: format!("school_class.subject_hours_json (class_id={})", class_id),
                    message: e.to_string(),
                })?;
            classes.push(SchoolClass {
                class_id,
                grade,
                subject_hours,
            });
        }

        Ok(classes)
    }
}

// RosterProvider 由仓储直接实现，引擎层只见 trait
impl RosterProvider for SqliteRosterRepository {
    fn get_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        self.find_all_teachers()
    }

    fn get_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        self.find_all_subjects()
    }

    fn get_classes(&self) -> RepositoryResult<Vec<SchoolClass>> {
        self.find_all_classes()
    }
}
