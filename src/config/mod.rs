// ==========================================
// 校务排课系统 - 配置层
// ==========================================
// 职责: 排课/补课参数的默认值与 config_kv 覆盖
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ScheduleConfig - 排课与补课参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub days_per_week: u32,             // 每周上课天数: 5
    pub periods_per_day: u32,           // 每日节次数: 6
    pub anti_consecutive: bool,         // 防连堂约束: 开
    pub attempt_multiplier: u32,        // 单科重试系数: 3 (重试上限 = 系数 × 周格数)
    pub makeup_period_template: Vec<u32>, // 补课日节次模板（上午四节）
    pub makeup_max_periods: u32,        // 补课日全场槽位预算
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            days_per_week: 5,
            periods_per_day: 6,
            anti_consecutive: true,
            attempt_multiplier: 3,
            makeup_period_template: vec![0, 1, 2, 3],
            makeup_max_periods: 16,
        }
    }
}

impl ScheduleConfig {
    /// 每班周格数（重试上限的基数）
    pub fn cells_per_class(&self) -> u32 {
        self.days_per_week * self.periods_per_day
    }

    /// 从 config_kv 表加载覆盖值（缺失键回落默认）
    ///
    /// 无法解析的值记 warn 并保留默认，不中断加载
    pub fn load(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let mut config = Self::default();
        let conn = conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE key LIKE 'schedule.%' OR key LIKE 'makeup.%'",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<(String, String)>, _>>()?;

        for (key, value) in rows {
            match key.as_str() {
                "schedule.days_per_week" => apply_u32(&mut config.days_per_week, &key, &value),
                "schedule.periods_per_day" => apply_u32(&mut config.periods_per_day, &key, &value),
                "schedule.anti_consecutive" => apply_bool(&mut config.anti_consecutive, &key, &value),
                "schedule.attempt_multiplier" => {
                    apply_u32(&mut config.attempt_multiplier, &key, &value)
                }
                "makeup.period_template" => match serde_json::from_str::<Vec<u32>>(&value) {
                    Ok(v) if !v.is_empty() => config.makeup_period_template = v,
                    _ => warn!(key, value, "配置值解析失败，保留默认"),
                },
                "makeup.max_periods" => apply_u32(&mut config.makeup_max_periods, &key, &value),
                _ => {}
            }
        }

        Ok(config)
    }
}

fn apply_u32(target: &mut u32, key: &str, value: &str) {
    match value.parse::<u32>() {
        Ok(v) if v > 0 => *target = v,
        _ => warn!(key, value, "配置值解析失败，保留默认"),
    }
}

fn apply_bool(target: &mut bool, key: &str, value: &str) {
    match value {
        "true" | "1" => *target = true,
        "false" | "0" => *target = false,
        _ => warn!(key, value, "配置值解析失败，保留默认"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScheduleConfig::default();
        assert_eq!(config.cells_per_class(), 30);
        assert_eq!(config.makeup_period_template.len(), 4);
    }
}
