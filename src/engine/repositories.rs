// ==========================================
// 校务排课系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合核心引擎所需的全部 Repository，简化依赖注入
// ==========================================

use std::sync::{Arc, Mutex};

use crate::repository::{
    EmergencyScheduleRepository, MakeupSessionRepository, ScheduleGridRepository,
    TeacherDebtRepository,
};
use rusqlite::Connection;

/// 核心引擎仓储集合
#[derive(Clone)]
pub struct SchedulingRepositories {
    /// 基础课表仓储
    pub schedule_repo: Arc<ScheduleGridRepository>,
    /// 应急课表仓储
    pub emergency_repo: Arc<EmergencyScheduleRepository>,
    /// 欠课台账仓储
    pub debt_repo: Arc<TeacherDebtRepository>,
    /// 补课日仓储
    pub makeup_repo: Arc<MakeupSessionRepository>,
}

impl SchedulingRepositories {
    /// 创建新的仓储集合
    pub fn new(
        schedule_repo: Arc<ScheduleGridRepository>,
        emergency_repo: Arc<EmergencyScheduleRepository>,
        debt_repo: Arc<TeacherDebtRepository>,
        makeup_repo: Arc<MakeupSessionRepository>,
    ) -> Self {
        Self {
            schedule_repo,
            emergency_repo,
            debt_repo,
            makeup_repo,
        }
    }

    /// 从共享连接构造全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            schedule_repo: Arc::new(ScheduleGridRepository::new(conn.clone())),
            emergency_repo: Arc::new(EmergencyScheduleRepository::new(conn.clone())),
            debt_repo: Arc::new(TeacherDebtRepository::new(conn.clone())),
            makeup_repo: Arc::new(MakeupSessionRepository::new(conn)),
        }
    }
}
