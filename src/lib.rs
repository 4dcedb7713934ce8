// ==========================================
// 校务排课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排课与欠课补偿核心引擎
// 范围: 排课生成 / 代课应急 / 欠课台账 / 周六补课核销
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ConflictKind, DebtSource, MakeupStatus};

// 领域实体
pub use domain::{
    AbsenceEvent, EmergencySchedule, EmergencySlot, MakeupSession, MakeupSlot, RosterIndex,
    ScheduleGrid, ScheduleSlot, SchoolClass, Subject, Teacher, TeacherDebtRecord,
};

// 引擎
pub use engine::{
    AnyTeacher, DebtLedger, EngineError, EngineResult, GridBuildResult, GridBuilder,
    MakeupScheduler, PaymentSummary, RandomPlacer, ReconciliationResult, RosterProvider,
    ScheduleConflict, SchedulingRepositories, SlotPlacer, SubstitutionEngine, SubstitutionResult,
    TeacherEligibility,
};

// 配置
pub use config::ScheduleConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "校务排课系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
