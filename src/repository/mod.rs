// ==========================================
// 校务排课系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod debt_repo;
pub mod emergency_repo;
pub mod error;
pub mod makeup_repo;
pub mod roster_repo;
pub mod schedule_repo;

// 重导出核心仓储
pub use debt_repo::TeacherDebtRepository;
pub use emergency_repo::EmergencyScheduleRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use makeup_repo::MakeupSessionRepository;
pub use roster_repo::SqliteRosterRepository;
pub use schedule_repo::ScheduleGridRepository;
