// ==========================================
// 校务排课系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有跳过/冲突必须输出 reason
// ==========================================

pub mod debt_ledger;
pub mod error;
pub mod grid_builder;
pub mod makeup_scheduler;
pub mod repositories;
pub mod roster;
pub mod substitution;

// 重导出核心引擎
pub use debt_ledger::{DebtLedger, PaymentApplication, PaymentSummary, PendingDebtReport};
pub use error::{EngineError, EngineResult};
pub use grid_builder::{
    AnyTeacher, GridBuildResult, GridBuilder, PlacementContext, PlacementRequest, RandomPlacer,
    ScheduleConflict, SlotPlacer, TeacherEligibility,
};
pub use makeup_scheduler::{MakeupScheduler, ReconciliationResult};
pub use repositories::SchedulingRepositories;
pub use roster::RosterProvider;
pub use substitution::{SubstitutionEngine, SubstitutionResult};
