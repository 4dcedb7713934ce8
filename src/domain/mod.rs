// ==========================================
// 校务排课系统 - 领域层
// ==========================================
// 职责: 实体与值对象定义,小而自洽的状态辅助方法
// 红线: 领域层不触数据库,不拼 SQL
// ==========================================

pub mod debt;
pub mod emergency;
pub mod makeup;
pub mod roster;
pub mod schedule;
pub mod types;

// 重导出核心实体
pub use debt::TeacherDebtRecord;
pub use emergency::{AbsenceEvent, EmergencySchedule, EmergencySlot};
pub use makeup::{MakeupSession, MakeupSlot};
pub use roster::{RosterIndex, SchoolClass, Subject, Teacher};
pub use schedule::{ScheduleGrid, ScheduleSlot};
pub use types::{ConflictKind, DebtSource, MakeupStatus};
