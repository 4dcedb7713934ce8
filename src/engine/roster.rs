// ==========================================
// 校务排课系统 - 师资主数据访问接口
// ==========================================
// 职责: 屏蔽师资主数据的来源（外部校务模块），引擎只见 trait
// 约定: 返回全量数据（含离职教师），过滤 active 由引擎负责
// ==========================================

use crate::domain::roster::{RosterIndex, SchoolClass, Subject, Teacher};
use crate::repository::error::RepositoryResult;

/// 师资主数据提供方
///
/// 排课/代课引擎的唯一师资入口；生产实现是 SQLite 仓储，
/// 测试可用内存实现替换
pub trait RosterProvider {
    /// 全部教师
    fn get_teachers(&self) -> RepositoryResult<Vec<Teacher>>;

    /// 全部科目
    fn get_subjects(&self) -> RepositoryResult<Vec<Subject>>;

    /// 全部班级
    fn get_classes(&self) -> RepositoryResult<Vec<SchoolClass>>;

    /// 构建名称索引（展示冗余字段的数据源）
    fn roster_index(&self) -> RepositoryResult<RosterIndex> {
        Ok(RosterIndex::build(
            &self.get_teachers()?,
            &self.get_subjects()?,
            &self.get_classes()?,
        ))
    }
}
