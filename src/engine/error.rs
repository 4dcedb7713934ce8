// ==========================================
// 校务排课系统 - 引擎层错误类型
// ==========================================
// 致命条件走 Err；可恢复条件以冲突/告警列表随部分结果返回
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 排课生成 =====
    #[error("容量不足: 需求 {required} 节超过可用 {available} 节")]
    CapacityExceeded { required: i32, available: i32 },

    // ===== 补课日状态机 =====
    #[error("无效的状态转换: session={session_id} from={from} to={to}")]
    InvalidTransition {
        session_id: String,
        from: String,
        to: String,
    },

    #[error("补课日已进入终态，拒绝变更: session={session_id} status={status}")]
    TerminalState { session_id: String, status: String },

    // ===== 通用 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
