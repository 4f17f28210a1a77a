// ==========================================
// 邮件预热引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod entity_repo;
pub mod error;
pub mod outcome_repo;
pub mod pause_repo;
pub mod policy_repo;

// 重导出核心仓储
pub use entity_repo::SendingEntityRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use outcome_repo::OutcomeEventRepository;
pub use pause_repo::PauseRecordRepository;
pub use policy_repo::WarmupPolicyRepository;
