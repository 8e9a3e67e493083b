//! 配置流程模块
//!
//! 该模块把存储桶的创建与配置组织为有序的步骤，由运行器依次执行。

// 声明子模块
pub mod consistency;
pub mod error;
pub mod report;
pub mod runner;
pub mod step;

// 重新导出常用的类型
pub use error::{ApiStep, ProvisionError, ProvisionWarning};
pub use report::{BucketOutcome, ProvisionReport};
pub use runner::Provisioner;
pub use step::{Stage, Step};
