//! 工具函数模块
//!
//! 此模块包含了项目中使用的各种工具函数：
//! - 控制台状态输出
//! - 交互式确认
//! - 步骤日志文件

pub mod artifacts;
pub mod console;
pub mod prompt;
