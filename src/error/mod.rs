//! 错误处理模块
//!
//! 注册循环中的错误按类别区分（地址解析失败、注册中心不可达、注册中心拒绝），
//! 启动阶段的配置与 IO 错误向上传播到 `main`。

pub mod code;
pub mod conversions;
pub mod entrypoint_error;

pub use code::ErrorCategory;
pub use entrypoint_error::{EntrypointError, Result};
