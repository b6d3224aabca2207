//! 基础设施层
//!
//! 端口的具体实现：引擎适配器、文件系统缓存、转码器、HTTP 接口

pub mod adapters;
pub mod http;
pub mod persistence;
