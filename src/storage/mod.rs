//! 存储模块 - 引擎配置与参考数据文件

pub mod config;
pub mod reference;
