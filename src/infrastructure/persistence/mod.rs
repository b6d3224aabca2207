//! 持久化层

pub mod fs;
