//! HTTP 接口层
//!
//! Axum 路由、处理器、中间件和服务器装配

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
