//! HTTP 接口层：路由、认证中间件、错误映射

pub mod jwt;
pub mod middleware;
pub mod services;
