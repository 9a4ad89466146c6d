//! Academic Portal - 教务门户数据访问与统计层
//!
//! 面向学生 / 教师 / 系主任 / 管理员的考勤、成绩与通知数据访问，
//! 后端为 Supabase 风格的托管服务（认证、关系表、实时变更）。
//!
//! # 架构
//! - `auth`: 会话、请求上下文与认证提供者（GoTrue / 内存）
//! - `calc`: 出勤率、得分率、等级与汇总统计
//! - `config`: 配置管理
//! - `errors`: 统一错误处理与远端错误码归一化
//! - `models`: 数据模型定义
//! - `runtime`: 日志初始化与启动装配
//! - `services`: 领域查询、写操作网关与实时订阅
//! - `storage`: 远端存储层（PostgREST / 内存）
//! - `utils`: 工具函数

pub mod auth;
pub mod calc;
pub mod config;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
