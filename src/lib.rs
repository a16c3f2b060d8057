//! # Quiz Chain Solver
//!
//! 自动完成一条"题目链"：打开题目页面、理解题目、收集附件、计算答案、提交，
//! 再根据评测端返回的下一题地址继续，直到题目链结束或超出时间预算。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、HTTP 连接池），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供导航和读取页面文本的能力
//! - `HttpClient` - 带超时和 User-Agent 的 HTTP 客户端
//!
//! ### ② 外部接口（Browser / Clients）
//! - `browser/` - 启动或连接 Chromium，`ContentAcquirer` 读取渲染后的页面
//! - `clients/` - LLM、评测端、GitHub 文件树接口
//!
//! ### ③ 业务能力层（Services）
//! - `ArtifactFetcher` / `ArtifactNormalizer` - 附件下载与整理
//! - `QuestionAdvisor` - LLM 分析题目、根据数据生成答案
//! - `synthesizer` - 答案优先级、类型转换、个性化偏移
//!
//! ### ④ 专用处理器（Handlers）
//! - GitHub 文件树计数、热力图颜色、CSV 规范化、音频口令
//!
//! ### ⑤ 流程层（Workflow）
//! - `TaskCtx` - 上下文封装（题目序号 + 资源）
//! - `task_flow` - 通用流程（分析 → 附件 → 答案 → 提交）
//!
//! ### ⑥ 编排层（Orchestration）
//! - `ChainSolver` - 题目链循环、时间预算、出错后继续
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::SolveError;
pub use models::{Answer, SolveRequest, SubmissionResult, Task};
pub use orchestrator::{ChainReport, ChainSolver, StopReason};
pub use workflow::{Collaborators, TaskCtx, Toolkit};
