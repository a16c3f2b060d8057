//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 驱动整条题目链：读取页面 → 专用处理器或通用流程 → 提交 → 跟随下一题地址，
//! 受总时间预算约束，单题出错不影响调用方。
//!
//! ## 层次关系
//!
//! ```text
//! chain_solver (处理整条题目链)
//!     ↓
//! handlers (专用题型) / workflow::task_flow (通用流程)
//!     ↓
//! services (能力层：fetcher / normalizer / advisor / synthesizer)
//!     ↓
//! clients + browser + infrastructure
//! ```
//!
//! ## 设计原则
//!
//! 1. **顺序执行**：每题的提交结果决定下一题地址，链内不并发
//! 2. **资源隔离**：每题独立的附件目录，题目结束即删除
//! 3. **无业务逻辑**：只做调度和统计

pub mod chain_solver;

pub use chain_solver::{ChainReport, ChainSolver, StopReason};
