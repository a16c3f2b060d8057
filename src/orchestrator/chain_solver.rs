//! 题目链求解器 - 编排层
//!
//! ## 职责
//!
//! 从起始地址开始逐题处理，直到没有下一题、超出时间预算或遇到无法恢复的错误。
//!
//! ## 核心流程（每道题）
//!
//! 1. **时间检查**：超出预算则停止（不报错）
//! 2. **读取页面**：通过 ContentAcquirer 渲染题目页面
//! 3. **专用处理器**：按优先级匹配，匹配成功则由处理器独占本题
//! 4. **通用流程**：未匹配或处理器在提交前失败时交给 `workflow::task_flow`
//! 5. **清理附件**：无论成功与否都删除本题的临时目录
//!
//! 出错时如果错误中带有下一题地址，则从该地址继续，否则结束。
//! 任何情况下 `run` 都正常返回。

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{continuation_from, SolveError};
use crate::handlers::{HandlerOutcome, HandlerRegistry};
use crate::models::{SolveRequest, SubmissionResult, Task};
use crate::services::TaskArtifacts;
use crate::utils::logging;
use crate::workflow::{task_flow, Collaborators, TaskCtx, Toolkit};

/// 题目链结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 没有下一题
    Completed,
    /// 超出时间预算
    DeadlineExceeded,
    /// 出错且没有可继续的地址
    Failed,
}

/// 一次运行的统计，仅用于日志和测试
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub tasks_attempted: usize,
    pub tasks_submitted: usize,
    pub stop_reason: StopReason,
    pub last_result: Option<SubmissionResult>,
    pub elapsed: Duration,
}

/// 题目链求解器
///
/// 配置和工具集在构建后只读，多个请求可以共享同一个实例并发运行。
pub struct ChainSolver {
    config: Arc<Config>,
    toolkit: Toolkit,
    handlers: HandlerRegistry,
}

impl ChainSolver {
    pub fn new(config: Arc<Config>, collaborators: Collaborators) -> Result<Self> {
        let toolkit = Toolkit::new(&config, collaborators)?;
        Ok(Self {
            config,
            toolkit,
            handlers: HandlerRegistry::standard(),
        })
    }

    /// 使用生产环境的协作方（Chromium + LLM）
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let collaborators = Collaborators::production(&config);
        Self::new(config, collaborators)
    }

    /// 校验请求后在后台开始求解，立即返回
    ///
    /// 校验失败时不启动任何任务。
    pub fn accept(
        self: Arc<Self>,
        request: SolveRequest,
    ) -> Result<JoinHandle<ChainReport>, SolveError> {
        request.validate()?;
        request.authorize(&self.config)?;
        info!("✓ 已接受请求: {} → {}", request.email, request.url);
        Ok(self.spawn(request))
    }

    /// 在后台运行整条题目链
    pub fn spawn(self: Arc<Self>, request: SolveRequest) -> JoinHandle<ChainReport> {
        tokio::spawn(async move { self.run(&request).await })
    }

    /// 运行整条题目链
    pub async fn run(&self, request: &SolveRequest) -> ChainReport {
        let started = Instant::now();
        let budget = self.config.time_budget();
        logging::log_chain_start(&request.url, &request.email, self.config.time_budget_secs);

        let mut report = ChainReport {
            tasks_attempted: 0,
            tasks_submitted: 0,
            stop_reason: StopReason::Completed,
            last_result: None,
            elapsed: Duration::ZERO,
        };
        let mut current_url = Some(request.url.clone());

        report.stop_reason = loop {
            let Some(url) = current_url.take() else {
                info!("🏁 没有下一题，题目链完成");
                break StopReason::Completed;
            };

            if started.elapsed() >= budget {
                warn!(
                    "⏱️ 已用时 {:.1} 秒，超出预算 {} 秒，停止",
                    started.elapsed().as_secs_f64(),
                    self.config.time_budget_secs
                );
                break StopReason::DeadlineExceeded;
            }

            report.tasks_attempted += 1;
            let index = report.tasks_attempted;
            logging::log_task_start(index, &url);

            match self.solve_task(index, &url, request).await {
                Ok(result) => {
                    report.tasks_submitted += 1;
                    current_url = result.next_url().map(str::to_string);
                    report.last_result = Some(result);
                }
                Err(e) => {
                    error!("[题目 #{}] ❌ 处理失败: {:#}", index, e);
                    match continuation_from(&e) {
                        Some(next) => {
                            warn!("[题目 #{}] ↪️ 错误中带有下一题地址，继续: {}", index, next);
                            current_url = Some(next);
                        }
                        None => break StopReason::Failed,
                    }
                }
            }
        };

        report.elapsed = started.elapsed();
        logging::print_chain_summary(&report);
        report
    }

    /// 处理一道题，结束后释放本题的附件
    async fn solve_task(
        &self,
        index: usize,
        url: &str,
        request: &SolveRequest,
    ) -> Result<SubmissionResult> {
        let artifacts = TaskArtifacts::create(&self.config.temp_dir)?;
        let outcome = self.attempt(index, url, request, &artifacts).await;

        if let Err(e) = artifacts.release() {
            warn!("[题目 #{}] ⚠️ 清理附件失败: {:#}", index, e);
        }
        outcome
    }

    async fn attempt(
        &self,
        index: usize,
        url: &str,
        request: &SolveRequest,
        artifacts: &TaskArtifacts,
    ) -> Result<SubmissionResult> {
        let page = self.toolkit.acquirer.acquire(url).await?;
        let task = Task::from_page(url, page);
        debug!(
            "[题目 #{}] 📝 题干: {}",
            index,
            logging::truncate_text(&task.question, 300)
        );

        let ctx = TaskCtx {
            index,
            task: &task,
            request,
            config: &self.config,
            toolkit: &self.toolkit,
            artifacts,
        };

        match self.handlers.dispatch(&ctx).await {
            HandlerOutcome::Handled(result) => Ok(result),
            HandlerOutcome::NotHandled => task_flow::run(&ctx).await,
            HandlerOutcome::Failed(e) => Err(e),
        }
    }
}
