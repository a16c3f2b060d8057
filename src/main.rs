use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use quiz_chain_solver::orchestrator::StopReason;
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{ChainSolver, Config, SolveRequest};

/// 从起始题目地址开始自动解题
#[derive(Debug, Parser)]
#[command(name = "quiz-chain-solver", version)]
struct Cli {
    /// 起始题目地址
    url: String,

    /// 学生邮箱
    #[arg(long, env = "STUDENT_EMAIL")]
    email: String,

    /// 学生密钥
    #[arg(long, env = "STUDENT_SECRET", hide_env_values = true)]
    secret: String,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let request = SolveRequest::new(cli.email, cli.secret, cli.url);
    request.validate()?;
    request.authorize(&config)?;

    // 初始化并运行
    let solver = ChainSolver::from_config(Arc::new(config))?;
    let report = solver.run(&request).await;

    if report.stop_reason == StopReason::Failed {
        info!("💡 题目链因错误提前结束，详情见上方日志");
    }

    Ok(())
}
