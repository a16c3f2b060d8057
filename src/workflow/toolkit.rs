//! 解题所需的全部能力
//!
//! 外部协作方（浏览器、LLM、语音、图片、PDF）以 trait 对象注入，
//! 其余客户端根据配置创建。整个题目链共享同一个 Toolkit，只读。

use std::sync::Arc;

use anyhow::Result;

use crate::browser::{ChromiumAcquirer, ContentAcquirer};
use crate::clients::{EvaluatorClient, GithubClient, LlmClient};
use crate::config::Config;
use crate::infrastructure::HttpClient;
use crate::services::{
    ArtifactFetcher, ArtifactNormalizer, ImageAnalyzer, LlmAdvisor, PdfExtractor,
    PdfTextExtractor, QuestionAdvisor, SpeechToText,
};

/// 可替换的外部协作方
#[derive(Clone)]
pub struct Collaborators {
    pub acquirer: Arc<dyn ContentAcquirer>,
    pub advisor: Arc<dyn QuestionAdvisor>,
    pub speech: Arc<dyn SpeechToText>,
    pub vision: Arc<dyn ImageAnalyzer>,
    pub pdf: Arc<dyn PdfTextExtractor>,
}

impl Collaborators {
    /// 生产环境：Chromium 渲染 + LLM 分析/转写/看图 + pdf-extract
    pub fn production(config: &Arc<Config>) -> Self {
        let llm = LlmClient::new(config);
        Self {
            acquirer: Arc::new(ChromiumAcquirer::new(Arc::clone(config))),
            advisor: Arc::new(LlmAdvisor::new(llm.clone())),
            speech: Arc::new(llm.clone()),
            vision: Arc::new(llm),
            pdf: Arc::new(PdfExtractor),
        }
    }
}

pub struct Toolkit {
    pub http: HttpClient,
    pub acquirer: Arc<dyn ContentAcquirer>,
    pub advisor: Arc<dyn QuestionAdvisor>,
    pub speech: Arc<dyn SpeechToText>,
    pub vision: Arc<dyn ImageAnalyzer>,
    pub fetcher: ArtifactFetcher,
    pub normalizer: ArtifactNormalizer,
    pub evaluator: EvaluatorClient,
    pub github: GithubClient,
}

impl Toolkit {
    pub fn new(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let http = HttpClient::new(config)?;
        Ok(Self {
            fetcher: ArtifactFetcher::new(http.clone()),
            normalizer: ArtifactNormalizer::new(
                collaborators.pdf,
                Arc::clone(&collaborators.speech),
            ),
            evaluator: EvaluatorClient::new(http.clone()),
            github: GithubClient::new(config, http.clone()),
            http,
            acquirer: collaborators.acquirer,
            advisor: collaborators.advisor,
            speech: collaborators.speech,
            vision: collaborators.vision,
        })
    }
}
