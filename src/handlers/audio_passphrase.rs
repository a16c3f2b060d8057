//! 音频口令题：转写音频，答案为清洗后的文字

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use super::{TaskHandler, SUBMIT_PATH};
use crate::models::{Answer, SubmissionResult};
use crate::workflow::TaskCtx;

const AUDIO_PATH: &str = "/project2/audio-passphrase.opus";
const AUDIO_FILE_NAME: &str = "audio-passphrase.opus";
const TASK_ID_PATH: &str = "/project2-audio-passphrase";

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern"));

pub struct AudioPassphraseHandler;

/// 小写、去首尾空白、去掉标点
pub fn clean_transcript(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    PUNCTUATION.replace_all(lowered.trim(), "").into_owned()
}

#[async_trait]
impl TaskHandler for AudioPassphraseHandler {
    fn name(&self) -> &'static str {
        "audio-passphrase"
    }

    fn matches(&self, url: &str, question: &str) -> bool {
        url.contains("audio") || question.contains("audio") || question.contains("Transcribe")
    }

    async fn solve(&self, ctx: &TaskCtx<'_>) -> Result<SubmissionResult> {
        let audio_url = ctx.config.evaluator_url(AUDIO_PATH);
        let artifact = ctx
            .toolkit
            .fetcher
            .fetch(&audio_url, Some(&ctx.task.url), ctx.artifacts)
            .await?;

        let phrase = match ctx
            .toolkit
            .speech
            .transcribe_audio(AUDIO_FILE_NAME, &artifact.bytes)
            .await
        {
            Ok(text) => {
                info!("{} 🎧 转写结果: {}", ctx, text);
                clean_transcript(&text)
            }
            Err(e) => {
                warn!(
                    "{} ⚠️ 转写失败，使用备用短语 \"{}\": {:#}",
                    ctx, ctx.config.audio_fallback_phrase, e
                );
                ctx.config.audio_fallback_phrase.clone()
            }
        };

        info!("{} ✅ 答案: {}", ctx, phrase);
        ctx.submit(
            &ctx.config.evaluator_url(SUBMIT_PATH),
            &ctx.config.evaluator_url(TASK_ID_PATH),
            Answer::Text(phrase),
        )
        .await
    }
}
