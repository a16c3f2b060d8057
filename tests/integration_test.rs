use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quiz_chain_solver::browser::{ContentAcquirer, PageContent};
use quiz_chain_solver::models::Advisory;
use quiz_chain_solver::services::{
    ImageAnalyzer, PdfTextExtractor, QuestionAdvisor, SpeechToText,
};
use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{
    ChainSolver, Collaborators, Config, SolveError, SolveRequest, StopReason,
};

const EMAIL: &str = "ab@c.de";

// ========== 假协作方 ==========

#[derive(Default)]
struct FakeAcquirer {
    pages: HashMap<String, PageContent>,
}

#[async_trait]
impl ContentAcquirer for FakeAcquirer {
    async fn acquire(&self, url: &str) -> Result<PageContent> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("导航失败: {}", url))
    }
}

#[derive(Default)]
struct FakeAdvisor {
    advisories: HashMap<String, Advisory>,
    synthesize_calls: AtomicUsize,
    evidence_seen: Mutex<Vec<String>>,
}

#[async_trait]
impl QuestionAdvisor for FakeAdvisor {
    async fn advise(&self, question: &str, _markup: &str) -> Result<Advisory> {
        Ok(self
            .advisories
            .get(question)
            .cloned()
            .unwrap_or_else(|| Advisory::unknown("no advice")))
    }

    async fn synthesize(
        &self,
        _question: &str,
        evidence: &str,
        _analysis_type: &str,
    ) -> Result<String> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.evidence_seen.lock() {
            seen.push(evidence.to_string());
        }
        Ok("```\n42\n```".to_string())
    }
}

struct FakeSpeech {
    transcript: Option<String>,
}

#[async_trait]
impl SpeechToText for FakeSpeech {
    async fn transcribe_audio(&self, _file_name: &str, _bytes: &[u8]) -> Result<String> {
        self.transcript
            .clone()
            .ok_or_else(|| anyhow!("转写服务不可用"))
    }
}

struct FakeVision;

#[async_trait]
impl ImageAnalyzer for FakeVision {
    async fn analyze_image(
        &self,
        _bytes: &[u8],
        _media_type: &str,
        _instruction: &str,
    ) -> Result<String> {
        Ok("The most frequent color is #123456".to_string())
    }
}

struct FakePdf;

#[async_trait]
impl PdfTextExtractor for FakePdf {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
        Ok("pdf text".to_string())
    }
}

// ========== 测试工具 ==========

struct Harness {
    server: MockServer,
    temp: TempDir,
    pages: HashMap<String, PageContent>,
    advisories: HashMap<String, Advisory>,
    transcript: Option<String>,
}

impl Harness {
    async fn start() -> Self {
        logging::init(false);
        Self {
            server: MockServer::start().await,
            temp: TempDir::new().expect("创建临时目录失败"),
            pages: HashMap::new(),
            advisories: HashMap::new(),
            transcript: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// 注册一个题目页面，页面中给出提交地址
    fn page(&mut self, path: &str, question: &str) -> String {
        let url = self.url(path);
        self.pages.insert(
            url.clone(),
            PageContent {
                text: question.to_string(),
                html: format!("<div>{}</div>", question),
                submit_url: Some(self.url("/submit")),
            },
        );
        url
    }

    fn advise(&mut self, question: &str, advisory: Advisory) {
        self.advisories.insert(question.to_string(), advisory);
    }

    fn config(&self) -> Config {
        Config {
            evaluator_base_url: self.server.uri(),
            github_api_base_url: self.server.uri(),
            temp_dir: self.temp.path().to_path_buf(),
            time_budget_secs: 60,
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    fn solver_with(&self, config: Config) -> (ChainSolver, Arc<FakeAdvisor>) {
        let advisor = Arc::new(FakeAdvisor {
            advisories: self.advisories.clone(),
            synthesize_calls: AtomicUsize::new(0),
            evidence_seen: Mutex::new(Vec::new()),
        });
        let collaborators = Collaborators {
            acquirer: Arc::new(FakeAcquirer {
                pages: self.pages.clone(),
            }),
            advisor: advisor.clone(),
            speech: Arc::new(FakeSpeech {
                transcript: self.transcript.clone(),
            }),
            vision: Arc::new(FakeVision),
            pdf: Arc::new(FakePdf),
        };
        let solver = ChainSolver::new(Arc::new(config), collaborators).expect("创建求解器失败");
        (solver, advisor)
    }

    fn solver(&self) -> (ChainSolver, Arc<FakeAdvisor>) {
        self.solver_with(self.config())
    }

    fn request(&self, start: &str) -> SolveRequest {
        SolveRequest::new(EMAIL, "s3cret", start)
    }
}

fn advisory_with_answer(answer: serde_json::Value) -> Advisory {
    Advisory {
        analysis_type: "calculation".to_string(),
        answer: Some(answer),
        ..Advisory::default()
    }
}

fn submit_ok(next: Option<&str>) -> ResponseTemplate {
    match next {
        Some(url) => ResponseTemplate::new(200).set_body_json(json!({"correct": true, "url": url})),
        None => ResponseTemplate::new(200).set_body_json(json!({"correct": true})),
    }
}

fn scrape_advisory(reference: &str) -> Advisory {
    Advisory {
        data_needed: vec![reference.to_string()],
        analysis_type: "scrape".to_string(),
        ..Advisory::default()
    }
}

async fn submit_posts(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/submit")
        .count()
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

fn sample_png(width: u32, height: u32, red: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, y| {
        if y * width + x < red {
            Rgba([255u8, 0, 0, 255])
        } else {
            Rgba([0u8, 0, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("编码 PNG 失败");
    bytes
}

// ========== 通用流程 ==========

#[tokio::test]
async fn test_generic_chain_follows_continuation_with_personalization() {
    let mut h = Harness::start().await;
    let q1 = "What is 4 + 6? Add your email length mod 3 (personalized answer).";
    let q2 = "Say hello in lowercase.";
    let first = h.page("/quiz/1", q1);
    let second = h.page("/quiz/2", q2);
    h.advise(q1, advisory_with_answer(json!(10)));
    h.advise(q2, advisory_with_answer(json!("hello")));

    // 邮箱长度 7，7 mod 3 = 1
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({
            "email": EMAIL,
            "secret": "s3cret",
            "url": first,
            "answer": 11
        })))
        .respond_with(submit_ok(Some(&second)))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": second, "answer": "hello"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&first)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_attempted, 2);
    assert_eq!(report.tasks_submitted, 2);
    assert!(report.last_result.is_some_and(|r| r.correct));
    assert_eq!(advisor.synthesize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_csv_threshold_overrides_advisory_answer() {
    let mut h = Harness::start().await;
    let question = "Download the data and sum the values greater than 100.";
    let start = h.page("/quiz/csv", question);
    h.advise(
        question,
        Advisory {
            data_needed: vec!["/data/x.csv".to_string()],
            analysis_type: "sum".to_string(),
            answer: Some(json!(1)),
            ..Advisory::default()
        },
    );

    Mock::given(method("GET"))
        .and(path("/data/x.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("150\n200\n50\n300\n", "text/csv"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start, "answer": 650})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_submitted, 1);
    // 附件在题目结束后被删除
    assert!(dir_is_empty(h.temp.path()));
}

#[tokio::test]
async fn test_missing_artifact_is_skipped_and_answer_synthesized() {
    let mut h = Harness::start().await;
    let question = "Read the attached file and report the answer.";
    let start = h.page("/quiz/missing", question);
    h.advise(
        question,
        Advisory {
            data_needed: vec!["/data/gone.json".to_string()],
            analysis_type: "lookup".to_string(),
            ..Advisory::default()
        },
    );

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start, "answer": 42})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.tasks_submitted, 1);
    assert_eq!(advisor.synthesize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rendered_reference_text_reaches_synthesis() {
    let mut h = Harness::start().await;
    let question = "Open the linked page and report the secret code.";
    let start = h.page("/quiz/scrape", question);
    h.advise(question, scrape_advisory("/demo-scrape-data"));
    let data_url = h.url("/demo-scrape-data");
    h.pages.insert(
        data_url,
        PageContent {
            text: "Secret code is 4242".to_string(),
            html: "<p>Secret code is <b>4242</b></p>".to_string(),
            submit_url: None,
        },
    );

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start, "answer": 42})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    let seen = advisor.evidence_seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("Scraped Content from /demo-scrape-data:\nSecret code is 4242"));
    // 浏览器读取成功时不再直接下载
    assert_eq!(h.server.received_requests().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn test_unrenderable_reference_falls_back_to_download() {
    let mut h = Harness::start().await;
    let question = "Open the linked table and report the value of row one.";
    let start = h.page("/quiz/table", question);
    h.advise(question, scrape_advisory("/quiz-data/table"));

    // 浏览器读不到该页面，改为直接下载
    Mock::given(method("GET"))
        .and(path("/quiz-data/table"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("row one: 77", "text/plain"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start, "answer": 42})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    let seen = advisor.evidence_seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("HTML/Text Content (/quiz-data/table):\nrow one: 77"));
    assert!(!seen[0].contains("Scraped Content"));
    assert!(dir_is_empty(h.temp.path()));
}

#[tokio::test]
async fn test_demo_task_uses_fixed_answer() {
    let mut h = Harness::start().await;
    let question = "POST any answer to start. Personalized: email length mod 2.";
    let start = h.page("/demo", question);
    h.advise(question, advisory_with_answer(json!(5)));

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": "anything you want"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;
    assert_eq!(report.tasks_submitted, 1);
}

// ========== 终止条件 ==========

#[tokio::test]
async fn test_zero_budget_stops_before_first_task() {
    let mut h = Harness::start().await;
    let start = h.page("/quiz/1", "anything");

    Mock::given(method("POST"))
        .respond_with(submit_ok(None))
        .expect(0)
        .mount(&h.server)
        .await;

    let config = Config {
        time_budget_secs: 0,
        ..h.config()
    };
    let (solver, _) = h.solver_with(config);
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::DeadlineExceeded);
    assert_eq!(report.tasks_attempted, 0);
}

#[tokio::test]
async fn test_malformed_submission_continues_from_embedded_url() {
    let mut h = Harness::start().await;
    let q1 = "First question";
    let q2 = "Second question";
    let first = h.page("/quiz/1", q1);
    let second = h.page("/quiz/2", q2);
    h.advise(q1, advisory_with_answer(json!(1)));
    h.advise(q2, advisory_with_answer(json!(2)));

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": first})))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"correct": "maybe", "url": second})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": second, "answer": 2})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&first)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_attempted, 2);
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_acquisition_failure_stops_chain() {
    let h = Harness::start().await;
    let start = h.url("/quiz/unreachable");

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Failed);
    assert_eq!(report.tasks_attempted, 1);
    assert_eq!(report.tasks_submitted, 0);
    assert!(dir_is_empty(h.temp.path()));
}

// ========== 专用处理器 ==========

#[tokio::test]
async fn test_github_tree_handler_counts_with_offset() {
    let mut h = Harness::start().await;
    let start = h.page("/project2-gh-tree", "Count the markdown files in the tree.");

    Mock::given(method("GET"))
        .and(path("/project2/gh-tree.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "owner": "o",
            "repo": "r",
            "sha": "abc",
            "pathPrefix": "docs/",
            "extension": ".md"
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/git/trees/abc"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc",
            "tree": [
                {"path": "docs/a.md", "type": "blob"},
                {"path": "docs/b.md", "type": "blob"},
                {"path": "docs/c.txt", "type": "blob"},
                {"path": "docs", "type": "tree"},
                {"path": "src/d.md", "type": "blob"}
            ]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    // 2 个匹配文件 + 邮箱长度 7 mod 2 = 3
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({
            "url": h.url("/project2-gh-tree"),
            "answer": 3
        })))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_submitted, 1);
    assert_eq!(advisor.synthesize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_heatmap_handler_reports_dominant_color() {
    let mut h = Harness::start().await;
    let start = h.page("/project2-heatmap", "Which color appears most often?");

    Mock::given(method("GET"))
        .and(path("/project2/heatmap.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sample_png(4, 4, 10), "image/png"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": "#ff0000"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_heatmap_undecodable_image_uses_vision() {
    let mut h = Harness::start().await;
    let start = h.page("/project2-heatmap", "Which color appears most often?");

    Mock::given(method("GET"))
        .and(path("/project2/heatmap.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not a png", "image/png"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": "#123456"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_handler_failure_falls_through_to_generic_path() {
    let mut h = Harness::start().await;
    let question = "Find the most frequent RGB color in the heatmap.";
    let start = h.page("/project2-heatmap", question);
    h.advise(question, advisory_with_answer(json!("#abcdef")));

    // 图片地址返回 404，处理器失败后由通用流程提交分析结果中的答案
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start, "answer": "#abcdef"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_handler_submission_failure_is_not_resubmitted() {
    let mut h = Harness::start().await;
    let question = "Find the most frequent RGB color in the heatmap.";
    let start = h.page("/project2-heatmap", question);
    // 通用流程若接手会提交这个答案
    h.advise(question, advisory_with_answer(json!("#abcdef")));

    Mock::given(method("GET"))
        .and(path("/project2/heatmap.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sample_png(4, 4, 10), "image/png"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"correct": "maybe", "url": null})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, advisor) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Failed);
    assert_eq!(report.tasks_attempted, 1);
    assert_eq!(report.tasks_submitted, 0);
    assert_eq!(submit_posts(&h.server).await, 1);
    assert_eq!(advisor.synthesize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_submission_failure_continues_from_embedded_url() {
    let mut h = Harness::start().await;
    let q2 = "What is 1 + 1?";
    let start = h.page("/project2-heatmap", "Find the most frequent RGB color in the heatmap.");
    let second = h.page("/quiz/next", q2);
    h.advise(q2, advisory_with_answer(json!(2)));

    Mock::given(method("GET"))
        .and(path("/project2/heatmap.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sample_png(4, 4, 10), "image/png"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": start})))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"correct": "maybe", "url": second})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"url": second, "answer": 2})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_attempted, 2);
    assert_eq!(report.tasks_submitted, 1);
    assert_eq!(submit_posts(&h.server).await, 2);
}

#[tokio::test]
async fn test_csv_normalize_handler_submits_sorted_rows() {
    let mut h = Harness::start().await;
    let start = h.page("/project2-csv", "Normalize messy.csv to snake_case keys.");

    Mock::given(method("GET"))
        .and(path("/project2/messy.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "ID,Name,Joined,Value\n2,Bob,05/03/24,\n1,Alice,1 Feb 2024,10\n",
            "text/csv",
        ))
        .mount(&h.server)
        .await;
    let expected = r#"[{"id":1,"name":"Alice","joined":"2024-02-01","value":10},{"id":2,"name":"Bob","joined":"2024-03-05","value":0}]"#;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({
            "url": h.url("/project2-csv"),
            "answer": expected
        })))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_audio_handler_cleans_transcript() {
    let mut h = Harness::start().await;
    h.transcript = Some("  Open, Sesame!  ".to_string());
    let start = h.page("/project2-audio-passphrase", "Transcribe the passphrase.");

    Mock::given(method("GET"))
        .and(path("/project2/audio-passphrase.opus"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "audio/ogg"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": "open sesame"})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let report = solver.run(&h.request(&start)).await;
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_audio_handler_uses_fallback_phrase() {
    let mut h = Harness::start().await;
    let start = h.page("/project2-audio-passphrase", "Transcribe the passphrase.");

    Mock::given(method("GET"))
        .and(path("/project2/audio-passphrase.opus"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "audio/ogg"))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({
            "url": h.url("/project2-audio-passphrase"),
            "answer": "blue harbor"
        })))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let config = Config {
        audio_fallback_phrase: "blue harbor".to_string(),
        ..h.config()
    };
    let (solver, _) = h.solver_with(config);
    let report = solver.run(&h.request(&start)).await;

    assert_eq!(report.tasks_submitted, 1);
    assert!(dir_is_empty(h.temp.path()));
}

// ========== 请求入口 ==========

#[tokio::test]
async fn test_accept_runs_in_background() {
    let mut h = Harness::start().await;
    let question = "Background question";
    let start = h.page("/quiz/bg", question);
    h.advise(question, advisory_with_answer(json!(true)));

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({"answer": true})))
        .respond_with(submit_ok(None))
        .expect(1)
        .mount(&h.server)
        .await;

    let (solver, _) = h.solver();
    let handle = Arc::new(solver)
        .accept(h.request(&start))
        .expect("请求应当被接受");
    let report = handle.await.expect("后台任务异常退出");

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.tasks_submitted, 1);
}

#[tokio::test]
async fn test_accept_rejects_invalid_and_unauthorized_requests() {
    let h = Harness::start().await;

    let (solver, _) = h.solver();
    let solver = Arc::new(solver);
    let invalid = SolveRequest::new("not-an-email", "s", h.url("/quiz/1"));
    assert!(matches!(
        Arc::clone(&solver).accept(invalid),
        Err(SolveError::InvalidRequest(_))
    ));

    let config = Config {
        student_secret: Some("expected".to_string()),
        ..h.config()
    };
    let (guarded, _) = h.solver_with(config);
    let wrong_secret = SolveRequest::new(EMAIL, "other", h.url("/quiz/1"));
    assert!(matches!(
        Arc::new(guarded).accept(wrong_secret),
        Err(SolveError::Forbidden)
    ));
}

// ========== 需要真实环境 ==========

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_demo_chain() {
    logging::init(true);

    // 加载配置（需要 LLM_API_KEY、STUDENT_EMAIL、STUDENT_SECRET 和本机 Chrome）
    let config = Config::load().expect("加载配置失败");
    let email = config.student_email.clone().expect("需要 STUDENT_EMAIL");
    let secret = config.student_secret.clone().expect("需要 STUDENT_SECRET");
    let start = config.evaluator_url("/demo");

    let solver = ChainSolver::from_config(Arc::new(config)).expect("创建求解器失败");
    let report = solver.run(&SolveRequest::new(email, secret, start)).await;

    println!("提交 {} 题，结束原因 {:?}", report.tasks_submitted, report.stop_reason);
    assert!(report.tasks_attempted > 0, "至少应尝试一道题");
}
