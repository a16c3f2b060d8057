pub mod advisor;
pub mod fetcher;
pub mod media;
pub mod normalizer;
pub mod personalization;
pub mod pixels;
pub mod synthesizer;
pub mod tabular;

pub use advisor::{LlmAdvisor, QuestionAdvisor};
pub use fetcher::{resolve_url, ArtifactFetcher, ReferenceKind, TaskArtifacts};
pub use media::{ImageAnalyzer, PdfExtractor, PdfTextExtractor, SpeechToText};
pub use normalizer::{ArtifactNormalizer, MediaKind, NormalizedData};
pub use personalization::PersonalizationRule;
pub use synthesizer::{synthesize_answer, AnswerSource, DEMO_ANSWER};
