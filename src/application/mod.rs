//! Application layer: Pipeline components and use cases.
//!
//! The pipeline stages run in a fixed order:
//! builder → encoding/scaling → classifier adapter → ranker → advisory.
//! The services wrap the pipeline with validation, persistence and
//! per-owner session state.

mod advisory;
mod analytics;
mod builder;
mod classifier;
mod encoding;
pub(crate) mod pipeline;
mod ranking;
mod service;
mod session;

pub use advisory::AdvisoryResolver;
pub use analytics::{AnalyticsService, RecentActivity, ReportStatistics};
pub use builder::FeatureVectorBuilder;
pub use classifier::{ClassifierAdapter, ClassifierOutput};
pub use encoding::{encode_category, encode_record, scale_numeric, EncodedRecord};
pub use pipeline::{InferenceContext, InferencePipeline, Vectorized};
pub use ranking::{TopKRanker, DEFAULT_TOP_K};
pub use service::{DiagnoseRequest, Diagnosis, DiagnosisService};
pub use session::{SessionCache, DEFAULT_SESSION_CAPACITY};
