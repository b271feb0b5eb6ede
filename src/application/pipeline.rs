//! Inference pipeline: raw input to ranked, advised result.
//!
//! The pipeline is a pure function of its inputs and the loaded artifacts.
//! Nothing is mutated after construction, so one pipeline can be shared by
//! any number of concurrent calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::domain::{
    AdvisoryTable, Demographics, DiagnosisResult, FeatureSchema, InferenceTrace, RawRecord,
    SymptomSet,
};
use crate::ports::{ArtifactSource, CategoricalEncoder, LoadedArtifacts, NumericScaler};
use crate::MediaidError;

use super::encoding::{encode_record, EncodedRecord};
use super::{AdvisoryResolver, ClassifierAdapter, FeatureVectorBuilder, TopKRanker};

/// Read-only fitted state shared by every inference call.
pub struct InferenceContext {
    schema: Arc<FeatureSchema>,
    encoders: BTreeMap<String, Box<dyn CategoricalEncoder>>,
    scaler: Option<Box<dyn NumericScaler>>,
    classifier: ClassifierAdapter,
}

impl std::fmt::Debug for InferenceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceContext")
            .field("n_features", &self.schema.len())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .field("scaler", &self.scaler.is_some())
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl InferenceContext {
    /// Build a context from loaded artifacts.
    ///
    /// Encoders and the scaler may be partial or absent; the pipeline falls
    /// back per column. The classifier must accept exactly one value per
    /// schema feature.
    ///
    /// # Errors
    /// Returns `ArtifactInvalid` if the classifier and schema disagree.
    pub fn new(artifacts: LoadedArtifacts) -> Result<Self, MediaidError> {
        let classifier = ClassifierAdapter::new(artifacts.classifier)?;
        if classifier.n_features() != artifacts.schema.len() {
            return Err(MediaidError::ArtifactInvalid(format!(
                "classifier expects {} features, schema has {}",
                classifier.n_features(),
                artifacts.schema.len()
            )));
        }

        Ok(Self {
            schema: Arc::new(artifacts.schema),
            encoders: artifacts.encoders,
            scaler: artifacts.scaler,
            classifier,
        })
    }

    /// Load artifacts from `source` and build a context.
    ///
    /// # Errors
    /// Returns `ArtifactMissing` or `ArtifactInvalid` if loading fails.
    pub fn load(source: &dyn ArtifactSource) -> Result<Self, MediaidError> {
        Self::new(source.load()?)
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        self.classifier.classes()
    }
}

/// Input after every preprocessing step, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorized {
    pub record: RawRecord,
    pub encoded: EncodedRecord,
    pub ignored_symptoms: Vec<String>,
}

/// The full inference pipeline.
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    context: Arc<InferenceContext>,
    builder: FeatureVectorBuilder,
    ranker: TopKRanker,
    resolver: AdvisoryResolver,
}

impl InferencePipeline {
    #[must_use]
    pub fn new(context: Arc<InferenceContext>, advisory: Arc<AdvisoryTable>) -> Self {
        let builder = FeatureVectorBuilder::new(Arc::clone(&context.schema));
        Self {
            context,
            builder,
            ranker: TopKRanker::default(),
            resolver: AdvisoryResolver::new(advisory),
        }
    }

    /// Report `k` candidates instead of the default.
    #[must_use]
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.ranker = TopKRanker::new(k);
        self
    }

    #[must_use]
    pub fn context(&self) -> &InferenceContext {
        &self.context
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.ranker.k()
    }

    /// Build, encode and scale the model input for one request.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the record cannot cover the schema.
    pub fn vectorize(
        &self,
        demographics: &Demographics,
        symptoms: &SymptomSet,
    ) -> Result<Vectorized, MediaidError> {
        let record = self.builder.build(demographics, symptoms)?;
        let ignored_symptoms = self.builder.unknown_symptoms(symptoms);
        if !ignored_symptoms.is_empty() {
            tracing::warn!(
                "Ignoring {} symptom(s) outside the feature schema: {:?}",
                ignored_symptoms.len(),
                ignored_symptoms
            );
        }

        let encoded = encode_record(
            &record,
            &self.context.encoders,
            self.context.scaler.as_deref(),
        );
        Ok(Vectorized {
            record,
            encoded,
            ignored_symptoms,
        })
    }

    /// Run inference, stamping the result with the current time.
    ///
    /// Results of two calls differ at most in `created_at`; use
    /// [`Self::infer_at`] for fully reproducible output.
    ///
    /// # Errors
    /// See [`Self::infer_at`].
    pub fn infer(
        &self,
        demographics: &Demographics,
        symptoms: &SymptomSet,
    ) -> Result<DiagnosisResult, MediaidError> {
        self.infer_at(demographics, symptoms, Utc::now().trunc_subsecs(0))
    }

    /// Run inference with an explicit timestamp.
    ///
    /// Identical inputs always yield identical results.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the input cannot be laid out, or
    /// `Prediction` if the classifier fails outright.
    pub fn infer_at(
        &self,
        demographics: &Demographics,
        symptoms: &SymptomSet,
        created_at: DateTime<Utc>,
    ) -> Result<DiagnosisResult, MediaidError> {
        let Vectorized {
            encoded,
            ignored_symptoms,
            ..
        } = self.vectorize(demographics, symptoms)?;

        let (output, probability) = self.context.classifier.classify(&encoded.vector)?;
        let ranking = self.ranker.rank(&output);
        let top = ranking.first().ok_or_else(|| {
            MediaidError::Prediction("classifier produced no candidates".to_string())
        })?;
        let advisory = self.resolver.resolve(&top.label);

        tracing::debug!(
            "Inference complete: top={}, candidates={}",
            top,
            ranking.len()
        );

        Ok(DiagnosisResult {
            ranking,
            symptoms: symptoms.clone(),
            advisory,
            trace: InferenceTrace {
                encoding: encoded.encoding,
                scaling: encoded.scaling,
                probability,
                ignored_symptoms,
            },
            created_at,
        })
    }
}
