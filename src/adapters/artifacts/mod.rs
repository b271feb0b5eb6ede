//! Filesystem artifact adapter: Implementation of ArtifactSource.
//!
//! Loads the fitted artifacts exported by the training pipeline from one
//! directory:
//!
//! | file                  | content                                        |
//! |-----------------------|------------------------------------------------|
//! | `feature_names.json`  | ordered feature names                          |
//! | `label_encoders.json` | column → fitted class list                     |
//! | `scaler.json`         | `{columns, mean, scale}`                       |
//! | `model.json`          | exported classifier (`kind` tagged)            |
//! | `manifest.json`       | sha256 of every artifact file (optional)       |
//! | `artifacts.sig`       | Ed25519 signature over `manifest.json`         |
//!
//! # Integrity
//!
//! When a manifest is present every artifact file must be listed in it and
//! match its digest. When signatures are required the manifest must also be
//! signed by the configured verifying key. The `sign_artifacts` binary
//! produces both files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::fitted::{LabelEncoder, StandardScaler};
use crate::adapters::linear::ExportedModel;
use crate::domain::schema::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use crate::domain::{AdvisoryTable, FeatureSchema};
use crate::ports::{
    ArtifactError, ArtifactSource, CategoricalEncoder, LoadedArtifacts, NumericScaler,
};

pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const ENCODERS_FILE: &str = "label_encoders.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";

/// Artifact files every directory must provide.
pub const ARTIFACT_FILES: [&str; 4] = [FEATURE_NAMES_FILE, ENCODERS_FILE, SCALER_FILE, MODEL_FILE];

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Digest manifest binding the artifact files of one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Monotonic export number
    pub serial: u64,
    /// Unix timestamp (seconds) of the export
    pub created_at: i64,
    /// File name → lowercase hex sha256
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex sha256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Parse a base64-encoded Ed25519 verifying key.
///
/// # Errors
/// Returns `Invalid` if the text is not a 32-byte base64 key.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Invalid("verifying key is not valid base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Invalid("verifying key must decode to 32 bytes".into())
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ArtifactError::Invalid("verifying key is not a valid Ed25519 point".into()))
}

/// Load a versioned advisory table from a JSON file.
///
/// # Errors
/// Returns `Missing` if the file does not exist and `Invalid` if it cannot be
/// parsed or has an entry with an empty field.
pub fn load_advisory_table(path: &Path) -> Result<AdvisoryTable, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.display().to_string()));
    }
    let content = fs::read(path)?;
    let table: AdvisoryTable = serde_json::from_slice(&content)
        .map_err(|e| ArtifactError::Invalid(format!("{}: {e}", path.display())))?;

    if let Some(label) = table.incomplete_labels().next() {
        return Err(ArtifactError::Invalid(format!(
            "advisory entry {label:?} has an empty field"
        )));
    }

    tracing::info!(
        "Loaded advisory table v{} with {} entries from {:?}",
        table.version,
        table.len(),
        path
    );
    Ok(table)
}

/// Artifact source reading one export directory.
#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    dir: PathBuf,
    require_signature: bool,
    verifying_key: Option<VerifyingKey>,
}

impl FsArtifactSource {
    /// Create a source without signature enforcement.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            require_signature: false,
            verifying_key: None,
        }
    }

    /// Require a manifest signed by `key`.
    #[must_use]
    pub fn with_signature(mut self, key: Option<VerifyingKey>, required: bool) -> Self {
        self.verifying_key = key;
        self.require_signature = required;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_artifact(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(ArtifactError::Missing(path.display().to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Verify the manifest (and signature) if present.
    ///
    /// Returns the manifest when one was verified.
    fn verify_manifest(&self) -> Result<Option<ArtifactManifest>, ArtifactError> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let sig_path = self.dir.join(SIGNATURE_FILE);

        if !manifest_path.exists() {
            if self.require_signature {
                tracing::error!("Signed manifest required but {:?} not found", manifest_path);
                return Err(ArtifactError::Integrity(
                    "signed artifact manifest required".into(),
                ));
            }
            tracing::warn!("Loading artifacts without a manifest from {:?}", self.dir);
            return Ok(None);
        }

        let manifest_bytes = fs::read(&manifest_path)?;

        match (&self.verifying_key, sig_path.exists()) {
            (Some(key), true) => {
                let sig_bytes = fs::read(&sig_path)?;
                let sig: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
                    ArtifactError::Integrity("invalid signature length (expected 64 bytes)".into())
                })?;
                key.verify(&manifest_bytes, &Signature::from_bytes(&sig))
                    .map_err(|_| ArtifactError::Integrity("invalid manifest signature".into()))?;
                tracing::info!("Verified artifact manifest signature");
            }
            _ if self.require_signature => {
                return Err(ArtifactError::Integrity(
                    "manifest signature or verifying key missing".into(),
                ));
            }
            _ => tracing::warn!("Artifact manifest is not signature-checked"),
        }

        let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| ArtifactError::Invalid(format!("{MANIFEST_FILE}: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        // Every artifact actually loaded must be bound by the manifest.
        for name in ARTIFACT_FILES {
            let expected = manifest.files.get(name).ok_or_else(|| {
                ArtifactError::Integrity(format!("{name} is not listed in {MANIFEST_FILE}"))
            })?;
            let actual = sha256_hex(&self.read_artifact(name)?);
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(ArtifactError::Integrity(format!("digest mismatch for {name}")));
            }
        }

        Ok(Some(manifest))
    }

    fn parse<T: serde::de::DeserializeOwned>(name: &str, bytes: &[u8]) -> Result<T, ArtifactError> {
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Invalid(format!("{name}: {e}")))
    }

    fn load_encoders(
        &self,
        schema: &FeatureSchema,
    ) -> Result<BTreeMap<String, Box<dyn CategoricalEncoder>>, ArtifactError> {
        let raw: BTreeMap<String, LabelEncoder> =
            Self::parse(ENCODERS_FILE, &self.read_artifact(ENCODERS_FILE)?)?;

        let mut encoders: BTreeMap<String, Box<dyn CategoricalEncoder>> = BTreeMap::new();
        for (column, encoder) in raw {
            if !CATEGORICAL_COLUMNS.contains(&column.as_str()) || !schema.contains(&column) {
                tracing::warn!("Ignoring encoder for non-categorical column {column:?}");
                continue;
            }
            if encoder.classes().is_empty() {
                return Err(ArtifactError::Invalid(format!(
                    "encoder for {column:?} has no classes"
                )));
            }
            encoders.insert(column, Box::new(encoder));
        }

        for column in CATEGORICAL_COLUMNS {
            if !encoders.contains_key(column) {
                tracing::warn!("No encoder fitted for {column:?}; its code will default to 0");
            }
        }
        Ok(encoders)
    }

    fn load_scaler(&self) -> Result<StandardScaler, ArtifactError> {
        let scaler: StandardScaler = Self::parse(SCALER_FILE, &self.read_artifact(SCALER_FILE)?)?;
        scaler
            .check()
            .map_err(|e| ArtifactError::Invalid(format!("{SCALER_FILE}: {e}")))?;
        if let Some(column) = scaler
            .columns()
            .iter()
            .find(|c| !NUMERIC_COLUMNS.contains(&c.as_str()))
        {
            return Err(ArtifactError::Invalid(format!(
                "{SCALER_FILE}: {column:?} is not a numeric column"
            )));
        }
        Ok(scaler)
    }
}

impl ArtifactSource for FsArtifactSource {
    fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
        if !self.dir.is_dir() {
            return Err(ArtifactError::Missing(format!(
                "artifact directory {}",
                self.dir.display()
            )));
        }

        let manifest = self.verify_manifest()?;

        let names: Vec<String> =
            Self::parse(FEATURE_NAMES_FILE, &self.read_artifact(FEATURE_NAMES_FILE)?)?;
        let schema = FeatureSchema::new(names)
            .map_err(|e| ArtifactError::Invalid(format!("{FEATURE_NAMES_FILE}: {e}")))?;

        let encoders = self.load_encoders(&schema)?;
        let scaler = self.load_scaler()?;

        let exported: ExportedModel = Self::parse(MODEL_FILE, &self.read_artifact(MODEL_FILE)?)?;
        let classifier = exported
            .into_classifier()
            .map_err(|e| ArtifactError::Invalid(format!("{MODEL_FILE}: {e}")))?;

        if classifier.n_features() != schema.len() {
            return Err(ArtifactError::Invalid(format!(
                "model expects {} features but schema lists {}",
                classifier.n_features(),
                schema.len()
            )));
        }

        tracing::info!(
            "Loaded artifacts from {:?} (n_features={}, n_classes={}, serial={:?})",
            self.dir,
            schema.len(),
            classifier.classes().len(),
            manifest.map(|m| m.serial)
        );

        Ok(LoadedArtifacts {
            schema,
            encoders,
            scaler: Some(Box::new(scaler)),
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    const FEATURES: &str =
        r#"["age","gender","region","duration_days","comorbidity","fever","cough"]"#;
    const ENCODERS: &str = r#"{
        "gender": ["Female", "Male", "Other"],
        "region": ["Punjab", "Sindh"],
        "comorbidity": ["Diabetes", "None"]
    }"#;
    const SCALER: &str =
        r#"{"columns": ["age", "duration_days"], "mean": [35.0, 5.0], "scale": [15.0, 3.0]}"#;
    const MODEL: &str = r#"{
        "kind": "softmax_linear",
        "classes": ["Dengue", "Malaria"],
        "coefficients": [[0,0,0,0,0,1,0],[0,0,0,0,0,0,1]],
        "intercepts": [0.0, 0.0]
    }"#;

    fn write_export(dir: &Path) {
        fs::write(dir.join(FEATURE_NAMES_FILE), FEATURES).expect("write features");
        fs::write(dir.join(ENCODERS_FILE), ENCODERS).expect("write encoders");
        fs::write(dir.join(SCALER_FILE), SCALER).expect("write scaler");
        fs::write(dir.join(MODEL_FILE), MODEL).expect("write model");
    }

    fn write_manifest(dir: &Path) -> Vec<u8> {
        let files = ARTIFACT_FILES
            .iter()
            .map(|name| {
                let bytes = fs::read(dir.join(name)).expect("read artifact");
                ((*name).to_string(), sha256_hex(&bytes))
            })
            .collect();
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            serial: 1,
            created_at: 0,
            files,
        };
        let bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        bytes
    }

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    #[test]
    fn test_load_unsigned_export() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());

        let loaded = FsArtifactSource::new(temp.path()).load().expect("Should load");
        assert_eq!(loaded.schema.len(), 7);
        assert_eq!(loaded.encoders.len(), 3);
        assert!(loaded.scaler.is_some());
        assert_eq!(loaded.classifier.classes(), &["Dengue".to_string(), "Malaria".to_string()]);
    }

    #[test]
    fn test_missing_file_is_reported_as_missing() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());
        fs::remove_file(temp.path().join(MODEL_FILE)).expect("remove model");

        let err = FsArtifactSource::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(ref m) if m.contains(MODEL_FILE)));

        let err = FsArtifactSource::new(temp.path().join("nope")).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn test_width_mismatch_is_invalid() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());
        fs::write(
            temp.path().join(FEATURE_NAMES_FILE),
            r#"["age","gender","region","duration_days","comorbidity","fever"]"#,
        )
        .expect("write features");

        let err = FsArtifactSource::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_manifest_digest_mismatch() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());
        write_manifest(temp.path());
        fs::write(temp.path().join(SCALER_FILE), SCALER.replace("35.0", "36.0"))
            .expect("tamper scaler");

        let err = FsArtifactSource::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_signed_manifest_roundtrip() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());
        let manifest = write_manifest(temp.path());
        let key = signing_key();
        fs::write(
            temp.path().join(SIGNATURE_FILE),
            key.sign(&manifest).to_bytes(),
        )
        .expect("write signature");

        let source = FsArtifactSource::new(temp.path())
            .with_signature(Some(key.verifying_key()), true);
        assert!(source.load().is_ok());

        let wrong = FsArtifactSource::new(temp.path())
            .with_signature(Some(signing_key().verifying_key()), true);
        assert!(matches!(wrong.load(), Err(ArtifactError::Integrity(_))));
    }

    #[test]
    fn test_signature_required_without_manifest() {
        let temp = tempdir().expect("tempdir");
        write_export(temp.path());

        let source = FsArtifactSource::new(temp.path()).with_signature(None, true);
        assert!(matches!(source.load(), Err(ArtifactError::Integrity(_))));
    }

    #[test]
    fn test_verifying_key_parsing() {
        let key = signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert_eq!(verifying_key_from_b64(&b64).expect("Should parse"), key);
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_advisory_table_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("advisory.json");
        assert!(matches!(
            load_advisory_table(&path),
            Err(ArtifactError::Missing(_))
        ));

        fs::write(
            &path,
            r#"{"version": 2, "entries": {"Measles": {"tests": "IgM antibody test", "meds": "Vitamin A, supportive care", "emergency": "Difficulty breathing, seizures"}}}"#,
        )
        .expect("write table");
        let table = load_advisory_table(&path).expect("Should load");
        assert_eq!(table.version, 2);
        assert_eq!(table.get("Measles").map(|r| r.care.as_str()), Some("Vitamin A, supportive care"));

        fs::write(
            &path,
            r#"{"entries": {"Measles": {"tests": "", "meds": "x", "emergency": "y"}}}"#,
        )
        .expect("write table");
        assert!(matches!(load_advisory_table(&path), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_bundled_demo_export_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let loaded = FsArtifactSource::new(dir).load().expect("Should load demo export");
        assert_eq!(loaded.schema, FeatureSchema::reference());
        assert_eq!(loaded.classifier.n_features(), 40);
        for class in loaded.classifier.classes() {
            assert!(AdvisoryTable::builtin().get(class).is_some(), "{class}");
        }
    }
}
