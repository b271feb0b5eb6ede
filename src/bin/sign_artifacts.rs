//! Artifact signing utility.
//!
//! Binds an artifact directory to one signing key: writes `manifest.json`
//! (sha256 of every artifact file) and `artifacts.sig` (Ed25519 signature
//! over the exact manifest bytes). The loader re-hashes each file at startup
//! and rejects the export on any mismatch.
//!
//! # Usage
//!
//! ```bash
//! MEDIAID_SIGNING_KEY_B64_FILE=signing.key \
//!     cargo run --bin sign_artifacts -- <artifact_dir> [--serial <n>]
//! ```
//!
//! Debug builds also accept the seed inline in `MEDIAID_SIGNING_KEY_B64`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroizing;

use mediaid::adapters::artifacts::{
    sha256_hex, ArtifactManifest, ARTIFACT_FILES, MANIFEST_FILE, MANIFEST_VERSION, SIGNATURE_FILE,
};

const KEY_FILE_ENV: &str = "MEDIAID_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "MEDIAID_SIGNING_KEY_B64";
const USAGE: &str = "usage: sign_artifacts <artifact_dir> [--serial <u64>]";

/// Load the signing key; the base64 text and decoded seed are wiped on drop.
fn load_signing_key() -> Result<SigningKey> {
    let encoded: Zeroizing<String> = match std::env::var(KEY_FILE_ENV) {
        Ok(path) => Zeroizing::new(
            std::fs::read_to_string(path.trim())
                .with_context(|| format!("reading {KEY_FILE_ENV}"))?,
        ),
        Err(_) if cfg!(debug_assertions) => Zeroizing::new(
            std::env::var(KEY_ENV)
                .map_err(|_| anyhow!("set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds)"))?,
        ),
        Err(_) => bail!("set {KEY_FILE_ENV} to the signing seed file"),
    };
    ensure!(!encoded.trim().is_empty(), "signing key is empty");

    let decoded = Zeroizing::new(
        BASE64
            .decode(encoded.trim())
            .context("signing key is not valid base64")?,
    );
    let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
        decoded
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("signing seed must be 32 bytes, got {}", decoded.len()))?,
    );
    Ok(SigningKey::from_bytes(&seed))
}

fn build_manifest(dir: &Path, serial: u64) -> Result<ArtifactManifest> {
    let files = ARTIFACT_FILES
        .iter()
        .map(|name| -> Result<(String, String)> {
            let bytes = std::fs::read(dir.join(name))
                .with_context(|| format!("reading {}", dir.join(name).display()))?;
            Ok(((*name).to_string(), sha256_hex(&bytes)))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(ArtifactManifest {
        version: MANIFEST_VERSION,
        serial,
        created_at: chrono::Utc::now().timestamp(),
        files,
    })
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut dir: Option<PathBuf> = None;
    let mut serial: Option<u64> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let value = args.next().context(USAGE)?;
                serial = Some(value.trim().parse().context("--serial must be a u64")?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ if dir.is_none() => dir = Some(PathBuf::from(arg)),
            _ => bail!(USAGE),
        }
    }
    let dir = dir.context(USAGE)?;
    ensure!(dir.is_dir(), "{} is not a directory", dir.display());

    let signing_key = load_signing_key()?;
    // Serials default to the export time so later exports sort after earlier ones.
    let serial =
        serial.unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(1));
    let manifest = build_manifest(&dir, serial)?;

    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;
    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    let signature_path = dir.join(SIGNATURE_FILE);
    std::fs::write(&signature_path, signing_key.sign(&manifest_bytes).to_bytes())
        .with_context(|| format!("writing {}", signature_path.display()))?;

    println!(
        "Signed {} artifact(s) in {} (serial {serial})",
        manifest.files.len(),
        dir.display()
    );
    println!(
        "MEDIAID_ARTIFACT_PUBKEY_B64={}",
        BASE64.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}
