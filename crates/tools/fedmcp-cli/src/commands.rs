use crate::config::CliConfig;
use anyhow::{anyhow, bail, Context as _, Result};
use colored::Colorize;
use fedmcp_identity::{
    ArtifactSigner, ArtifactVerifier, KeyStore, LocalSigner, SignatureToken, TrustedKey,
    VerificationResult,
};
use fedmcp_transport::{ArtifactTransport, HttpArtifactTransport};
use fedmcp_types::{Artifact, AuditAction, AuditEvent};
use std::io::Write;
use std::path::Path;

const CLI_ACTOR: &str = "fedmcp-cli";

/// Settings resolved from flags and the config file.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: CliConfig,
    pub workspace: Option<String>,
    pub server_url: String,
    pub key_store: KeyStore,
}

impl Context {
    fn workspace(&self) -> Result<&str> {
        self.workspace.as_deref().ok_or_else(|| {
            anyhow!("No workspace given: pass --workspace or set workspace_id in the config file")
        })
    }

    fn transport(&self) -> Result<HttpArtifactTransport> {
        let transport = HttpArtifactTransport::with_timeout(&self.server_url, self.config.request_timeout())?;
        Ok(match &self.config.api_key {
            Some(key) => transport.with_api_key(key),
            None => transport,
        })
    }
}

/// Formats a `serde_json::Error` into a user-friendly `anyhow::Error` with file context.
fn format_serde_json_error(err: &serde_json::Error, file_path: &Path, context_message: &str) -> anyhow::Error {
    let display_path = file_path.display();
    match err.classify() {
        serde_json::error::Category::Io => {
            anyhow!("{} I/O error while parsing JSON file '{}': {}", context_message, display_path, err)
        }
        serde_json::error::Category::Syntax => anyhow!(
            "{} Invalid JSON syntax in file '{}' at line {} column {}: {}",
            context_message,
            display_path,
            err.line(),
            err.column(),
            err
        ),
        serde_json::error::Category::Data => {
            anyhow!("{} Invalid artifact data in JSON file '{}': {}", context_message, display_path, err)
        }
        serde_json::error::Category::Eof => {
            anyhow!("{} Unexpected end of file in JSON file '{}' while parsing.", context_message, display_path)
        }
    }
}

/// Reads a file and parses its content as JSON into `T`.
fn read_and_parse_json<T: serde::de::DeserializeOwned>(file_path: &Path, context_for_error: &str) -> Result<T> {
    let json_str = std::fs::read_to_string(file_path)
        .map_err(|io_err| anyhow!("Failed to read {} file '{}': {}", context_for_error, file_path.display(), io_err))?;

    serde_json::from_str(&json_str).map_err(|json_err| {
        format_serde_json_error(&json_err, file_path, &format!("Failed to parse {} from", context_for_error))
    })
}

fn write_string_to_file(content: &str, path: &Path, context_msg: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| anyhow!("Failed to write {} to file '{}': {}", context_msg, path.display(), e))
}

fn load_artifact(path: &Path) -> Result<Artifact> {
    read_and_parse_json(path, "artifact")
}

/// Build an artifact from a JSON body file and print it.
pub fn create(
    ctx: &Context,
    json_file: &Path,
    artifact_type: &str,
    version: u64,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<Artifact> {
    let body: serde_json::Value = read_and_parse_json(json_file, "artifact body")?;
    let artifact = Artifact::new(artifact_type, ctx.workspace()?, body)?.with_version(version)?;
    let encoded = serde_json::to_string_pretty(&artifact)?;

    match output {
        Some(path) => {
            write_string_to_file(&encoded, path, "artifact")?;
            writeln!(out, "Artifact {} written to {}", artifact.id(), path.display())?;
        }
        None => writeln!(out, "{}", encoded)?,
    }

    AuditEvent::for_artifact(AuditAction::Create, CLI_ACTOR, &artifact)
        .with_metadata("type", artifact.artifact_type())
        .emit();
    Ok(artifact)
}

/// Sign an artifact file with the local key, generating the key on first use.
pub fn sign(ctx: &Context, artifact_file: &Path, out: &mut dyn Write) -> Result<SignatureToken> {
    let artifact = load_artifact(artifact_file)?;
    let signer = LocalSigner::from_store(&ctx.key_store)
        .with_context(|| format!("Signing key unavailable at '{}'", ctx.key_store.path().display()))?;
    let token = signer.sign(&artifact)?;

    writeln!(out, "Artifact ID: {}", artifact.id())?;
    writeln!(out, "JWS: {}", token)?;
    writeln!(out, "Key ID: {}", signer.key_id())?;

    AuditEvent::for_artifact(AuditAction::Sign, signer.key_id().as_str(), &artifact)
        .with_metadata("digest", artifact.content_digest())
        .emit();
    Ok(token)
}

/// Resolve `--public-key`: a file holding a key, or the key itself.
fn trusted_key(ctx: &Context, public_key: Option<&str>) -> Result<TrustedKey> {
    match public_key {
        Some(value) => {
            let path = Path::new(value);
            let text = if path.is_file() {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read public key file '{}'", path.display()))?
            } else {
                value.to_string()
            };
            TrustedKey::parse(&text).with_context(|| format!("Invalid public key '{}'", value))
        }
        None => {
            let key = ctx.key_store.load().context(
                "No --public-key given and no local signing key to verify against",
            )?;
            Ok(key.trusted_key())
        }
    }
}

/// Verify a token against an artifact file. An `Invalid` verdict is an error.
pub fn verify(
    ctx: &Context,
    artifact_file: &Path,
    token: &str,
    public_key: Option<&str>,
    out: &mut dyn Write,
) -> Result<VerificationResult> {
    let artifact = load_artifact(artifact_file)?;
    let trusted = trusted_key(ctx, public_key)?;
    let result = ArtifactVerifier::new().verify(&artifact, token, &trusted);

    let verdict = result.to_string();
    let shown = if result.is_valid() { verdict.green() } else { verdict.red() };
    writeln!(out, "Artifact ID: {}", artifact.id())?;
    writeln!(out, "Trusted Key ID: {}", trusted.key_id())?;
    writeln!(out, "Verification: {}", shown)?;

    AuditEvent::for_artifact(AuditAction::Verify, CLI_ACTOR, &artifact)
        .with_metadata("keyId", trusted.key_id().as_str())
        .with_metadata("valid", result.is_valid())
        .emit();

    result.into_result()?;
    Ok(result)
}

/// Push an artifact and its token to the configured store.
pub async fn push(
    ctx: &Context,
    artifact_file: &Path,
    token: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let artifact = load_artifact(artifact_file)?;
    if let Some(workspace) = &ctx.workspace {
        let expected = fedmcp_types::artifact::parse_workspace_id(workspace)?;
        if expected != artifact.workspace_id() {
            bail!(
                "Artifact belongs to workspace {} but --workspace is {}",
                artifact.workspace_id(),
                expected
            );
        }
    }

    let token: SignatureToken = match token {
        Some(token) => token.parse().context("Invalid --token")?,
        None => {
            let signer = LocalSigner::from_store(&ctx.key_store)?;
            signer.sign(&artifact)?
        }
    };

    writeln!(out, "Pushing to {}", ctx.server_url)?;
    let ack = ctx.transport()?.push(&artifact, &token).await?;
    writeln!(out, "Artifact ID: {}", ack.artifact_id)?;
    writeln!(out, "Stored at: {}", ack.stored_at.to_rfc3339())?;

    AuditEvent::for_artifact(AuditAction::Push, CLI_ACTOR, &artifact)
        .with_metadata("server", ctx.server_url.as_str())
        .with_metadata("keyId", token.key_id().unwrap_or_default())
        .emit();
    Ok(())
}

pub fn keypair_generate(ctx: &Context, force: bool, out: &mut dyn Write) -> Result<()> {
    let key = ctx.key_store.generate(force).map_err(|e| match e {
        fedmcp_types::KeyMaterialError::AlreadyExists { .. } => {
            anyhow!("{}. Pass --force to replace it.", e)
        }
        other => other.into(),
    })?;

    writeln!(out, "Keypair saved to: {}", ctx.key_store.path().display())?;
    writeln!(out, "Key ID: {}", key.key_id())?;
    writeln!(out, "DID: {}", key.did())?;
    Ok(())
}

pub fn keypair_info(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let key = ctx.key_store.load()?;
    writeln!(out, "Path: {}", ctx.key_store.path().display())?;
    writeln!(out, "Key ID: {}", key.key_id())?;
    writeln!(out, "DID: {}", key.did())?;
    writeln!(out, "Public Key: {}", hex::encode(key.verifying_key().as_bytes()))?;
    Ok(())
}

pub fn keypair_export_jwk(ctx: &Context, output: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    let key = ctx.key_store.load()?;
    let jwk = serde_json::to_string_pretty(&key.public_jwk())?;
    match output {
        Some(path) => {
            write_string_to_file(&jwk, path, "public JWK")?;
            writeln!(out, "Public JWK written to {}", path.display())?;
        }
        None => writeln!(out, "{}", jwk)?,
    }
    Ok(())
}
