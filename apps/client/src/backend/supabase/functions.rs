use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{error_from_response, SupabaseClient};
use crate::backend::PdfExport;
use crate::errors::ClientError;
use crate::models::suggestion::SuggestionRequest;
use crate::models::user::Session;
use crate::models::version::{NewVersion, ResumeVersion, VersionSummary};

const AI_SUGGEST: &str = "functions/v1/ai-suggest";
const EXPORT_PDF: &str = "functions/v1/export-pdf";
const RESUME_VERSIONS: &str = "functions/v1/resume-versions";

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    suggestion: Option<String>,
}

/// Picks the download name out of a `content-disposition` header.
///
/// Only attachments are considered. A `filename*=` value is percent-decoded
/// after its charset prefix and wins over a plain `filename=`. Quoted values
/// may contain `;`.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut params = disposition_params(header);
    let kind = params.next()?;
    if !kind.trim().eq_ignore_ascii_case("attachment") {
        return None;
    }
    let mut plain = None;
    let mut extended = None;
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(value)),
            "filename*" => {
                let encoded = value.splitn(3, '\'').last().unwrap_or(value);
                extended = percent_decode(&unquote(encoded));
            }
            _ => {}
        }
    }
    extended
        .filter(|name| !name.is_empty())
        .or(plain)
        .filter(|name| !name.is_empty())
}

/// Splits a header on `;`, leaving separators inside quoted strings alone.
fn disposition_params(header: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let (mut start, mut quoted, mut escaped) = (0, false, false);
    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts.into_iter()
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => out.extend(chars.next()),
                    c => out.push(c),
                }
            }
            out
        }
        None => value.to_string(),
    }
}

fn percent_decode(value: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut rest = value.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        if b == b'%' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(b);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

impl SupabaseClient {
    pub(super) async fn call_ai_suggest(
        &self,
        session: &Session,
        request: &SuggestionRequest,
    ) -> Result<Option<String>, ClientError> {
        let url = self.url(AI_SUGGEST);
        debug!("POST {url} type={:?}", request.kind);
        let response = self
            .authed(self.client.post(&url), session)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body: SuggestionResponse = response.json().await?;
        Ok(body.suggestion)
    }

    pub(super) async fn call_export_pdf(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<PdfExport, ClientError> {
        let url = self.url(EXPORT_PDF);
        debug!("GET {url} resumeId={resume_id}");
        let response = self
            .authed(self.client.get(&url), session)
            .query(&[("resumeId", resume_id.to_string())])
            .send()
            .await?;
        if response.status().as_u16() == 403 {
            return Err(ClientError::QuotaExceeded);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = response.bytes().await?;
        Ok(PdfExport { filename, bytes })
    }

    pub(super) async fn post_version(
        &self,
        session: &Session,
        version: &NewVersion<'_>,
    ) -> Result<(), ClientError> {
        let url = self.url(RESUME_VERSIONS);
        debug!("POST {url} resume_id={}", version.resume_id);
        let response = self
            .authed(self.client.post(&url), session)
            .json(version)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    pub(super) async fn get_versions(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<Vec<VersionSummary>, ClientError> {
        let url = self.url(RESUME_VERSIONS);
        debug!("GET {url} resumeId={resume_id}");
        let response = self
            .authed(self.client.get(&url), session)
            .query(&[("resumeId", resume_id.to_string())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        // The function answers `null` when a resume has no history yet.
        let versions: Option<Vec<VersionSummary>> = response.json().await?;
        Ok(versions.unwrap_or_default())
    }

    pub(super) async fn get_version(
        &self,
        session: &Session,
        version_id: Uuid,
    ) -> Result<ResumeVersion, ClientError> {
        let url = self.url(&format!("{RESUME_VERSIONS}/{version_id}"));
        debug!("GET {url}");
        let response = self
            .authed(self.client.get(&url), session)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}
