use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SinalizaError};
use crate::passage::{PassageId, SiteId};
use super::{FetchedPassage, RegisteredSite};

/// Envelope returned by `get_trecho_para_traduzir`
#[derive(Debug, Deserialize)]
struct FetchEnvelope {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    response: Value,
}

#[derive(Debug, Deserialize)]
struct WirePassage {
    conteudo: String,
    #[serde(default)]
    snapshot_name: Option<String>,
    trecho_id: i64,
    site_url: String,
    site_id: i64,
}

#[derive(Debug, Deserialize)]
struct WireRegisteredSite {
    #[serde(default)]
    site_url: Option<String>,
    #[serde(default)]
    site_id: Option<i64>,
}

/// Parse and validate the body of a successful fetch.
pub fn parse_fetch_response(body: &str) -> Result<Vec<FetchedPassage>> {
    let envelope: FetchEnvelope = serde_json::from_str(body)
        .map_err(|e| SinalizaError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if envelope.status.as_str() != Some("success") {
        return Err(SinalizaError::MalformedResponse(format!(
            "unexpected status field: {}",
            envelope.status
        )));
    }

    if !envelope.response.is_array() {
        return Err(SinalizaError::MalformedResponse(
            "response field is not a list".to_string(),
        ));
    }

    let passages: Vec<WirePassage> = serde_json::from_value(envelope.response)
        .map_err(|e| SinalizaError::MalformedResponse(format!("invalid passage entry: {}", e)))?;

    debug!("Service returned {} passages", passages.len());

    passages
        .into_iter()
        .map(|p| {
            if p.conteudo.trim().is_empty() {
                return Err(SinalizaError::MalformedResponse(format!(
                    "passage {} has empty content",
                    p.trecho_id
                )));
            }
            Ok(FetchedPassage {
                content: p.conteudo,
                snapshot_name: p.snapshot_name,
                passage_id: PassageId(p.trecho_id),
                site_url: p.site_url,
                site_id: SiteId(p.site_id),
            })
        })
        .collect()
}

/// Parse the body of `registra_site`. Any JSON object is accepted.
pub fn parse_registered_site(body: &str) -> Result<RegisteredSite> {
    let site: WireRegisteredSite = serde_json::from_str(body)
        .map_err(|e| SinalizaError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    Ok(RegisteredSite {
        site_url: site.site_url,
        site_id: site.site_id.map(SiteId),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_response() {
        let body = r#"{
            "status": "success",
            "response": [
                {"conteudo": "Primeiro trecho", "snapshot_name": "snap_1.png", "trecho_id": 10, "site_url": "https://gov.example.br", "site_id": 3},
                {"conteudo": "Segundo trecho", "trecho_id": 11, "site_url": "https://gov.example.br", "site_id": 3}
            ]
        }"#;

        let passages = parse_fetch_response(body).unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].passage_id, PassageId(10));
        assert_eq!(passages[0].snapshot_name.as_deref(), Some("snap_1.png"));
        assert_eq!(passages[1].snapshot_name, None);
        assert_eq!(passages[1].site_id, SiteId(3));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let passages = parse_fetch_response(r#"{"status": "success", "response": []}"#).unwrap();
        assert!(passages.is_empty());
    }

    #[test]
    fn test_malformed_shapes() {
        let cases = [
            "not json",
            r#"{"status": 200, "response": []}"#,
            r#"{"status": "success"}"#,
            r#"{"status": "success", "response": {"trecho_id": 1}}"#,
            r#"{"status": "success", "response": [{"conteudo": "x", "site_url": "u", "site_id": 1}]}"#,
            r#"{"status": "success", "response": [{"conteudo": " ", "trecho_id": 1, "site_url": "u", "site_id": 1}]}"#,
        ];

        for body in cases {
            assert!(
                matches!(parse_fetch_response(body), Err(SinalizaError::MalformedResponse(_))),
                "expected malformed: {}",
                body
            );
        }
    }

    #[test]
    fn test_parse_registered_site() {
        let site = parse_registered_site(r#"{"site_url": "https://a.org", "site_id": 5}"#).unwrap();
        assert_eq!(site.site_id, Some(SiteId(5)));

        let site = parse_registered_site("{}").unwrap();
        assert_eq!(site, RegisteredSite::default());
    }
}
