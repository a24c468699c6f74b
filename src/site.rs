use regex::Regex;
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::{Result, ValidationError};
use crate::service::{RegisteredSite, SiteRegistry};

// Loose host-name check: optional scheme, dotted host, short TLD, optional path.
static SITE_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$")
        .expect("site URL pattern is valid")
});

pub fn validate_site_url(url: &str) -> std::result::Result<(), ValidationError> {
    if url.is_empty() || !SITE_URL_PATTERN.is_match(url) {
        return Err(ValidationError::InvalidSiteUrl(url.to_string()));
    }
    Ok(())
}

/// Validate and register a source site with the passage service.
pub async fn register_site(registry: &dyn SiteRegistry, url: &str) -> Result<RegisteredSite> {
    validate_site_url(url)?;

    let site = registry.register_site(url).await?;
    match site.site_id {
        Some(site_id) => info!("Registered site {} with id {}", url, site_id),
        None => info!("Registered site {} (service returned no id)", url),
    }
    Ok(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinalizaError;
    use crate::passage::SiteId;
    use crate::service::MockSiteRegistry;

    #[test]
    fn test_accepts_loose_host_names() {
        for url in [
            "example.com",
            "https://www.gov.br",
            "http://portal.example.org/noticias/acessibilidade",
            "sub.domain.example.co.uk/path/",
        ] {
            assert!(validate_site_url(url).is_ok(), "should accept {}", url);
        }
    }

    #[test]
    fn test_rejects_invalid_urls() {
        for url in ["", "localhost", "ftp://example.com", "https://EXAMPLE", "not a url"] {
            assert!(validate_site_url(url).is_err(), "should reject {}", url);
        }
    }

    #[tokio::test]
    async fn test_register_site_validates_first() {
        let mut registry = MockSiteRegistry::new();
        registry.expect_register_site().never();

        let err = register_site(&registry, "nope").await.unwrap_err();
        assert!(matches!(
            err,
            SinalizaError::Validation(ValidationError::InvalidSiteUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_register_site_returns_service_answer() {
        let mut registry = MockSiteRegistry::new();
        registry
            .expect_register_site()
            .withf(|url| url.to_string() == "https://www.gov.br")
            .times(1)
            .returning(|url| {
                Ok(RegisteredSite {
                    site_url: Some(url.to_string()),
                    site_id: Some(SiteId(12)),
                })
            });

        let site = register_site(&registry, "https://www.gov.br").await.unwrap();
        assert_eq!(site.site_id, Some(SiteId(12)));
    }
}
