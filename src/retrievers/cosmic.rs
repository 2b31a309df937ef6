use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::info;

use super::endpoints::COSMIC;
use super::standardize;
use crate::cache::Hook;
use crate::decompress::maybe_gunzip;
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, ReadOptions, read_delimited};

/// Login for the COSMIC download service.
#[derive(Clone, PartialEq, Eq)]
pub struct CosmicCredentials {
    email: String,
    password: String,
}

impl CosmicCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// The `Authorization: Basic` token.
    pub fn auth_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.email, self.password))
    }
}

impl fmt::Debug for CosmicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmicCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct SignedUrl {
    url: String,
}

/// The Cancer Gene Census and the COSMIC to HGNC mapping.
///
/// Each file is a two-step download: an authenticated request returns a
/// short-lived signed URL, which is then fetched anonymously.
pub struct Cosmic {
    fetcher: Arc<dyn Fetcher>,
    credentials: CosmicCredentials,
}

impl Cosmic {
    pub fn new(fetcher: Arc<dyn Fetcher>, credentials: CosmicCredentials) -> Self {
        Self {
            fetcher,
            credentials,
        }
    }

    fn signed_url(&self, url: &str) -> Result<String, DaedalusError> {
        let request = FetchRequest::get(url).header(
            "Authorization",
            format!("Basic {}", self.credentials.auth_token()),
        );
        let body = self.fetcher.fetch(&request).map_err(|err| match err {
            DaedalusError::FetchStatus {
                status: 401 | 403,
                message,
                ..
            } => DaedalusError::CosmicAuth(message),
            other => other,
        })?;
        let signed: SignedUrl = serde_json::from_slice(&body).map_err(|err| {
            DaedalusError::CosmicAuth(format!("unexpected reply from {url}: {err}"))
        })?;
        Ok(signed.url)
    }
}

impl Hook for Cosmic {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!(email = %self.credentials.email(), "starting to retrieve from COSMIC");
        let mut frames = BTreeMap::new();
        for (name, url) in COSMIC {
            info!("retrieving COSMIC {name}");
            let signed = self.signed_url(url)?;
            let body = maybe_gunzip(self.fetcher.fetch(&FetchRequest::get(signed))?)?;
            let options = if url.ends_with(".csv") {
                ReadOptions::csv()
            } else {
                ReadOptions::tsv()
            };
            let table = read_delimited(&format!("COSMIC {name}"), &body, &options)?;
            frames.insert(name.to_string(), standardize(table));
        }
        Ok(Dataset::Frames(frames))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;
    use crate::retrievers::testing::CannedFetcher;

    fn gzip(body: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn auth_token_is_base64_of_email_and_password() {
        let credentials = CosmicCredentials::new("user@example.org", "secret");
        assert_eq!(credentials.auth_token(), "dXNlckBleGFtcGxlLm9yZzpzZWNyZXQ=");
        assert!(!format!("{credentials:?}").contains("secret"));
    }

    #[test]
    fn follows_signed_urls() {
        let fetcher = CannedFetcher::new()
            .serve(COSMIC[0].1, r#"{"url": "https://signed.example/census"}"#)
            .serve(COSMIC[1].1, r#"{"url": "https://signed.example/ids"}"#)
            .serve(
                "https://signed.example/census",
                "Gene Symbol,Entrez GeneId,Tier,Hallmark\nTP53,7157,1,Yes\n",
            )
            .serve(
                "https://signed.example/ids",
                gzip(b"COSMIC_GENE_NAME\tEntrez_id\tHGNC_ID\nTP53\t7157\t11998\n"),
            );
        let fetcher = Arc::new(fetcher);
        let hook = Cosmic::new(fetcher.clone(), CosmicCredentials::new("a@b.org", "pw"));
        let dataset = hook.retrieve().unwrap();

        let census = dataset.frame("census").unwrap();
        assert_eq!(census.columns()[1], "entrez_geneid");
        let ids = dataset.frame("IDs").unwrap();
        assert_eq!(ids.columns()[0], "cosmic_gene_name");
        assert_eq!(ids.rows()[0][1].as_deref(), Some("7157"));

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[0].headers[0].0, "Authorization");
        assert!(requests[0].headers[0].1.starts_with("Basic "));
        assert!(requests[1].headers.is_empty());
    }

    #[test]
    fn rejected_login_is_an_auth_error() {
        struct Rejecting;
        impl Fetcher for Rejecting {
            fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, DaedalusError> {
                Err(DaedalusError::FetchStatus {
                    url: request.url.clone(),
                    status: 401,
                    message: "Unauthorized".to_string(),
                })
            }
        }
        let hook = Cosmic::new(Arc::new(Rejecting), CosmicCredentials::new("a@b.org", "pw"));
        assert_matches!(hook.retrieve(), Err(DaedalusError::CosmicAuth(_)));
    }
}
