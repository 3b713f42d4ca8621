// ─── Remote Catalog ───
// URL resolution against the hosted mod catalog. Project slugs are looked up
// by numeric id through the redirect the site issues for `/projects/<id>`,
// and cached for the lifetime of the run.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::{CatalogSource, ResolvedVersion};
use crate::core::error::SyncResult;
use crate::core::pack::Mod;

const DEFAULT_BASE: &str = "https://minecraft.curseforge.com";

pub struct RemoteCatalog {
    /// Client that does not follow redirects; slug resolution reads the
    /// `Location` header off the redirect response.
    client: Client,
    base: String,
    slug_cache: Mutex<HashMap<u32, Option<String>>>,
}

impl RemoteCatalog {
    pub fn new(client: Client) -> Self {
        Self::with_base(client, DEFAULT_BASE)
    }

    pub fn with_base(client: Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
            slug_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the URL slug of a project by numeric id, or `None` when the
    /// catalog does not know the project.
    async fn project_slug(&self, project_id: u32) -> SyncResult<Option<String>> {
        let mut cache = self.slug_cache.lock().await;
        if let Some(cached) = cache.get(&project_id) {
            return Ok(cached.clone());
        }

        debug!("Getting project slug for id {}.", project_id);
        let url = format!("{}/projects/{}", self.base, project_id);
        let response = self.client.get(&url).send().await?;

        let slug = if response.status().is_redirection() {
            response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| {
                    location
                        .split('/')
                        .filter(|part| !part.is_empty())
                        .next_back()
                        .map(str::to_string)
                })
        } else {
            error!(
                "Catalog answered {} for project {}, cannot resolve slug.",
                response.status(),
                project_id
            );
            None
        };

        cache.insert(project_id, slug.clone());
        Ok(slug)
    }
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    async fn pack_download_url(
        &self,
        project_name: &str,
        version: &ResolvedVersion,
    ) -> SyncResult<String> {
        Ok(format!(
            "{}/projects/{}/files/{}/download",
            self.base, project_name, version.id
        ))
    }

    async fn artifact_download_url(&self, artifact: &Mod) -> SyncResult<Option<String>> {
        let Some(slug) = self.project_slug(artifact.project_id).await? else {
            return Ok(None);
        };
        Ok(Some(format!(
            "{}/projects/{}/files/{}/download",
            self.base, slug, artifact.file_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_no_redirect_client;

    #[tokio::test]
    async fn pack_url_uses_name_and_file_id() {
        let catalog =
            RemoteCatalog::with_base(build_no_redirect_client().unwrap(), "https://example.test");
        let version = ResolvedVersion {
            id: 2375628,
            name: "3.0.6".into(),
        };
        let url = catalog.pack_download_url("skyfactory", &version).await.unwrap();
        assert_eq!(
            url,
            "https://example.test/projects/skyfactory/files/2375628/download"
        );
    }
}
