use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::{self, WrapErr as _};
use secstr::SecUtf8;

use crate::week::{self, WeekStart};

const DRIVE_API: &str = "https://www.googleapis.com/drive/v2";
const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v2";

const EXPORT_SIZE_LIMIT: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildList {
    #[serde(default)]
    items: Vec<ChildRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ChildRef {
    id: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMeta {
    #[serde(default)]
    export_links: HashMap<String, String>,
}

/// Google Drive v2 client scoped to one folder of weekly log documents.
pub struct Drive {
    http: awc::Client,
    token: SecUtf8,
    pub folder_id: String,
    week_start: WeekStart,
}

impl Drive {
    pub fn new(token: SecUtf8, folder_id: String, week_start: WeekStart) -> Self {
        Self {
            http: awc::Client::new(),
            token,
            folder_id,
            week_start,
        }
    }

    pub async fn append(self: Arc<Self>, text: String) {
        if let Err(err) = self.try_append(&text).await {
            tracing::error!("Failed appending to the weekly log: {}", err);
        }
    }

    async fn try_append(&self, text: &str) -> eyre::Result<()> {
        let title = week::label(chrono::Local::now().date_naive(), self.week_start);
        let file_id = self
            .find_log(&title)
            .await?
            .ok_or_else(|| eyre::eyre!("no weekly log document titled `{}`", title))?;
        let content = self.export_text(&file_id).await?;
        self.update_text(&file_id, format!("{}\n{}", content, text))
            .await
    }

    /// Finds the document titled `title` among the folder's children,
    /// following `nextPageToken` pagination.
    async fn find_log(&self, title: &str) -> eyre::Result<Option<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("q".to_owned(), format!("title = '{}'", title))];
            if let Some(token) = page_token.take() {
                query.push(("pageToken".to_owned(), token));
            }

            let mut resp = self
                .http
                .get(format!("{}/files/{}/children", DRIVE_API, self.folder_id))
                .bearer_auth(self.token.unsecure())
                .query(&query)
                .map_err(|err| eyre::eyre!("failed to encode the children query: {}", err))?
                .send()
                .await
                .map_err(|err| eyre::eyre!("failed to list folder children: {}", err))?;
            if resp.status().as_u16() >= 400 {
                eyre::bail!("Drive children listing returned {}", resp.status());
            }
            let list: ChildList = resp
                .json()
                .await
                .map_err(|err| eyre::eyre!("failed to decode the children listing: {}", err))?;

            ids.extend(list.items.into_iter().map(|child| child.id));
            page_token = list.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(ids.into_iter().next())
    }

    async fn export_text(&self, file_id: &str) -> eyre::Result<String> {
        let mut resp = self
            .http
            .get(format!("{}/files/{}", DRIVE_API, file_id))
            .bearer_auth(self.token.unsecure())
            .send()
            .await
            .map_err(|err| eyre::eyre!("failed to fetch document metadata: {}", err))?;
        if resp.status().as_u16() >= 400 {
            eyre::bail!("Drive metadata fetch returned {}", resp.status());
        }
        let meta: FileMeta = resp
            .json()
            .await
            .map_err(|err| eyre::eyre!("failed to decode document metadata: {}", err))?;

        let url = meta
            .export_links
            .get("text/plain")
            .ok_or_else(|| eyre::eyre!("document `{}` has no text/plain export", file_id))?;

        let mut resp = self
            .http
            .get(url.as_str())
            .bearer_auth(self.token.unsecure())
            .send()
            .await
            .map_err(|err| eyre::eyre!("failed to download document text: {}", err))?;
        if resp.status().as_u16() >= 400 {
            eyre::bail!("Drive export download returned {}", resp.status());
        }
        let body = resp
            .body()
            .limit(EXPORT_SIZE_LIMIT)
            .await
            .map_err(|err| eyre::eyre!("failed to read document text: {}", err))?;

        String::from_utf8(body.to_vec()).wrap_err("exported document isn't valid UTF-8")
    }

    async fn update_text(&self, file_id: &str, content: String) -> eyre::Result<()> {
        let mut resp = self
            .http
            .put(format!(
                "{}/files/{}?uploadType=media",
                DRIVE_UPLOAD_API, file_id
            ))
            .bearer_auth(self.token.unsecure())
            .content_type("text/plain")
            .send_body(content)
            .await
            .map_err(|err| eyre::eyre!("failed to upload document content: {}", err))?;

        if resp.status().as_u16() >= 400 {
            eyre::bail!(
                "Drive update returned {}: {}",
                resp.status(),
                String::from_utf8_lossy(
                    resp.body()
                        .await
                        .map_err(|err| eyre::eyre!("failed to read Drive error body: {}", err))?
                        .as_ref()
                )
            );
        }

        Ok(())
    }
}
