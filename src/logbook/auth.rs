use std::path::{Path, PathBuf};

use async_trait::async_trait;
use color_eyre::eyre::{self, WrapErr as _};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse as _, TokenUrl,
};
use secstr::SecUtf8;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Where the Drive access token comes from. Resolved once at startup, so
/// headless deployments can plug in a pre-obtained token while workstations
/// get the interactive installed-app flow.
#[async_trait(?Send)]
pub trait CredentialProvider {
    async fn access_token(&self) -> eyre::Result<SecUtf8>;
}

/// A token supplied through configuration, as-is.
pub struct StaticToken(SecUtf8);

impl StaticToken {
    pub fn new(token: SecUtf8) -> Self {
        Self(token)
    }
}

#[async_trait(?Send)]
impl CredentialProvider for StaticToken {
    async fn access_token(&self) -> eyre::Result<SecUtf8> {
        Ok(self.0.clone())
    }
}

/// Google "installed application" client secrets file.
#[derive(Debug, serde::Deserialize)]
struct ClientSecrets {
    installed: InstalledSecrets,
}

#[derive(Debug, serde::Deserialize)]
struct InstalledSecrets {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// The authorization-code flow for installed applications: reuse a cached
/// token when one exists, otherwise walk the operator through the consent
/// URL, read the authorization code from stdin, and cache the exchanged
/// token under `~/.credentials/`.
pub struct InstalledFlow {
    secrets_path: PathBuf,
    cache_path: PathBuf,
}

impl InstalledFlow {
    pub fn new(secrets_path: &Path, cache_name: &str) -> eyre::Result<Self> {
        let home =
            std::env::var_os("HOME").ok_or_else(|| eyre::eyre!("`HOME` is not set"))?;
        let escaped: String =
            url::form_urlencoded::byte_serialize(cache_name.as_bytes()).collect();
        Ok(Self {
            secrets_path: secrets_path.to_owned(),
            cache_path: PathBuf::from(home).join(".credentials").join(escaped),
        })
    }

    /// An unreadable or unparsable cache is treated as absent: the consent
    /// flow runs again and overwrites it.
    fn cached_token(&self) -> Option<BasicTokenResponse> {
        let data = std::fs::read(&self.cache_path).ok()?;
        serde_json::from_slice(&data).ok()
    }

    fn store_token(&self, token: &BasicTokenResponse) -> eyre::Result<()> {
        use std::os::unix::fs::{DirBuilderExt as _, OpenOptionsExt as _};

        if let Some(dir) = self.cache_path.parent() {
            std::fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(dir)
                .wrap_err("failed to create the credentials directory")?;
        }
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.cache_path)
            .wrap_err("failed to create the token cache file")?;
        serde_json::to_writer(file, token).wrap_err("failed to write the token cache")?;

        tracing::info!(
            path = self.cache_path.to_string_lossy().as_ref(),
            "Cached OAuth token"
        );
        Ok(())
    }

    async fn consent_flow(&self) -> eyre::Result<BasicTokenResponse> {
        let secrets: ClientSecrets = serde_json::from_slice(
            &std::fs::read(&self.secrets_path).wrap_err_with(|| {
                format!("failed to read client secrets from {:?}", self.secrets_path)
            })?,
        )
        .wrap_err("failed to parse the client secrets file")?;
        let installed = secrets.installed;

        let redirect = installed
            .redirect_uris
            .into_iter()
            .next()
            .unwrap_or_else(|| OOB_REDIRECT.to_owned());

        let client = BasicClient::new(
            ClientId::new(installed.client_id),
            Some(ClientSecret::new(installed.client_secret)),
            AuthUrl::new(installed.auth_uri).wrap_err("invalid auth URI")?,
            Some(TokenUrl::new(installed.token_uri).wrap_err("invalid token URI")?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect).wrap_err("invalid redirect URI")?);

        let (auth_url, _csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_owned()))
            .url();

        println!("Open the following link in your browser, then paste the authorization code here:");
        println!("{}", auth_url);

        let mut code = String::new();
        std::io::stdin()
            .read_line(&mut code)
            .wrap_err("failed to read the authorization code")?;

        client
            .exchange_code(AuthorizationCode::new(code.trim().to_owned()))
            .request_async(send_token_request)
            .await
            .map_err(|err| eyre::eyre!("failed to exchange the authorization code: {}", err))
    }
}

#[async_trait(?Send)]
impl CredentialProvider for InstalledFlow {
    async fn access_token(&self) -> eyre::Result<SecUtf8> {
        if let Some(token) = self.cached_token() {
            return Ok(SecUtf8::from(token.access_token().secret().as_str()));
        }
        let token = self.consent_flow().await?;
        self.store_token(&token)?;
        Ok(SecUtf8::from(token.access_token().secret().as_str()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TransportError(String);

/// Drives the `oauth2` token exchange over the same `awc` client the rest of
/// the binary uses, keeping everything on the actix runtime.
async fn send_token_request(
    request: oauth2::HttpRequest,
) -> Result<oauth2::HttpResponse, TransportError> {
    let client = awc::Client::new();

    let mut builder = client.request(request.method, request.url.as_str());
    for (name, value) in request.headers.iter() {
        if let Ok(value) = value.to_str() {
            builder = builder.header(name.as_str(), value);
        }
    }

    let mut resp = builder
        .send_body(request.body)
        .await
        .map_err(|err| TransportError(format!("failed to send the token request: {}", err)))?;
    let body = resp
        .body()
        .await
        .map_err(|err| TransportError(format!("failed to read the token response: {}", err)))?;

    let mut headers = http::HeaderMap::new();
    for (name, value) in resp.headers() {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_str().as_bytes()),
            http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }

    Ok(oauth2::HttpResponse {
        status_code: http::StatusCode::from_u16(resp.status().as_u16())
            .map_err(|err| TransportError(err.to_string()))?,
        headers,
        body: body.to_vec(),
    })
}
