mod config;
mod event;
mod github;
mod hooks;
mod logbook;
mod signature;
mod week;

use actix::Actor as _;
use actix_web::{middleware::Logger, web, App, HttpServer};
use color_eyre::eyre;

use crate::logbook::{CredentialProvider, Drive, InstalledFlow, Logbook, StaticToken};

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install()?;
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())?;

    let config::Config {
        port,
        hook_path,
        webhook_secret,
        week_start,
        drive_folder_id,
        drive_token,
        client_secret_path,
        token_cache_name,
    } = envy::prefixed("GHLOG_").from_env()?;

    let drive = match drive_folder_id {
        Some(folder_id) => {
            let provider: Box<dyn CredentialProvider> = match drive_token {
                Some(token) => Box::new(StaticToken::new(token)),
                None => Box::new(InstalledFlow::new(&client_secret_path, &token_cache_name)?),
            };
            let token = provider.access_token().await?;
            Some(Drive::new(token, folder_id, week_start))
        }
        None => {
            tracing::warn!("GHLOG_DRIVE_FOLDER_ID is not set, the remote weekly log is disabled");
            None
        }
    };
    let logbook = Logbook::new(drive).start();

    HttpServer::new(move || {
        App::new()
            .data(logbook.clone())
            .app_data(hooks::HookConfig {
                secret: webhook_secret.clone(),
            })
            .wrap(Logger::default())
            .route(&hook_path, web::post().to(hooks::github_hook))
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
    .map_err(Into::into)
}
