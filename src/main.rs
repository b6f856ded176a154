#![deny(clippy::all)]

//! A server that tells clients what it sees of their request, of itself and
//! of them.

mod endpoints;
mod errors;
mod logging;
mod network;
mod settings;
mod toggles;
mod utils;

use crate::{
    endpoints::EndpointState, errors::ReporterError, logging::MozLogger, network::SystemResolver,
    settings::Settings, toggles::Toggles,
};
use actix_web::{web, App, HttpServer};
use std::sync::Arc;

const APP_NAME: &str = "diag-reporter";

#[actix_web::main]
async fn main() -> Result<(), ReporterError> {
    let settings = Settings::load()?;
    let log = MozLogger::from_settings(&settings);

    let _sentry = sentry::init((
        settings.sentry_dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    announce_sections(&log.log, settings.toggles);
    slog::info!(log.log, "Will listen on {} port", settings.http_port);

    let addr = settings.listen_addr();
    let state = web::Data::new(EndpointState {
        resolver: Arc::new(SystemResolver::new(&log.log)),
        settings,
        log: log.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(sentry_actix::Sentry::new())
            .default_service(web::to(endpoints::report::report))
    })
    .bind(&addr)
    .map_err(|err| {
        slog::crit!(log.log, "Couldn't listen on {}: {}", addr, err);
        ReporterError::from_source(format!("Couldn't listen on {}", addr), err)
    })?;

    slog::info!(log.log, "started {} on http://{}", APP_NAME, addr);
    server.run().await?;
    Ok(())
}

fn announce_sections(log: &slog::Logger, toggles: Toggles) {
    if toggles.http {
        slog::info!(log, "Enabled HTTP debug section");
    }
    if toggles.server {
        slog::info!(log, "Enabled server debug section");
    }
    if toggles.client {
        slog::info!(log, "Enabled client debug section");
    }
    if !toggles.any() {
        slog::warn!(
            log,
            "You need to enable at least one section for this software to be useful!"
        );
    }
}
