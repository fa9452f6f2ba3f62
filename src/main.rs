mod api;
mod app;
mod chat;
mod config;
mod directory;
mod dispatch;
mod event;
mod markdown;
mod settings;
mod theme;
mod voice;

use api::BackendClient;
use app::CalmMateApp;
use config::Config;
use dispatch::Dispatcher;
use eframe::egui;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;
use voice::{CpalMicrophone, VoiceCapture};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("calmmate=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {err}");
            return Err(err.into());
        }
    };
    tracing::info!(
        base_url = %config.base_url,
        chat_path = %config.chat_path,
        "starting CalmMate"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("calmmate-runtime")
        .build()?;

    let backend = BackendClient::new(&config)?;
    let (tx, rx) = mpsc::channel();
    let runtime_handle = runtime.handle().clone();
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CalmMate")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([860.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CalmMate",
        native_options,
        Box::new(move |creation_context| {
            let dispatcher = Dispatcher::new(
                backend,
                tx,
                runtime_handle,
                Some(creation_context.egui_ctx.clone()),
            );
            let voice = VoiceCapture::new(Box::new(CpalMicrophone::new()), None);
            Ok(Box::new(CalmMateApp::new(rx, dispatcher, voice)))
        }),
    )?;

    Ok(())
}
