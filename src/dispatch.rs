use crate::api::{BackendClient, ContactsRequest};
use crate::chat::Submission;
use crate::event::AppEvent;
use eframe::egui;
use std::sync::mpsc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Runs backend calls on the tokio runtime and posts results back to the UI.
#[derive(Clone)]
pub struct Dispatcher {
    backend: BackendClient,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    repaint: Option<egui::Context>,
}

#[derive(Clone)]
struct Outbox {
    tx: mpsc::Sender<AppEvent>,
    repaint: Option<egui::Context>,
}

impl Outbox {
    fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("ui event channel closed; dropping event");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

impl Dispatcher {
    pub fn new(
        backend: BackendClient,
        tx: mpsc::Sender<AppEvent>,
        runtime_handle: Handle,
        repaint: Option<egui::Context>,
    ) -> Self {
        Self {
            backend,
            tx,
            runtime_handle,
            repaint,
        }
    }

    fn outbox(&self) -> Outbox {
        Outbox {
            tx: self.tx.clone(),
            repaint: self.repaint.clone(),
        }
    }

    /// Issues exactly one chat request. The returned handle cancels it.
    pub fn send_chat(&self, submission: Submission) -> AbortHandle {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        let task = self.runtime_handle.spawn(async move {
            let Submission { id, request } = submission;
            let result = backend.chat(&request).await.map_err(|err| {
                tracing::error!(request = id.0, "chat request failed: {err}");
                err.to_string()
            });
            outbox.send(AppEvent::ChatReply { id, result });
        });
        task.abort_handle()
    }

    pub fn upload_voice(&self, wav: Vec<u8>) {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        self.runtime_handle.spawn(async move {
            tracing::info!(bytes = wav.len(), "uploading voice clip");
            let result = backend
                .upload_voice(wav)
                .await
                .map(|reply| reply.text().map(str::to_string))
                .map_err(|err| {
                    tracing::error!("voice upload failed: {err}");
                    err.to_string()
                });
            outbox.send(AppEvent::VoiceTranscribed(result));
        });
    }

    pub fn load_countries(&self) {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        self.runtime_handle.spawn(async move {
            let result = backend.countries().await.map_err(|err| {
                tracing::warn!("failed to load countries: {err}");
                err.to_string()
            });
            outbox.send(AppEvent::CountriesLoaded(result));
        });
    }

    pub fn load_cities(&self, country: String) {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        self.runtime_handle.spawn(async move {
            let result = backend.cities(&country).await.map_err(|err| {
                tracing::warn!(%country, "failed to load cities: {err}");
                err.to_string()
            });
            outbox.send(AppEvent::CitiesLoaded { country, result });
        });
    }

    pub fn load_contacts(&self, request: ContactsRequest) {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        self.runtime_handle.spawn(async move {
            let result = backend.contacts(&request).await.map_err(|err| {
                tracing::warn!("failed to load contacts: {err}");
                err.to_string()
            });
            outbox.send(AppEvent::ContactsLoaded { request, result });
        });
    }

    pub fn lookup_university(&self, name: String) {
        let backend = self.backend.clone();
        let outbox = self.outbox();

        self.runtime_handle.spawn(async move {
            let result = backend.university_resources(&name).await.map_err(|err| {
                if err.is_not_found() {
                    crate::directory::UNIVERSITY_NOT_FOUND.to_string()
                } else {
                    tracing::warn!(university = %name, "university lookup failed: {err}");
                    err.to_string()
                }
            });
            outbox.send(AppEvent::UniversityLoaded { name, result });
        });
    }
}
