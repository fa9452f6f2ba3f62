use crate::api::ContactCategory;
use crate::chat::message::timestamp;
use crate::chat::{
    ChatClient, ChatMessage, ReplyOutcome, Sender, SuggestionsPanel, NOT_UNDERSTOOD,
};
use crate::directory::{Directory, Output};
use crate::dispatch::Dispatcher;
use crate::event::AppEvent;
use crate::markdown::{LineKind, MarkdownLine, Span};
use crate::settings::{store, Preferences};
use crate::theme::Theme;
use crate::voice::{VoiceCapture, VoiceMode, VoiceOutcome};
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct CalmMateApp {
    rx: Receiver<AppEvent>,
    dispatcher: Dispatcher,
    chat: ChatClient,
    voice: VoiceCapture,
    directory: Directory,
    prefs: Preferences,
    theme: Theme,
    input_buffer: String,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    style_dirty: bool,
}

impl CalmMateApp {
    pub fn new(rx: Receiver<AppEvent>, dispatcher: Dispatcher, voice: VoiceCapture) -> Self {
        let (prefs, warning) = store::load();
        let mut app = Self {
            rx,
            dispatcher,
            chat: ChatClient::new(),
            voice,
            directory: Directory::default(),
            theme: Theme::for_preferences(&prefs),
            prefs,
            input_buffer: String::new(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            style_dirty: true,
        };

        if let Some(warning) = warning {
            tracing::warn!("{warning}");
            app.log_diagnostic(format!("preferences warning: {warning}"));
        }

        app.dispatcher.load_countries();
        app
    }

    fn log_diagnostic(&mut self, entry: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", timestamp(), entry.into()));
    }

    fn update_preferences(&mut self, change: impl FnOnce(&mut Preferences) -> bool) {
        if !change(&mut self.prefs) {
            return;
        }
        self.theme = Theme::for_preferences(&self.prefs);
        self.style_dirty = true;
        if let Err(err) = store::save(&self.prefs) {
            tracing::warn!("failed to save preferences: {err}");
            self.log_diagnostic(format!("failed to save preferences: {err}"));
        }
    }

    fn submit_text(&mut self, text: &str) {
        let Some(submission) = self.chat.submit(text) else {
            return;
        };
        let id = submission.id;
        let handle = self.dispatcher.send_chat(submission);
        self.chat.attach_task(id, handle);
        self.scroll_to_bottom = true;
    }

    fn submit_input(&mut self) {
        let text = std::mem::take(&mut self.input_buffer);
        self.submit_text(&text);
    }

    fn toggle_voice(&mut self) {
        if self.voice.is_recording() {
            self.stop_voice();
            return;
        }

        match self.voice.start() {
            Ok(mode) => self.log_diagnostic(format!("voice capture started ({mode:?})")),
            Err(err) => {
                tracing::warn!("microphone unavailable: {err}");
                self.log_diagnostic(format!("microphone error: {err}"));
                self.chat.notice(format!(
                    "Microphone access failed: {err}. Please check your microphone permissions."
                ));
                self.scroll_to_bottom = true;
            }
        }
    }

    fn stop_voice(&mut self) {
        match self.voice.stop() {
            Ok(VoiceOutcome::Idle) => {}
            Ok(VoiceOutcome::Submit(text)) => self.submit_text(&text),
            Ok(VoiceOutcome::Upload(wav)) => {
                self.log_diagnostic(format!("uploading {} bytes of audio", wav.len()));
                self.dispatcher.upload_voice(wav);
            }
            Ok(VoiceOutcome::NotUnderstood) => self.chat.notice(NOT_UNDERSTOOD),
            Err(err) => {
                tracing::error!("voice capture failed: {err}");
                self.log_diagnostic(format!("voice error: {err}"));
                self.chat.notice(NOT_UNDERSTOOD);
            }
        }
        self.scroll_to_bottom = true;
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        let mut received = false;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    received = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
        if received {
            ctx.request_repaint();
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatReply { id, result } => {
                if let Err(err) = &result {
                    self.log_diagnostic(format!("chat request {} failed: {err}", id.0));
                }
                if self.chat.apply_reply(id, result) == ReplyOutcome::Stale {
                    self.log_diagnostic(format!("dropped reply for request {}", id.0));
                }
                self.scroll_to_bottom = true;
            }
            AppEvent::VoiceTranscribed(Ok(Some(text))) => self.submit_text(&text),
            AppEvent::VoiceTranscribed(Ok(None)) => {
                self.chat.notice(NOT_UNDERSTOOD);
                self.scroll_to_bottom = true;
            }
            AppEvent::VoiceTranscribed(Err(err)) => {
                self.log_diagnostic(format!("voice upload failed: {err}"));
                self.chat.notice(NOT_UNDERSTOOD);
                self.scroll_to_bottom = true;
            }
            AppEvent::CountriesLoaded(result) => {
                if let Err(err) = &result {
                    self.log_diagnostic(format!("countries failed: {err}"));
                }
                self.directory.apply_countries(result);
            }
            AppEvent::CitiesLoaded { country, result } => {
                if let Err(err) = &result {
                    self.log_diagnostic(format!("cities for {country} failed: {err}"));
                }
                self.directory.apply_cities(&country, result);
            }
            AppEvent::ContactsLoaded { request, result } => {
                if let Err(err) = &result {
                    self.log_diagnostic(format!("contacts failed: {err}"));
                }
                self.directory.apply_contacts(&request, result);
            }
            AppEvent::UniversityLoaded { name, result } => {
                self.directory.apply_university(&name, result);
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("CalmMate");
                ui.separator();

                if ui.button("A-").on_hover_text("Smaller text").clicked() {
                    self.update_preferences(Preferences::decrease_font);
                }
                ui.label(format!("{:.0} pt", self.prefs.font_size));
                if ui.button("A+").on_hover_text("Larger text").clicked() {
                    self.update_preferences(Preferences::increase_font);
                }
                ui.separator();

                let calm_label = if self.prefs.calm_mode {
                    "Calm mode: on"
                } else {
                    "Calm mode: off"
                };
                if ui.button(calm_label).clicked() {
                    self.update_preferences(|prefs| {
                        prefs.calm_mode = !prefs.calm_mode;
                        true
                    });
                }

                let sidebar_label = if self.prefs.sidebar_open {
                    "Hide sidebar"
                } else {
                    "Show sidebar"
                };
                if ui.button(sidebar_label).clicked() {
                    self.update_preferences(|prefs| {
                        prefs.sidebar_open = !prefs.sidebar_open;
                        true
                    });
                }
                ui.separator();

                if ui.button("Clear chat").clicked() {
                    self.chat.clear();
                    self.log_diagnostic("chat cleared");
                }
            });
        });
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        if !self.prefs.sidebar_open {
            return;
        }

        egui::SidePanel::left("directory_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ScrollArea::vertical()
                    .id_salt("directory_scroll")
                    .show(ui, |ui| {
                        self.render_contacts(ui);
                        ui.separator();
                        self.render_university(ui);
                    });
            });
    }

    fn render_contacts(&mut self, ui: &mut egui::Ui) {
        ui.heading("Emergency Contacts");

        let mut chosen_country = None;
        let country_text = self
            .directory
            .countries_error()
            .or(self.directory.country())
            .unwrap_or("Select a country")
            .to_string();
        egui::ComboBox::from_id_salt("country_select")
            .selected_text(country_text)
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for country in self.directory.countries() {
                    let selected = self.directory.country() == Some(country.as_str());
                    if ui.selectable_label(selected, country).clicked() {
                        chosen_country = Some(country.clone());
                    }
                }
            });
        if let Some(country) = chosen_country {
            if let Some(country) = self.directory.select_country(Some(country)) {
                self.dispatcher.load_cities(country);
            }
        }

        let mut chosen_city = None;
        let city_text = self
            .directory
            .cities_error()
            .or(self.directory.city())
            .unwrap_or("Select a city")
            .to_string();
        ui.add_enabled_ui(self.directory.country().is_some(), |ui| {
            egui::ComboBox::from_id_salt("city_select")
                .selected_text(city_text)
                .width(ui.available_width())
                .show_ui(ui, |ui| {
                    for city in self.directory.cities() {
                        let selected = self.directory.city() == Some(city.as_str());
                        if ui.selectable_label(selected, city).clicked() {
                            chosen_city = Some(city.clone());
                        }
                    }
                });
        });
        if chosen_city.is_some() {
            self.directory.select_city(chosen_city);
        }

        let mut category = None;
        ui.horizontal(|ui| {
            for option in [ContactCategory::Helplines, ContactCategory::Doctors] {
                if ui.button(option.label()).clicked() {
                    category = Some(option);
                }
            }
        });
        if let Some(category) = category {
            if let Some(request) = self.directory.request_contacts(category) {
                self.dispatcher.load_contacts(request);
            }
        }

        show_output(ui, self.directory.contacts(), &self.theme);
    }

    fn render_university(&mut self, ui: &mut egui::Ui) {
        ui.heading("University Resources");

        let mut lookup = false;
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.directory.university_query)
                    .desired_width(ui.available_width() - 70.0)
                    .hint_text("University name"),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                lookup = true;
            }
            lookup |= ui.button("Search").clicked();
        });
        if lookup {
            if let Some(name) = self.directory.request_university() {
                self.dispatcher.lookup_university(name);
            }
        }

        show_output(ui, self.directory.university(), &self.theme);
    }

    fn render_right_panel(&mut self, ctx: &egui::Context) {
        let Some(panel) = self.chat.panel() else {
            return;
        };

        egui::SidePanel::right("suggestions_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                show_suggestions(ui, panel, &self.theme);
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 190.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.chat.transcript().is_empty() {
                        ui.label(
                            RichText::new("Share what's on your mind. Type or use the mic.")
                                .color(self.theme.text_muted),
                        );
                    }
                    for message in self.chat.transcript().messages() {
                        show_message(ui, message, &self.theme);
                    }

                    if let Some(live) = self.voice.live_transcript() {
                        ui.label(RichText::new(live).italics().color(self.theme.text_muted));
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(entry);
                            }
                        });
                });

            ui.separator();
            self.render_composer(ui);
        });
    }

    fn render_composer(&mut self, ui: &mut egui::Ui) {
        let recording = self.voice.is_recording();
        let hint = match self.voice.mode() {
            Some(VoiceMode::Recognition) => "Listening...",
            Some(VoiceMode::Recording) => "Recording... press Stop to send",
            None => "Type a message...",
        };

        let mut send_now = false;
        let mut toggle_mic = false;
        let mut stop_waiting = false;
        self.theme.composer_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.input_buffer)
                        .desired_width(ui.available_width() - 190.0)
                        .hint_text(hint),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    send_now = true;
                }

                send_now |= ui
                    .add_enabled(
                        !self.input_buffer.trim().is_empty(),
                        egui::Button::new("Send"),
                    )
                    .clicked();

                let mic_label = if recording { "Stop mic" } else { "Mic" };
                toggle_mic = ui.button(mic_label).clicked();

                if self.chat.is_waiting() {
                    stop_waiting = ui
                        .button("Stop")
                        .on_hover_text("Cancel pending replies")
                        .clicked();
                }
            });
        });

        if send_now {
            self.submit_input();
        }
        if toggle_mic {
            self.toggle_voice();
        }
        if stop_waiting {
            let cancelled = self.chat.cancel_pending();
            self.log_diagnostic(format!("cancelled {cancelled} pending request(s)"));
        }
    }
}

impl eframe::App for CalmMateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.style_dirty {
            self.theme.apply_visuals(ctx, &self.prefs);
            self.style_dirty = false;
        }

        self.drain_events(ctx);
        self.voice.poll();
        if self.voice.mode() == Some(VoiceMode::Recognition) {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_right_panel(ctx);
        self.render_center_panel(ctx);
    }
}

fn show_message(ui: &mut egui::Ui, message: &ChatMessage, theme: &Theme) {
    let layout = match message.sender {
        Sender::User => egui::Layout::right_to_left(egui::Align::TOP),
        Sender::Ai => egui::Layout::left_to_right(egui::Align::TOP),
    };
    let max_width = ui.available_width() * 0.75;

    ui.with_layout(layout, |ui| {
        let bubble = theme.bubble_frame(message.sender).show(ui, |ui| {
            ui.set_max_width(max_width);
            if message.is_placeholder() {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label(RichText::new("Thinking...").color(theme.text_muted));
                });
            } else {
                ui.label(&message.text);
            }
        });
        bubble
            .response
            .on_hover_text(format!("Sent at {}", message.timestamp));
    });
}

fn show_suggestions(ui: &mut egui::Ui, panel: &SuggestionsPanel, theme: &Theme) {
    let color = theme.severity_color(panel.severity);
    ui.heading(RichText::new(panel.heading()).color(color));
    ui.horizontal(|ui| {
        ui.label(RichText::new(panel.severity.as_str()).small().color(color));
        if ui
            .small_button("Copy as HTML")
            .on_hover_text("Copy the sanitized suggestions")
            .clicked()
        {
            ui.ctx().copy_text(panel.html.clone());
        }
    });
    ui.separator();

    if panel.severity.is_emergency() {
        theme.emergency_frame().show(ui, |ui| {
            ui.strong(
                "If you are in immediate danger, contact your local emergency services now.",
            );
        });
        ui.add_space(theme.spacing_8);
    }

    ScrollArea::vertical()
        .id_salt("suggestions_scroll")
        .show(ui, |ui| {
            theme.card_frame().show(ui, |ui| {
                show_markdown(ui, &panel.lines, theme);
            });
        });
}

fn show_output(ui: &mut egui::Ui, output: &Output, theme: &Theme) {
    match output {
        Output::Empty => {}
        Output::Loading => {
            ui.add(egui::Spinner::new());
        }
        Output::Message(text) => {
            ui.label(RichText::new(text).color(theme.text_muted));
        }
        Output::Markdown(lines) => {
            theme.card_frame().show(ui, |ui| show_markdown(ui, lines, theme));
        }
    }
}

/// Draws flattened markdown lines as wrapped rich text.
fn show_markdown(ui: &mut egui::Ui, lines: &[MarkdownLine], theme: &Theme) {
    for line in lines {
        if line.kind == LineKind::Rule {
            ui.separator();
            continue;
        }

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            if let LineKind::ListItem { depth, ordinal } = &line.kind {
                ui.add_space(*depth as f32 * 14.0);
                let marker = match ordinal {
                    Some(number) => format!("{number}. "),
                    None => "• ".to_string(),
                };
                ui.label(RichText::new(marker).color(theme.accent_primary));
            }
            for span in &line.spans {
                ui.label(span_text(span, &line.kind));
            }
        });
    }
}

fn span_text(span: &Span, kind: &LineKind) -> RichText {
    let mut text = RichText::new(&span.text);
    if let LineKind::Heading(level) = kind {
        text = if *level <= 2 { text.heading() } else { text.strong() };
    }
    if span.bold {
        text = text.strong();
    }
    if span.italic {
        text = text.italics();
    }
    if span.code || *kind == LineKind::Code {
        text = text.code();
    }
    text
}
