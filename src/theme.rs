use crate::chat::{Sender, Severity};
use crate::settings::Preferences;
use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub user_bubble: Color32,
    pub ai_bubble: Color32,
    pub severity_low: Color32,
    pub severity_medium: Color32,
    pub severity_high: Color32,
    pub severity_unknown: Color32,
    pub emergency_fill: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_10: u8,
    pub radius_12: u8,
    pub animate: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x0F, 0x0F, 0x23),
            surface_1: Color32::from_rgb(0x16, 0x16, 0x30),
            surface_2: Color32::from_rgb(0x1E, 0x1E, 0x3E),
            surface_3: Color32::from_rgb(0x2A, 0x2A, 0x52),
            accent_primary: Color32::from_rgb(0x8B, 0x5C, 0xF6),
            accent_muted: Color32::from_rgb(0x6D, 0x4A, 0xC8),
            user_bubble: Color32::from_rgb(0x4A, 0x4A, 0x6E),
            ai_bubble: Color32::from_rgb(0x1E, 0x1E, 0x3E),
            severity_low: Color32::from_rgb(0x22, 0xC5, 0x5E),
            severity_medium: Color32::from_rgb(0xF5, 0x9E, 0x0B),
            severity_high: Color32::from_rgb(0xEF, 0x44, 0x44),
            severity_unknown: Color32::from_rgb(0x8B, 0x94, 0x9E),
            emergency_fill: Color32::from_rgb(0x7F, 0x1D, 0x1D),
            text_primary: Color32::from_rgb(0xE6, 0xE6, 0xF0),
            text_muted: Color32::from_rgb(0x9C, 0x9C, 0xB8),
            border_subtle: Color32::from_rgba_premultiplied(255, 255, 255, 13),
            spacing_8: Self::P8,
            spacing_12: Self::P12,
            radius_10: 10,
            radius_12: Self::R12,
            animate: true,
        }
    }
}

impl Theme {
    pub const R12: u8 = 12;
    pub const P8: f32 = 8.0;
    pub const P12: f32 = 12.0;

    /// Calm mode: muted, low-contrast palette and no animation.
    pub fn calm() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x1B, 0x24, 0x26),
            surface_1: Color32::from_rgb(0x22, 0x2D, 0x2F),
            surface_2: Color32::from_rgb(0x2B, 0x38, 0x3A),
            surface_3: Color32::from_rgb(0x35, 0x44, 0x46),
            accent_primary: Color32::from_rgb(0x7F, 0xB5, 0xA8),
            accent_muted: Color32::from_rgb(0x5E, 0x8F, 0x84),
            user_bubble: Color32::from_rgb(0x3A, 0x4E, 0x4B),
            ai_bubble: Color32::from_rgb(0x2B, 0x38, 0x3A),
            severity_low: Color32::from_rgb(0x8F, 0xC0, 0x9A),
            severity_medium: Color32::from_rgb(0xD8, 0xB9, 0x7A),
            severity_high: Color32::from_rgb(0xD9, 0x8C, 0x8C),
            severity_unknown: Color32::from_rgb(0xA3, 0xAD, 0xAE),
            emergency_fill: Color32::from_rgb(0x5A, 0x33, 0x33),
            text_primary: Color32::from_rgb(0xDD, 0xE5, 0xE3),
            text_muted: Color32::from_rgb(0x9A, 0xA8, 0xA6),
            animate: false,
            ..Self::default()
        }
    }

    pub fn for_preferences(prefs: &Preferences) -> Self {
        if prefs.calm_mode {
            Self::calm()
        } else {
            Self::default()
        }
    }

    pub fn severity_color(&self, severity: Severity) -> Color32 {
        match severity {
            Severity::Low => self.severity_low,
            Severity::Medium => self.severity_medium,
            Severity::High => self.severity_high,
            Severity::Unknown => self.severity_unknown,
        }
    }

    pub fn apply_visuals(&self, ctx: &egui::Context, prefs: &Preferences) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.extreme_bg_color = self.surface_0;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.fg_stroke.color = self.text_primary;
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.weak_bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.weak_bg_fill = self.surface_2;
        visuals.widgets.inactive.fg_stroke.color = self.text_primary;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.weak_bg_fill = self.surface_3;
        visuals.widgets.hovered.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.fg_stroke.color = self.text_primary;
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.widgets.active.fg_stroke.color = self.text_primary;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_fill = self.surface_1;
        visuals.window_stroke = Stroke::NONE;
        visuals.window_corner_radius = CornerRadius::same(self.radius_10);

        let scale = prefs.font_scale();
        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.animation_time = if self.animate { 1.0 / 12.0 } else { 0.0 };
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style
            .text_styles
            .insert(TextStyle::Heading, FontId::proportional(17.0 * scale));
        style
            .text_styles
            .insert(TextStyle::Body, FontId::proportional(prefs.font_size));
        style
            .text_styles
            .insert(TextStyle::Button, FontId::proportional(prefs.font_size));
        style
            .text_styles
            .insert(TextStyle::Monospace, FontId::monospace(13.0 * scale));
        style
            .text_styles
            .insert(TextStyle::Small, FontId::proportional(12.0 * scale));
        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }

    pub fn bubble_frame(&self, sender: Sender) -> Frame {
        let fill = match sender {
            Sender::User => self.user_bubble,
            Sender::Ai => self.ai_bubble,
        };
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
    }

    pub fn emergency_frame(&self) -> Frame {
        Frame::new()
            .fill(self.emergency_fill)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_10))
            .stroke(Stroke::new(1.0, self.severity_high))
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, 10))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::Theme;
    use crate::chat::Severity;
    use crate::settings::Preferences;

    #[test]
    fn every_severity_has_a_distinct_color() {
        let theme = Theme::default();
        let colors = [
            theme.severity_color(Severity::Low),
            theme.severity_color(Severity::Medium),
            theme.severity_color(Severity::High),
            theme.severity_color(Severity::Unknown),
        ];
        for (i, left) in colors.iter().enumerate() {
            for right in &colors[i + 1..] {
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn calm_mode_disables_animation() {
        let prefs = Preferences {
            calm_mode: true,
            ..Preferences::default()
        };
        assert!(!Theme::for_preferences(&prefs).animate);
        assert!(Theme::for_preferences(&Preferences::default()).animate);
    }
}
