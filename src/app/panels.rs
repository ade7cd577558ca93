use eframe::egui;

use crate::media::{MediaStream, TrackKind};

const PANEL_W: f32 = 320.0;
const PANEL_H: f32 = 240.0;

/// Fixed-size panel describing a stream, or a grey placeholder without one.
pub fn stream_panel(ui: &mut egui::Ui, title: &str, stream: Option<&MediaStream>, placeholder: &str) {
    ui.vertical(|ui| {
        ui.strong(title);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(PANEL_W, PANEL_H), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let fill = if stream.is_some_and(MediaStream::is_active) {
            egui::Color32::from_rgb(20, 28, 40)
        } else {
            egui::Color32::from_gray(40)
        };
        painter.rect_filled(rect, 6.0, fill);

        let text = match stream {
            Some(s) => describe(s),
            None => placeholder.to_owned(),
        };
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(14.0),
            egui::Color32::LIGHT_GRAY,
        );
    });
}

fn describe(stream: &MediaStream) -> String {
    let mut lines = vec![stream.id().to_owned()];
    for track in stream.tracks() {
        let icon = match track.kind() {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        };
        let live = if track.is_live() { "live" } else { "ended" };
        lines.push(format!("{icon}: {} ({live})", track.label()));
    }
    lines.join("\n")
}
