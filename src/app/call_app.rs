use std::{
    collections::VecDeque,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use eframe::{App, Frame, egui};

use super::panels::stream_panel;
use crate::{
    call::{CallStatus, CallUpdate, SessionStateMachine},
    log::logger::Logger,
};

const UI_LOG_CAP: usize = 256;
const REPAINT_EVERY: Duration = Duration::from_millis(100);

/// Start/End call window. Owns the state machine and pumps it every frame.
pub struct CallApp {
    machine: SessionStateMachine,
    updates: Receiver<CallUpdate>,
    logger: Option<Logger>,
    ui_logs: VecDeque<String>,
}

impl CallApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        mut machine: SessionStateMachine,
        logger: Option<Logger>,
    ) -> Self {
        let updates = machine.subscribe();
        Self {
            machine,
            updates,
            logger,
            ui_logs: VecDeque::with_capacity(UI_LOG_CAP),
        }
    }

    fn push_log<T: Into<String>>(&mut self, s: T) {
        if self.ui_logs.len() == UI_LOG_CAP {
            self.ui_logs.pop_front();
        }
        self.ui_logs.push_back(s.into());
    }

    fn drain_updates(&mut self) {
        loop {
            match self.updates.try_recv() {
                Ok(CallUpdate::StateChanged { state, status }) => {
                    self.push_log(format!("[STATE] {state} ({status})"));
                }
                Ok(CallUpdate::Error(msg)) => self.push_log(format!("[ERROR] {msg}")),
                Ok(CallUpdate::LocalStream(Some(s))) => {
                    self.push_log(format!("[MEDIA] local stream {}", s.id()));
                }
                Ok(CallUpdate::RemoteStream(Some(s))) => {
                    self.push_log(format!("[MEDIA] remote stream {}", s.id()));
                }
                Ok(CallUpdate::LocalStream(None) | CallUpdate::RemoteStream(None)) => {}
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        let mut tail = Vec::new();
        if let Some(logger) = &self.logger {
            while let Some(line) = logger.try_recv_ui() {
                tail.push(line);
            }
        }
        for line in tail {
            self.push_log(line);
        }
    }
}

impl App for CallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.machine.poll();
        self.drain_updates();

        let status = self.machine.status();
        let in_call = !self.machine.state().is_idle();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("RustyCall");
                ui.add_space(10.);
            });

            if let Some(err) = self.machine.error() {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), err);
                ui.separator();
            }

            ui.horizontal(|ui| {
                let start_label = if status == CallStatus::Connecting {
                    "Connecting..."
                } else {
                    "Start Call"
                };
                if ui
                    .add_enabled(!in_call, egui::Button::new(start_label))
                    .clicked()
                {
                    let _ = self.machine.start_call();
                }
                if ui.add_enabled(in_call, egui::Button::new("End Call")).clicked() {
                    self.machine.end_call();
                }
                ui.label(format!("Status: {status}"));
            });

            ui.separator();
            ui.horizontal(|ui| {
                stream_panel(ui, "You", self.machine.local_stream(), "Camera off");
                ui.separator();
                stream_panel(ui, "Peer", self.machine.remote_stream(), "Waiting for peer...");
            });

            ui.separator();
            ui.label("Logs:");
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .max_height(180.0)
                .show(ui, |ui| {
                    for line in &self.ui_logs {
                        ui.monospace(line);
                    }
                });
        });

        ctx.request_repaint_after(REPAINT_EVERY);
    }
}
