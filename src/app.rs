//! Correction workbench window: egui/eframe application.
//!
//! # Architecture
//!
//! [`LekuTesterApp`] is the top-level [`eframe::App`].  Each frame it takes a
//! [`View`] snapshot of the [`SharedState`](crate::workbench::SharedState)
//! (lock held only while cloning), renders it, and collects the user's
//! intents as [`WorkbenchCommand`]s:
//!
//! * local commands (draw, select, edit) are applied on the UI thread;
//! * save is planned on the UI thread and marked busy at the click;
//! * remote commands go to [`Workbench::run`] through `command_tx`.
//!
//! # Layout
//!
//! | Area         | Content                                                   |
//! |--------------|-----------------------------------------------------------|
//! | top bar      | 抽一句 button, corpus size                                 |
//! | central      | 漢字 / 羅馬字 columns: sentence, 播放 buttons, draft editor  |
//! | right panel  | 修正紀錄 list with select and delete                        |
//! | bottom bar   | latest notice                                              |

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::corpus::{SentenceField, SentencePair};
use crate::session::{Action, BusyTracker};
use crate::store::{CorrectionRecord, RecordId};
use crate::synthesis::Backend;
use crate::workbench::{Notice, Workbench, WorkbenchCommand};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const DIM: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);
const OK_GREEN: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const ERROR_ORANGE: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

// ---------------------------------------------------------------------------
// View: per-frame snapshot
// ---------------------------------------------------------------------------

/// What one frame renders, copied out of the shared state.
struct View {
    active: Option<SentencePair>,
    drafts: [String; 2],
    editing: Option<RecordId>,
    can_save: bool,
    history: Vec<CorrectionRecord>,
    busy: BusyTracker,
    notice: Option<Notice>,
    corpus_len: usize,
}

impl View {
    fn draft(&self, field: SentenceField) -> &str {
        match field {
            SentenceField::Logographic => &self.drafts[0],
            SentenceField::Romanized => &self.drafts[1],
        }
    }
}

// ---------------------------------------------------------------------------
// LekuTesterApp
// ---------------------------------------------------------------------------

/// eframe application: the TTS correction workbench.
pub struct LekuTesterApp {
    workbench: Workbench,
    /// Remote commands for the runtime-side command loop.
    command_tx: mpsc::Sender<WorkbenchCommand>,
    /// Backends offered as play buttons, in display order.
    backends: Vec<Backend>,
    /// History record awaiting delete confirmation.
    pending_delete: Option<CorrectionRecord>,
}

impl LekuTesterApp {
    pub fn new(
        workbench: Workbench,
        command_tx: mpsc::Sender<WorkbenchCommand>,
        backends: Vec<Backend>,
    ) -> Self {
        Self {
            workbench,
            command_tx,
            backends,
            pending_delete: None,
        }
    }

    fn snapshot(&self) -> View {
        let st = self.workbench.state().lock().unwrap();
        View {
            active: st.session.active().cloned(),
            drafts: [
                st.session.draft(SentenceField::Logographic).to_string(),
                st.session.draft(SentenceField::Romanized).to_string(),
            ],
            editing: st.session.editing().cloned(),
            can_save: st.session.active().is_some() && st.session.has_draft(),
            history: st.history.clone(),
            busy: st.busy.clone(),
            notice: st.notice.clone(),
            corpus_len: st.corpus_len,
        }
    }

    fn dispatch(&self, command: WorkbenchCommand) {
        if let Some(remote) = self.workbench.apply_local(command) {
            // A rejected command is dropped here, releasing any busy mark it holds.
            if let Err(e) = self.command_tx.try_send(remote) {
                log::warn!("ui: cannot queue command: {e}");
            }
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_top_bar(&self, ui: &mut egui::Ui, view: &View, out: &mut Vec<WorkbenchCommand>) {
        ui.horizontal(|ui| {
            ui.heading("台語語音合成測試");
            ui.add_space(12.0);
            let draw = ui.add_enabled(
                view.corpus_len > 0,
                egui::Button::new(egui::RichText::new("抽一句").size(15.0)),
            );
            if draw.clicked() {
                out.push(WorkbenchCommand::Draw);
            }
            ui.label(
                egui::RichText::new(format!("共 {} 句", view.corpus_len))
                    .color(DIM)
                    .size(11.0),
            );
        });
    }

    fn draw_columns(&self, ui: &mut egui::Ui, view: &View, out: &mut Vec<WorkbenchCommand>) {
        ui.columns(2, |cols| {
            for (col, field) in cols.iter_mut().zip(SentenceField::ALL) {
                self.draw_field(col, view, field, out);
            }
        });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            let saving = view.busy.is_busy(Action::Save);
            let label = if saving { "載入中..." } else { "儲存修正" };
            if ui
                .add_enabled(view.can_save && !saving, egui::Button::new(label))
                .clicked()
            {
                out.push(WorkbenchCommand::Save);
            }
            if let Some(id) = &view.editing {
                ui.label(
                    egui::RichText::new(format!("編輯紀錄 #{id}"))
                        .color(ACCENT)
                        .size(11.0),
                );
            }
        });
    }

    fn draw_field(
        &self,
        ui: &mut egui::Ui,
        view: &View,
        field: SentenceField,
        out: &mut Vec<WorkbenchCommand>,
    ) {
        ui.label(egui::RichText::new(field.label()).strong().size(14.0));

        let sentence = view
            .active
            .as_ref()
            .map(|pair| pair.form(field).to_string())
            .unwrap_or_else(|| "—".into());
        ui.label(egui::RichText::new(sentence).size(20.0));

        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            for &backend in &self.backends {
                let action = Action::Play { field, backend };
                let busy = view.busy.is_busy(action);
                let label = if busy {
                    "載入中...".to_string()
                } else {
                    format!("播放 ({})", backend.label())
                };
                if ui
                    .add_enabled(view.active.is_some() && !busy, egui::Button::new(label))
                    .clicked()
                {
                    out.push(WorkbenchCommand::Play { field, backend });
                }
            }
        });

        ui.add_space(4.0);
        let mut draft = view.draft(field).to_string();
        let hint = format!("{}修正", field.label());
        let editor = ui.add(
            egui::TextEdit::multiline(&mut draft)
                .hint_text(hint)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if editor.changed() {
            out.push(WorkbenchCommand::EditDraft { field, text: draft });
        }
    }

    fn draw_history(&mut self, ui: &mut egui::Ui, view: &View, out: &mut Vec<WorkbenchCommand>) {
        ui.horizontal(|ui| {
            ui.heading("修正紀錄");
            let refreshing = view.busy.is_busy(Action::RefreshHistory);
            if ui
                .add_enabled(!refreshing, egui::Button::new("重新整理").small())
                .clicked()
            {
                out.push(WorkbenchCommand::RefreshHistory);
            }
        });
        ui.separator();

        if view.history.is_empty() {
            ui.label(egui::RichText::new("尚無紀錄").color(DIM));
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for record in &view.history {
                let selected = view.editing.as_ref() == Some(&record.id);
                let frame = egui::Frame::new()
                    .stroke(egui::Stroke::new(
                        1.0,
                        if selected { ACCENT } else { egui::Color32::from_gray(70) },
                    ))
                    .corner_radius(egui::CornerRadius::same(6))
                    .inner_margin(egui::Margin::same(6));

                frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(format!("原句：{} / {}", record.original_hanji, record.original_lomaji));
                    if let Some(hanji) = record.hanji() {
                        ui.label(egui::RichText::new(format!("漢字修正：{hanji}")).color(OK_GREEN));
                    }
                    if let Some(lomaji) = record.lomaji() {
                        ui.label(
                            egui::RichText::new(format!("羅馬字修正：{lomaji}")).color(OK_GREEN),
                        );
                    }
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(
                                record
                                    .created_at
                                    .with_timezone(&chrono::Local)
                                    .format("%Y-%m-%d %H:%M:%S")
                                    .to_string(),
                            )
                            .color(DIM)
                            .size(10.0),
                        );
                        if ui.small_button("編輯").clicked() {
                            out.push(WorkbenchCommand::SelectHistory(record.id.clone()));
                        }
                        if ui.small_button("刪除").clicked() {
                            self.pending_delete = Some(record.clone());
                        }
                    });
                });
                ui.add_space(4.0);
            }
        });
    }

    fn draw_delete_confirmation(
        &mut self,
        ctx: &egui::Context,
        view: &View,
        out: &mut Vec<WorkbenchCommand>,
    ) {
        let Some(record) = self.pending_delete.clone() else {
            return;
        };
        let deleting = view.busy.is_busy(Action::Delete);

        egui::Window::new("確認刪除")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("確定要刪除這筆修正紀錄嗎？");
                ui.label(
                    egui::RichText::new(format!(
                        "{} / {}",
                        record.original_hanji, record.original_lomaji
                    ))
                    .color(DIM),
                );
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!deleting, egui::Button::new("刪除"))
                        .clicked()
                    {
                        out.push(WorkbenchCommand::Delete(record.id.clone()));
                        self.pending_delete = None;
                    }
                    if ui.button("取消").clicked() {
                        self.pending_delete = None;
                    }
                });
            });
    }

    fn draw_notice(&self, ui: &mut egui::Ui, view: &View) {
        match &view.notice {
            Some(notice) => {
                let color = if notice.is_error() { ERROR_ORANGE } else { OK_GREEN };
                ui.label(egui::RichText::new(notice.message.as_str()).color(color));
            }
            None if view.active.is_none() => {
                ui.label(egui::RichText::new("請先抽選句子").color(DIM));
            }
            None => {
                ui.label("");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Put a CJK-capable font first in both families so 漢字 render.
pub fn install_cjk_font(ctx: &egui::Context, path: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(
        "cjk".to_owned(),
        Arc::new(egui::FontData::from_owned(bytes)),
    );
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    log::info!("ui: installed CJK font {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for LekuTesterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let view = self.snapshot();
        let mut commands = Vec::new();

        // Remote completions land in the shared state; poll faster while
        // something is in flight.
        let poll = if view.busy.any_busy() { 100 } else { 500 };
        ctx.request_repaint_after(Duration::from_millis(poll));

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.draw_top_bar(ui, &view, &mut commands);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("notice_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            self.draw_notice(ui, &view);
            ui.add_space(2.0);
        });

        egui::SidePanel::right("history")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                self.draw_history(ui, &view, &mut commands);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_columns(ui, &view, &mut commands);
        });

        self.draw_delete_confirmation(ctx, &view, &mut commands);

        for command in commands {
            self.dispatch(command);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("workbench window closing");
    }
}
