use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Color32};
use egui_modal::Modal;
use egui_plot::{Arrows, Legend, Line, PlotBounds, PlotPoint, PlotUi, Points, Text};

use crate::config::Config;
use crate::data_provider::DataProviderUi;
use crate::file_data_provider::FileDataProvider;
use crate::frame::{Frame, FrameAssembler, Renderer};
use crate::rays::{heading_vector, RaySide};
use crate::telemetry::TelemetryState;
use crate::viewport::ZoomDirection;

const HEADING_ARROW_LEN: f64 = 4.0;

pub fn init(config: Config, state: Arc<TelemetryState>) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Live Pose Plotter",
        options,
        Box::new(|_cc| Ok(Box::new(PoseViewerApp::new(config, state)))),
    )
}

pub struct PlotRenderer<'a> {
    plot_ui: &'a mut PlotUi,
    show_trail: bool,
}

impl Renderer for PlotRenderer<'_> {
    fn draw(&mut self, frame: &Frame) {
        let vp = frame.viewport;
        self.plot_ui.set_plot_bounds(PlotBounds::from_min_max(
            [vp.x_min, vp.y_min],
            [vp.x_max, vp.y_max],
        ));

        if self.show_trail && !frame.trail.is_empty() {
            let trail: Vec<[f64; 2]> = frame.trail.iter().map(|e| [e.pose.x, e.pose.y]).collect();
            self.plot_ui
                .line(Line::new(trail.clone()).color(Color32::LIGHT_BLUE).name("trail"));
            self.plot_ui.points(
                Points::new(trail)
                    .radius(2.0)
                    .color(Color32::LIGHT_BLUE)
                    .name("trail"),
            );
        }

        for ray in &frame.rays {
            let color = match ray.side {
                RaySide::Left => Color32::GREEN,
                RaySide::Right => Color32::YELLOW,
            };
            self.plot_ui.line(
                Line::new(vec![[ray.origin.x, ray.origin.y], [ray.end.x, ray.end.y]])
                    .color(color)
                    .name(ray.label()),
            );
        }

        if let Some(latest) = frame.latest {
            let pose = latest.pose;
            let heading = heading_vector(&pose) * HEADING_ARROW_LEN;
            self.plot_ui.arrows(
                Arrows::new(
                    vec![[pose.x, pose.y]],
                    vec![[pose.x + heading.x, pose.y + heading.y]],
                )
                .color(Color32::RED)
                .name("heading"),
            );
            self.plot_ui.points(
                Points::new(vec![[pose.x, pose.y]])
                    .radius(5.0)
                    .color(Color32::RED)
                    .name("latest"),
            );
            self.plot_ui.text(
                Text::new(PlotPoint::new(pose.x, pose.y), pose.label())
                    .anchor(egui::Align2::LEFT_BOTTOM),
            );
        }
    }
}

struct PoseViewerApp {
    state: Arc<TelemetryState>,
    provider: Box<FileDataProvider>,
    assembler: FrameAssembler,
    repaint_after: Duration,
    show_trail: bool,
}

impl PoseViewerApp {
    pub fn new(config: Config, state: Arc<TelemetryState>) -> Self {
        let mut provider = FileDataProvider::new(&config, state.clone());
        provider.open();

        Self {
            state,
            provider,
            assembler: FrameAssembler::new(),
            repaint_after: config.poll_interval,
            show_trail: true,
        }
    }

    fn latest_info(&self) -> String {
        let Some(latest) = self.state.latest() else {
            return "No sample received yet".to_string();
        };
        let distance = |d: Option<f64>| d.map_or("no object".to_string(), |d| format!("{d:.2} in"));

        let mut info = format!(
            "Sample #{}\nx: {:.2} in\ny: {:.2} in\nθ: {:.2}°",
            latest.seq, latest.pose.x, latest.pose.y, latest.pose.theta
        );
        if let Some(reading) = latest.reading {
            info.push_str(&format!(
                "\nleft: {}\nright: {}",
                distance(reading.left),
                distance(reading.right)
            ));
        }
        info
    }
}

impl eframe::App for PoseViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let modal_latest = Modal::new(ctx, "latest_pose");
        modal_latest.show(|ui| {
            let info = self.latest_info();
            modal_latest.title(ui, "Latest Pose");
            modal_latest.frame(ui, |ui| {
                modal_latest.body(ui, info.clone());
            });
            modal_latest.buttons(ui, |ui| {
                if modal_latest.caution_button(ui, "close").clicked() {
                    // After clicking, the modal is automatically closed
                };
                if ui.button("🗐 copy to clipboard").clicked() {
                    ui.output_mut(|p| p.copied_text = info);
                };
            });
        });

        egui::SidePanel::left("left_panel").show(ctx, |ui| {
            self.provider.show(ui);
            ui.separator();

            ui.heading("View");
            ui.label(format!("zoom: {:.2}x", 1.0 / self.state.viewport().scale));
            if ui.button("Reset view").clicked() {
                self.state.reset_view();
            }
            ui.toggle_value(&mut self.show_trail, "Trail");
            if ui.button("Latest pose…").clicked() {
                modal_latest.open();
            }
            ui.separator();
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let show_trail = self.show_trail;
            let (frame, _) = self.assembler.refresh(&self.state);

            let response = egui_plot::Plot::new("pose_plot")
                .allow_zoom(false)
                .allow_drag(false)
                .allow_scroll(false)
                .allow_boxed_zoom(false)
                .allow_double_click_reset(false)
                .x_axis_label("X (inches)")
                .y_axis_label("Y (inches)")
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    PlotRenderer {
                        plot_ui,
                        show_trail,
                    }
                    .draw(frame);
                });

            // scroll zooms around the data point under the cursor, drag pans
            if let Some(pos) = response.response.hover_pos() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    let anchor = response.transform.value_from_position(pos);
                    let direction = if scroll > 0.0 {
                        ZoomDirection::In
                    } else {
                        ZoomDirection::Out
                    };
                    self.state.apply_zoom(anchor.x, anchor.y, direction);
                }
            }

            let drag = response.response.drag_delta();
            if drag != egui::Vec2::ZERO {
                let [dx_per_px, dy_per_px] = response.transform.dvalue_dpos();
                self.state
                    .pan(-drag.x as f64 * dx_per_px, -drag.y as f64 * dy_per_px);
            }
        });

        ctx.request_repaint_after(self.repaint_after);
    }
}
