use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::config::{Config, TextEncoding};
use crate::data_provider::DataProviderUi;
use crate::generator::SampleGenerator;
use crate::pose_file::PoseFileReader;
use crate::sample::SensorConversion;
use crate::telemetry::{PollOutcome, PollState, PollTask, TelemetryState};

pub struct FileDataProvider {
    state: Arc<TelemetryState>,
    path: String,
    encoding: TextEncoding,
    conversion: SensorConversion,
    interval: Duration,
    skip_repeats: bool,
    generator_fields: usize,
    task: Option<PollTask>,
}

impl FileDataProvider {
    pub fn new(config: &Config, state: Arc<TelemetryState>) -> Box<Self> {
        Box::new(Self {
            state,
            path: config.source.display().to_string(),
            encoding: config.encoding,
            conversion: config.conversion,
            interval: config.poll_interval,
            skip_repeats: config.skip_repeats,
            generator_fields: config.generator_fields,
            task: None,
        })
    }

    pub fn source(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(PollTask::is_running)
    }

    pub fn open(&mut self) {
        self.close();

        let reader = PoseFileReader::new(self.source(), self.encoding, self.conversion);
        self.task = Some(PollTask::spawn(
            reader,
            self.state.clone(),
            self.interval,
            self.skip_repeats,
        ));
    }

    pub fn close(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.stop();
        }
    }

    fn generate_test_data(&self) {
        let generator = SampleGenerator::new(self.generator_fields, self.encoding);
        if let Err(err) = generator.write_to(&self.source()) {
            log::error!("cannot write test data to '{}': {}", self.path, err);
        }
    }

    fn status_text(&self) -> String {
        let status = self.state.status();
        let (len, capacity) = self.state.history_fill();
        let state = match (status.state, status.last_outcome) {
            (PollState::Stopped, _) => "stopped",
            (PollState::Polling, _) => "polling",
            (PollState::Idle, Some(PollOutcome::Updated { .. })) => "updated",
            (PollState::Idle, Some(PollOutcome::NoChange)) => "no change",
            (PollState::Idle, None) => "idle",
        };
        format!(
            "{state}\npolls: {}  updates: {}\ntrail: {len}/{capacity}",
            status.polls, status.updates
        )
    }
}

impl DataProviderUi for FileDataProvider {
    fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pose File");

        if self.is_open() {
            ui.label(format!("'{}' ({})", self.path, self.encoding.name()));
        } else {
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut self.path);
                if ui.button("🗁").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("pose", &["txt"])
                        .pick_file()
                    {
                        self.path = path.display().to_string();
                    }
                }
            });

            egui::ComboBox::new("encoding", "Encoding")
                .selected_text(self.encoding.name())
                .show_ui(ui, |ui| {
                    for encoding in TextEncoding::ALL {
                        ui.selectable_value(&mut self.encoding, encoding, encoding.name());
                    }
                });
        }

        if self.is_open() {
            if ui.button("Close").clicked() {
                self.close();
            }
        } else if ui.button("Open").clicked() {
            self.open();
        }

        ui.label(self.status_text());

        if ui.button("Generate Test Data").clicked() {
            self.generate_test_data();
        }
    }
}

impl Drop for FileDataProvider {
    fn drop(&mut self) {
        self.close();
    }
}
