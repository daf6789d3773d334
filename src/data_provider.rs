use eframe::egui;

pub trait DataProviderUi {
    fn show(&mut self, ui: &mut egui::Ui);
}
