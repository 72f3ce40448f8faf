use eframe::egui;

use i2v_gif::shell::{GenerateOutcome, Shell};
use i2v_gif::{GenerationSettings, ImageToVideoPipeline};

use crate::native::{NativeDialogs, NativePicker};

const FIELD_WIDTH: f32 = 380.0;

pub struct I2vGifApp {
    shell: Shell<Box<dyn ImageToVideoPipeline>, NativeDialogs, NativePicker>,
    last_outcome: Option<GenerateOutcome>,
}

impl I2vGifApp {
    pub fn new(
        pipeline: Box<dyn ImageToVideoPipeline>,
        settings: GenerationSettings,
        dialogs: NativeDialogs,
        picker: NativePicker,
    ) -> Self {
        Self {
            shell: Shell::new(pipeline, settings, dialogs, picker),
            last_outcome: None,
        }
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("generation_form")
            .num_columns(3)
            .spacing([8.0, 8.0])
            .show(ui, |ui| {
                ui.label("Image Path:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.shell.form.image_path)
                        .desired_width(FIELD_WIDTH),
                );
                if ui.button("Browse").clicked() {
                    self.shell.browse_image();
                }
                ui.end_row();

                ui.label("Text Prompt:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.shell.form.prompt)
                        .desired_width(FIELD_WIDTH),
                );
                ui.end_row();

                ui.label("Negative Prompt:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.shell.form.negative_prompt)
                        .desired_width(FIELD_WIDTH),
                );
                ui.end_row();

                ui.label("Output Folder:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.shell.form.output_folder)
                        .desired_width(FIELD_WIDTH),
                );
                if ui.button("Browse").clicked() {
                    self.shell.browse_output_folder();
                }
                ui.end_row();
            });
    }

    fn render_generate_button(&mut self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        ui.vertical_centered(|ui| {
            let button = egui::Button::new("Generate Video").min_size(egui::vec2(200.0, 36.0));
            if ui.add(button).clicked() {
                // Runs on the UI thread; the window is unresponsive until it returns
                self.last_outcome = Some(self.shell.generate_video());
            }
        });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        match &self.last_outcome {
            Some(GenerateOutcome::Created(path)) => {
                ui.add_space(10.0);
                ui.label(format!("Last GIF: {}", path.display()));
            }
            Some(GenerateOutcome::Failed(message)) => {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::RED, message);
            }
            Some(GenerateOutcome::MissingInputs) | None => {}
        }
    }
}

impl eframe::App for I2vGifApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_form(ui);
            self.render_generate_button(ui);
            self.render_status(ui);
            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                ui.weak(format!(
                    "{} pipeline · {} steps · guidance {} · seed {}",
                    self.shell.pipeline().name(),
                    self.shell.settings().num_inference_steps,
                    self.shell.settings().guidance_scale,
                    self.shell.settings().seed
                ));
            });
        });
    }
}
