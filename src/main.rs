#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use notegrid::{
    config::DEFAULT_CONFIG_FILE, AudioOutput, Config, Instrument, MidiOutputDevice, Point,
    SampleLibrary, Session, SystemClock,
};

#[cfg(feature = "gui")]
fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = Config::load_or_default(std::path::Path::new(&config_path));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_title("NOTEGRID"),
        ..Default::default()
    };

    eframe::run_native(
        "NOTEGRID",
        options,
        Box::new(move |_cc| Ok(Box::new(NoteGridApp::new(config)))),
    )
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
type Player = (AudioOutput, MidiOutputDevice);

#[cfg(feature = "gui")]
struct NoteGridApp {
    session: Session<Player, SystemClock>,
    instruments: Vec<Instrument>,

    // UI state
    yonabuki: bool,
    nirobuki: bool,
    available_midi_ports: Vec<String>,
    selected_port: Option<usize>,
    viewport: egui::Vec2,
}

#[cfg(feature = "gui")]
impl NoteGridApp {
    fn new(config: Config) -> Self {
        let library =
            SampleLibrary::new(config.sample_root.clone(), config.sample_extension.as_str());
        let player = (AudioOutput::new(library), MidiOutputDevice::new());

        Self {
            session: Session::from_config(&config, player, SystemClock::new()),
            instruments: config.instruments(),
            yonabuki: false,
            nirobuki: false,
            available_midi_ports: MidiOutputDevice::available_ports(),
            selected_port: None,
            viewport: egui::Vec2::ZERO,
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Instrument:");
            let mut instrument = self.session.instrument().clone();
            for choice in &self.instruments {
                ui.radio_value(&mut instrument, choice.clone(), choice.id());
            }
            self.session.set_instrument(instrument);

            ui.add_space(20.0);

            if ui.checkbox(&mut self.yonabuki, "Yonabuki (no F, B)").changed() {
                self.session.set_yonabuki(self.yonabuki);
            }
            if ui.checkbox(&mut self.nirobuki, "Nirobuki (no D, A)").changed() {
                self.session.set_nirobuki(self.nirobuki);
            }

            ui.add_space(20.0);

            if ui.button("▶ Play").clicked() {
                self.session.play();
            }
            if ui.button("⟲ Reset").clicked() {
                self.session.reset();
            }
        });

        // MIDI Port Selection
        let mut selected_port_changed = None;
        ui.horizontal(|ui| {
            ui.label("MIDI Output:");
            if self.available_midi_ports.is_empty() {
                ui.label("No MIDI ports available");
            } else {
                egui::ComboBox::from_label("")
                    .selected_text(
                        self.selected_port
                            .map(|i| self.available_midi_ports[i].as_str())
                            .unwrap_or("Select port..."),
                    )
                    .show_ui(ui, |ui| {
                        for (i, port_name) in self.available_midi_ports.iter().enumerate() {
                            if ui
                                .selectable_label(self.selected_port == Some(i), port_name)
                                .clicked()
                            {
                                selected_port_changed = Some(i);
                            }
                        }
                    });
            }
        });

        if let Some(port_idx) = selected_port_changed {
            match self.session.player_mut().1.connect(port_idx) {
                Ok(()) => self.selected_port = Some(port_idx),
                Err(err) => log::warn!("{}", err),
            }
        }
    }

    fn note_columns(&mut self, ui: &mut egui::Ui) {
        let mut clicked = None;

        ui.horizontal(|ui| {
            let grid = self.session.grid();
            for column in 0..grid.columns() {
                ui.vertical(|ui| {
                    // Highest pitch on top
                    for button in grid.column(column).iter().rev() {
                        let fill = if button.is_playing() {
                            egui::Color32::from_rgb(100, 200, 100)
                        } else if button.is_selected() {
                            egui::Color32::from_rgb(60, 60, 200)
                        } else if button.is_disabled() {
                            egui::Color32::from_rgb(25, 25, 25)
                        } else {
                            egui::Color32::from_rgb(60, 60, 60)
                        };

                        let text_color = if button.is_disabled() {
                            egui::Color32::DARK_GRAY
                        } else {
                            egui::Color32::WHITE
                        };

                        let response = ui.add(
                            egui::Button::new(
                                egui::RichText::new(button.pitch().label()).color(text_color),
                            )
                            .min_size(egui::vec2(64.0, 48.0))
                            .fill(fill),
                        );

                        if response.clicked() {
                            let center = response.rect.center();
                            let center = Point::new(center.x, center.y);
                            clicked = Some((column, button.pitch(), center));
                        }
                    }
                });
            }
        });

        if let Some((column, pitch, center)) = clicked {
            self.session.click_note(column, pitch, center);
        }
    }

    fn paint_lines(&self, ctx: &egui::Context) {
        let canvas = self.session.canvas();
        let style = canvas.style();
        let [r, g, b] = style.color;
        let stroke = egui::Stroke::new(style.width, egui::Color32::from_rgb(r, g, b));

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("note-lines"),
        ));
        let clip = egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(canvas.width(), canvas.height()),
        );
        let painter = painter.with_clip_rect(clip);

        for segment in canvas.segments() {
            painter.line_segment(
                [
                    egui::pos2(segment.from.x, segment.from.y),
                    egui::pos2(segment.to.x, segment.to.y),
                ],
                stroke,
            );
        }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for NoteGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let viewport = ctx.screen_rect().size();
        if viewport != self.viewport {
            self.viewport = viewport;
            self.session.resize(viewport.x, viewport.y);
        }

        self.session.tick();
        if let Some(wait) = self.session.time_to_next_step() {
            ctx.request_repaint_after(wait);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("NOTEGRID");
            ui.add_space(10.0);

            self.controls(ui);

            ui.add_space(20.0);

            self.note_columns(ui);

            // Info
            ui.separator();
            ui.label("Pick one note per column, then press Play");
            if !self.session.player().0.has_device() {
                ui.colored_label(
                    egui::Color32::YELLOW,
                    "⚠ No audio device - playback is silent",
                );
            }
        });

        self.paint_lines(ctx);
    }
}
