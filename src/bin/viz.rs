use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use drone_sim::sim::Sample;
use drone_sim::tuning::{best_so_far, GainSearch, SearchConfig, TrainingRecord};
use drone_sim::Settings;

fn main() -> eframe::Result {
    let settings = Settings::default();

    let mut sim = settings.build_loop();
    let records = match GainSearch::new(SearchConfig { trials: 20, seed: Some(1), ..settings.search }) {
        Ok(mut search) => search.run(&mut sim, |_| {}).map(|o| o.records).unwrap_or_default(),
        Err(_) => Vec::new(),
    };

    let [x, y, z] = settings.search.initial_position;
    sim.reset_to(nalgebra::Vector3::new(x, y, z));
    let samples = sim.run_for(10.0);

    let app = DroneViz { samples, records };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Quadrotor Simulator", options, Box::new(|_| Ok(Box::new(app))))
}

struct DroneViz {
    samples: Vec<Sample>,
    records: Vec<TrainingRecord>,
}

impl eframe::App for DroneViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading("Quadrotor flight with tuned gains");
            let peak = self.samples.iter().filter_map(|s| s.lyapunov).fold(0.0_f64, f64::max);
            let best = best_so_far(&self.records).last().copied().unwrap_or(f64::INFINITY);
            ui.label(format!(
                "Peak V: {:.3}  |  Final V: {:.4}  |  Trials: {}  |  Best score: {:.4}",
                peak,
                self.samples.last().and_then(|s| s.lyapunov).unwrap_or(0.0),
                self.records.len(),
                best,
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                // Position vs Time
                ui.vertical(|ui| {
                    ui.label("Position (m)");
                    Plot::new("position")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            for (axis, name) in ["x", "y", "z"].into_iter().enumerate() {
                                let points: PlotPoints = self.samples.iter()
                                    .map(|s| [s.time, s.state.position[axis]])
                                    .collect();
                                plot_ui.line(Line::new(name, points));
                            }
                        });
                });

                // Lyapunov value vs Time
                ui.vertical(|ui| {
                    ui.label("Lyapunov value V");
                    let points: PlotPoints = self.samples.iter()
                        .filter_map(|s| s.lyapunov.map(|v| [s.time, v]))
                        .collect();
                    Plot::new("lyapunov")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("V", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                // Motor commands vs Time
                ui.vertical(|ui| {
                    ui.label("Motor commands");
                    Plot::new("motors")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            for (i, name) in ["front", "right", "back", "left"].into_iter().enumerate() {
                                let points: PlotPoints = self.samples.iter()
                                    .map(|s| [s.time, s.state.motor_speeds[i]])
                                    .collect();
                                plot_ui.line(Line::new(name, points));
                            }
                        });
                });

                // Training score per trial
                ui.vertical(|ui| {
                    ui.label("Training score");
                    let scores: PlotPoints = self.records.iter()
                        .filter(|r| r.score.is_finite())
                        .map(|r| [r.iteration as f64, r.score])
                        .collect();
                    let best: PlotPoints = best_so_far(&self.records).into_iter()
                        .enumerate()
                        .filter(|(_, s)| s.is_finite())
                        .map(|(i, s)| [i as f64, s])
                        .collect();
                    Plot::new("training")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Trial")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("score", scores));
                            plot_ui.line(Line::new("best", best));
                        });
                });
            });
        });
    }
}
