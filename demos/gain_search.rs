use drone_sim::tuning::{GainSearch, SearchConfig};
use drone_sim::Settings;

fn main() {
    let settings = Settings::default();
    let mut sim = settings.build_loop();

    let config = SearchConfig { trials: 30, seed: Some(2024), ..SearchConfig::default() };
    let mut search = match GainSearch::new(config) {
        Ok(search) => search,
        Err(e) => {
            eprintln!("bad search settings: {}", e);
            return;
        }
    };

    println!("=== Gain search: {} trials ===\n", config.trials);
    let outcome = match search.run(&mut sim, |r| {
        println!("  trial {:>2}: score {:.4}", r.iteration, r.score);
    }) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("search failed: {}", e);
            return;
        }
    };

    let g = outcome.best_gains;
    println!();
    println!("Best score: {:.4}", outcome.best_score);
    println!("  position kp={:.3} kd={:.3} ki={:.3}", g.kp_pos, g.kd_pos, g.ki_pos);
    println!("  rotation kp={:.3} kd={:.3} ki={:.3}", g.kp_rot, g.kd_rot, g.ki_rot);
    println!("Controller now flies with: {:?}", sim.controller().gains());
}
