/// Fitness of one trial from its per-step Lyapunov trace. Lower is better.
///
/// `0.4·mean + 0.3·settle/len + 0.2·max + 0.1·mean(last window)`, where
/// `settle` is the first index from which V stays under `threshold` for
/// `window` consecutive steps (`len` if it never does). An empty or NaN trace
/// scores infinity.
pub fn score_trace(trace: &[f64], threshold: f64, window: usize) -> f64 {
    if trace.is_empty() {
        return f64::INFINITY;
    }
    let len = trace.len() as f64;

    let mean = trace.iter().sum::<f64>() / len;
    let max = trace.iter().copied().fold(0.0_f64, f64::max);
    let tail = &trace[trace.len().saturating_sub(window)..];
    let tail_mean = tail.iter().sum::<f64>() / tail.len() as f64;
    let settle = settling_index(trace, threshold, window) as f64 / len;

    let score = 0.4 * mean + 0.3 * settle + 0.2 * max + 0.1 * tail_mean;
    if score.is_nan() {
        f64::INFINITY
    } else {
        score
    }
}

/// First index `i` with `trace[i..i + window]` entirely below `threshold`.
pub fn settling_index(trace: &[f64], threshold: f64, window: usize) -> usize {
    let window = window.max(1);
    let mut run = 0;
    for (i, v) in trace.iter().enumerate() {
        if *v < threshold {
            run += 1;
            if run == window {
                return i + 1 - window;
            }
        } else {
            run = 0;
        }
    }
    trace.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_index_finds_first_quiet_run() {
        let mut trace = vec![1.0; 10];
        trace.extend(vec![0.01; 5]);
        trace.push(1.0);
        trace.extend(vec![0.01; 120]);
        assert_eq!(settling_index(&trace, 0.1, 100), 16);
        assert_eq!(settling_index(&trace, 0.1, 5), 10);
        assert_eq!(settling_index(&[1.0; 50], 0.1, 10), 50);
    }

    #[test]
    fn quiet_trace_scores_near_zero() {
        let s = score_trace(&[0.0; 600], 0.1, 100);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn worse_trace_scores_higher() {
        let good: Vec<f64> = (0..600).map(|i| 3.0 * (-(i as f64) / 30.0).exp()).collect();
        let bad: Vec<f64> = (0..600).map(|i| 3.0 * (-(i as f64) / 300.0).exp()).collect();
        let (g, b) = (score_trace(&good, 0.1, 100), score_trace(&bad, 0.1, 100));
        assert!(g >= 0.0 && g < b, "good {} bad {}", g, b);
    }

    #[test]
    fn degenerate_traces_are_infinite() {
        assert_eq!(score_trace(&[], 0.1, 100), f64::INFINITY);
        assert_eq!(score_trace(&[0.0, f64::NAN], 0.1, 100), f64::INFINITY);
    }
}
