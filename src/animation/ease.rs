/// Linear rise to 1 at `t = 0.5`, linear fall back to 0 at `t = 1`.
pub fn triangle(t: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    1.0 - (2.0 * t - 1.0).abs()
}

/// Quadratic up to 1 at `peak`, quadratic back to 0 at `t = 1`.
pub fn peak_ease(t: f64, peak: f64) -> f64 {
    let peak = peak.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    let t = t.clamp(0.0, 1.0);
    if t < peak {
        (t / peak).powi(2)
    } else {
        ((1.0 - t) / (1.0 - peak)).powi(2)
    }
}

/// Critically damped first-order lag: move `current` toward `target` at `rate` per second.
///
/// The step fraction is `1 - exp(-rate * dt)`, so it never overshoots regardless of `dt`.
pub fn approach(current: f64, target: f64, rate: f64, dt: f64) -> f64 {
    if !(rate > 0.0 && dt > 0.0) {
        return current;
    }
    current + (target - current) * (1.0 - (-rate * dt).exp())
}

/// Per-tick spring-back toward `target` by a fixed fraction.
pub fn relax(current: f64, target: f64, fraction: f64) -> f64 {
    current + (target - current) * fraction.clamp(0.0, 1.0)
}
