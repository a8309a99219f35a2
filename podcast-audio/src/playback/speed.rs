//! Playback speed domain
//!
//! The UI exposes a fixed set of multipliers through a cycling "next speed"
//! control. The engine itself accepts any positive finite rate.

/// Speed steps offered by the cycling control, ascending
pub const SPEED_STEPS: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

const STEP_EPSILON: f64 = 1e-6;

/// Next speed after `current`, wrapping to the slowest step.
///
/// Values between steps advance to the next larger step.
///
/// # Examples
///
/// ```
/// use podcast_audio::playback::next_speed;
///
/// assert_eq!(next_speed(1.0), 1.25);
/// assert_eq!(next_speed(2.0), 0.5);
/// assert_eq!(next_speed(1.1), 1.25);
/// ```
pub fn next_speed(current: f64) -> f64 {
    SPEED_STEPS
        .iter()
        .copied()
        .find(|step| *step > current + STEP_EPSILON)
        .unwrap_or(SPEED_STEPS[0])
}

/// True if `speed` is one of the offered steps
pub fn is_step(speed: f64) -> bool {
    SPEED_STEPS.iter().any(|step| (step - speed).abs() < STEP_EPSILON)
}

/// Label for the speed button, e.g. `1.25x`
pub fn speed_label(speed: f64) -> String {
    let trimmed = format!("{:.2}", speed);
    let trimmed = trimmed.trim_end_matches('0').trim_end_matches('.');
    format!("{}x", trimmed)
}
