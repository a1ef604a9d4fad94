/// Rounds `value` to `places` decimal places for display. Session minute
/// columns show 4 places.
pub fn round(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
