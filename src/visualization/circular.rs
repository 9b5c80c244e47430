use std::f32::consts::PI;

/// Number of spokes around the circle; also the spectrum length the view requests.
pub const CIRCLE_BINS: usize = 180;

/// Radius of a spoke whose spectrum value is zero.
pub const BASE_RADIUS: f32 = 0.5;

/// Closed polygon around the origin: spoke `i` sits at angle `i * 2π / n` with radius
/// `BASE_RADIUS + spectrum[i]`, and the first point is repeated at the end.
pub fn polygon(spectrum: &[f32]) -> Vec<[f32; 2]> {
    let n = spectrum.len();
    if n == 0 {
        return Vec::new();
    }
    let mut points: Vec<[f32; 2]> = spectrum
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let angle = i as f32 * 2.0 * PI / n as f32;
            let radius = BASE_RADIUS + value;
            [radius * angle.cos(), radius * angle.sin()]
        })
        .collect();
    points.push(points[0]);
    points
}
