/// Fraction of the previous height a bar keeps per update when the signal drops.
pub const BAR_DECAY: f32 = 0.7;

/// Peak-hold bars: rise instantly to a new value, fall by [`BAR_DECAY`] per update.
#[derive(Clone, Debug, Default)]
pub struct FrequencyBars {
    heights: Vec<f32>,
}

impl FrequencyBars {
    pub fn new(bar_count: usize) -> Self {
        Self {
            heights: vec![0.0; bar_count],
        }
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn update(&mut self, spectrum: &[f32]) -> Vec<f32> {
        if self.heights.len() != spectrum.len() {
            self.heights = vec![0.0; spectrum.len()];
        }
        for (height, &value) in self.heights.iter_mut().zip(spectrum) {
            *height = value.max(*height * BAR_DECAY);
        }
        self.heights.clone()
    }
}

/// `reverse(spectrum) ++ spectrum`, low frequencies meeting in the middle.
pub fn mirror(spectrum: &[f32]) -> Vec<f32> {
    let mut mirrored = Vec::with_capacity(spectrum.len() * 2);
    mirrored.extend(spectrum.iter().rev());
    mirrored.extend_from_slice(spectrum);
    mirrored
}

/// Amplitude-symmetric bar pair: `top` is the mirrored spectrum, `bottom` its negation.
pub fn stereo_bars(spectrum: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let top = mirror(spectrum);
    let bottom = top.iter().map(|&v| -v).collect();
    (top, bottom)
}
