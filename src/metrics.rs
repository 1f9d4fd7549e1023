/// Number of positions where the prediction equals the target.
pub fn count_correct(pred: &[usize], tgt: &[usize]) -> usize {
    pred.iter().zip(tgt.iter()).filter(|(p, t)| p == t).count()
}

/// Running tally of correct predictions over an evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    pub fn update(&mut self, pred: &[usize], tgt: &[usize]) {
        self.correct += count_correct(pred, tgt);
        self.total += tgt.len();
    }

    /// `100 * correct / total`, or 0 when nothing was seen.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.correct as f32 / self.total as f32
        }
    }
}
