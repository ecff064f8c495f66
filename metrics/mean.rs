use super::StreamingMetric;

/// The arithmetic mean of the inputs, updated incrementally so that it stays accurate over many inputs.
#[derive(Debug, Clone, Default)]
pub struct Mean {
	n: u64,
	mean: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, value: f32) {
		self.n += 1;
		self.mean += (f64::from(value) - self.mean) / self.n as f64;
	}

	fn merge(&mut self, other: Self) {
		let n = self.n + other.n;
		if n == 0 {
			return;
		}
		self.mean = (self.mean * self.n as f64 + other.mean * other.n as f64) / n as f64;
		self.n = n;
	}

	fn finalize(self) -> Option<f32> {
		if self.n > 0 {
			Some(self.mean as f32)
		} else {
			None
		}
	}
}

#[test]
fn test_mean() {
	let mut left = Mean::default();
	left.update(1.0);
	left.update(2.0);
	let mut right = Mean::default();
	right.update(6.0);
	left.merge(right);
	assert_eq!(left.finalize(), Some(3.0));
	assert_eq!(Mean::default().finalize(), None);
}
