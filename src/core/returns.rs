use thiserror::Error;

/// Annual broad-market returns in percent, one entry per year.
pub const HISTORICAL_RETURNS: [f64; 30] = [
    32.31, -4.38, 21.04, 28.88, 10.88, 4.91, 15.79, 5.49, -37.0, 26.46, 15.06, 2.11, 16.0, 32.39,
    13.69, 1.38, 11.96, 21.83, -4.38, 28.88, 18.40, -6.24, 31.21, 18.76, 32.50, -4.23, 21.61,
    22.34, 28.36, 10.50,
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReturnSequenceError {
    #[error("return sequence must contain at least one year")]
    Empty,
    #[error("return at index {index} is not a finite number")]
    NonFinite { index: usize },
}

/// Fixed list of annual percentage returns, looked up cyclically by year.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSequence {
    percentages: Vec<f64>,
}

impl ReturnSequence {
    pub fn historical() -> Self {
        Self {
            percentages: HISTORICAL_RETURNS.to_vec(),
        }
    }

    pub fn from_percentages(percentages: Vec<f64>) -> Result<Self, ReturnSequenceError> {
        if percentages.is_empty() {
            return Err(ReturnSequenceError::Empty);
        }
        if let Some(index) = percentages.iter().position(|v| !v.is_finite()) {
            return Err(ReturnSequenceError::NonFinite { index });
        }
        Ok(Self { percentages })
    }

    pub fn len(&self) -> usize {
        self.percentages.len()
    }

    /// Always `false`: both constructors guarantee at least one year.
    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }

    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    /// Risky-asset return for `year` as a fraction of 1. Years past the end
    /// of the dataset wrap around to its start.
    pub fn return_at(&self, year: u32) -> f64 {
        let index = year as usize % self.percentages.len();
        self.percentages[index] / 100.0
    }
}

impl Default for ReturnSequence {
    fn default() -> Self {
        Self::historical()
    }
}
