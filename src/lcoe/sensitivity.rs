//! Rank-correlation sensitivity of LCOE to the sampled inputs.

use std::fmt;

use super::monte_carlo::SampleRecord;

/// Ranks starting at 1, with tied values sharing the mean of their ranks.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Spearman rank correlation of `x` and `y`.
///
/// Returns `None` if the slices differ in length, hold fewer than two values,
/// or either has zero variance.
///
/// # Examples
///
/// ```
/// use slb_sim::lcoe::sensitivity::spearman;
///
/// let rho = spearman(&[1.0, 2.0, 3.0], &[10.0, 40.0, 90.0]).unwrap();
/// assert!((rho - 1.0).abs() < 1e-12);
/// assert_eq!(spearman(&[1.0, 1.0], &[2.0, 3.0]), None);
/// ```
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Uncertain inputs of the Monte Carlo study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVariable {
    CapexTotal,
    DiscountRate,
    OpexFraction,
    DegradationFactor,
}

impl InputVariable {
    pub const ALL: [InputVariable; 4] = [
        InputVariable::CapexTotal,
        InputVariable::DiscountRate,
        InputVariable::OpexFraction,
        InputVariable::DegradationFactor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InputVariable::CapexTotal => "CAPEX total",
            InputVariable::DiscountRate => "Discount rate",
            InputVariable::OpexFraction => "OPEX fraction",
            InputVariable::DegradationFactor => "Degradation factor",
        }
    }

    fn value(self, record: &SampleRecord) -> f64 {
        match self {
            InputVariable::CapexTotal => record.capex_total,
            InputVariable::DiscountRate => record.sample.discount_rate,
            InputVariable::OpexFraction => record.sample.opex_fraction,
            InputVariable::DegradationFactor => record.sample.degradation_factor,
        }
    }
}

impl fmt::Display for InputVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Correlation of one input with LCOE.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityEntry {
    pub input: InputVariable,
    /// `None` when the input (or LCOE) did not vary.
    pub rho: Option<f64>,
}

/// Spearman ρ of every sampled input against LCOE over the valid iterations,
/// strongest driver first. Inputs without a defined ρ sort last.
pub fn global_sensitivity(samples: &[SampleRecord]) -> Vec<SensitivityEntry> {
    let valid: Vec<&SampleRecord> = samples.iter().filter(|r| r.lcoe.is_some()).collect();
    let lcoe: Vec<f64> = valid.iter().filter_map(|r| r.lcoe).collect();

    let mut entries: Vec<SensitivityEntry> = InputVariable::ALL
        .iter()
        .map(|&input| {
            let values: Vec<f64> = valid.iter().map(|r| input.value(r)).collect();
            SensitivityEntry {
                input,
                rho: spearman(&values, &lcoe),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        let key = |e: &SensitivityEntry| e.rho.map_or(-1.0, f64::abs);
        key(b).total_cmp(&key(a))
    });
    entries
}
