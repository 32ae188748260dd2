//! Linear expressions over model variables.

use super::VarId;

/// A linear expression `Σ coef·var + constant`.
///
/// Terms are kept in insertion order; repeated variables are not merged,
/// so the expression mirrors exactly what the builder wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum of variables.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// Sum of `coef * var` pairs.
    pub fn weighted(terms: impl IntoIterator<Item = (VarId, f64)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0.0,
        }
    }

    /// Adds `coef * var`.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Appends all terms (and the constant) of another expression.
    pub fn extend(&mut self, other: LinearExpr) {
        self.terms.extend(other.terms);
        self.constant += other.constant;
    }

    /// Terms as `(var, coef)` pairs.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Constant part.
    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no variable terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression against a dense value vector.
    ///
    /// Variables missing from `values` evaluate as 0.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values.get(v.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}
