//! Engine-neutral MILP model description.
//!
//! A `MilpModel` is a plain value: declared variables, linear
//! constraints, and a minimization objective. The model builder
//! produces one; a [`Solver`](crate::solver::Solver) consumes one
//! without mutating it. Nothing here knows about scheduling.
//!
//! # Reference
//! Wolsey (2020), "Integer Programming", Ch. 1

mod expr;

pub use expr::LinearExpr;

/// Dense handle to a declared variable.
///
/// Handles are positions in [`MilpModel::variables`], so a solved
/// assignment is simply a `Vec<f64>` indexed by `VarId::index()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position in the model's variable list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    /// 0/1 integer.
    Binary,
    /// Real-valued in `[lower, upper]`.
    Continuous { lower: f64, upper: f64 },
}

/// A declared decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    /// Diagnostic name, e.g. `x[A,M1,3,S1]`.
    pub name: String,
    /// Variable domain.
    pub kind: VarKind,
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `expr <= rhs`
    LessEq,
    /// `expr >= rhs`
    GreaterEq,
    /// `expr == rhs`
    Equal,
}

/// A linear constraint `expr (<=|>=|==) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Constraint family the builder filed this row under.
    pub group: &'static str,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Relation.
    pub cmp: Comparison,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Whether `values` satisfy this constraint within `tolerance`.
    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::LessEq => lhs <= self.rhs + tolerance,
            Comparison::GreaterEq => lhs + tolerance >= self.rhs,
            Comparison::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A minimization MILP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilpModel {
    /// Model name.
    pub name: String,
    variables: Vec<VariableDecl>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MilpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declares a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, VarKind::Binary)
    }

    /// Declares a continuous variable in `[lower, upper]`.
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(name, VarKind::Continuous { lower, upper })
    }

    fn add_variable(&mut self, name: impl Into<String>, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDecl {
            name: name.into(),
            kind,
        });
        id
    }

    /// Adds `expr cmp rhs` under a constraint family.
    pub fn add_constraint(
        &mut self,
        group: &'static str,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            group,
            expr,
            cmp,
            rhs,
        });
    }

    /// Sets the minimization objective.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Declared variables.
    pub fn variables(&self) -> &[VariableDecl] {
        &self.variables
    }

    /// Constraint rows.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective expression.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of binary variables.
    pub fn binary_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of constraints filed under `group`.
    pub fn constraint_count_in(&self, group: &str) -> usize {
        self.constraints.iter().filter(|c| c.group == group).count()
    }

    /// Objective value of an assignment.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Constraints not satisfied by `values` within `tolerance`.
    pub fn violated_constraints(&self, values: &[f64], tolerance: f64) -> Vec<&LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(values, tolerance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> (MilpModel, VarId, VarId) {
        let mut m = MilpModel::new("knapsack");
        let a = m.add_binary("a");
        let b = m.add_continuous("b", 0.0, 4.0);
        m.add_constraint("cap", LinearExpr::sum([a, b]), Comparison::LessEq, 3.0);
        m.add_constraint(
            "floor",
            LinearExpr::weighted([(b, 2.0)]),
            Comparison::GreaterEq,
            1.0,
        );
        m.set_objective(LinearExpr::weighted([(a, -1.0), (b, 0.5)]));
        (m, a, b)
    }

    #[test]
    fn test_declarations() {
        let (m, a, b) = knapsack();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(m.variable_count(), 2);
        assert_eq!(m.binary_count(), 1);
        assert_eq!(m.constraint_count(), 2);
        assert_eq!(m.constraint_count_in("cap"), 1);
        assert_eq!(m.constraint_count_in("missing"), 0);
        assert_eq!(
            m.variables()[1].kind,
            VarKind::Continuous {
                lower: 0.0,
                upper: 4.0
            }
        );
    }

    #[test]
    fn test_feasibility_check() {
        let (m, _, _) = knapsack();
        assert!(m.violated_constraints(&[1.0, 1.0], 1e-9).is_empty());
        assert!((m.objective_value(&[1.0, 1.0]) + 0.5).abs() < 1e-12);

        let violated = m.violated_constraints(&[1.0, 3.0], 1e-9);
        assert_eq!(violated.len(), 1);
        assert_eq!(violated[0].group, "cap");

        let violated = m.violated_constraints(&[0.0, 0.0], 1e-9);
        assert_eq!(violated[0].group, "floor");
    }

    #[test]
    fn test_equality_tolerance() {
        let c = LinearConstraint {
            group: "eq",
            expr: LinearExpr::sum([VarId(0)]),
            cmp: Comparison::Equal,
            rhs: 1.0,
        };
        assert!(c.is_satisfied_by(&[1.0 + 1e-8], 1e-6));
        assert!(!c.is_satisfied_by(&[0.9], 1e-6));
    }
}
