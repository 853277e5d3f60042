//! Per-run integer symbol table.

use std::collections::BTreeMap;

use crate::statement::{Operand, StatementError};

/// Identifier to integer bindings made by assignment statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: BTreeMap<String, i64>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Bind `name` to the value of `operand`.
    ///
    /// # Errors
    /// - `StatementError::InvalidAssignment` if `operand` names an unbound variable
    pub fn assign(&mut self, name: &str, operand: &Operand) -> Result<i64, StatementError> {
        let value = match operand {
            Operand::Literal(n) => *n,
            Operand::Variable(source) => self.get(source).ok_or_else(|| StatementError::InvalidAssignment {
                name: name.to_string(),
            })?,
        };
        self.values.insert(name.to_string(), value);
        Ok(value)
    }

    /// Number of single-cell steps a movement argument asks for.
    ///
    /// A bound variable wins over reading the token as a literal. Missing, unreadable or
    /// non-positive counts become one step.
    pub fn resolve_steps(&self, argument: Option<&str>) -> u64 {
        let requested = argument.and_then(|token| {
            self.get(token).or_else(|| {
                token
                    .bytes()
                    .all(|b| b.is_ascii_digit())
                    .then(|| token.parse::<i64>().ok())
                    .flatten()
            })
        });
        match requested {
            Some(n) if n > 0 => n.unsigned_abs(),
            _ => 1,
        }
    }
}
