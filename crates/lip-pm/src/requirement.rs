//! Dependency requirements
//!
//! A requirement is an OR of AND-clauses of [`Constraint`]s. Its string form
//! joins the constraints of a clause with a space and the clauses with
//! `" || "`, e.g. `">=1.0.0 <2.0.0 || 3.0.x"`.

use crate::semver::{Constraint, SemverError, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between AND-clauses
pub const OR_DELIMITER: &str = "||";

/// Version requirement on a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirement {
    clauses: Vec<Vec<Constraint>>,
}

impl Requirement {
    /// Build a requirement from already parsed clauses
    pub fn new(clauses: Vec<Vec<Constraint>>) -> Self {
        Self { clauses }
    }

    /// Parse a requirement expression
    pub fn parse(s: &str) -> Result<Self, SemverError> {
        let mut clauses = Vec::new();

        for group in s.split(OR_DELIMITER) {
            let clause = group
                .split_whitespace()
                .map(Constraint::parse)
                .collect::<Result<Vec<_>, _>>()?;

            if clause.is_empty() {
                return Err(SemverError::InvalidConstraint(format!(
                    "empty clause in requirement '{}'",
                    s
                )));
            }

            clauses.push(clause);
        }

        Ok(Self { clauses })
    }

    /// Build a requirement from a list of AND-lists of constraint tokens
    pub fn from_matrix<S: AsRef<str>>(matrix: &[Vec<S>]) -> Result<Self, SemverError> {
        let mut clauses = Vec::with_capacity(matrix.len());

        for and_list in matrix {
            if and_list.is_empty() {
                return Err(SemverError::InvalidConstraint(
                    "empty clause in dependency matrix".to_string(),
                ));
            }

            let clause = and_list
                .iter()
                .map(|token| Constraint::parse(token.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            clauses.push(clause);
        }

        Ok(Self { clauses })
    }

    /// The AND-clauses, in declaration order
    pub fn clauses(&self) -> &[Vec<Constraint>] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check if some clause is fully satisfied by `version`
    ///
    /// An empty requirement is never satisfied.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|c| c.matches(version)))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", OR_DELIMITER)?;
            }
            for (j, constraint) in clause.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", constraint)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = SemverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Requirement::parse(&s).map_err(serde::de::Error::custom)
    }
}
