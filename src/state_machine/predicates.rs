//! # Status Predicates
//!
//! Preconditions a package status must satisfy before a stage may run. The
//! textual notation (`status==100`, `status>=300~and~status<400`) is the one
//! used by workflow definitions, so predicates parse from and render to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::states::status_label;

const CONJUNCTION: &str = "~and~";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusPredicate {
    Equals(i32),
    NotEquals(i32),
    GreaterOrEqual(i32),
    LessThan(i32),
    /// Half-open range `lo <= status < hi`
    Range(i32, i32),
    And(Box<StatusPredicate>, Box<StatusPredicate>),
}

impl StatusPredicate {
    pub fn range(lo: i32, hi: i32) -> Self {
        Self::Range(lo, hi)
    }

    pub fn and(self, other: StatusPredicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn is_satisfied_by(&self, status: i32) -> bool {
        match self {
            Self::Equals(v) => status == *v,
            Self::NotEquals(v) => status != *v,
            Self::GreaterOrEqual(v) => status >= *v,
            Self::LessThan(v) => status < *v,
            Self::Range(lo, hi) => *lo <= status && status < *hi,
            Self::And(left, right) => left.is_satisfied_by(status) && right.is_satisfied_by(status),
        }
    }

    /// One violation message per failed clause; empty when satisfied
    pub fn violations(&self, status: i32) -> Vec<String> {
        match self {
            Self::And(left, right) => {
                let mut violations = left.violations(status);
                violations.extend(right.violations(status));
                violations
            }
            clause if !clause.is_satisfied_by(status) => vec![format!(
                "Incorrect package status: {status} [{}] (expected: {clause})",
                status_label(status)
            )],
            _ => Vec::new(),
        }
    }

    fn parse_clause(clause: &str) -> Result<Self, String> {
        let expression = clause.trim();
        let rest = expression
            .strip_prefix("status")
            .ok_or_else(|| format!("Status expression must start with 'status': {expression}"))?
            .trim_start();

        // Two-character operators first so ">=" is not read as ">"
        let (operator, operand) = ["==", "!=", ">=", "<"]
            .iter()
            .find_map(|op| rest.strip_prefix(op).map(|operand| (*op, operand.trim())))
            .ok_or_else(|| format!("Unsupported status operator in: {expression}"))?;

        let value: i32 = operand
            .parse()
            .map_err(|_| format!("Invalid status value '{operand}' in: {expression}"))?;

        Ok(match operator {
            "==" => Self::Equals(value),
            "!=" => Self::NotEquals(value),
            ">=" => Self::GreaterOrEqual(value),
            _ => Self::LessThan(value),
        })
    }
}

impl fmt::Display for StatusPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(v) => write!(f, "status=={v}"),
            Self::NotEquals(v) => write!(f, "status!={v}"),
            Self::GreaterOrEqual(v) => write!(f, "status>={v}"),
            Self::LessThan(v) => write!(f, "status<{v}"),
            Self::Range(lo, hi) => write!(f, "status>={lo}{CONJUNCTION}status<{hi}"),
            Self::And(left, right) => write!(f, "{left}{CONJUNCTION}{right}"),
        }
    }
}

impl FromStr for StatusPredicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut clauses = s.split(CONJUNCTION).map(Self::parse_clause);
        let first = clauses
            .next()
            .ok_or_else(|| "Empty status expression".to_string())??;
        clauses.try_fold(first, |acc, clause| Ok(acc.and(clause?)))
    }
}

impl TryFrom<String> for StatusPredicate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusPredicate> for String {
    fn from(predicate: StatusPredicate) -> Self {
        predicate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_predicates() {
        assert!(StatusPredicate::Equals(100).is_satisfied_by(100));
        assert!(!StatusPredicate::Equals(100).is_satisfied_by(50));
        assert!(StatusPredicate::NotEquals(-9999).is_satisfied_by(700));
        assert!(!StatusPredicate::NotEquals(-9999).is_satisfied_by(-9999));
        assert!(StatusPredicate::GreaterOrEqual(500).is_satisfied_by(590));
        assert!(!StatusPredicate::LessThan(400).is_satisfied_by(400));
        assert!(StatusPredicate::range(300, 400).is_satisfied_by(390));
        assert!(!StatusPredicate::range(300, 400).is_satisfied_by(400));
    }

    #[test]
    fn test_violation_per_failed_clause() {
        let predicate = StatusPredicate::GreaterOrEqual(300).and(StatusPredicate::LessThan(400));
        assert!(predicate.violations(350).is_empty());

        let violations = predicate.violations(200);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("status>=300"));

        let violations = predicate.violations(450);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("status<400"));
    }

    #[test]
    fn test_violation_names_expectation() {
        let violations = StatusPredicate::Equals(100).violations(50);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("50"));
        assert!(violations[0].contains("status==100"));
    }

    #[test]
    fn test_parse_expressions() {
        assert_eq!(
            "status==0".parse::<StatusPredicate>().unwrap(),
            StatusPredicate::Equals(0)
        );
        assert_eq!(
            "status!=-9999".parse::<StatusPredicate>().unwrap(),
            StatusPredicate::NotEquals(-9999)
        );
        assert_eq!(
            "status>=300~and~status<400".parse::<StatusPredicate>().unwrap(),
            StatusPredicate::GreaterOrEqual(300).and(StatusPredicate::LessThan(400))
        );
        assert_eq!(
            " status >= 700 ".parse::<StatusPredicate>().unwrap(),
            StatusPredicate::GreaterOrEqual(700)
        );
        assert!("status>500".parse::<StatusPredicate>().is_err());
        assert!("state==5".parse::<StatusPredicate>().is_err());
        assert!("status==abc".parse::<StatusPredicate>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let predicate = StatusPredicate::GreaterOrEqual(300).and(StatusPredicate::LessThan(400));
        assert_eq!(predicate.to_string(), "status>=300~and~status<400");
        assert_eq!(
            StatusPredicate::range(300, 400).to_string(),
            "status>=300~and~status<400"
        );
    }

    #[test]
    fn test_serde_uses_expression_notation() {
        let json = serde_json::to_string(&StatusPredicate::Equals(200)).unwrap();
        assert_eq!(json, "\"status==200\"");
        let parsed: StatusPredicate = serde_json::from_str("\"status>=600\"").unwrap();
        assert_eq!(parsed, StatusPredicate::GreaterOrEqual(600));
    }
}
