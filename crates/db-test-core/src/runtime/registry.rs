// crates/db-test-core/src/runtime/registry.rs
// ============================================================================
// Module: db-test Test Registry
// Description: Aggregates raw records and partitions them after validation.
// Purpose: Produce the deterministic, runnable set of test cases for a run.
// Dependencies: crate::core, crate::runtime::validator, thiserror
// ============================================================================

//! ## Overview
//! The registry owns every record loaded for a run. Construction fails fast
//! on an empty input or duplicate identifiers; [`TestRegistry::validate`]
//! then validates each record against the full candidate set and returns the
//! runnable cases sorted by identifier. Ordering is part of the contract:
//! later tests may rely on side effects of earlier ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::TestCase;
use crate::core::TestId;
use crate::core::TestRecord;
use crate::core::ValidationIssue;
use crate::runtime::validator::Validator;
use crate::runtime::validator::build_test_case;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier declared by more than one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    /// Duplicated identifier.
    pub id: TestId,
    /// Source labels of every record using the identifier.
    pub sources: Vec<String>,
}

/// Load-time fatal registry errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No records were loaded.
    #[error("no tests available")]
    NoTestsAvailable,
    /// At least one identifier appears more than once.
    #[error("duplicate test identifiers: {}", format_duplicates(.duplicates))]
    DuplicateIdentifier {
        /// Every duplicated identifier with its sources.
        duplicates: Vec<DuplicateId>,
    },
    /// Every record failed validation.
    #[error("all {} tests are broken", .broken.len())]
    AllTestsBroken {
        /// Broken records with their issues.
        broken: Vec<BrokenTest>,
    },
}

/// Formats duplicate identifiers for error messages.
fn format_duplicates(duplicates: &[DuplicateId]) -> String {
    duplicates
        .iter()
        .map(|duplicate| format!("'{}' ({})", duplicate.id, duplicate.sources.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// SECTION: Registration Output
// ============================================================================

/// Record rejected by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenTest {
    /// Record identifier.
    pub id: TestId,
    /// Source label of the record.
    pub source: String,
    /// Every issue found, warnings included.
    pub issues: Vec<ValidationIssue>,
}

/// Non-blocking findings for a runnable record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWarnings {
    /// Record identifier.
    pub id: TestId,
    /// Warning issues.
    pub issues: Vec<ValidationIssue>,
}

/// Partitioned validation output.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Runnable test cases sorted by identifier.
    pub valid: Vec<TestCase>,
    /// Records rejected by validation, sorted by identifier.
    pub broken: Vec<BrokenTest>,
    /// Warnings attached to runnable records.
    pub warnings: Vec<RecordWarnings>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Identifier-keyed collection of every loaded record.
#[derive(Debug, Clone)]
pub struct TestRegistry {
    /// Records keyed by identifier, pre-resolution.
    records: BTreeMap<TestId, TestRecord>,
    /// Parameter names supplied globally at execution time.
    global_params: BTreeSet<String>,
}

impl TestRegistry {
    /// Builds a registry from raw records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoTestsAvailable`] for an empty input and
    /// [`RegistryError::DuplicateIdentifier`] when identifiers collide.
    pub fn new(raw: Vec<TestRecord>) -> Result<Self, RegistryError> {
        if raw.is_empty() {
            return Err(RegistryError::NoTestsAvailable);
        }
        let mut sources: BTreeMap<TestId, Vec<String>> = BTreeMap::new();
        for record in &raw {
            sources.entry(record.id.clone()).or_default().push(record.source_label());
        }
        let duplicates: Vec<DuplicateId> = sources
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(id, sources)| DuplicateId {
                id,
                sources,
            })
            .collect();
        if !duplicates.is_empty() {
            return Err(RegistryError::DuplicateIdentifier {
                duplicates,
            });
        }
        let records = raw.into_iter().map(|record| (record.id.clone(), record)).collect();
        Ok(Self {
            records,
            global_params: BTreeSet::new(),
        })
    }

    /// Declares parameter names supplied globally at execution time.
    #[must_use]
    pub fn with_global_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validates every record and partitions the result.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AllTestsBroken`] when no record is runnable.
    pub fn validate(&self) -> Result<Registration, RegistryError> {
        let validator =
            Validator::new(&self.records).with_global_params(self.global_params.iter().cloned());
        let mut valid = Vec::new();
        let mut broken = Vec::new();
        let mut warnings = Vec::new();

        for (id, record) in &self.records {
            let validation = validator.validate_schema(record);
            let runnable = validation.is_runnable();
            let case = if runnable { Some(build_test_case(&validation.resolved)) } else { None };
            match case {
                Some(Ok(case)) => {
                    if !validation.issues.is_empty() {
                        warnings.push(RecordWarnings {
                            id: id.clone(),
                            issues: validation.issues,
                        });
                    }
                    valid.push(case);
                }
                Some(Err(mut extra)) => {
                    let mut issues = validation.issues;
                    issues.append(&mut extra);
                    broken.push(BrokenTest {
                        id: id.clone(),
                        source: record.source_label(),
                        issues,
                    });
                }
                None => broken.push(BrokenTest {
                    id: id.clone(),
                    source: record.source_label(),
                    issues: validation.issues,
                }),
            }
        }

        if valid.is_empty() {
            return Err(RegistryError::AllTestsBroken {
                broken,
            });
        }
        Ok(Registration {
            valid,
            broken,
            warnings,
        })
    }
}

/// Builds a registry from raw records and validates it.
///
/// # Errors
///
/// Returns [`RegistryError`] for empty input, duplicate identifiers, or when
/// every record is broken.
pub fn register(raw: Vec<TestRecord>) -> Result<Registration, RegistryError> {
    TestRegistry::new(raw)?.validate()
}
