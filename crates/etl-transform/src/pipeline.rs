//! Compile-then-execute pipeline for one transformation request.
//!
//! Stages, in order:
//!
//! 1. **Compile**: resolve every field mapping into an expression tree and
//!    collect filter directives. All syntax and mapping problems surface
//!    here, before any row is read.
//! 2. **Evaluate**: compute each target column across the whole input
//!    table. Evaluation errors are row-scoped; the row is rejected and the
//!    pipeline continues.
//! 3. **Validate**: check each computed value against its field's rule.
//! 4. **Filter**: apply the row-filter plan to the surviving rows.
//!
//! Each stage takes the output of the previous stage; no state survives
//! the request.

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use etl_expr::{
    AttributeSource, CompiledTransform, EvalError, EvaluationContext, Expr, FunctionId, StringFn,
    compile_transform, evaluate,
};
use etl_model::{Column, FieldMapping, MappingDocument, MappingError, RowIssue, Table, Value};
use etl_validate::{RowOutcome, ValidationPolicy, ValidationRule};
use tracing::{debug, info, info_span};

use crate::filters::FilterPlan;

/// Read-only view over one row of a table, used as the evaluation
/// context's attribute source.
pub struct RowView<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowView<'a> {
    pub fn new(table: &'a Table, row: usize) -> Self {
        Self { table, row }
    }
}

impl AttributeSource for RowView<'_> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.table.value(name, self.row)
    }
}

/// Options for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// The request clock: every `CURRENT_DATE()` in the run reads this.
    pub current_date: NaiveDate,
    pub policy: ValidationPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            current_date: chrono::Utc::now().date_naive(),
            policy: ValidationPolicy::default(),
        }
    }
}

/// Result of a pipeline run, before output writing.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The transformed, validated, filtered table.
    pub table: Table,
    pub total_rows: usize,
    /// Rows present in the output table.
    pub accepted_rows: usize,
    /// Rows dropped because of evaluation errors or validation failures
    /// (not rows removed by filters).
    pub rejected_rows: usize,
    pub issues: Vec<RowIssue>,
}

/// One field mapping compiled to an executable form.
struct CompiledField {
    target: String,
    expr: Expr,
    rule: Option<ValidationRule>,
}

/// Run the whole pipeline for one request.
///
/// Fatal errors (malformed mapping or expression) abort before any row is
/// processed; row-scoped problems are collected into the output's issues.
pub fn run_pipeline(
    input: &Table,
    document: &MappingDocument,
    options: &PipelineOptions,
) -> Result<PipelineOutput> {
    let span = info_span!("pipeline", rows = input.height());
    let _guard = span.enter();

    let (fields, plan) = {
        let _compile = info_span!("compile").entered();
        compile_document(document, input)?
    };

    let total_rows = input.height();
    let mut issues: Vec<RowIssue> = Vec::new();
    let mut rejected: BTreeSet<usize> = BTreeSet::new();

    // Evaluate each target column across the whole input table.
    let transformed = {
        let _evaluate = info_span!("evaluate").entered();
        let mut columns = Vec::with_capacity(fields.len());
        for field in &fields {
            let results = evaluate_column(&field.expr, input, options.current_date);
            let mut values = Vec::with_capacity(results.len());
            for (row, result) in results.into_iter().enumerate() {
                match result {
                    Ok(value) => values.push(value),
                    Err(error) => {
                        issues.push(RowIssue {
                            row,
                            field: field.target.clone(),
                            reason: error.to_string(),
                        });
                        rejected.insert(row);
                        values.push(Value::Null);
                    }
                }
            }
            columns.push(Column::new(field.target.clone(), values));
        }
        Table::from_columns(columns)
    };

    // Validate computed values row by row.
    {
        let _validate = info_span!("validate").entered();
        for row in 0..total_rows {
            if rejected.contains(&row) {
                continue;
            }
            let mut failures = Vec::new();
            for field in &fields {
                let Some(rule) = &field.rule else { continue };
                let subject = transformed
                    .value(&field.target, row)
                    .cloned()
                    .unwrap_or(Value::Null);
                let view = RowView::new(&transformed, row);
                let outcome = rule.check(&subject, &view, options.current_date);
                if let etl_validate::Outcome::Invalid(reason) = outcome {
                    failures.push(etl_validate::FieldFailure {
                        field: field.target.clone(),
                        reason,
                    });
                }
            }
            if let RowOutcome::Rejected(failures) = RowOutcome::from_failures(failures) {
                for failure in &failures {
                    issues.push(RowIssue {
                        row,
                        field: failure.field.clone(),
                        reason: failure.reason.clone(),
                    });
                }
                if options.policy == ValidationPolicy::RejectRow {
                    rejected.insert(row);
                }
            }
        }
    }

    // Row-filter stage over the surviving rows.
    let kept = {
        let _filter = info_span!("filter").entered();
        let candidates: Vec<usize> = (0..total_rows).filter(|r| !rejected.contains(r)).collect();
        if plan.is_empty() {
            candidates
        } else {
            let (kept, filter_issues) = plan.apply(&transformed, &candidates, options.current_date);
            for issue in &filter_issues {
                rejected.insert(issue.row);
            }
            issues.extend(filter_issues);
            kept
        }
    };

    let table = transformed.take_rows(&kept);
    let output = PipelineOutput {
        accepted_rows: kept.len(),
        rejected_rows: rejected.len(),
        total_rows,
        issues,
        table,
    };
    info!(
        total = output.total_rows,
        accepted = output.accepted_rows,
        rejected = output.rejected_rows,
        "transform complete"
    );
    Ok(output)
}

/// Evaluate one expression across every row of a table.
///
/// The tree walk is independent per row, so correctness never depends on
/// evaluation order and the loop is free to be parallelized or vectorized.
pub fn evaluate_column(
    expr: &Expr,
    table: &Table,
    current_date: NaiveDate,
) -> Vec<Result<Value, EvalError>> {
    (0..table.height())
        .map(|row| {
            let view = RowView::new(table, row);
            let ctx = EvaluationContext::new(&view, current_date);
            evaluate(expr, &ctx)
        })
        .collect()
}

fn compile_document(
    document: &MappingDocument,
    input: &Table,
) -> Result<(Vec<CompiledField>, FilterPlan)> {
    let mut fields = Vec::new();
    let mut plan = FilterPlan::default();

    for (index, mapping) in document.mappings.iter().enumerate() {
        let source_expr = resolve_source(mapping, input, index)?;

        let expr = match &mapping.transform {
            Some(raw) => {
                if let Some(function) = shorthand(raw) {
                    let operand = source_expr.ok_or_else(|| {
                        anyhow!(MappingError::invalid(
                            format!("mappings[{index}].transform"),
                            format!("shorthand '{}' requires a source or default", raw.trim()),
                        ))
                    })?;
                    Expr::Call {
                        function,
                        args: vec![operand],
                    }
                } else {
                    let compiled = compile_transform(raw)
                        .with_context(|| format!("mappings[{index}].transform"))?;
                    match compiled {
                        CompiledTransform::Value(expr) => expr,
                        CompiledTransform::Filter(spec) => {
                            if mapping.validation.is_some() {
                                return Err(anyhow!(MappingError::invalid(
                                    format!("mappings[{index}].validation"),
                                    "validation rules are not allowed on filter mappings",
                                )));
                            }
                            debug!(target = %mapping.target, "collected filter directive");
                            plan.add(spec);
                            continue;
                        }
                    }
                }
            }
            // No transform: the mapping document guarantees source or
            // default is present.
            None => source_expr.ok_or_else(|| {
                anyhow!(MappingError::invalid(
                    format!("mappings[{index}].source"),
                    format!(
                        "source column '{}' not found in input and no default provided",
                        mapping.source.as_deref().unwrap_or_default()
                    ),
                ))
            })?,
        };

        let rule = mapping
            .validation
            .as_deref()
            .map(ValidationRule::compile)
            .transpose()
            .with_context(|| format!("mappings[{index}].validation"))?;

        fields.push(CompiledField {
            target: mapping.target.clone(),
            expr,
            rule,
        });
    }

    Ok((fields, plan))
}

/// Resolve the mapping's source column against the actual input table.
///
/// A source missing from the input falls back to the mapping's default
/// literal; with neither available the request is aborted.
fn resolve_source(
    mapping: &FieldMapping,
    input: &Table,
    index: usize,
) -> Result<Option<Expr>> {
    match &mapping.source {
        Some(source) => {
            if input.has_column(source) {
                Ok(Some(Expr::Attribute(source.clone())))
            } else if let Some(default) = &mapping.default {
                debug!(
                    target = %mapping.target,
                    source = %source,
                    "source column missing, using default"
                );
                Ok(Some(Expr::Literal(default.clone())))
            } else if mapping.transform.is_some() && shorthand_name(mapping) {
                Err(anyhow!(MappingError::invalid(
                    format!("mappings[{index}].source"),
                    format!("source column '{source}' not found in input"),
                )))
            } else if mapping.transform.is_some() {
                // A full transform expression references columns through
                // attr(); the declared source is informational here.
                Ok(None)
            } else {
                Err(anyhow!(MappingError::invalid(
                    format!("mappings[{index}].source"),
                    format!("source column '{source}' not found in input and no default provided"),
                )))
            }
        }
        None => Ok(mapping.default.clone().map(Expr::Literal)),
    }
}

fn shorthand(raw: &str) -> Option<FunctionId> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "upper" => Some(FunctionId::String(StringFn::Upper)),
        "lower" => Some(FunctionId::String(StringFn::Lower)),
        "trim" => Some(FunctionId::String(StringFn::Trim)),
        _ => None,
    }
}

fn shorthand_name(mapping: &FieldMapping) -> bool {
    mapping
        .transform
        .as_deref()
        .is_some_and(|t| shorthand(t).is_some())
}
