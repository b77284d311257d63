//! Row-filter stage: INCLUDE_IF / EXCLUDE_IF / OFFSET / LIMIT.
//!
//! Filters collected from the mapping document apply in a fixed order so
//! pagination is stable no matter how the mappings are arranged:
//! include predicates first (AND-combined), then exclude predicates, then
//! OFFSET, then LIMIT.

use chrono::NaiveDate;
use etl_expr::{EvaluationContext, Expr, FilterSpec, evaluate};
use etl_model::{RowIssue, Table, Value};
use tracing::debug;

use crate::pipeline::RowView;

/// The aggregated filter directives of one mapping document.
#[derive(Debug, Clone, Default)]
pub struct FilterPlan {
    include: Vec<Expr>,
    exclude: Vec<Expr>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl FilterPlan {
    /// Fold one directive into the plan. Predicates accumulate; a repeated
    /// LIMIT or OFFSET replaces the earlier one.
    pub fn add(&mut self, spec: FilterSpec) {
        match spec {
            FilterSpec::IncludeIf(expr) => self.include.push(expr),
            FilterSpec::ExcludeIf(expr) => self.exclude.push(expr),
            FilterSpec::Limit(n) => self.limit = Some(n),
            FilterSpec::Offset(n) => self.offset = Some(n),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.exclude.is_empty()
            && self.offset.is_none()
            && self.limit.is_none()
    }

    /// Apply the plan to `candidates` (row indices into `table`), returning
    /// the surviving indices in order plus any predicate issues.
    ///
    /// A predicate that errors or produces a non-boolean drops the row and
    /// records the problem; it never aborts the request.
    pub fn apply(
        &self,
        table: &Table,
        candidates: &[usize],
        current_date: NaiveDate,
    ) -> (Vec<usize>, Vec<RowIssue>) {
        let mut issues = Vec::new();
        let mut surviving: Vec<usize> = Vec::with_capacity(candidates.len());

        'rows: for &row in candidates {
            let view = RowView::new(table, row);
            for predicate in &self.include {
                match check_predicate(predicate, &view, current_date) {
                    Ok(true) => {}
                    Ok(false) => continue 'rows,
                    Err(reason) => {
                        issues.push(RowIssue {
                            row,
                            field: "INCLUDE_IF".to_string(),
                            reason,
                        });
                        continue 'rows;
                    }
                }
            }
            for predicate in &self.exclude {
                match check_predicate(predicate, &view, current_date) {
                    Ok(true) => continue 'rows,
                    Ok(false) => {}
                    Err(reason) => {
                        issues.push(RowIssue {
                            row,
                            field: "EXCLUDE_IF".to_string(),
                            reason,
                        });
                        continue 'rows;
                    }
                }
            }
            surviving.push(row);
        }

        // OFFSET before LIMIT, always.
        let offset = self.offset.unwrap_or(0).min(surviving.len());
        let mut surviving = surviving.split_off(offset);
        if let Some(limit) = self.limit {
            surviving.truncate(limit);
        }

        debug!(
            kept = surviving.len(),
            candidates = candidates.len(),
            "row filter stage complete"
        );
        (surviving, issues)
    }
}

fn check_predicate(
    predicate: &Expr,
    view: &RowView<'_>,
    current_date: NaiveDate,
) -> Result<bool, String> {
    let ctx = EvaluationContext::new(view, current_date);
    match evaluate(predicate, &ctx) {
        Ok(Value::Bool(b)) => Ok(b),
        Ok(other) => Err(format!(
            "filter predicate produced {}, expected boolean",
            other.kind()
        )),
        Err(error) => Err(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use etl_expr::compile_validation;
    use etl_model::Column;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn numbered_table(n: i64) -> Table {
        Table::from_columns(vec![Column::new(
            "n",
            (0..n).map(Value::Int).collect(),
        )])
    }

    fn all_rows(table: &Table) -> Vec<usize> {
        (0..table.height()).collect()
    }

    #[test]
    fn offset_applies_before_limit() {
        let table = numbered_table(10);
        let mut plan = FilterPlan::default();
        plan.add(FilterSpec::Limit(2));
        plan.add(FilterSpec::Offset(3));
        let (kept, issues) = plan.apply(&table, &all_rows(&table), today());
        assert_eq!(kept, vec![3, 4]);
        assert!(issues.is_empty());
    }

    #[test]
    fn include_predicates_combine_with_and() {
        let table = numbered_table(10);
        let mut plan = FilterPlan::default();
        plan.add(FilterSpec::IncludeIf(
            compile_validation("attr('n') >= 2").unwrap(),
        ));
        plan.add(FilterSpec::IncludeIf(
            compile_validation("attr('n') <= 4").unwrap(),
        ));
        let (kept, _) = plan.apply(&table, &all_rows(&table), today());
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[test]
    fn exclude_drops_matching_rows() {
        let table = numbered_table(5);
        let mut plan = FilterPlan::default();
        plan.add(FilterSpec::ExcludeIf(
            compile_validation("attr('n') == 2").unwrap(),
        ));
        let (kept, _) = plan.apply(&table, &all_rows(&table), today());
        assert_eq!(kept, vec![0, 1, 3, 4]);
    }

    #[test]
    fn erroring_predicate_drops_row_with_issue() {
        let table = numbered_table(3);
        let mut plan = FilterPlan::default();
        plan.add(FilterSpec::IncludeIf(
            compile_validation("attr('absent') == 1").unwrap(),
        ));
        let (kept, issues) = plan.apply(&table, &all_rows(&table), today());
        assert!(kept.is_empty());
        assert_eq!(issues.len(), 3);
        assert!(issues[0].reason.contains("missing attribute"));
    }

    #[test]
    fn offset_past_end_yields_empty() {
        let table = numbered_table(3);
        let mut plan = FilterPlan::default();
        plan.add(FilterSpec::Offset(10));
        let (kept, _) = plan.apply(&table, &all_rows(&table), today());
        assert!(kept.is_empty());
    }
}
