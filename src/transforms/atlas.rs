//! Human Protein Atlas normal tissue expression.

use super::{Inputs, to_transaction};
use crate::error::DaedalusError;

/// Expression levels that carry no information.
const UNINFORMATIVE: &[&str] = &["Not detected", "Not representative", "N/A"];

pub fn tissue_of_origin(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let expression = inputs
        .frame("patlas", "normal_tissue_expression")?
        .filter_by("level", |level| {
            level.is_some_and(|level| !UNINFORMATIVE.contains(&level))
        })?;
    let mut table = expression.select(&[
        ("gene", "ensg"),
        ("tissue", "tissue"),
        ("cell_type", "cell_type"),
        ("level", "expression_level"),
        ("reliability", "reliability"),
    ])?;
    table.drop_missing(&["ensg", "tissue"])?;
    table.drop_duplicates();
    Ok(to_transaction(&table, "tissue_expression"))
}
