use campaign_filter::{Column, Table};

/// Semicolon-delimited extract in the layout of the bank-marketing export.
pub const BANK_CSV: &str = "\
\"age\";\"job\";\"marital\";\"default\";\"housing\";\"loan\";\"contact\";\"month\";\"day_of_week\";\"y\"
56;\"housemaid\";\"married\";\"no\";\"no\";\"no\";\"telephone\";\"may\";\"mon\";\"no\"
57;\"services\";\"married\";\"unknown\";\"no\";\"no\";\"telephone\";\"may\";\"mon\";\"no\"
37;\"services\";\"married\";\"no\";\"yes\";\"no\";\"telephone\";\"may\";\"tue\";\"yes\"
40;\"admin.\";\"married\";\"no\";\"no\";\"no\";\"cellular\";\"jun\";\"wed\";\"no\"
56;\"services\";\"married\";\"no\";\"no\";\"yes\";\"cellular\";\"jun\";\"thu\";\"no\"
45;\"services\";\"single\";\"unknown\";\"no\";\"no\";\"cellular\";\"jul\";\"fri\";\"yes\"
59;\"admin.\";\"married\";\"no\";\"no\";\"no\";\"telephone\";\"may\";\"mon\";\"no\"
41;\"blue-collar\";\"divorced\";\"unknown\";\"no\";\"no\";\"cellular\";\"may\";\"tue\";\"no\"
24;\"technician\";\"single\";\"no\";\"yes\";\"no\";\"cellular\";\"aug\";\"wed\";\"yes\"
25;\"services\";\"single\";\"no\";\"yes\";\"no\";\"telephone\";\"may\";\"thu\";\"no\"
";

/// The scenario table: three ages and their outcome.
pub fn age_outcome_table() -> Table {
    Table::new(vec![
        Column::integer("age", [25, 40, 60]),
        Column::text("y", ["no", "yes", "no"]),
    ])
    .unwrap()
}

/// Cell values rendered as text, row by row.
pub fn rendered_rows(table: &Table) -> Vec<Vec<String>> {
    (0..table.n_rows())
        .map(|i| {
            table
                .row(i)
                .unwrap()
                .into_iter()
                .map(|v| v.to_string())
                .collect()
        })
        .collect()
}
