use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use audit_core::AnalysisReport;
use audit_map::AssignmentSource;
use audit_model::{RiskTier, Severity, TestResult};

pub fn print_report(report: &AnalysisReport) {
    println!("Engine: {}", report.engine);
    println!("Rows: {}", report.data_quality.total_rows);
    print_detection(report);
    print_quality(report);
    print_tests(report);
    print_score(report);
    print_sample(report);
}

fn print_detection(report: &AnalysisReport) {
    let detection = &report.column_detection;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Column"),
        header_cell("Confidence"),
        header_cell("Source"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (field, assignment) in &detection.assignments {
        let source = match assignment.source {
            AssignmentSource::Detected => dim_cell("detected"),
            AssignmentSource::Override => Cell::new("override").fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(field).add_attribute(Attribute::Bold),
            Cell::new(&assignment.column),
            Cell::new(format!("{:.2}", assignment.confidence)),
            source,
        ]);
    }
    for column in detection.unmapped_columns() {
        table.add_row(vec![dim_cell("-"), dim_cell(column), dim_cell("-"), dim_cell("unmapped")]);
    }
    println!();
    println!("Column detection:");
    println!("{table}");
    for note in &detection.detection_notes {
        println!("  note: {note}");
    }
}

fn print_quality(report: &AnalysisReport) {
    let quality = &report.data_quality;
    println!();
    println!("Data quality: {:.1}/100", quality.completeness_score);
    if !quality.field_fill_rates.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![header_cell("Field"), header_cell("Filled")]);
        apply_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        for (field, rate) in &quality.field_fill_rates {
            let cell = Cell::new(format!("{:.1}%", rate * 100.0));
            let cell = if *rate < 0.95 { cell.fg(Color::Yellow) } else { cell };
            table.add_row(vec![Cell::new(field), cell]);
        }
        println!("{table}");
    }
    for issue in &quality.detected_issues {
        println!("  issue: {issue}");
    }
}

fn print_tests(report: &AnalysisReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Test"),
        header_cell("Tier"),
        header_cell("Severity"),
        header_cell("Flagged"),
        header_cell("Rate"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for result in &report.test_results {
        table.add_row(test_row(result));
    }
    for skipped in &report.skipped_tests {
        table.add_row(vec![
            dim_cell(&skipped.test_name),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell(format!("skipped: missing {}", skipped.missing_fields.join(", "))),
        ]);
    }
    println!();
    println!("Tests:");
    println!("{table}");
}

fn test_row(result: &TestResult) -> Vec<Cell> {
    let flagged = if result.entries_flagged > 0 {
        Cell::new(result.entries_flagged)
            .fg(severity_color(result.severity))
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell(0)
    };
    vec![
        Cell::new(&result.test_name),
        Cell::new(result.tier.as_str()),
        severity_cell(result.severity),
        flagged,
        Cell::new(format!("{:.1}%", result.flag_rate * 100.0)),
        Cell::new(&result.description),
    ]
}

fn print_score(report: &AnalysisReport) {
    let score = &report.composite_score;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Score"),
        header_cell("Tier"),
        header_cell("Tests"),
        header_cell("Flagged"),
        header_cell("Multi-flag rows"),
        header_cell("Multiplier"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(format!("{:.1}", score.score)).add_attribute(Attribute::Bold),
        tier_cell(score.risk_tier),
        Cell::new(score.tests_run),
        Cell::new(format!(
            "{} of {} ({:.1}%)",
            score.total_flagged,
            score.total_entries,
            score.flag_rate * 100.0
        )),
        Cell::new(score.multi_flag_rows),
        Cell::new(format!("{:.3}", score.multiplier)),
    ]);
    println!();
    println!("Risk score:");
    println!("{table}");
    for finding in &score.top_findings {
        println!("  - {finding}");
    }
}

fn print_sample(report: &AnalysisReport) {
    let Some(sample) = &report.sampling_result else {
        return;
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stratum"),
        header_cell("Population"),
        header_cell("Sampled"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for stratum in &sample.strata {
        table.add_row(vec![
            Cell::new(&stratum.key),
            Cell::new(stratum.population_size),
            Cell::new(stratum.sample_size),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(sample.total_population).add_attribute(Attribute::Bold),
        Cell::new(sample.total_sampled).add_attribute(Attribute::Bold),
    ]);
    println!();
    println!(
        "Sample (seed {}, stratified by {}):",
        sample.seed,
        sample.stratify_by.join(", ")
    );
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::High => Cell::new("HIGH")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Medium => Cell::new("MEDIUM").fg(Color::Yellow),
        Severity::Low => Cell::new("LOW").fg(Color::Blue),
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
    }
}

fn tier_cell(tier: RiskTier) -> Cell {
    let color = match tier {
        RiskTier::Low => Color::Green,
        RiskTier::Elevated => Color::Blue,
        RiskTier::Moderate => Color::Yellow,
        RiskTier::High | RiskTier::Critical => Color::Red,
    };
    Cell::new(tier.as_str().to_uppercase())
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
