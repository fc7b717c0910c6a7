use crate::Problem;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use qapforge::consensus::ConsensusOutcome;
use qapforge::optimizer::RunResult;
use qapforge::scorer::invert;

/// Symbols in slot order, e.g. `trsheaqflkb...`.
fn layout_string(assignment: &[usize], alphabet: &[char]) -> String {
    invert(assignment).iter().map(|&s| alphabet[s]).collect()
}

pub fn print_run_summary(result: &RunResult) {
    println!("Cost: {:.6e}", result.cost);
    println!("Time: {:.2?}", result.elapsed);
    if let Some(seed) = result.seed {
        println!("Seed: {}", seed);
    }
}

pub fn print_assignment(title: &str, assignment: &[usize], problem: &Problem) {
    let n = assignment.len();
    let slot_symbols = invert(assignment);

    println!("\nLayout ({}): {}", title, layout_string(assignment, &problem.alphabet));

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    for (g, range) in problem.layout.groups(n).into_iter().enumerate() {
        let mut cells = vec![Cell::new(format!("G{}", g + 1)).add_attribute(Attribute::Bold)];
        cells.extend(range.map(|slot| {
            Cell::new(problem.alphabet[slot_symbols[slot]]).set_alignment(CellAlignment::Center)
        }));
        table.add_row(cells);
    }
    println!("{}", table);
}

pub fn print_accepted_runs(runs: &[RunResult], problem: &Problem) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Cost").fg(Color::Cyan),
        Cell::new("Time"),
        Cell::new("Layout"),
    ]);

    for (i, run) in runs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:.4e}", run.cost)).fg(Color::Cyan),
            Cell::new(format!("{:.2?}", run.elapsed)),
            Cell::new(layout_string(&run.assignment, &problem.alphabet)),
        ]);
    }

    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    println!("\nAccepted solutions:\n{}", table);
}

pub fn print_tally(outcome: &ConsensusOutcome, problem: &Problem) {
    let total = outcome.accepted.len();
    let slot_symbols = outcome.slot_symbols();

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slot", "Symbol", "Votes", "Top choice"]);

    for (slot, &symbol) in slot_symbols.iter().enumerate() {
        let votes = outcome.tally.count(slot, symbol);
        let top = (0..problem.alphabet.len())
            .max_by_key(|&s| (outcome.tally.count(slot, s), std::cmp::Reverse(s)))
            .unwrap_or(symbol);

        let mut symbol_cell = Cell::new(problem.alphabet[symbol]);
        if top != symbol {
            // The majority symbol was claimed by an earlier slot.
            symbol_cell = symbol_cell.fg(Color::Yellow);
        }

        table.add_row(vec![
            Cell::new(slot),
            symbol_cell,
            Cell::new(format!("{}/{}", votes, total)),
            Cell::new(format!(
                "{} ({})",
                problem.alphabet[top],
                outcome.tally.count(slot, top)
            )),
        ]);
    }
    println!("\nPer-slot vote:\n{}", table);
    println!(
        "Attempts: {} | Rejected: {} | Total time: {:.2?}",
        outcome.attempts, outcome.rejected, outcome.elapsed
    );
}
