// Entry point and high-level CLI flow.
//
// - Option [1] loads both CSV files, cleans and joins them, printing
//   diagnostics.
// - Option [2] asks for a role and a clinician, then generates the report
//   tables for that selection, previews them and exports CSV/JSON files.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod error;
mod join;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use error::ReportError;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::JoinedRecord;

const CASES_PATH: &str = "data/cases.csv";
const ROTAS_PATH: &str = "data/rotas.csv";

// Simple in-memory app state so we only load/join the CSVs once but can
// generate reports for different selections in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<JoinedRecord>>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt. The prompt is reused for the main menu and the selection lists.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Print a numbered list of options and read one back. A numeric answer
/// picks from the list; anything else is taken as a literal value, so a
/// name that matches no row surfaces as an empty selection downstream.
fn choose_from(label: &str, options: &[String]) -> String {
    println!("{}:", label);
    for (idx, option) in options.iter().enumerate() {
        println!("[{}] {}", idx + 1, option);
    }
    let choice = read_choice();
    if let Ok(n) = choice.parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return options[n - 1].clone();
        }
    }
    choice
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load both CSV files and build the joined table.
///
/// On success, we store the joined rows in `APP_STATE` and print a short
/// textual summary of what happened.
fn handle_load() {
    let (cases, rotas, load_report) = match loader::load(CASES_PATH, ROTAS_PATH) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load input files: {}\n", e);
            return;
        }
    };
    println!(
        "Processing datasets... ({} case rows, {} rota rows loaded)",
        util::format_int(load_report.case_rows as i64),
        util::format_int(load_report.rota_rows as i64)
    );
    let skipped = load_report.case_errors + load_report.rota_errors;
    if skipped > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            util::format_int(skipped as i64)
        );
    }
    match join::clean_and_join(&cases, &rotas) {
        Ok(joined) => {
            println!(
                "Joined table has {} rows.\n",
                util::format_int(joined.len() as i64)
            );
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(joined);
        }
        Err(e) => {
            eprintln!("Failed to join datasets: {}\n", e);
        }
    }
}

/// Handle option [2]: pick a role and a clinician, then generate all report
/// tables for that selection.
///
/// This function is intentionally side-effectful: it writes the report CSV
/// files and the JSON summary, and prints Markdown previews to the console.
fn handle_generate_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the input files first (option 1).\n");
        return;
    };

    let mut roles = vec![reports::ALL_ROLES.to_string()];
    roles.extend(reports::distinct_roles(&data));
    let role = choose_from("Select Role", &roles);
    let role_rows = match reports::filter_by_role(&data, &role) {
        Ok(rows) => rows,
        Err(ReportError::EmptySelection { .. }) => {
            println!("No data available for role '{}'.\n", role);
            return;
        }
        Err(e) => {
            eprintln!("Selection error: {}\n", e);
            return;
        }
    };

    println!("\nGenerating reports for role '{}'...", role);
    println!("Outputs saved to individual files...\n");

    let board = reports::scoreboard(&role_rows);
    let file_board = "report3_scoreboard.csv";
    if let Err(e) = output::write_csv(file_board, &board) {
        eprintln!("Write error: {}", e);
    }
    println!("Clinician Scoreboard");
    println!("(Ranked by average cases per shift)\n");
    output::preview_table_rows(&board, 10);
    println!("(Full table exported to {})\n", file_board);

    let cost = reports::daily_role_cost(&role_rows);
    let file_cost = "report4_daily_role_cost.csv";
    if let Err(e) = output::write_csv(file_cost, &cost) {
        eprintln!("Write error: {}", e);
    }
    println!("Daily Hours and Cost by Role\n");
    output::preview_table_rows(&cost, 5);
    println!("(Full table exported to {})\n", file_cost);

    let case_types = reports::case_type_distribution(&role_rows);
    let file_types = "case_type_distribution.csv";
    if let Err(e) = output::write_csv(file_types, &case_types) {
        eprintln!("Write error: {}", e);
    }
    println!("Cases by Type of Case\n");
    output::preview_table_rows(&case_types, 5);
    println!("(Full table exported to {})\n", file_types);

    let clinicians = reports::distinct_clinicians(&role_rows);
    let clinician = choose_from("Select Clinician", &clinicians);
    let clinician_rows = match reports::filter_by_clinician(&role_rows, &role, &clinician) {
        Ok(rows) => rows,
        Err(ReportError::EmptySelection { .. }) => {
            // Role-level sections above still rendered; only the
            // clinician-dependent ones are skipped.
            println!("No data available for the selected clinician.\n");
            return;
        }
        Err(e) => {
            eprintln!("Selection error: {}\n", e);
            return;
        }
    };

    println!("\nPerformance for: {}\n", clinician);

    let load = reports::shift_load(&clinician_rows);
    let file_shift = "report2_shift_load.csv";
    if let Err(e) = output::write_csv(file_shift, &load.decomposition) {
        eprintln!("Write error: {}", e);
    }
    println!("Cases per Shift\n");
    output::preview_table_rows(&load.cases_per_shift, 5);
    println!("Idle and Consulting Time per Shift Instance\n");
    output::preview_table_rows(&load.decomposition, 5);
    println!("(Full table exported to {})\n", file_shift);
    if let Err(e) = output::write_csv("cases_per_shift.csv", &load.cases_per_shift) {
        eprintln!("Write error: {}", e);
    }
    if let Err(e) = output::write_csv("consult_time.csv", &load.consult_time_per_date) {
        eprintln!("Write error: {}", e);
    }
    println!("Average Consulting Time per Shift (minutes)\n");
    output::preview_table_rows(&load.consult_time_per_date, 5);
    println!("Shift Category Distribution\n");
    output::preview_table_rows(&load.shift_category_dist, 5);
    if let Err(e) = output::write_csv("shift_category_distribution.csv", &load.shift_category_dist)
    {
        eprintln!("Write error: {}", e);
    }
    println!("Zone Distribution\n");
    output::preview_table_rows(&load.zone_dist, 5);
    if let Err(e) = output::write_csv("zone_distribution.csv", &load.zone_dist) {
        eprintln!("Write error: {}", e);
    }

    let vpc = reports::value_per_case(&clinician_rows);
    let file_vpc = "report1_value_per_case.csv";
    if let Err(e) = output::write_csv(file_vpc, &vpc) {
        eprintln!("Write error: {}", e);
    }
    println!("Clinician Value Per Case Over Time\n");
    output::preview_table_rows(&vpc, 5);
    println!("(Full table exported to {})\n", file_vpc);

    if let Err(e) = output::write_json("summary.json", &load.summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"avg_cases_per_shift\": {}, \"total_cases\": {}, \"total_shifts\": {}}}\n",
        util::format_number(load.summary.avg_cases_per_shift, 2),
        load.summary.total_cases,
        load.summary.total_shifts
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    loop {
        println!("Clinician Performance Report");
        println!("[1] Load the data files");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
