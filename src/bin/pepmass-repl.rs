use std::fmt::Write;

use anyhow::{Result, anyhow};
use clap::Parser;
use miette::GraphicalTheme;
use oligomer::{Calculator, IonSeries};
use pepmass::{config::TableArgs, render_report, render_themed_report};
use rustyline::{DefaultEditor, error::ReadlineError};

/// Interactively calculates the features of PNA and peptide sequences
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    table: TableArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let table = args.table.load_table().map_err(|e| anyhow!(render_report(&e)))?;
    let calculator = Calculator::new(&table)
        .map_err(|e| anyhow!(render_report(&e)))?
        .with_unknown_policy(args.table.unknown_policy());

    let mut rl = DefaultEditor::new()?;
    loop {
        let sequence = match rl.readline("Sequence: ") {
            Ok(sequence) => sequence,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        rl.add_history_entry(&sequence)?;
        match sequence_info(&calculator, &sequence) {
            Ok(info) => print!("{info}"),
            Err(diagnostic) => println!("{}", render_themed_report(&diagnostic, GraphicalTheme::unicode())),
        }
    }
    Ok(())
}

fn sequence_info(calculator: &Calculator, sequence: &str) -> oligomer::Result<String> {
    let features = calculator.features(sequence)?;

    // NOTE: Writing to a `String` can't fail, so these results are safe to ignore
    let mut buf = String::new();
    let _ = writeln!(buf, "MolWt: {}", features.mol_wt);
    let _ = writeln!(buf, "Exact: {}", features.exact);
    let _ = writeln!(buf, "Formula: {}", features.formula);
    write_ions(&mut buf, "HPLC-SIM Ions", &features.sim_ions);
    write_ions(&mut buf, "MolWt Ions", &features.mol_wt_ions);
    write_ions(&mut buf, "HRMS Ions", &features.hrms_ions);

    if !features.termination_sequences.is_empty() {
        let _ = writeln!(buf, "Termination Sequences:");
    }
    for row in &features.termination_sequences {
        let _ = writeln!(
            buf,
            "  {:>3}  {}  (-H: {} / {}, -Ac: {} / {})",
            row.index, row.sequence, row.mol_wt, row.exact, row.capped_mol_wt, row.capped_exact
        );
    }
    let _ = writeln!(buf);

    Ok(buf)
}

fn write_ions(buf: &mut String, title: &str, ions: &IonSeries) {
    let ions: Vec<_> = ions.iter().map(|(z, mz)| format!("[M+{z}H]{z}+ {mz}")).collect();
    if ions.is_empty() {
        let _ = writeln!(buf, "{title}: none in range");
    } else {
        let _ = writeln!(buf, "{title}: {}", ions.join(", "));
    }
}
