// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ffix-dump - Record layout and operation vector inspector
//!
//! Prints what the compiler actually did with the fixture records on this
//! target, and replays the operation vectors end to end:
//! - `layout`: size, alignment, flattened scalar offsets, and padding gaps
//!   per record, as a table or as JSON for diffing against a C compiler
//! - `vectors`: runs every fixture operation against its known
//!   input/output pairs and reports pass/fail

use clap::{Parser, Subcommand};
use colored::*;
use ffix::fixture::{
    add, decrement, layouts, sum_inner, sum_outer, swap_pair, touch_big_outer, BigOuter, Inner,
    Outer, PairNarrow,
};
use ffix::layout::report::LayoutReport;

#[derive(Parser, Debug)]
#[command(name = "ffix-dump")]
#[command(version = "0.1.0")]
#[command(about = "Inspect fixture record layouts and replay operation vectors")]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Dump size, alignment, scalar offsets, and padding of each record
    Layout {
        /// Emit one JSON object per record instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Replay the operation vectors and report pass/fail
    Vectors,
}

fn main() {
    // Initialize logger for RUST_LOG-based debug output
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    match &args.mode {
        Mode::Layout { json } => run_layout(*json),
        Mode::Vectors => run_vectors(),
    }
}

// =============================================================================
// Layout dump
// =============================================================================

fn run_layout(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    for layout in layouts() {
        let report = LayoutReport::of(layout);
        if json {
            print_json_report(&report);
        } else {
            print_report(&report);
        }
    }
    Ok(())
}

fn print_report(report: &LayoutReport) {
    println!();
    println!("{}", format!("=== {} ===", report.type_name).bold());
    println!(
        "  {} {} bytes   {} {} bytes   {} {} bytes",
        "size:".cyan(),
        report.size,
        "align:".cyan(),
        report.alignment,
        "padding:".cyan(),
        report.padding_bytes()
    );
    println!();
    println!(
        "{}",
        format!("  {:>6}  {:>5}  {:<5}  {}", "offset", "width", "kind", "path").bold()
    );
    for row in &report.rows {
        println!(
            "  {:>6}  {:>5}  {:<5}  {}",
            row.offset,
            row.kind.size_bytes(),
            row.kind.name(),
            row.path
        );
    }
    for gap in &report.gaps {
        println!(
            "  {}",
            format!(
                "{:>6}  {:>5}  pad    [{}..{})",
                gap.start,
                gap.len,
                gap.start,
                gap.end()
            )
            .dimmed()
        );
    }
}

fn print_json_report(report: &LayoutReport) {
    let scalars: Vec<String> = report
        .rows
        .iter()
        .map(|row| {
            format!(
                r#"{{"path":"{}","offset":{},"width":{},"kind":"{}"}}"#,
                row.path,
                row.offset,
                row.kind.size_bytes(),
                row.kind.name()
            )
        })
        .collect();
    let gaps: Vec<String> = report
        .gaps
        .iter()
        .map(|gap| format!(r#"{{"start":{},"len":{}}}"#, gap.start, gap.len))
        .collect();

    println!(
        r#"{{"type":"{}","size":{},"alignment":{},"padding_bytes":{},"scalars":[{}],"gaps":[{}]}}"#,
        report.type_name,
        report.size,
        report.alignment,
        report.padding_bytes(),
        scalars.join(","),
        gaps.join(",")
    );
}

// =============================================================================
// Operation vectors
// =============================================================================

fn run_vectors() -> Result<(), Box<dyn std::error::Error>> {
    let mut failures = 0u32;

    println!();
    println!("{}", "=== Operation Vectors ===".bold());

    let swapped = swap_pair(PairNarrow { a: 1, b: 2, c: 3, d: 4 });
    check(
        "swap_pair {1,2,3,4} -> {3,4,1,2}",
        swapped == PairNarrow { a: 3, b: 4, c: 1, d: 2 },
        &mut failures,
    );
    check(
        "swap_pair twice restores the input",
        swap_pair(swapped) == PairNarrow { a: 1, b: 2, c: 3, d: 4 },
        &mut failures,
    );

    check("decrement 15 -> 5", decrement(15) == 5, &mut failures);
    check("decrement 10 -> 0", decrement(10) == 0, &mut failures);
    check(
        "decrement 5 -> 4294967291",
        decrement(5) == 4_294_967_291,
        &mut failures,
    );
    check(
        "decrement 0 -> 4294967286",
        decrement(0) == 4_294_967_286,
        &mut failures,
    );

    check(
        "sum_inner {7,8} -> 15",
        sum_inner(Inner { a: 7, b: 8 }) == 15,
        &mut failures,
    );
    check(
        "sum_inner wraps at u32::MAX",
        sum_inner(Inner { a: u32::MAX, b: 1 }) == 0,
        &mut failures,
    );

    check("add 4294967290 10 -> 4", add(4_294_967_290, 10) == 4, &mut failures);
    check("add commutes", add(10, 4_294_967_290) == 4, &mut failures);

    let outer = Outer {
        a: Inner { a: 1, b: 2 },
        b: Inner { a: 3, b: 4 },
    };
    check("sum_outer {{1,2},{3,4}} -> 10", sum_outer(outer) == 10, &mut failures);

    touch_big_outer(BigOuter {
        a: outer,
        troll_a: 0xAA,
        troll_b: 0x55,
        b: outer,
    });
    check("touch_big_outer accepts a full record by value", true, &mut failures);

    println!();
    if failures > 0 {
        return Err(format!("{failures} vector(s) failed").into());
    }
    println!("{} all vectors passed", "ok:".green().bold());
    Ok(())
}

fn check(label: &str, ok: bool, failures: &mut u32) {
    if ok {
        println!("  {}  {}", "PASS".green(), label);
    } else {
        println!("  {}  {}", "FAIL".red().bold(), label);
        *failures += 1;
    }
}
