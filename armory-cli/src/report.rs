//! Human and JSON rendering of scan outcomes.

use anyhow::Result;
use serde::Serialize;

use armory_core::scan::{ScanDiagnostic, ScanResult};

#[derive(Serialize)]
struct ScanReport<'a> {
    extensions: Vec<&'a str>,
    diagnostics: &'a [ScanDiagnostic],
}

pub fn print_scan(result: &ScanResult, json: bool) -> Result<()> {
    if json {
        let report = ScanReport {
            extensions: result.keywords(),
            diagnostics: &result.diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} extension(s), {} diagnostic(s)",
        result.extensions.len(),
        result.diagnostics.len()
    );
    for descriptor in &result.extensions {
        println!("  + {}", descriptor.keyword);
    }
    for diagnostic in &result.diagnostics {
        println!("  ! {}: {:?}", diagnostic.unit, diagnostic.kind);
    }

    Ok(())
}
