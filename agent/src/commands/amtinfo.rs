//! `pma amtinfo`: run the AMT tool once and print what it reports.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::AgentContext;
use crate::application::ports::ToolExecutor;
use crate::domain::{AmtFeatures, AmtSnapshot, RasRemoteStatus};

#[derive(Serialize)]
struct AmtInfoView {
    driver_present: bool,
    features: AmtFeatures,
    feature_label: &'static str,
    ras_remote_status: RasRemoteStatus,
    control_mode: Option<String>,
    provisioned: bool,
    exit_code: Option<i32>,
}

impl AmtInfoView {
    fn new(snapshot: AmtSnapshot, exit_code: Option<i32>) -> Self {
        Self {
            driver_present: snapshot.driver_present,
            features: snapshot.features,
            feature_label: snapshot.features.report_label(),
            ras_remote_status: snapshot.ras_remote_status,
            provisioned: snapshot.provisioned(),
            control_mode: snapshot.control_mode,
            exit_code,
        }
    }
}

/// Run the amtinfo command.
///
/// # Errors
///
/// Returns an error if the tool cannot be run or JSON encoding fails.
pub async fn run(app: &AgentContext, json: bool) -> Result<ExitCode> {
    let output = app.tools().amtinfo().await.context("running amtinfo")?;
    let succeeded = output.is_success();
    let view = AmtInfoView::new(AmtSnapshot::parse(&output.output), output.exit_code);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).context("JSON serialization")?
        );
    } else {
        print_human(&view);
    }

    Ok(if succeeded || !view.driver_present {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_human(view: &AmtInfoView) {
    if !view.driver_present {
        println!("AMT driver not detected");
        return;
    }
    let label = if view.feature_label.is_empty() {
        "-"
    } else {
        view.feature_label
    };
    println!("Features:          {:?} ({label})", view.features);
    println!("RAS Remote Status: {}", view.ras_remote_status);
    println!(
        "Control Mode:      {}",
        view.control_mode.as_deref().unwrap_or("-")
    );
    println!("Provisioned:       {}", if view.provisioned { "yes" } else { "no" });
    if let Some(code) = view.exit_code.filter(|c| *c != 0) {
        println!("Tool exit code:    {code}");
    }
}
