use anyhow::Context;
use chrono::NaiveDate;
use sales_metrics_engine::*;

fn sample_store() -> anyhow::Result<RecordStore> {
    let deals = r#"[
        {"deal_id": "D001", "amount": 42000, "stage": "Closed Won", "rep_id": "R01",
         "created_at": "2025-11-03", "closed_at": "2026-01-21"},
        {"deal_id": "D002", "amount": 18500, "stage": "Closed Won", "rep_id": "R02",
         "created_at": "2025-10-12", "closed_at": "2025-12-09"},
        {"deal_id": "D003", "amount": 9000, "stage": "Closed Lost", "rep_id": "R02",
         "created_at": "2025-08-01", "closed_at": "2025-10-30"},
        {"deal_id": "D004", "amount": 75000, "stage": "Negotiation", "rep_id": "R01",
         "created_at": "2025-09-18", "closed_at": null},
        {"deal_id": "D005", "amount": 23000, "stage": "Proposal", "rep_id": "R03",
         "created_at": "2026-01-08", "closed_at": null}
    ]"#;
    let reps = r#"[
        {"rep_id": "R01", "name": "Avery Lane"},
        {"rep_id": "R02", "name": "Jordan Pike"}
    ]"#;
    let targets = r#"[
        {"month": "2025-01", "target": 60000},
        {"month": "2025-02", "target": 60000},
        {"month": "2025-03", "target": 75000},
        {"month": "2025-10", "target": 55000},
        {"month": "2025-11", "target": 55000},
        {"month": "2025-12", "target": 70000}
    ]"#;

    Ok(RecordStore::from_json_parts(
        None,
        Some(reps),
        Some(deals),
        None,
        Some(targets),
    )?)
}

fn main() -> anyhow::Result<()> {
    let store = match std::env::args().nth(1) {
        Some(dir) => load_record_store(&dir)
            .with_context(|| format!("loading records from {}", dir))?,
        None => sample_store()?,
    };

    let anchor_date = NaiveDate::from_ymd_opt(2026, 2, 5).context("invalid anchor date")?;
    let anchor = anchor_from_date(anchor_date);

    println!("📊 Sales dashboard as of {}\n", anchor.date_naive());

    for issue in store.validate() {
        println!("  ⚠️  {:?}", issue);
    }

    let report = compute_dashboard(&store, anchor)?;

    println!(
        "Revenue {:.0} vs target {:.0} ({})",
        report.summary.revenue, report.summary.target, report.summary.message
    );
    println!(
        "Pipeline {:.0} | Win rate {}% | Avg deal {} | Cycle {} days",
        report.drivers.pipeline_value,
        report.drivers.win_rate,
        report.drivers.avg_deal_size,
        report.drivers.sales_cycle_days
    );

    println!("\nRisks:");
    for risk in &report.risks {
        println!("  - {}", risk.message);
    }

    println!("\nRecommended actions:");
    for rec in &report.recommendations {
        println!("  ✓ {}", rec);
    }

    println!("\nTrend:");
    for point in &report.trend {
        println!("  {}  revenue {:>8}  target {:>8}", point.month, point.revenue, point.target);
    }

    println!("\n{}", report.to_json_pretty()?);
    Ok(())
}
