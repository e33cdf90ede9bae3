//! Line monitor demo - one simulated shift across every production line
//!
//! Run with: cargo run --example line_monitor

use chrono::{Duration, Utc};
use linewatch::{AdapterMode, AppContext, EngineConfig, KpiStatus, LineId};

fn main() {
    let ctx = AppContext::new(EngineConfig::default().with_seed(2025));
    let start = Utc::now();

    println!("=== LineWatch Line Monitor ===");
    println!("Simulating 8 hours at 30 s resolution on {} lines\n", LineId::ALL.len());

    // 8 hours of 30 s ticks
    for step in 0..960i64 {
        let now = start + Duration::seconds(step * 30);
        for line in LineId::ALL {
            ctx.tick(line, AdapterMode::Simulated, now);
        }

        // Hourly status
        if step > 0 && step % 120 == 0 {
            println!("--- Hour {} ---", step / 120);
            for line in LineId::ALL {
                let snapshot = ctx.get_snapshot_at(line, now);
                let critical = ctx
                    .get_insights(&snapshot)
                    .iter()
                    .filter(|i| i.status == KpiStatus::Critical)
                    .count();
                println!(
                    "  {:<22} failure risk {:5.1}%  critical KPIs: {}",
                    line.display_name(),
                    ctx.failure_probability(&snapshot),
                    critical
                );
            }
            println!();
        }
    }

    let end = start + Duration::seconds(960 * 30);

    println!("=== Final Insights ===");
    for line in LineId::ALL {
        let snapshot = ctx.get_snapshot_at(line, end);
        println!("\n{}:", line.display_name());
        for insight in ctx.get_insights(&snapshot) {
            println!(
                "  [{:<9}] {:<16} {:8.2} (Δ {:+.2})  {}",
                insight.status.to_string(),
                insight.kpi.to_string(),
                insight.value,
                insight.delta,
                insight.recommendation
            );
        }
    }

    println!("\n=== Component Risk (top 3) ===");
    for line in LineId::ALL {
        let snapshot = ctx.get_snapshot_at(line, end);
        println!("\n{}:", line.display_name());
        for p in ctx.get_component_risk_ranking(&snapshot, line).iter().take(3) {
            println!(
                "  {:<24} {:5.1}%  ~{}h  {}",
                p.component, p.risk_percent, p.hours_to_failure, p.recommendation
            );
        }
    }

    println!("\n=== Maintenance Windows (14 days) ===");
    for line in LineId::ALL {
        let snapshot = ctx.get_snapshot_at(line, end);
        let schedule = ctx.maintenance_schedule(&snapshot, 14);
        match schedule.best_window() {
            Some(day) => println!(
                "  {:<22} best day {} (risk {:.1}, cost {:.0})",
                line.display_name(),
                day.day,
                day.risk,
                day.total_cost
            ),
            None => println!("  {:<22} no optimal window", line.display_name()),
        }
    }

    println!("\n=== Bottlenecks ===");
    let utilization = ctx.sample_utilization();
    println!("Utilization: {:?}", utilization);
    for b in ctx.get_bottlenecks(&utilization) {
        println!(
            "  {:<10} {:.1}% -> {:.1}% (severity {:.0})",
            b.resource, b.current, b.projected, b.severity
        );
    }

    println!("\n{}", ctx.health_at(end).report());
    println!("{}", ctx.metrics().report());
}
