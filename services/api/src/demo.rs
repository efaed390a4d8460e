use crate::infra::{seed_demo_data, SEED_ADMIN, SEED_DONORS};
use chrono::{DateTime, Utc};
use clap::Args;
use food_rescue::config::MatchingConfig;
use food_rescue::donations::{
    CallerContext, DonationError, DonationService, FixedClock, FixedDistance,
    MemoryDonationStore, RankedDonation,
};
use food_rescue::error::AppError;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Distance assumed between every donation and claimant, in kilometres.
    #[arg(long)]
    pub(crate) distance_km: Option<f64>,
    /// Pin the demo clock (RFC 3339, e.g. 2025-06-02T18:30:00Z). Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Food search applied to the marketplace step.
    #[arg(long)]
    pub(crate) search: Option<String>,
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        distance_km,
        at,
        search,
    } = args;

    let settings = MatchingConfig::default();
    let distance_km = distance_km.unwrap_or(settings.placeholder_distance_km);
    let at = at.unwrap_or_else(Utc::now);
    let service = DonationService::with_clock(
        Arc::new(MemoryDonationStore::new()),
        Arc::new(FixedDistance(distance_km)),
        settings,
        Arc::new(FixedClock(at)),
    );

    println!("Food rescue demo ({})", at.format("%Y-%m-%d %H:%M UTC"));
    let seeded = seed_demo_data(&service)?;
    println!(
        "- Seeded {} verified claimants and {} pending donations (distance fixed at {:.1} km)",
        seeded.claimants.len(),
        seeded.donations.len(),
        distance_km
    );

    let Some((claimant_id, claimant_name)) = seeded.claimants.first().cloned() else {
        println!("  No claimants available");
        return Ok(());
    };
    let ngo = CallerContext::claimant(claimant_id);

    println!("\nTop matches for {claimant_name}");
    let overview = service.overview(&ngo)?;
    render_ranking(&overview);

    if let Some(needle) = search.as_deref() {
        println!("\nMarketplace search for '{needle}'");
        render_ranking(&service.browse(&ngo, needle)?);
    }

    let Some(best) = overview.first() else {
        println!("\nNothing left to claim");
        return Ok(());
    };
    let request_id = service.claim(&ngo, best.donation.id)?;
    println!(
        "\n- {claimant_name} claimed donation #{} -> request #{request_id}",
        best.donation.id
    );

    if let Some((rival_id, rival_name)) = seeded.claimants.get(1) {
        match service.claim(&CallerContext::claimant(*rival_id), best.donation.id) {
            Err(DonationError::AlreadyClaimed(_)) => {
                println!("  {rival_name} tried the same donation and was turned away")
            }
            Err(err) => println!("  Rival claim failed unexpectedly: {err}"),
            Ok(id) => println!("  Rival claim unexpectedly succeeded with request #{id}"),
        }
    }

    let pickup = service.verify_pickup(&ngo, request_id)?;
    println!(
        "- QR scan for request #{request_id} verified the pickup at {}",
        pickup
            .verified_at
            .map(|instant| instant.format("%H:%M").to_string())
            .unwrap_or_else(|| "unknown time".to_string())
    );

    let donor_view = service.donor_overview(&SEED_DONORS[0])?;
    println!("\nDonor snapshot: {} donations", donor_view.total_donations);
    for (status, count) in &donor_view.status_distribution {
        println!("  - {status}: {count}");
    }

    let admin_view = service.admin_overview(&SEED_ADMIN)?;
    println!(
        "\nAdmin KPIs: {} donations today | {} live requests | {:.2}% pickups verified",
        admin_view.kpis.donations_today,
        admin_view.kpis.live_requests,
        admin_view.kpis.fulfillment_rate
    );
    if admin_view.alerts.is_empty() {
        println!("  Alerts: none");
    } else {
        println!("  Alerts:");
        for alert in &admin_view.alerts {
            println!("    - {}", alert.message);
        }
    }

    Ok(())
}

fn render_ranking(ranked: &[RankedDonation]) {
    if ranked.is_empty() {
        println!("  (no pending donations)");
        return;
    }
    for entry in ranked {
        println!(
            "  - #{} {} ({}) expires in {}h | score {:.1}",
            entry.donation.id,
            entry.donation.food_type,
            entry.donation.quantity,
            entry.donation.expiry_hours,
            entry.priority_score
        );
    }
}
