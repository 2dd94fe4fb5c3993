// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

// Use library instead of local modules
use group_savings::{Group, SavingsLedger, SnapshotStore, TierCatalog};

fn snapshot_path() -> PathBuf {
    PathBuf::from("data/group.json")
}

fn tiers_path() -> PathBuf {
    PathBuf::from("data/tiers.json")
}

/// External tier configuration wins when present; otherwise the reference
/// catalog is used
fn load_catalog() -> Result<TierCatalog> {
    let path = tiers_path();
    if path.exists() {
        let catalog = TierCatalog::from_json_file(&path)?;
        println!("✓ Loaded {} tiers from {:?}", catalog.count(), path);
        Ok(catalog)
    } else {
        Ok(TierCatalog::new())
    }
}

fn load_state() -> Result<(SavingsLedger, Group, SnapshotStore)> {
    let ledger = SavingsLedger::with_catalog(load_catalog()?);
    let store = SnapshotStore::new(snapshot_path());
    let group = store.load();
    Ok((ledger, group, store))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("demo") => run_demo()?,
        Some("join") => {
            if args.len() < 4 {
                bail!("Usage: group-savings join <name> <tier-id>");
            }
            let tier_id: u32 = args[3]
                .parse()
                .map_err(|_| anyhow::anyhow!("Tier id must be a positive integer"))?;
            run_join(&args[2], tier_id)?;
        }
        Some("week") => run_week()?,
        Some("withdraw") => {
            if args.len() < 3 {
                bail!("Usage: group-savings withdraw <member-id>");
            }
            run_withdraw(&args[2])?;
        }
        Some("summary") => run_summary()?,
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!(
                "Commands: demo | join <name> <tier-id> | week | withdraw <member-id> | summary"
            );
            std::process::exit(1);
        }
        None => run_ui_mode()?,
    }

    Ok(())
}

fn run_demo() -> Result<()> {
    println!("🏦 Group Savings - Ledger Walkthrough");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let ledger = SavingsLedger::new();
    let group = Group::empty();

    // 1. Admission
    println!("\n👤 Admitting members...");
    let (group, ada) = ledger.admit(&group, "demo-user-001", "Ada", 2)?;
    let (group, lin) = ledger.admit(&group, "demo-user-002", "Lin", 1)?;
    println!("✓ Ada joined Tier 2 with balance {:.2}", ada.current_balance);
    println!("✓ Lin joined Tier 1 with balance {:.2}", lin.current_balance);

    // 2. Weekly compounding
    println!("\n📈 Advancing two weeks...");
    let group = ledger.advance_week(&group);
    let group = ledger.advance_week(&group);
    for member in &group.members {
        println!(
            "✓ {} — balance {:.2}, interest {:.2}, weeks {}",
            member.name,
            member.current_balance,
            member.accumulated_interest,
            member.weeks_participated
        );
    }

    // 3. Aggregation
    println!("\n📊 Group totals (week {}):", group.current_week);
    let totals = ledger.aggregate(&group);
    println!("✓ {}", totals.summary());

    // 4. Withdrawal
    println!("\n💸 Ada withdraws...");
    let (group, withdrawn) = ledger.withdraw(&group, &ada.id);
    println!("✓ Paid out {:.2}", withdrawn);
    println!("✓ {} member(s) remain", group.member_count());

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Walkthrough complete");

    Ok(())
}

fn run_join(name: &str, tier_id: u32) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Member name must not be empty");
    }

    let (ledger, group, store) = load_state()?;

    let (group, member) = ledger.admit(&group, "cli-user", name, tier_id)?;
    store.save(&group)?;

    println!(
        "✓ {} joined tier {} with balance {:.2}",
        member.name, member.tier_id, member.current_balance
    );
    println!("  member id: {}", member.id);

    Ok(())
}

fn run_week() -> Result<()> {
    let (ledger, group, store) = load_state()?;

    let group = ledger.advance_week(&group);
    store.save(&group)?;

    println!("✓ Advanced to week {}", group.current_week);
    for member in &group.members {
        println!(
            "  {} — balance {:.2}, interest to date {:.2}",
            member.name, member.current_balance, member.accumulated_interest
        );
    }

    Ok(())
}

fn run_withdraw(member_id: &str) -> Result<()> {
    let (ledger, group, store) = load_state()?;

    if !group.contains_member(member_id) {
        println!("✓ No member with id {} — nothing withdrawn", member_id);
        return Ok(());
    }

    let (group, withdrawn) = ledger.withdraw(&group, member_id);
    store.save(&group)?;

    println!("✓ Withdrew {:.2}", withdrawn);
    println!("✓ {} member(s) remain", group.member_count());

    Ok(())
}

fn run_summary() -> Result<()> {
    let (ledger, group, _) = load_state()?;

    println!(
        "📊 Week {}, {} member(s)",
        group.current_week,
        group.member_count()
    );
    for member in &group.members {
        println!(
            "  {} [{}] tier {} — balance {:.2}, interest {:.2}, weeks {}",
            member.name,
            member.id,
            member.tier_id,
            member.current_balance,
            member.accumulated_interest,
            member.weeks_participated
        );
    }

    let totals = ledger.aggregate(&group);
    println!("  Totals: {}", totals.summary());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Loading Group Savings UI...\n");

    let (ledger, group, store) = load_state()?;

    if group.member_count() == 0 && group.current_week == 0 {
        println!("📂 No snapshot yet — starting with an empty group");
    }

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(ledger, group, store);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin savings-server --features server");
    std::process::exit(1);
}
