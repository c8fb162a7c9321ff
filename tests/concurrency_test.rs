// Concurrency tests: serialized mutations, consistent snapshots

use std::sync::Arc;
use std::thread;
use tierfund::campaign::CampaignStatus;
use tierfund::clock::{Clock, ManualClock};
use tierfund::command::{Command, CommandBuilder, CommandError, SignedCommand};
use tierfund::config::LedgerConfig;
use tierfund::identity::{AccountId, Keypair};
use tierfund::registry::{Outcome, Registry};
use tierfund::LedgerError;

#[test]
fn test_concurrent_funding_stops_exactly_at_goal() {
    let registry = Registry::new(Arc::new(ManualClock::new(0)));
    let owner = Keypair::generate().account_id();
    let id = registry.create_campaign(&owner, "Well", "Clean water", 100, 1_000).unwrap();
    registry.add_tier(&id, &owner, "Ten", 10).unwrap();

    let backers: Vec<AccountId> = (0..32).map(|_| Keypair::generate().account_id()).collect();
    let (registry, id) = (&registry, &id);
    let results: Vec<Result<u64, LedgerError>> = thread::scope(|s| {
        let handles: Vec<_> = backers
            .iter()
            .map(|b| s.spawn(move || registry.fund(id, 0, 10, b).map(|r| r.balance_after)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let accepted: Vec<u64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(accepted.len(), 10);
    // Accepted calls observed balances 10, 20, ..., 100 exactly once each
    let mut balances = accepted;
    balances.sort_unstable();
    assert_eq!(balances, (1..=10).map(|i| i * 10).collect::<Vec<_>>());

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err,
            LedgerError::InvalidState { actual: CampaignStatus::Successful, .. }
        ));
    }

    let snap = registry.get_campaign(id).unwrap();
    assert_eq!(snap.balance, 100);
    assert_eq!(snap.tiers[0].backer_count, 10);
    assert_eq!(registry.accounting(id).unwrap(), (100, 100));
}

#[test]
fn test_concurrent_withdraw_pays_once() {
    let registry = Registry::new(Arc::new(ManualClock::new(0)));
    let owner = Keypair::generate().account_id();
    let backer = Keypair::generate().account_id();
    let id = registry.create_campaign(&owner, "Well", "Clean water", 50, 1_000).unwrap();
    registry.add_tier(&id, &owner, "All", 50).unwrap();
    registry.fund(&id, 0, 50, &backer).unwrap();

    let (registry, id, owner) = (&registry, &id, &owner);
    let paid: u64 = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || registry.withdraw(id, owner)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter_map(|r| r.ok())
            .map(|p| p.amount)
            .sum()
    });

    assert_eq!(paid, 50);
    assert_eq!(registry.get_campaign(id).unwrap().balance, 0);
}

#[test]
fn test_snapshots_stay_consistent_during_writes() {
    let registry = Registry::new(Arc::new(ManualClock::new(0)));
    let owner = Keypair::generate().account_id();
    let id = registry.create_campaign(&owner, "Well", "Clean water", 1_000_000, 1_000).unwrap();
    registry.add_tier(&id, &owner, "Five", 5).unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let backer = Keypair::generate().account_id();
                for _ in 0..50 {
                    registry.fund(&id, 0, 5, &backer).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                let snap = registry.get_campaign(&id).unwrap();
                assert_eq!(snap.balance, snap.tiers[0].backer_count * 5);
            }
        });
    });

    assert_eq!(registry.get_campaign(&id).unwrap().balance, 1_000);
}

#[test]
fn test_concurrent_creation_keeps_indexes_in_sync() {
    let registry = Registry::new(Arc::new(ManualClock::new(0)));
    let owners: Vec<AccountId> = (0..4).map(|_| Keypair::generate().account_id()).collect();

    thread::scope(|s| {
        for owner in &owners {
            let registry = &registry;
            s.spawn(move || {
                for i in 0..10 {
                    registry
                        .create_campaign(owner, &format!("C{i}"), "desc", 10, 5)
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(registry.get_all_campaigns().len(), 40);
    let mut per_owner: usize = 0;
    for owner in &owners {
        let ids = registry.get_user_campaigns(owner);
        assert_eq!(ids.len(), 10);
        per_owner += ids.len();
    }
    assert_eq!(per_owner, 40);
}

fn submit_copies(registry: &Registry, cmd: &SignedCommand, copies: usize) -> Vec<Result<Outcome, CommandError>> {
    let config = LedgerConfig::default();
    let config = &config;
    thread::scope(|s| {
        let handles: Vec<_> = (0..copies)
            .map(|_| s.spawn(move || registry.execute(cmd, config)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn test_copies_of_signed_fund_apply_once() {
    let clock = Arc::new(ManualClock::new(1_000));
    let registry = Registry::new(clock.clone());
    let owner = Keypair::generate();
    let backer = Keypair::generate();
    let id = registry
        .create_campaign(&owner.account_id(), "Well", "Clean water", 100, 1_000)
        .unwrap();
    registry.add_tier(&id, &owner.account_id(), "Ten", 10).unwrap();

    let fund = CommandBuilder::new()
        .signer(&backer)
        .command(Command::Fund {
            campaign: id.clone(),
            tier_index: 0,
            amount: 10,
        })
        .timestamp(clock.now())
        .build()
        .unwrap();

    let results = submit_copies(&registry, &fund, 8);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err, &CommandError::Replay(fund.id()));
    }
    assert_eq!(registry.accounting(&id).unwrap(), (10, 10));
}

#[test]
fn test_copies_of_signed_create_make_one_campaign() {
    let clock = Arc::new(ManualClock::new(1_000));
    let registry = Registry::new(clock.clone());
    let owner = Keypair::generate();

    let create = CommandBuilder::new()
        .signer(&owner)
        .command(Command::CreateCampaign {
            name: "Well".into(),
            description: "Clean water".into(),
            goal: 100,
            duration: 1_000,
        })
        .timestamp(clock.now())
        .build()
        .unwrap();

    let results = submit_copies(&registry, &create, 8);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(registry.campaign_count(), 1);
    assert_eq!(registry.applied_command_count(), 1);
}
