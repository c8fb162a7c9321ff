// Signed command tests: authentication, freshness, replay and wire codec

use std::sync::Arc;
use tierfund::campaign::CampaignStatus;
use tierfund::clock::{Clock, ManualClock};
use tierfund::command::{
    Command, CommandBuilder, CommandCodec, CommandError, CommandValidationError, SignedCommand,
};
use tierfund::config::LedgerConfig;
use tierfund::identity::Keypair;
use tierfund::registry::{CampaignId, Outcome, Registry};
use tierfund::LedgerError;

const START: u64 = 1_000_000;

fn setup() -> (Arc<ManualClock>, Registry, LedgerConfig) {
    let clock = Arc::new(ManualClock::new(START));
    let registry = Registry::new(clock.clone());
    (clock, registry, LedgerConfig::default())
}

fn sign(keypair: &Keypair, clock: &ManualClock, command: Command) -> SignedCommand {
    CommandBuilder::new()
        .signer(keypair)
        .command(command)
        .timestamp(clock.now())
        .build()
        .unwrap()
}

fn create(registry: &Registry, clock: &ManualClock, config: &LedgerConfig, owner: &Keypair) -> CampaignId {
    let cmd = sign(
        owner,
        clock,
        Command::CreateCampaign {
            name: "Bikes".into(),
            description: "Shared bikes".into(),
            goal: 100,
            duration: 600,
        },
    );
    match registry.execute(&cmd, config).unwrap() {
        Outcome::Created(id) => id,
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_signed_flow_uses_signer_as_caller() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let backer = Keypair::generate();
    let id = create(&registry, &clock, &config, &owner);

    assert_eq!(registry.get_user_campaigns(&owner.account_id()), vec![id.clone()]);

    let add = sign(
        &owner,
        &clock,
        Command::AddTier {
            campaign: id.clone(),
            name: "Rider".into(),
            target_amount: 100,
        },
    );
    assert_eq!(registry.execute(&add, &config).unwrap(), Outcome::TierAdded(0));

    let fund = sign(
        &backer,
        &clock,
        Command::Fund {
            campaign: id.clone(),
            tier_index: 0,
            amount: 100,
        },
    );
    match registry.execute(&fund, &config).unwrap() {
        Outcome::Funded(receipt) => {
            assert_eq!(receipt.backer, backer.account_id());
            assert_eq!(receipt.status_after, CampaignStatus::Successful);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    // The backer cannot withdraw; the owner can
    let stolen = sign(&backer, &clock, Command::Withdraw { campaign: id.clone() });
    assert!(matches!(
        registry.execute(&stolen, &config),
        Err(CommandError::Rejected(LedgerError::Forbidden { .. }))
    ));
    let withdraw = sign(&owner, &clock, Command::Withdraw { campaign: id });
    match registry.execute(&withdraw, &config).unwrap() {
        Outcome::Withdrawn(payout) => assert_eq!(payout.amount, 100),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_replayed_command_is_rejected() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let backer = Keypair::generate();
    let id = create(&registry, &clock, &config, &owner);
    registry.add_tier(&id, &owner.account_id(), "Rider", 10).unwrap();

    let fund = sign(
        &backer,
        &clock,
        Command::Fund {
            campaign: id.clone(),
            tier_index: 0,
            amount: 10,
        },
    );
    registry.execute(&fund, &config).unwrap();

    assert_eq!(
        registry.execute(&fund, &config).unwrap_err(),
        CommandError::Replay(fund.id())
    );
    assert_eq!(registry.get_campaign(&id).unwrap().balance, 10);
}

#[test]
fn test_applied_ids_are_forgotten_once_expired() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();

    for i in 0..50 {
        let cmd = sign(
            &owner,
            &clock,
            Command::CreateCampaign {
                name: format!("Bikes {i}"),
                description: "Shared bikes".into(),
                goal: 100,
                duration: 600,
            },
        );
        registry.execute(&cmd, &config).unwrap();
        clock.advance(config.command_max_age_secs + 1);
    }

    assert_eq!(registry.campaign_count(), 50);
    assert!(registry.applied_command_count() <= 1);
}

#[test]
fn test_replay_rejected_until_freshness_window_closes() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let cmd = sign(
        &owner,
        &clock,
        Command::CreateCampaign {
            name: "Bikes".into(),
            description: "Shared bikes".into(),
            goal: 100,
            duration: 600,
        },
    );
    registry.execute(&cmd, &config).unwrap();

    // Last second of the window
    clock.advance(config.command_max_age_secs);
    assert_eq!(
        registry.execute(&cmd, &config).unwrap_err(),
        CommandError::Replay(cmd.id())
    );

    clock.advance(1);
    assert!(matches!(
        registry.execute(&cmd, &config),
        Err(CommandError::Invalid(CommandValidationError::Expired { .. }))
    ));
    assert_eq!(registry.campaign_count(), 1);
}

#[test]
fn test_rejected_command_can_be_resubmitted() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let id = create(&registry, &clock, &config, &owner);

    let add = sign(
        &owner,
        &clock,
        Command::AddTier {
            campaign: id.clone(),
            name: "Rider".into(),
            target_amount: 10,
        },
    );
    // Fill the name first so the signed command collides
    registry.add_tier(&id, &owner.account_id(), "Rider", 10).unwrap();
    assert!(matches!(
        registry.execute(&add, &config),
        Err(CommandError::Rejected(LedgerError::InvalidParameters(_)))
    ));

    registry.remove_tier(&id, &owner.account_id(), 0).unwrap();
    assert_eq!(registry.execute(&add, &config).unwrap(), Outcome::TierAdded(0));
}

#[test]
fn test_tampered_command_fails_signature_check() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let mallory = Keypair::generate();

    let genuine = sign(
        &owner,
        &clock,
        Command::CreateCampaign {
            name: "Bikes".into(),
            description: "Shared bikes".into(),
            goal: 100,
            duration: 600,
        },
    );
    // Re-sign the same envelope body under another caller's signature
    let forged_sig = sign(&mallory, &clock, genuine.envelope().command().clone());
    let forged = SignedCommand::from_parts(genuine.envelope().clone(), forged_sig.signature().clone());

    assert_eq!(
        registry.execute(&forged, &config).unwrap_err(),
        CommandError::Invalid(CommandValidationError::InvalidSignature)
    );
    assert_eq!(registry.campaign_count(), 0);
}

#[test]
fn test_stale_and_future_commands_rejected() {
    let (clock, registry, config) = setup();
    let owner = Keypair::generate();
    let command = Command::CreateCampaign {
        name: "Bikes".into(),
        description: "Shared bikes".into(),
        goal: 100,
        duration: 600,
    };

    let stale = CommandBuilder::new()
        .signer(&owner)
        .command(command.clone())
        .timestamp(START - config.command_max_age_secs - 1)
        .build()
        .unwrap();
    assert!(matches!(
        registry.execute(&stale, &config),
        Err(CommandError::Invalid(CommandValidationError::Expired { .. }))
    ));

    let future = CommandBuilder::new()
        .signer(&owner)
        .command(command)
        .timestamp(clock.now() + config.command_future_tolerance_secs + 1)
        .build()
        .unwrap();
    assert!(matches!(
        registry.execute(&future, &config),
        Err(CommandError::Invalid(CommandValidationError::FutureTimestamp { .. }))
    ));
}

#[test]
fn test_custom_freshness_window_is_honoured() {
    let (clock, registry, _) = setup();
    let config = LedgerConfig::default()
        .with_command_max_age_secs(10)
        .with_command_future_tolerance_secs(0);
    let owner = Keypair::generate();
    let command = Command::CreateCampaign {
        name: "Bikes".into(),
        description: "Shared bikes".into(),
        goal: 100,
        duration: 600,
    };

    let ahead = CommandBuilder::new()
        .signer(&owner)
        .command(command.clone())
        .timestamp(clock.now() + 1)
        .build()
        .unwrap();
    assert!(matches!(
        registry.execute(&ahead, &config),
        Err(CommandError::Invalid(CommandValidationError::FutureTimestamp { .. }))
    ));

    let signed = sign(&owner, &clock, command);
    clock.advance(11);
    assert!(matches!(
        registry.execute(&signed, &config),
        Err(CommandError::Invalid(CommandValidationError::Expired { .. }))
    ));
    assert_eq!(registry.campaign_count(), 0);
}

#[test]
fn test_builder_requires_signer_and_command() {
    let owner = Keypair::generate();
    assert_eq!(
        CommandBuilder::new()
            .command(Command::Refund {
                campaign: CampaignId::from_bytes([0u8; 32])
            })
            .build()
            .unwrap_err(),
        CommandError::MissingSigner
    );
    assert_eq!(
        CommandBuilder::new().signer(&owner).build().unwrap_err(),
        CommandError::MissingCommand
    );
}

#[test]
fn test_codec_text_forms_preserve_signature() {
    let clock = ManualClock::new(START);
    let backer = Keypair::generate();
    let cmd = sign(
        &backer,
        &clock,
        Command::Fund {
            campaign: CampaignId::from_bytes([5u8; 32]),
            tier_index: 2,
            amount: 300,
        },
    );

    let from_b64 = CommandCodec::decode_base64(&CommandCodec::encode_base64(&cmd).unwrap()).unwrap();
    let from_hex = CommandCodec::decode_hex(&CommandCodec::encode_hex(&cmd).unwrap()).unwrap();

    assert_eq!(from_b64, cmd);
    assert_eq!(from_hex.id(), cmd.id());
    assert!(from_b64.verify());
    assert!(CommandCodec::decode(b"garbage").is_err());
    assert!(CommandCodec::decode_hex("zz").is_err());
}
