use p2e_economics::{EconomicsError, Stage, TokenomicsConfig};
use p2e_treasury::*;
use p2e_types::{FixedPoint, Principal, SCALE};
use proptest::prelude::*;

fn owner() -> Principal {
    Principal::from_label("owner")
}

fn treasury() -> Principal {
    Principal::from_label("treasury")
}

fn player() -> Principal {
    Principal::from_label("player")
}

fn vesting() -> Principal {
    Principal::from_label("vesting")
}

/// Default tokenomics scaled down to whole-token units.
fn config() -> TokenomicsConfig {
    TokenomicsConfig {
        max_total_supply: 1_000_000,
        ..TokenomicsConfig::default()
    }
}

fn deploy_linear() -> PlayToken<InMemoryTokenLedger, LinearReleaseSchedule> {
    PlayToken::new(&config(), InMemoryTokenLedger::new())
        .unwrap()
        .with_release_schedule(LinearReleaseSchedule::new(vesting()))
        .unwrap()
}

fn deploy_mock() -> PlayToken<MockTokenLedger, MockReleaseSchedule> {
    PlayToken::new(&config(), MockTokenLedger::new())
        .unwrap()
        .with_release_schedule(MockReleaseSchedule::new(vesting()))
        .unwrap()
}

#[test]
fn test_default_deployment_layout() {
    let token = deploy_linear();
    assert_eq!(token.ledger().buckets().len(), 5);
    assert_eq!(token.reward_bucket_state().unwrap().cap, 400_000);
    assert_eq!(token.stages().len(), 4);
    assert_eq!(token.fee_rate(), FixedPoint::from_percent(5));
    assert_eq!(token.gate().treasury(), Some(treasury()));
}

#[test]
fn test_vested_grant_end_to_end() {
    let mut token = deploy_linear();

    let quote = token.quote_reward(10_000).unwrap();
    assert_eq!(quote.apy, FixedPoint::ONE);
    assert_eq!(quote.total_mint, 10_000);
    assert!(quote.can_mint);

    let outcome = token
        .grant_reward_at(&treasury(), &player(), quote.total_mint, 0)
        .unwrap();
    assert_eq!(
        outcome,
        GrantOutcome::Vested {
            split: outcome.split(),
            release_schedule: vesting(),
        }
    );
    assert_eq!(outcome.split().fee, 500);
    assert_eq!(outcome.split().net_reward, 9_500);

    assert_eq!(token.token().balance_of(&token.tax_wallet()).unwrap(), 500);
    assert_eq!(token.token().balance_of(&vesting()).unwrap(), 9_500);
    assert_eq!(token.token().total_supply().unwrap(), 10_000);
    assert_eq!(token.reward_bucket_state().unwrap().distributed, 10_000);

    let schedule = token.release_schedule().unwrap();
    assert_eq!(schedule.outstanding(&player()), 9_500);
    assert_eq!(schedule.releasable(&player(), RELEASE_DURATION_SECS), 9_500);
}

#[test]
fn test_degraded_grant_records_without_minting() {
    let mut token: PlayToken<MockTokenLedger, MockReleaseSchedule> =
        PlayToken::new(&config(), MockTokenLedger::new()).unwrap();

    let outcome = token.grant_reward_at(&treasury(), &player(), 1_000, 9).unwrap();
    assert!(!outcome.is_vested());
    assert_eq!(outcome.split().total(), 1_000);

    assert_eq!(token.ledger().total_minted(), 0);
    assert!(token.token().get_mint_calls().is_empty());

    let stats = token.events().get_statistics();
    assert_eq!(stats.total_events, 1);
    assert_eq!(stats.unvested_events, 1);
    assert_eq!(stats.total_minted, 0);
}

#[test]
fn test_removing_schedule_switches_to_degraded_mode() {
    let mut token = deploy_mock();
    token.grant_reward_at(&treasury(), &player(), 100, 0).unwrap();

    token.set_release_schedule(&owner(), None).unwrap();
    let outcome = token.grant_reward_at(&treasury(), &player(), 100, 1).unwrap();
    assert!(!outcome.is_vested());
    assert_eq!(token.reward_bucket_state().unwrap().distributed, 100);
    assert_eq!(token.events().len(), 2);
}

#[test]
fn test_unauthorized_calls_have_no_effect() {
    let mut token = deploy_mock();
    let intruder = Principal::from_label("intruder");

    let err = token
        .mint_for_bucket(&intruder, "team", &intruder, 1)
        .unwrap_err();
    assert_eq!(err.economics(), Some(&EconomicsError::Unauthorized(intruder)));

    let err = token
        .grant_reward_at(&intruder, &player(), 1, 0)
        .unwrap_err();
    assert_eq!(err.economics(), Some(&EconomicsError::Unauthorized(intruder)));

    assert!(token.token().get_mint_calls().is_empty());
    assert!(token.events().is_empty());
    assert_eq!(token.ledger().total_minted(), 0);
}

#[test]
fn test_clearing_treasury_blocks_grants() {
    let mut token = deploy_mock();
    token.set_treasury(&owner(), None).unwrap();

    assert!(token.grant_reward_at(&treasury(), &player(), 1, 0).is_err());
    assert!(token.events().is_empty());
}

#[test]
fn test_ownership_transfer_moves_admin_rights() {
    let mut token = deploy_mock();
    let successor = Principal::from_label("successor");

    token.transfer_ownership(&owner(), successor).unwrap();
    assert!(token.set_fee_rate(&owner(), FixedPoint::ZERO).is_err());
    token.set_fee_rate(&successor, FixedPoint::ZERO).unwrap();

    let outcome = token.grant_reward_at(&treasury(), &player(), 40, 0).unwrap();
    assert_eq!(outcome.split().fee, 0);
    assert_eq!(outcome.split().net_reward, 40);
    // The fee mint is still issued, for zero.
    assert_eq!(token.token().get_mint_calls()[0].1, 0);
}

#[test]
fn test_collaborator_failures_leave_counters_unchanged() {
    let mut token = deploy_mock();
    token.token_mut().set_fail_mints(true);

    let err = token.grant_reward_at(&treasury(), &player(), 1_000, 0).unwrap_err();
    assert!(err.economics().is_none());
    assert_eq!(token.ledger().total_minted(), 0);
    assert!(token.events().is_empty());
}

#[test]
fn test_schedule_failure_rolls_back_grant() {
    let mut token = deploy_mock();
    token.release_schedule_mut().unwrap().set_fail(true);

    let err = token.grant_reward_at(&treasury(), &player(), 1_000, 0).unwrap_err();
    assert!(matches!(err, TreasuryError::Collaborator(_)));

    let tax_wallet = token.tax_wallet();
    assert_eq!(token.token().get_mint_calls(), &[(tax_wallet, 50), (vesting(), 950)]);
    assert_eq!(token.token().get_burn_calls(), &[(vesting(), 950), (tax_wallet, 50)]);
    assert_eq!(token.token().total_supply().unwrap(), 0);
    assert_eq!(token.ledger().total_minted(), 0);
    assert_eq!(token.reward_bucket_state().unwrap().distributed, 0);
    assert!(token.release_schedule().unwrap().get_calls().is_empty());
    assert!(token.events().is_empty());
    assert!(token.audit().unwrap().is_healthy);
}

#[test]
fn test_net_reward_mint_failure_reverses_fee() {
    let mut token = deploy_mock();
    token.token_mut().set_fail_mint_at(Some(1));

    let err = token.grant_reward_at(&treasury(), &player(), 1_000, 0).unwrap_err();
    assert!(err.economics().is_none());

    let tax_wallet = token.tax_wallet();
    assert_eq!(token.token().get_burn_calls(), &[(tax_wallet, 50)]);
    assert_eq!(token.token().balance_of(&tax_wallet).unwrap(), 0);
    assert_eq!(token.token().total_supply().unwrap(), 0);
    assert_eq!(token.ledger().total_minted(), 0);
    assert!(token.release_schedule().unwrap().get_calls().is_empty());
    assert!(token.events().is_empty());

    // The next grant goes through untouched by the failed one.
    token.grant_reward_at(&treasury(), &player(), 1_000, 1).unwrap();
    assert_eq!(token.ledger().total_minted(), 1_000);
    assert_eq!(token.token().total_supply().unwrap(), 1_000);
}

#[test]
fn test_failed_grant_across_stage_boundary_keeps_stage_in_sync() {
    let mut token = deploy_mock();
    token.set_fee_rate(&owner(), FixedPoint::ZERO).unwrap();
    token.release_schedule_mut().unwrap().set_fail(true);

    assert!(token.grant_reward_at(&treasury(), &player(), 100_001, 0).is_err());
    assert_eq!(token.reward_bucket_state().unwrap().distributed, 0);
    assert_eq!(token.stages().current_index(), 0);
    assert_eq!(token.quote_reward(100).unwrap().apy, FixedPoint::ONE);

    token.release_schedule_mut().unwrap().set_fail(false);
    token.grant_reward_at(&treasury(), &player(), 100_001, 0).unwrap();
    assert_eq!(token.reward_bucket_state().unwrap().distributed, 100_001);
    assert_eq!(token.stages().current_index(), 1);
    assert_eq!(token.quote_reward(100).unwrap().apy, FixedPoint::from_percent(75));
}

#[test]
fn test_zero_address_schedule_rejected_at_install() {
    let result = PlayToken::new(&config(), MockTokenLedger::new())
        .unwrap()
        .with_release_schedule(MockReleaseSchedule::new(Principal::ZERO));
    assert!(matches!(
        result.map(|_| ()).unwrap_err().economics(),
        Some(EconomicsError::Config(_))
    ));

    let mut token = deploy_mock();
    assert!(token
        .set_release_schedule(&owner(), Some(MockReleaseSchedule::new(Principal::ZERO)))
        .is_err());
    assert_eq!(token.release_schedule().unwrap().address(), vesting());
}

#[test]
fn test_burn_reduces_supply_but_not_distribution() {
    let mut token = deploy_linear();
    let alice = Principal::from_label("alice");

    token.mint_for_bucket(&owner(), "ecosystem", &alice, 5_000).unwrap();
    token.token_mut().burn(&alice, 2_000).unwrap();

    assert_eq!(token.token().total_supply().unwrap(), 3_000);
    assert_eq!(token.ledger().bucket("ecosystem").unwrap().distributed, 5_000);
    assert_eq!(token.ledger().total_minted(), 5_000);
    assert!(token.audit().unwrap().is_healthy);
}

#[test]
fn test_grants_walk_through_stages() {
    let mut token = deploy_mock();
    token.set_fee_rate(&owner(), FixedPoint::ZERO).unwrap();

    // Reward bucket cap is 400_000 and each stage spans a quarter of it.
    token.grant_reward_at(&treasury(), &player(), 100_000, 0).unwrap();
    assert_eq!(token.stages().current_index(), 0);

    token.grant_reward_at(&treasury(), &player(), 1, 0).unwrap();
    assert_eq!(token.stages().current_index(), 1);
    assert_eq!(token.quote_reward(100).unwrap().apy, FixedPoint::from_percent(75));

    token.grant_reward_at(&treasury(), &player(), 150_000, 0).unwrap();
    assert_eq!(token.stages().current_index(), 2);
}

#[test]
fn test_set_apy_changes_future_quotes_only() {
    let mut token = deploy_mock();
    token.set_apy(&owner(), 0, FixedPoint::from_percent(200)).unwrap();
    assert_eq!(token.quote_reward(10).unwrap().total_mint, 20);

    let err = token.set_apy(&owner(), 4, FixedPoint::ONE).unwrap_err();
    assert_eq!(
        err.economics(),
        Some(&EconomicsError::InvalidStage { index: 4, len: 4 })
    );
}

#[test]
fn test_empty_stage_table_rejects_quotes() {
    let mut config = config();
    config.reward.stages = Vec::new();
    let token: PlayToken<MockTokenLedger, MockReleaseSchedule> =
        PlayToken::new(&config, MockTokenLedger::new()).unwrap();

    assert_eq!(
        token.quote_reward(10),
        Err(EconomicsError::InvalidStage { index: 0, len: 0 })
    );
}

#[test]
fn test_invalid_configs_rejected() {
    let mut bad_fee = config();
    bad_fee.reward.fee_rate = FixedPoint::from_raw(SCALE + 1);
    assert!(PlayToken::<MockTokenLedger, MockReleaseSchedule>::new(&bad_fee, MockTokenLedger::new()).is_err());

    let mut bad_bucket = config();
    bad_bucket.reward.bucket = "missing".into();
    assert!(PlayToken::<MockTokenLedger, MockReleaseSchedule>::new(&bad_bucket, MockTokenLedger::new()).is_err());

    let mut bad_stages = config();
    bad_stages.reward.stages.push(Stage::new(FixedPoint::from_percent(1), FixedPoint::ONE));
    assert!(PlayToken::<MockTokenLedger, MockReleaseSchedule>::new(&bad_stages, MockTokenLedger::new()).is_err());
}

proptest! {
    #[test]
    fn prop_caps_hold_across_grants(
        grants in prop::collection::vec(0u128..150_000, 1..20),
        fee_bps in 0u32..=10_000,
    ) {
        let mut token = deploy_mock();
        token.set_fee_rate(&owner(), FixedPoint::from_bps(fee_bps)).unwrap();

        let mut previous_stage = 0;
        for (i, amount) in grants.into_iter().enumerate() {
            let before = token.ledger().total_minted();
            match token.grant_reward_at(&treasury(), &player(), amount, i as u64) {
                Ok(outcome) => {
                    prop_assert_eq!(outcome.split().total(), amount);
                    prop_assert_eq!(token.ledger().total_minted(), before + amount);
                }
                Err(err) => {
                    prop_assert!(matches!(
                        err.economics(),
                        Some(EconomicsError::BucketCapExceeded { .. })
                    ), "unexpected grant error: {:?}", err);
                    prop_assert_eq!(token.ledger().total_minted(), before);
                }
            }

            let bucket = token.reward_bucket_state().unwrap();
            prop_assert!(bucket.distributed <= bucket.cap);
            prop_assert!(token.ledger().total_minted() <= token.ledger().max_total_supply());
            prop_assert!(token.stages().current_index() >= previous_stage);
            previous_stage = token.stages().current_index();
        }

        let supply = token.token().total_supply().unwrap();
        prop_assert_eq!(supply, token.ledger().total_minted());
    }
}
