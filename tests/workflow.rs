mod common;

use common::{MockEngine, MockWallet, ScriptedOperator, MAGIC};
use trinity_console::crypto::AccountId;
use trinity_console::engine::{simulate, BroadcastResult, LedgerEngine};
use trinity_console::error::ConsoleError;
use trinity_console::native::{token, GAS_TOKEN};
use trinity_console::script::{assemble, ContractParameter, InvocationStep};
use trinity_console::wallet::{shared, SharedWallet};
use trinity_console::workflow::{
    FaultPolicy, Finalizer, InvocationRequest, InvocationWorkflow, RelayState, WorkflowOutcome,
    CONTINUE_AFTER_FAULT_PROMPT, RELAY_PROMPT,
};

const MINTER: AccountId = AccountId([0x33; 20]);

fn transfer_then_mint(from: AccountId) -> Vec<InvocationStep> {
    vec![
        InvocationStep::new(
            GAS_TOKEN,
            token::TRANSFER,
            vec![from.into(), AccountId([0x44; 20]).into(), ContractParameter::Integer(10)],
        ),
        InvocationStep::without_args(MINTER, token::MINT),
    ]
}

fn wallet_with(count: usize) -> (SharedWallet, Vec<AccountId>) {
    let wallet = MockWallet::with_accounts(count);
    let accounts = (0..count).map(|i| wallet.account(i)).collect();
    (shared(wallet), accounts)
}

#[test]
fn test_faulting_dry_run_then_no_aborts_without_broadcast() {
    let engine = MockEngine::faulting_on(token::MINT);
    let (wallet, accounts) = wallet_with(1);
    let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
    let mut operator = ScriptedOperator::answering(&["no"]);

    let outcome = workflow
        .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
        .unwrap();

    assert!(outcome.report().is_fault());
    assert_eq!(outcome.relay_state(), Some(RelayState::Aborted));
    assert!(outcome.transaction().is_none());
    assert_eq!(operator.questions, vec![CONTINUE_AFTER_FAULT_PROMPT.to_string()]);
    assert_eq!(operator.finalized, 0);
    assert_eq!(operator.aborted, 1);
    assert_eq!(engine.broadcast_count(), 0);
}

#[test]
fn test_fault_needs_explicit_yes_before_signing() {
    for answer in ["", "y", "YES", "maybe"] {
        let engine = MockEngine::faulting_on(token::MINT);
        let (wallet, accounts) = wallet_with(1);
        let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
        let mut operator = ScriptedOperator::answering(&[answer, "yes"]);

        let outcome = workflow
            .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
            .unwrap();
        assert!(
            matches!(outcome, WorkflowOutcome::Aborted { tx: None, .. }),
            "answer {:?}",
            answer
        );
        assert_eq!(operator.finalized, 0, "answer {:?}", answer);
        assert_eq!(operator.questions.len(), 1);
    }

    let engine = MockEngine::faulting_on(token::MINT);
    let (wallet, accounts) = wallet_with(1);
    let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes", "yes"]);
    let outcome = workflow
        .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
        .unwrap();
    assert_eq!(outcome.relay_state(), Some(RelayState::Relayed));
    assert_eq!(
        operator.questions,
        vec![CONTINUE_AFTER_FAULT_PROMPT.to_string(), RELAY_PROMPT.to_string()]
    );
}

#[test]
fn test_only_yes_relays() {
    for answer in ["y", "", "maybe", "no", "yes please", "Y", "YES", "Yes", " yes "] {
        let engine = MockEngine::default();
        let (wallet, accounts) = wallet_with(1);
        let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
        let mut operator = ScriptedOperator::answering(&[answer]);

        let outcome = workflow
            .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
            .unwrap();
        assert_eq!(outcome.relay_state(), Some(RelayState::Aborted), "answer {:?}", answer);
        assert_eq!(engine.broadcast_count(), 0, "answer {:?}", answer);
    }

    for answer in ["yes", "yes\n", "yes\r\n"] {
        let engine = MockEngine::default();
        let (wallet, accounts) = wallet_with(1);
        let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
        let mut operator = ScriptedOperator::answering(&[answer]);

        let outcome = workflow
            .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
            .unwrap();
        match outcome {
            WorkflowOutcome::Relayed { hash, tx, .. } => {
                assert_eq!(hash, [0xAA; 32]);
                assert_eq!(engine.broadcasts.borrow()[0], tx);
            }
            other => panic!("answer {:?} gave {:?}", answer, other),
        }
        assert_eq!(operator.relayed, 1);
    }
}

#[test]
fn test_signers_reach_wallet_sender_first() {
    let engine = MockEngine::default();
    let (wallet, ids) = wallet_with(3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
    let mut operator = ScriptedOperator::answering(&["no"]);

    let request = InvocationRequest::new(transfer_then_mint(a))
        .with_sender(Some(a))
        .with_accounts(Some(vec![b, a, c]));
    let outcome = workflow.execute(request, &mut operator).unwrap();

    let tx = outcome.transaction().unwrap();
    let order: Vec<_> = tx.signers.iter().map(|s| s.account).collect();
    assert_eq!(order, vec![a, b, c]);
    assert_eq!(tx.witnesses.len(), 3);
}

#[test]
fn test_without_wallet_stops_after_dry_run() {
    let engine = MockEngine::default();
    let workflow = InvocationWorkflow::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let outcome = workflow
        .execute(InvocationRequest::new(transfer_then_mint(MINTER)), &mut operator)
        .unwrap();

    assert!(matches!(outcome, WorkflowOutcome::Simulated(_)));
    assert!(operator.questions.is_empty());
    assert_eq!(operator.scripts.len(), 1);
    assert_eq!(operator.dry_runs.len(), 1);
    assert_eq!(engine.run_count(), 1);
}

#[test]
fn test_refuse_policy_stops_on_fault() {
    let engine = MockEngine::faulting_on(token::MINT);
    let (wallet, accounts) = wallet_with(1);
    let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes"]);

    let request = InvocationRequest::new(transfer_then_mint(accounts[0]))
        .with_fault_policy(FaultPolicy::Refuse);
    let outcome = workflow.execute(request, &mut operator).unwrap();

    assert!(matches!(outcome, WorkflowOutcome::Refused(_)));
    assert_eq!(operator.finalized, 0);
    assert!(operator.questions.is_empty());
    assert_eq!(engine.broadcast_count(), 0);
}

#[test]
fn test_relay_rejection_is_reported_not_rolled_back() {
    let engine = MockEngine {
        broadcast_result: BroadcastResult::Rejected("InsufficientFunds".to_string()),
        ..Default::default()
    };
    let (wallet, accounts) = wallet_with(1);
    let workflow = InvocationWorkflow::new(&engine, Some(wallet), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes"]);

    let outcome = workflow
        .execute(InvocationRequest::new(transfer_then_mint(accounts[0])), &mut operator)
        .unwrap();

    match &outcome {
        WorkflowOutcome::RelayFailed { reason, tx, .. } => {
            assert_eq!(reason, "InsufficientFunds");
            assert!(tx.is_signed());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(outcome.relay_state(), Some(RelayState::Confirmed));
    assert_eq!(engine.broadcast_count(), 1);
    assert_eq!(operator.relay_failures, vec!["InsufficientFunds".to_string()]);
}

#[test]
fn test_chained_script_faulting_on_second_step_is_one_fault() {
    let engine = MockEngine::faulting_on(token::MINT);
    let snapshot = engine.snapshot().unwrap();
    let script = assemble(&transfer_then_mint(MINTER)).unwrap();

    let report = simulate(&engine, &script, &snapshot, None).unwrap();
    assert!(report.is_fault());
    assert!(report.stack.is_empty());
    assert_eq!(report.script, script);
    assert_eq!(engine.run_count(), 1);
}

#[test]
fn test_finalize_refuses_closed_wallet() {
    let engine = MockEngine::default();
    let snapshot = engine.snapshot().unwrap();
    let mut closed = MockWallet::with_accounts(1);
    closed.open = false;
    let wallet = shared(closed);

    let script = assemble(&transfer_then_mint(MINTER)).unwrap();
    let report = simulate(&engine, &script, &snapshot, None).unwrap();
    let result = Finalizer::new(Some(wallet), MAGIC)
        .finalize(&engine, &snapshot, &script, None, &[], &report);
    assert!(matches!(result, Err(ConsoleError::InvalidOperation(_))));

    let result = Finalizer::new(None, MAGIC).finalize(&engine, &snapshot, &script, None, &[], &report);
    assert!(matches!(result, Err(ConsoleError::InvalidOperation(_))));
}

#[test]
fn test_finalize_refuses_unacknowledged_fault() {
    let engine = MockEngine::faulting_on(token::MINT);
    let snapshot = engine.snapshot().unwrap();
    let (wallet, _) = wallet_with(1);

    let script = assemble(&transfer_then_mint(MINTER)).unwrap();
    let report = simulate(&engine, &script, &snapshot, None).unwrap();
    assert!(report.is_fault());

    let result = Finalizer::new(Some(wallet.clone()), MAGIC)
        .finalize(&engine, &snapshot, &script, None, &[], &report);
    assert!(matches!(result, Err(ConsoleError::InvalidOperation(_))));

    let tx = Finalizer::new(Some(wallet), MAGIC)
        .with_fault_acknowledged(true)
        .finalize(&engine, &snapshot, &script, None, &[], &report)
        .unwrap();
    assert!(tx.is_signed());
}

#[test]
fn test_finalize_requires_dry_run_of_same_script() {
    let engine = MockEngine::default();
    let snapshot = engine.snapshot().unwrap();
    let (wallet, accounts) = wallet_with(1);

    let script = assemble(&transfer_then_mint(accounts[0])).unwrap();
    let other = assemble(&[InvocationStep::without_args(MINTER, token::MINT)]).unwrap();
    let report = simulate(&engine, &other, &snapshot, None).unwrap();

    let finalizer = Finalizer::new(Some(wallet), MAGIC);
    let result = finalizer.finalize(&engine, &snapshot, &script, None, &[], &report);
    assert!(matches!(result, Err(ConsoleError::InvalidOperation(_))));

    let report = simulate(&engine, &script, &snapshot, None).unwrap();
    let tx = finalizer
        .finalize(&engine, &snapshot, &script, Some(accounts[0]), &[], &report)
        .unwrap();
    assert_eq!(tx.sender(), Some(accounts[0]));
}
