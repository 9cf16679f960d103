mod common;

use common::{MockEngine, MockWallet, ScriptedOperator, MAGIC};
use std::io::Write;
use trinity_console::commands::{Reply, Session};
use trinity_console::crypto::AccountId;
use trinity_console::error::ConsoleError;
use trinity_console::native::{token, GAS_TOKEN};
use trinity_console::script::{assemble, ContractParameter, InvocationStep, MAX_ITEM_SIZE};
use trinity_console::wallet::shared;
use trinity_console::workflow::{RelayState, WorkflowOutcome};

fn hex_account(byte: u8) -> String {
    AccountId([byte; 20]).to_string()
}

#[test]
fn test_mint_with_fractional_amount_never_assembles() {
    let engine = MockEngine {
        decimals: 2,
        ..Default::default()
    };
    let session = Session::new(&engine, Some(shared(MockWallet::with_accounts(1))), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes"]);

    let line = format!("mint {} {} {} 10.5", hex_account(1), hex_account(2), hex_account(3));
    let err = session.execute_line(&line, &mut operator).unwrap_err();

    match err {
        ConsoleError::InvalidInput(msg) => {
            assert!(msg.contains("fractional part exceeds declared precision"), "{}", msg)
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(operator.scripts.is_empty());
    assert_eq!(engine.run_count(), 0);
    assert_eq!(engine.snapshots.get(), 0);
    assert_eq!(engine.broadcast_count(), 0);
}

#[test]
fn test_mint_chains_transfer_and_mint() {
    let engine = MockEngine::default();
    let wallet = MockWallet::with_accounts(1);
    let sender = wallet.account(0);
    let session = Session::new(&engine, Some(shared(wallet)), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes"]);

    let line = format!("mint {} gas {} 500", hex_account(1), hex_account(3));
    let reply = session.execute_line(&line, &mut operator).unwrap();

    let expected = assemble(&[
        InvocationStep::new(
            GAS_TOKEN,
            token::TRANSFER,
            vec![sender.into(), AccountId([3; 20]).into(), ContractParameter::Integer(500)],
        ),
        InvocationStep::without_args(AccountId([1; 20]), token::MINT),
    ])
    .unwrap();
    assert_eq!(operator.scripts, vec![expected]);
    assert!(matches!(reply, Reply::Workflow(WorkflowOutcome::Relayed { .. })));
    assert_eq!(engine.broadcast_count(), 1);
}

#[test]
fn test_transfer_scales_by_token_decimals_on_one_snapshot() {
    let engine = MockEngine {
        decimals: 2,
        ..Default::default()
    };
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let line = format!("transfer gas {} 10.5", hex_account(7));
    let reply = session.execute_line(&line, &mut operator).unwrap();

    let expected = assemble(&[InvocationStep::new(
        GAS_TOKEN,
        token::TRANSFER,
        vec![
            ContractParameter::Any,
            AccountId([7; 20]).into(),
            ContractParameter::Integer(1050),
            ContractParameter::Any,
        ],
    )])
    .unwrap();
    assert_eq!(operator.scripts, vec![expected]);
    assert!(matches!(reply, Reply::Workflow(WorkflowOutcome::Simulated(_))));
    // decimals + symbol + dry-run
    assert_eq!(engine.run_count(), 3);
    assert_eq!(engine.snapshots.get(), 1);
}

#[test]
fn test_transfer_rejects_excess_precision() {
    let engine = MockEngine {
        decimals: 2,
        ..Default::default()
    };
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let line = format!("transfer gas {} 1.234", hex_account(7));
    let err = session.execute_line(&line, &mut operator).unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidInput(_)));
    assert!(operator.scripts.is_empty());
}

#[test]
fn test_policy_change_needs_wallet() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let err = session.execute_line("set max block 1024", &mut operator).unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidOperation(_)));
    assert_eq!(engine.run_count(), 0);
}

#[test]
fn test_policy_change_relays_after_yes() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, Some(shared(MockWallet::with_accounts(1))), MAGIC);
    let mut operator = ScriptedOperator::answering(&["yes"]);

    let reply = session.execute_line("set byte fee 2000", &mut operator).unwrap();
    match reply {
        Reply::Workflow(outcome) => assert_eq!(outcome.relay_state(), Some(RelayState::Relayed)),
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(engine.snapshots.get(), 1);
}

#[test]
fn test_read_only_commands_render() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    match session.execute_line("get byte fee", &mut operator).unwrap() {
        Reply::Integer { label, value } => {
            assert_eq!(label, "Fee per byte");
            assert_eq!(value, 1000);
        }
        other => panic!("unexpected reply {:?}", other),
    }
    match session.execute_line("GET BLOCKED ACCOUNTS", &mut operator).unwrap() {
        Reply::Accounts { accounts, .. } => assert_eq!(accounts, vec![AccountId([0x42; 20])]),
        other => panic!("unexpected reply {:?}", other),
    }
    assert!(operator.questions.is_empty());
}

#[test]
fn test_errors_do_not_end_the_session() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    assert!(matches!(
        session.execute_line("teleport 5", &mut operator),
        Err(ConsoleError::UnknownCommand(_))
    ));
    assert!(matches!(
        session.execute_line("block account nothex", &mut operator),
        Err(ConsoleError::InvalidInput(_))
    ));
    let err = session.execute_line("get byte fee extra", &mut operator).unwrap_err();
    assert!(err.to_string().contains("usage: get byte fee"));

    assert!(matches!(session.execute_line("   ", &mut operator), Ok(Reply::Empty)));
    assert!(matches!(session.execute_line("help", &mut operator), Ok(Reply::Help(_))));
    assert!(matches!(session.execute_line("get byte fee", &mut operator), Ok(Reply::Integer { .. })));
    assert!(matches!(session.execute_line("quit", &mut operator), Ok(Reply::Exit)));
}

#[test]
fn test_invoke_with_json_parameters() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let line = format!(
        r#"invoke {} balanceOf [{{"type": "Hash160", "value": "{}"}}]"#,
        hex_account(5),
        hex_account(6)
    );
    session.execute_line(&line, &mut operator).unwrap();

    let expected = assemble(&[InvocationStep::new(
        AccountId([5; 20]),
        token::BALANCE_OF,
        vec![AccountId([6; 20]).into()],
    )])
    .unwrap();
    assert_eq!(operator.scripts, vec![expected]);
}

#[test]
fn test_deploy_rejects_oversized_nef() {
    let dir = tempfile::tempdir().unwrap();
    let nef = dir.path().join("big.nef");
    std::fs::File::create(&nef)
        .unwrap()
        .write_all(&vec![0u8; MAX_ITEM_SIZE + 1])
        .unwrap();

    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let err = session
        .execute_line(&format!("deploy {}", nef.display()), &mut operator)
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidInput(_)));
    assert_eq!(engine.run_count(), 0);
}

#[test]
fn test_deploy_finds_manifest_next_to_nef() {
    let dir = tempfile::tempdir().unwrap();
    let nef = dir.path().join("token.nef");
    std::fs::write(&nef, b"NEF3-bytes").unwrap();
    std::fs::write(dir.path().join("token.manifest.json"), br#"{"name":"token"}"#).unwrap();

    let engine = MockEngine::default();
    let session = Session::new(&engine, None, MAGIC);
    let mut operator = ScriptedOperator::default();

    let reply = session
        .execute_line(&format!("deploy {}", nef.display()), &mut operator)
        .unwrap();
    assert!(matches!(reply, Reply::Workflow(WorkflowOutcome::Simulated(_))));
    assert_eq!(operator.scripts.len(), 1);
}

#[test]
fn test_designate_role_validates_keys() {
    let engine = MockEngine::default();
    let session = Session::new(&engine, Some(shared(MockWallet::with_accounts(1))), MAGIC);
    let mut operator = ScriptedOperator::default();

    let bad_key = "05".repeat(33);
    let err = session
        .execute_line(&format!("designate role Oracle {}", bad_key), &mut operator)
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidInput(_)));

    let err = session
        .execute_line("designate role Wizard 02aa", &mut operator)
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidInput(_)));
    assert_eq!(engine.run_count(), 0);
}
