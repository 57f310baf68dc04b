//! Concurrency scenarios
//!
//! Inspections and executions overlap through latches on the mock chain so
//! interleavings are deterministic.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use flowcraft_client::{DistributionController, Phase};
use flowcraft_core::{ContractAddresses, FlowError, NetworkDefinition, OP_SEPOLIA_CHAIN_ID};
use flowcraft_settlement::MockChain;

const POOL_A: Address = Address::repeat_byte(0xaa);
const POOL_B: Address = Address::repeat_byte(0xbb);
const TOKEN_A: Address = Address::repeat_byte(0x1a);
const TOKEN_B: Address = Address::repeat_byte(0x1b);
const OPERATOR: Address = Address::repeat_byte(0x33);
const RECIPIENTS: &str = "0x4444444444444444444444444444444444444444,1";

async fn connected() -> (Arc<MockChain>, DistributionController) {
    let contracts = ContractAddresses::default();
    let chain = Arc::new(MockChain::new(OP_SEPOLIA_CHAIN_ID, contracts));
    chain.add_account(OPERATOR);
    chain.add_pool(POOL_A, TOKEN_A);
    chain.add_pool(POOL_B, TOKEN_B);
    chain.set_balance(TOKEN_A, OPERATOR, U256::from(1u64));
    chain.set_balance(TOKEN_B, OPERATOR, U256::from(2u64));

    let controller =
        DistributionController::new(chain.clone(), NetworkDefinition::op_sepolia(), contracts);
    controller.connect().await.unwrap();
    (chain, controller)
}

#[tokio::test]
async fn test_late_inspection_of_old_pool_is_discarded() {
    let (chain, controller) = connected().await;
    let latch = chain.hold_pool(POOL_A);

    let pool_a_text = POOL_A.to_string();
    let first = controller.set_pool_address(&pool_a_text);
    let second = async {
        let result = controller.set_pool_address(&POOL_B.to_string()).await;
        latch.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), None);
    assert_eq!(second.unwrap().unwrap().token, Some(TOKEN_B));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::PoolValid);
    assert_eq!(snapshot.pool_text, POOL_B.to_string());
    assert_eq!(snapshot.inspection.unwrap().token, Some(TOKEN_B));
}

#[tokio::test]
async fn test_second_execute_while_pending_is_rejected() {
    let (chain, controller) = connected().await;
    controller.set_pool_address(&POOL_A.to_string()).await.unwrap();
    let latch = chain.hold_next_submission();

    let first = controller.execute(RECIPIENTS, "1");
    let second = async {
        let result = controller.execute(RECIPIENTS, "1").await;
        latch.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.unwrap().success);
    assert_eq!(second.unwrap_err(), FlowError::ExecutionInProgress);
    assert_eq!(chain.transactions().len(), 1);
    assert_eq!(controller.snapshot().phase, Phase::Succeeded);
}

#[tokio::test]
async fn test_pool_edit_during_execution_is_refused() {
    let (chain, controller) = connected().await;
    controller.set_pool_address(&POOL_A.to_string()).await.unwrap();
    let latch = chain.hold_next_submission();

    let execution = controller.execute(RECIPIENTS, "1");
    let edit = async {
        let result = controller.set_pool_address(&POOL_B.to_string()).await;
        latch.notify_one();
        result
    };
    let (execution, edit) = tokio::join!(execution, edit);

    assert!(execution.is_ok());
    assert_eq!(edit.unwrap_err(), FlowError::ExecutionInProgress);
    assert!(chain.distribution(POOL_A).is_some());
    assert_eq!(controller.snapshot().pool_text, POOL_A.to_string());
}

#[tokio::test]
async fn test_reconnect_during_execution_keeps_the_run() {
    let (chain, controller) = connected().await;
    controller.set_pool_address(&POOL_A.to_string()).await.unwrap();
    let latch = chain.hold_next_submission();

    let first = controller.execute(RECIPIENTS, "1");
    let second = async {
        let reconnected = controller.connect().await.unwrap();
        let retry = controller.execute(RECIPIENTS, "1").await;
        latch.notify_one();
        (reconnected.phase, retry)
    };
    let (first, (phase_after_reconnect, retry)) = tokio::join!(first, second);

    assert_eq!(phase_after_reconnect, Phase::Executing);
    assert_eq!(retry.unwrap_err(), FlowError::ExecutionInProgress);
    assert!(first.unwrap().success);
    assert_eq!(chain.transactions().len(), 1);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Succeeded);
    assert!(snapshot.last_tx_hash.is_some());
}

#[tokio::test]
async fn test_network_change_during_execution_blocks_rerun() {
    let (chain, controller) = connected().await;
    controller.set_pool_address(&POOL_A.to_string()).await.unwrap();
    let latch = chain.hold_next_submission();

    let execution = controller.execute(RECIPIENTS, "1");
    let switch = async {
        chain.set_chain_id(1);
        let phase = controller.refresh_network().await.unwrap().phase;
        latch.notify_one();
        phase
    };
    let (execution, phase_during_run) = tokio::join!(execution, switch);

    assert_eq!(phase_during_run, Phase::Executing);
    assert!(execution.is_ok());
    assert_eq!(controller.snapshot().phase, Phase::WrongNetwork);

    let mismatch = FlowError::NetworkMismatch { expected: OP_SEPOLIA_CHAIN_ID, actual: Some(1) };
    assert_eq!(controller.execute(RECIPIENTS, "1").await.unwrap_err(), mismatch);
    assert_eq!(controller.preview(RECIPIENTS, "1").await.unwrap_err(), mismatch);
    assert_eq!(chain.transactions().len(), 1);
}
