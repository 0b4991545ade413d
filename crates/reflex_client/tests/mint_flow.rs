//! The two-phase mint against mock contracts and a real signature service.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use common::{player, signer_config, Env, ReplaySource};
use reflex_blockchain::{MintRejection, MockConfig};
use reflex_client::{CancelToken, HttpSignatureClient, MintError, SignatureSource, WalletContext};
use reflex_session::{classify, ReactionResult};
use reflex_shared::constants::DEFAULT_CHAIN_ID;
use reflex_shared::{MintSignatureRequest, MINT_SIGNATURE_PATH};
use reflex_signer::SignerConfig;

fn wallet() -> WalletContext {
    WalletContext::connected(player(), DEFAULT_CHAIN_ID)
}

/// A 230ms reaction.
fn success() -> ReactionResult {
    classify(10_000, 10_230)
}

#[tokio::test(start_paused = true)]
async fn test_mint_confirms_on_event() {
    let env = Env::new(MockConfig::default());
    let minter = env.orchestrator(env.service_source());

    let outcome = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.token_id, U256::from(1));
    assert_eq!(outcome.score, 230_000);
    assert_eq!(outcome.rank, "Swift");
    assert_eq!(env.chain.mint_submissions(), 1);
    assert_eq!(env.listener.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_mints_get_fresh_nonces() {
    let env = Env::new(MockConfig::default());
    let minter = env.orchestrator(env.service_source());
    let cancel = CancelToken::new();

    let first = minter.mint(&wallet(), &success(), Some(7), &cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    let second = minter.mint(&wallet(), &success(), Some(7), &cancel).await.unwrap();

    assert_eq!(first.token_id, U256::from(1));
    assert_eq!(second.token_id, U256::from(2));
}

#[tokio::test(start_paused = true)]
async fn test_preconditions_checked_before_any_call() {
    let env = Env::new(MockConfig::default());
    let minter = env.orchestrator(env.service_source());
    let cancel = CancelToken::new();

    let too_fast = classify(10_000, 10_005);
    assert_eq!(
        minter.mint(&wallet(), &too_fast, None, &cancel).await,
        Err(MintError::NotMintable)
    );
    assert_eq!(
        minter.mint(&WalletContext::default(), &success(), None, &cancel).await,
        Err(MintError::NotConnected)
    );
    let wrong_chain = WalletContext::connected(player(), 1);
    let err = minter.mint(&wrong_chain, &success(), None, &cancel).await.unwrap_err();
    assert_eq!(err.to_string(), "Please switch to Monad Testnet to mint.");

    assert_eq!(env.chain.mint_submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_replayed_signature_is_rejected() {
    let env = Env::new(MockConfig::default());
    let request = MintSignatureRequest {
        player_address: player().to_string(),
        score: 230_000,
        fid: None,
    };
    let response = env.service_source().request_signature(&request).await.unwrap();
    let minter = env.orchestrator(Arc::new(ReplaySource(response)));
    let cancel = CancelToken::new();

    minter.mint(&wallet(), &success(), None, &cancel).await.unwrap();
    let err = minter.mint(&wallet(), &success(), None, &cancel).await.unwrap_err();

    assert_eq!(err, MintError::Rejected(MintRejection::NonceAlreadyUsed));
    assert_eq!(
        err.to_string(),
        "This signature was already used. Please mint again for a fresh one."
    );
}

#[tokio::test(start_paused = true)]
async fn test_expired_signature_is_rejected() {
    let env = Env::new(MockConfig::default());
    let request = MintSignatureRequest {
        player_address: player().to_string(),
        score: 230_000,
        fid: None,
    };
    let response = env.service_source().request_signature(&request).await.unwrap();
    tokio::time::advance(Duration::from_secs(3_601)).await;

    let minter = env.orchestrator(Arc::new(ReplaySource(response)));
    let err = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, MintError::Rejected(MintRejection::SignatureExpired));
}

#[tokio::test(start_paused = true)]
async fn test_untrusted_signer_is_rejected() {
    let env = Env::trusting(MockConfig::default(), Address::repeat_byte(0x99));
    let minter = env.orchestrator(env.service_source());

    let err = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, MintError::Rejected(MintRejection::InvalidSigner));
}

#[tokio::test(start_paused = true)]
async fn test_signature_for_other_score_is_refused() {
    let env = Env::new(MockConfig::default());
    let request = MintSignatureRequest {
        player_address: player().to_string(),
        score: 1,
        fid: None,
    };
    let response = env.service_source().request_signature(&request).await.unwrap();
    let minter = env.orchestrator(Arc::new(ReplaySource(response)));

    let err = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, MintError::SignatureMismatch);
    assert_eq!(env.chain.mint_submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_service_error_text_is_shown() {
    let env = Env::with_signer_config(
        MockConfig::default(),
        SignerConfig {
            signer_private_key: None,
            ..signer_config()
        },
    );
    let minter = env.orchestrator(env.service_source());

    let err = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        MintError::Signature("Server configuration error: Signer key missing.".into())
    );
    assert_eq!(env.chain.mint_submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_event_times_out() {
    let env = Env::new(MockConfig::default());
    env.chain.drop_events(true);
    let minter = env.orchestrator(env.service_source());

    let err = minter
        .mint(&wallet(), &success(), None, &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, MintError::Timeout("the mint event"));
    assert_eq!(err.to_string(), "Timed out waiting for the mint event.");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_pending_receipt() {
    let env = Env::new(MockConfig::default());
    env.chain.stall_receipts(true);
    let minter = env.orchestrator(env.service_source());
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = minter.mint(&wallet(), &success(), None, &cancel).await.unwrap_err();
    assert_eq!(err, MintError::Cancelled);
}

#[tokio::test]
async fn test_mint_over_http() {
    let env = Env::new(MockConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}{}", listener.local_addr().unwrap(), MINT_SIGNATURE_PATH);
    tokio::spawn(reflex_signer::http::serve(listener, Arc::clone(&env.service)));

    let client = HttpSignatureClient::new(url, Duration::from_secs(5)).unwrap();
    let minter = env.orchestrator(Arc::new(client));

    let outcome = minter
        .mint(&wallet(), &success(), Some(42), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.token_id, U256::from(1));
    assert_eq!(outcome.rank, "Swift");
}

#[tokio::test]
async fn test_http_rejection_carries_server_message() {
    let env = Env::new(MockConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}{}", listener.local_addr().unwrap(), MINT_SIGNATURE_PATH);
    tokio::spawn(reflex_signer::http::serve(listener, Arc::clone(&env.service)));

    let client = HttpSignatureClient::new(url, Duration::from_secs(5)).unwrap();
    let request = MintSignatureRequest {
        player_address: "not-an-address".into(),
        score: 230_000,
        fid: None,
    };
    let err = client.request_signature(&request).await.unwrap_err();
    assert_eq!(
        err,
        reflex_client::SignatureFetchError::Rejected {
            status: 400,
            message: "Invalid playerAddress format.".into(),
        }
    );
}
