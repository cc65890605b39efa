use crate::fixtures::{
    loopback_network, loopback_pipeline, run_config, RecordingObserver, TopologyBuilder, RUN_TIMEOUT, STALL_WINDOW,
};
use std::sync::Arc;
use std::time::Duration;
use tape_core::application::{PipelineConfig, RunReport};
use tape_core::domain::ObserverErrorPolicy;
use tape_core::infrastructure::network::{CommitterFaults, EndorserFaults, OrdererFaults};
use tape_core::{Result, TapeError};

async fn within_timeout(run: impl std::future::Future<Output = Result<RunReport>>) -> Result<RunReport> {
    tokio::time::timeout(RUN_TIMEOUT, run).await.expect("run finished in time")
}

async fn stalls(run: impl std::future::Future<Output = Result<RunReport>>) -> bool {
    tokio::time::timeout(STALL_WINDOW, run).await.is_err()
}

#[tokio::test]
async fn transaction_seen_by_one_committer_never_counts_under_threshold_two() {
    let faults = CommitterFaults { hide_first: 1, ..Default::default() };
    let topology = TopologyBuilder::default().committers(2).build();
    let config = PipelineConfig { commit_threshold: 2, ..run_config(10, 5) };

    let network = loopback_network().with_committer_faults("peer1", faults.clone());
    assert!(stalls(loopback_pipeline(&network, topology.clone(), config.clone()).run()).await);

    let network = loopback_network().with_committer_faults("peer1", faults);
    let retargeted = PipelineConfig { commit_target: Some(9), ..config };
    let report = within_timeout(loopback_pipeline(&network, topology, retargeted).run()).await.expect("retargeted run");
    assert_eq!(report.transactions, 9);
}

#[tokio::test]
async fn rejected_endorsement_is_not_retried() {
    let faults = EndorserFaults { reject_seqs: [4].into_iter().collect(), ..Default::default() };
    let topology = TopologyBuilder::default().endorsers(2).build();

    let network = loopback_network().with_endorser_faults("peer1", faults.clone());
    assert!(stalls(loopback_pipeline(&network, topology.clone(), run_config(10, 5)).run()).await);
    assert_eq!(network.envelopes_accepted(), 9);

    let network = loopback_network().with_endorser_faults("peer1", faults);
    let recorder = Arc::new(RecordingObserver::default());
    let config = PipelineConfig { commit_target: Some(9), ..run_config(10, 5) };
    let report = within_timeout(loopback_pipeline(&network, topology, config).with_observer(recorder.clone()).run())
        .await
        .expect("retargeted run");
    assert_eq!(report.transactions, 9);
    assert_eq!(network.envelopes_accepted(), 9);
    assert_eq!(RecordingObserver::count(&recorder.envelopes), 9);
}

#[tokio::test]
async fn dropped_committer_stream_aborts_the_run() {
    let network = loopback_network().with_committer_faults("peer0", CommitterFaults { drop_after: Some(1), ..Default::default() });
    let recorder = Arc::new(RecordingObserver::default());
    let result = within_timeout(
        loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(20, 5)).with_observer(recorder.clone()).run(),
    )
    .await;
    assert!(matches!(result, Err(TapeError::StreamClosed { .. })), "got {result:?}");
    assert!(RecordingObserver::count(&recorder.committed) < 20);
}

#[tokio::test]
async fn isolated_committer_failure_lets_the_others_finish() {
    let network = loopback_network().with_committer_faults("peer1", CommitterFaults { drop_after: Some(0), ..Default::default() });
    let topology = TopologyBuilder::default().committers(2).build();
    let config = PipelineConfig { observer_error_policy: ObserverErrorPolicy::Isolate, ..run_config(20, 5) };
    let report = within_timeout(loopback_pipeline(&network, topology, config).run()).await.expect("isolated run");
    assert_eq!(report.transactions, 20);
}

#[tokio::test]
async fn losing_every_committer_under_isolation_is_fatal() {
    let network = loopback_network().with_committer_faults("peer0", CommitterFaults { drop_after: Some(0), ..Default::default() });
    let recorder = Arc::new(RecordingObserver::default());
    let config = PipelineConfig { observer_error_policy: ObserverErrorPolicy::Isolate, ..run_config(20, 5) };
    let result = within_timeout(
        loopback_pipeline(&network, TopologyBuilder::default().build(), config).with_observer(recorder.clone()).run(),
    )
    .await;
    assert!(
        matches!(result, Err(TapeError::InsufficientCommitters { live: 0, required: 1, target: 20, .. })),
        "got {result:?}"
    );
    assert_eq!(recorder.isolated().len(), 1);
}

#[tokio::test]
async fn isolation_below_threshold_fails_instead_of_hanging() {
    let network = loopback_network().with_committer_faults("peer1", CommitterFaults { drop_after: Some(0), ..Default::default() });
    let topology = TopologyBuilder::default().committers(2).build();
    let config =
        PipelineConfig { commit_threshold: 2, observer_error_policy: ObserverErrorPolicy::Isolate, ..run_config(10, 5) };
    let result = within_timeout(loopback_pipeline(&network, topology, config).run()).await;
    assert!(
        matches!(result, Err(TapeError::InsufficientCommitters { live: 1, required: 2, target: 10, .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn isolation_above_threshold_keeps_running() {
    let network = loopback_network().with_committer_faults("peer2", CommitterFaults { drop_after: Some(1), ..Default::default() });
    let topology = TopologyBuilder::default().committers(3).build();
    let config =
        PipelineConfig { commit_threshold: 2, observer_error_policy: ObserverErrorPolicy::Isolate, ..run_config(20, 5) };
    let report = within_timeout(loopback_pipeline(&network, topology, config).run()).await.expect("two committers left");
    assert_eq!(report.transactions, 20);
}

#[tokio::test]
async fn block_without_payload_is_a_protocol_violation() {
    for policy in [ObserverErrorPolicy::Abort, ObserverErrorPolicy::Isolate] {
        let network = loopback_network().with_committer_faults("peer0", CommitterFaults { empty_after: Some(0), ..Default::default() });
        let config = PipelineConfig { observer_error_policy: policy, ..run_config(10, 5) };
        let result = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), config).run()).await;
        assert!(matches!(result, Err(TapeError::ProtocolViolation { .. })), "{policy}: got {result:?}");
    }
}

#[tokio::test]
async fn unreachable_endorser_fails_before_any_load() {
    let network = loopback_network().with_endorser_faults("peer0", EndorserFaults { unreachable: true, ..Default::default() });
    let recorder = Arc::new(RecordingObserver::default());
    let result = within_timeout(
        loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(10, 5)).with_observer(recorder.clone()).run(),
    )
    .await;
    assert!(matches!(result, Err(TapeError::ConnectionFailed { .. })), "got {result:?}");
    assert_eq!(RecordingObserver::count(&recorder.emitted), 0);
}

#[tokio::test]
async fn unreachable_committer_fails_before_any_load() {
    let network = loopback_network().with_committer_faults("peer0", CommitterFaults { unreachable: true, ..Default::default() });
    let result = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(10, 5)).run()).await;
    assert!(matches!(result, Err(TapeError::ConnectionFailed { .. })), "got {result:?}");
    assert_eq!(network.envelopes_accepted(), 0);
}

#[tokio::test]
async fn broken_endorser_connection_is_fatal() {
    let network = loopback_network().with_endorser_faults("peer0", EndorserFaults { fail_after: Some(3), ..Default::default() });
    let result = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(10, 5)).run()).await;
    assert!(matches!(result, Err(TapeError::ConnectionFailed { .. })), "got {result:?}");
}

#[tokio::test]
async fn refusing_orderer_is_fatal() {
    let network = loopback_network().with_orderer_faults("orderer0", OrdererFaults { reject_after: Some(3), ..Default::default() });
    let result = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(10, 5)).run()).await;
    assert!(matches!(result, Err(TapeError::BroadcastFailed { .. })), "got {result:?}");
    assert_eq!(network.envelopes_accepted(), 3);
}

#[tokio::test]
async fn threshold_above_committer_count_is_rejected() {
    let network = loopback_network();
    let config = PipelineConfig { commit_threshold: 2, ..run_config(10, 5) };
    let result = loopback_pipeline(&network, TopologyBuilder::default().build(), config).run().await;
    assert!(matches!(result, Err(TapeError::InvalidThreshold { .. })), "got {result:?}");
}

#[tokio::test]
async fn external_cancellation_stops_the_run() {
    let network = loopback_network();
    let config = PipelineConfig { rate: 5.0, ..run_config(100, 1) };
    let pipeline = loopback_pipeline(&network, TopologyBuilder::default().build(), config);
    let cancel = pipeline.cancellation_token();
    let (result, _) = tokio::join!(within_timeout(pipeline.run()), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });
    assert!(matches!(result, Err(TapeError::Cancelled)), "got {result:?}");
    assert!(network.envelopes_accepted() < 100);
}

#[tokio::test]
async fn observers_stop_once_their_committer_reported_every_transaction() {
    let network = loopback_network().with_committer_faults("peer1", CommitterFaults { duplicate_blocks: true, ..Default::default() });
    let recorder = Arc::new(RecordingObserver::default());
    let topology = TopologyBuilder::default().committers(2).build();
    let config = PipelineConfig { commit_target: Some(11), ..run_config(10, 5) };
    let result = within_timeout(loopback_pipeline(&network, topology, config).with_observer(recorder.clone()).run()).await;
    assert!(matches!(result, Err(TapeError::ObserversExhausted { committed: 10, target: 11 })), "got {result:?}");
    assert_eq!(RecordingObserver::count(&recorder.committed), 10);
}
