use crate::fixtures::{loopback_network, loopback_pipeline, run_config, RecordingObserver, TopologyBuilder, RUN_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tape_core::application::{PipelineConfig, RunReport};
use tape_core::infrastructure::network::CommitterFaults;
use tape_core::Result;

async fn within_timeout(run: impl std::future::Future<Output = Result<RunReport>>) -> RunReport {
    tokio::time::timeout(RUN_TIMEOUT, run).await.expect("run finished in time").expect("run succeeded")
}

#[tokio::test]
async fn paced_run_commits_every_transaction() {
    let network = loopback_network();
    let recorder = Arc::new(RecordingObserver::default());
    let config = PipelineConfig { rate: 100.0, ..run_config(10, 5) };
    let pipeline = loopback_pipeline(&network, TopologyBuilder::default().build(), config).with_observer(recorder.clone());

    let report = within_timeout(pipeline.run()).await;

    assert_eq!(report.transactions, 10);
    assert_eq!(report.dropped, 0);
    assert!(report.elapsed > Duration::ZERO);
    let expected_tps = 10.0 / report.elapsed.as_secs_f64();
    assert!((report.tps - expected_tps).abs() < 1e-6, "tps {} vs {}", report.tps, expected_tps);
    // 5 go out as a burst, the other 5 at 100/s.
    assert!(report.elapsed >= Duration::from_millis(40), "elapsed {:?}", report.elapsed);

    assert_eq!(network.envelopes_accepted(), 10);
    assert_eq!(RecordingObserver::count(&recorder.emitted), 10);
    assert_eq!(RecordingObserver::count(&recorder.committed), 10);
    assert!(report.to_string().starts_with("tx: 10, duration: "));
}

#[tokio::test]
async fn every_endorser_signs_and_one_envelope_is_sent_per_transaction() {
    let network = loopback_network().with_committer_faults("peer1", CommitterFaults { duplicate_blocks: true, ..Default::default() });
    let recorder = Arc::new(RecordingObserver::default());
    let topology = TopologyBuilder::default().endorsers(3).committers(2).build();
    let config = PipelineConfig { commit_threshold: 2, ..run_config(20, 4) };
    let pipeline = loopback_pipeline(&network, topology, config).with_observer(recorder.clone());

    let report = within_timeout(pipeline.run()).await;

    assert_eq!(report.transactions, 20);
    assert_eq!(network.envelopes_accepted(), 20);
    assert_eq!(RecordingObserver::count(&recorder.proposals), 60);
    assert_eq!(RecordingObserver::count(&recorder.envelopes), 20);
    assert_eq!(RecordingObserver::count(&recorder.broadcasts), 20);
    assert_eq!(RecordingObserver::count(&recorder.committed), 20);
}

#[tokio::test]
async fn envelopes_are_spread_over_several_orderers() {
    let network = loopback_network();
    let topology = TopologyBuilder::default().orderers(3).build();
    let report = within_timeout(loopback_pipeline(&network, topology, run_config(30, 10)).run()).await;
    assert_eq!(report.transactions, 30);
    assert_eq!(network.envelopes_accepted(), 30);
}

#[tokio::test]
async fn unlimited_rate_with_single_slot_channels_completes() {
    let network = loopback_network();
    let config = PipelineConfig { assembler_workers: 1, integrator_workers: 1, ..run_config(50, 1) };
    let report = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), config).run()).await;
    assert_eq!(report.transactions, 50);
}

#[tokio::test]
async fn empty_run_completes_immediately() {
    let network = loopback_network();
    let report = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(0, 1)).run()).await;
    assert_eq!(report.transactions, 0);
    assert_eq!(report.tps, 0.0);
    assert_eq!(network.envelopes_accepted(), 0);
}

#[tokio::test]
async fn report_serializes_to_json() {
    let network = loopback_network();
    let report = within_timeout(loopback_pipeline(&network, TopologyBuilder::default().build(), run_config(5, 5)).run()).await;
    let json = report.to_json();
    assert_eq!(json["tx"], 5);
    assert_eq!(json["dropped"], 0);
    assert!(json["duration_secs"].as_f64().expect("duration") > 0.0);
}
