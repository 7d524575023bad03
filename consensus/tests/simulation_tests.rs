//! Multi-participant runs over the simulated network.
//!
//! These tests wire several engines to one in-memory mailbox and pump it,
//! checking agreement, validity and termination end-to-end rather than one
//! message at a time.

use std::sync::Arc;

use benor_consensus::{Coin, ConsensusEngine, EngineConfig, ReadinessBarrier, SeededCoin};
use benor_nullables::{NullCoin, SimNetwork};
use benor_types::{NodeId, ProtocolParams, Round, Value};
use proptest::prelude::*;

const MAX_DELIVERIES: usize = 200_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Cluster {
    network: Arc<SimNetwork>,
    engines: Vec<Arc<ConsensusEngine>>,
}

impl Cluster {
    fn build(
        faulty_bound: usize,
        values: &[Value],
        faulty: &[usize],
        coin_for: impl Fn(NodeId) -> Arc<dyn Coin>,
    ) -> Self {
        let params = ProtocolParams::new(values.len(), faulty_bound).expect("valid params");
        let network = SimNetwork::new();
        let barrier = Arc::new(ReadinessBarrier::new(values.len()));
        let engines = NodeId::all(values.len())
            .map(|id| {
                barrier.mark_ready(id);
                Arc::new(
                    ConsensusEngine::new(
                        EngineConfig {
                            id,
                            params,
                            initial: values[id.index()],
                            faulty: faulty.contains(&id.index()),
                        },
                        network.clone(),
                        coin_for(id),
                        barrier.clone(),
                    )
                    .expect("valid engine"),
                )
            })
            .collect();
        Self { network, engines }
    }

    async fn start_all(&self) {
        for engine in &self.engines {
            engine.start().await;
        }
    }

    fn correct(&self) -> impl Iterator<Item = &Arc<ConsensusEngine>> {
        self.engines.iter().filter(|engine| !engine.is_faulty())
    }

    fn decisions(&self) -> Vec<Option<Value>> {
        self.correct().map(|engine| engine.state().decision()).collect()
    }
}

fn bits(values: &[u8]) -> Vec<Value> {
    values.iter().map(|&b| Value::from_bit(b == 1)).collect()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn four_nodes_with_zero_majority_decide_zero_in_round_one() {
    let cluster = Cluster::build(1, &bits(&[0, 0, 1, 0]), &[], |_| {
        Arc::new(NullCoin::constant(Value::One))
    });
    cluster.start_all().await;
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);

    for engine in cluster.correct() {
        let state = engine.state();
        assert_eq!(state.decision(), Some(Value::Zero));
        assert_eq!(state.k, Some(Round::FIRST));
    }
}

#[tokio::test]
async fn silent_faulty_participant_does_not_block_quorum() {
    // Participant 2 is faulty; its initial value is irrelevant.
    let values = [Value::Zero, Value::One, Value::Ambiguous, Value::One];
    let coin = Arc::new(NullCoin::constant(Value::One));
    let cluster = Cluster::build(1, &values, &[2], |_| coin.clone());
    cluster.start_all().await;
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);

    // Round 1: proposals {0, 1, 1} hold no majority of N = 4, every vote is
    // ambiguous and each correct participant flips the coin into round 2.
    assert_eq!(coin.flips(), 3);
    for engine in cluster.correct() {
        let state = engine.state();
        assert_eq!(state.decision(), Some(Value::One));
        assert_eq!(state.k, Some(Round::new(2)));
    }

    let faulty = cluster.engines[2].state();
    assert_eq!((faulty.x, faulty.decided, faulty.k), (None, None, None));
}

#[tokio::test]
async fn unanimous_networks_decide_their_value() {
    for bit in [0u8, 1] {
        let cluster = Cluster::build(2, &bits(&[bit; 7]), &[], |_| {
            Arc::new(NullCoin::constant(Value::Zero))
        });
        cluster.start_all().await;
        cluster.network.run(&cluster.engines, MAX_DELIVERIES);

        let expected = Value::from_bit(bit == 1);
        assert!(cluster
            .decisions()
            .iter()
            .all(|decision| *decision == Some(expected)));
    }
}

#[tokio::test]
async fn ten_nodes_four_faulty_decide() {
    let values = bits(&[0, 1, 1, 0, 1, 0, 1, 1, 0, 0]);
    let cluster = Cluster::build(4, &values, &[0, 3, 5, 9], |id| {
        Arc::new(SeededCoin::new(1_000 + id.index() as u64))
    });
    cluster.start_all().await;
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);

    let decisions = cluster.decisions();
    assert!(decisions.iter().all(Option::is_some), "{decisions:?}");
    assert!(decisions.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn exceeding_fault_tolerance_never_decides() {
    // N = 10, F = 6: quorum is 4 but deciding needs 7 votes for one value.
    let values = bits(&[1, 0, 1, 1, 0, 1, 0, 1, 0, 1]);
    let cluster = Cluster::build(6, &values, &[0, 1, 2, 3, 4, 5], |id| {
        Arc::new(SeededCoin::new(id.index() as u64))
    });
    cluster.start_all().await;
    cluster.network.run(&cluster.engines, 20_000);

    for engine in cluster.correct() {
        let state = engine.state();
        assert_eq!(state.decided, Some(false));
        assert!(state.round() > Round::new(10), "k = {}", state.round());
    }
}

#[tokio::test]
async fn late_start_still_counts_early_proposals() {
    let cluster = Cluster::build(0, &bits(&[1, 1]), &[], |_| {
        Arc::new(NullCoin::constant(Value::Zero))
    });
    cluster.engines[0].start().await;
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);
    assert_eq!(cluster.decisions(), vec![None, None]);

    cluster.engines[1].start().await;
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);
    assert_eq!(cluster.decisions(), vec![Some(Value::One), Some(Value::One)]);
}

#[tokio::test]
async fn rounds_never_go_back_under_reordering() {
    let values = bits(&[0, 1, 0, 1, 1, 0, 1]);
    let cluster = Cluster::build(2, &values, &[4], |id| {
        Arc::new(SeededCoin::new(77 + id.index() as u64))
    });
    cluster.start_all().await;

    let mut rounds: Vec<Round> = cluster.engines.iter().map(|e| e.state().round()).collect();
    cluster
        .network
        .run_shuffled_inspecting(&cluster.engines, 4242, MAX_DELIVERIES, |engines| {
            for (index, engine) in engines.iter().enumerate() {
                let round = engine.state().round();
                assert!(round >= rounds[index], "participant {index}: {} -> {round}", rounds[index]);
                rounds[index] = round;
            }
        });

    let decided: Vec<Value> = cluster.decisions().into_iter().flatten().collect();
    assert!(decided.windows(2).all(|pair| pair[0] == pair[1]), "{decided:?}");
}

#[tokio::test]
async fn stopped_participant_stays_out() {
    let cluster = Cluster::build(1, &bits(&[0, 0, 0, 0]), &[], |_| {
        Arc::new(NullCoin::constant(Value::Zero))
    });
    cluster.start_all().await;
    cluster.engines[3].stop();
    cluster.network.run(&cluster.engines, MAX_DELIVERIES);

    let state = cluster.engines[3].state();
    assert!(state.killed);
    assert_eq!(state.decided, None);
    for engine in &cluster.engines[..3] {
        assert_eq!(engine.state().decision(), Some(Value::Zero));
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn network_setup() -> impl Strategy<Value = (usize, Vec<u8>, Vec<usize>, u64)> {
    (1usize..=3).prop_flat_map(|faulty_bound| {
        let min_nodes = 3 * faulty_bound + 1;
        (min_nodes..=min_nodes + 3).prop_flat_map(move |nodes| {
            (
                Just(faulty_bound),
                prop::collection::vec(0u8..=1, nodes),
                prop::sample::subsequence((0..nodes).collect::<Vec<_>>(), 0..=faulty_bound),
                any::<u64>(),
            )
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// No two correct participants ever decide differently, whatever the
    /// initial values, silent faulty set, coin outcomes and delivery order,
    /// and no participant's round ever goes back.
    #[test]
    fn agreement_under_reordering((faulty_bound, values, faulty, seed) in network_setup()) {
        let cluster = Cluster::build(faulty_bound, &bits(&values), &faulty, |id| {
            Arc::new(SeededCoin::new(seed ^ id.index() as u64))
        });
        block_on(cluster.start_all());

        let mut rounds: Vec<Round> = cluster.engines.iter().map(|e| e.state().round()).collect();
        let mut regressions = Vec::new();
        cluster.network.run_shuffled_inspecting(&cluster.engines, seed, MAX_DELIVERIES, |engines| {
            for (index, engine) in engines.iter().enumerate() {
                let round = engine.state().round();
                if round < rounds[index] {
                    regressions.push((index, rounds[index], round));
                }
                rounds[index] = round;
            }
        });
        prop_assert!(regressions.is_empty(), "rounds went back: {:?}", regressions);

        let decided: Vec<Value> = cluster.decisions().into_iter().flatten().collect();
        prop_assert!(decided.windows(2).all(|pair| pair[0] == pair[1]), "{:?}", decided);
    }

    /// When every correct participant starts with the same value, that is the
    /// only value any of them can decide.
    #[test]
    fn validity_under_reordering((faulty_bound, values, faulty, seed) in network_setup(), bit in 0u8..=1) {
        let uniform = vec![bit; values.len()];
        let cluster = Cluster::build(faulty_bound, &bits(&uniform), &faulty, |id| {
            Arc::new(SeededCoin::new(seed.wrapping_add(id.index() as u64)))
        });
        block_on(cluster.start_all());
        cluster.network.run_shuffled(&cluster.engines, seed, MAX_DELIVERIES);

        let expected = Value::from_bit(bit == 1);
        for decision in cluster.decisions().into_iter().flatten() {
            prop_assert_eq!(decision, expected);
        }
    }

    /// FIFO delivery with at most F silent participants always terminates.
    #[test]
    fn termination_with_fifo_delivery((faulty_bound, values, faulty, seed) in network_setup()) {
        let cluster = Cluster::build(faulty_bound, &bits(&values), &faulty, |id| {
            Arc::new(SeededCoin::new(seed ^ (id.index() as u64) << 8))
        });
        block_on(cluster.start_all());
        cluster.network.run(&cluster.engines, MAX_DELIVERIES);

        prop_assert!(cluster.decisions().iter().all(Option::is_some));
    }
}
