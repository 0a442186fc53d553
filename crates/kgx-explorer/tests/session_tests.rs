use kgx_explorer::prelude::*;
use kgx_explorer::{ConfigError, HeuristicOracle, NoOracle, OracleError};
use kgx_graph::{build_index, GraphIndex, NodeId, NodeType, Path};
use kgx_test_utils::{
    fan_index, filter_index, node, rel, scenario_index, FailingOracle, FixedOracle, GatedOracle,
    PendingOracle, SlowOracle,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn ids(path: &Path) -> Vec<&str> {
    path.nodes().iter().map(NodeId::as_str).collect()
}

fn multi_session(index: GraphIndex, oracle: Arc<dyn RankingOracle>) -> ExplorationSession {
    let session =
        ExplorationSession::with_oracle(Arc::new(index), ExplorerConfig::default(), oracle);
    session.set_selection_mode(SelectionMode::Multi);
    session
}

fn select_pair(session: &ExplorationSession, a: &str, b: &str) {
    assert_eq!(session.toggle_multi_select(a).unwrap(), Toggle::Added);
    assert_eq!(session.toggle_multi_select(b).unwrap(), Toggle::Added);
}

#[test]
fn shortest_path_between_selected_pair() {
    let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));
    select_pair(&session, "A", "B");

    let outcome = session.request_shortest_path().unwrap();
    let path = match outcome {
        PathOutcome::Found(path) => path,
        PathOutcome::NoPath => panic!("expected a path"),
    };
    assert_eq!(ids(&path), vec!["A", "C", "D", "B"]);
    assert_eq!(session.highlighted_path(), path);
}

#[test]
fn shortest_path_follows_selection_order() {
    let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));
    select_pair(&session, "B", "A");
    session.request_shortest_path().unwrap();
    assert_eq!(ids(&session.highlighted_path()), vec!["B", "D", "C", "A"]);
}

#[test]
fn disconnected_pair_clears_highlight() {
    let index = build_index(
        vec![
            node("A", "Acme", NodeType::Company),
            node("B", "Beta", NodeType::Company),
            node("C", "Core", NodeType::Technology),
        ],
        vec![rel("r1", "A", "C", "develops")],
    );
    let session = multi_session(index, Arc::new(FixedOracle::new(0)));
    select_pair(&session, "A", "C");
    session.request_shortest_path().unwrap();
    assert!(!session.highlighted_path().is_empty());

    session.toggle_multi_select("C").unwrap();
    session.toggle_multi_select("B").unwrap();
    assert_eq!(session.request_shortest_path().unwrap(), PathOutcome::NoPath);
    assert!(session.highlighted_path().is_empty());
}

#[test]
fn path_requests_need_two_selected() {
    let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));
    session.toggle_multi_select("A").unwrap();
    let err = session.request_shortest_path().unwrap_err();
    assert!(err.is_precondition());
    assert!(err.to_string().contains("exactly 2 selected nodes"));
}

proptest! {
    #[test]
    fn prop_toggles_are_involutions(ops in proptest::collection::vec(0..4usize, 0..40)) {
        let names = ["A", "B", "C", "D"];
        let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));

        let mut odd: BTreeSet<&str> = BTreeSet::new();
        for op in ops {
            let id = names[op];
            session.toggle_expansion(id);
            session.toggle_multi_select(id).unwrap();
            if !odd.remove(id) {
                odd.insert(id);
            }
        }

        let state = session.state();
        let expanded: BTreeSet<&str> = state.expanded().iter().map(NodeId::as_str).collect();
        let selected: BTreeSet<&str> = state.selected().iter().map(NodeId::as_str).collect();
        prop_assert_eq!(&expanded, &odd);
        prop_assert_eq!(&selected, &odd);
    }
}

#[tokio::test]
async fn ranked_path_discloses_candidate_bound() {
    let oracle = FixedOracle::new(3);
    let session = multi_session(fan_index(15), Arc::new(oracle.clone()));
    select_pair(&session, "start", "end");

    let outcome = session.request_ranked_path().await.unwrap();
    let (path, candidates) = match outcome {
        RankedPathOutcome::Ranked { path, candidates, .. } => (path, candidates),
        other => panic!("expected ranked outcome, got {other:?}"),
    };
    assert_eq!(ids(&path), vec!["start", "m3", "end"]);
    assert_eq!(candidates.to_string(), "10 of 15 candidates considered");
    assert!(candidates.is_truncated());
    assert_eq!(oracle.calls(), 1);

    let state = session.state();
    let annotation = state.annotation().unwrap();
    assert_eq!(annotation.rationale, "Start Co links to End Co");
    assert_eq!(annotation.opportunities, vec!["joint venture"]);
}

#[tokio::test]
async fn unavailable_oracle_falls_back_to_first_candidate() {
    let oracle = FailingOracle(OracleError::Unavailable("offline".into()));
    let session = multi_session(fan_index(3), Arc::new(oracle));
    select_pair(&session, "start", "end");

    let outcome = session.request_ranked_path().await.unwrap();
    match &outcome {
        RankedPathOutcome::Fallback { warning, .. } => {
            assert!(matches!(warning, OracleError::Unavailable(_)));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(ids(outcome.path().unwrap()), vec!["start", "m0", "end"]);
    assert!(session.state().annotation().is_none());
}

#[tokio::test]
async fn session_without_oracle_still_highlights() {
    let session = ExplorationSession::new(Arc::new(scenario_index()), ExplorerConfig::default());
    session.set_selection_mode(SelectionMode::Multi);
    select_pair(&session, "A", "B");

    let outcome = session.request_ranked_path().await.unwrap();
    assert!(matches!(outcome, RankedPathOutcome::Fallback { .. }));
    assert_eq!(ids(&session.highlighted_path()), vec!["A", "C", "D", "B"]);
}

#[tokio::test]
async fn heuristic_oracle_picks_shortest_candidate() {
    let session = multi_session(scenario_index(), Arc::new(HeuristicOracle));
    select_pair(&session, "A", "B");

    let outcome = session.request_ranked_path().await.unwrap();
    assert!(matches!(outcome, RankedPathOutcome::Ranked { .. }));
    let state = session.state();
    assert!(state
        .annotation()
        .unwrap()
        .rationale
        .starts_with("Acme Corp reaches Beta Industries in 3 hop(s)"));
}

#[tokio::test]
async fn second_request_while_in_flight_is_rejected() {
    let oracle = GatedOracle::new(0);
    let session = multi_session(fan_index(2), Arc::new(oracle.clone()));
    select_pair(&session, "start", "end");

    let (first, second) = tokio::join!(session.request_ranked_path(), async {
        tokio::task::yield_now().await;
        assert!(session.ranking_in_progress());
        let second = session.request_ranked_path().await;
        oracle.open();
        second
    });

    assert_eq!(second.unwrap(), RankedPathOutcome::AlreadyInProgress);
    assert!(matches!(first.unwrap(), RankedPathOutcome::Ranked { .. }));
    assert_eq!(oracle.calls(), 1);
    assert!(!session.ranking_in_progress());
}

#[tokio::test]
async fn selection_change_supersedes_answer() {
    let oracle = GatedOracle::new(0);
    let session = multi_session(scenario_index(), Arc::new(oracle.clone()));
    select_pair(&session, "A", "B");

    let (first, ()) = tokio::join!(session.request_ranked_path(), async {
        tokio::task::yield_now().await;
        session.clear_selection();
        oracle.open();
    });

    assert_eq!(first.unwrap(), RankedPathOutcome::Superseded);
    assert!(session.highlighted_path().is_empty());
    assert!(!session.ranking_in_progress());
}

#[tokio::test]
async fn shortest_path_request_supersedes_ranking() {
    let oracle = GatedOracle::new(0);
    let session = multi_session(fan_index(3), Arc::new(oracle.clone()));
    select_pair(&session, "start", "end");

    let (first, shortest) = tokio::join!(session.request_ranked_path(), async {
        tokio::task::yield_now().await;
        let shortest = session.request_shortest_path();
        oracle.open();
        shortest
    });

    assert_eq!(first.unwrap(), RankedPathOutcome::Superseded);
    let shortest = match shortest.unwrap() {
        PathOutcome::Found(path) => path,
        PathOutcome::NoPath => panic!("expected a path"),
    };
    assert_eq!(session.highlighted_path(), shortest);
    assert!(session.state().annotation().is_none());
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_highlight_unchanged() {
    let config = ExplorerConfig::default().with_oracle_timeout(Duration::from_millis(50));
    let index = Arc::new(scenario_index());
    let session = ExplorationSession::with_oracle(index, config, Arc::new(PendingOracle));
    session.set_selection_mode(SelectionMode::Multi);
    select_pair(&session, "A", "B");
    session.request_shortest_path().unwrap();
    let before = session.highlighted_path();

    let outcome = session.request_ranked_path().await.unwrap();
    assert_eq!(
        outcome,
        RankedPathOutcome::TimedOut {
            warning: OracleError::Timeout { after_ms: 50 }
        }
    );
    let warning = outcome.warning().map(ToString::to_string);
    assert_eq!(warning.as_deref(), Some("ranking oracle timed out after 50ms"));
    assert_eq!(session.highlighted_path(), before);
    assert!(!session.ranking_in_progress());
}

#[tokio::test(start_paused = true)]
async fn slow_oracle_within_budget_is_used() {
    let oracle = SlowOracle {
        delay: Duration::from_millis(40),
        inner: FixedOracle::new(1),
    };
    let config = ExplorerConfig::default().with_oracle_timeout(Duration::from_millis(50));
    let session =
        ExplorationSession::with_oracle(Arc::new(fan_index(2)), config, Arc::new(oracle));
    session.set_selection_mode(SelectionMode::Multi);
    select_pair(&session, "start", "end");

    let outcome = session.request_ranked_path().await.unwrap();
    assert_eq!(ids(outcome.path().unwrap()), vec!["start", "m1", "end"]);
}

#[tokio::test(start_paused = true)]
async fn dropped_request_clears_in_flight_marker() {
    let session = multi_session(scenario_index(), Arc::new(PendingOracle));
    select_pair(&session, "A", "B");
    session.request_shortest_path().unwrap();
    let before = session.highlighted_path();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), session.request_ranked_path()).await;
    assert!(abandoned.is_err());
    assert!(!session.ranking_in_progress());
    assert_eq!(session.highlighted_path(), before);

    // a fresh request is accepted again
    let retry =
        tokio::time::timeout(Duration::from_millis(10), session.request_ranked_path()).await;
    assert!(retry.is_err());
}

#[test]
fn relevant_nodes_combine_insights_and_expansion() {
    let session = ExplorationSession::new(Arc::new(filter_index()), ExplorerConfig::default());
    let ids_of =
        |nodes: Vec<kgx_graph::Node>| nodes.into_iter().map(|n| n.id.0).collect::<Vec<_>>();

    assert_eq!(ids_of(session.relevant_nodes(&[])), vec!["E", "A", "X"]);

    assert!(session.add_insight_filter("acme"));
    assert_eq!(ids_of(session.relevant_nodes(&[])), vec!["A", "E"]);

    assert!(session.remove_insight_filter("acme"));
    assert_eq!(session.toggle_expansion("A"), Toggle::Added);
    assert_eq!(ids_of(session.relevant_nodes(&[])), vec!["E"]);

    assert_eq!(
        ids_of(session.relevant_nodes(&["unrelated".to_string()])),
        vec!["X", "E"]
    );
}

#[test]
fn clusters_follow_relevant_set() {
    let mut nodes: Vec<kgx_graph::Node> = (0..5)
        .map(|i| node(&format!("c{i}"), &format!("Company {i}"), NodeType::Company))
        .collect();
    nodes.extend((0..4).map(|i| node(&format!("i{i}"), &format!("Fund {i}"), NodeType::Investor)));
    let index = Arc::new(build_index(nodes, vec![]));
    let session = ExplorationSession::new(index, ExplorerConfig::default());

    let all = session.clusters(&[]);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].count, 5);

    // only the five companies are relevant; below activation size
    assert!(session.clusters(&["company".to_string()]).is_empty());
}

#[test]
fn replaced_index_keeps_plain_ids() {
    let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));
    select_pair(&session, "A", "B");
    session.request_shortest_path().unwrap();

    session.replace_index(Arc::new(filter_index()));
    assert_eq!(session.state().selected().len(), 2);
    assert_eq!(session.request_shortest_path().unwrap(), PathOutcome::NoPath);
    assert!(session.neighbors("C").is_empty());
    assert_eq!(session.neighbors("A").len(), 1);
}

#[test]
fn stale_ids_toggle_off_after_replacement() {
    let session = multi_session(scenario_index(), Arc::new(FixedOracle::new(0)));
    select_pair(&session, "A", "C");
    assert_eq!(session.toggle_expansion("C"), Toggle::Added);

    // C is gone from the new snapshot but still held in state
    session.replace_index(Arc::new(filter_index()));
    assert_eq!(session.toggle_expansion("C"), Toggle::Removed);
    assert_eq!(session.toggle_multi_select("C").unwrap(), Toggle::Removed);

    let state = session.state();
    assert!(state.expanded().is_empty());
    assert_eq!(state.selected().iter().map(NodeId::as_str).collect::<Vec<_>>(), vec!["A"]);

    // adding an unknown ID is still refused
    assert_eq!(session.toggle_expansion("C"), Toggle::Ignored);
    assert_eq!(session.toggle_multi_select("C").unwrap(), Toggle::Ignored);
}

#[test]
fn config_file_bounds_candidates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_candidates = 3\nmax_path_depth = 2").unwrap();
    let index = Arc::new(fan_index(5));
    let session =
        ExplorationSession::from_config_file(index, file.path(), Arc::new(FixedOracle::new(0)))
            .unwrap();
    let found = session.find_candidate_paths("start", "end");
    assert_eq!(found.to_string(), "3 of 5 candidates considered");
}

#[test]
fn invalid_config_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_candidates = 0").unwrap();
    let index = Arc::new(fan_index(2));

    let err = ExplorationSession::from_config_file(index.clone(), file.path(), Arc::new(NoOracle))
        .unwrap_err();
    assert!(matches!(err, ExplorerError::Config(ConfigError::Invalid(_))));
    assert!(!err.is_precondition());

    let missing = "/nonexistent/kgx.toml";
    let err = ExplorationSession::from_config_file(index, missing, Arc::new(NoOracle)).unwrap_err();
    assert!(matches!(err, ExplorerError::Config(ConfigError::Io { .. })));
}
