use dynograph::dataset::rmat::{RmatArgs, RmatGenerator};
use dynograph::dataset::{epoch_boundary, window_threshold};
use dynograph::distribute::PartitionPlan;
use dynograph::{Batch, Edge};
use proptest::prelude::*;

fn edge_lists(max_len: usize) -> impl Strategy<Value = Vec<Edge>> {
    proptest::collection::vec((0i64..6, 0i64..6, 1i64..100, 0i64..50), 0..max_len).prop_map(|raw| {
        let mut edges: Vec<Edge> = raw.into_iter().map(|(s, d, w, t)| Edge::new(s, d, w, t)).collect();
        edges.sort_by_key(|e| e.timestamp);
        edges
    })
}

proptest! {
    #[test]
    fn dedup_keeps_only_the_newest_copy_of_each_pair(edges in edge_lists(60)) {
        let deduped = Batch::new(&edges).deduplicated();
        for window in deduped.windows(2) {
            prop_assert!((window[0].src, window[0].dst) < (window[1].src, window[1].dst));
        }
        for e in deduped.iter() {
            let newest = edges
                .iter()
                .filter(|x| x.src == e.src && x.dst == e.dst)
                .map(|x| x.timestamp)
                .max();
            prop_assert_eq!(Some(e.timestamp), newest);
            prop_assert!(edges.contains(e));
        }
        let mut pairs: Vec<(i64, i64)> = edges.iter().map(|e| (e.src, e.dst)).collect();
        pairs.sort();
        pairs.dedup();
        prop_assert_eq!(pairs.len(), deduped.len());
    }

    #[test]
    fn filtering_keeps_a_suffix(edges in edge_lists(60), threshold in 0i64..60) {
        let batch = Batch::new(&edges);
        let kept = batch.clone().filtered(threshold);
        prop_assert!(edges.ends_with(kept.edges()));
        prop_assert!(kept.iter().all(|e| e.timestamp >= threshold));
        let dropped = &edges[..edges.len() - kept.len()];
        prop_assert!(dropped.iter().all(|e| e.timestamp < threshold));
    }

    #[test]
    fn epochs_trigger_exactly_num_epochs_times(num_batches in 1i64..500, epochs in 1i64..500) {
        let num_epochs = epochs.min(num_batches);
        let triggers: Vec<i64> = (0..num_batches).filter(|&b| epoch_boundary(b, num_batches, num_epochs)).collect();
        prop_assert_eq!(triggers.len() as i64, num_epochs);
        prop_assert_eq!(triggers.last().copied(), Some(num_batches - 1));
    }

    #[test]
    fn full_window_starts_at_the_first_timestamp(min in -1000i64..1000, span in 0i64..1000, offset in 0i64..1000) {
        let max = min + span;
        let latest = min + offset.min(span);
        prop_assert_eq!(window_threshold(1.0, min, max, latest), min);
    }

    #[test]
    fn partition_plans_are_balanced(edges_per_batch in 1i64..10_000, participants in 1usize..64) {
        prop_assume!(edges_per_batch >= participants as i64);
        let plan = PartitionPlan::new(edges_per_batch, participants).unwrap();
        prop_assert_eq!(plan.slice_sizes.iter().sum::<usize>() as i64, edges_per_batch);
        let largest = plan.slice_sizes.iter().max().copied().unwrap_or(0);
        let smallest = plan.slice_sizes.iter().min().copied().unwrap_or(0);
        prop_assert!(largest - smallest <= 1);
        prop_assert!(plan.slice_sizes.windows(2).all(|w| w[0] >= w[1]));
        let mut offset = 0;
        for (size, displacement) in plan.slice_sizes.iter().zip(plan.displacements.iter()) {
            prop_assert_eq!(*displacement, offset);
            offset += size;
        }
    }

    #[test]
    fn rmat_never_emits_self_edges(seed in any::<u64>(), vertices in 2i64..300) {
        let args = RmatArgs { a: 0.57, b: 0.19, c: 0.19, d: 0.05, num_edges: 200, num_vertices: vertices };
        let mut generator = RmatGenerator::new(&args, seed);
        let edges = generator.edges(200, 0).unwrap();
        prop_assert!(edges.iter().all(|e| e.src != e.dst));
        prop_assert!(edges.iter().all(|e| e.src < vertices && e.dst < vertices && e.src >= 0 && e.dst >= 0));
    }
}
