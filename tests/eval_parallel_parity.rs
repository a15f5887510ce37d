use kinegraph::{Evaluator, FrameIndex, FrameRange, TimelineDocument, eval_range, EvalThreading};

fn fixture() -> TimelineDocument {
    let s = include_str!("data/explainer_demo.json");
    serde_json::from_str(s).unwrap()
}

#[test]
fn parallel_range_matches_sequential() {
    let doc = fixture();
    let range = FrameRange::new(FrameIndex(0), FrameIndex(60)).unwrap();
    let sequential = eval_range(&doc, range, &EvalThreading::default()).unwrap();

    for chunk_size in [1, 3, 8] {
        let threading = EvalThreading {
            parallel: true,
            chunk_size,
            threads: Some(4),
        };
        let parallel = eval_range(&doc, range, &threading).unwrap();
        assert_eq!(parallel, sequential, "chunk_size {chunk_size}");
    }
}

#[test]
fn random_access_matches_range_evaluation() {
    let doc = fixture();
    let range = FrameRange::new(FrameIndex(0), FrameIndex(90)).unwrap();
    let states = eval_range(&doc, range, &EvalThreading::default()).unwrap();

    for f in [0u64, 17, 29, 30, 59, 60, 89] {
        let single = Evaluator::eval_frame_unchecked(&doc, FrameIndex(f));
        assert_eq!(single, states[f as usize], "frame {f}");
    }
}
