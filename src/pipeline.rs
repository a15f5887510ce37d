use rayon::prelude::*;

use crate::{
    core::{FrameIndex, FrameRange},
    error::{KinegraphError, KinegraphResult},
    eval::{Evaluator, FrameState},
    model::TimelineDocument,
};

/// Threading options for range evaluation.
///
/// Frame evaluation is pure, so parallel order never changes results;
/// `chunk_size` only bounds how many frames are in flight per batch.
#[derive(Clone, Debug)]
pub struct EvalThreading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for EvalThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Evaluate a range of frames (inclusive start, exclusive end), in frame
/// order. The document is validated once up front.
pub fn eval_range(
    doc: &TimelineDocument,
    range: FrameRange,
    threading: &EvalThreading,
) -> KinegraphResult<Vec<FrameState>> {
    if range.is_empty() {
        return Err(KinegraphError::validation(
            "evaluation range must be non-empty",
        ));
    }
    doc.validate()?;

    let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);

    if !threading.parallel {
        for f in range.start.0..range.end.0 {
            out.push(Evaluator::eval_frame_unchecked(doc, FrameIndex(f)));
        }
        return Ok(out);
    }

    let pool = build_thread_pool(threading.threads)?;
    let chunk_size = normalized_chunk_size(threading.chunk_size);

    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let states = pool.install(|| {
            (chunk_start..chunk_end)
                .into_par_iter()
                .map(|f| Evaluator::eval_frame_unchecked(doc, FrameIndex(f)))
                .collect::<Vec<_>>()
        });
        out.extend(states);
        chunk_start = chunk_end;
    }

    Ok(out)
}

fn build_thread_pool(threads: Option<usize>) -> KinegraphResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(KinegraphError::validation(
            "eval threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| KinegraphError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}
