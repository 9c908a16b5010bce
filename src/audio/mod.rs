pub mod encode;
pub mod merge;
pub mod runner;

pub use encode::{encode, encode_args, normalize, normalize_args, tag, tag_args, TagSet};
pub use merge::{
    merge_args, merge_captures, merge_event, plan_cut, prepare_target, CutWindow, MergeOutcome,
};
pub use runner::{run_checked, ProcessOutput, ProcessRunner, SystemRunner};
