mod completion;
mod dedup;
mod modes;
mod resubmission;
mod rollback;
mod support;
