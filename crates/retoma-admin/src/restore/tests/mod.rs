mod common;
mod delete_batch;
mod restore_batch;
