/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The volatile state that decided operations are applied to.

pub mod kv_store;
pub use kv_store::KVStore;
