/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that are used across the proposer, acceptor, and learner roles.
//!
//! Types specific to a single component, such as the proposer's configuration, can be found in the
//! modules of those components.

pub mod basic;

pub mod operation;
