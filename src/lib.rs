//! Optimal travelling salesman tours by dynamic programming over a tree
//! decomposition. The solver takes an undirected graph with nonnegative
//! integer edge costs plus a tree decomposition of it, and returns the
//! minimum weight of a Hamiltonian cycle together with a concrete edge list
//! realising it, or reports that no such cycle exists.

pub mod brute_force;
pub mod edge_selection;
pub mod file_handler;
pub mod graph_generation;
pub mod graph_structures;
pub mod integer_functions;
pub mod states;
pub mod tour_dp;
pub mod tree_decompositions;

#[cfg(test)]
mod unit_tests;
