/// A module containing a brute force tour solver which checks every vertex
/// permutation. Exponential, only good as an oracle for cross-checking the
/// dynamic program on small instances.
pub mod brute_force {
    use itertools::Itertools;

    use crate::graph_structures::graph_model::{Cost, Graph, Vertex, INFINITY};

    /// The cost of a cheapest Hamiltonian cycle, INFINITY if none exists.
    /// Vertex 0 is fixed as the start of every candidate tour; rotations of
    /// a cycle all have the same cost, so nothing is lost.
    pub fn brute_force_tour(graph: &Graph) -> Cost {
        let n = graph.vertex_count();
        if n < 3 {
            return INFINITY;
        }

        let mut best = INFINITY;
        for perm in (1..n).permutations(n - 1) {
            let mut cost: Cost = 0;
            let mut prev = 0;
            let mut closed = true;
            for &v in perm.iter().chain([&0]) {
                let step = graph.cost(Vertex::new(prev), Vertex::new(v));
                if step == INFINITY {
                    closed = false;
                    break;
                }
                cost = cost.saturating_add(step);
                prev = v;
            }
            if closed {
                best = best.min(cost);
            }
        }
        best
    }
}
