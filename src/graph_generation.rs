/// A module containing generators for instances used by the test suite and
/// the benchmarks: cycle graphs with their natural path-shaped tree
/// decompositions, and complete graphs with explicit cost closures.
pub mod generation {
    use crate::graph_structures::graph_model::{Cost, Graph, Vertex, VertexData};
    use crate::tree_decompositions::decomposition::Decomposition;

    /// The cycle graph C_n, every edge with the given cost.
    pub fn cycle_graph(n: usize, cost: Cost) -> Graph {
        let mut graph = Graph::new();
        let vs: Vec<Vertex> = (0..n).map(|_| graph.add_vertex(VertexData::default())).collect();
        for i in 0..n {
            graph.add_edge(vs[i], vs[(i + 1) % n], Some(cost));
        }
        graph
    }

    /// A width-2 tree decomposition of C_n: bags {0, i+1, i+2} chained in a
    /// path, n >= 3. Every cycle edge lands in one bag, the closing edge
    /// (n-1, 0) in the last one.
    pub fn cycle_decomposition(n: usize) -> Decomposition {
        assert!(n >= 3);
        let mut dec = Decomposition::new();
        for i in 0..(n - 2) {
            dec.add_bag(
                vec![Vertex::new(0), Vertex::new(i + 1), Vertex::new(i + 2)],
                None,
            );
        }
        for i in 0..(n - 2).saturating_sub(1) {
            dec.add_bag_edge(i as u64, (i + 1) as u64);
        }
        dec
    }

    /// The complete graph K_n with the cost of edge (i, j) given by the
    /// closure.
    pub fn complete_graph<F>(n: usize, cost: F) -> Graph
    where
        F: Fn(usize, usize) -> Cost,
    {
        let mut graph = Graph::new();
        let vs: Vec<Vertex> = (0..n).map(|_| graph.add_vertex(VertexData::default())).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                graph.add_edge(vs[i], vs[j], Some(cost(i, j)));
            }
        }
        graph
    }

    /// The one-bag decomposition holding every vertex of the graph. Only
    /// useful for small graphs, but it turns any of them into a valid
    /// solver instance.
    pub fn trivial_decomposition(graph: &Graph) -> Decomposition {
        let mut dec = Decomposition::new();
        dec.add_bag(graph.vertices().collect(), None);
        dec
    }
}

#[cfg(test)]
mod tests {
    use super::generation::{cycle_decomposition, cycle_graph};
    use crate::tree_decompositions::tree_structure::TreeStructure;

    #[test]
    fn cycle_instances_line_up() {
        let graph = cycle_graph(6, 3);
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 6);

        let dec = cycle_decomposition(6);
        assert_eq!(dec.bag_count(), 4);
        assert_eq!(dec.width(), 2);
        assert!(dec.validate(&graph, 12).is_ok());
        assert!(TreeStructure::root_at(&dec, None).is_ok());
    }
}
