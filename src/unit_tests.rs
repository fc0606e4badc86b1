use crate::graph_structures::graph_model::{Graph, Vertex, VertexData};
use crate::tour_dp::tour_dp::Solution;
use crate::tree_decompositions::decomposition::Decomposition;

/// Builds a graph with n plain vertices and the given (a, b, cost) edges.
fn graph_from_edges(n: usize, edges: &[(usize, usize, u64)]) -> Graph {
    let mut graph = Graph::new();
    for _ in 0..n {
        graph.add_vertex(VertexData::default());
    }
    for &(a, b, c) in edges {
        graph.add_edge(Vertex::new(a), Vertex::new(b), Some(c));
    }
    graph
}

/// Builds a decomposition from bag contents and bag edges.
fn decomposition_from_bags(bags: &[&[usize]], edges: &[(u64, u64)]) -> Decomposition {
    let mut dec = Decomposition::new();
    for bag in bags {
        dec.add_bag(bag.iter().map(|&v| Vertex::new(v)).collect(), None);
    }
    for &(p, q) in edges {
        dec.add_bag_edge(p, q);
    }
    dec
}

fn edge_pairs(pairs: &[(usize, usize)]) -> Vec<(Vertex, Vertex)> {
    pairs
        .iter()
        .map(|&(a, b)| (Vertex::new(a), Vertex::new(b)))
        .collect()
}

/// The triangle with costs 3, 4, 5 in a single bag.
fn triangle_instance() -> (Graph, Decomposition) {
    let graph = graph_from_edges(3, &[(0, 1, 3), (1, 2, 4), (0, 2, 5)]);
    let dec = decomposition_from_bags(&[&[0, 1, 2]], &[]);
    (graph, dec)
}

/// The unit square with expensive diagonals, two overlapping bags.
fn square_instance() -> (Graph, Decomposition) {
    let graph = graph_from_edges(
        4,
        &[(0, 1, 1), (1, 2, 1), (2, 3, 1), (0, 3, 1), (0, 2, 5), (1, 3, 5)],
    );
    let dec = decomposition_from_bags(&[&[0, 1, 2], &[0, 2, 3]], &[(0, 1)]);
    (graph, dec)
}

/// Checks that a reported solution really is a Hamiltonian cycle of the
/// graph with matching total weight.
fn assert_hamiltonian(graph: &Graph, solution: &Solution) {
    let n = graph.vertex_count();
    assert_eq!(solution.edges.len(), n);

    let mut degree = vec![0; n];
    let mut total: u64 = 0;
    for &(a, b) in &solution.edges {
        assert!(graph.has_edge(a, b));
        total += graph.cost(a, b);
        degree[a.index()] += 1;
        degree[b.index()] += 1;
    }
    assert!(degree.iter().all(|&d| d == 2));
    assert_eq!(total, solution.cost);

    // one walk along the degree-2 edges must visit every vertex
    let mut adjacency = vec![vec![]; n];
    for &(a, b) in &solution.edges {
        adjacency[a.index()].push(b.index());
        adjacency[b.index()].push(a.index());
    }
    let mut visited = vec![false; n];
    let mut current = 0;
    for _ in 0..n {
        visited[current] = true;
        match adjacency[current].iter().find(|&&x| !visited[x]) {
            Some(&next) => current = next,
            None => break,
        }
    }
    assert!(visited.iter().all(|&v| v), "tour is not a single cycle");
}

#[cfg(test)]
pub mod tour_tests {
    use super::*;
    use crate::brute_force::brute_force::brute_force_tour;
    use crate::graph_generation::generation::{
        complete_graph, cycle_decomposition, cycle_graph, trivial_decomposition,
    };
    use crate::graph_structures::graph_model::INFINITY;
    use crate::tour_dp::tour_dp::{solve, SolveOptions};

    #[test]
    fn triangle_tour() {
        let (graph, dec) = triangle_instance();
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 12);
        assert_eq!(solution.edges, edge_pairs(&[(0, 1), (0, 2), (1, 2)]));
        assert_hamiltonian(&graph, &solution);
    }

    #[test]
    fn square_tour_avoids_the_diagonals() {
        let (graph, dec) = square_instance();
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 4);
        assert_eq!(solution.edges, edge_pairs(&[(0, 1), (0, 3), (1, 2), (2, 3)]));
        assert_hamiltonian(&graph, &solution);
    }

    #[test]
    fn disconnected_graph_has_no_tour() {
        let graph = graph_from_edges(4, &[(0, 1, 1), (2, 3, 1)]);
        let dec = decomposition_from_bags(&[&[0, 1, 2], &[0, 2, 3]], &[(0, 1)]);
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, INFINITY);
        assert_eq!(solution.edges, vec![]);
        assert!(!solution.is_tour());
    }

    #[test]
    fn too_small_graphs_have_no_tour() {
        let graph = graph_from_edges(2, &[(0, 1, 1)]);
        let dec = decomposition_from_bags(&[&[0, 1]], &[]);
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert!(!solution.is_tour());
    }

    #[test]
    fn long_cycle_over_a_path_decomposition() {
        let graph = cycle_graph(8, 2);
        let dec = cycle_decomposition(8);
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 16);
        assert_hamiltonian(&graph, &solution);
    }

    #[test]
    fn root_choice_does_not_change_the_answer() {
        let (graph, dec) = square_instance();
        let at_zero = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        let at_one = solve(
            &graph,
            &dec,
            &SolveOptions {
                root: Some(1),
                ..SolveOptions::default()
            },
        )
        .unwrap();
        assert_eq!(at_zero.cost, at_one.cost);
        assert_eq!(at_zero.edges, at_one.edges);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let (graph, dec) = square_instance();
        let first = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        let second = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn agrees_with_the_brute_force_oracle() {
        let (graph, dec) = square_instance();
        assert_eq!(
            solve(&graph, &dec, &SolveOptions::default()).unwrap().cost,
            brute_force_tour(&graph)
        );

        // a denser instance with asymmetric costs, solved over one big bag
        let graph = complete_graph(6, |i, j| ((3 * i + 5 * j) % 7 + 1) as u64);
        let dec = trivial_decomposition(&graph);
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, brute_force_tour(&graph));
        assert_hamiltonian(&graph, &solution);
    }

    #[test]
    fn every_tour_edge_is_load_bearing() {
        let (graph, dec) = square_instance();
        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();

        let all_edges = [(0, 1, 1), (1, 2, 1), (2, 3, 1), (0, 3, 1), (0, 2, 5), (1, 3, 5)];
        for &(a, b) in &solution.edges {
            let remaining: Vec<(usize, usize, u64)> = all_edges
                .iter()
                .copied()
                .filter(|&(x, y, _)| (x, y) != (a.index(), b.index()))
                .collect();
            let thinned = graph_from_edges(4, &remaining);
            assert!(brute_force_tour(&thinned) > solution.cost);
        }
    }
}

#[cfg(test)]
pub mod dp_table_tests {
    use super::*;
    use crate::graph_structures::graph_model::INFINITY;
    use crate::states::state_codec::State;
    use crate::tour_dp::tour_dp::DpData;
    use crate::tree_decompositions::tree_structure::TreeStructure;

    #[test]
    fn non_root_states_without_endpoints_are_rejected() {
        let (graph, dec) = square_instance();
        let tree = TreeStructure::root_at(&dec, None).unwrap();
        let mut dp = DpData::new(&graph, &dec, &tree);

        // bag 1 holds [0, 2, 3]; no subtree can satisfy degrees without
        // handing a path up
        let state = State::encode(&[2, 0, 2], &[]);
        assert_eq!(dp.table_query(1, &state), INFINITY);
    }

    #[test]
    fn open_path_state_on_the_leaf_bag() {
        let (graph, dec) = square_instance();
        let tree = TreeStructure::root_at(&dec, None).unwrap();
        let mut dp = DpData::new(&graph, &dec, &tree);

        // a path from 0 to 2 through the private vertex 3 costs the two
        // unit edges
        let state = State::encode(&[1, 1, 2], &[(Vertex::new(0), Vertex::new(2))]);
        assert_eq!(dp.table_query(1, &state), 2);
    }

    #[test]
    fn table_entries_are_computed_once() {
        let (graph, dec) = triangle_instance();
        let tree = TreeStructure::root_at(&dec, None).unwrap();
        let mut dp = DpData::new(&graph, &dec, &tree);

        let root_state = State::encode(&[2, 2, 2], &[]);
        let cost = dp.table_query(0, &root_state);
        assert_eq!(cost, 12);

        let entries = dp.state_count();
        assert!(entries >= 1);
        // a repeated query is a pure table hit
        assert_eq!(dp.table_query(0, &root_state), cost);
        assert_eq!(dp.state_count(), entries);
    }

    #[test]
    fn reconstruction_retraces_the_value_pass() {
        let (graph, dec) = square_instance();
        let tree = TreeStructure::root_at(&dec, None).unwrap();
        let mut dp = DpData::new(&graph, &dec, &tree);

        let root_state = State::encode(&[2, 2, 2], &[]);
        let cost = dp.table_query(0, &root_state);
        let edges = dp.reconstruct(0, &root_state);
        let total: u64 = edges.iter().map(|e| e.cost).sum();
        assert_eq!(total, cost);
    }
}

#[cfg(test)]
pub mod codec_property_tests {
    use rand::prelude::*;

    use crate::graph_structures::graph_model::Vertex;
    use crate::states::state_codec::{canonicalize, State};

    #[test]
    fn random_states_roundtrip() {
        let mut rng = rand::thread_rng();
        for _ in 0..99 {
            let k = rng.gen_range(2..=20);
            let degrees: Vec<u8> = (0..k).map(|_| rng.gen_range(0..=2)).collect();

            let pair_count = rng.gen_range(0..=4);
            let mut ids: Vec<usize> = (0..40).collect();
            ids.shuffle(&mut rng);
            let endpoints: Vec<(Vertex, Vertex)> = (0..pair_count)
                .map(|i| (Vertex::new(ids[2 * i]), Vertex::new(ids[2 * i + 1])))
                .collect();

            let state = State::encode(&degrees, &endpoints);
            assert_eq!(state.decode_degrees(), degrees);
            assert_eq!(state.endpoints(), canonicalize(&endpoints));

            // neither pair order nor orientation may matter
            let mut reordered = endpoints.clone();
            reordered.shuffle(&mut rng);
            let flipped: Vec<(Vertex, Vertex)> =
                reordered.iter().map(|&(u, v)| (v, u)).collect();
            assert_eq!(state, State::encode(&degrees, &flipped));
        }
    }
}

#[cfg(test)]
pub mod solver_error_tests {
    use super::*;
    use crate::graph_generation::generation::{complete_graph, trivial_decomposition};
    use crate::tour_dp::tour_dp::{solve, SolveError, SolveOptions};

    #[test]
    fn oversized_bags_are_refused() {
        let graph = complete_graph(5, |_, _| 1);
        let dec = trivial_decomposition(&graph);
        let result = solve(
            &graph,
            &dec,
            &SolveOptions {
                root: None,
                width_limit: 3,
            },
        );
        assert_eq!(
            result,
            Err(SolveError::WidthExceeded {
                bag: 0,
                limit: 3,
                found: 4
            })
        );
    }

    #[test]
    fn dangling_vertex_reference_is_fatal() {
        let (graph, _) = triangle_instance();
        let dec = decomposition_from_bags(&[&[0, 1, 5]], &[]);
        assert_eq!(
            solve(&graph, &dec, &SolveOptions::default()),
            Err(SolveError::VertexOutOfRange { bag: 0, vertex: 5 })
        );
    }

    #[test]
    fn uncovered_vertices_are_fatal() {
        let (graph, _) = square_instance();
        let dec = decomposition_from_bags(&[&[0, 1, 2]], &[]);
        assert!(matches!(
            solve(&graph, &dec, &SolveOptions::default()),
            Err(SolveError::InvalidDecomposition(_))
        ));
    }

    #[test]
    fn disconnected_bag_forest_is_fatal() {
        let (graph, _) = square_instance();
        let dec = decomposition_from_bags(&[&[0, 1, 2], &[0, 2, 3]], &[]);
        assert!(matches!(
            solve(&graph, &dec, &SolveOptions::default()),
            Err(SolveError::InvalidDecomposition(_))
        ));
    }
}

#[cfg(test)]
pub mod file_tests {
    use super::*;
    use crate::file_handler::graph_handler::{
        export_graph, import_graph, ImportOptions, ParseError,
    };
    use crate::tour_dp::tour_dp::{solve, SolveOptions};

    #[test]
    fn imports_the_square_fixture() {
        let (graph, dec) = import_graph("data/square.txt", &ImportOptions::default()).unwrap();
        assert_eq!(graph.name(), Some("square"));
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 6);

        let dec = dec.expect("fixture carries a decomposition");
        assert_eq!(dec.bag_count(), 2);

        let solution = solve(&graph, &dec, &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 4);
    }

    #[test]
    fn one_based_euclidean_fixture() {
        let options = ImportOptions { vid_start: 1 };
        let (graph, dec) = import_graph("data/euclid.txt", &options).unwrap();
        assert!(graph.is_euclidean());

        // omitted costs come from the coordinates, in tens of units
        assert_eq!(graph.cost(Vertex::new(0), Vertex::new(1)), 4);
        assert_eq!(graph.cost(Vertex::new(1), Vertex::new(2)), 3);
        assert_eq!(graph.cost(Vertex::new(0), Vertex::new(2)), 5);

        let solution = solve(&graph, &dec.unwrap(), &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 12);
    }

    #[test]
    fn writer_and_reader_roundtrip() {
        let (graph, dec) = import_graph("data/square.txt", &ImportOptions::default()).unwrap();
        let dec = dec.unwrap();

        let path = std::env::temp_dir().join("treewidth_tsp_roundtrip.txt");
        export_graph(&path, &graph, Some(&dec), true).unwrap();

        let (again, dec_again) = import_graph(&path, &ImportOptions::default()).unwrap();
        assert_eq!(again.name(), Some("treewidth_tsp_roundtrip"));
        assert_eq!(again.vertex_count(), graph.vertex_count());
        assert_eq!(again.edge_count(), graph.edge_count());

        let solution = solve(&again, &dec_again.unwrap(), &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 4);
    }

    #[test]
    fn non_dense_vertex_ids_are_fatal() {
        let path = std::env::temp_dir().join("treewidth_tsp_bad_ids.txt");
        std::fs::write(&path, "NODE_COORD_SECTION\n0 0 0\n2 5 5\n").unwrap();
        assert!(matches!(
            import_graph(&path, &ImportOptions::default()),
            Err(ParseError::NonDenseVertex { line: 3, .. })
        ));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let path = std::env::temp_dir().join("treewidth_tsp_recover.txt");
        std::fs::write(
            &path,
            "NODE_COORD_SECTION\n0 0 0\n1 10 0\n2 10 10\n\
             EDGE_SECTION\n0 1 oops\n0 1 3\n1 2 4\n0 2 5\n\
             BAG_COORD_SECTION\n0 0 0 0 1 2\n",
        )
        .unwrap();

        let (graph, dec) = import_graph(&path, &ImportOptions::default()).unwrap();
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 3);

        let solution = solve(&graph, &dec.unwrap(), &SolveOptions::default()).unwrap();
        assert_eq!(solution.cost, 12);
    }
}
